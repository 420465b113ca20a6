//! CSR requirement.
//!
//! The CSR is found by following `csr for` links from the main issue. For
//! backports, the backport issues of the main issue are searched as well when
//! the main issue's own CSR does not cover the target fix version.

use super::RequirementState;
use crate::effects::calls;
use crate::effects::{EffectError, TrackerInterpreter};
use crate::types::{Issue, LinkRelation};

pub const CSR_LABEL: &str = "csr";

pub fn is_approved(csr: &Issue) -> bool {
    csr.is_closed_as("Approved")
}

pub fn is_withdrawn(csr: &Issue) -> bool {
    csr.is_closed_as("Withdrawn")
}

/// Picks the CSR that governs a change targeting `version`.
///
/// With a configured version, the first candidate whose fix versions contain
/// it wins, primary candidates first; no candidate matching means no CSR.
/// Without one, only the primary issue's first CSR is considered.
pub fn select_csr<'a>(primary: &'a [Issue], backport: &'a [Issue], version: Option<&str>) -> Option<&'a Issue> {
    match version {
        Some(v) => primary
            .iter()
            .chain(backport)
            .find(|csr| csr.fix_versions.contains(v)),
        None => primary.first(),
    }
}

/// Looks up the CSR candidates for `main` and selects one.
pub async fn find_csr<T: TrackerInterpreter>(
    tracker: &T,
    main: &Issue,
    version: Option<&str>,
) -> Result<Option<Issue>, EffectError> {
    let primary = calls::linked_issues(tracker, main.id.clone(), LinkRelation::CsrFor).await?;
    let Some(version) = version else {
        return Ok(primary.into_iter().next());
    };
    if let Some(csr) = select_csr(&primary, &[], Some(version)) {
        return Ok(Some(csr.clone()));
    }

    let mut backport_csrs = Vec::new();
    for backport in calls::linked_issues(tracker, main.id.clone(), LinkRelation::BackportedBy).await? {
        if backport.fix_versions.contains(version) {
            backport_csrs.extend(calls::linked_issues(tracker, backport.id.clone(), LinkRelation::CsrFor).await?);
        }
    }
    Ok(select_csr(&primary, &backport_csrs, Some(version)).cloned())
}

/// Derives the CSR state from the intended `csr` label and the selected CSR.
///
/// A linked CSR that is neither approved nor withdrawn keeps the requirement
/// open even without the label; the pass then restores the label.
pub fn derive(has_label: bool, csr: Option<&Issue>) -> RequirementState {
    match csr {
        Some(c) if is_approved(c) => {
            if has_label {
                RequirementState::Approved
            } else {
                RequirementState::AlreadySatisfied
            }
        }
        Some(c) if c.is_closed_as("Rejected") => RequirementState::Rejected,
        Some(c) if is_withdrawn(c) => {
            if has_label {
                RequirementState::Requested
            } else {
                RequirementState::NotRequired
            }
        }
        Some(_) => RequirementState::Requested,
        None if has_label => RequirementState::Requested,
        None => RequirementState::NotRequired,
    }
}
