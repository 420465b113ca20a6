//! JEP requirement.
//!
//! The JEP a pull request depends on is recorded by the `/jep` reply marker;
//! the latest marker wins.

use super::RequirementState;
use crate::commands::args::JepArg;
use crate::effects::calls;
use crate::effects::{EffectError, TrackerInterpreter};
use crate::markers::JepMarker;
use crate::types::{Issue, IssueId};

pub const JEP_LABEL: &str = "jep";

/// Resolves a `/jep` argument to an issue.
///
/// Bare numbers are tried as JEP numbers first and as issue keys second.
pub async fn lookup<T: TrackerInterpreter>(
    tracker: &T,
    arg: &JepArg,
    project: &str,
) -> Result<Option<Issue>, EffectError> {
    match arg {
        JepArg::Unneeded => Ok(None),
        JepArg::JepNumber(number) => calls::find_jep(tracker, number.clone()).await,
        JepArg::IssueKey(id) => calls::get_issue(tracker, id.clone()).await,
        JepArg::Bare(raw) => {
            if let Some(jep) = calls::find_jep(tracker, raw.clone()).await? {
                return Ok(Some(jep));
            }
            calls::get_issue(tracker, IssueId::in_project(project, raw)).await
        }
    }
}

/// The marker recorded for a JEP issue.
pub fn marker_for(jep: &Issue) -> JepMarker {
    JepMarker {
        number: jep.jep_number.clone().unwrap_or_else(|| "NotAllocated".into()),
        issue: jep.id.to_string(),
        title: jep.title.replace('\'', "\u{2019}"),
    }
}

/// Display name of a JEP: `JEP-<n>`, or the issue key before a number is
/// allocated.
pub fn display_name(jep: &Issue) -> String {
    match &jep.jep_number {
        Some(n) => format!("JEP-{}", n),
        None => format!("JEP {}", jep.id),
    }
}

/// Derives the JEP state from the intended `jep` label, the latest marker and
/// the issue the marker names.
pub fn derive(has_label: bool, marker: Option<&JepMarker>, jep: Option<&Issue>) -> RequirementState {
    if marker.is_some_and(JepMarker::is_unneeded) {
        return RequirementState::NotRequired;
    }
    match (marker, jep) {
        (Some(_), Some(j)) if j.is_targeted_jep() => {
            if has_label {
                RequirementState::Approved
            } else {
                RequirementState::AlreadySatisfied
            }
        }
        (Some(_), Some(_)) => RequirementState::Requested,
        _ if has_label => RequirementState::Requested,
        _ => RequirementState::NotRequired,
    }
}
