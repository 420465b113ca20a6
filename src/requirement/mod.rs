//! Requirements gating integration: maintainer approval, CSR and JEP.
//!
//! No requirement stores its state. Each pass derives it from the labels the
//! pass intends to leave on the pull request plus the linked issue, so a
//! replayed pass derives the same state and owes no further changes.
//!
//! ```text
//! NotRequired ──request──▶ Requested ──approve──▶ Approved
//!      │                     ▲    │
//!      │                     │    └──reject──▶ Rejected ──re-request──┘
//!      └── linked issue already resolved ──▶ AlreadySatisfied
//! ```

pub mod approval;
pub mod csr;
pub mod jep;

use serde::{Deserialize, Serialize};

use crate::types::Issue;

/// Derived state of one requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementState {
    NotRequired,
    Requested,
    /// Resolved during this pull request's lifetime.
    Approved,
    Rejected,
    /// The external condition already held when first evaluated.
    AlreadySatisfied,
}

impl RequirementState {
    /// Whether the state keeps the `ready` label off.
    pub fn blocks_ready(&self) -> bool {
        matches!(self, RequirementState::Requested | RequirementState::Rejected)
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(
            self,
            RequirementState::Approved | RequirementState::AlreadySatisfied
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Approval,
    Csr,
    Jep,
}

/// A requirement evaluated for one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub kind: RequirementKind,
    pub state: RequirementState,
    /// The issue that resolves the requirement, if one is linked.
    pub issue: Option<LinkedIssue>,
}

/// Display data of a linked issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedIssue {
    pub name: String,
    pub url: String,
}

impl LinkedIssue {
    pub fn of(issue: &Issue) -> Self {
        LinkedIssue {
            name: issue.id.to_string(),
            url: issue.web_url.clone(),
        }
    }
}

impl Requirement {
    pub fn new(kind: RequirementKind, state: RequirementState) -> Self {
        Requirement {
            kind,
            state,
            issue: None,
        }
    }

    pub fn with_issue(mut self, issue: Option<LinkedIssue>) -> Self {
        self.issue = issue;
        self
    }

    /// The checklist line text, or `None` when nothing is required.
    pub fn checklist_text(&self) -> Option<String> {
        if self.state == RequirementState::NotRequired {
            return None;
        }
        let link = self
            .issue
            .as_ref()
            .map(|i| format!("[{}]({})", i.name, i.url));
        Some(match (self.kind, link) {
            (RequirementKind::Approval, _) => {
                "Change must be properly approved by the maintainers".to_string()
            }
            (RequirementKind::Csr, None) => "Change requires a CSR request to be approved".to_string(),
            (RequirementKind::Csr, Some(link)) => {
                format!("Change requires CSR request {} to be approved", link)
            }
            (RequirementKind::Jep, None) => "Change requires a JEP request to be targeted".to_string(),
            (RequirementKind::Jep, Some(link)) => {
                format!("Change requires JEP request {} to be targeted", link)
            }
        })
    }
}

/// Whether any requirement keeps the pull request from being ready.
pub fn any_blocking(requirements: &[Requirement]) -> bool {
    requirements.iter().any(|r| r.state.blocks_ready())
}
