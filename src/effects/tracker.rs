//! Issue-tracker effect types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Issue, IssueId, LinkRelation};

/// An issue-tracker effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEffect {
    GetIssue { id: IssueId },
    GetLinkedIssues { id: IssueId, relation: LinkRelation },
    /// Finds a JEP by its JEP number (not its issue key).
    FindJep { number: String },
    /// Keys of issues in `project` updated after `since`.
    UpdatedSince {
        project: String,
        since: DateTime<Utc>,
    },
    /// Replaces a property wholesale. Setting the same value twice is a no-op.
    SetProperty {
        id: IssueId,
        key: String,
        value: serde_json::Value,
    },
    AddComment { id: IssueId, body: String },
}

/// Response from an issue-tracker effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TrackerResponse {
    Issue(Option<Box<Issue>>),
    Issues(Vec<Issue>),
    Updated(Vec<IssueId>),
    Done,
}
