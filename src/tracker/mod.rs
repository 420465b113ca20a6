//! Issue tracker adapters.
//!
//! The tracker is optional. Without one, lookups find nothing and writes are
//! dropped, which leaves every issue-backed requirement unsatisfied.

mod error;
mod jira;

pub use error::TrackerError;
pub use jira::JiraTracker;

use tracing::debug;

use crate::effects::{TrackerEffect, TrackerInterpreter, TrackerResponse};

#[derive(Debug, Clone)]
pub enum Tracker {
    Jira(JiraTracker),
    Disabled,
}

impl TrackerInterpreter for Tracker {
    type Error = TrackerError;

    async fn interpret(&self, effect: TrackerEffect) -> Result<TrackerResponse, Self::Error> {
        match self {
            Tracker::Jira(jira) => jira.interpret(effect).await,
            Tracker::Disabled => {
                debug!(?effect, "no tracker configured");
                Ok(match effect {
                    TrackerEffect::GetIssue { .. } | TrackerEffect::FindJep { .. } => {
                        TrackerResponse::Issue(None)
                    }
                    TrackerEffect::GetLinkedIssues { .. } => TrackerResponse::Issues(Vec::new()),
                    TrackerEffect::UpdatedSince { .. } => TrackerResponse::Updated(Vec::new()),
                    TrackerEffect::SetProperty { .. } | TrackerEffect::AddComment { .. } => {
                        TrackerResponse::Done
                    }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IssueId;

    #[tokio::test]
    async fn disabled_tracker_finds_nothing() {
        let tracker = Tracker::Disabled;
        let response = tracker
            .interpret(TrackerEffect::GetIssue {
                id: IssueId::new("JDK-1"),
            })
            .await
            .unwrap();
        assert_eq!(response, TrackerResponse::Issue(None));

        let response = tracker
            .interpret(TrackerEffect::SetProperty {
                id: IssueId::new("JDK-1"),
                key: "labels".into(),
                value: serde_json::json!(["x"]),
            })
            .await
            .unwrap();
        assert_eq!(response, TrackerResponse::Done);
    }
}
