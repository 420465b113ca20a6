//! Desired state of a pull request for one pass.
//!
//! Handlers, requirements and the labeler all write into one
//! [`DesiredState`]. At the end of the pass it is diffed against the observed
//! pull request once, producing an ordered list of effects. Nothing is
//! applied while the pass is still computing.

pub mod body;

use std::collections::BTreeSet;

use crate::commands::CommandInvocation;
use crate::effects::{Effect, ForgeEffect, PrStateChange, TrackerEffect};
use crate::markers;
use crate::types::{IssueId, PrState, PullRequest, Sha};

pub use body::{BodySections, ChecklistItem, ReviewerEntry};

#[derive(Debug, Clone)]
pub struct DesiredState {
    pub labels: BTreeSet<String>,
    pub body: String,
    pub title: String,
    state: Option<PrStateChange>,
    comments: Vec<String>,
    commit_comments: Vec<(Sha, String)>,
    tracker: Vec<TrackerEffect>,
    issue_labels: Option<BTreeSet<String>>,
}

impl DesiredState {
    /// Starts from what is observed: applying an unmodified desired state
    /// produces no effects.
    pub fn from_observed(pr: &PullRequest) -> Self {
        DesiredState {
            labels: pr.labels.clone(),
            body: pr.body.clone(),
            title: pr.title.clone(),
            state: None,
            comments: Vec::new(),
            commit_comments: Vec::new(),
            tracker: Vec::new(),
            issue_labels: None,
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.insert(label.into());
    }

    pub fn remove_label(&mut self, label: &str) {
        self.labels.remove(label);
    }

    pub fn set_label(&mut self, label: &str, present: bool) {
        if present {
            self.add_label(label);
        } else {
            self.remove_label(label);
        }
    }

    /// Answers a command. The reply carries the command's reply marker, so
    /// the command is not executed again.
    pub fn reply(&mut self, command: &CommandInvocation, text: impl AsRef<str>) {
        self.comments.push(command.reply(text.as_ref()));
    }

    /// Posts a comment not tied to a command.
    pub fn comment(&mut self, text: impl Into<String>) {
        self.comments.push(text.into());
    }

    /// Comments queued so far in this pass.
    pub fn pending_comments(&self) -> &[String] {
        &self.comments
    }

    /// Whether a comment queued in this pass contains `marker`.
    pub fn queued(&self, marker: &str) -> bool {
        self.comments.iter().any(|c| c.contains(marker))
    }

    pub fn commit_comment(&mut self, commit: Sha, body: impl Into<String>) {
        self.commit_comments.push((commit, body.into()));
    }

    pub fn close(&mut self) {
        self.state = Some(PrStateChange::Closed);
    }

    pub fn reopen(&mut self) {
        self.state = Some(PrStateChange::Open);
    }

    pub fn requested_state(&self) -> Option<PrStateChange> {
        self.state
    }

    pub fn tracker(&mut self, effect: TrackerEffect) {
        self.tracker.push(effect);
    }

    /// Replaces the labels of the main issue.
    ///
    /// The new labels are visible to the rest of the pass through
    /// [`DesiredState::issue_labels`] before the update is applied.
    pub fn set_issue_labels(&mut self, issue: &IssueId, labels: BTreeSet<String>) {
        self.tracker.push(TrackerEffect::SetProperty {
            id: issue.clone(),
            key: "labels".into(),
            value: serde_json::json!(labels),
        });
        self.issue_labels = Some(labels);
    }

    pub fn issue_labels(&self) -> Option<&BTreeSet<String>> {
        self.issue_labels.as_ref()
    }

    /// Effects turning `observed` into this desired state, in apply order:
    /// comments in the order they were queued, commit comments, issue
    /// updates, label removals, label additions, body, title and state.
    pub fn effects(&self, observed: &PullRequest) -> Vec<Effect> {
        let pr = observed.number;
        let mut effects: Vec<Effect> = Vec::new();

        for body in &self.comments {
            effects.push(Effect::Forge(ForgeEffect::PostComment {
                pr,
                body: body.clone(),
            }));
        }
        for (commit, body) in &self.commit_comments {
            effects.push(Effect::Forge(ForgeEffect::PostCommitComment {
                commit: commit.clone(),
                body: body.clone(),
            }));
        }
        effects.extend(self.tracker.iter().cloned().map(Effect::Tracker));

        for label in observed.labels.difference(&self.labels) {
            effects.push(Effect::Forge(ForgeEffect::RemoveLabel {
                pr,
                label: label.clone(),
            }));
        }
        for label in self.labels.difference(&observed.labels) {
            effects.push(Effect::Forge(ForgeEffect::AddLabel {
                pr,
                label: label.clone(),
            }));
        }
        if self.body != observed.body {
            effects.push(Effect::Forge(ForgeEffect::SetBody {
                pr,
                body: self.body.clone(),
            }));
        }
        if self.title != observed.title {
            effects.push(Effect::Forge(ForgeEffect::SetTitle {
                pr,
                title: self.title.clone(),
            }));
        }
        let change = match (&observed.state, self.state) {
            (PrState::Open, Some(PrStateChange::Closed)) => Some(PrStateChange::Closed),
            (PrState::Closed, Some(PrStateChange::Open)) => Some(PrStateChange::Open),
            _ => None,
        };
        if let Some(state) = change {
            effects.push(Effect::Forge(ForgeEffect::SetState { pr, state }));
        }
        effects
    }
}
