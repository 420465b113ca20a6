//! Hidden HTML markers embedded in bot comments.
//!
//! Markers are the only memory the bot has between passes besides labels:
//! each semantic event the bot announces carries a marker, and before
//! posting the bot scans existing comments for it. Everything here is a pure
//! function of comment text.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Comment, Sha};

/// Appended by tools and by the bot itself to comments whose commands are
/// meant to be executed.
pub const VALID_SELF_COMMAND: &str = "<!-- Valid self-command -->";

/// Separates the user-written part of the PR body from the generated part.
pub const BODY_MARKER: &str =
    "<!-- Anything below this marker will be automatically updated, please do not edit manually! -->";

/// Identifies the labeler's explanatory comment.
pub const LABEL_COMMENT_MARKER: &str = "<!-- pr-steward label comment -->";

/// Identifies the one-time approval explanation comment.
pub const APPROVAL_EXPLANATION_MARKER: &str = "<!-- pr-steward approval explanation -->";

/// Identifies the notice posted when a linked CSR gets approved.
pub const CSR_APPROVED_MARKER: &str = "<!-- pr-steward csr approved -->";

/// Identifies the notice posted when a linked JEP gets targeted.
pub const JEP_TARGETED_MARKER: &str = "<!-- pr-steward jep targeted -->";

static REPLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- pr-steward command reply \(([^)]+)\) -->").unwrap());
static LABEL_CHANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- (added|removed) label: '([^']*)' -->").unwrap());
static CONTRIBUTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- (add|remove) contributor: '([^']*)' -->").unwrap());
static REVIEWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- (add|remove) reviewer: '([^']*)' -->").unwrap());
static JEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- jep: '([^']*)' '([^']*)' '([^']*)' -->").unwrap());
static LABEL_COMMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- pr-steward label commit '([0-9a-f]{40})' -->").unwrap());
static BACKPORT_REQUEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- backport requested by: '([^']*)' -->").unwrap());

// ─── Command Replies ──────────────────────────────────────────────────────────

/// The marker proving that command `id` has been answered.
pub fn reply_marker(id: &str) -> String {
    format!("<!-- pr-steward command reply ({}) -->", id)
}

/// Ids of all commands answered in `body`.
pub fn replied_ids(body: &str) -> impl Iterator<Item = &str> {
    REPLY
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

/// Whether a comment ends with the self-command marker.
pub fn has_valid_self_command(body: &str) -> bool {
    body.trim_end().ends_with(VALID_SELF_COMMAND)
}

// ─── Label Changes ────────────────────────────────────────────────────────────

pub fn label_added(label: &str) -> String {
    format!("<!-- added label: '{}' -->", label)
}

pub fn label_removed(label: &str) -> String {
    format!("<!-- removed label: '{}' -->", label)
}

/// Manual label changes recorded in `body`, as `(added, label)` in order.
pub fn label_changes(body: &str) -> Vec<(bool, String)> {
    LABEL_CHANGE
        .captures_iter(body)
        .map(|c| (&c[1] == "added", c[2].to_string()))
        .collect()
}

// ─── Contributors and Reviewers ───────────────────────────────────────────────

pub fn contributor_added(identity: &str) -> String {
    format!("<!-- add contributor: '{}' -->", identity)
}

pub fn contributor_removed(identity: &str) -> String {
    format!("<!-- remove contributor: '{}' -->", identity)
}

/// Contributor changes in `body`, as `(added, identity)` in order.
pub fn contributor_changes(body: &str) -> Vec<(bool, String)> {
    CONTRIBUTOR
        .captures_iter(body)
        .map(|c| (&c[1] == "add", c[2].to_string()))
        .collect()
}

pub fn reviewer_added(login: &str) -> String {
    format!("<!-- add reviewer: '{}' -->", login)
}

pub fn reviewer_removed(login: &str) -> String {
    format!("<!-- remove reviewer: '{}' -->", login)
}

/// Credited-reviewer changes in `body`, as `(added, login)` in order.
pub fn reviewer_changes(body: &str) -> Vec<(bool, String)> {
    REVIEWER
        .captures_iter(body)
        .map(|c| (&c[1] == "add", c[2].to_string()))
        .collect()
}

// ─── JEP ──────────────────────────────────────────────────────────────────────

/// A JEP link recorded by `/jep`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JepMarker {
    pub number: String,
    pub issue: String,
    pub title: String,
}

impl JepMarker {
    /// The placeholder recorded by `/jep unneeded`.
    pub fn unneeded() -> Self {
        JepMarker {
            number: "unneeded".into(),
            issue: "unneeded".into(),
            title: "unneeded".into(),
        }
    }

    pub fn is_unneeded(&self) -> bool {
        self.issue == "unneeded"
    }

    pub fn render(&self) -> String {
        format!(
            "<!-- jep: '{}' '{}' '{}' -->",
            self.number, self.issue, self.title
        )
    }
}

/// The last JEP marker in `body`.
pub fn jep_marker(body: &str) -> Option<JepMarker> {
    JEP.captures_iter(body).last().map(|c| JepMarker {
        number: c[1].to_string(),
        issue: c[2].to_string(),
        title: c[3].to_string(),
    })
}

// ─── Labeler ──────────────────────────────────────────────────────────────────

pub fn label_commit(sha: &Sha) -> String {
    format!("<!-- pr-steward label commit '{}' -->", sha)
}

/// The head commit the labeler last evaluated, if recorded in `body`.
pub fn labeled_commit(body: &str) -> Option<Sha> {
    LABEL_COMMIT
        .captures(body)
        .and_then(|c| Sha::parse(&c[1]).ok())
}

// ─── Backport ─────────────────────────────────────────────────────────────────

pub fn backport_enabled(target: &str) -> String {
    format!("<!-- add backport {} -->", target)
}

pub fn backport_disabled(target: &str) -> String {
    format!("<!-- remove backport {} -->", target)
}

pub fn backport_requested_by(login: &str) -> String {
    format!("<!-- backport requested by: '{}' -->", login)
}

/// The user an automatic backport comment was requested on behalf of.
pub fn backport_requester(body: &str) -> Option<String> {
    BACKPORT_REQUEST.captures(body).map(|c| c[1].to_string())
}

// ─── Scanning ─────────────────────────────────────────────────────────────────

/// Whether any comment by `bot` contains `marker`.
pub fn bot_posted(comments: &[Comment], bot: &str, marker: &str) -> bool {
    comments
        .iter()
        .any(|c| c.author.eq_ignore_ascii_case(bot) && c.body.contains(marker))
}
