//! The generated part of the pull request body.
//!
//! Everything after [`BODY_MARKER`] is owned by the bot and rendered from
//! scratch on each pass; the user part above it is kept verbatim.

use crate::markers::{self, BODY_MARKER};
use crate::types::Sha;

/// One line of the progress checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub text: String,
    pub checked: bool,
}

/// A reviewer entry in the `Reviewers` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerEntry {
    /// Display text, e.g. ``Jane Doe (`jdoe` - **Reviewer**)``.
    pub display: String,
    pub manual: bool,
}

/// Inputs of the generated body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodySections {
    pub checklist: Vec<ChecklistItem>,
    pub reviewers: Vec<ReviewerEntry>,
    /// `Full Name <email>` identities.
    pub contributors: Vec<String>,
    /// Head commit last evaluated by the labeler.
    pub labeled_commit: Option<Sha>,
}

/// The user-written part of a body.
pub fn user_part(body: &str) -> &str {
    body.split(BODY_MARKER).next().unwrap_or_default().trim_end()
}

fn contributor_line(identity: &str) -> String {
    match identity.split_once('<') {
        Some((name, email)) => format!(" * {} `<{}`", name.trim(), email.trim()),
        None => format!(" * `{}`", identity),
    }
}

/// Renders a full body.
///
/// Sections whose lists are empty are omitted.
pub fn render(body: &str, sections: &BodySections) -> String {
    let mut out = String::new();
    let user = user_part(body);
    if !user.is_empty() {
        out.push_str(user);
        out.push_str("\n\n");
    }
    out.push_str(BODY_MARKER);
    out.push_str("\n\n---------\n### Progress\n");
    for item in &sections.checklist {
        let mark = if item.checked { 'x' } else { ' ' };
        out.push_str(&format!("- [{}] {}\n", mark, item.text));
    }

    if !sections.reviewers.is_empty() {
        out.push_str("\n### Reviewers\n");
        for reviewer in &sections.reviewers {
            out.push_str(&format!(" * {}", reviewer.display));
            if reviewer.manual {
                out.push_str(" ⚠️ Added manually");
            }
            out.push('\n');
        }
    }

    if !sections.contributors.is_empty() {
        out.push_str("\n### Contributors\n");
        for identity in &sections.contributors {
            out.push_str(&contributor_line(identity));
            out.push('\n');
        }
    }

    if let Some(sha) = &sections.labeled_commit {
        out.push('\n');
        out.push_str(&markers::label_commit(sha));
        out.push('\n');
    }
    out
}
