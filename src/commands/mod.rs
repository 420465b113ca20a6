//! Slash commands issued in pull request and commit comments.
//!
//! Users talk to the bot with commands written one per line:
//!
//! - `/help` - lists the commands available in the context
//! - `/label` (alias `/cc`) - adds or removes classification labels
//! - `/contributor`, `/reviewer` - credit additional people
//! - `/approval`, `/approve` - maintainer approval for update branches
//! - `/csr`, `/jep` - require a CSR or JEP before integration
//! - `/backport` - backport a commit, or enable automatic backports on a PR
//! - `/branch` - create a branch at a commit (commit comments only)
//!
//! A command is executed once: the bot's reply carries a marker naming the
//! command id, and commands whose id already has a reply are skipped.
//!
//! # Example
//!
//! ```
//! use pr_steward::commands::{extract_commands, CommandName, CommandOrigin};
//!
//! let cmds = extract_commands("/csr needed", "7", "duke", CommandOrigin::PrComment, "steward");
//! assert_eq!(cmds[0].name, CommandName::Csr);
//! assert_eq!(cmds[0].args, "needed");
//! ```

pub mod args;
mod parser;
mod types;

use std::collections::HashSet;

pub use parser::extract_commands;
pub use types::{CommandInvocation, CommandName, CommandOrigin, RequiredRole};

use crate::markers;
use crate::types::{Comment, PullRequest};

/// Accounts whose comments are only executed when they carry the
/// self-command marker.
#[derive(Debug, Clone, Copy)]
pub struct Sanction<'a> {
    pub bot_login: &'a str,
    pub tool_accounts: &'a [String],
}

impl Sanction<'_> {
    fn is_automated(&self, login: &str) -> bool {
        login.eq_ignore_ascii_case(self.bot_login)
            || login.ends_with("[bot]")
            || self
                .tool_accounts
                .iter()
                .any(|t| t.eq_ignore_ascii_case(login))
    }

    /// Whether the commands in `comment` were submitted through the
    /// sanctioned path: written by a human, or by an automated account that
    /// marked the comment as a valid self-command.
    pub fn allows(&self, comment: &Comment) -> bool {
        !self.is_automated(&comment.author) || markers::has_valid_self_command(&comment.body)
    }
}

/// Ids of commands the bot has already answered.
pub fn handled_ids(comments: &[Comment], bot_login: &str) -> HashSet<String> {
    comments
        .iter()
        .filter(|c| c.author.eq_ignore_ascii_case(bot_login))
        .flat_map(|c| markers::replied_ids(&c.body).map(str::to_string))
        .collect()
}

/// Commands written in the user part of the pull request body.
pub fn body_commands(pr: &PullRequest, bot_login: &str) -> Vec<CommandInvocation> {
    let user_part = pr
        .body
        .split(markers::BODY_MARKER)
        .next()
        .unwrap_or_default();
    extract_commands(
        user_part,
        "body",
        &pr.author,
        CommandOrigin::PrBody,
        bot_login,
    )
    .into_iter()
    .filter(|c| c.name.allowed_in_body())
    .collect()
}

/// All unhandled, sanctioned commands on a pull request, oldest first.
///
/// Body commands come first, then comment commands in the order the forge
/// returned the comments.
pub fn pending_pr_commands(
    pr: &PullRequest,
    comments: &[Comment],
    sanction: Sanction<'_>,
) -> Vec<CommandInvocation> {
    let handled = handled_ids(comments, sanction.bot_login);
    let mut pending = body_commands(pr, sanction.bot_login);
    for comment in comments.iter().filter(|c| sanction.allows(c)) {
        pending.extend(extract_commands(
            &comment.body,
            &comment.id.to_string(),
            &comment.author,
            CommandOrigin::PrComment,
            sanction.bot_login,
        ));
    }
    pending.retain(|c| !handled.contains(&c.id));
    pending
}

/// All unhandled, sanctioned commands on a commit, oldest first.
pub fn pending_commit_commands(
    comments: &[Comment],
    sanction: Sanction<'_>,
) -> Vec<CommandInvocation> {
    let handled = handled_ids(comments, sanction.bot_login);
    comments
        .iter()
        .filter(|c| sanction.allows(c))
        .flat_map(|c| {
            extract_commands(
                &c.body,
                &c.id.to_string(),
                &c.author,
                CommandOrigin::CommitComment,
                sanction.bot_login,
            )
        })
        .filter(|c| !handled.contains(&c.id))
        .collect()
}
