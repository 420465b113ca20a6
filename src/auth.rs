//! Command authorization.
//!
//! Authorization runs before a handler touches any state, so a denied
//! command mutates nothing and is answered with exactly one reply naming the
//! missing role.

use crate::census::CensusSnapshot;
use crate::commands::args::{CsrArg, parse_csr};
use crate::commands::{CommandInvocation, CommandName, CommandOrigin, RequiredRole};
use crate::types::PullRequest;

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    Denied(String),
}

/// Facts an authorization decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext<'a> {
    /// The pull request, absent for commit comments.
    pub pr: Option<&'a PullRequest>,
    pub census: &'a CensusSnapshot,
    pub integrators: &'a [String],
    /// Maintainers of the approval rule matching the pull request, if any
    /// rule matches.
    pub maintainers: Option<&'a [String]>,
}

/// The role `command` requires, taking its arguments into account.
pub fn required_role(command: &CommandInvocation) -> RequiredRole {
    match command.name {
        CommandName::Csr | CommandName::Jep if is_unneeded(&command.args) => {
            RequiredRole::ReviewerOnly
        }
        CommandName::Backport if command.origin == CommandOrigin::CommitComment => {
            RequiredRole::Anyone
        }
        name => name.base_role(),
    }
}

fn is_unneeded(args: &str) -> bool {
    parse_csr(args) == Some(CsrArg::Unneeded)
}

fn is_maintainer(login: &str, maintainers: &[String], census: &CensusSnapshot) -> bool {
    let username = census.contributor_for_login(login).map(|c| c.username.as_str());
    maintainers
        .iter()
        .any(|m| m.eq_ignore_ascii_case(login) || Some(m.as_str()) == username)
}

/// Decides whether `command.issuer` may run `command`.
pub fn authorize(command: &CommandInvocation, ctx: &AuthContext<'_>) -> Authorization {
    let issuer = command.issuer.as_str();
    let is_author = ctx.pr.is_some_and(|pr| pr.is_author(issuer));
    let allowed = match required_role(command) {
        RequiredRole::Anyone => true,
        RequiredRole::PrAuthor => is_author,
        RequiredRole::AuthorOrReviewer => is_author || ctx.census.is_reviewer(issuer),
        RequiredRole::ReviewerOnly => ctx.census.is_reviewer(issuer),
        RequiredRole::AuthorOrCommitter => is_author || ctx.census.is_committer(issuer),
        RequiredRole::Integrator => {
            ctx.census.is_integrator(issuer)
                || ctx
                    .integrators
                    .iter()
                    .any(|i| i.eq_ignore_ascii_case(issuer))
        }
        RequiredRole::Maintainer => match ctx.maintainers {
            None => return Authorization::Denied(not_configured(command, ctx.pr)),
            Some(maintainers) => is_maintainer(issuer, maintainers, ctx.census),
        },
    };
    if allowed {
        Authorization::Allowed
    } else {
        Authorization::Denied(denial(command, ctx.pr))
    }
}

fn not_configured(command: &CommandInvocation, pr: Option<&PullRequest>) -> String {
    match (command.name, pr) {
        (CommandName::Approve, Some(pr)) => format!(
            "Changes to branch {} do not require maintainer approval",
            pr.target_ref
        ),
        (CommandName::Approve, None) => {
            "Changes in this repository do not require maintainer approval.".to_string()
        }
        _ => format!(
            "this repository or the target branch of this pull request have not been configured to use the `{}` command.",
            command.name.as_str()
        ),
    }
}

fn denial(command: &CommandInvocation, pr: Option<&PullRequest>) -> String {
    let author = pr.map(|p| p.author.as_str()).unwrap_or_default();
    match (command.name, required_role(command)) {
        (CommandName::Csr, RequiredRole::ReviewerOnly) => {
            "only Reviewers can determine that a CSR is not needed.".to_string()
        }
        (CommandName::Jep, RequiredRole::ReviewerOnly) => {
            "only Reviewers can determine that a JEP request is not needed.".to_string()
        }
        (CommandName::Csr, _) => {
            "only the pull request author and Reviewers are allowed to use the `csr` command."
                .to_string()
        }
        (CommandName::Jep, _) => {
            "Only the pull request author and Reviewers are allowed to use the `jep` command."
                .to_string()
        }
        (CommandName::Label, _) => {
            "Only the PR author and project Committers are allowed to modify labels on a PR."
                .to_string()
        }
        (CommandName::Branch, _) => {
            "Only integrators for this repository are allowed to use the `/branch` command."
                .to_string()
        }
        (name @ (CommandName::Approval | CommandName::Approve), _) => format!(
            "only the repository maintainers are allowed to use the `{}` command.",
            name.as_str()
        ),
        (name, RequiredRole::PrAuthor) => format!(
            "Only the author (@{}) is allowed to issue the `{}` command.",
            author,
            name.as_str()
        ),
        (name, _) => format!(
            "Only the pull request author and project Committers are allowed to use the `{}` command.",
            name.as_str()
        ),
    }
}
