//! Command table and parsed command invocations.

use serde::{Deserialize, Serialize};

/// The role a command requires of its issuer.
///
/// For `csr` and `jep` the role depends on the arguments; see
/// [`crate::auth::required_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredRole {
    Anyone,
    PrAuthor,
    AuthorOrReviewer,
    ReviewerOnly,
    AuthorOrCommitter,
    Integrator,
    /// Maintainers of the approval rule matching the pull request.
    Maintainer,
}

/// Canonical command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandName {
    Help,
    Label,
    Contributor,
    Reviewer,
    Approval,
    Approve,
    Csr,
    Jep,
    Backport,
    Branch,
}

impl CommandName {
    pub const ALL: [CommandName; 10] = [
        CommandName::Help,
        CommandName::Label,
        CommandName::Contributor,
        CommandName::Reviewer,
        CommandName::Approval,
        CommandName::Approve,
        CommandName::Csr,
        CommandName::Jep,
        CommandName::Backport,
        CommandName::Branch,
    ];

    /// Looks up a written command name, case-insensitively, resolving aliases.
    pub fn lookup(written: &str) -> Option<CommandName> {
        let written = written.to_ascii_lowercase();
        if written == "cc" {
            return Some(CommandName::Label);
        }
        CommandName::ALL
            .into_iter()
            .find(|name| name.as_str() == written)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Help => "help",
            CommandName::Label => "label",
            CommandName::Contributor => "contributor",
            CommandName::Reviewer => "reviewer",
            CommandName::Approval => "approval",
            CommandName::Approve => "approve",
            CommandName::Csr => "csr",
            CommandName::Jep => "jep",
            CommandName::Backport => "backport",
            CommandName::Branch => "branch",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CommandName::Help => "shows this text",
            CommandName::Label => "add or remove an additional classification label",
            CommandName::Contributor => "adds or removes additional contributors for a PR",
            CommandName::Reviewer => "manage additional reviewers for a PR",
            CommandName::Approval => "approve or disapprove an update change",
            CommandName::Approve => "approve or reject the maintainer approval request of an issue",
            CommandName::Csr => {
                "require a compatibility and specification request (CSR) for this pull request"
            }
            CommandName::Jep => "require a JDK Enhancement Proposal (JEP) for this pull request",
            CommandName::Backport => "create a backport",
            CommandName::Branch => "create a branch",
        }
    }

    /// Role required when the role does not depend on the arguments.
    pub fn base_role(&self) -> RequiredRole {
        match self {
            CommandName::Help => RequiredRole::Anyone,
            CommandName::Label => RequiredRole::AuthorOrCommitter,
            CommandName::Contributor | CommandName::Reviewer => RequiredRole::PrAuthor,
            CommandName::Approval | CommandName::Approve => RequiredRole::Maintainer,
            CommandName::Csr | CommandName::Jep => RequiredRole::AuthorOrReviewer,
            CommandName::Backport => RequiredRole::AuthorOrCommitter,
            CommandName::Branch => RequiredRole::Integrator,
        }
    }

    pub fn allowed_in_pr(&self) -> bool {
        !matches!(self, CommandName::Branch)
    }

    /// Whether the command may be written in the pull request body.
    pub fn allowed_in_body(&self) -> bool {
        matches!(
            self,
            CommandName::Label
                | CommandName::Contributor
                | CommandName::Approval
                | CommandName::Csr
                | CommandName::Jep
        )
    }

    pub fn allowed_in_commit(&self) -> bool {
        matches!(
            self,
            CommandName::Help | CommandName::Backport | CommandName::Branch
        )
    }
}

/// Where a command was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOrigin {
    PrComment,
    PrBody,
    CommitComment,
}

/// One command found in a comment.
///
/// `id` is unique per command: the comment id for the first command of a
/// comment, `<comment id>:<n>` for later ones, and `body` for commands in
/// the pull request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInvocation {
    pub id: String,
    pub name: CommandName,
    /// The name as written, lowercased (e.g. `cc` for [`CommandName::Label`]).
    pub written: String,
    pub args: String,
    pub issuer: String,
    pub origin: CommandOrigin,
}

impl CommandInvocation {
    /// Formats the bot's answer to this command.
    ///
    /// The answer carries the reply marker, which is what makes the command
    /// count as handled.
    pub fn reply(&self, text: &str) -> String {
        format!(
            "{}\n@{} {}",
            crate::markers::reply_marker(&self.id),
            self.issuer,
            text
        )
    }
}
