//! Backports: cherry-picking a commit onto a branch of a fork target.
//!
//! A backport is requested either by `/backport` on a commit, or by enabling
//! a target on a pull request with a `backport=<repo>:<branch>` label. When
//! such a pull request is integrated, the pass posts one self-command per
//! label on the integrated commit, and the commit pass performs them.
//!
//! The engine never remembers attempts: each request is computed from the
//! current branch tips, and the backport branch is force-pushed.

pub mod engine;
pub mod reply;

use crate::markers;
use crate::types::{RepoId, Sha};

pub use engine::{BackportOutcome, BackportPlan, BackportRequest, run_backport};

const LABEL_PREFIX: &str = "backport=";

/// The label enabling an automatic backport to `repo:branch`.
pub fn label(repo: &RepoId, branch: &str) -> String {
    format!("{}{}:{}", LABEL_PREFIX, repo, branch)
}

/// Parses a `backport=<repo>:<branch>` label.
pub fn parse_label(label: &str) -> Option<(RepoId, String)> {
    let (repo, branch) = label.strip_prefix(LABEL_PREFIX)?.split_once(':')?;
    if branch.is_empty() {
        return None;
    }
    Some((repo.parse().ok()?, branch.to_string()))
}

/// Name of the branch a backport is pushed to.
///
/// The target branch is part of the name unless it is the default branch.
pub fn branch_name(requester: &str, commit: &Sha, target_branch: Option<&str>) -> String {
    match target_branch {
        Some(branch) => format!("backport-{}-{}-{}", requester, commit.abbreviate(), branch),
        None => format!("backport-{}-{}", requester, commit.abbreviate()),
    }
}

/// The commit comment the bot posts to backport an integrated pull request.
pub fn self_command(repo: &RepoId, branch: &str, requester: &str) -> String {
    format!(
        "/backport {}:{}\n{}\n{}",
        repo,
        branch,
        markers::backport_requested_by(requester),
        markers::VALID_SELF_COMMAND
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandName, CommandOrigin, extract_commands};

    #[test]
    fn branch_name_omits_default_branch() {
        let commit = Sha::new("0123456789abcdef0123456789abcdef01234567");
        assert_eq!(branch_name("duke", &commit, None), "backport-duke-01234567");
        assert_eq!(
            branch_name("duke", &commit, Some("jdk17.0.9")),
            "backport-duke-01234567-jdk17.0.9"
        );
    }

    #[test]
    fn self_command_is_a_sanctioned_backport() {
        let text = self_command(&RepoId::new("openjdk", "jdk17u"), "master", "duke");
        let commands = extract_commands(&text, "9", "steward", CommandOrigin::CommitComment, "steward");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].name, CommandName::Backport);
        assert_eq!(commands[0].args, "openjdk/jdk17u:master");
        assert!(markers::has_valid_self_command(&text));
        assert_eq!(markers::backport_requester(&text).as_deref(), Some("duke"));
    }

    #[test]
    fn rejects_foreign_labels() {
        assert_eq!(parse_label("csr"), None);
        assert_eq!(parse_label("backport=openjdk/jdk17u:"), None);
        assert_eq!(parse_label("backport=jdk17u:master"), None);
    }

    #[test]
    fn label_names_repo_and_branch() {
        let id = RepoId::new("openjdk", "jdk17u");
        assert_eq!(label(&id, "jdk17.0.9"), "backport=openjdk/jdk17u:jdk17.0.9");
        assert_eq!(
            parse_label("backport=openjdk/jdk17u:jdk17.0.9"),
            Some((id, "jdk17.0.9".to_string()))
        );
    }
}
