//! Command handlers.
//!
//! Every command runs in two steps: [`crate::auth::authorize`] decides, then
//! the handler parses its arguments and writes into the pass's
//! [`DesiredState`]. A denied or malformed command is answered with a reply
//! and touches nothing else.
//!
//! | Command | Handler | Context |
//! |---------|---------|---------|
//! | `help` | [`help`] | PR, commit |
//! | `label` | [`label`] | PR |
//! | `contributor` | [`contributor`] | PR |
//! | `reviewer` | [`reviewer`] | PR |
//! | `approval` | [`approval`] | PR |
//! | `approve` | [`approve`] | PR |
//! | `csr` | [`csr`] | PR |
//! | `jep` | [`jep`] | PR |
//! | `backport` | [`backport`] | PR, commit |
//! | `branch` | [`branch`] | commit |
//!
//! Commit commands have no desired state: their handlers apply their effects
//! directly and return the reply text.

pub mod approval;
pub mod approve;
pub mod backport;
pub mod branch;
pub mod contributor;
pub mod csr;
pub mod help;
pub mod jep;
pub mod label;
pub mod reviewer;

use tracing::{debug, info};

use crate::auth::{AuthContext, Authorization, authorize};
use crate::census::CensusSnapshot;
use crate::commands::{CommandInvocation, CommandName};
use crate::config::BotConfig;
use crate::desired::DesiredState;
use crate::effects::{EffectError, ForgeInterpreter, TrackerInterpreter, VcsInterpreter};
use crate::types::{Comment, Issue, PullRequest, Review, Sha};

/// The collaborators a handler may call.
#[derive(Debug)]
pub struct Services<'a, F, T, V> {
    pub forge: &'a F,
    pub tracker: &'a T,
    pub vcs: &'a V,
}

impl<F, T, V> Clone for Services<'_, F, T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F, T, V> Copy for Services<'_, F, T, V> {}

/// What a pull request command may read.
#[derive(Debug, Clone, Copy)]
pub struct PrContext<'a> {
    pub config: &'a BotConfig,
    pub pr: &'a PullRequest,
    pub comments: &'a [Comment],
    pub reviews: &'a [Review],
    pub census: &'a CensusSnapshot,
    /// The issue named by the pull request title, if it exists.
    pub main_issue: Option<&'a Issue>,
    /// The CSR governing the pull request, selected before commands run.
    pub csr: Option<&'a Issue>,
}

/// What a commit command may read.
#[derive(Debug, Clone, Copy)]
pub struct CommitContext<'a> {
    pub config: &'a BotConfig,
    pub commit: &'a Sha,
    pub census: &'a CensusSnapshot,
}

/// Runs one pull request command against `desired`.
///
/// Errors are collaborator failures only; everything a user can get wrong
/// is answered with a reply.
pub async fn handle_pr_command<F, T, V>(
    services: Services<'_, F, T, V>,
    ctx: &PrContext<'_>,
    command: &CommandInvocation,
    desired: &mut DesiredState,
) -> Result<(), EffectError>
where
    F: ForgeInterpreter,
    T: TrackerInterpreter,
    V: VcsInterpreter,
{
    if !command.name.allowed_in_pr() {
        desired.reply(
            command,
            format!(
                "The command `{}` can only be used in comments on commits.",
                command.name.as_str()
            ),
        );
        return Ok(());
    }

    let auth = AuthContext {
        pr: Some(ctx.pr),
        census: ctx.census,
        integrators: &ctx.config.integrators,
        maintainers: ctx
            .config
            .approval_rule(&ctx.pr.target_ref)
            .map(|r| r.maintainers.as_slice()),
    };
    if let Authorization::Denied(message) = authorize(command, &auth) {
        info!(
            pr = %ctx.pr.number,
            command = command.name.as_str(),
            issuer = %command.issuer,
            "command denied"
        );
        desired.reply(command, message);
        return Ok(());
    }

    debug!(
        pr = %ctx.pr.number,
        id = %command.id,
        command = command.name.as_str(),
        "executing command"
    );
    match command.name {
        CommandName::Help => desired.reply(command, help::help_text(command.origin)),
        CommandName::Label => label::run(ctx, command, desired),
        CommandName::Contributor => contributor::run(ctx, command, desired),
        CommandName::Reviewer => reviewer::run(ctx, command, desired),
        CommandName::Approval => approval::run(ctx, command, desired),
        CommandName::Approve => approve::run(ctx, command, desired),
        CommandName::Csr => csr::run(ctx, command, desired),
        CommandName::Jep => jep::run(services.tracker, ctx, command, desired).await?,
        CommandName::Backport => backport::run_on_pr(services, ctx, command, desired).await?,
        // Refused above.
        CommandName::Branch => {}
    }
    Ok(())
}

/// Runs one commit command and returns the full reply body.
pub async fn handle_commit_command<F, T, V>(
    services: Services<'_, F, T, V>,
    ctx: &CommitContext<'_>,
    command: &CommandInvocation,
) -> Result<String, EffectError>
where
    F: ForgeInterpreter,
    T: TrackerInterpreter,
    V: VcsInterpreter,
{
    if !command.name.allowed_in_commit() {
        return Ok(command.reply(&format!(
            "The command `{}` can only be used in pull requests.",
            command.name.as_str()
        )));
    }

    let auth = AuthContext {
        pr: None,
        census: ctx.census,
        integrators: &ctx.config.integrators,
        maintainers: None,
    };
    if let Authorization::Denied(message) = authorize(command, &auth) {
        info!(
            commit = %ctx.commit.short(),
            command = command.name.as_str(),
            issuer = %command.issuer,
            "command denied"
        );
        return Ok(command.reply(&message));
    }

    debug!(
        commit = %ctx.commit.short(),
        id = %command.id,
        command = command.name.as_str(),
        "executing commit command"
    );
    let text = match command.name {
        CommandName::Backport => backport::run_on_commit(services, ctx, command).await?,
        CommandName::Branch => branch::run(services.forge, ctx, command).await?,
        _ => help::help_text(command.origin),
    };
    Ok(command.reply(&text))
}

/// Replays `(added, value)` changes in order; a later change of the same
/// value wins.
pub(crate) fn replay(changes: impl IntoIterator<Item = (bool, String)>) -> Vec<String> {
    let mut current: Vec<String> = Vec::new();
    for (added, value) in changes {
        current.retain(|v| v != &value);
        if added {
            current.push(value);
        }
    }
    current
}

/// Bodies of bot comments, followed by the comments queued in this pass.
pub(crate) fn bot_bodies<'a>(
    comments: &'a [Comment],
    pending: &'a [String],
    bot_login: &'a str,
) -> impl Iterator<Item = &'a str> {
    comments
        .iter()
        .filter(move |c| c.author.eq_ignore_ascii_case(bot_login))
        .map(|c| c.body.as_str())
        .chain(pending.iter().map(String::as_str))
}

/// Renders a list of values as `- \`value\`` lines.
pub(crate) fn bullet_list<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| format!("- `{}`", v.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandOrigin;
    use crate::markers;
    use crate::test_utils::{
        FakeForge, FakeTracker, FakeVcs, census_fixture, comment, pull_request, test_config,
    };

    fn invocation(name: CommandName, args: &str, issuer: &str) -> CommandInvocation {
        CommandInvocation {
            id: "100".into(),
            name,
            written: name.as_str().into(),
            args: args.into(),
            issuer: issuer.into(),
            origin: CommandOrigin::PrComment,
        }
    }

    #[test]
    fn replay_keeps_latest_change_per_value() {
        let changes = vec![
            (true, "a".to_string()),
            (true, "b".to_string()),
            (false, "a".to_string()),
            (true, "c".to_string()),
            (true, "a".to_string()),
        ];
        assert_eq!(replay(changes), vec!["b", "c", "a"]);
    }

    #[test]
    fn bot_bodies_skip_humans_and_include_pending() {
        let comments = vec![comment(1, "steward", "one"), comment(2, "duke", "two")];
        let pending = vec!["three".to_string()];
        let bodies: Vec<_> = bot_bodies(&comments, &pending, "Steward").collect();
        assert_eq!(bodies, vec!["one", "three"]);
    }

    #[tokio::test]
    async fn denied_command_only_replies() {
        let (forge, tracker, vcs) = (FakeForge::new(), FakeTracker::new(), FakeVcs::new());
        let services = Services {
            forge: &forge,
            tracker: &tracker,
            vcs: &vcs,
        };
        let config = test_config();
        let census = census_fixture();
        let pr = pull_request(1);
        let ctx = PrContext {
            config: &config,
            pr: &pr,
            comments: &[],
            reviews: &[],
            census: &census,
            main_issue: None,
            csr: None,
        };
        let mut desired = DesiredState::from_observed(&pr);
        let cmd = invocation(CommandName::Label, "add build", "stranger");
        handle_pr_command(services, &ctx, &cmd, &mut desired)
            .await
            .unwrap();

        assert_eq!(desired.labels, pr.labels);
        assert_eq!(desired.pending_comments().len(), 1);
        assert!(desired.pending_comments()[0].contains(&markers::reply_marker("100")));
        assert!(desired.pending_comments()[0].contains("Only the PR author and project Committers"));
        assert!(forge.calls().is_empty());
    }

    #[tokio::test]
    async fn branch_is_refused_on_pull_requests() {
        let (forge, tracker, vcs) = (FakeForge::new(), FakeTracker::new(), FakeVcs::new());
        let services = Services {
            forge: &forge,
            tracker: &tracker,
            vcs: &vcs,
        };
        let config = test_config();
        let census = census_fixture();
        let pr = pull_request(1);
        let ctx = PrContext {
            config: &config,
            pr: &pr,
            comments: &[],
            reviews: &[],
            census: &census,
            main_issue: None,
            csr: None,
        };
        let mut desired = DesiredState::from_observed(&pr);
        let cmd = invocation(CommandName::Branch, "jdk-22", "integrator-gh");
        handle_pr_command(services, &ctx, &cmd, &mut desired)
            .await
            .unwrap();
        assert!(desired.pending_comments()[0].contains("only be used in comments on commits"));
    }
}
