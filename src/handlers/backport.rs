//! `/backport` on pull requests and on commits.
//!
//! On an open pull request the command only toggles a `backport=` label;
//! the backport itself happens once the pull request is integrated. On an
//! integrated pull request it posts a self-command on the integrated commit.
//! On a commit it runs the backport right away.

use tracing::info;

use super::{CommitContext, PrContext, Services};
use crate::backport::engine::valid_branches;
use crate::backport::{self, BackportOutcome, BackportRequest, reply, run_backport};
use crate::commands::CommandInvocation;
use crate::commands::args::{BackportArgs, parse_backport};
use crate::config::BotConfig;
use crate::desired::DesiredState;
use crate::effects::calls;
use crate::effects::{EffectError, ForgeInterpreter, TrackerInterpreter, VcsInterpreter};
use crate::markers;
use crate::types::RepoId;

const USAGE: &str = "Usage: `/backport [disable] <repository>[:<branch>]`";

enum Target {
    Valid(RepoId),
    Invalid(String),
}

fn resolve_target(config: &BotConfig, args: &BackportArgs) -> Target {
    match config.backport_target(&args.repo) {
        Some(repo) => Target::Valid(repo),
        None => Target::Invalid(reply::invalid_target(
            &args.repo,
            &config.forks.keys().cloned().collect::<Vec<_>>(),
        )),
    }
}

pub async fn run_on_pr<F, T, V>(
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
    if ctx.pr.state.is_abandoned() {
        desired.reply(
            command,
            "`/backport` cannot be used in a closed pull request that has not been integrated.",
        );
        return Ok(());
    }
    let Some(args) = parse_backport(&command.args, true) else {
        desired.reply(command, USAGE);
        return Ok(());
    };
    let target = match resolve_target(ctx.config, &args) {
        Target::Valid(repo) => repo,
        Target::Invalid(text) => {
            desired.reply(command, text);
            return Ok(());
        }
    };
    let branch = match &args.branch {
        Some(branch) => branch.clone(),
        None => calls::default_branch(services.forge, target.clone()).await?,
    };
    let label = backport::label(&target, &branch);
    let described = format!("Backport for repo `{}` on branch `{}`", target, branch);
    let marked = format!("{}:{}", target, branch);

    if args.disable {
        if desired.has_label(&label) {
            desired.remove_label(&label);
            desired.reply(
                command,
                format!(
                    "{}\n{} was successfully disabled.",
                    markers::backport_disabled(&marked),
                    described
                ),
            );
        } else {
            desired.reply(command, format!("{} was already disabled.", described));
        }
        return Ok(());
    }

    let tip = calls::resolve_branch(services.vcs, target.clone(), branch.clone()).await?;
    if tip.is_none() {
        let branches = calls::list_branches(services.forge, target.clone()).await?;
        let outcome = BackportOutcome::MissingBranch {
            branch,
            valid: valid_branches(branches.into_iter().map(|b| b.name)),
        };
        desired.reply(command, reply::render(&ctx.config.web_base_url, &outcome));
        return Ok(());
    }

    if let Some(commit) = ctx.pr.state.integrated_commit() {
        info!(pr = %ctx.pr.number, target = %marked, commit = %commit.short(), "requesting backport of integrated commit");
        desired.commit_comment(
            commit.clone(),
            backport::self_command(&target, &branch, &command.issuer),
        );
        desired.reply(
            command,
            format!(
                "{} was requested for the integrated commit [{}]({}/commit/{}). \
                 Further instructions will be posted as a comment on that commit.",
                described,
                commit.abbreviate(),
                ctx.config.web_url(&ctx.pr.repo),
                commit
            ),
        );
        return Ok(());
    }

    if desired.has_label(&label) {
        desired.reply(command, format!("{} was already enabled.", described));
        return Ok(());
    }
    desired.add_label(label);
    desired.reply(
        command,
        format!(
            "{}\n{} was successfully enabled and will be performed once this pull request has \
             been integrated. Further instructions will be provided at that time.",
            markers::backport_enabled(&marked),
            described
        ),
    );
    Ok(())
}

/// Runs a backport of the commented commit and returns the reply text.
///
/// `command.issuer` is the requester; for automatic backports the pass has
/// already replaced the bot with the user named in the self-command.
pub async fn run_on_commit<F, T, V>(
    services: Services<'_, F, T, V>,
    ctx: &CommitContext<'_>,
    command: &CommandInvocation,
) -> Result<String, EffectError>
where
    F: ForgeInterpreter,
    T: TrackerInterpreter,
    V: VcsInterpreter,
{
    let Some(args) = parse_backport(&command.args, false) else {
        return Ok(USAGE.to_string());
    };
    let target = match resolve_target(ctx.config, &args) {
        Target::Valid(repo) => repo,
        Target::Invalid(text) => return Ok(text),
    };
    let Some(fork) = ctx.config.forks.get(&target) else {
        return Ok(reply::invalid_target(&args.repo, &[]));
    };

    let request = BackportRequest {
        source: &ctx.config.repo,
        commit: ctx.commit,
        target: &target,
        fork,
        branch: args.branch.as_deref(),
        requester: &command.issuer,
    };
    let outcome = run_backport(services.forge, services.vcs, request).await?;
    Ok(reply::render(&ctx.config.web_base_url, &outcome))
}
