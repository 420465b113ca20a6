//! `/branch <name>` on a commit.

use tracing::info;

use super::CommitContext;
use crate::commands::CommandInvocation;
use crate::commands::args::parse_branch;
use crate::effects::calls;
use crate::effects::{EffectError, ForgeEffect, ForgeInterpreter};

const USAGE: &str = "Usage: `/branch <name>`";

/// Creates a branch at the commented commit and returns the reply text.
pub async fn run<F: ForgeInterpreter>(
    forge: &F,
    ctx: &CommitContext<'_>,
    command: &CommandInvocation,
) -> Result<String, EffectError> {
    let Some(name) = parse_branch(&command.args) else {
        return Ok(USAGE.to_string());
    };
    let web = ctx.config.web_url(&ctx.config.repo);

    let branches = calls::list_branches(forge, ctx.config.repo.clone()).await?;
    if let Some(existing) = branches.iter().find(|b| b.name == name) {
        return Ok(format!(
            "A branch with name `{}` already exists that refers to commit [{}]({}/commit/{}).",
            name,
            existing.head.abbreviate(),
            web,
            existing.head
        ));
    }

    calls::apply_forge(
        forge,
        ForgeEffect::CreateBranch {
            branch: name.clone(),
            commit: ctx.commit.clone(),
        },
    )
    .await?;
    info!(branch = %name, commit = %ctx.commit.short(), "created branch");
    Ok(format!(
        "The branch [{}]({}/tree/{}) was successfully created.",
        name, web, name
    ))
}
