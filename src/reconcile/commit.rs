//! The commit pass: commands written as commit comments.
//!
//! Replies are posted as each command finishes, so a later failure leaves
//! the earlier commands answered and they are not run again.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::{ReconcileError, Steward};
use crate::commands::{CommandInvocation, Sanction, pending_commit_commands};
use crate::effects::calls;
use crate::effects::{ForgeEffect, ForgeInterpreter, TrackerInterpreter, VcsInterpreter};
use crate::handlers::{self, CommitContext};
use crate::markers;
use crate::types::{Comment, Sha};

impl<F, T, V> Steward<F, T, V>
where
    F: ForgeInterpreter,
    T: TrackerInterpreter,
    V: VcsInterpreter,
{
    /// Runs the pending commands on `commit`. Returns how many were answered.
    #[instrument(skip(self, cancel), fields(commit = %commit.short()))]
    pub async fn reconcile_commit(
        &self,
        commit: &Sha,
        cancel: &CancellationToken,
    ) -> Result<usize, ReconcileError> {
        let config = &*self.config;
        let comments = calls::list_commit_comments(&self.forge, commit.clone()).await?;
        let sanction = Sanction {
            bot_login: &config.bot_login,
            tool_accounts: &config.tool_accounts,
        };
        let pending = pending_commit_commands(&comments, sanction);
        if pending.is_empty() {
            debug!("no pending commit commands");
            return Ok(0);
        }

        let census = self.census_snapshot().await?;
        let ctx = CommitContext {
            config,
            commit,
            census: &census,
        };
        let mut answered = 0;
        for command in pending {
            if cancel.is_cancelled() {
                return Err(ReconcileError::Cancelled);
            }
            let command = on_behalf_of(command, &comments, &config.bot_login);
            let body = handlers::handle_commit_command(self.services(), &ctx, &command).await?;
            calls::apply_forge(
                &self.forge,
                ForgeEffect::PostCommitComment {
                    commit: commit.clone(),
                    body,
                },
            )
            .await?;
            info!(id = %command.id, command = command.name.as_str(), "answered commit command");
            answered += 1;
        }
        Ok(answered)
    }
}

/// A self-command acts for the user named in its comment.
fn on_behalf_of(mut command: CommandInvocation, comments: &[Comment], bot: &str) -> CommandInvocation {
    if !command.issuer.eq_ignore_ascii_case(bot) {
        return command;
    }
    let comment_id = command.id.split(':').next().unwrap_or_default();
    let requester = comments
        .iter()
        .find(|c| c.id.to_string() == comment_id)
        .and_then(|c| markers::backport_requester(&c.body));
    if let Some(requester) = requester {
        command.issuer = requester;
    }
    command
}
