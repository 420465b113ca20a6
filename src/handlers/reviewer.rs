//! `/reviewer credit|remove`.

use super::{PrContext, bot_bodies, bullet_list, replay};
use crate::census::Contributor;
use crate::commands::CommandInvocation;
use crate::commands::args::parse_reviewer;
use crate::desired::DesiredState;
use crate::markers;
use crate::types::{Comment, ReviewVerdict, latest_reviews};

const SYNTAX: &str = "Syntax: `/reviewer (credit|remove) [@user | census-user](, [@user | census-user])*`. For example:\n\n\
 * `/reviewer credit @duke`\n\
 * `/reviewer credit duke, @rita`";

/// Census usernames credited manually, including changes queued in this pass.
pub fn credited(comments: &[Comment], pending: &[String], bot_login: &str) -> Vec<String> {
    replay(bot_bodies(comments, pending, bot_login).flat_map(markers::reviewer_changes))
}

fn lookup<'a>(ctx: &PrContext<'a>, user: &str) -> Option<&'a Contributor> {
    match user.strip_prefix('@') {
        Some(login) => ctx.census.contributor_for_login(login),
        None => ctx
            .census
            .contributor(user)
            .or_else(|| ctx.census.contributor_for_login(user)),
    }
}

/// The latest review verdict of any forge login mapped to `contributor`.
fn review_verdict(ctx: &PrContext<'_>, contributor: &Contributor) -> Option<ReviewVerdict> {
    let latest = latest_reviews(ctx.reviews);
    contributor
        .logins
        .iter()
        .find_map(|login| latest.get(&login.to_ascii_lowercase()))
        .map(|r| r.verdict)
}

pub fn run(ctx: &PrContext<'_>, command: &CommandInvocation, desired: &mut DesiredState) {
    let Some(args) = parse_reviewer(&command.args) else {
        desired.reply(command, format!("Missing or invalid arguments.\n{}", SYNTAX));
        return;
    };

    let mut lines = Vec::new();
    for user in &args.users {
        let Some(contributor) = lookup(ctx, user) else {
            lines.push(format!("Could not parse `{}` as a valid reviewer.\n{}", user, SYNTAX));
            continue;
        };
        let username = &contributor.username;

        if args.credit {
            match review_verdict(ctx, contributor) {
                Some(ReviewVerdict::Approved) => lines.push(format!(
                    "Reviewer `{}` has already made an authenticated review of this PR, and does not need to be credited manually.",
                    username
                )),
                Some(_) => lines.push(format!(
                    "Reviewer `{}` has already made an authenticated review of this PR without approving it, and cannot be credited manually.",
                    username
                )),
                None => lines.push(format!(
                    "Reviewer `{}` successfully credited.\n{}",
                    username,
                    markers::reviewer_added(username)
                )),
            }
            continue;
        }

        let existing = credited(ctx.comments, desired.pending_comments(), &ctx.config.bot_login);
        if existing.is_empty() {
            lines.push(
                "There are no manually specified reviewers associated with this pull request."
                    .to_string(),
            );
        } else if !existing.contains(username) {
            lines.push(format!(
                "Reviewer `{}` was not found.\nCurrent credited reviewers are:\n{}",
                username,
                bullet_list(&existing)
            ));
        } else {
            lines.push(format!(
                "Reviewer `{}` successfully removed.\n{}",
                username,
                markers::reviewer_removed(username)
            ));
        }
    }
    desired.reply(command, lines.join("\n"));
}
