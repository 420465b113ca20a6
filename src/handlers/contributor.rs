//! `/contributor add|remove`.
//!
//! Additional contributors live only in the markers of the bot's replies and
//! are replayed in order whenever the list is needed.

use std::sync::LazyLock;

use regex::Regex;

use super::{PrContext, bot_bodies, bullet_list, replay};
use crate::census::CensusSnapshot;
use crate::commands::CommandInvocation;
use crate::commands::args::parse_contributor;
use crate::desired::DesiredState;
use crate::markers;
use crate::types::Comment;

static NAME_AND_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^<>]+?)\s*<(\S+@\S+\.[^\s>]+)>$").unwrap());

const SYNTAX: &str = "Syntax: `/contributor (add|remove) [@user | census-user | Full Name <email@address>]`. For example:\n\n\
 * `/contributor add @duke`\n\
 * `/contributor add duke`\n\
 * `/contributor add J. Duke <duke@example.com>`";

/// Resolves a written contributor to a `Full Name <email>` identity.
fn resolve(user: &str, census: &CensusSnapshot) -> Result<String, String> {
    if let Some(login) = user.strip_prefix('@') {
        return census
            .contributor_for_login(login)
            .and_then(|c| census.full_identity(&c.username))
            .ok_or_else(|| {
                format!(
                    "`@{}` is not associated with a census identity that has a full name recorded.",
                    login
                )
            });
    }
    if let Some(caps) = NAME_AND_EMAIL.captures(user) {
        return Ok(format!("{} <{}>", caps[1].trim(), &caps[2]));
    }
    if !user.contains(['<', '>', '@', ' ']) && census.contributor(user).is_some() {
        return census.full_identity(user).ok_or_else(|| {
            format!("`{}` does not have a full name recorded in the census.", user)
        });
    }
    Err(format!("Could not parse `{}` as a valid contributor.\n{}", user, SYNTAX))
}

/// Additional contributors, including changes queued in this pass.
pub fn current(comments: &[Comment], pending: &[String], bot_login: &str) -> Vec<String> {
    replay(bot_bodies(comments, pending, bot_login).flat_map(markers::contributor_changes))
}

pub fn run(ctx: &PrContext<'_>, command: &CommandInvocation, desired: &mut DesiredState) {
    let Some(args) = parse_contributor(&command.args) else {
        desired.reply(command, format!("Missing or invalid arguments.\n{}", SYNTAX));
        return;
    };
    let identity = match resolve(&args.user, ctx.census) {
        Ok(identity) => identity,
        Err(message) => {
            desired.reply(command, message);
            return;
        }
    };

    if args.add {
        desired.reply(
            command,
            format!(
                "Contributor `{}` successfully added.\n{}",
                identity,
                markers::contributor_added(&identity)
            ),
        );
        return;
    }

    let existing = current(ctx.comments, desired.pending_comments(), &ctx.config.bot_login);
    let text = if existing.is_empty() {
        "There are no additional contributors associated with this pull request.".to_string()
    } else if !existing.contains(&identity) {
        format!(
            "Contributor `{}` was not found.\nCurrent additional contributors are:\n{}",
            identity,
            bullet_list(&existing)
        )
    } else {
        format!(
            "Contributor `{}` successfully removed.\n{}",
            identity,
            markers::contributor_removed(&identity)
        )
    };
    desired.reply(command, text);
}
