//! `/jep <id>|unneeded`.

use super::{PrContext, bot_bodies};
use crate::commands::CommandInvocation;
use crate::commands::args::{JepArg, parse_jep};
use crate::desired::DesiredState;
use crate::effects::calls;
use crate::effects::{EffectError, TrackerInterpreter};
use crate::markers::{self, JepMarker};
use crate::requirement::jep::{JEP_LABEL, display_name, lookup, marker_for};
use crate::types::{Issue, IssueId};

fn help(project: &str) -> String {
    format!(
        "Command syntax:\n\
         * `/jep <jep-id>|<issue-id>|unneeded`\n\n\
         Some examples:\n\n\
         * `/jep JEP-123`\n\
         * `/jep 123`\n\
         * `/jep {project}-4567`\n\
         * `/jep unneeded`\n\n\
         Note:\n\
         The prefix (i.e. `JEP-` or `{project}-`) is optional. If the argument is given without prefix, it will be tried first as a JEP ID and second as an issue ID. The issue type must be `JEP`."
    )
}

pub async fn run<T: TrackerInterpreter>(
    tracker: &T,
    ctx: &PrContext<'_>,
    command: &CommandInvocation,
    desired: &mut DesiredState,
) -> Result<(), EffectError> {
    let project = match (&ctx.config.issue_project, ctx.config.enable_jep) {
        (Some(project), true) => project.as_str(),
        _ => {
            desired.reply(
                command,
                "This repository has not been configured to use the `jep` command.",
            );
            return Ok(());
        }
    };
    let Some(arg) = parse_jep(&command.args, project) else {
        desired.reply(command, help(project));
        return Ok(());
    };

    if arg == JepArg::Unneeded {
        if let Some(jep) = recorded_jep(tracker, ctx, desired).await?
            && jep.is_open()
            && !jep.is_targeted_jep()
        {
            let link = format!("[{}]({})", display_name(&jep), jep.web_url);
            desired.reply(
                command,
                format!(
                    "this pull request depends on {}, which has not been withdrawn.
                     So you can't directly indicate that a JEP request is not needed for this pull request.
                     Please firstly withdraw the JEP: {}, and then use the command `/jep unneeded` again.",
                    link, link
                ),
            );
            return Ok(());
        }
        desired.remove_label(JEP_LABEL);
        desired.reply(
            command,
            format!(
                "{}\ndetermined that the JEP request is not needed for this pull request.",
                JepMarker::unneeded().render()
            ),
        );
        return Ok(());
    }

    let Some(jep) = lookup(tracker, &arg, project).await? else {
        desired.reply(
            command,
            format!(
                "The JEP issue was not found. Please make sure you have entered it correctly.\n{}",
                help(project)
            ),
        );
        return Ok(());
    };
    if !jep.is_type("JEP") {
        desired.reply(
            command,
            format!(
                "The issue `{}` is not a JEP. Please make sure you have entered it correctly.\n{}",
                jep.id,
                help(project)
            ),
        );
        return Ok(());
    }

    let marker = marker_for(&jep).render();
    let link = format!("[{}]({})", display_name(&jep), jep.web_url);
    if jep.is_targeted_jep() {
        desired.remove_label(JEP_LABEL);
        desired.reply(
            command,
            format!(
                "{}\nThe JEP for this pull request, {}, has already been targeted.",
                marker, link
            ),
        );
    } else {
        desired.add_label(JEP_LABEL);
        desired.reply(
            command,
            format!(
                "{}\nThis pull request will not be integrated until the {} has been targeted.",
                marker, link
            ),
        );
    }
    Ok(())
}

/// The JEP named by the latest marker, unless that marker says unneeded.
async fn recorded_jep<T: TrackerInterpreter>(
    tracker: &T,
    ctx: &PrContext<'_>,
    desired: &DesiredState,
) -> Result<Option<Issue>, EffectError> {
    let latest = bot_bodies(ctx.comments, desired.pending_comments(), &ctx.config.bot_login)
        .filter_map(markers::jep_marker)
        .last();
    match latest {
        Some(m) if !m.is_unneeded() => calls::get_issue(tracker, IssueId::new(&m.issue)).await,
        _ => Ok(None),
    }
}
