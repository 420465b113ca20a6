//! `/approve [<id>] yes|no`: the maintainer verdict on the main issue.
//!
//! Unlike `/approval`, this only writes the issue; every pull request for
//! the issue picks the verdict up on its next pass.

use super::PrContext;
use crate::commands::CommandInvocation;
use crate::commands::args::parse_approve;
use crate::desired::DesiredState;
use crate::requirement::approval::issue_labels_after;
use crate::types::IssueId;

const USAGE: &str = "usage: `/approve [<id>] (yes|no)`";

pub fn run(ctx: &PrContext<'_>, command: &CommandInvocation, desired: &mut DesiredState) {
    let Some(rule) = ctx.config.approval_rule(&ctx.pr.target_ref) else {
        return;
    };
    let Some(args) = parse_approve(&command.args) else {
        desired.reply(command, USAGE);
        return;
    };
    let project = ctx.config.issue_project.as_deref().unwrap_or_default();

    let Some(main) = ctx.main_issue else {
        desired.reply(command, "There is no issue associated with this pull request.");
        return;
    };
    if let Some(written) = &args.issue {
        let requested = match written.split_once('-') {
            Some((prefix, number)) => {
                if !prefix.eq_ignore_ascii_case(project) {
                    desired.reply(
                        command,
                        format!("{}: Can only approve issues in the {} project.", written, project),
                    );
                    return;
                }
                IssueId::in_project(project, number)
            }
            None => IssueId::in_project(project, written),
        };
        if requested != main.id {
            desired.reply(command, "This issue is not associated with this pull request.");
            return;
        }
    }

    let triple = rule.labels(&ctx.pr.target_ref);
    let labels = desired.issue_labels().unwrap_or(&main.labels).clone();
    if !labels.contains(&triple.requested) {
        desired.reply(
            command,
            format!(
                "{}: There is no maintainer approval request for this issue.",
                main.id
            ),
        );
        return;
    }

    let mut current = main.clone();
    current.labels = labels;
    desired.set_issue_labels(
        &main.id,
        issue_labels_after(&current, &triple, Some(args.approve)),
    );
    let outcome = if args.approve { "approved" } else { "rejected" };
    desired.reply(
        command,
        format!("{}: The approval request has been {}.", main.id, outcome),
    );
}
