//! `/approval [yes|no]`: the maintainer verdict on a pull request.
//!
//! The verdict is written to the pull request labels and mirrored onto the
//! main issue. A rejection closes the pull request; an approval or a new
//! request reopens it.

use super::PrContext;
use crate::commands::CommandInvocation;
use crate::commands::args::{ApprovalArg, parse_approval};
use crate::desired::DesiredState;
use crate::requirement::approval::{APPROVAL_GATE_LABEL, issue_labels_after};

const USAGE: &str = "usage: `/approval [yes|no|y|n]`\n\n\
 * `/approval` - request maintainer approval (again)\n\
 * `/approval yes` - approve this pull request\n\
 * `/approval no` - reject this pull request";

pub fn run(ctx: &PrContext<'_>, command: &CommandInvocation, desired: &mut DesiredState) {
    // Authorization already required a matching rule.
    let Some(rule) = ctx.config.approval_rule(&ctx.pr.target_ref) else {
        return;
    };
    let Some(arg) = parse_approval(&command.args) else {
        desired.reply(command, USAGE);
        return;
    };
    let triple = rule.labels(&ctx.pr.target_ref);
    let author = &ctx.pr.author;

    let (verdict, text) = match arg {
        ApprovalArg::Yes => {
            desired.add_label(triple.requested.clone());
            desired.add_label(triple.approved.clone());
            desired.remove_label(&triple.rejected);
            desired.reopen();
            (
                Some(true),
                format!(
                    "@{} this pull request was approved by the maintainer.\n<!-- approval: 'yes' -->",
                    author
                ),
            )
        }
        ApprovalArg::No => {
            desired.add_label(triple.requested.clone());
            desired.add_label(triple.rejected.clone());
            desired.remove_label(&triple.approved);
            desired.close();
            (
                Some(false),
                format!(
                    "@{} this pull request was rejected by the maintainer. This pull request will be closed.\n<!-- approval: 'no' -->",
                    author
                ),
            )
        }
        ApprovalArg::Request => {
            desired.add_label(triple.requested.clone());
            desired.remove_label(&triple.approved);
            desired.remove_label(&triple.rejected);
            desired.reopen();
            (
                None,
                format!(
                    "@{} {} has been requested again for this pull request.\n<!-- approval: 'request' -->",
                    author, rule.term
                ),
            )
        }
    };
    if verdict.is_some() {
        desired.remove_label(APPROVAL_GATE_LABEL);
    }
    if let Some(issue) = ctx.main_issue {
        let current = desired.issue_labels().unwrap_or(&issue.labels).clone();
        let mut updated = issue.clone();
        updated.labels = current;
        desired.set_issue_labels(&issue.id, issue_labels_after(&updated, &triple, verdict));
    }
    desired.reply(command, text);
}
