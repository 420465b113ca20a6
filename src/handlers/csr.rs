//! `/csr [needed|unneeded]`.

use super::PrContext;
use crate::commands::CommandInvocation;
use crate::commands::args::{CsrArg, parse_csr};
use crate::desired::DesiredState;
use crate::requirement::csr::{CSR_LABEL, is_approved, is_withdrawn};
use crate::types::Issue;

const USAGE: &str = "usage: `/csr [needed|unneeded]`, requires that the issue the pull request refers to links to an approved CSR request.";

fn link(issue: &Issue) -> String {
    format!("[{}]({})", issue.id, issue.web_url)
}

pub fn run(ctx: &PrContext<'_>, command: &CommandInvocation, desired: &mut DesiredState) {
    if !ctx.config.enable_csr {
        desired.reply(
            command,
            "This repository has not been configured to use the `csr` command.",
        );
        return;
    }
    match parse_csr(&command.args) {
        None => desired.reply(command, USAGE),
        Some(CsrArg::Unneeded) => unneeded(ctx, command, desired),
        Some(CsrArg::Needed) => needed(ctx, command, desired),
    }
}

fn unneeded(ctx: &PrContext<'_>, command: &CommandInvocation, desired: &mut DesiredState) {
    if let (Some(main), Some(csr)) = (ctx.main_issue, ctx.csr)
        && !is_withdrawn(csr)
    {
        desired.reply(
            command,
            format!(
                "the issue for this pull request, {}, has a non-withdrawn CSR request: {}. \n\
                 So you can't directly indicate that a CSR request is not needed for this pull request. \n\
                 Please firstly withdraw the CSR request: {}, and then use the command `/csr unneeded` again.",
                link(main),
                link(csr),
                link(csr)
            ),
        );
        return;
    }
    desired.remove_label(CSR_LABEL);
    desired.reply(
        command,
        "determined that a CSR request is not needed for this pull request.",
    );
}

fn needed(ctx: &PrContext<'_>, command: &CommandInvocation, desired: &mut DesiredState) {
    if desired.has_label(CSR_LABEL) {
        desired.reply(
            command,
            "an approved CSR request is already required for this pull request.",
        );
        return;
    }

    let author = &ctx.pr.author;
    let text = match (ctx.main_issue, ctx.csr) {
        (None, _) => format!(
            "has indicated that a compatibility and specification (CSR) request is needed for this pull request.\n\
             @{} this pull request must refer to an issue in the issue tracker to be able to link it to a CSR request. \
             To refer this pull request to an issue, please update the title of this pull request to just the issue ID.",
            author
        ),
        (Some(main), None) => format!(
            "has indicated that a compatibility and specification (CSR) request is needed for this pull request.\n\
             @{} please create a CSR request for issue {}. This pull request cannot be integrated until the CSR request is approved.",
            author,
            link(main)
        ),
        (Some(main), Some(csr)) if is_approved(csr) => {
            desired.reply(
                command,
                format!(
                    "the issue for this pull request, {}, already has an approved CSR request: {}",
                    link(main),
                    link(csr)
                ),
            );
            return;
        }
        (Some(main), Some(csr)) => format!(
            "has indicated that a compatibility and specification (CSR) request is needed for this pull request.\n\
             This pull request will not be integrated until the CSR request {} for issue {} has been approved.",
            link(csr),
            link(main)
        ),
    };
    desired.add_label(CSR_LABEL);
    desired.reply(command, text);
}
