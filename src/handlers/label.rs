//! `/label` and its alias `/cc`.

use super::{PrContext, bullet_list};
use crate::commands::CommandInvocation;
use crate::commands::args::{normalize_label, parse_label};
use crate::desired::DesiredState;
use crate::markers;

fn usage(valid: &[String]) -> String {
    format!(
        "Usage: `/label <add|remove> <label>[, <label>, ...]` or `/label [+|-]<label>...` where `<label>` is one of:\n{}",
        bullet_list(valid)
    )
}

pub fn run(ctx: &PrContext<'_>, command: &CommandInvocation, desired: &mut DesiredState) {
    let labels = &ctx.config.labels;
    let valid: Vec<String> = labels.allowed().into_iter().collect();
    let Some(changes) = parse_label(&command.args) else {
        desired.reply(command, usage(&valid));
        return;
    };

    let add: Vec<String> = changes.add.iter().map(|l| normalize_label(l)).collect();
    let remove: Vec<String> = changes.remove.iter().map(|l| normalize_label(l)).collect();
    let invalid: Vec<&String> = add
        .iter()
        .chain(&remove)
        .filter(|l| !labels.is_allowed(l))
        .collect();
    if !invalid.is_empty() {
        let names = invalid
            .iter()
            .map(|l| format!("`{}`", l))
            .collect::<Vec<_>>()
            .join(", ");
        let verb = if invalid.len() == 1 { "is not a valid label" } else { "are not valid labels" };
        desired.reply(
            command,
            format!("The {} {}.\nThese labels are valid:\n{}", names, verb, bullet_list(&valid)),
        );
        return;
    }

    let mut lines = Vec::new();
    for label in add {
        if desired.has_label(&label) {
            lines.push(format!("The `{}` label was already applied.", label));
        } else {
            lines.push(format!(
                "The `{}` label was successfully added.\n{}",
                label,
                markers::label_added(&label)
            ));
            desired.add_label(label);
        }
    }
    for label in remove {
        if desired.has_label(&label) {
            desired.remove_label(&label);
            lines.push(format!(
                "The `{}` label was successfully removed.\n{}",
                label,
                markers::label_removed(&label)
            ));
        } else {
            lines.push(format!("The `{}` label was not set.", label));
        }
    }
    desired.reply(command, lines.join("\n"));
}
