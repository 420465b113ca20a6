//! `/help`.

use crate::commands::{CommandName, CommandOrigin};

/// Lists the commands usable where `origin` is.
pub fn help_text(origin: CommandOrigin) -> String {
    let mut names: Vec<CommandName> = CommandName::ALL
        .into_iter()
        .filter(|n| match origin {
            CommandOrigin::CommitComment => n.allowed_in_commit(),
            CommandOrigin::PrComment | CommandOrigin::PrBody => n.allowed_in_pr(),
        })
        .collect();
    names.sort_by_key(|n| n.as_str());

    let mut text = String::from("Available commands:\n");
    for name in names {
        text.push_str(&format!(" * {} - {}\n", name.as_str(), name.description()));
    }
    text
}
