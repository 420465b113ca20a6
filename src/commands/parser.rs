//! Parser for slash commands in comment text.
//!
//! This is a pure function of the comment text: re-parsing the same comment
//! always yields the same command list.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{CommandInvocation, CommandName, CommandOrigin};

static COMMAND_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*/([A-Za-z][A-Za-z-]*)(?:@(\S+))?(?:\s+(.*?))?\s*$").unwrap()
});

/// Formats the id of the `n`th command in a comment.
fn command_id(base_id: &str, n: usize) -> String {
    if n == 0 {
        base_id.to_string()
    } else {
        format!("{}:{}", base_id, n)
    }
}

/// Extracts the commands in `text`, in the order they appear.
///
/// # Parsing Rules
///
/// - A command is a line `/<name>[@<suffix>] [args]`, optionally indented
/// - Names are case-insensitive; `cc` is an alias of `label`
/// - Lines whose name is not a known command are ignored
/// - `/<name>@<suffix>` is only addressed to us when `suffix` is `bot_login`
///   (case-insensitive, with or without a leading `@`)
/// - Arguments are trimmed; a command without arguments has empty `args`
///
/// # Examples
///
/// ```
/// use pr_steward::commands::{extract_commands, CommandName, CommandOrigin};
///
/// let cmds = extract_commands(
///     "Thanks!\n/label add build\n/csr",
///     "12",
///     "duke",
///     CommandOrigin::PrComment,
///     "steward",
/// );
/// assert_eq!(cmds.len(), 2);
/// assert_eq!(cmds[0].name, CommandName::Label);
/// assert_eq!(cmds[0].args, "add build");
/// assert_eq!(cmds[1].id, "12:1");
/// ```
pub fn extract_commands(
    text: &str,
    base_id: &str,
    issuer: &str,
    origin: CommandOrigin,
    bot_login: &str,
) -> Vec<CommandInvocation> {
    let mut commands = Vec::new();
    for line in text.lines() {
        let Some(caps) = COMMAND_LINE.captures(line) else {
            continue;
        };
        let Some(name) = CommandName::lookup(&caps[1]) else {
            continue;
        };
        if let Some(suffix) = caps.get(2) {
            let suffix = suffix.as_str().trim_start_matches('@');
            if !suffix.eq_ignore_ascii_case(bot_login) {
                continue;
            }
        }
        let args = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("");
        commands.push(CommandInvocation {
            id: command_id(base_id, commands.len()),
            name,
            written: caps[1].to_ascii_lowercase(),
            args: args.to_string(),
            issuer: issuer.to_string(),
            origin,
        });
    }
    commands
}
