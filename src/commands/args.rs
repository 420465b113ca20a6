//! Per-command argument grammars.
//!
//! Every parser returns `None` on malformed input; the handler answers with
//! the command's usage text in that case.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::IssueId;

static LABEL_LONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(add|remove)\s+((?:[A-Za-z0-9_@.][A-Za-z0-9_@.-]*[\s,]*)+)$").unwrap()
});
static LABEL_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((?:[-+]?[A-Za-z0-9_@.-]+[\s,]*)+)$").unwrap());
static LIST_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,]+").unwrap());
static DEV_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)-dev(?:@\S+)?$").unwrap());
static CONTRIBUTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(add|remove)\s+(.+)$").unwrap());
static REVIEWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(credit|remove)\s+(.+)$").unwrap());
static APPROVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:((?:[A-Za-z]+-)?[0-9]+)\s*)?(yes|no|y|n)$").unwrap()
});

fn split_list(list: &str) -> Vec<String> {
    LIST_SEPARATOR
        .split(list.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ─── Label ────────────────────────────────────────────────────────────────────

/// Labels to add and remove, in the order they were written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelChanges {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

/// Parses `add|remove <labels>` or `[+|-]<label>...`.
///
/// A leading `add`/`remove` word cannot be combined with the short form.
pub fn parse_label(args: &str) -> Option<LabelChanges> {
    let args = args.trim();
    if let Some(caps) = LABEL_LONG.captures(args) {
        let labels = split_list(&caps[2]);
        if labels.is_empty() {
            return None;
        }
        return Some(if &caps[1] == "add" {
            LabelChanges {
                add: labels,
                remove: Vec::new(),
            }
        } else {
            LabelChanges {
                add: Vec::new(),
                remove: labels,
            }
        });
    }

    if !LABEL_SHORT.is_match(args) {
        return None;
    }
    let tokens = split_list(args);
    match tokens.first().map(String::as_str) {
        None | Some("add") | Some("remove") => return None,
        Some(_) => {}
    }
    let mut changes = LabelChanges::default();
    for token in tokens {
        if let Some(label) = token.strip_prefix('-') {
            changes.remove.push(label.to_string());
        } else {
            changes
                .add
                .push(token.strip_prefix('+').unwrap_or(&token).to_string());
        }
    }
    Some(changes)
}

/// Strips a mailing-list style `-dev` or `-dev@domain` suffix.
pub fn normalize_label(label: &str) -> String {
    match DEV_SUFFIX.captures(label) {
        Some(caps) => caps[1].to_string(),
        None => label.to_string(),
    }
}

// ─── Contributor and Reviewer ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorArgs {
    pub add: bool,
    /// `@login`, a census username, or `Full Name <email>`.
    pub user: String,
}

pub fn parse_contributor(args: &str) -> Option<ContributorArgs> {
    let caps = CONTRIBUTOR.captures(args.trim())?;
    Some(ContributorArgs {
        add: &caps[1] == "add",
        user: caps[2].trim().to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerArgs {
    pub credit: bool,
    pub users: Vec<String>,
}

pub fn parse_reviewer(args: &str) -> Option<ReviewerArgs> {
    let caps = REVIEWER.captures(args.trim())?;
    let users = split_list(&caps[2]);
    if users.is_empty() {
        return None;
    }
    Some(ReviewerArgs {
        credit: &caps[1] == "credit",
        users,
    })
}

// ─── Approval ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalArg {
    Yes,
    No,
    /// No argument: ask the maintainers (again).
    Request,
}

pub fn parse_approval(args: &str) -> Option<ApprovalArg> {
    match args.trim().to_ascii_lowercase().as_str() {
        "" => Some(ApprovalArg::Request),
        "yes" | "y" => Some(ApprovalArg::Yes),
        "no" | "n" => Some(ApprovalArg::No),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveArgs {
    /// Explicit issue, as written (with or without project prefix).
    pub issue: Option<String>,
    pub approve: bool,
}

pub fn parse_approve(args: &str) -> Option<ApproveArgs> {
    let caps = APPROVE.captures(args.trim())?;
    let verdict = caps[2].to_ascii_lowercase();
    Some(ApproveArgs {
        issue: caps.get(1).map(|m| m.as_str().to_string()),
        approve: verdict.starts_with('y'),
    })
}

// ─── CSR and JEP ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrArg {
    Needed,
    Unneeded,
}

pub fn parse_csr(args: &str) -> Option<CsrArg> {
    match args.trim().to_ascii_lowercase().as_str() {
        "" | "needed" => Some(CsrArg::Needed),
        "unneeded" | "uneeded" => Some(CsrArg::Unneeded),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JepArg {
    Unneeded,
    /// `JEP-<n>`: a JEP number.
    JepNumber(String),
    /// `<PROJECT>-<n>`: an issue key in the configured project.
    IssueKey(IssueId),
    /// A bare number, tried as a JEP number first and as an issue second.
    Bare(String),
}

/// Parses `/jep` arguments. `project` is the configured issue project.
pub fn parse_jep(args: &str, project: &str) -> Option<JepArg> {
    let args = args.trim();
    if args.is_empty() {
        return None;
    }
    if args == "unneeded" || args == "uneeded" {
        return Some(JepArg::Unneeded);
    }
    let upper = args.to_ascii_uppercase();
    if let Some(number) = upper.strip_prefix("JEP-") {
        return Some(JepArg::JepNumber(number.to_string()));
    }
    let project_prefix = format!("{}-", project.to_ascii_uppercase());
    if let Some(number) = upper.strip_prefix(&project_prefix) {
        return Some(JepArg::IssueKey(IssueId::in_project(project, number)));
    }
    Some(JepArg::Bare(args.to_string()))
}

// ─── Backport and Branch ──────────────────────────────────────────────────────

/// Parsed `/backport` arguments. An empty `repo` means the current repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackportArgs {
    pub disable: bool,
    pub repo: String,
    pub branch: Option<String>,
}

/// Parses `[disable] <repo> [<branch>]` or `[disable] [<repo>]:<branch>`.
///
/// `disable` is only recognized on pull requests.
pub fn parse_backport(args: &str, in_pr: bool) -> Option<BackportArgs> {
    let mut parts: Vec<&str> = args.split_whitespace().collect();
    let disable = in_pr && parts.first() == Some(&"disable");
    if disable {
        parts.remove(0);
    }

    let (repo, branch) = match parts.as_slice() {
        [single] => match single.split_once(':') {
            Some((repo, branch)) => (repo, (!branch.is_empty()).then_some(branch)),
            None => (*single, None),
        },
        [repo, branch] => (*repo, Some(*branch)),
        _ => return None,
    };
    if repo.is_empty() && branch.is_none() {
        return None;
    }
    Some(BackportArgs {
        disable,
        repo: repo.to_string(),
        branch: branch.map(|b| b.to_string()),
    })
}

pub fn parse_branch(args: &str) -> Option<String> {
    let mut parts = args.split_whitespace();
    let name = parts.next()?;
    parts.next().is_none().then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ─── Label ───

    #[test]
    fn label_long_form() {
        assert_eq!(
            parse_label("add build, hotspot"),
            Some(LabelChanges {
                add: vec!["build".into(), "hotspot".into()],
                remove: vec![],
            })
        );
        assert_eq!(parse_label("remove build").unwrap().remove, vec!["build"]);
    }

    #[test]
    fn label_short_form() {
        let changes = parse_label("+build -hotspot core-libs").unwrap();
        assert_eq!(changes.add, vec!["build", "core-libs"]);
        assert_eq!(changes.remove, vec!["hotspot"]);
    }

    #[test]
    fn label_mixed_forms_are_usage_errors() {
        assert_eq!(parse_label("add +build"), None);
        assert_eq!(parse_label("add -build"), None);
        assert_eq!(parse_label("remove build, -hotspot"), None);
        assert_eq!(parse_label("remove"), None);
        assert_eq!(parse_label(""), None);
        assert_eq!(parse_label("build!"), None);
    }

    #[test]
    fn dev_suffix_is_stripped() {
        assert_eq!(normalize_label("hotspot-dev"), "hotspot");
        assert_eq!(normalize_label("hotspot-dev@openjdk.org"), "hotspot");
        assert_eq!(normalize_label("hotspot"), "hotspot");
    }

    proptest! {
        #[test]
        fn short_form_partitions_tokens(
            tokens in proptest::collection::vec(("[+-]?", "[a-z][a-z0-9]{0,8}"), 1..6)
        ) {
            let text = tokens
                .iter()
                .map(|(sign, label)| format!("{}{}", sign, label))
                .collect::<Vec<_>>()
                .join(", ");
            prop_assume!(!matches!(tokens[0].1.as_str(), "add" | "remove") || !tokens[0].0.is_empty());
            let changes = parse_label(&text).unwrap();
            let removed = tokens.iter().filter(|(sign, _)| sign == "-").count();
            prop_assert_eq!(changes.remove.len(), removed);
            prop_assert_eq!(changes.add.len(), tokens.len() - removed);
        }
    }

    // ─── Approval ───

    #[test]
    fn approval_values() {
        assert_eq!(parse_approval("YES"), Some(ApprovalArg::Yes));
        assert_eq!(parse_approval("n"), Some(ApprovalArg::No));
        assert_eq!(parse_approval(""), Some(ApprovalArg::Request));
        assert_eq!(parse_approval("maybe"), None);
    }

    #[test]
    fn approve_with_and_without_issue() {
        assert_eq!(
            parse_approve("JDK-123 yes"),
            Some(ApproveArgs {
                issue: Some("JDK-123".into()),
                approve: true
            })
        );
        assert_eq!(
            parse_approve("no"),
            Some(ApproveArgs {
                issue: None,
                approve: false
            })
        );
        assert_eq!(parse_approve("123 y").unwrap().issue.as_deref(), Some("123"));
        assert_eq!(parse_approve("JDK-123"), None);
    }

    // ─── CSR and JEP ───

    #[test]
    fn csr_values() {
        assert_eq!(parse_csr(""), Some(CsrArg::Needed));
        assert_eq!(parse_csr("needed"), Some(CsrArg::Needed));
        assert_eq!(parse_csr("uneeded"), Some(CsrArg::Unneeded));
        assert_eq!(parse_csr("later"), None);
    }

    #[test]
    fn jep_forms() {
        assert_eq!(parse_jep("unneeded", "JDK"), Some(JepArg::Unneeded));
        assert_eq!(parse_jep("jep-123", "JDK"), Some(JepArg::JepNumber("123".into())));
        assert_eq!(
            parse_jep("jdk-4567", "JDK"),
            Some(JepArg::IssueKey(IssueId::new("JDK-4567")))
        );
        assert_eq!(parse_jep("123", "JDK"), Some(JepArg::Bare("123".into())));
        assert_eq!(parse_jep("  ", "JDK"), None);
    }

    // ─── Backport ───

    #[test]
    fn backport_repo_and_branch() {
        assert_eq!(
            parse_backport("jdk17u-dev master", false),
            Some(BackportArgs {
                disable: false,
                repo: "jdk17u-dev".into(),
                branch: Some("master".into())
            })
        );
        assert_eq!(
            parse_backport("jdk17u:jdk17.0.9", false).unwrap().branch.as_deref(),
            Some("jdk17.0.9")
        );
    }

    #[test]
    fn backport_branch_in_current_repo() {
        let args = parse_backport(":jdk21", true).unwrap();
        assert_eq!(args.repo, "");
        assert_eq!(args.branch.as_deref(), Some("jdk21"));
    }

    #[test]
    fn backport_disable_only_in_pr() {
        assert!(parse_backport("disable jdk17u", true).unwrap().disable);
        assert_eq!(parse_backport("disable jdk17u", false).unwrap().repo, "disable");
        assert_eq!(parse_backport("disable", true), None);
    }

    #[test]
    fn backport_too_many_args() {
        assert_eq!(parse_backport("a b c", false), None);
        assert_eq!(parse_backport("", false), None);
    }

    #[test]
    fn branch_single_token() {
        assert_eq!(parse_branch(" jdk-22 "), Some("jdk-22".into()));
        assert_eq!(parse_branch("a b"), None);
        assert_eq!(parse_branch(""), None);
    }
}
