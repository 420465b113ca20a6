//! Maintainer approval for update branches.
//!
//! A rule matches target branches by regex and names a label triple. The
//! triple lives on the pull request, and is mirrored onto the main issue so
//! that `/approve` on any pull request for the same issue is seen everywhere.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use super::RequirementState;
use crate::types::{Issue, PullRequest, RepoId};

/// Label applied while a pull request waits for a maintainer decision.
pub const APPROVAL_GATE_LABEL: &str = "approval";

/// One approval rule.
#[derive(Debug, Clone)]
pub struct ApprovalRule {
    /// Matched against the whole target branch name.
    pub branches: Regex,
    /// Restricts the rule to one repository.
    pub repo: Option<RepoId>,
    pub request_suffix: String,
    pub approved_suffix: String,
    pub rejected_suffix: String,
    /// Branch name to label prefix, e.g. `jdk20.0.1` to `CPU23_04`.
    pub prefix_substitutions: BTreeMap<String, String>,
    pub maintainers: Vec<String>,
    pub document_link: String,
    pub post_explanation: bool,
    /// Human readable name of the process, e.g. "maintainer approval".
    pub term: String,
}

/// The three labels of a rule, resolved for one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalLabels {
    pub requested: String,
    pub approved: String,
    pub rejected: String,
}

impl ApprovalLabels {
    pub fn all(&self) -> [&str; 3] {
        [&self.requested, &self.approved, &self.rejected]
    }
}

impl ApprovalRule {
    pub fn matches(&self, repo: &RepoId, branch: &str) -> bool {
        self.repo.as_ref().is_none_or(|r| r == repo)
            && self
                .branches
                .find(branch)
                .is_some_and(|m| m.start() == 0 && m.end() == branch.len())
    }

    pub fn labels(&self, branch: &str) -> ApprovalLabels {
        let prefix = self
            .prefix_substitutions
            .get(branch)
            .map(String::as_str)
            .unwrap_or(branch);
        ApprovalLabels {
            requested: format!("{}{}", prefix, self.request_suffix),
            approved: format!("{}{}", prefix, self.approved_suffix),
            rejected: format!("{}{}", prefix, self.rejected_suffix),
        }
    }
}

/// The first rule, in declaration order, matching the branch.
pub fn rule_for<'a>(rules: &'a [ApprovalRule], repo: &RepoId, branch: &str) -> Option<&'a ApprovalRule> {
    rules.iter().find(|r| r.matches(repo, branch))
}

/// Derives the approval state from the labels the pass intends to leave on
/// the pull request and the labels of the main issue.
///
/// A maintainer verdict on the pull request wins over one on the issue, and
/// any verdict wins over a bare request.
pub fn derive(labels: &BTreeSet<String>, triple: &ApprovalLabels, issue: Option<&Issue>) -> RequirementState {
    let verdict = |set: &BTreeSet<String>| {
        if set.contains(&triple.rejected) {
            Some(RequirementState::Rejected)
        } else if set.contains(&triple.approved) {
            Some(RequirementState::Approved)
        } else {
            None
        }
    };
    let issue_labels = issue.map(|i| &i.labels);
    verdict(labels)
        .or_else(|| issue_labels.and_then(verdict))
        .unwrap_or_else(|| {
            let requested = labels.contains(&triple.requested)
                || issue_labels.is_some_and(|l| l.contains(&triple.requested));
            if requested {
                RequirementState::Requested
            } else {
                RequirementState::NotRequired
            }
        })
}

/// Explanation posted once when a pull request first needs approval.
pub fn explanation(rule: &ApprovalRule, pr: &PullRequest, triple: &ApprovalLabels) -> String {
    format!(
        "@{} This change is now ready for you to apply for {}. This can be done directly in each associated issue or by using the `/approval` command.\n\n\
         Applying for {} is required for changes to `{}`. The process is described in [this document]({}).\n\
         The maintainers will add `{}` or `{}` to decide.",
        pr.author,
        rule.term,
        rule.term,
        pr.target_ref,
        rule.document_link,
        triple.approved,
        triple.rejected
    )
}

/// Labels of `issue` after setting a maintainer verdict.
///
/// The request label is added when missing so that a verdict never exists
/// without a request, and the opposite verdict is removed.
pub fn issue_labels_after(issue: &Issue, triple: &ApprovalLabels, verdict: Option<bool>) -> BTreeSet<String> {
    let mut labels = issue.labels.clone();
    labels.insert(triple.requested.clone());
    match verdict {
        Some(true) => {
            labels.remove(&triple.rejected);
            labels.insert(triple.approved.clone());
        }
        Some(false) => {
            labels.remove(&triple.approved);
            labels.insert(triple.rejected.clone());
        }
        None => {
            labels.remove(&triple.approved);
            labels.remove(&triple.rejected);
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{approval_rule, issue};

    #[test]
    fn rule_matches_whole_branch_name() {
        let rule = approval_rule("jdk[0-9]+u");
        let repo = RepoId::new("openjdk", "jdk17u");
        assert!(rule.matches(&repo, "jdk17u"));
        assert!(!rule.matches(&repo, "jdk17u-dev"));
        assert!(!rule.matches(&repo, "master"));
    }

    #[test]
    fn rule_restricted_to_repo() {
        let mut rule = approval_rule("master");
        rule.repo = Some(RepoId::new("openjdk", "jdk17u"));
        assert!(rule.matches(&RepoId::new("openjdk", "jdk17u"), "master"));
        assert!(!rule.matches(&RepoId::new("openjdk", "jdk"), "master"));
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut first = approval_rule("jdk.*");
        first.term = "first".into();
        let mut second = approval_rule("jdk17u");
        second.term = "second".into();
        let rules = vec![first, second];
        let repo = RepoId::new("o", "r");
        assert_eq!(rule_for(&rules, &repo, "jdk17u").map(|r| r.term.as_str()), Some("first"));
        assert!(rule_for(&rules, &repo, "master").is_none());
    }

    #[test]
    fn prefix_substitution_applies_to_all_labels() {
        let mut rule = approval_rule("jdk.*");
        rule.prefix_substitutions
            .insert("jdk20.0.1".into(), "CPU23_04".into());
        let labels = rule.labels("jdk20.0.1");
        assert_eq!(labels.requested, "CPU23_04-fix-request");
        assert_eq!(labels.approved, "CPU23_04-fix-yes");
        assert_eq!(labels.rejected, "CPU23_04-fix-no");
        assert_eq!(rule.labels("master").requested, "master-fix-request");
    }

    #[test]
    fn issue_verdict_decides_a_bare_request() {
        let triple = approval_rule("master").labels("master");
        let mut i = issue("JDK-1");
        i.labels.insert(triple.approved.clone());

        let pr_labels: BTreeSet<String> = [triple.requested.clone()].into();
        assert_eq!(derive(&pr_labels, &triple, Some(&i)), RequirementState::Approved);
        assert_eq!(derive(&pr_labels, &triple, None), RequirementState::Requested);
        assert_eq!(derive(&BTreeSet::new(), &triple, None), RequirementState::NotRequired);
    }

    #[test]
    fn pull_request_verdict_wins_over_issue() {
        let triple = approval_rule("master").labels("master");
        let mut i = issue("JDK-1");
        i.labels.insert(triple.approved.clone());

        let pr_labels: BTreeSet<String> = [triple.rejected.clone()].into();
        assert_eq!(derive(&pr_labels, &triple, Some(&i)), RequirementState::Rejected);
    }

    #[test]
    fn verdict_keeps_request_and_drops_opposite() {
        let triple = approval_rule("master").labels("master");
        let mut i = issue("JDK-1");
        i.labels.insert(triple.approved.clone());

        let labels = issue_labels_after(&i, &triple, Some(false));
        assert!(labels.contains(&triple.requested));
        assert!(labels.contains(&triple.rejected));
        assert!(!labels.contains(&triple.approved));
    }
}
