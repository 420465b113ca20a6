//! Classification labels.
//!
//! Labels are derived from the paths a pull request touches. Individual
//! labels can be collected into groups: a change touching several members of
//! a group is labelled with the group instead of its members.

pub mod auto;

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

pub use auto::{LabelPlan, plan_labels};

/// Which labels exist and which paths select them.
#[derive(Debug, Clone, Default)]
pub struct LabelConfiguration {
    matchers: BTreeMap<String, Vec<Regex>>,
    groups: BTreeMap<String, BTreeSet<String>>,
    extra: BTreeSet<String>,
}

impl LabelConfiguration {
    pub fn new(
        matchers: BTreeMap<String, Vec<Regex>>,
        groups: BTreeMap<String, BTreeSet<String>>,
        extra: BTreeSet<String>,
    ) -> Self {
        LabelConfiguration {
            matchers,
            groups,
            extra,
        }
    }

    /// All labels users may apply with `/label`.
    pub fn allowed(&self) -> BTreeSet<String> {
        self.matchers
            .keys()
            .chain(self.groups.keys())
            .chain(&self.extra)
            .cloned()
            .collect()
    }

    pub fn is_allowed(&self, label: &str) -> bool {
        self.matchers.contains_key(label)
            || self.groups.contains_key(label)
            || self.extra.contains(label)
    }

    /// Labels whose path matchers match any of `files`.
    pub fn label(&self, files: &[String]) -> BTreeSet<String> {
        self.matchers
            .iter()
            .filter(|(_, patterns)| {
                files
                    .iter()
                    .any(|f| patterns.iter().any(|p| p.is_match(f)))
            })
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Replaces group members by their group.
    ///
    /// A group is added when at least two of its members are present; then
    /// the members of every present group are dropped.
    pub fn upgrade_to_groups(&self, labels: &BTreeSet<String>) -> BTreeSet<String> {
        let mut upgraded = labels.clone();
        for (group, members) in &self.groups {
            if members.intersection(labels).count() >= 2 {
                upgraded.insert(group.clone());
            }
        }
        for (group, members) in &self.groups {
            if upgraded.contains(group) {
                for member in members {
                    upgraded.remove(member);
                }
            }
        }
        upgraded
    }
}
