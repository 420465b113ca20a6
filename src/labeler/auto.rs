//! Automatic labeling of open pull requests.
//!
//! The first evaluation labels the whole change and explains itself in a
//! comment. Later evaluations only look at the files changed since the last
//! evaluated head, recorded in the generated part of the body.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::LabelConfiguration;
use crate::effects::calls;
use crate::effects::{EffectError, ForgeInterpreter};
use crate::markers;
use crate::types::{Comment, PullRequest, Sha};

/// Label changes the labeler contributes to a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelPlan {
    pub add: BTreeSet<String>,
    pub remove: BTreeSet<String>,
    /// The explanatory comment, on first evaluation only.
    pub comment: Option<String>,
    /// The head commit evaluated by this plan.
    pub evaluated: Option<Sha>,
}

/// Labels whose latest manual change, recorded in bot replies, was a removal.
///
/// `pending` are replies queued earlier in the same pass; they come after
/// every posted comment.
pub fn manually_removed(comments: &[Comment], pending: &[String], bot_login: &str) -> BTreeSet<String> {
    let posted = comments
        .iter()
        .filter(|c| c.author.eq_ignore_ascii_case(bot_login))
        .map(|c| c.body.as_str());
    let mut latest = BTreeMap::new();
    for body in posted.chain(pending.iter().map(String::as_str)) {
        for (added, label) in markers::label_changes(body) {
            latest.insert(label, added);
        }
    }
    latest
        .into_iter()
        .filter(|(_, added)| !added)
        .map(|(label, _)| label)
        .collect()
}

fn initial_comment(labels: &BTreeSet<String>) -> String {
    let mut text = format!("{}\n", markers::LABEL_COMMENT_MARKER);
    if labels.is_empty() {
        text.push_str(
            "No labels could be automatically applied to this pull request. \
             Please use the `/label` command to classify it.",
        );
    } else {
        text.push_str("The following labels will be automatically applied to this pull request:\n\n");
        for label in labels {
            text.push_str(&format!("- `{}`\n", label));
        }
        text.push_str(
            "\nIf you would like to change these labels, use the `/label` pull request command.",
        );
    }
    text
}

/// Plans the labeler's changes for an open pull request.
///
/// `current` is the label set the pass intends so far and `pending` the
/// replies it has queued.
pub async fn plan_labels<F: ForgeInterpreter>(
    forge: &F,
    config: &LabelConfiguration,
    pr: &PullRequest,
    comments: &[Comment],
    pending: &[String],
    current: &BTreeSet<String>,
    bot_login: &str,
) -> Result<LabelPlan, EffectError> {
    if !pr.state.is_open() {
        return Ok(LabelPlan::default());
    }
    let last = markers::labeled_commit(&pr.body);
    if last.as_ref() == Some(&pr.head_sha) {
        return Ok(LabelPlan {
            evaluated: last,
            ..LabelPlan::default()
        });
    }

    let files = match &last {
        None => calls::list_changed_files(forge, pr.number).await?,
        Some(base) => calls::compare_files(forge, base.clone(), pr.head_sha.clone()).await?,
    };
    let removed = manually_removed(comments, pending, bot_login);
    let new: BTreeSet<String> = config
        .label(&files)
        .into_iter()
        .filter(|l| !removed.contains(l))
        .collect();
    debug!(pr = %pr.number, files = files.len(), labels = ?new, "evaluated changed files");

    let combined: BTreeSet<String> = current.union(&new).cloned().collect();
    let upgraded = config.upgrade_to_groups(&combined);

    let first_time = last.is_none()
        && !markers::bot_posted(comments, bot_login, markers::LABEL_COMMENT_MARKER);
    Ok(LabelPlan {
        add: upgraded.difference(current).cloned().collect(),
        remove: current.difference(&upgraded).cloned().collect(),
        comment: first_time.then(|| initial_comment(&config.upgrade_to_groups(&new))),
        evaluated: Some(pr.head_sha.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::ForgeEffect;
    use crate::test_utils::{FakeForge, comment, label_config, pull_request, sha};

    const BOT: &str = "steward";

    #[test]
    fn latest_manual_change_wins() {
        let comments = vec![
            comment(1, BOT, &markers::label_removed("build")),
            comment(2, BOT, &markers::label_added("build")),
            comment(3, BOT, &markers::label_removed("hotspot-gc")),
            comment(4, "mallory", &markers::label_removed("compiler")),
        ];
        let removed = manually_removed(&comments, &[], BOT);
        assert_eq!(removed, BTreeSet::from(["hotspot-gc".to_string()]));
    }

    #[tokio::test]
    async fn first_evaluation_labels_whole_change_and_comments() {
        let forge = FakeForge::new();
        let pr = pull_request(1);
        forge.put_pr(pr.clone());
        forge.set_changed_files(pr.number, &["make/Main.gmk", "src/hotspot/share/gc/x.cpp"]);

        let plan = plan_labels(&forge, &label_config(), &pr, &[], &[], &BTreeSet::new(), BOT)
            .await
            .unwrap();
        assert_eq!(
            plan.add,
            BTreeSet::from(["build".to_string(), "hotspot-gc".to_string()])
        );
        assert!(plan.comment.as_deref().is_some_and(|c| c.contains("- `build`")));
        assert_eq!(plan.evaluated, Some(pr.head_sha.clone()));
    }

    #[tokio::test]
    async fn already_evaluated_head_is_skipped() {
        let forge = FakeForge::new();
        let mut pr = pull_request(1);
        pr.body = format!("text\n{}", markers::label_commit(&pr.head_sha));

        let plan = plan_labels(&forge, &label_config(), &pr, &[], &[], &BTreeSet::new(), BOT)
            .await
            .unwrap();
        assert!(plan.add.is_empty() && plan.comment.is_none());
        assert!(forge.calls().is_empty());
    }

    #[tokio::test]
    async fn later_commit_upgrades_member_to_group() {
        let forge = FakeForge::new();
        let mut pr = pull_request(1);
        let old = sha(1);
        pr.body = format!("text\n{}", markers::label_commit(&old));
        forge.set_compare(&old, &pr.head_sha, &["src/hotspot/share/opto/x.cpp"]);

        let current = BTreeSet::from(["hotspot-gc".to_string()]);
        let plan = plan_labels(&forge, &label_config(), &pr, &[], &[], &current, BOT)
            .await
            .unwrap();
        assert_eq!(plan.add, BTreeSet::from(["hotspot".to_string()]));
        assert_eq!(plan.remove, BTreeSet::from(["hotspot-gc".to_string()]));
        assert!(plan.comment.is_none());
        assert!(
            forge
                .calls()
                .iter()
                .all(|e| !matches!(e, ForgeEffect::ListChangedFiles { .. }))
        );
    }

    #[tokio::test]
    async fn manually_removed_label_is_not_reapplied() {
        let forge = FakeForge::new();
        let pr = pull_request(1);
        forge.set_changed_files(pr.number, &["make/Main.gmk"]);
        let comments = vec![comment(5, BOT, &markers::label_removed("build"))];

        let plan = plan_labels(&forge, &label_config(), &pr, &comments, &[], &BTreeSet::new(), BOT)
            .await
            .unwrap();
        assert!(plan.add.is_empty());
    }

    #[test]
    fn queued_reply_overrides_posted_addition() {
        let comments = vec![comment(1, BOT, &markers::label_added("build"))];
        let pending = vec![format!("done\n{}", markers::label_removed("build"))];
        let removed = manually_removed(&comments, &pending, BOT);
        assert_eq!(removed, BTreeSet::from(["build".to_string()]));
    }
}
