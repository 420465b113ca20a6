//! Performing one backport.

use tracing::{info, warn};

use super::branch_name;
use crate::effects::calls;
use crate::effects::{
    CherryPickOutcome, CommitData, EffectError, ForgeInterpreter, VcsEffect, VcsInterpreter,
};
use crate::types::{RepoId, Sha};

/// A validated backport request.
#[derive(Debug, Clone)]
pub struct BackportRequest<'a> {
    pub source: &'a RepoId,
    pub commit: &'a Sha,
    pub target: &'a RepoId,
    /// Fork of `target` the backport branch is pushed to.
    pub fork: &'a RepoId,
    /// Target branch as written; the default branch when absent.
    pub branch: Option<&'a str>,
    pub requester: &'a str,
}

/// Everything known about a backport once its target branch exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackportPlan {
    pub source: RepoId,
    pub commit: CommitData,
    pub target: RepoId,
    pub target_branch: String,
    pub fork: RepoId,
    /// Branch the backport is pushed to in the fork.
    pub branch: String,
    pub requester: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackportOutcome {
    /// The target branch does not exist; `valid` lists those that do.
    MissingBranch { branch: String, valid: Vec<String> },
    /// Applying the change leaves the target tree unchanged.
    AlreadyPresent(BackportPlan),
    /// The cherry-pick applied and was pushed.
    Clean { plan: BackportPlan, commit: Sha },
    /// The cherry-pick conflicted; nothing was pushed.
    Conflict {
        plan: BackportPlan,
        paths: Vec<String>,
    },
}

/// Branches offered when a requested branch does not exist. Pull request
/// refs mirrored as `pr/` branches are not backport targets.
pub(crate) fn valid_branches(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut valid: Vec<String> = names.into_iter().filter(|n| !n.starts_with("pr/")).collect();
    valid.sort();
    valid
}

/// Cherry-picks the requested commit onto the current tip of the target
/// branch and, when clean, force-pushes the result to the fork.
pub async fn run_backport<F, V>(
    forge: &F,
    vcs: &V,
    request: BackportRequest<'_>,
) -> Result<BackportOutcome, EffectError>
where
    F: ForgeInterpreter,
    V: VcsInterpreter,
{
    let default = calls::default_branch(forge, request.target.clone()).await?;
    let target_branch = request.branch.unwrap_or(&default).to_string();

    let tip = calls::resolve_branch(vcs, request.target.clone(), target_branch.clone()).await?;
    if tip.is_none() {
        let branches = calls::list_branches(forge, request.target.clone()).await?;
        return Ok(BackportOutcome::MissingBranch {
            branch: target_branch,
            valid: valid_branches(branches.into_iter().map(|b| b.name)),
        });
    }

    let commit = calls::get_commit(forge, request.commit.clone()).await?;
    let suffix = (target_branch != default).then_some(target_branch.as_str());
    let plan = BackportPlan {
        source: request.source.clone(),
        target: request.target.clone(),
        target_branch: target_branch.clone(),
        fork: request.fork.clone(),
        branch: branch_name(request.requester, request.commit, suffix),
        requester: request.requester.to_string(),
        commit,
    };

    let effect = VcsEffect::CherryPick {
        source: plan.source.clone(),
        commit: request.commit.clone(),
        target: plan.target.clone(),
        branch: plan.target_branch.clone(),
        message: format!("Backport {}", request.commit),
    };
    match calls::cherry_pick(vcs, effect).await? {
        CherryPickOutcome::NoOp => {
            info!(commit = %request.commit.short(), target = %plan.target, branch = %plan.target_branch, "change already present");
            Ok(BackportOutcome::AlreadyPresent(plan))
        }
        CherryPickOutcome::Conflict { paths } => {
            warn!(commit = %request.commit.short(), target = %plan.target, conflicts = paths.len(), "backport conflicts");
            Ok(BackportOutcome::Conflict { plan, paths })
        }
        CherryPickOutcome::Clean { commit } => {
            calls::push(vcs, plan.fork.clone(), commit.clone(), plan.branch.clone()).await?;
            info!(commit = %request.commit.short(), fork = %plan.fork, branch = %plan.branch, "backport pushed");
            Ok(BackportOutcome::Clean { plan, commit })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{ForgeEffect, VcsEffect};
    use crate::test_utils::{FakeForge, FakeVcs, sha};

    fn request<'a>(
        source: &'a RepoId,
        commit: &'a Sha,
        target: &'a RepoId,
        fork: &'a RepoId,
        branch: Option<&'a str>,
    ) -> BackportRequest<'a> {
        BackportRequest {
            source,
            commit,
            target,
            fork,
            branch,
            requester: "duke",
        }
    }

    struct Repos {
        source: RepoId,
        target: RepoId,
        fork: RepoId,
    }

    fn repos() -> Repos {
        Repos {
            source: RepoId::new("openjdk", "jdk"),
            target: RepoId::new("openjdk", "jdk17u"),
            fork: RepoId::new("steward-bot", "jdk17u"),
        }
    }

    fn setup(forge: &FakeForge, vcs: &FakeVcs, r: &Repos) {
        forge.set_default_branch(&r.target, "master");
        forge.set_branches(&r.target, &["master", "jdk17.0.9", "pr/12"]);
        forge.put_commit(sha(1));
        vcs.set_branch(&r.target, "master", sha(50));
        vcs.set_branch(&r.target, "jdk17.0.9", sha(51));
    }

    #[tokio::test]
    async fn clean_pick_is_pushed_to_fork() {
        let (forge, vcs, r) = (FakeForge::new(), FakeVcs::new(), repos());
        setup(&forge, &vcs, &r);
        vcs.set_pick(&sha(1), &r.target, "master", CherryPickOutcome::Clean { commit: sha(60) });

        let commit = sha(1);
        let outcome = run_backport(&forge, &vcs, request(&r.source, &commit, &r.target, &r.fork, None))
            .await
            .unwrap();
        let BackportOutcome::Clean { plan, commit: picked } = outcome else {
            panic!("expected clean outcome, got {:?}", outcome);
        };
        assert_eq!(picked, sha(60));
        assert_eq!(plan.branch, format!("backport-duke-{}", sha(1).abbreviate()));
        assert!(vcs.calls().contains(&VcsEffect::Push {
            repo: r.fork.clone(),
            commit: sha(60),
            branch: plan.branch.clone(),
            force: true,
        }));
    }

    #[tokio::test]
    async fn non_default_branch_is_named_in_backport_branch() {
        let (forge, vcs, r) = (FakeForge::new(), FakeVcs::new(), repos());
        setup(&forge, &vcs, &r);
        vcs.set_pick(&sha(1), &r.target, "jdk17.0.9", CherryPickOutcome::NoOp);

        let commit = sha(1);
        let outcome = run_backport(
            &forge,
            &vcs,
            request(&r.source, &commit, &r.target, &r.fork, Some("jdk17.0.9")),
        )
        .await
        .unwrap();
        let BackportOutcome::AlreadyPresent(plan) = outcome else {
            panic!("expected already present, got {:?}", outcome);
        };
        assert!(plan.branch.ends_with("-jdk17.0.9"));
        assert!(!vcs.calls().iter().any(|e| matches!(e, VcsEffect::Push { .. })));
    }

    #[tokio::test]
    async fn conflict_pushes_nothing() {
        let (forge, vcs, r) = (FakeForge::new(), FakeVcs::new(), repos());
        setup(&forge, &vcs, &r);
        vcs.set_pick(
            &sha(1),
            &r.target,
            "master",
            CherryPickOutcome::Conflict { paths: vec!["src/a.c".into()] },
        );

        let commit = sha(1);
        let outcome = run_backport(&forge, &vcs, request(&r.source, &commit, &r.target, &r.fork, None))
            .await
            .unwrap();
        assert!(matches!(outcome, BackportOutcome::Conflict { ref paths, .. } if paths == &["src/a.c"]));
        assert!(!vcs.calls().iter().any(|e| matches!(e, VcsEffect::Push { .. })));
    }

    #[tokio::test]
    async fn missing_branch_lists_valid_ones() {
        let (forge, vcs, r) = (FakeForge::new(), FakeVcs::new(), repos());
        setup(&forge, &vcs, &r);

        let commit = sha(1);
        let outcome = run_backport(
            &forge,
            &vcs,
            request(&r.source, &commit, &r.target, &r.fork, Some("jdk99")),
        )
        .await
        .unwrap();
        assert_eq!(
            outcome,
            BackportOutcome::MissingBranch {
                branch: "jdk99".into(),
                valid: vec!["jdk17.0.9".into(), "master".into()],
            }
        );
        assert!(!forge.calls().iter().any(|e| matches!(e, ForgeEffect::GetCommit { .. })));
    }

    #[tokio::test]
    async fn repeated_request_recomputes_from_current_tip() {
        let (forge, vcs, r) = (FakeForge::new(), FakeVcs::new(), repos());
        setup(&forge, &vcs, &r);
        let commit = sha(1);

        vcs.set_pick(&sha(1), &r.target, "master", CherryPickOutcome::Clean { commit: sha(60) });
        let first = run_backport(&forge, &vcs, request(&r.source, &commit, &r.target, &r.fork, None))
            .await
            .unwrap();
        vcs.set_pick(&sha(1), &r.target, "master", CherryPickOutcome::Clean { commit: sha(61) });
        let second = run_backport(&forge, &vcs, request(&r.source, &commit, &r.target, &r.fork, None))
            .await
            .unwrap();

        assert!(matches!(first, BackportOutcome::Clean { .. }));
        assert!(matches!(second, BackportOutcome::Clean { commit, .. } if commit == sha(61)));
    }
}
