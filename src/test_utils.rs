//! Shared test utilities: in-memory interpreters, fixtures and generators.
//!
//! The fakes keep enough state that applied mutations are visible to the
//! next read, so a second pass over the same fake sees the first pass's
//! result.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::{Future, ready};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use regex::Regex;
use tempfile::TempDir;
use thiserror::Error;

use crate::census::CensusSnapshot;
use crate::census::cache::content_hash;
use crate::config::{BotConfig, CensusConfig, CensusLocation};
use crate::effects::{
    BranchData, CherryPickOutcome, CommitComment, CommitData, ForgeEffect, ForgeInterpreter,
    ForgeResponse, PrStateChange, TrackerEffect, TrackerInterpreter, TrackerResponse, VcsEffect,
    VcsInterpreter, VcsResponse,
};
use crate::git::{CommitIdentity, GitConfig};
use crate::labeler::LabelConfiguration;
use crate::reconcile::Steward;
use crate::records::PrRecords;
use crate::requirement::approval::ApprovalRule;
use crate::types::{
    Comment, CommentId, Issue, IssueId, IssueLink, IssueState, LinkRelation, PrNumber, PrState,
    PullRequest, RepoId, Review, ReviewVerdict, Sha,
};

const BOT: &str = "steward";

/// Error returned by the fakes for anything not scripted.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct FakeError(pub String);

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ─── Fixtures ─────────────────────────────────────────────────────────────────

/// A deterministic, distinct 40-character SHA.
pub fn sha(n: u64) -> Sha {
    Sha::new(format!("{:08x}", n & 0xffff_ffff).repeat(5))
}

/// `n` minutes after the fixture epoch.
pub fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
}

pub fn comment(id: u64, author: &str, body: &str) -> Comment {
    Comment {
        id: CommentId(id),
        author: author.into(),
        body: body.into(),
        created_at: at(id as i64),
    }
}

pub fn review(login: &str, verdict: ReviewVerdict, minute: i64) -> Review {
    Review {
        reviewer: login.into(),
        verdict,
        sha: None,
        submitted_at: at(minute),
    }
}

/// An open pull request by `author-gh` against `master` of `openjdk/jdk`.
pub fn pull_request(n: u64) -> PullRequest {
    PullRequest {
        repo: RepoId::new("openjdk", "jdk"),
        number: PrNumber(n),
        title: format!("Change {}", n),
        body: String::new(),
        author: "author-gh".into(),
        labels: BTreeSet::new(),
        state: PrState::Open,
        source_ref: format!("change-{}", n),
        target_ref: "master".into(),
        head_sha: sha(1000 + n),
    }
}

/// An open bug.
pub fn issue(id: &str) -> Issue {
    Issue {
        id: IssueId::new(id),
        title: format!("Issue {}", id),
        issue_type: Some("Bug".into()),
        state: IssueState::Open,
        resolution: None,
        status: Some("Open".into()),
        fix_versions: BTreeSet::new(),
        links: Vec::new(),
        labels: BTreeSet::new(),
        jep_number: None,
        web_url: format!("https://bugs.example.org/browse/{}", id),
    }
}

pub fn closed_issue(id: &str, resolution: &str) -> Issue {
    let mut i = issue(id);
    i.state = IssueState::Closed;
    i.status = Some("Closed".into());
    i.resolution = Some(resolution.into());
    i
}

pub fn link(relation: LinkRelation, target: &str) -> IssueLink {
    IssueLink {
        relation,
        target: IssueId::new(target),
    }
}

/// A rule with `-fix-request`/`-fix-yes`/`-fix-no` suffixes, maintained by
/// the census user `reviewer`.
pub fn approval_rule(branches: &str) -> ApprovalRule {
    ApprovalRule {
        branches: Regex::new(branches).unwrap(),
        repo: None,
        request_suffix: "-fix-request".into(),
        approved_suffix: "-fix-yes".into(),
        rejected_suffix: "-fix-no".into(),
        prefix_substitutions: BTreeMap::new(),
        maintainers: vec!["reviewer".into()],
        document_link: "https://example.org/approval".into(),
        post_explanation: true,
        term: "maintainer approval".into(),
    }
}

pub fn label_config() -> LabelConfiguration {
    let matcher = |p: &str| vec![Regex::new(p).unwrap()];
    let matchers = BTreeMap::from([
        ("build".to_string(), matcher("^make/")),
        ("client".to_string(), matcher("^src/java.desktop/")),
        ("core-libs".to_string(), matcher("^src/java.base/")),
        ("hotspot-compiler".to_string(), matcher("^src/hotspot/share/opto/")),
        ("hotspot-gc".to_string(), matcher("^src/hotspot/share/gc/")),
    ]);
    let groups = BTreeMap::from([(
        "hotspot".to_string(),
        BTreeSet::from(["hotspot-compiler".to_string(), "hotspot-gc".to_string()]),
    )]);
    LabelConfiguration::new(matchers, groups, BTreeSet::from(["compiler".to_string()]))
}

pub const CENSUS_JSON: &str = r#"{
    "version": 1,
    "domain": "openjdk.org",
    "contributors": [
        {"username": "author", "full_name": "Ada Author", "logins": ["author-gh"], "role": "author"},
        {"username": "committer", "full_name": "Carl Committer", "logins": ["committer-gh"], "role": "committer"},
        {"username": "reviewer", "full_name": "Rita Reviewer", "logins": ["reviewer-gh"], "role": "reviewer"}
    ],
    "integrators": ["integrator-gh"]
}"#;

pub fn census_fixture() -> CensusSnapshot {
    CensusSnapshot::from_json(CENSUS_JSON, content_hash(CENSUS_JSON)).unwrap()
}

/// Configuration for `openjdk/jdk` with CSR and JEP support and two
/// backport targets.
pub fn test_config() -> BotConfig {
    BotConfig {
        repo: RepoId::new("openjdk", "jdk"),
        bot_login: BOT.into(),
        tool_accounts: Vec::new(),
        web_base_url: "https://github.com".into(),
        census: CensusConfig {
            source: CensusLocation::File {
                path: PathBuf::from("census.json"),
            },
            cache_dir: PathBuf::from("census-cache"),
            ttl_secs: 600,
        },
        integrators: vec!["integrator-gh".into()],
        forks: BTreeMap::from([
            (RepoId::new("openjdk", "jdk17u"), RepoId::new("steward-bot", "jdk17u")),
            (RepoId::new("openjdk", "jdk21u"), RepoId::new("steward-bot", "jdk21u")),
        ]),
        fix_versions: BTreeMap::from([("jdk17u-dev".to_string(), "17.0.9".to_string())]),
        approval_rules: Vec::new(),
        labels: label_config(),
        enable_csr: true,
        enable_jep: true,
        issue_project: Some("JDK".into()),
        tracker: None,
        git: GitConfig {
            base_dir: PathBuf::from("/tmp/pr-steward"),
            remote_base: "https://github.com".into(),
            commit_identity: CommitIdentity {
                name: "Steward".into(),
                email: "steward@example.org".into(),
                signing_key: None,
            },
        },
        max_concurrency: 2,
    }
}

// ─── Generators ───────────────────────────────────────────────────────────────

pub fn arb_pr_number() -> impl Strategy<Value = PrNumber> {
    any::<u64>().prop_map(PrNumber)
}

pub fn arb_sha() -> impl Strategy<Value = Sha> {
    "[0-9a-f]{40}".prop_map(|s| Sha::parse(s).unwrap())
}

pub fn arb_label_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(
        prop::sample::select(vec!["build", "csr", "jep", "ready", "hotspot", "approval"]),
        0..6,
    )
    .prop_map(|labels| labels.into_iter().map(String::from).collect())
}

// ─── Fake Forge ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ForgeState {
    prs: BTreeMap<PrNumber, PullRequest>,
    comments: BTreeMap<PrNumber, Vec<Comment>>,
    reviews: BTreeMap<PrNumber, Vec<Review>>,
    changed_files: BTreeMap<PrNumber, Vec<String>>,
    compares: HashMap<(Sha, Sha), Vec<String>>,
    commits: BTreeMap<Sha, CommitData>,
    commit_comments: Vec<CommitComment>,
    branches: BTreeMap<RepoId, Vec<BranchData>>,
    default_branches: BTreeMap<RepoId, String>,
    files: HashMap<(RepoId, String, String), String>,
    next_id: u64,
    fail_next: Option<String>,
    calls: Vec<ForgeEffect>,
}

/// An in-memory forge for `openjdk/jdk`, acting as the bot `steward`.
#[derive(Debug)]
pub struct FakeForge {
    repo: RepoId,
    state: Mutex<ForgeState>,
}

impl Default for FakeForge {
    fn default() -> Self {
        Self::new()
    }
}

fn branch_head(name: &str) -> Sha {
    sha(name
        .bytes()
        .fold(7u64, |h, b| h.wrapping_mul(31).wrapping_add(u64::from(b))))
}

impl FakeForge {
    pub fn new() -> Self {
        FakeForge {
            repo: RepoId::new("openjdk", "jdk"),
            state: Mutex::new(ForgeState {
                next_id: 10_000,
                ..ForgeState::default()
            }),
        }
    }

    pub fn put_pr(&self, pr: PullRequest) {
        lock(&self.state).prs.insert(pr.number, pr);
    }

    pub fn pr(&self, number: PrNumber) -> PullRequest {
        lock(&self.state).prs[&number].clone()
    }

    pub fn add_comment(&self, pr: PrNumber, comment: Comment) {
        lock(&self.state).comments.entry(pr).or_default().push(comment);
    }

    pub fn comments(&self, pr: PrNumber) -> Vec<Comment> {
        lock(&self.state).comments.get(&pr).cloned().unwrap_or_default()
    }

    pub fn add_review(&self, pr: PrNumber, review: Review) {
        lock(&self.state).reviews.entry(pr).or_default().push(review);
    }

    pub fn set_changed_files(&self, pr: PrNumber, files: &[&str]) {
        let files = files.iter().map(|f| f.to_string()).collect();
        lock(&self.state).changed_files.insert(pr, files);
    }

    pub fn set_compare(&self, base: &Sha, head: &Sha, files: &[&str]) {
        let files = files.iter().map(|f| f.to_string()).collect();
        lock(&self.state)
            .compares
            .insert((base.clone(), head.clone()), files);
    }

    /// A commit authored by Duke.
    pub fn put_commit(&self, commit: Sha) {
        let data = CommitData {
            sha: commit.clone(),
            author_name: "Duke".into(),
            author_email: "duke@openjdk.org".into(),
            authored_at: at(0),
            message: "8000001: Fix the crash\n\nReviewed-by: reviewer".into(),
        };
        lock(&self.state).commits.insert(commit, data);
    }

    pub fn add_commit_comment(&self, commit: &Sha, comment: Comment) {
        lock(&self.state).commit_comments.push(CommitComment {
            commit: commit.clone(),
            comment,
        });
    }

    pub fn commit_comments(&self, commit: &Sha) -> Vec<Comment> {
        lock(&self.state)
            .commit_comments
            .iter()
            .filter(|c| &c.commit == commit)
            .map(|c| c.comment.clone())
            .collect()
    }

    /// Branches of `repo`, each at a head derived from its name.
    pub fn set_branches(&self, repo: &RepoId, names: &[&str]) {
        let branches = names
            .iter()
            .map(|name| BranchData {
                name: name.to_string(),
                head: branch_head(name),
            })
            .collect();
        lock(&self.state).branches.insert(repo.clone(), branches);
    }

    pub fn set_default_branch(&self, repo: &RepoId, name: &str) {
        lock(&self.state)
            .default_branches
            .insert(repo.clone(), name.to_string());
    }

    pub fn set_file(&self, repo: &RepoId, path: &str, git_ref: &str, contents: &str) {
        lock(&self.state).files.insert(
            (repo.clone(), path.to_string(), git_ref.to_string()),
            contents.to_string(),
        );
    }

    /// Makes the next call fail with `message`.
    pub fn fail_next(&self, message: &str) {
        lock(&self.state).fail_next = Some(message.to_string());
    }

    /// Every effect interpreted so far, queries included.
    pub fn calls(&self) -> Vec<ForgeEffect> {
        lock(&self.state).calls.clone()
    }

    pub fn mutations(&self) -> Vec<ForgeEffect> {
        self.calls().into_iter().filter(ForgeEffect::is_mutation).collect()
    }

    fn handle(&self, effect: ForgeEffect) -> Result<ForgeResponse, FakeError> {
        let mut s = lock(&self.state);
        s.calls.push(effect.clone());
        if let Some(message) = s.fail_next.take() {
            return Err(FakeError(message));
        }
        let missing = |what: String| Err(FakeError(format!("no such {}", what)));

        match effect {
            ForgeEffect::GetPr { pr } => match s.prs.get(&pr) {
                Some(p) => Ok(ForgeResponse::Pr(Box::new(p.clone()))),
                None => missing(format!("pull request {}", pr)),
            },
            ForgeEffect::ListOpenPrs => Ok(ForgeResponse::PrList(
                s.prs.values().filter(|p| p.state.is_open()).cloned().collect(),
            )),
            ForgeEffect::ListComments { pr } => Ok(ForgeResponse::Comments(
                s.comments.get(&pr).cloned().unwrap_or_default(),
            )),
            ForgeEffect::ListReviews { pr } => Ok(ForgeResponse::Reviews(
                s.reviews.get(&pr).cloned().unwrap_or_default(),
            )),
            ForgeEffect::ListChangedFiles { pr } => Ok(ForgeResponse::Files(
                s.changed_files.get(&pr).cloned().unwrap_or_default(),
            )),
            ForgeEffect::CompareFiles { base, head } => match s.compares.get(&(base.clone(), head)) {
                Some(files) => Ok(ForgeResponse::Files(files.clone())),
                None => missing(format!("comparison from {}", base)),
            },
            ForgeEffect::PostComment { pr, body } => {
                let id = s.next_id;
                s.next_id += 1;
                s.comments.entry(pr).or_default().push(comment(id, BOT, &body));
                Ok(ForgeResponse::CommentPosted { id: CommentId(id) })
            }
            ForgeEffect::UpdateComment { comment_id, body } => {
                let found = s
                    .comments
                    .values_mut()
                    .flatten()
                    .find(|c| c.id == comment_id);
                match found {
                    Some(c) => {
                        c.body = body;
                        Ok(ForgeResponse::Done)
                    }
                    None => missing(format!("comment {}", comment_id)),
                }
            }
            ForgeEffect::AddLabel { pr, label } => Self::with_pr(&mut s, pr, |p| {
                p.labels.insert(label);
            }),
            ForgeEffect::RemoveLabel { pr, label } => Self::with_pr(&mut s, pr, |p| {
                p.labels.remove(&label);
            }),
            ForgeEffect::SetBody { pr, body } => Self::with_pr(&mut s, pr, |p| p.body = body),
            ForgeEffect::SetTitle { pr, title } => Self::with_pr(&mut s, pr, |p| p.title = title),
            ForgeEffect::SetState { pr, state } => Self::with_pr(&mut s, pr, |p| {
                p.state = match state {
                    PrStateChange::Open => PrState::Open,
                    PrStateChange::Closed => PrState::Closed,
                }
            }),
            ForgeEffect::GetCommit { commit } => match s.commits.get(&commit) {
                Some(c) => Ok(ForgeResponse::Commit(c.clone())),
                None => missing(format!("commit {}", commit)),
            },
            ForgeEffect::ListCommitComments { commit } => Ok(ForgeResponse::CommitComments(
                s.commit_comments
                    .iter()
                    .filter(|c| c.commit == commit)
                    .cloned()
                    .collect(),
            )),
            ForgeEffect::ListRecentCommitComments { since } => {
                let mut recent: Vec<CommitComment> = s
                    .commit_comments
                    .iter()
                    .filter(|c| c.comment.created_at >= since)
                    .cloned()
                    .collect();
                recent.sort_by_key(|c| c.comment.created_at);
                Ok(ForgeResponse::CommitComments(recent))
            }
            ForgeEffect::PostCommitComment { commit, body } => {
                let id = s.next_id;
                s.next_id += 1;
                s.commit_comments.push(CommitComment {
                    commit,
                    comment: comment(id, BOT, &body),
                });
                Ok(ForgeResponse::CommentPosted { id: CommentId(id) })
            }
            ForgeEffect::ListBranches { repo } => Ok(ForgeResponse::Branches(
                s.branches.get(&repo).cloned().unwrap_or_default(),
            )),
            ForgeEffect::DefaultBranch { repo } => Ok(ForgeResponse::DefaultBranch(
                s.default_branches
                    .get(&repo)
                    .cloned()
                    .unwrap_or_else(|| "master".into()),
            )),
            ForgeEffect::CreateBranch { branch, commit } => {
                let repo = self.repo.clone();
                s.branches.entry(repo).or_default().push(BranchData {
                    name: branch,
                    head: commit,
                });
                Ok(ForgeResponse::Done)
            }
            ForgeEffect::GetFileContents { repo, path, git_ref } => {
                match s.files.get(&(repo, path.clone(), git_ref)) {
                    Some(text) => Ok(ForgeResponse::FileContents(text.clone())),
                    None => missing(format!("file {}", path)),
                }
            }
        }
    }

    fn with_pr(
        s: &mut ForgeState,
        pr: PrNumber,
        f: impl FnOnce(&mut PullRequest),
    ) -> Result<ForgeResponse, FakeError> {
        match s.prs.get_mut(&pr) {
            Some(p) => {
                f(p);
                Ok(ForgeResponse::Done)
            }
            None => Err(FakeError(format!("no such pull request {}", pr))),
        }
    }
}

impl ForgeInterpreter for FakeForge {
    type Error = FakeError;

    fn interpret(
        &self,
        effect: ForgeEffect,
    ) -> impl Future<Output = Result<ForgeResponse, FakeError>> + Send {
        ready(self.handle(effect))
    }
}

// ─── Fake Tracker ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct TrackerState {
    issues: BTreeMap<IssueId, Issue>,
    updated: Vec<IssueId>,
    calls: Vec<TrackerEffect>,
}

#[derive(Debug, Default)]
pub struct FakeTracker {
    state: Mutex<TrackerState>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, issue: Issue) {
        lock(&self.state).issues.insert(issue.id.clone(), issue);
    }

    pub fn issue(&self, id: &str) -> Issue {
        lock(&self.state).issues[&IssueId::new(id)].clone()
    }

    /// Issues reported by every `UpdatedSince` query.
    pub fn mark_updated(&self, ids: &[&str]) {
        lock(&self.state).updated = ids.iter().map(|id| IssueId::new(*id)).collect();
    }

    pub fn calls(&self) -> Vec<TrackerEffect> {
        lock(&self.state).calls.clone()
    }

    fn handle(&self, effect: TrackerEffect) -> Result<TrackerResponse, FakeError> {
        let mut s = lock(&self.state);
        s.calls.push(effect.clone());
        match effect {
            TrackerEffect::GetIssue { id } => Ok(TrackerResponse::Issue(
                s.issues.get(&id).cloned().map(Box::new),
            )),
            TrackerEffect::GetLinkedIssues { id, relation } => {
                let linked = s
                    .issues
                    .get(&id)
                    .map(|i| {
                        i.linked(&relation)
                            .into_iter()
                            .filter_map(|target| s.issues.get(target).cloned())
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(TrackerResponse::Issues(linked))
            }
            TrackerEffect::FindJep { number } => Ok(TrackerResponse::Issue(
                s.issues
                    .values()
                    .find(|i| i.jep_number.as_deref() == Some(number.as_str()))
                    .cloned()
                    .map(Box::new),
            )),
            TrackerEffect::UpdatedSince { .. } => Ok(TrackerResponse::Updated(s.updated.clone())),
            TrackerEffect::SetProperty { id, key, value } => {
                let Some(issue) = s.issues.get_mut(&id) else {
                    return Err(FakeError(format!("no such issue {}", id)));
                };
                if key == "labels" {
                    issue.labels = serde_json::from_value(value)
                        .map_err(|e| FakeError(e.to_string()))?;
                }
                Ok(TrackerResponse::Done)
            }
            TrackerEffect::AddComment { id, .. } => {
                if s.issues.contains_key(&id) {
                    Ok(TrackerResponse::Done)
                } else {
                    Err(FakeError(format!("no such issue {}", id)))
                }
            }
        }
    }
}

impl TrackerInterpreter for FakeTracker {
    type Error = FakeError;

    fn interpret(
        &self,
        effect: TrackerEffect,
    ) -> impl Future<Output = Result<TrackerResponse, FakeError>> + Send {
        ready(self.handle(effect))
    }
}

// ─── Fake VCS ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct VcsState {
    branches: HashMap<(RepoId, String), Sha>,
    picks: HashMap<(Sha, RepoId, String), CherryPickOutcome>,
    calls: Vec<VcsEffect>,
}

/// Scripted branch tips and cherry-pick outcomes. Unscripted picks apply
/// cleanly.
#[derive(Debug, Default)]
pub struct FakeVcs {
    state: Mutex<VcsState>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_branch(&self, repo: &RepoId, branch: &str, head: Sha) {
        lock(&self.state)
            .branches
            .insert((repo.clone(), branch.to_string()), head);
    }

    pub fn set_pick(&self, commit: &Sha, target: &RepoId, branch: &str, outcome: CherryPickOutcome) {
        lock(&self.state).picks.insert(
            (commit.clone(), target.clone(), branch.to_string()),
            outcome,
        );
    }

    pub fn calls(&self) -> Vec<VcsEffect> {
        lock(&self.state).calls.clone()
    }

    fn handle(&self, effect: VcsEffect) -> VcsResponse {
        let mut s = lock(&self.state);
        s.calls.push(effect.clone());
        match effect {
            VcsEffect::ResolveBranch { repo, branch } => {
                VcsResponse::Resolved(s.branches.get(&(repo, branch)).cloned())
            }
            VcsEffect::CherryPick {
                commit,
                target,
                branch,
                ..
            } => VcsResponse::CherryPick(
                s.picks
                    .get(&(commit, target, branch))
                    .cloned()
                    .unwrap_or(CherryPickOutcome::Clean { commit: sha(4000) }),
            ),
            VcsEffect::Push {
                repo,
                commit,
                branch,
                ..
            } => {
                s.branches.insert((repo, branch), commit);
                VcsResponse::Pushed
            }
        }
    }
}

impl VcsInterpreter for FakeVcs {
    type Error = FakeError;

    fn interpret(
        &self,
        effect: VcsEffect,
    ) -> impl Future<Output = Result<VcsResponse, FakeError>> + Send {
        ready(Ok(self.handle(effect)))
    }
}

// ─── Steward Harness ──────────────────────────────────────────────────────────

/// A [`Steward`] over the fakes, reading the fixture census from a
/// temporary directory.
pub struct TestSteward {
    steward: Steward<FakeForge, FakeTracker, FakeVcs>,
    _dir: TempDir,
}

impl TestSteward {
    pub fn new(forge: FakeForge, tracker: FakeTracker, vcs: FakeVcs) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let census_path = dir.path().join("census.json");
        std::fs::write(&census_path, CENSUS_JSON).unwrap();
        let mut config = test_config();
        config.census = CensusConfig {
            source: CensusLocation::File { path: census_path },
            cache_dir: dir.path().join("cache"),
            ttl_secs: 600,
        };
        let steward = Steward::new(Arc::new(config), forge, tracker, vcs, PrRecords::in_memory());
        TestSteward {
            steward,
            _dir: dir,
        }
    }

    pub fn configure(&mut self, f: impl FnOnce(&mut BotConfig)) {
        f(Arc::make_mut(&mut self.steward.config));
    }
}

impl Deref for TestSteward {
    type Target = Steward<FakeForge, FakeTracker, FakeVcs>;

    fn deref(&self) -> &Self::Target {
        &self.steward
    }
}

impl DerefMut for TestSteward {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.steward
    }
}
