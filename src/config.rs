//! Bot configuration.
//!
//! Repository policy (approval rules, labels, forks, census location) comes
//! from a JSON file named by `PR_STEWARD_CONFIG`. Secrets and process
//! settings come from the environment.
//!
//! # Environment
//!
//! - `PR_STEWARD_CONFIG` - path of the JSON configuration (required)
//! - `GITHUB_TOKEN` - forge token (required)
//! - `PR_STEWARD_WEBHOOK_SECRET` - webhook HMAC secret (required)
//! - `PR_STEWARD_TRACKER_TOKEN` - issue tracker token (optional)
//! - `PR_STEWARD_LISTEN_ADDR` - listen address, default `0.0.0.0:3000`
//! - `PR_STEWARD_POLL_INTERVAL_MINS` - sweep interval, see [`crate::worker::PollConfig`]

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::git::{CommitIdentity, GitConfig};
use crate::labeler::LabelConfiguration;
use crate::requirement::approval::{self, ApprovalRule};
use crate::types::RepoId;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_CENSUS_TTL_SECS: u64 = 600;
const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid listen address {0:?}")]
    InvalidListenAddr(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ─── File Format ──────────────────────────────────────────────────────────────

/// Where the census document is read from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CensusLocation {
    File {
        path: PathBuf,
    },
    Repository {
        repository: RepoId,
        path: String,
        git_ref: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CensusConfig {
    pub source: CensusLocation,
    pub cache_dir: PathBuf,
    #[serde(default = "default_census_ttl")]
    pub ttl_secs: u64,
}

impl CensusConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_census_ttl() -> u64 {
    DEFAULT_CENSUS_TTL_SECS
}

fn default_web_base_url() -> String {
    "https://github.com".to_string()
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ApprovalRuleFile {
    branches: String,
    #[serde(default)]
    repository: Option<RepoId>,
    request_suffix: String,
    approved_suffix: String,
    rejected_suffix: String,
    #[serde(default)]
    prefix_substitutions: BTreeMap<String, String>,
    maintainers: Vec<String>,
    document_link: String,
    #[serde(default = "default_true")]
    post_explanation: bool,
    term: String,
}

#[derive(Debug, Default, Deserialize)]
struct LabelsFile {
    #[serde(default)]
    matchers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    groups: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    extra: BTreeSet<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Base URL of the issue tracker, e.g. `https://bugs.example.org`.
    pub url: String,
    /// Offset of the tracker's time zone from UTC. Update queries are
    /// written in the tracker's local time.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Deserialize)]
struct GitFile {
    base_dir: PathBuf,
    #[serde(default = "default_web_base_url")]
    remote_base: String,
    commit_name: String,
    commit_email: String,
    #[serde(default)]
    signing_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    repository: RepoId,
    bot_login: String,
    #[serde(default)]
    tool_accounts: Vec<String>,
    #[serde(default = "default_web_base_url")]
    web_base_url: String,
    census: CensusConfig,
    #[serde(default)]
    integrators: Vec<String>,
    #[serde(default)]
    forks: BTreeMap<RepoId, RepoId>,
    #[serde(default)]
    fix_versions: BTreeMap<String, String>,
    #[serde(default)]
    approval_rules: Vec<ApprovalRuleFile>,
    #[serde(default)]
    labels: LabelsFile,
    #[serde(default)]
    enable_csr: bool,
    #[serde(default)]
    enable_jep: bool,
    #[serde(default)]
    issue_project: Option<String>,
    #[serde(default)]
    tracker: Option<TrackerConfig>,
    git: GitFile,
    #[serde(default = "default_max_concurrency")]
    max_concurrency: usize,
}

// ─── Validated Configuration ──────────────────────────────────────────────────

/// Validated repository policy.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub repo: RepoId,
    pub bot_login: String,
    pub tool_accounts: Vec<String>,
    pub web_base_url: String,
    pub census: CensusConfig,
    pub integrators: Vec<String>,
    /// Backport target repository to the fork backport branches are pushed to.
    pub forks: BTreeMap<RepoId, RepoId>,
    /// Target branch to the fix version changes on it are delivered in.
    pub fix_versions: BTreeMap<String, String>,
    pub approval_rules: Vec<ApprovalRule>,
    pub labels: LabelConfiguration,
    pub enable_csr: bool,
    pub enable_jep: bool,
    pub issue_project: Option<String>,
    pub tracker: Option<TrackerConfig>,
    pub git: GitConfig,
    pub max_concurrency: usize,
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

impl BotConfig {
    /// Reads and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(text)?;
        if file.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be positive".into()));
        }
        if (file.enable_csr || file.enable_jep) && file.issue_project.is_none() {
            return Err(ConfigError::Invalid(
                "CSR and JEP support need an issue_project".into(),
            ));
        }

        let approval_rules = file
            .approval_rules
            .into_iter()
            .map(|r| {
                Ok(ApprovalRule {
                    branches: compile(&r.branches)?,
                    repo: r.repository,
                    request_suffix: r.request_suffix,
                    approved_suffix: r.approved_suffix,
                    rejected_suffix: r.rejected_suffix,
                    prefix_substitutions: r.prefix_substitutions,
                    maintainers: r.maintainers,
                    document_link: r.document_link,
                    post_explanation: r.post_explanation,
                    term: r.term,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let mut matchers = BTreeMap::new();
        for (label, patterns) in file.labels.matchers {
            let compiled = patterns
                .iter()
                .map(|p| compile(p))
                .collect::<Result<Vec<_>, _>>()?;
            matchers.insert(label, compiled);
        }
        let labels = LabelConfiguration::new(matchers, file.labels.groups, file.labels.extra);

        let git = GitConfig {
            base_dir: file.git.base_dir,
            remote_base: file.git.remote_base,
            commit_identity: CommitIdentity {
                name: file.git.commit_name,
                email: file.git.commit_email,
                signing_key: file.git.signing_key,
            },
        };

        Ok(BotConfig {
            repo: file.repository,
            bot_login: file.bot_login,
            tool_accounts: file.tool_accounts,
            web_base_url: file.web_base_url.trim_end_matches('/').to_string(),
            census: file.census,
            integrators: file.integrators,
            forks: file.forks,
            fix_versions: file.fix_versions,
            approval_rules,
            labels,
            enable_csr: file.enable_csr,
            enable_jep: file.enable_jep,
            issue_project: file.issue_project,
            tracker: file.tracker,
            git,
            max_concurrency: file.max_concurrency,
        })
    }

    /// The approval rule governing changes to `branch` of this repository.
    pub fn approval_rule(&self, branch: &str) -> Option<&ApprovalRule> {
        approval::rule_for(&self.approval_rules, &self.repo, branch)
    }

    pub fn fix_version(&self, branch: &str) -> Option<&str> {
        self.fix_versions.get(branch).map(String::as_str)
    }

    /// Resolves a backport target as written by a user.
    ///
    /// A bare name is taken to be in the same namespace as this repository.
    pub fn backport_target(&self, written: &str) -> Option<RepoId> {
        let repo = if written.is_empty() {
            self.repo.clone()
        } else if written.contains('/') {
            written.parse().ok()?
        } else {
            RepoId::new(&self.repo.owner, written)
        };
        self.forks.contains_key(&repo).then_some(repo)
    }

    pub fn web_url(&self, repo: &RepoId) -> String {
        format!("{}/{}", self.web_base_url, repo)
    }
}

// ─── Environment ──────────────────────────────────────────────────────────────

/// Secrets and process settings read from the environment.
#[derive(Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    pub github_token: String,
    pub webhook_secret: Vec<u8>,
    pub tracker_token: Option<String>,
    pub listen_addr: SocketAddr,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("config_path", &self.config_path)
            .field("listen_addr", &self.listen_addr)
            .finish_non_exhaustive()
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingEnv(name))
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen = std::env::var("PR_STEWARD_LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(listen.clone()))?;
        Ok(Settings {
            config_path: PathBuf::from(required("PR_STEWARD_CONFIG")?),
            github_token: required("GITHUB_TOKEN")?,
            webhook_secret: required("PR_STEWARD_WEBHOOK_SECRET")?.into_bytes(),
            tracker_token: std::env::var("PR_STEWARD_TRACKER_TOKEN").ok(),
            listen_addr,
        })
    }
}
