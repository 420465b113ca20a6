//! Real git repositories for tests: bare "remotes" on disk plus a work tree
//! used to create commits on them.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::types::{RepoId, Sha};

use super::{CommitIdentity, GitConfig, ensure_store, fetch, run_git_stdout, run_git_sync};

pub struct Remotes {
    dir: TempDir,
}

impl Remotes {
    /// `openjdk/jdk` and `openjdk/jdk17u`, both with one commit on `master`.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let remotes = Remotes { dir };

        let work = remotes.work_dir();
        std::fs::create_dir_all(&work).unwrap();
        run_git_sync(&work, &["init", "--quiet"]).unwrap();
        std::fs::write(work.join("README.md"), "# JDK\n").unwrap();
        std::fs::write(work.join("Main.java"), "class Main {}\n").unwrap();
        run_git_sync(&work, &["add", "."]).unwrap();
        remotes.commit_work("Initial commit");

        for name in ["jdk", "jdk17u"] {
            let bare = remotes.remote_dir(&Self::repo(name));
            std::fs::create_dir_all(&bare).unwrap();
            run_git_sync(&bare, &["init", "--bare", "--quiet"]).unwrap();
            let url = remotes.url(&Self::repo(name));
            run_git_sync(&work, &["push", "--quiet", &url, "HEAD:refs/heads/master"]).unwrap();
        }
        remotes
    }

    pub fn repo(name: &str) -> RepoId {
        RepoId::new("openjdk", name)
    }

    pub fn config(&self) -> GitConfig {
        GitConfig {
            base_dir: self.dir.path().join("base"),
            remote_base: self.dir.path().join("remotes").to_string_lossy().into_owned(),
            commit_identity: CommitIdentity {
                name: "Steward".to_string(),
                email: "steward@example.org".to_string(),
                signing_key: None,
            },
        }
    }

    pub fn url(&self, repo: &RepoId) -> String {
        self.config().remote_url(repo)
    }

    fn remote_dir(&self, repo: &RepoId) -> PathBuf {
        PathBuf::from(self.url(repo))
    }

    fn work_dir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    fn commit_work(&self, message: &str) {
        run_git_sync(
            &self.work_dir(),
            &[
                "-c",
                "user.name=Duke",
                "-c",
                "user.email=duke@openjdk.org",
                "commit",
                "--quiet",
                "-m",
                message,
            ],
        )
        .unwrap();
    }

    /// Writes `content` to `file` on top of `branch` of `repo` and pushes.
    /// A missing branch starts from `master`.
    pub fn commit(&self, repo: &RepoId, branch: &str, file: &str, content: &str, message: &str) -> Sha {
        let work = self.work_dir();
        let url = self.url(repo);
        let base = if self.tip(repo, branch).is_some() { branch } else { "master" };
        run_git_sync(&work, &["fetch", "--quiet", &url, base]).unwrap();
        run_git_sync(&work, &["checkout", "--quiet", "--detach", "FETCH_HEAD"]).unwrap();
        std::fs::write(work.join(file), content).unwrap();
        run_git_sync(&work, &["add", "."]).unwrap();
        self.commit_work(message);
        let refspec = format!("HEAD:refs/heads/{branch}");
        run_git_sync(&work, &["push", "--quiet", &url, &refspec]).unwrap();
        self.tip(repo, branch).unwrap()
    }

    pub fn tip(&self, repo: &RepoId, branch: &str) -> Option<Sha> {
        let pattern = format!("refs/heads/{branch}");
        let out = run_git_stdout(&self.work_dir(), &["ls-remote", &self.url(repo), &pattern]).unwrap();
        out.split_whitespace().next().map(|s| Sha::parse(s).unwrap())
    }

    /// Formats `commit` as it exists in `repo`.
    pub fn show(&self, repo: &RepoId, commit: &Sha, format: &str) -> String {
        let format = format!("--format={format}");
        run_git_stdout(
            &self.remote_dir(repo),
            &["log", "-1", &format, commit.as_str()],
        )
        .unwrap()
    }

    /// Initializes the store with `openjdk/jdk` master and returns its tip.
    pub fn seed_store(&self) -> Sha {
        let store = ensure_store(&self.config()).unwrap();
        fetch(&store, &self.url(&Self::repo("jdk")), "master").unwrap()
    }
}
