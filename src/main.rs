use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pr_steward::config::{BotConfig, ConfigError, Settings};
use pr_steward::git::LocalGit;
use pr_steward::github::GitHubForge;
use pr_steward::reconcile::Steward;
use pr_steward::records::{PrRecords, RecordsError};
use pr_steward::server::{AppState, build_router};
use pr_steward::tracker::{JiraTracker, Tracker};
use pr_steward::worker::{PollConfig, Scheduler, run_sweeps};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot create GitHub client: {0}")]
    GitHub(#[from] octocrab::Error),

    #[error("cannot open PR records: {0}")]
    Records(#[from] RecordsError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pr_steward=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "pr-steward stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let settings = Settings::from_env()?;
    let config = Arc::new(BotConfig::load(&settings.config_path)?);
    info!(repo = %config.repo, "configuration loaded");

    let forge = GitHubForge::from_token(settings.github_token.clone(), config.repo.clone())?;
    let tracker = match &config.tracker {
        Some(tracker_config) => {
            let jira = JiraTracker::new(tracker_config, settings.tracker_token.clone());
            match &config.issue_project {
                Some(project) => Tracker::Jira(jira.with_jep_project(project)),
                None => Tracker::Jira(jira),
            }
        }
        None => Tracker::Disabled,
    };
    let vcs = LocalGit::new(config.git.clone(), Some(settings.github_token.clone()));
    std::fs::create_dir_all(&config.git.base_dir)?;
    let records = PrRecords::open(config.git.base_dir.join("records.json"))?;

    let steward = Arc::new(Steward::new(config.clone(), forge, tracker, vcs, records));
    let (scheduler, queue) = Scheduler::new(config.max_concurrency);
    let cancel = CancellationToken::new();

    let work = tokio::spawn(queue.run(steward.clone(), cancel.clone()));
    let sweeps = tokio::spawn(run_sweeps(
        steward,
        scheduler.clone(),
        PollConfig::from_env(),
        cancel.clone(),
    ));

    let app = build_router(AppState::new(
        config.repo.clone(),
        scheduler,
        settings.webhook_secret.clone(),
    ));
    let listener = tokio::net::TcpListener::bind(settings.listen_addr).await?;
    info!(addr = %settings.listen_addr, "listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutting down");
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    if let Err(e) = work.await {
        error!(error = %e, "scheduler task failed");
    }
    if let Err(e) = sweeps.await {
        error!(error = %e, "sweep task failed");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
