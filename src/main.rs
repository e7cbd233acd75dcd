use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gh_pr_notify::jobs::{Poller, Scheduler};
use gh_pr_notify::source::GhCli;
use gh_pr_notify::store::StateFile;
use gh_pr_notify::{cli, config, notification};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = cli::Cli::parse();

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "gh_pr_notify=info".into()),
    );
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let result = run(args).await;
    if let Err(ref e) = result {
        tracing::error!("{:#}", e);
    }
    result
}

async fn run(args: cli::Cli) -> anyhow::Result<()> {
    let cfg = config::load(args)?;

    let gh = GhCli::new().with_author(cfg.author.clone());
    gh.preflight().await.context("dependency check failed")?;

    let notifiers = notification::from_config(&cfg);
    tracing::info!(
        interval = ?cfg.interval,
        state = %cfg.state_path.display(),
        author = %cfg.author,
        channels = ?cfg.enabled_channels(),
        "gh-pr-notify: polling every {:?}",
        cfg.interval
    );
    if notifiers.is_empty() {
        tracing::warn!("no notification channels enabled; approvals will only be logged");
    }

    let poller = Poller::new(StateFile::new(&cfg.state_path), Arc::new(gh), notifiers)
        .with_first_sighting(cfg.first_sighting)
        .with_lookup_concurrency(cfg.lookup_concurrency);

    if cfg.once {
        poller.run_cycle().await.context("poll failed")?;
        return Ok(());
    }

    // Handlers are installed before the first cycle so a signal during it is
    // held until the next cycle boundary instead of killing the process.
    let stopped = shutdown_signal()?;

    let poller = &poller;
    Scheduler::new(cfg.interval)
        .run(stopped, move || async move {
            if let Err(e) = poller.run_cycle().await {
                tracing::error!(error = %e, "poll failed, retrying next tick");
            }
        })
        .await;

    tracing::info!("shutting down");
    Ok(())
}

/// Future that resolves on SIGINT or SIGTERM (Ctrl-C elsewhere).
fn shutdown_signal() -> anyhow::Result<impl Future<Output = ()>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
        let mut terminate = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
        Ok(async move {
            tokio::select! {
                _ = interrupt.recv() => {},
                _ = terminate.recv() => {},
            }
        })
    }

    #[cfg(not(unix))]
    {
        Ok(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
    }
}
