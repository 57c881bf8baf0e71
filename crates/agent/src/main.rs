//! `inlands-agent` -- translation and publication worker.
//!
//! Polls the queue service for jobs, drives the automation sidecar to run
//! them, and submits the outcomes. See [`AgentConfig::from_env`] for the
//! environment variables it reads.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inlands_agent::client::QueueClient;
use inlands_agent::config::AgentConfig;
use inlands_agent::driver::{CapabilityDriver, RemoteDriver, Serialized};
use inlands_agent::handlers::JobContext;
use inlands_agent::pool::WorkerPool;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inlands_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env().context("Invalid agent configuration")?;
    tracing::info!(
        server_url = %config.server_url,
        driver_url = %config.driver_url,
        max_concurrent_jobs = config.max_concurrent_jobs,
        shared_context = config.driver_shared_context,
        max_wait_secs = config.stability.max_wait().as_secs(),
        "Starting inlands-agent",
    );

    let http = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;
    let remote =
        RemoteDriver::with_client(http.clone(), config.driver_url.clone()).with_timeout(config.driver_timeout);
    let driver: Arc<dyn CapabilityDriver> = if config.driver_shared_context {
        Arc::new(Serialized::new(remote))
    } else {
        Arc::new(remote)
    };
    let source = Arc::new(
        QueueClient::with_client(http, config.server_url.clone())
            .with_timeouts(config.poll_timeout, config.submit_timeout),
    );

    let ctx = JobContext::new(driver, source, config.stability.clone());
    let pool = WorkerPool::new(ctx)
        .with_max_slots(config.max_concurrent_jobs)
        .with_poll_interval(config.poll_interval);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            return;
        }
        tracing::info!("Received SIGINT (Ctrl-C), finishing running jobs");
        shutdown.cancel();
    });

    pool.run(cancel).await;
    Ok(())
}
