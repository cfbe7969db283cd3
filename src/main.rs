use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scv::config::Config;
use scv::deploy::DeployServiceClient;
use scv::queue::{QueueRunner, SpoolQueue};
use scv::server::{AppState, build_router};
use scv::settings::{FileSettingsStore, SettingsStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scv=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let settings: Arc<dyn SettingsStore> = Arc::new(FileSettingsStore::new(config.settings_dir()));
    let queue = SpoolQueue::new(config.queue_dir());
    let notify = queue.notifier();
    let deploy_client = DeployServiceClient::new(config.deploy_timeout)
        .context("failed to build deploy service client")?;

    let state = AppState::assemble(settings, Arc::new(queue), deploy_client);
    let app = build_router(state);

    let shutdown = CancellationToken::new();
    let runner = QueueRunner::new(config.queue_dir(), config.runner_config())
        .context("failed to build queue runner")?;
    let runner_handle = tokio::spawn(runner.run(notify, shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(
        addr = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        task_base_url = %config.task_base_url,
        "listening"
    );

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl-C received, shutting down");
                }
                _ = server_shutdown.cancelled() => {}
            }
        })
        .await
        .context("server error")?;

    shutdown.cancel();
    runner_handle.await.context("queue runner panicked")?;

    Ok(())
}
