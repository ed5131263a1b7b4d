//! platewatch entry point

use platewatch::config::ClientConfig;
use platewatch::controller::SessionController;
use platewatch::ui::TracingProjection;
use platewatch::upload::HttpUploadClient;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "platewatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::default();
    info!(
        ws_url = %config.ws_url,
        upload_url = %config.upload_url,
        camera_id = config.camera_id,
        detection_enabled = config.detection_enabled,
        "Starting platewatch"
    );

    let ui = Arc::new(TracingProjection);
    let sink = Arc::new(HttpUploadClient::new(&config)?);
    let controller = SessionController::new(config, ui, sink);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping");
            let _ = shutdown_tx.send(true);
        }
    });

    controller.run(shutdown_rx).await?;
    info!("platewatch stopped");
    Ok(())
}
