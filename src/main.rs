//! FoodInsight Edge - shelf inventory monitor
//!
//! Main entry point for the edge service.

use foodinsight_edge::{
    camera_source::SnapshotSource,
    config::{Platform, Settings},
    detection_loop::{DetectionLoop, LoopConfig, LoopSinks},
    ports::AlwaysDetect,
    state::AppState,
    tracker_client::RemoteTracker,
    web_api,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foodinsight_edge=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FoodInsight Edge v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    tracing::info!(
        platform = %Platform::detect(),
        machine_id = %settings.machine_id,
        camera_url = %settings.camera_url,
        tracker_url = %settings.tracker_url,
        api_url = %settings.api_url,
        push_enabled = !settings.api_key.is_empty(),
        input_size = settings.input_size,
        every_n = settings.process_every_n_frames,
        debounce_frames = settings.debounce_frames,
        "Configuration loaded"
    );

    // Shared components
    let state = AppState::from_settings(settings.clone())?;

    // Detection loop
    let detection_loop = DetectionLoop::new(
        LoopConfig::from_settings(&settings),
        Box::new(SnapshotSource::from_url(&settings.camera_url)?),
        Box::new(RemoteTracker::from_settings(&settings)?),
        Box::new(AlwaysDetect),
        state.inventory.clone(),
        LoopSinks {
            frames: state.status.clone(),
            status: state.status.clone(),
            deltas: state.api_client.clone(),
        },
    );
    let loop_handle = detection_loop.spawn();

    // Start server
    let app = web_api::create_router(state);
    let addr = format!("{}:{}", settings.admin_host, settings.admin_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down detection loop");
    loop_handle.stop().await;
    loop_handle.join().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
