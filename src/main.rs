//! rapport — per-session profile memory engine.
//! Fragments in, one deduplicated record per session out.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rapport::{api, AppState, MemoryEngine};

#[derive(Parser)]
#[command(name = "rapport", version, about = "Per-session profile memory engine")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3944", env = "RAPPORT_PORT")]
    port: u16,

    /// Directory holding one JSON record per session
    #[arg(short, long, default_value = "rapport_data", env = "RAPPORT_DATA")]
    data: String,

    /// Seconds to wait for a session lock before giving up
    #[arg(long, default_value = "10", env = "RAPPORT_LOCK_TIMEOUT_SECS")]
    lock_timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let engine = MemoryEngine::open(&args.data, Duration::from_secs(args.lock_timeout_secs))
        .expect("failed to open record store");

    let api_key = std::env::var("RAPPORT_API_KEY").ok();
    let auth_status = if api_key.is_some() { "enabled" } else { "disabled" };

    let state = AppState {
        engine: Arc::new(engine),
        api_key,
        started_at: std::time::Instant::now(),
    };
    let app = api::router(state);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = args.port,
        data = %args.data,
        auth = auth_status,
        lock_timeout_secs = args.lock_timeout_secs,
        "rapport starting"
    );

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
    info!("shutting down");
}
