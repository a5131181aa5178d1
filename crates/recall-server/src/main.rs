//! recall-server - REST API server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use recall_core::RecallConfig;
use recall_server::{create_server, create_server_with_auth, AppState};
use recall_stores::StoreFactory;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}

fn load_config() -> Result<RecallConfig, Box<dyn std::error::Error>> {
    match std::env::var("RECALL_CONFIG") {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            Ok(RecallConfig::from_file(PathBuf::from(path))?)
        }
        Err(_) => Ok(RecallConfig::from_env()?),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("recall_server=debug".parse()?),
        )
        .init();

    let host = std::env::var("RECALL_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("RECALL_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;
    let api_key = std::env::var("RECALL_API_KEY").ok();
    let require_auth = std::env::var("RECALL_REQUIRE_AUTH").is_ok();

    let config = load_config()?;
    let store = StoreFactory::create(&config.store)?;
    info!(store = store.name(), "Store ready");

    let state = AppState::new(store, config)?;

    let app = match (require_auth, api_key) {
        (true, Some(key)) => {
            info!("Authentication enabled");
            create_server_with_auth(state, key)
        }
        (true, None) => {
            return Err("RECALL_REQUIRE_AUTH is set but RECALL_API_KEY is missing".into());
        }
        (false, _) => {
            info!("Authentication disabled");
            create_server(state)
        }
    };

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting recall-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}
