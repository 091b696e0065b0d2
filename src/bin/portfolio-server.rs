#![forbid(unsafe_code)]

use std::process::ExitCode;
use std::sync::Arc;

use portfolio_sync::content::SeedData;
use portfolio_sync::http::{self, AppState};
use portfolio_sync::{ContentAdmin, InMemoryDocumentStore, ServerConfig};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
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
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}

async fn run(config: ServerConfig) -> Result<(), String> {
    let store = match &config.data_path {
        Some(path) => InMemoryDocumentStore::load_from_file(path)
            .await
            .map_err(|e| format!("loading {}: {}", path.display(), e))?
            .with_autosave(path.clone()),
        None => {
            warn!("PORTFOLIO_DATA_PATH not set; content lives in memory only");
            InMemoryDocumentStore::new()
        }
    };

    let admin = ContentAdmin::new(Arc::new(store)).with_policy(config.reorder_policy);

    if let Some(seed_path) = &config.seed_path {
        let seed = SeedData::from_file(seed_path)
            .await
            .map_err(|e| e.to_string())?;
        let report = admin
            .seed_if_empty(&seed)
            .await
            .map_err(|e| e.to_string())?;
        info!(inserted = report.total(), "seed checked");
    }

    let mut state = AppState::new(admin, config.static_root.clone());
    match &config.admin_token {
        Some(token) => state = state.with_admin_token(token.clone()),
        None => warn!("PORTFOLIO_ADMIN_TOKEN not set; admin writes are disabled"),
    }

    info!(
        root = %config.static_root.display(),
        policy = ?config.reorder_policy,
        "starting portfolio server"
    );
    http::serve(state, config.socket_addr(), wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server error: {}", e))
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("portfolio-server: {}", err);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_json);

    match run(config).await {
        Ok(()) => {
            info!("portfolio server stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "portfolio server failed");
            ExitCode::FAILURE
        }
    }
}
