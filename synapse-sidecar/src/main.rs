//! `synapse-sidecar`: a standalone HTTP front end for the C7 rate
//! limiter / circuit breaker, for processes that want admission control
//! without linking the core directly. Wiring (clap args, tracing-subscriber
//! setup, axum serve loop) follows `privstack-relay`'s `main.rs` and
//! `bones-cli`'s `init_tracing`.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use synapse_core::config::{RECOGNIZED_ENV_VARS, SynapseConfig};
use synapse_sidecar::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "synapse-sidecar", about = "Rate-limiter / circuit-breaker HTTP sidecar")]
struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1:8088")]
    bind: SocketAddr,

    /// Emit JSON log lines instead of compact human-readable ones.
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new("info"))
        .expect("default log filter is valid");

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn load_config() -> SynapseConfig {
    let observed: Vec<(String, String)> = std::env::vars()
        .filter(|(key, _)| RECOGNIZED_ENV_VARS.contains(&key.as_str()) || key.starts_with("SYNAPSE_"))
        .collect();

    let (config, unrecognized) = SynapseConfig::from_recognized_env(observed);
    for name in unrecognized {
        tracing::warn!(var = %name, "unrecognized SYNAPSE_ environment variable");
    }
    config
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = load_config();
    let metrics = Arc::new(synapse_observability::MetricsCollector::new());
    let state = Arc::new(AppState::new(config.resilience, metrics));
    let router = build_router(state);

    let listener = match tokio::net::TcpListener::bind(cli.bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(bind = %cli.bind, error = %err, "failed to bind sidecar listener");
            return ExitCode::from(2);
        }
    };

    tracing::info!(bind = %cli.bind, "synapse-sidecar listening");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    };

    if let Err(err) = axum::serve(listener, router).with_graceful_shutdown(shutdown).await {
        tracing::error!(error = %err, "sidecar server exited with an error");
        return ExitCode::from(2);
    }

    ExitCode::SUCCESS
}
