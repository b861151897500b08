//! # Serve Subcommand
//!
//! Runs the decision API over the configured servers.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Args;
use xidauth_api::state::AppState;
use xidauth_verify::AuthMetrics;

use crate::config::ServiceConfig;
use crate::service_span;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8400";

/// Arguments for `xidauth serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Do not expose Prometheus metrics at /metrics.
    #[arg(long)]
    pub no_metrics: bool,
}

/// Execute the serve subcommand. Blocks until the server stops.
pub fn run_serve(args: &ServeArgs, config: ServiceConfig) -> Result<u8> {
    let metrics = if args.no_metrics {
        None
    } else {
        Some(AuthMetrics::new().context("failed to register metrics")?)
    };
    let addr = args.listen;

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(async move {
        let span = service_span();
        let service = tokio::task::spawn_blocking(move || config.build(&span, metrics))
            .await
            .context("startup task failed")??;
        service.log_servers();

        let app = xidauth_api::app(AppState::new(service));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        tracing::info!("xidauth API listening on {addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;
        Ok::<u8, anyhow::Error>(0)
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
