//! ReportLink proxy binary.
//!
//! `reportlink-server` (or `reportlink-server serve`) runs the HTTP facade.
//! `reportlink-server token --report-id … --dataset-id …` mints a single
//! embed token and prints the front-end payload, which is handy when
//! checking credentials against a real tenant.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use reportlink_models::{DatasetId, ReportId, WorkspaceId, parse_id_list};
use reportlink_server::config::{AppConfig, ReportTarget};
use reportlink_server::{AppState, router};
use tracing::info;

/// Embed-token proxy for the reporting service.
#[derive(Parser, Debug)]
#[command(name = "reportlink-server", about = "Embed-token proxy for the reporting service")]
struct Args {
    /// Listen port, overriding `LISTEN_PORT`.
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Mint one embed token and print the report payload as JSON.
    Token {
        /// Report to embed.
        #[arg(long)]
        report_id: ReportId,
        /// Dataset id(s), comma-separated.
        #[arg(long)]
        dataset_id: String,
        /// Workspace (group) containing the report.
        #[arg(long)]
        workspace_id: Option<WorkspaceId>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (controlled via RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = args.port {
        config.listen_port = port;
    }

    info!(
        authority_url = %config.credentials.authority_url,
        generate_embed_url = %config.embed.generate_embed_url,
        timeout_secs = config.upstream.timeout.as_secs(),
        timeout_retries = config.upstream.timeout_retries,
        "configuration loaded"
    );

    let state = AppState::new(config).context("failed to build HTTP client")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(Arc::new(state)).await,
        Command::Token {
            report_id,
            dataset_id,
            workspace_id,
        } => {
            let dataset_ids: Vec<DatasetId> = parse_id_list(&dataset_id, "dataset-id")?;
            let target = ReportTarget {
                report_id,
                dataset_ids,
                workspace_id,
            };
            let details = state.report_details(&target).await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
            Ok(())
        }
    }
}

async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    match state.config.embed.report.as_ref() {
        Some(target) => info!(report_id = %target.report_id, "report details target configured"),
        None => info!("no report details target configured"),
    }

    let addr = format!("0.0.0.0:{}", state.config.listen_port);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(address = %addr, "embed token proxy listening");
    axum::serve(listener, app).await.context("server error")
}
