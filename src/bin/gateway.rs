//! sandbox-gateway - HTTP entry point

use clap::Parser;
use sandbox_gateway::config::{self, validate_config, Config};
use sandbox_gateway::gateway::build_router;
use sandbox_gateway::sandbox::{DockerRuntime, ExecutionGateway};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

// ---- CLI ----

#[derive(Parser)]
#[command(name = "sandbox-gateway", version, about = "Run untrusted code in ephemeral containers over HTTP")]
struct Args {
    /// Config file (JSON5 or TOML)
    #[arg(long, short, env = "SANDBOX_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Port (overrides config)
    #[arg(long, short)]
    port: Option<u16>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,bollard=warn".into());

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load(args: &Args) -> sandbox_gateway::Result<Config> {
    let mut config = match &args.config {
        Some(path) => config::load_config_with(path)?,
        None => config::load_config()?,
    };

    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

// ---- Main ----

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before clap and path resolution, both of which read the environment
    config::load_dotenv();
    let args = Args::parse();
    init_tracing(args.json_logs);

    let config = load(&args)?;

    let validation = validate_config(&config);
    for issue in &validation.warnings {
        warn!("Config warning: {}", issue);
    }
    if !validation.valid {
        for issue in &validation.errors {
            error!("Config error: {}", issue);
        }
        anyhow::bail!("invalid configuration ({} errors)", validation.errors.len());
    }

    let runtime = DockerRuntime::connect().await?;
    let gateway = ExecutionGateway::new(Arc::new(runtime), &config.sandbox)?;
    info!(
        "{} v{} using {} runtime, run timeout {:?}",
        sandbox_gateway::NAME,
        sandbox_gateway::VERSION,
        gateway.runtime_name(),
        gateway.run_timeout()
    );

    let app = build_router(Arc::new(gateway));

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
