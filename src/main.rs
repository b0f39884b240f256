use anyhow::Context;
use clap::Parser;
use ovos_dashboard::{
    build_plexus,
    bus::{MessageBus, WebsocketBus},
    network, Config,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// CLI arguments for the dashboard plugin
#[derive(Parser, Debug)]
#[command(name = "ovos-dashboard")]
#[command(about = "Enable, disable and report the OVOS web dashboard over the messagebus")]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "OVOS_DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Messagebus URL, overrides the [bus] section
    #[arg(long)]
    bus_url: Option<String>,

    /// Dashboard login username, overrides the config file
    #[arg(long)]
    username: Option<String>,

    /// Debug logging for this crate
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (silently ignore if not found)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Show our own logs, keep the websocket stack quiet unless RUST_LOG says otherwise
    let level = if args.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "ovos_dashboard={},tokio_tungstenite=warn,tungstenite=warn",
            level
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(username) = args.username {
        config.username = username;
        config.normalize()?;
    }
    let bus_url = args.bus_url.unwrap_or_else(|| config.bus.url());

    let plexus = build_plexus(&config).context("Failed to generate the dashboard session secret")?;

    tracing::info!("ovos-dashboard {}", env!("CARGO_PKG_VERSION"));
    for activation in plexus.list_activations() {
        tracing::info!(
            "  {} v{} - {}",
            activation.namespace,
            activation.version,
            activation.description
        );
        for method in &activation.methods {
            tracing::info!("    - {}.{}", activation.namespace, method);
        }
    }

    if plexus.requires_network_before_load() {
        tracing::info!("Waiting for network");
        if !network::wait_for_network(config.bus.network_wait(), Duration::from_secs(1)).await {
            tracing::warn!(
                "No network after {:?}, continuing anyway",
                config.bus.network_wait()
            );
        }
    }

    tracing::info!("Connecting to messagebus at {}", bus_url);
    let bus = tokio::select! {
        bus = WebsocketBus::connect(bus_url.clone(), config.bus.reconnect_interval()) => {
            bus.with_context(|| format!("Failed to connect to {}", bus_url))?
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted before the messagebus came up");
            return Ok(());
        }
    };
    let bus: Arc<dyn MessageBus> = Arc::new(bus);

    let serving = plexus.spawn(bus);
    tracing::info!("Dashboard plugin ready");

    tokio::select! {
        result = serving => {
            result.context("Plexus task failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
