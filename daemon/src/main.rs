//! Ember daemon — entry point for running an Ember node.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use ember_node::{init_logging, EmberNode, LogFormat, NodeConfig};

#[derive(Parser)]
#[command(name = "ember-daemon", about = "Ember cryptocurrency node daemon")]
struct Cli {
    /// Port for the combined HTTP + peer-WebSocket server.
    #[arg(long, env = "EMBER_PORT")]
    port: Option<u16>,

    /// Data directory holding the wallet key file.
    #[arg(long, env = "EMBER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Peer WebSocket URLs to connect to on startup
    /// (comma-separated: "ws://1.2.3.4:3000/peer,ws://5.6.7.8:3000/peer").
    #[arg(long, env = "EMBER_PEERS", value_delimiter = ',')]
    peers: Vec<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "EMBER_LOG_LEVEL")]
    log_level: String,

    /// Log format: "human" or "json".
    #[arg(long, default_value = "human", env = "EMBER_LOG_FORMAT")]
    log_format: String,

    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(LogFormat::parse(&cli.log_format), &cli.log_level);

    let file_config: Option<NodeConfig> = if let Some(ref config_path) = cli.config {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str::<NodeConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("loaded config from {}", config_path.display());
                    Some(cfg)
                }
                Err(e) => {
                    tracing::warn!("failed to parse config file: {e}, using CLI defaults");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(
                    "failed to read config file {}: {e}, using CLI defaults",
                    config_path.display()
                );
                None
            }
        }
    } else {
        None
    };

    let base = file_config.unwrap_or_default();
    let config = NodeConfig {
        port: cli.port.unwrap_or(base.port),
        data_dir: cli.data_dir.unwrap_or(base.data_dir),
        bootstrap_peers: if cli.peers.is_empty() {
            base.bootstrap_peers
        } else {
            cli.peers
        },
        log_level: cli.log_level,
        log_format: cli.log_format,
        ..base
    };

    tracing::info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        "starting Ember node"
    );

    let node = Arc::new(
        EmberNode::new(config.clone())
            .map_err(|e| anyhow::anyhow!("cannot start without a wallet identity: {e}"))?,
    );

    for peer in &config.bootstrap_peers {
        if let Err(e) = node.connect_to_peer(peer).await {
            tracing::warn!(peer = %peer, error = %e, "bootstrap connection failed");
        }
    }

    // One server carries both the REST surface and the /peer WebSocket
    // endpoint, as peers and wallets share the node's single port.
    let app = ember_rpc::router(Arc::clone(&node)).merge(ember_node::peer_router(node.engine()));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("listening on {addr} (HTTP + /peer WebSocket)");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
