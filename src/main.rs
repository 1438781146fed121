//! # HNS Gateway
//!
//! A Handshake name resolver and reverse proxy for Skynet content.
//!
//! ## Features
//!
//! - **Name resolution**: Look up HNS names on an hsd node over JSON-RPC
//! - **Transparent proxying**: Forward `/hns/:name/*` to the content portal
//!   behind the resolved skylink
//! - **Redirect rewriting**: Keep redirect-following routed through the proxy
//! - **Direct lookups**: `/hnsres/:name` returns the skylink as JSON
//! - **Flexible logging**: Configurable log levels and output destinations
//!
//! ## Usage
//!
//! ```bash
//! # Run with default config path
//! hns-gateway
//!
//! # Run with custom config
//! hns-gateway -c /path/to/config.yaml
//!
//! # Point at a different hsd node
//! HSD_HOST=10.0.0.5 HSD_API_KEY=secret hns-gateway
//!
//! # Increase verbosity
//! hns-gateway -vvvv  # trace level
//! ```
//!
//! ## Configuration
//!
//! See `config.yaml` for all available options.

use clap::Parser;
use hns_gateway::config::AppConfig;
use hns_gateway::error::GatewayError;
use hns_gateway::hsd::HsdClient;
use hns_gateway::logging;
use hns_gateway::proxy::HnsGatewayService;
use pingora_core::server::Server;
use pingora_proxy::http_proxy_service;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// A Handshake name resolver and reverse proxy for Skynet content.
#[derive(Parser, Debug)]
#[command(name = "hns-gateway")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Network profile the hsd node runs on (overrides config)
    #[arg(long, env = "HSD_NETWORK")]
    hsd_network: Option<String>,

    /// hsd node host (overrides config)
    #[arg(long, env = "HSD_HOST")]
    hsd_host: Option<String>,

    /// hsd node HTTP port (overrides config)
    #[arg(long, env = "HSD_PORT")]
    hsd_port: Option<u16>,

    /// hsd API key (overrides config)
    #[arg(long, env = "HSD_API_KEY")]
    hsd_api_key: Option<String>,

    /// Content portal host (overrides config)
    #[arg(long, env = "CONTENT_HOST")]
    content_host: Option<String>,

    /// Content portal port (overrides config)
    #[arg(long, env = "CONTENT_PORT")]
    content_port: Option<u16>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace, -vvvv trace+deps)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Converts verbosity count to log level string
    fn log_level(&self) -> Option<String> {
        if self.quiet {
            return Some("error".to_string());
        }
        match self.verbose {
            0 => None, // Use config default
            1 => Some("info".to_string()),
            2 => Some("debug".to_string()),
            _ => Some("trace".to_string()), // 4+ includes dependency tracing
        }
    }

    /// Whether to include verbose dependency logging
    fn trace_deps(&self) -> bool {
        self.verbose >= 4
    }

    /// Applies CLI/environment overrides onto the loaded configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(ref listen) = self.listen {
            config.server.listen = listen.clone();
        }
        if let Some(ref network) = self.hsd_network {
            config.hsd.network = network.clone();
        }
        if let Some(ref host) = self.hsd_host {
            config.hsd.host = host.clone();
        }
        if let Some(port) = self.hsd_port {
            config.hsd.port = port;
        }
        if let Some(ref api_key) = self.hsd_api_key {
            config.hsd.api_key = api_key.clone();
        }
        if let Some(ref host) = self.content_host {
            config.content.host = host.clone();
        }
        if let Some(port) = self.content_port {
            config.content.port = port;
        }
    }
}

/// Application entry point.
fn main() {
    let args = Args::parse();

    let mut config = load_config(&args);
    args.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let _log_guard =
        match logging::init_logging(&config.logging, args.log_level(), args.trace_deps()) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Failed to initialize logging: {}", e);
                std::process::exit(1);
            }
        };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen,
        "Starting hns-gateway"
    );
    info!(
        host = %config.hsd.host,
        port = config.hsd.port,
        network = %config.hsd.network,
        "Looking for hsd node"
    );
    info!(
        portal = %config.content.authority(),
        "Forwarding resolved names to content portal"
    );

    let config = Arc::new(config);

    let hsd = match HsdClient::new(&config.hsd) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build hsd client");
            std::process::exit(1);
        }
    };

    let service = HnsGatewayService::new(config.clone(), hsd);

    let mut server = match Server::new(None) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Failed to create server");
            std::process::exit(1);
        }
    };
    server.bootstrap();

    let mut gateway = http_proxy_service(&server.configuration, service);
    gateway.add_tcp(&config.server.listen);
    server.add_service(gateway);

    server.run_forever();
}

/// Loads the first usable config file, falling back to built-in defaults.
///
/// An explicit `--config` path is the only candidate when given; otherwise
/// the conventional locations are tried in order. A candidate that exists
/// but fails to load is reported and ignored rather than aborting startup.
fn load_config(args: &Args) -> AppConfig {
    let candidates: Vec<PathBuf> = match &args.config {
        Some(path) => vec![path.clone()],
        None => ["config.yaml", "config.yml", "/etc/hns-gateway/config.yaml"]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
    };

    for path in &candidates {
        match AppConfig::load(path) {
            Ok(config) => return config,
            Err(GatewayError::ConfigNotFound(_)) if args.config.is_none() => continue,
            Err(e) => {
                eprintln!("Warning: ignoring config {}: {}", path.display(), e);
                break;
            }
        }
    }

    AppConfig::default()
}
