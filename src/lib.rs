//! # HNS Gateway Library
//!
//! This crate provides a Handshake (HNS) name resolver and reverse proxy for
//! Skynet content. A request for `/hns/:name/*` looks the name up on an hsd
//! node, extracts the skylink from its TXT records, and transparently
//! proxies the request to the content portal behind that skylink.
//! `/hnsres/:name` exposes the resolved skylink as JSON. It's built on the
//! Pingora framework.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Error types and handling
//! - [`hsd`]: Handshake node (hsd) JSON-RPC client
//! - [`logging`]: Logging setup and configuration
//! - [`proxy`]: The main Pingora-based gateway implementation
//! - [`resolver`]: Skylink matching and path resolution logic
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hns_gateway::config::AppConfig;
//! use hns_gateway::hsd::HsdClient;
//! use hns_gateway::proxy::HnsGatewayService;
//!
//! let config = Arc::new(AppConfig::load("config.yaml")?);
//! let hsd = HsdClient::new(&config.hsd)?;
//! let service = HnsGatewayService::new(config, hsd);
//! ```
//!
//! ## Resolution flow
//!
//! 1. **Record fetch**: `getnameresource` RPC against the configured hsd node
//! 2. **Skylink match**: first record whose TXT entries hold a valid skylink
//! 3. **Path computation**: bare 46-character skylinks join literally with
//!    the request sub-path, longer ones resolve with standard URL semantics

pub mod config;
pub mod error;
pub mod hsd;
pub mod logging;
pub mod proxy;
pub mod resolver;

pub use config::AppConfig;
pub use error::{GatewayError, Result};
pub use hsd::{HsdClient, ResourceRecord};
pub use proxy::HnsGatewayService;
