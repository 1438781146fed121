//! Handshake node (hsd) client adapter.
//!
//! A thin wrapper over the node's JSON-RPC interface. The only call this
//! service needs is `getnameresource`, which returns the DNS-like resource
//! record set for a name. The client is constructed once at startup and
//! injected into request handling; it holds no per-request state.

use crate::config::HsdConfig;
use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// A single resource record returned by hsd.
///
/// Records carry many type-specific fields (ns, ds, glue, ...); only the
/// txt entries matter here, everything else is ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRecord {
    /// Record type tag, e.g. `TXT` or `GLUE4`.
    #[serde(rename = "type", default)]
    pub record_type: Option<String>,

    /// Text entries, present on TXT records.
    #[serde(default)]
    pub txt: Option<Vec<String>>,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    params: [&'a str; 1],
    id: u32,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<NameResource>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
}

#[derive(Deserialize)]
struct NameResource {
    #[serde(default)]
    records: Option<Vec<ResourceRecord>>,
}

/// JSON-RPC client for a single hsd node.
#[derive(Debug, Clone)]
pub struct HsdClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HsdClient {
    /// Creates a client for the configured node.
    pub fn new(config: &HsdConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| GatewayError::rpc(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
        })
    }

    /// Fetches the resource record set for a name.
    ///
    /// Returns `Ok(None)` when the name simply does not exist (null result
    /// or no `records` field); that is a normal outcome, not an error. Any
    /// transport failure or RPC-level error object becomes [`GatewayError::Rpc`].
    pub async fn get_name_resource(&self, name: &str) -> Result<Option<Vec<ResourceRecord>>> {
        let request = RpcRequest {
            method: "getnameresource",
            params: [name],
            id: 0,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth("x", Some(&self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::rpc(e.to_string()))?;

        let status = response.status();
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::rpc(format!("{} ({})", e, status)))?;

        if let Some(error) = body.error {
            return Err(GatewayError::rpc(error.message));
        }

        let records = body.result.and_then(|resource| resource.records);

        debug!(name = %name, records = ?records, "name resource fetched");

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserializes_txt() {
        let json = r#"{"type": "TXT", "txt": ["hello", "world"]}"#;
        let record: ResourceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.record_type.as_deref(), Some("TXT"));
        assert_eq!(record.txt.as_deref().unwrap(), &["hello", "world"]);
    }

    #[test]
    fn test_record_ignores_unknown_fields() {
        let json = r#"{"type": "GLUE4", "ns": "ns1.example.", "address": "127.0.0.1"}"#;
        let record: ResourceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.record_type.as_deref(), Some("GLUE4"));
        assert!(record.txt.is_none());
    }

    #[test]
    fn test_client_from_default_config() {
        let client = HsdClient::new(&HsdConfig::default()).unwrap();
        assert_eq!(client.endpoint, "http://localhost:12037/");
    }
}
