//! Gateway configuration.
//!
//! One YAML file with `server`, `hsd`, `content`, and `logging` sections.
//! CLI flags and environment variables are merged on top in `main`, and the
//! result is frozen for the lifetime of the process.

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address and port to listen on.
    pub listen: String,

    /// Upstream connection timeout in seconds.
    pub connect_timeout: u64,

    /// Upstream read timeout in seconds.
    pub read_timeout: u64,

    /// Upstream write timeout in seconds.
    pub write_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3100".to_string(),
            connect_timeout: 10,
            read_timeout: 30,
            write_timeout: 30,
        }
    }
}

/// Handshake node (hsd) configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HsdConfig {
    /// Network profile the node runs on (main, testnet, regtest, simnet).
    pub network: String,

    /// Node host.
    pub host: String,

    /// Node HTTP port.
    pub port: u16,

    /// Node API key, sent as the basic-auth password.
    pub api_key: String,

    /// RPC timeout in seconds.
    pub timeout: u64,
}

impl Default for HsdConfig {
    fn default() -> Self {
        Self {
            network: "regtest".to_string(),
            host: "localhost".to_string(),
            port: 12037,
            api_key: "foo".to_string(),
            timeout: 30,
        }
    }
}

impl HsdConfig {
    /// The HTTP endpoint the JSON-RPC calls are posted to.
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

/// Content portal upstream configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContentConfig {
    /// Portal host proxied requests are forwarded to.
    pub host: String,

    /// Portal port.
    pub port: u16,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

impl ContentConfig {
    /// The `host:port` authority used for the upstream Host header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log output format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable pretty format.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON format for structured logging.
    Json,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,

    /// Output destination: stdout, stderr, or file path.
    pub output: String,

    /// Log format.
    pub format: LogFormat,

    /// Include target (module path) in logs.
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "stdout".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,

    /// Handshake node configuration.
    pub hsd: HsdConfig,

    /// Content portal upstream.
    pub content: ContentConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Reads and validates a YAML config file.
    ///
    /// A missing file is reported as [`GatewayError::ConfigNotFound`] so
    /// callers can distinguish "no file here" from a broken one.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GatewayError::ConfigNotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that could never serve a request.
    pub fn validate(&self) -> Result<()> {
        fn require(ok: bool, what: &str) -> Result<()> {
            if ok {
                Ok(())
            } else {
                Err(GatewayError::invalid_config(what))
            }
        }

        require(!self.server.listen.is_empty(), "server.listen must not be empty")?;
        require(!self.hsd.host.is_empty(), "hsd.host must not be empty")?;
        require(self.hsd.port != 0, "hsd.port must not be 0")?;
        require(!self.hsd.api_key.is_empty(), "hsd.api_key must not be empty")?;
        require(!self.content.host.is_empty(), "content.host must not be empty")?;
        require(self.content.port != 0, "content.port must not be 0")?;

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(GatewayError::invalid_config(format!(
                "unknown log level {other:?}, expected trace/debug/info/warn/error"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.listen, "0.0.0.0:3100");
        assert_eq!(config.hsd.network, "regtest");
        assert_eq!(config.hsd.host, "localhost");
        assert_eq!(config.hsd.port, 12037);
        assert_eq!(config.hsd.api_key, "foo");
        assert_eq!(config.content.host, "localhost");
        assert_eq!(config.content.port, 8080);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_config() {
        let yaml = r#"
server:
  listen: "127.0.0.1:3200"
  connect_timeout: 5
hsd:
  network: "main"
  host: "hsd.internal"
  port: 12039
  api_key: "secret"
content:
  host: "portal.internal"
  port: 9980
logging:
  level: "debug"
  output: "stderr"
"#;
        let file = create_temp_config(yaml);
        let config = AppConfig::load(file.path()).unwrap();

        assert_eq!(config.server.listen, "127.0.0.1:3200");
        assert_eq!(config.server.connect_timeout, 5);
        assert_eq!(config.hsd.network, "main");
        assert_eq!(config.hsd.host, "hsd.internal");
        assert_eq!(config.hsd.port, 12039);
        assert_eq!(config.hsd.api_key, "secret");
        assert_eq!(config.content.host, "portal.internal");
        assert_eq!(config.content.port, 9980);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::load("/nonexistent/config.yaml");
        assert!(matches!(result, Err(GatewayError::ConfigNotFound(_))));
    }

    #[test]
    fn test_invalid_log_level() {
        let yaml = r#"
logging:
  level: "invalid"
"#;
        let file = create_temp_config(yaml);
        let result = AppConfig::load(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let yaml = r#"
hsd:
  api_key: ""
"#;
        let file = create_temp_config(yaml);
        let result = AppConfig::load(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_hsd_endpoint() {
        let config = HsdConfig::default();
        assert_eq!(config.endpoint(), "http://localhost:12037/");
    }

    #[test]
    fn test_content_authority() {
        let config = ContentConfig::default();
        assert_eq!(config.authority(), "localhost:8080");
    }
}
