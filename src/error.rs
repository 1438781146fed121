//! Gateway error taxonomy.
//!
//! Every failure a request can hit lands in [`GatewayError`] and is turned
//! into an HTTP status plus message at the request boundary. Nothing is
//! retried; nothing crashes the process.

use thiserror::Error;

/// Result alias for fallible gateway operations.
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// All failure modes of the gateway.
///
/// The resolution variants carry the user-visible wording the content
/// portal ecosystem expects, so their `Display` output doubles as the
/// response body.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No config file exists at the given path.
    #[error("config file {0} does not exist")]
    ConfigNotFound(String),

    /// The config file exists but could not be read.
    #[error("config file unreadable: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// The config file is not valid YAML for [`crate::config::AppConfig`].
    #[error("malformed config file: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// A config value failed validation.
    #[error("bad config value: {0}")]
    ConfigInvalid(String),

    /// The naming system has no record set for the given name.
    #[error("No records found for {name}")]
    NameNotFound { name: String },

    /// The record set exists but contains no valid skylink.
    #[error("No skylink found in dns records of {name}")]
    SkylinkNotFound { name: String },

    /// The hsd node could not be reached or returned a protocol-level error.
    #[error("hsd rpc failed: {message}")]
    Rpc { message: String },

    /// A skylink failed validation before path computation. Fail closed.
    #[error("invalid skylink: {skylink}")]
    MalformedSkylink { skylink: String },
}

impl GatewayError {
    /// A config validation failure.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::ConfigInvalid(message.into())
    }

    /// An rpc transport or protocol failure.
    pub fn rpc(message: impl Into<String>) -> Self {
        Self::Rpc {
            message: message.into(),
        }
    }

    /// The HTTP status this error maps to at the request boundary.
    ///
    /// An absent name is the only client-visible not-found condition; every
    /// other resolution failure is a server error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NameNotFound { .. } => 404,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_messages_name_the_failed_lookup() {
        let absent = GatewayError::NameNotFound {
            name: "astrid".to_string(),
        };
        let no_skylink = GatewayError::SkylinkNotFound {
            name: "astrid".to_string(),
        };

        // Wire-visible wording; the response body is built from Display.
        assert_eq!(absent.to_string(), "No records found for astrid");
        assert_eq!(
            no_skylink.to_string(),
            "No skylink found in dns records of astrid"
        );
    }

    #[test]
    fn only_absent_names_map_to_not_found() {
        let absent = GatewayError::NameNotFound {
            name: "astrid".to_string(),
        };
        assert_eq!(absent.http_status(), 404);

        let server_errors = [
            GatewayError::SkylinkNotFound {
                name: "astrid".to_string(),
            },
            GatewayError::rpc("connection refused"),
            GatewayError::MalformedSkylink {
                skylink: "short".to_string(),
            },
            GatewayError::invalid_config("hsd.port must not be 0"),
        ];
        for err in server_errors {
            assert_eq!(err.http_status(), 500, "{err} should be a server error");
        }
    }

    #[test]
    fn io_failures_convert_into_config_read() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = GatewayError::from(io);
        assert!(matches!(err, GatewayError::ConfigRead(_)));
        assert!(err.to_string().contains("denied"));
    }
}
