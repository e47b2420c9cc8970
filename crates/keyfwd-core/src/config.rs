//! Per-role configuration consumed by the relays.
//!
//! These are the inputs the relays need and nothing more; where they come from
//! (a TOML file, CLI flags, environment) is decided by the host binary.
//!
//! ```toml
//! [client]
//! hostname = "media-pc.local"
//! port = 5525
//! secret = "s3cr3t"
//! forwarded_keys = [173, 174, 175]   # optional, defaults to the media keys
//!
//! [server]
//! port = 5525
//! secret = "s3cr3t"
//! ```

use serde::Deserialize;

use crate::domain::keys::ForwardedKeySet;
use crate::domain::secret::SharedSecret;

/// Settings for the capturing side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Host name or IP address of the server.
    pub hostname: String,
    /// UDP port the server listens on.
    pub port: u16,
    pub secret: SharedSecret,
    /// Keys to relay.  Everything else stays local.
    #[serde(default)]
    pub forwarded_keys: ForwardedKeySet,
}

/// Settings for the injecting side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// UDP port to bind on all interfaces.
    pub port: u16,
    pub secret: SharedSecret,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keys::KeyCode;

    #[test]
    fn test_client_config_defaults_forwarded_keys_to_media_keys() {
        // Arrange
        let toml_str = r#"
            hostname = "media-pc"
            port = 5525
            secret = "s3cr3t"
        "#;

        // Act
        let cfg: ClientConfig = toml::from_str(toml_str).expect("parse");

        // Assert
        assert_eq!(cfg.hostname, "media-pc");
        assert_eq!(cfg.port, 5525);
        assert_eq!(cfg.secret, SharedSecret::from("s3cr3t"));
        assert_eq!(cfg.forwarded_keys, ForwardedKeySet::media_keys());
    }

    #[test]
    fn test_client_config_explicit_forwarded_keys() {
        let toml_str = r#"
            hostname = "10.0.0.2"
            port = 1
            secret = "x"
            forwarded_keys = [174]
        "#;

        let cfg: ClientConfig = toml::from_str(toml_str).expect("parse");

        assert_eq!(cfg.forwarded_keys, ForwardedKeySet::new([KeyCode(174)]));
    }

    #[test]
    fn test_server_config_requires_port() {
        let result: Result<ServerConfig, _> = toml::from_str(r#"secret = "x""#);

        assert!(result.is_err());
    }
}
