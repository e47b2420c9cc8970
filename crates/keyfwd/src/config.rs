//! TOML configuration for the `keyfwd` host process.
//!
//! One file can describe both roles; the subcommand picks which section is
//! used.  Default location:
//! - Windows:  `%APPDATA%\keyfwd\config.toml`
//! - Unix:     `$XDG_CONFIG_HOME/keyfwd/config.toml`, else `~/.config/keyfwd/config.toml`
//!
//! ```toml
//! log_level = "info"
//!
//! [client]
//! hostname = "media-pc.local"
//! port = 5525
//! secret = "s3cr3t"
//! forwarded_keys = [173, 174, 175, 176, 177, 178, 179, 250, 19]
//!
//! [server]
//! port = 5525
//! secret = "s3cr3t"
//! ```
//!
//! Command-line flags and `KEYFWD_SECRET` override file values.  When the
//! flags alone supply every required field, the section may be absent.

use std::path::{Path, PathBuf};

use keyfwd_core::{ClientConfig, ForwardedKeySet, ServerConfig, SharedSecret};
use serde::Deserialize;
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The role's section is absent and the flags do not fill the gap.
    #[error("no [{section}] section in config and no `--{field}` given")]
    MissingSetting {
        section: &'static str,
        field: &'static str,
    },
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub client: Option<ClientConfig>,
    pub server: Option<ServerConfig>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            client: None,
            server: None,
        }
    }
}

/// Client settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ClientOverrides {
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub secret: Option<String>,
}

/// Server settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ServerOverrides {
    pub port: Option<u16>,
    pub secret: Option<String>,
}

impl AppConfig {
    /// Builds the client configuration, applying `overrides` on top of the
    /// `[client]` section.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingSetting`] if a required field is in neither place.
    pub fn client(&self, overrides: ClientOverrides) -> Result<ClientConfig, ConfigError> {
        let missing = |field| ConfigError::MissingSetting {
            section: "client",
            field,
        };
        let base = self.client.as_ref();

        let hostname = overrides
            .hostname
            .or_else(|| base.map(|c| c.hostname.clone()))
            .ok_or_else(|| missing("host"))?;
        let port = overrides
            .port
            .or_else(|| base.map(|c| c.port))
            .ok_or_else(|| missing("port"))?;
        let secret = overrides
            .secret
            .map(SharedSecret::from)
            .or_else(|| base.map(|c| c.secret.clone()))
            .ok_or_else(|| missing("secret"))?;
        let forwarded_keys = base
            .map(|c| c.forwarded_keys.clone())
            .unwrap_or_else(ForwardedKeySet::media_keys);

        Ok(ClientConfig {
            hostname,
            port,
            secret,
            forwarded_keys,
        })
    }

    /// Builds the server configuration, applying `overrides` on top of the
    /// `[server]` section.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingSetting`] if a required field is in neither place.
    pub fn server(&self, overrides: ServerOverrides) -> Result<ServerConfig, ConfigError> {
        let missing = |field| ConfigError::MissingSetting {
            section: "server",
            field,
        };
        let base = self.server.as_ref();

        let port = overrides
            .port
            .or_else(|| base.map(|c| c.port))
            .ok_or_else(|| missing("port"))?;
        let secret = overrides
            .secret
            .map(SharedSecret::from)
            .or_else(|| base.map(|c| c.secret.clone()))
            .ok_or_else(|| missing("secret"))?;

        Ok(ServerConfig { port, secret })
    }
}

/// Resolves the default config file path.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the configuration.
///
/// An explicit `path` must exist.  Without one, the default location is used
/// and a missing file yields [`AppConfig::default()`].
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path()?, false),
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("keyfwd"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keyfwd"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
