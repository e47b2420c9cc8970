//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{ClientOverrides, ServerOverrides};

#[derive(Debug, Parser)]
#[command(name = "keyfwd", version, about = "Forward media keys to another machine over encrypted UDP")]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Shared secret; overrides the config file.
    #[arg(long, global = true, env = "KEYFWD_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Capture forwarded keys on this machine and send them to a server.
    Client {
        /// Server host name or IP address.
        #[arg(long)]
        host: Option<String>,
        /// Server UDP port.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Receive keys and replay them on this machine.
    Server {
        /// UDP port to listen on.
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    pub fn client_overrides(&self) -> ClientOverrides {
        match &self.command {
            Command::Client { host, port } => ClientOverrides {
                hostname: host.clone(),
                port: *port,
                secret: self.secret.clone(),
            },
            Command::Server { .. } => ClientOverrides::default(),
        }
    }

    pub fn server_overrides(&self) -> ServerOverrides {
        match &self.command {
            Command::Server { port } => ServerOverrides {
                port: *port,
                secret: self.secret.clone(),
            },
            Command::Client { .. } => ServerOverrides::default(),
        }
    }
}
