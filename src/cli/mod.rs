//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::RelayConfig;
use crate::dispatch::Priority;

#[derive(Parser)]
#[command(name = "rcon-relay", about = "Send commands to an RCON server", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a command and print the server's response.
    Exec {
        /// The command to send; multiple words are joined with spaces.
        #[arg(required = true)]
        command: Vec<String>,

        /// Priority for the send.
        #[arg(long, value_enum, default_value = "normal")]
        priority: PriorityArg,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Check that the server is reachable and the password is accepted.
    Ping {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

/// Connection settings shared by all subcommands. Flags override the config
/// file, which overrides the built-in defaults.
#[derive(Args)]
pub struct ConnectionArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// RCON server host.
    #[arg(long)]
    pub host: Option<String>,

    /// RCON server port.
    #[arg(long)]
    pub port: Option<u16>,

    /// RCON password.
    #[arg(long)]
    pub password: Option<String>,
}

impl ConnectionArgs {
    pub fn resolve(&self) -> Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::load(path)?,
            None => RelayConfig::default(),
        };
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum PriorityArg {
    Low,
    #[default]
    Normal,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Normal => Priority::Normal,
            PriorityArg::High => Priority::High,
        }
    }
}
