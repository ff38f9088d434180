//! Command-line arguments for the `ivy-chat` server.
//!
//! Priority: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::Parser;

use ivy_chat_client::Config;

/// Ivy chat: a web page for asking questions of a QA service and
/// reviewing the answers.
#[derive(Parser, Debug, Default)]
#[command(name = "ivy-chat", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Port to bind.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// SQLite file for chat history and logins.
    #[arg(short = 's', long = "store", conflicts_with = "memory")]
    pub store: Option<PathBuf>,

    /// Keep everything in memory; nothing survives a restart.
    #[arg(long = "memory")]
    pub memory: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Config file to read: --config, then `IVY_CHAT_CONFIG`, then the default.
    pub fn resolve_config_path(&self) -> Option<PathBuf> {
        ivy_chat_client::config::resolve_config_path(self.config.as_deref())
    }

    pub fn resolve_host(&self, cfg: &Config) -> String {
        self.host.clone().unwrap_or_else(|| cfg.host())
    }

    pub fn resolve_port(&self, cfg: &Config) -> u16 {
        self.port.unwrap_or_else(|| cfg.port())
    }

    /// SQLite path, or `None` for the in-memory store.
    pub fn resolve_store(&self, cfg: &Config) -> Option<PathBuf> {
        if self.memory {
            return None;
        }
        self.store.clone().or_else(|| cfg.store_path())
    }

    /// `EnvFilter` directive: --log-level, then `RUST_LOG`, then `info`.
    pub fn log_filter(&self) -> String {
        self.log_level
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| "info".to_string())
    }
}
