//! CLI argument definitions for the Lectern server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use lectern_core::config::LecternConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "LECTERN_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "lectern.toml";

/// Lectern: question answering over course materials.
#[derive(Parser, Debug)]
#[command(name = "lectern", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Address to bind the API server to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Folder of course documents ingested at startup.
    #[arg(short = 'd', long = "docs-dir")]
    pub docs_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > LECTERN_CONFIG env var > ./lectern.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_with(std::env::var(CONFIG_ENV).ok())
    }

    fn resolve_config_path_with(&self, env_path: Option<String>) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        match env_path {
            Some(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    /// Level used to install the subscriber: --log-level, else the file's.
    pub fn log_level<'a>(&'a self, config: &'a LecternConfig) -> &'a str {
        self.log_level.as_deref().unwrap_or(&config.logging.level)
    }

    /// Overwrite config values with any flags given on the command line.
    pub fn apply_to(&self, config: &mut LecternConfig) {
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref dir) = self.docs_dir {
            config.documents.docs_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref level) = self.log_level {
            config.logging.level = level.clone();
        }
    }
}
