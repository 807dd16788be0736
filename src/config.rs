//! # Server Configuration
//! src/config.rs
//!
//! Settings come from three layers, weakest first: built-in defaults,
//! CLI arguments / environment variables, and an optional JSON file.
//! A key present in the file wins over the other two.
//!
//! ## Examples
//!
//! ### CLI
//! ```bash
//! ./tippy --host 0.0.0.0 --port 8080 --workers 4 --public-dir ./www
//! ```
//!
//! ### Environment
//! ```bash
//! TIPPY_PORT=8080 TIPPY_LOG=debug ./tippy
//! ```
//!
//! ### JSON file
//! ```json
//! { "port": 8080, "backlog": 16, "aliases": [["/index.html", "/", "/home"]] }
//! ```

use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8085;
pub const DEFAULT_BACKLOG: usize = 5;
pub const DEFAULT_WORKERS: usize = 2;
pub const DEFAULT_PUBLIC_DIR: &str = "./public";
pub const DEFAULT_SERVER_NAME: &str = "Tippy/v0.5";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Tippy server configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "tippy")]
#[command(about = "Small HTTP/1.1 server for static files")]
#[command(version)]
pub struct Config {
    /// Host name or IP to listen on
    #[arg(long, default_value = DEFAULT_HOST, env = "TIPPY_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TIPPY_PORT")]
    pub port: u16,

    /// Connections that may wait for a free worker
    #[arg(short, long, default_value_t = DEFAULT_BACKLOG, env = "TIPPY_BACKLOG")]
    pub backlog: usize,

    /// Number of worker threads
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, env = "TIPPY_WORKERS")]
    pub workers: usize,

    /// Directory served as the site root
    #[arg(long = "public-dir", default_value = DEFAULT_PUBLIC_DIR, env = "TIPPY_PUBLIC_DIR")]
    pub public_dir: PathBuf,

    /// Product token sent in the `Server` header
    #[arg(long = "server-name", default_value = DEFAULT_SERVER_NAME, env = "TIPPY_SERVER_NAME")]
    pub server_name: String,

    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "info", env = "TIPPY_LOG")]
    pub log_level: tracing::Level,

    /// JSON file overriding the settings above
    #[arg(short, long, env = "TIPPY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Alias groups, `[primary, alias...]`; only settable from the file
    #[arg(skip = default_aliases())]
    pub aliases: Vec<Vec<String>>,
}

/// Keys accepted in the JSON config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backlog: Option<usize>,
    pub workers: Option<usize>,
    pub public_dir: Option<PathBuf>,
    pub server_name: Option<String>,
    pub aliases: Option<Vec<Vec<String>>>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn default_aliases() -> Vec<Vec<String>> {
    vec![vec!["/index.html".to_string(), "/".to_string()]]
}

impl Config {
    /// Parses CLI/env, then applies the config file (if any) and validates
    ///
    /// Exits the process on invalid CLI arguments, like any clap binary.
    pub fn load() -> Result<Self, ConfigError> {
        Config::parse().resolve()
    }

    /// Applies the config file named by `--config`, then validates
    pub fn resolve(mut self) -> Result<Self, ConfigError> {
        if let Some(path) = self.config.clone() {
            self.apply(FileConfig::from_path(&path)?);
        }

        self.validate()?;
        Ok(self)
    }

    /// Overrides every field the file sets
    pub fn apply(&mut self, file: FileConfig) {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(backlog) = file.backlog {
            self.backlog = backlog;
        }
        if let Some(workers) = file.workers {
            self.workers = workers;
        }
        if let Some(public_dir) = file.public_dir {
            self.public_dir = public_dir;
        }
        if let Some(server_name) = file.server_name {
            self.server_name = server_name;
        }
        if let Some(aliases) = file.aliases {
            self.aliases = aliases;
        }
    }

    /// Address to bind (`host:port`)
    ///
    /// # Example
    /// ```rust
    /// use tippy::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "localhost:8085");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }

        if self.backlog < 1 {
            return Err(ConfigError::Invalid("backlog must be >= 1".to_string()));
        }

        if self.workers < 1 {
            return Err(ConfigError::Invalid("workers must be >= 1".to_string()));
        }

        if let Some(group) = self
            .aliases
            .iter()
            .find(|group| group.is_empty() || group.iter().any(|path| !path.starts_with('/')))
        {
            return Err(ConfigError::Invalid(format!(
                "alias group {:?} must list paths starting with '/'",
                group
            )));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            workers: DEFAULT_WORKERS,
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            log_level: tracing::Level::INFO,
            config: None,
            aliases: default_aliases(),
        }
    }
}
