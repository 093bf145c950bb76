//! Server configuration.
//!
//! Command-line options win; anything not given on the command line falls
//! back to the environment variables the service has always been deployed
//! with (`PORT`, `REDIS_HOST`, `REDIS_PORT`, `LOG_LEVEL`), then to defaults.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8888;

/// Options as given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerOptions {
    /// Address to bind.
    pub host: Option<String>,
    /// Port to bind.
    pub port: Option<u16>,
    /// Full Redis connection URL.
    pub redis_url: Option<String>,
    /// Directory served under `/static`.
    pub static_dir: Option<String>,
    /// Keep everything in process memory instead of Redis.
    pub in_memory: bool,
    /// Log at debug level.
    pub verbose: bool,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Redis connection URL.
    pub redis_url: String,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
    /// Keep everything in process memory instead of Redis.
    pub in_memory: bool,
    /// `tracing_subscriber` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

/// Errors found while resolving configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable that must be a port number is not one.
    InvalidPort {
        /// The variable name.
        var: &'static str,
        /// The offending value.
        value: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConfigError::InvalidPort { var, value } => {
                write!(f, "{} must be a port number, got {:?}", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn env_port(
    env: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u16,
) -> Result<u16, ConfigError> {
    match env(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort { var, value }),
        None => Ok(default),
    }
}

/// Translates a `LOG_LEVEL` value (`DEBUG`, `INFO`, `WARNING`, ...) into a filter directive.
fn log_level_filter(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        "" => "info".to_string(),
        other => other.to_string(),
    }
}

impl ServerConfig {
    /// Resolves `options` against the process environment.
    pub fn from_env(options: ServerOptions) -> Result<Self, ConfigError> {
        Self::resolve(options, |var| std::env::var(var).ok())
    }

    /// Resolves `options` against an arbitrary environment lookup.
    pub fn resolve(
        options: ServerOptions,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let host = options
            .host
            .or_else(|| env("HOST"))
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match options.port {
            Some(port) => port,
            None => env_port(&env, "PORT", DEFAULT_PORT)?,
        };
        let redis_url = match options.redis_url {
            Some(url) => url,
            None => {
                let redis_host = env("REDIS_HOST").unwrap_or_else(|| "localhost".to_string());
                let redis_port = env_port(&env, "REDIS_PORT", 6379)?;
                format!("redis://{}:{}/0", redis_host, redis_port)
            }
        };
        let static_dir = options
            .static_dir
            .or_else(|| env("STATIC_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("static"));
        let log_filter = if options.verbose {
            "debug".to_string()
        } else {
            log_level_filter(&env("LOG_LEVEL").unwrap_or_default())
        };
        Ok(Self {
            host,
            port,
            redis_url,
            static_dir,
            in_memory: options.in_memory,
            log_filter,
        })
    }

    /// `host:port` to bind the listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
