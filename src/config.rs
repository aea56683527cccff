//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Port value that disables the HTTP listener entirely.
pub const DISABLED_PORT: u16 = 0;

// == Cache Config ==
/// Construction parameters for the cache store. Not tunable at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Number of frequency counters to track (roughly 10x the expected key count)
    pub num_counters: u64,
    /// Maximum aggregate cost of all entries
    pub max_cost: u64,
    /// Number of reads buffered before they are applied to the frequency sketch
    pub buffer_items: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            num_counters: 10_000_000,
            max_cost: 1 << 30,
            buffer_items: 64,
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// Loaded once at startup and shared read-only. All values can be configured
/// via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// HTTP port, `0` disables the listener
    pub port: u16,
    /// Instance name reported in logs
    pub hostname: String,
    /// Timeout for outbound calls made by data sources
    pub http_client_timeout: Duration,
    /// Per-request timeout
    pub http_server_timeout: Duration,
    /// Deadline for draining in-flight requests on shutdown
    pub http_server_shutdown_timeout: Duration,
    /// Delay before draining so load balancers can deregister the instance
    pub shutdown_grace: Duration,
    /// Serve cleartext HTTP/2 alongside HTTP/1.1
    pub h2c: bool,
    /// Inject random error responses
    pub random_error: bool,
    /// Log level name; `debug` skips the shutdown grace delay
    pub log_level: String,
    /// Cache construction parameters
    pub cache: CacheConfig,
    /// Rotation interval, also used as the retry delay when a rotation fails
    pub rotation_interval: Duration,
    /// JSON file to load repository data from instead of the built-in snapshot
    pub data_file: Option<PathBuf>,
}

impl ServerConfig {
    /// Creates a new ServerConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `HOST` - Bind interface (default: 0.0.0.0)
    /// - `PORT` - HTTP port, 0 disables the listener (default: 9898)
    /// - `HOSTNAME` - Instance name (default: localhost)
    /// - `HTTP_CLIENT_TIMEOUT` - Seconds (default: 120)
    /// - `HTTP_SERVER_TIMEOUT` - Seconds (default: 30)
    /// - `HTTP_SERVER_SHUTDOWN_TIMEOUT` - Seconds (default: 5)
    /// - `SHUTDOWN_GRACE` - Seconds (default: 3)
    /// - `H2C` - true/false (default: false)
    /// - `RANDOM_ERROR` - true/false (default: false)
    /// - `LOG_LEVEL` - (default: info)
    /// - `CACHE_NUM_COUNTERS`, `CACHE_MAX_COST`, `CACHE_BUFFER_ITEMS`
    /// - `CACHE_ROTATION_INTERVAL` - Seconds (default: 600)
    /// - `QUALITY_DATA_FILE` - Optional path
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cache_defaults = CacheConfig::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_env("PORT").unwrap_or(defaults.port),
            hostname: env::var("HOSTNAME").unwrap_or(defaults.hostname),
            http_client_timeout: secs_env("HTTP_CLIENT_TIMEOUT")
                .unwrap_or(defaults.http_client_timeout),
            http_server_timeout: secs_env("HTTP_SERVER_TIMEOUT")
                .unwrap_or(defaults.http_server_timeout),
            http_server_shutdown_timeout: secs_env("HTTP_SERVER_SHUTDOWN_TIMEOUT")
                .unwrap_or(defaults.http_server_shutdown_timeout),
            shutdown_grace: secs_env("SHUTDOWN_GRACE").unwrap_or(defaults.shutdown_grace),
            h2c: parse_env("H2C").unwrap_or(defaults.h2c),
            random_error: parse_env("RANDOM_ERROR").unwrap_or(defaults.random_error),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            cache: CacheConfig {
                num_counters: parse_env("CACHE_NUM_COUNTERS")
                    .unwrap_or(cache_defaults.num_counters),
                max_cost: parse_env("CACHE_MAX_COST").unwrap_or(cache_defaults.max_cost),
                buffer_items: parse_env("CACHE_BUFFER_ITEMS")
                    .unwrap_or(cache_defaults.buffer_items),
            },
            rotation_interval: secs_env("CACHE_ROTATION_INTERVAL")
                .unwrap_or(defaults.rotation_interval),
            data_file: env::var("QUALITY_DATA_FILE").ok().map(PathBuf::from),
        }
    }

    /// Returns true when the configured port means "do not listen".
    pub fn listener_disabled(&self) -> bool {
        self.port == DISABLED_PORT
    }

    /// Returns true when running at debug verbosity.
    pub fn is_debug(&self) -> bool {
        self.log_level.eq_ignore_ascii_case("debug")
    }

    /// Listener address in `host:port` form.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9898,
            hostname: "localhost".to_string(),
            http_client_timeout: Duration::from_secs(120),
            http_server_timeout: Duration::from_secs(30),
            http_server_shutdown_timeout: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(3),
            h2c: false,
            random_error: false,
            log_level: "info".to_string(),
            cache: CacheConfig::default(),
            rotation_interval: Duration::from_secs(600),
            data_file: None,
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn secs_env(name: &str) -> Option<Duration> {
    parse_env::<u64>(name).map(Duration::from_secs)
}
