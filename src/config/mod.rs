//! Configuration management
//!
//! This module provides YAML-based configuration management with support for:
//! - Environment variable overrides
//! - Multiple configuration file locations
//! - Default values for all settings
//! - Operator-defined views and predefined queries

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{PredefinedQuery, View};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub puppetdb: UpstreamConfig,
    /// Certificate management is disabled when absent
    #[serde(default)]
    pub puppet_ca: Option<PuppetCaConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Hours without a report after which a node is flagged unreported
    #[serde(default = "default_unreported_hours")]
    pub unreported_hours: u32,
    #[serde(default)]
    pub queries: Vec<PredefinedQuery>,
    #[serde(default)]
    pub views: Vec<View>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host", alias = "listen")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_unreported_hours() -> u32 {
    2
}

/// Connection settings of an upstream HTTP service
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_puppetdb_url")]
    pub url: String,
    /// Timeout in seconds (supports both timeout_secs and timeout field names)
    #[serde(default = "default_timeout", alias = "timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_ssl_verify")]
    pub ssl_verify: bool,
    /// Client certificate for mutual TLS
    #[serde(default)]
    pub ssl_cert: Option<PathBuf>,
    /// Private key of the client certificate
    #[serde(default)]
    pub ssl_key: Option<PathBuf>,
    /// CA bundle to trust instead of the system roots
    #[serde(default)]
    pub ssl_ca: Option<PathBuf>,
}

impl UpstreamConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout(),
            ssl_verify: default_ssl_verify(),
            ssl_cert: None,
            ssl_key: None,
            ssl_ca: None,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self::new(default_puppetdb_url())
    }
}

fn default_puppetdb_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_ssl_verify() -> bool {
    true
}

/// Puppet CA configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PuppetCaConfig {
    #[serde(flatten)]
    pub connection: UpstreamConfig,
    /// Deactivate the PuppetDB node after revoking or cleaning its certificate
    #[serde(default)]
    pub deactivate_nodes: bool,
    /// Refuse every certificate mutation
    #[serde(default)]
    pub read_only: bool,
}

impl PuppetCaConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            connection: UpstreamConfig::new(url),
            deactivate_nodes: false,
            read_only: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log output target (console or file)
    #[serde(default = "default_log_target")]
    pub target: LogTarget,
    /// Directory for log files (used when target is "file" or "both")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
    #[serde(default = "default_log_rotation")]
    pub daily_rotation: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: default_log_target(),
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            daily_rotation: default_log_rotation(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl LogFormat {
    fn from_env_value(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Log output target
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Log to console (stdout/stderr) - default for development
    #[default]
    Console,
    /// Log to file with optional rotation
    File,
    /// Log to both console and file
    Both,
}

impl LogTarget {
    fn from_env_value(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "file" => LogTarget::File,
            "both" => LogTarget::Both,
            _ => LogTarget::Console,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_target() -> LogTarget {
    LogTarget::Console
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/openvox-view")
}

fn default_log_prefix() -> String {
    "openvox-view".to_string()
}

fn default_log_rotation() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            puppetdb: UpstreamConfig::default(),
            puppet_ca: None,
            logging: LoggingConfig::default(),
            unreported_hours: default_unreported_hours(),
            queries: Vec::new(),
            views: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values
    /// 2. Configuration file (YAML)
    /// 3. Environment variables
    ///
    /// The file is `OPENVOX_VIEW_CONFIG` if set, else `cli_path`, else the
    /// first existing standard location.
    pub fn load(cli_path: Option<PathBuf>) -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("OPENVOX_VIEW_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or(cli_path)
            .or_else(Self::find_config_file);

        let mut config = match config_path {
            Some(ref path) if path.exists() => {
                eprintln!("[CONFIG] Loading configuration from: {:?}", path);
                Self::from_file(path)?
            }
            Some(ref path) => {
                eprintln!("[CONFIG] Config file not found: {:?}, using defaults", path);
                AppConfig::default()
            }
            None => {
                eprintln!("[CONFIG] No config file found, using defaults");
                AppConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration file without applying overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_norway::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            // Current directory
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            // System config directory
            PathBuf::from("/etc/openvox-view/config.yaml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("openvox-view/config.yaml"))
                .unwrap_or_default(),
        ];

        paths.into_iter().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(host) = var("OPENVOX_VIEW_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("OPENVOX_VIEW_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        // Logging overrides
        if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Some(format) = var("OPENVOX_VIEW_LOG_FORMAT") {
            self.logging.format = LogFormat::from_env_value(&format);
        }
        if let Some(target) = var("OPENVOX_VIEW_LOG_TARGET") {
            self.logging.target = LogTarget::from_env_value(&target);
        }
        if let Some(dir) = var("OPENVOX_VIEW_LOG_DIR") {
            self.logging.log_dir = PathBuf::from(dir);
        }

        // PuppetDB overrides
        if let Some(url) = var("PUPPETDB_URL") {
            self.puppetdb.url = url;
        }
        if let Some(cert) = var("PUPPETDB_SSL_CERT") {
            self.puppetdb.ssl_cert = Some(PathBuf::from(cert));
        }
        if let Some(key) = var("PUPPETDB_SSL_KEY") {
            self.puppetdb.ssl_key = Some(PathBuf::from(key));
        }
        if let Some(ca) = var("PUPPETDB_SSL_CA") {
            self.puppetdb.ssl_ca = Some(PathBuf::from(ca));
        }

        // Puppet CA overrides
        if let Some(url) = var("PUPPET_CA_URL") {
            let puppet_ca = self
                .puppet_ca
                .get_or_insert_with(|| PuppetCaConfig::new(url.clone()));
            puppet_ca.connection.url = url;
        }
        if let Some(ref mut puppet_ca) = self.puppet_ca {
            if let Some(cert) = var("PUPPET_CA_SSL_CERT") {
                puppet_ca.connection.ssl_cert = Some(PathBuf::from(cert));
            }
            if let Some(key) = var("PUPPET_CA_SSL_KEY") {
                puppet_ca.connection.ssl_key = Some(PathBuf::from(key));
            }
            if let Some(ca) = var("PUPPET_CA_SSL_CA") {
                puppet_ca.connection.ssl_ca = Some(PathBuf::from(ca));
            }
            if let Some(flag) = var("PUPPET_CA_DEACTIVATE_NODES") {
                puppet_ca.deactivate_nodes = parse_flag(&flag);
            }
            if let Some(flag) = var("PUPPET_CA_READ_ONLY") {
                puppet_ca.read_only = parse_flag(&flag);
            }
        }

        if let Some(hours) = var("UNREPORTED_HOURS").and_then(|h| h.parse().ok()) {
            self.unreported_hours = hours;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        validate_url("puppetdb.url", &self.puppetdb.url)?;
        if let Some(ref puppet_ca) = self.puppet_ca {
            validate_url("puppet_ca.url", &puppet_ca.connection.url)?;
        }

        let mut names = HashSet::new();
        for view in &self.views {
            if view.name.trim().is_empty() {
                anyhow::bail!("View names cannot be empty");
            }
            if !names.insert(view.name.as_str()) {
                anyhow::bail!("Duplicate view name: {}", view.name);
            }
            if let Some(column) = view.facts.iter().find(|f| f.fact.trim().is_empty()) {
                anyhow::bail!(
                    "View {} has a column without a fact path: {}",
                    view.name,
                    column.name
                );
            }
        }

        Ok(())
    }

    /// Look up a view by name
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|view| view.name == name)
    }
}

fn validate_url(key: &str, url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!("{} must start with http:// or https://, got {:?}", key, url);
    }
    Ok(())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
