//! OpenVox View Library
//!
//! Backend of the OpenVox View dashboard: a JSON API over PuppetDB/OpenVoxDB
//! and the Puppet CA.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
use services::{
    CertificateAuthority, CertificateManager, InventoryService, PuppetCaClient, PuppetDbClient,
    QueryHistory,
};

/// Version string including the commit the binary was built from
pub fn version() -> String {
    format!("{} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_COMMIT"))
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PuppetDB client
    pub puppetdb: Arc<dyn InventoryService>,
    /// Certificate management (absent when no Puppet CA is configured)
    pub certificates: Option<Arc<CertificateManager>>,
    /// Ad-hoc query history
    pub query_history: Arc<QueryHistory>,
}

impl AppState {
    /// Assemble the state from already constructed upstream clients
    pub fn new(
        config: AppConfig,
        puppetdb: Arc<dyn InventoryService>,
        puppet_ca: Option<Arc<dyn CertificateAuthority>>,
    ) -> Self {
        let certificates = match (puppet_ca, config.puppet_ca.as_ref()) {
            (Some(ca), Some(ca_config)) => Some(Arc::new(CertificateManager::new(
                ca,
                puppetdb.clone(),
                ca_config,
            ))),
            _ => None,
        };

        Self {
            config: Arc::new(config),
            puppetdb,
            certificates,
            query_history: Arc::new(QueryHistory::new()),
        }
    }

    /// Connect the configured upstream services
    pub fn from_config(config: AppConfig) -> Result<Self> {
        info!("Initializing PuppetDB client: {}", config.puppetdb.url);
        let puppetdb: Arc<dyn InventoryService> = Arc::new(
            PuppetDbClient::new(&config.puppetdb).context("Failed to initialize PuppetDB client")?,
        );

        let puppet_ca: Option<Arc<dyn CertificateAuthority>> = match config.puppet_ca {
            Some(ref ca_config) => {
                info!("Initializing Puppet CA client: {}", ca_config.connection.url);
                Some(Arc::new(
                    PuppetCaClient::new(&ca_config.connection)
                        .context("Failed to initialize Puppet CA client")?,
                ))
            }
            None => {
                info!("Puppet CA not configured, certificate management disabled");
                None
            }
        };

        Ok(Self::new(config, puppetdb, puppet_ca))
    }
}
