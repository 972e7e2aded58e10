//! Business logic services

pub mod aggregate;
pub mod certificates;
pub mod http_client;
pub mod puppet_ca;
pub mod puppetdb;
pub mod query;
pub mod query_history;
pub mod views;

pub use certificates::CertificateManager;
pub use puppet_ca::{CertificateAuthority, PuppetCaClient};
pub use puppetdb::{InventoryService, PuppetDbClient};
pub use query::{NodeOverviewFilter, PdbQuery, Predicate};
pub use query_history::QueryHistory;
