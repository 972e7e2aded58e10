//! Certificate lifecycle management
//!
//! Sign, revoke and clean certificates through the Puppet CA, optionally
//! deactivating the matching PuppetDB node afterwards. The CA decides whether
//! a transition is allowed; the only local decision is which wire call a
//! clean needs, based on the state the CA reports.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::PuppetCaConfig;
use crate::models::{
    CertificateState, CertificateStatus, CertificateStatusQuery, CommandResponse,
};
use crate::services::aggregate::CertificateFilter;
use crate::services::puppet_ca::CertificateAuthority;
use crate::services::puppetdb::InventoryService;
use crate::utils::error::{AppError, AppResult};

/// Executes certificate operations against the CA
pub struct CertificateManager {
    ca: Arc<dyn CertificateAuthority>,
    inventory: Arc<dyn InventoryService>,
    deactivate_nodes: bool,
    read_only: bool,
}

impl CertificateManager {
    pub fn new(
        ca: Arc<dyn CertificateAuthority>,
        inventory: Arc<dyn InventoryService>,
        config: &PuppetCaConfig,
    ) -> Self {
        Self {
            ca,
            inventory,
            deactivate_nodes: config.deactivate_nodes,
            read_only: config.read_only,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Certificates matching the requested states and text filter
    ///
    /// Several states are fetched one call at a time in the requested order,
    /// so the combined list is not a consistent snapshot.
    pub async fn list(&self, query: &CertificateStatusQuery) -> AppResult<Vec<CertificateStatus>> {
        let mut certificates = match CertificateFilter::from_states(query.states.as_deref()) {
            CertificateFilter::All => self.ca.list_certificates(None).await?,
            CertificateFilter::States(states) => {
                let mut collected = Vec::new();
                for state in states {
                    collected.extend(self.ca.list_certificates(Some(state)).await?);
                }
                collected
            }
        };

        if let Some(ref filter) = query.filter {
            certificates.retain(|cert| cert.matches_filter(filter));
        }

        Ok(certificates)
    }

    /// Ask the CA to sign a pending request
    pub async fn sign(&self, name: &str) -> AppResult<()> {
        self.ensure_writable("sign", name)?;
        info!(audit = true, certname = %name, "CA signing certificate");

        self.ca
            .set_desired_state(name, CertificateState::Signed)
            .await
            .inspect_err(|e| error!(certname = %name, error = %e, "Error signing certificate"))
    }

    /// Revoke a certificate, then deactivate its node if configured
    pub async fn revoke(&self, name: &str) -> AppResult<()> {
        self.ensure_writable("revoke", name)?;
        info!(audit = true, certname = %name, "CA revoking certificate");

        self.ca
            .set_desired_state(name, CertificateState::Revoked)
            .await
            .inspect_err(|e| error!(certname = %name, error = %e, "Error revoking certificate"))?;

        self.cascade_deactivation("revoke", name).await
    }

    /// Remove a certificate from the CA, then deactivate its node if configured
    ///
    /// Signed certificates go through the combined revoke-and-clean call;
    /// requests and revoked certificates are deleted directly.
    pub async fn clean(&self, name: &str) -> AppResult<()> {
        self.ensure_writable("clean", name)?;
        info!(audit = true, certname = %name, "CA cleaning certificate");

        let status = self
            .ca
            .get_certificate(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("certificate {} not found", name)))?;

        let result = match status.state {
            CertificateState::Signed => self.ca.clean_certificate(name).await,
            CertificateState::Requested | CertificateState::Revoked => {
                self.ca.delete_certificate(name).await
            }
        };
        result.inspect_err(|e| error!(certname = %name, error = %e, "Error cleaning certificate"))?;

        self.cascade_deactivation("clean", name).await
    }

    /// Deactivate the PuppetDB node of a certificate
    pub async fn deactivate_node(&self, certname: &str) -> AppResult<CommandResponse> {
        info!(audit = true, certname = %certname, "Deactivating node");

        match self.inventory.deactivate_node(certname).await {
            Ok(response) => {
                info!(
                    certname = %certname,
                    uuid = %response.uuid,
                    "Deactivated node with command UUID"
                );
                Ok(response)
            }
            Err(e) => {
                error!(certname = %certname, error = %e, "Error deactivating node");
                Err(e)
            }
        }
    }

    async fn cascade_deactivation(&self, operation: &str, certname: &str) -> AppResult<()> {
        if !self.deactivate_nodes {
            return Ok(());
        }

        self.deactivate_node(certname).await.map(|_| ()).map_err(|e| {
            AppError::Upstream(format!(
                "certificate {} succeeded for {} but node deactivation failed: {}",
                operation, certname, e
            ))
        })
    }

    fn ensure_writable(&self, operation: &str, name: &str) -> AppResult<()> {
        if self.read_only {
            warn!(audit = true, certname = %name, operation, "Refused CA mutation in read-only mode");
            return Err(AppError::Forbidden(format!(
                "certificate authority is read-only, cannot {} {}",
                operation, name
            )));
        }
        Ok(())
    }
}
