//! HTTP plumbing shared by the PuppetDB and Puppet CA clients
//!
//! Both services are usually reached over mutual TLS with certificates issued
//! by the Puppet CA, so client construction, TLS file checks and transport
//! error reporting live here.

use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Certificate, Client, Identity, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::config::UpstreamConfig;
use crate::utils::error::{AppError, AppResult};

const MAX_LOGGED_BODY: usize = 500;

/// Check if an SSL file exists and is readable, logging the result
fn check_ssl_file_access(service: &str, path: &Path, file_type: &str) -> Result<usize> {
    let metadata = fs::metadata(path).map_err(|e| {
        error!(
            "{} SSL ERROR: Cannot access {} file: {} - {}",
            service,
            file_type,
            path.display(),
            e
        );
        anyhow::anyhow!("{} {} file is not accessible: {}", service, file_type, path.display())
    })?;

    if !metadata.is_file() {
        error!(
            "{} SSL ERROR: {} path is not a file: {}",
            service,
            file_type,
            path.display()
        );
        anyhow::bail!("{} {} path is not a file: {}", service, file_type, path.display());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        debug!(
            "{} file permissions: mode={:o}, uid={}, gid={}, path={}",
            file_type,
            metadata.mode() & 0o777,
            metadata.uid(),
            metadata.gid(),
            path.display()
        );
    }

    match fs::read(path) {
        Ok(contents) => {
            info!(
                "{} SSL: {} loaded successfully ({} bytes): {}",
                service,
                file_type,
                contents.len(),
                path.display()
            );
            Ok(contents.len())
        }
        Err(e) => {
            error!(
                "{} SSL ERROR: {} file exists but cannot be read (permission denied?): {} - {}",
                service,
                file_type,
                path.display(),
                e
            );
            warn!(
                "Check that the openvox-view service user has read access to: {}",
                path.display()
            );
            Err(e).with_context(|| format!("Failed to read {} {}", service, file_type))
        }
    }
}

/// Build an HTTP client for one upstream service
pub fn build_client(service: &str, config: &UpstreamConfig) -> Result<Client> {
    info!("Initializing {} client for {}", service, config.url);

    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .use_rustls_tls();

    // CA bundle must be configured before the identity for rustls
    if let Some(ref ca_path) = config.ssl_ca {
        check_ssl_file_access(service, ca_path, "CA certificate")?;

        let ca_pem = fs::read(ca_path)
            .with_context(|| format!("Failed to read CA certificate: {:?}", ca_path))?;
        let certs = Certificate::from_pem_bundle(&ca_pem)
            .context("Failed to parse CA certificate(s) as PEM")?;

        info!(
            "{} SSL: Parsed {} certificate(s) from CA bundle",
            service,
            certs.len()
        );

        // Only trust the configured CA
        builder = builder.tls_certs_only(std::iter::empty());
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    match (&config.ssl_cert, &config.ssl_key) {
        (Some(cert_path), Some(key_path)) => {
            check_ssl_file_access(service, cert_path, "Client certificate")?;
            check_ssl_file_access(service, key_path, "Client private key")?;

            let mut pem_bundle = fs::read(cert_path)
                .with_context(|| format!("Failed to read client certificate: {:?}", cert_path))?;
            let key = fs::read(key_path)
                .with_context(|| format!("Failed to read client key: {:?}", key_path))?;
            pem_bundle.push(b'\n');
            pem_bundle.extend_from_slice(&key);

            let identity = Identity::from_pem(&pem_bundle)
                .context("Failed to create identity from certificate and key")?;
            builder = builder.identity(identity);
        }
        (None, None) => {}
        (cert, key) => {
            warn!(
                "{}: partial SSL configuration: cert={:?}, key={:?}. Both must be provided for client authentication.",
                service,
                cert.is_some(),
                key.is_some()
            );
        }
    }

    // Must come after the identity for rustls
    if !config.ssl_verify {
        warn!("{}: SSL certificate verification is DISABLED - this is insecure!", service);
        builder = builder.danger_accept_invalid_certs(true);
    }

    let client = builder.build().context("Failed to create HTTP client")?;
    info!("{} client initialized successfully for {}", service, config.url);
    Ok(client)
}

/// Log a failed request with hints and convert it into an upstream error
pub fn transport_error(service: &str, method: &str, url: &str, e: reqwest::Error) -> AppError {
    error!("{} ERROR: {} request to {} failed: {}", service, method, url, e);
    error!(
        "{} ERROR: Error flags - is_connect: {}, is_timeout: {}, is_request: {}",
        service,
        e.is_connect(),
        e.is_timeout(),
        e.is_request()
    );

    if e.is_connect() {
        error!("{} ERROR: Connection failed. Check:", service);
        error!("  - the configured URL is correct and reachable");
        error!("  - network/firewall allows the connection");
        error!("  - SSL certificates are valid and trusted");
    }
    if e.is_timeout() {
        error!("{} ERROR: Request timed out. Consider increasing timeout_secs", service);
    }

    if let Some(source) = e.source() {
        error!("{} ERROR: Underlying cause: {}", service, source);
        let mut current: &dyn StdError = source;
        while let Some(next) = current.source() {
            error!("{} ERROR: Caused by: {}", service, next);
            current = next;
        }

        let cause = source.to_string();
        if cause.contains("UnknownIssuer") {
            error!("{} SSL ERROR: Server certificate not trusted! Check ssl_ca", service);
        } else if cause.to_lowercase().contains("certificate") {
            error!("{} SSL ERROR: Certificate validation failed", service);
        }
    }

    AppError::Upstream(format!("{} request to {} failed: {}", service, url, e))
}

fn truncate(body: &str) -> String {
    if body.len() > MAX_LOGGED_BODY {
        let cut = (0..=MAX_LOGGED_BODY)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... (truncated)", &body[..cut])
    } else {
        body.to_string()
    }
}

/// Error for an unexpected response status, carrying the response body
pub async fn status_error(service: &str, response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    debug!("{} returned {}: {}", service, status, truncate(&body));
    if body.trim().is_empty() {
        AppError::Upstream(format!("{} returned unexpected status {}", service, status))
    } else {
        AppError::Upstream(format!(
            "{} returned unexpected status {}: {}",
            service,
            status,
            truncate(body.trim())
        ))
    }
}

/// Decode a successful JSON response, or fail with the upstream status
pub async fn read_json<T: DeserializeOwned>(service: &str, response: Response) -> AppResult<T> {
    if response.status() != StatusCode::OK {
        return Err(status_error(service, response).await);
    }

    let body = response
        .text()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to read {} response body: {}", service, e)))?;
    serde_json::from_str::<T>(&body).map_err(|e| {
        error!("{} ERROR: Failed to parse response JSON: {}", service, truncate(&body));
        AppError::Upstream(format!("Failed to parse {} response: {}", service, e))
    })
}

/// Accept the statuses mutations answer with, or fail with the upstream status
pub async fn expect_success(service: &str, response: Response) -> AppResult<()> {
    match response.status() {
        StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
        _ => Err(status_error(service, response).await),
    }
}
