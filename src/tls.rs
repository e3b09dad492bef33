//! TLS configuration for the historic-data client.
//!
//! Both configs trust the Mozilla root set shipped with `webpki-roots`.
//! The exchange's non-interactive login additionally requires a client
//! certificate, loaded from PEM files on disk.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::client::WantsClientCert;
use rustls::{ClientConfig, ConfigBuilder};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::Result;
use crate::error::OddsError;

fn root_store() -> rustls::RootCertStore {
    rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    }
}

/// Config builder on the `ring` provider with the Mozilla roots.
///
/// The provider is chosen explicitly: with the AWS SDK linked, rustls has
/// more than one provider compiled in and no process default.
fn builder() -> Result<ConfigBuilder<ClientConfig, WantsClientCert>> {
    let builder = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| OddsError::Tls(format!("unsupported protocol versions: {e}")))?;
    Ok(builder.with_root_certificates(root_store()))
}

/// Builds a [`ClientConfig`] without client authentication.
///
/// # Errors
///
/// Returns [`OddsError::Tls`] if the crypto provider rejects the default
/// protocol versions.
pub fn build_tls_config() -> Result<ClientConfig> {
    Ok(builder()?.with_no_client_auth())
}

/// Builds a [`ClientConfig`] presenting the certificate chain at
/// `cert_path` and the private key at `key_path`.
///
/// # Errors
///
/// Returns [`OddsError::Tls`] if either file cannot be read, holds no PEM
/// item of the expected kind, or the key does not match the certificate.
pub fn build_client_auth_config(cert_path: &Path, key_path: &Path) -> Result<ClientConfig> {
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    builder()?
        .with_client_auth_cert(certs, key)
        .map_err(|e| OddsError::Tls(format!("invalid client certificate: {e}")))
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| OddsError::Tls(format!("cannot open {}: {e}", path.display())))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let certs = rustls_pemfile::certs(&mut open(path)?)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| OddsError::Tls(format!("failed to parse {}: {e}", path.display())))?;

    if certs.is_empty() {
        return Err(OddsError::Tls(format!(
            "no certificate found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut open(path)?)
        .map_err(|e| OddsError::Tls(format!("failed to parse {}: {e}", path.display())))?
        .ok_or_else(|| OddsError::Tls(format!("no private key found in {}", path.display())))
}
