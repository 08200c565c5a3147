//! TLS acceptor construction from PEM material.

use std::sync::Arc;

use rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::config::TlsMaterial;
use crate::server::FrontDoorError;

/// Parse PEM material and build a TLS acceptor.
///
/// All parsing happens here, before any listener is touched, so a bad
/// certificate or key fails a reconfiguration without disturbing the
/// running front door.
pub fn build_acceptor(tls: &TlsMaterial) -> Result<TlsAcceptor, FrontDoorError> {
    let certs: Vec<_> = rustls_pemfile::certs(&mut tls.cert_pem.as_slice())
        .collect::<Result<_, _>>()
        .map_err(|e| FrontDoorError::Config(format!("invalid certificate PEM: {e}")))?;
    if certs.is_empty() {
        return Err(FrontDoorError::Config(
            "certificate PEM contains no certificates".to_owned(),
        ));
    }

    let key = rustls_pemfile::private_key(&mut tls.key_pem.as_slice())
        .map_err(|e| FrontDoorError::Config(format!("invalid private key PEM: {e}")))?
        .ok_or_else(|| FrontDoorError::Config("key PEM contains no private key".to_owned()))?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| FrontDoorError::Config(format!("certificate/key mismatch: {e}")))?;

    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}
