//! Optional TLS termination for the GET (egress) port.

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use std::fs::File;
use std::io::{self, BufReader};
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

/// Builds a `TlsAcceptor` from a PEM certificate chain and PKCS#8 private
/// key on disk. Called once at startup when both `SERVER_CRT_FILE` and
/// `SERVER_KEY_FILE` are set.
pub(crate) fn load_acceptor(cert_path: &str, key_path: &str) -> io::Result<TlsAcceptor> {
    let mut cert_reader = BufReader::new(File::open(cert_path)?);
    let mut key_reader = BufReader::new(File::open(key_path)?);

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let key: PrivateKeyDer<'static> = rustls_pemfile::pkcs8_private_keys(&mut key_reader)
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "no private key found"))?
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        .into();

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
