use std::sync::Arc;

use mkcert::core::{authority, certificate};
use mkcert::Host;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::rustls::{self, pki_types};
use tokio_rustls::{TlsAcceptor, TlsConnector};

// The whole point of the tool: a client that trusts only the local root CA
// can complete a TLS handshake against a server using an issued leaf.
#[tokio::test]
async fn test_issued_certificate_serves_https() {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let caroot = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let ca = authority::load_or_create(caroot.path()).unwrap();

    let cert_path = out.path().join("localhost.pem");
    let key_path = out.path().join("localhost-key.pem");
    certificate::issue(
        &ca,
        &[
            Host::parse("localhost").unwrap(),
            Host::parse("127.0.0.1").unwrap(),
        ],
        Some(cert_path.to_str().unwrap()),
        Some(key_path.to_str().unwrap()),
    )
    .unwrap();

    // Server side: the issued leaf and its key.
    let cert_bytes = std::fs::read(&cert_path).unwrap();
    let key_bytes = std::fs::read(&key_path).unwrap();
    let certs: Vec<pki_types::CertificateDer<'static>> =
        rustls_pemfile::certs(&mut cert_bytes.as_slice())
            .collect::<Result<_, _>>()
            .unwrap();
    let key = rustls_pemfile::pkcs8_private_keys(&mut key_bytes.as_slice())
        .next()
        .unwrap()
        .unwrap();
    let server_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, pki_types::PrivateKeyDer::Pkcs8(key))
        .unwrap();

    // Client side: a root store holding nothing but the local CA.
    let ca_bytes = std::fs::read(ca.root_cert_path()).unwrap();
    let ca_der = rustls_pemfile::certs(&mut ca_bytes.as_slice())
        .next()
        .unwrap()
        .unwrap();
    let mut roots = rustls::RootCertStore::empty();
    roots.add(ca_der).unwrap();
    let client_config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(server_config));

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut tls = acceptor.accept(stream).await.unwrap();
        let mut buf = [0u8; 5];
        tls.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"HELLO");
        tls.write_all(b"OK").await.unwrap();
        tls.shutdown().await.unwrap();
    });

    let connector = TlsConnector::from(Arc::new(client_config));
    let stream = TcpStream::connect(addr).await.unwrap();
    let server_name = pki_types::ServerName::try_from("localhost").unwrap();
    let mut tls = connector.connect(server_name, stream).await.unwrap();
    tls.write_all(b"HELLO").await.unwrap();
    let mut reply = Vec::new();
    tls.read_to_end(&mut reply).await.unwrap();
    assert_eq!(reply, b"OK");

    server.await.unwrap();
}
