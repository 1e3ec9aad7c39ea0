mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use tlspeek_lib::fingerprint::VERSION_TLS12;
use tlspeek_lib::{peek_client_hello, peek_fingerprint, Error, InterceptingListener, PrefixedStream};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, ServerConfig, SignatureScheme};
use tokio_rustls::{TlsAcceptor, TlsConnector};

#[tokio::test]
async fn peek_reads_exactly_one_record() {
    let hello = client_hello(VERSION_TLS12, &[0x1301], &[sni_ext("example.com")]);
    let trailing = b"subsequent tls records";

    let (mut client, mut server) = tokio::io::duplex(4096);
    client.write_all(&hello).await.unwrap();
    client.write_all(trailing).await.unwrap();
    drop(client);

    let peeked = peek_client_hello(&mut server).await.unwrap();
    assert_eq!(peeked, hello);

    // The rest of the stream is untouched by the peek.
    let mut rest = Vec::new();
    server.read_to_end(&mut rest).await.unwrap();
    assert_eq!(rest, trailing);
}

#[tokio::test]
async fn replay_is_byte_for_byte_transparent() {
    let hello = client_hello(
        VERSION_TLS12,
        &[0x1301, 0x1302],
        &[sni_ext("example.com"), alpn_ext(&["h2"])],
    );
    let trailing = vec![0x17u8; 3000]; // application data well past one read

    let mut wire = hello.clone();
    wire.extend_from_slice(&trailing);

    let (mut client, mut server) = tokio::io::duplex(512);
    let wire_clone = wire.clone();
    let writer = tokio::spawn(async move {
        client.write_all(&wire_clone).await.unwrap();
        drop(client);
    });

    let peeked = peek_client_hello(&mut server).await.unwrap();
    let mut replayed = PrefixedStream::new(peeked, server);

    let mut seen = Vec::new();
    replayed.read_to_end(&mut seen).await.unwrap();
    writer.await.unwrap();

    // A downstream TLS reader gets exactly what the socket carried.
    assert_eq!(seen, wire);
}

#[tokio::test]
async fn unparseable_record_yields_empty_fingerprint() {
    // A framed record whose body is not a ClientHello.
    let mut garbage = vec![22u8, 3, 1, 0, 64];
    garbage.extend_from_slice(&[0xffu8; 64]);

    let (mut client, mut server) = tokio::io::duplex(256);
    client.write_all(&garbage).await.unwrap();
    drop(client);

    let (peeked, fp) = peek_fingerprint(&mut server).await.unwrap();
    assert_eq!(peeked, garbage);
    assert_eq!(fp, tlspeek_lib::Fingerprint::default());
    assert!(fp.ja3.is_empty());
}

#[tokio::test]
async fn truncated_stream_is_an_io_error() {
    let (mut client, mut server) = tokio::io::duplex(256);
    // Header promises 100 body bytes; deliver 3 and hang up.
    client.write_all(&[22, 3, 1, 0, 100, 1, 2, 3]).await.unwrap();
    drop(client);

    assert!(peek_client_hello(&mut server).await.is_err());
}

fn test_tls_pair() -> (TlsAcceptor, TlsConnector) {
    let rcgen::CertifiedKey { cert, signing_key } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .unwrap_or_else(|e| panic!("failed to generate self-signed cert: {e}"));

    let cert_der = CertificateDer::from(cert.der().to_vec());
    let key_der = tokio_rustls::rustls::pki_types::PrivateKeyDer::Pkcs8(
        tokio_rustls::rustls::pki_types::PrivatePkcs8KeyDer::from(signing_key.serialize_der()),
    );

    let server_cfg = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der], key_der)
        .unwrap_or_else(|e| panic!("failed to build server config: {e}"));

    let client_cfg = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
        .with_no_client_auth();

    (
        TlsAcceptor::from(Arc::new(server_cfg)),
        TlsConnector::from(Arc::new(client_cfg)),
    )
}

/// Loopback-only verifier; the test exercises interception, not PKI.
#[derive(Debug)]
struct AcceptAnyCert;

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
        ]
    }
}

#[tokio::test]
async fn intercepted_handshake_carries_fingerprint_and_echoes() {
    let (acceptor, connector) = test_tls_pair();

    let listener = InterceptingListener::bind(
        "127.0.0.1:0".parse().unwrap(),
        acceptor,
        Duration::from_secs(5),
    )
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut conn = listener.accept().await.unwrap();

        let fp = conn.fingerprint().clone();
        assert_eq!(fp.message_type, 22);
        assert!(fp.validate().is_ok(), "real client hello must validate");
        assert_eq!(fp.sni.as_deref(), Some("localhost"));
        assert!(!fp.ja3.is_empty());
        assert!(fp.ja4.starts_with('t'));

        let mut buf = [0u8; 4];
        conn.read_exact(&mut buf).await.unwrap();
        conn.write_all(&buf).await.unwrap();
        conn.shutdown().await.unwrap();
        fp
    });

    let tcp = tokio::net::TcpStream::connect(addr).await.unwrap();
    let domain = ServerName::try_from("localhost").unwrap();
    let mut tls = connector.connect(domain, tcp).await.unwrap();

    tls.write_all(b"ping").await.unwrap();
    let mut echo = [0u8; 4];
    tls.read_exact(&mut echo).await.unwrap();
    assert_eq!(&echo, b"ping");

    let fp = server.await.unwrap();
    assert!(!fp.ciphersuite.is_empty());
    assert!(!fp.extensions.is_empty());
}

#[tokio::test]
async fn silent_peer_hits_the_hello_deadline() {
    let (acceptor, _connector) = test_tls_pair();

    let listener = InterceptingListener::bind(
        "127.0.0.1:0".parse().unwrap(),
        acceptor,
        Duration::from_millis(100),
    )
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    // Connect and send nothing.
    let _quiet = tokio::net::TcpStream::connect(addr).await.unwrap();

    let err = listener.accept().await.unwrap_err();
    match err {
        Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::TimedOut),
        other => panic!("expected timeout, got {other:?}"),
    }
}
