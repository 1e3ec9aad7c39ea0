//! Handshake-peeking TLS interception.
//!
//! The listener reads the client's first TLS record off the socket, runs it
//! through the fingerprint parser, then replays the exact same bytes to the
//! TLS engine through [`PrefixedStream`] so the handshake proceeds as if
//! nothing had looked at it. A connection that fails to fingerprint still
//! handshakes normally; it just carries an empty record.

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;

/// TLS record header: content type, version, length.
const RECORD_HEADER_LEN: usize = 5;

/// Replays a buffered prefix, then continues reading from the inner stream.
/// Writes and shutdown pass straight through.
#[derive(Debug)]
pub struct PrefixedStream<S> {
    prefix: Vec<u8>,
    offset: usize,
    inner: S,
}

impl<S> PrefixedStream<S> {
    pub fn new(prefix: Vec<u8>, inner: S) -> Self {
        Self {
            prefix,
            offset: 0,
            inner,
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for PrefixedStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if self.offset < self.prefix.len() {
            let remaining = &self.prefix[self.offset..];
            let to_copy = remaining.len().min(buf.remaining());
            buf.put_slice(&remaining[..to_copy]);
            self.offset = self.offset.saturating_add(to_copy);
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for PrefixedStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, data)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// Reads exactly one TLS record off the stream: the 5-byte header plus the
/// body length it declares. For a well-behaved client this is the whole
/// ClientHello; fragmentation across TCP segments is absorbed by the exact
/// reads, not by any reassembly of our own.
pub async fn peek_client_hello<S: AsyncRead + Unpin>(stream: &mut S) -> std::io::Result<Vec<u8>> {
    let mut header = [0u8; RECORD_HEADER_LEN];
    stream.read_exact(&mut header).await?;

    let body_len = usize::from(u16::from_be_bytes([header[3], header[4]]));
    let mut record = Vec::with_capacity(RECORD_HEADER_LEN + body_len);
    record.extend_from_slice(&header);
    record.resize(RECORD_HEADER_LEN + body_len, 0);
    stream.read_exact(&mut record[RECORD_HEADER_LEN..]).await?;

    Ok(record)
}

/// Peeks one record and fingerprints it. A record that does not parse yields
/// an empty [`Fingerprint`]: fingerprinting must never cost the caller an
/// otherwise-valid TLS session. IO failures still surface as errors.
pub async fn peek_fingerprint<S: AsyncRead + Unpin>(
    stream: &mut S,
) -> std::io::Result<(Vec<u8>, Fingerprint)> {
    let peeked = peek_client_hello(stream).await?;
    let fingerprint = match Fingerprint::parse(&peeked) {
        Ok(fp) => fp,
        Err(e) => {
            warn!(error = %e, "could not fingerprint client hello");
            Fingerprint::default()
        }
    };
    Ok((peeked, fingerprint))
}

/// A server-side TLS connection with the ClientHello fingerprint that was
/// observed while establishing it.
#[derive(Debug)]
pub struct InterceptedTls {
    stream: TlsStream<PrefixedStream<TcpStream>>,
    fingerprint: Arc<Fingerprint>,
    peer: SocketAddr,
}

impl InterceptedTls {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// A handle to the fingerprint that outlives the stream.
    pub fn fingerprint_handle(&self) -> Arc<Fingerprint> {
        Arc::clone(&self.fingerprint)
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn into_inner(self) -> (TlsStream<PrefixedStream<TcpStream>>, Arc<Fingerprint>) {
        (self.stream, self.fingerprint)
    }
}

impl AsyncRead for InterceptedTls {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for InterceptedTls {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, data)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

/// Peeks, fingerprints, and completes the TLS handshake for one accepted
/// connection. The peek blocks only the connection it belongs to.
pub struct TlsInterceptor {
    acceptor: TlsAcceptor,
    hello_timeout: Duration,
}

impl TlsInterceptor {
    pub fn new(acceptor: TlsAcceptor, hello_timeout: Duration) -> Self {
        Self {
            acceptor,
            hello_timeout,
        }
    }

    pub async fn intercept(&self, mut stream: TcpStream, peer: SocketAddr) -> Result<InterceptedTls> {
        let (peeked, fingerprint) = timeout(self.hello_timeout, peek_fingerprint(&mut stream))
            .await
            .map_err(|_| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "timed out waiting for ClientHello",
                ))
            })??;
        debug!(%peer, ja3 = %fingerprint.ja3, ja4 = %fingerprint.ja4, "peeked client hello");

        let replayed = PrefixedStream::new(peeked, stream);
        let tls = self
            .acceptor
            .accept(replayed)
            .await
            .map_err(|e| Error::Tls(format!("handshake failed: {e}")))?;

        Ok(InterceptedTls {
            stream: tls,
            fingerprint: Arc::new(fingerprint),
            peer,
        })
    }
}

/// Wraps a bound TCP listener so every accepted connection comes back as a
/// fingerprinted TLS stream.
pub struct InterceptingListener {
    listener: TcpListener,
    interceptor: Arc<TlsInterceptor>,
}

impl InterceptingListener {
    pub fn new(listener: TcpListener, interceptor: Arc<TlsInterceptor>) -> Self {
        Self {
            listener,
            interceptor,
        }
    }

    pub async fn bind(
        addr: SocketAddr,
        acceptor: TlsAcceptor,
        hello_timeout: Duration,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(
            listener,
            Arc::new(TlsInterceptor::new(acceptor, hello_timeout)),
        ))
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts one connection and intercepts it in place. Convenient, but the
    /// peek and handshake run before the next accept; servers handling many
    /// clients should use [`accept_raw`](Self::accept_raw) and intercept in a
    /// spawned task.
    pub async fn accept(&self) -> Result<InterceptedTls> {
        let (stream, peer) = self.listener.accept().await?;
        self.interceptor.intercept(stream, peer).await
    }

    /// Accepts the next raw connection without touching its bytes.
    pub async fn accept_raw(&self) -> std::io::Result<(TcpStream, SocketAddr)> {
        self.listener.accept().await
    }

    pub fn interceptor(&self) -> Arc<TlsInterceptor> {
        Arc::clone(&self.interceptor)
    }
}
