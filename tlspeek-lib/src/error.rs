use thiserror::Error;

/// Errors surfaced by the listener, TLS setup, and configuration layers.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while decoding a ClientHello.
///
/// Every variant is fatal to the parse attempt that raised it; the parser
/// never resynchronizes after a failed read.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// A cursor read ran past the end of the available bytes.
    #[error("read of {requested} byte(s) exceeds the {available} remaining")]
    Underrun { requested: usize, available: usize },

    /// The fast-rejection test failed; the input is not worth decoding.
    #[error("not a TLS ClientHello: {0}")]
    NotAClientHello(&'static str),

    /// An extension's content was malformed or shorter than declared.
    #[error("malformed extension {id:#06x} ({name}): {cause}")]
    Extension {
        id: u16,
        name: &'static str,
        cause: String,
    },
}

/// Post-hoc semantic check failures, see [`Fingerprint::validate`].
///
/// [`Fingerprint::validate`]: crate::fingerprint::Fingerprint::validate
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message type {0} is not Handshake (22)")]
    NotHandshake(u8),

    #[error("cipher suite list is empty")]
    NoCipherSuites,

    #[error("extension list is empty")]
    NoExtensions,

    #[error("TLS version is zero")]
    NoTlsVersion,
}
