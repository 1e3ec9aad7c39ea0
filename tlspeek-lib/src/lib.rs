#![forbid(unsafe_code)]

pub mod config;
pub mod cursor;
pub mod error;
pub mod fingerprint;
pub mod intercept;
pub mod tls;

pub use config::{load_from_path, Config, TlsConfig};
pub use cursor::{ByteCursor, LenWidth};
pub use error::{Error, ParseError, Result, ValidationError};
pub use fingerprint::{is_grease, ja3, ja4, looks_like_client_hello, Fingerprint};
pub use intercept::{
    peek_client_hello, peek_fingerprint, InterceptedTls, InterceptingListener, PrefixedStream,
    TlsInterceptor,
};
pub use tls::build_tls_acceptor;
