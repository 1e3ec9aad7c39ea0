//! ClientHello decoding and JA3/JA4 digest derivation.
//!
//! Parsing is purely functional over an input slice: no shared state, safe
//! to call from any number of tasks concurrently.

mod digest;
mod extensions;
mod grease;
mod iana;
mod parser;
mod record;

pub use digest::{ja3, ja4};
pub use grease::{is_grease, TLS_GREASE_VALUES};
pub use iana::extension_name;
pub use parser::looks_like_client_hello;
pub use record::{
    Fingerprint, CLIENT_HELLO_MSG, HANDSHAKE_TYPE, VERSION_TLS10, VERSION_TLS11, VERSION_TLS12,
    VERSION_TLS13,
};
