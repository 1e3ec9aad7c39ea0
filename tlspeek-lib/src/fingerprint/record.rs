use serde::Serialize;

use crate::error::ValidationError;

/// TLS record content type carrying handshake messages.
pub const HANDSHAKE_TYPE: u8 = 22;
/// Handshake message type of a ClientHello.
pub const CLIENT_HELLO_MSG: u8 = 1;

pub const VERSION_TLS10: u16 = 0x0301;
pub const VERSION_TLS11: u16 = 0x0302;
pub const VERSION_TLS12: u16 = 0x0303;
pub const VERSION_TLS13: u16 = 0x0304;

/// Everything observable about a single ClientHello, in wire order.
///
/// Produced once per message by [`Fingerprint::parse`] and immutable
/// afterwards. List fields preserve the order the client sent them in;
/// order is part of the fingerprint. Optional fields are present only when
/// the corresponding extension occurred, and are suppressed (not emitted as
/// null) when serialized.
///
/// [`Fingerprint::parse`]: Fingerprint::parse
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fingerprint {
    pub message_type: u8,
    pub record_tls_version: u16,
    pub tls_version: u16,
    /// GREASE-filtered cipher suites, client order.
    pub ciphersuite: Vec<u16>,
    pub compression: Vec<u8>,
    /// Extension type ids in wire order, GREASE- and padding-filtered.
    pub extensions: Vec<u16>,
    pub e_curves: Vec<u16>,
    pub sig_alg: Vec<u16>,
    pub supported_versions: Vec<u16>,
    /// Never empty after a successful parse; `[0]` when the extension was
    /// absent, for compatibility with established JA3 tooling.
    pub ec_point_fmt: Vec<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alpn_protocols: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_share_groups: Option<Vec<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psk_key_exchange_modes: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renegotiation_info: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_ticket_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    /// True iff any GREASE value was observed (and stripped) anywhere.
    pub grease: bool,
    pub ja3: String,
    pub ja4: String,
}

impl Fingerprint {
    /// Semantic sanity check, usable on any record, not only freshly parsed
    /// ones (e.g. records rehydrated from storage).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.message_type != HANDSHAKE_TYPE {
            return Err(ValidationError::NotHandshake(self.message_type));
        }
        if self.ciphersuite.is_empty() {
            return Err(ValidationError::NoCipherSuites);
        }
        if self.extensions.is_empty() {
            return Err(ValidationError::NoExtensions);
        }
        if self.tls_version == 0 {
            return Err(ValidationError::NoTlsVersion);
        }
        Ok(())
    }
}
