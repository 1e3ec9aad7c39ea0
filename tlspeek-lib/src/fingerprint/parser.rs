use super::record::{Fingerprint, CLIENT_HELLO_MSG, HANDSHAKE_TYPE};
use super::{digest, extensions, grease};
use crate::cursor::{ByteCursor, LenWidth};
use crate::error::ParseError;

/// Theoretical minimum size of the smallest ClientHello record (TLS 1.0).
const MIN_RECORD_LEN: usize = 45;

/// Major version byte shared by all TLS record and handshake versions.
const VERSION_MAJOR: u8 = 3;

/// Cheap shape test before committing to a full decode. This is a hint, not
/// a security boundary: the real bounds checking happens in the parse.
pub fn looks_like_client_hello(buf: &[u8]) -> Result<(), ParseError> {
    if buf.len() < MIN_RECORD_LEN {
        return Err(ParseError::NotAClientHello("shorter than minimum record"));
    }
    if buf[0] != HANDSHAKE_TYPE
        || buf[1] != VERSION_MAJOR
        || buf[5] != CLIENT_HELLO_MSG
        || buf[9] != VERSION_MAJOR
    {
        return Err(ParseError::NotAClientHello("fixed-offset bytes mismatch"));
    }
    Ok(())
}

impl Fingerprint {
    /// Decodes one ClientHello record into a fingerprint, GREASE-filtered,
    /// with JA3/JA4 digests populated.
    ///
    /// Either returns a fully valid record or an error, never a partially
    /// filled record with success.
    pub fn parse(buf: &[u8]) -> Result<Fingerprint, ParseError> {
        looks_like_client_hello(buf)?;

        let mut cur = ByteCursor::new(buf);

        let message_type = cur.read_u8()?;
        let record_tls_version = cur.read_u16()?;
        // Record length, handshake type, and handshake length are redundant
        // with the framing already checked; skip them together.
        cur.skip(6)?;
        let tls_version = cur.read_u16()?;
        // Client random.
        cur.skip(32)?;
        cur.skip_length_prefixed(LenWidth::One)?; // session id

        let mut fp = Fingerprint {
            message_type,
            record_tls_version,
            tls_version,
            ..Fingerprint::default()
        };

        let mut suites = cur.read_length_prefixed(LenWidth::Two)?;
        while !suites.is_empty() {
            let suite = suites.read_u16()?;
            if grease::is_grease(suite) {
                fp.grease = true;
            } else {
                fp.ciphersuite.push(suite);
            }
        }

        let mut compression = cur.read_length_prefixed(LenWidth::One)?;
        while !compression.is_empty() {
            // Compression methods are not GREASE-eligible; copied verbatim.
            fp.compression.push(compression.read_u8()?);
        }

        let mut extension_block = cur.read_length_prefixed(LenWidth::Two)?;
        extensions::dispatch(&mut extension_block, &mut fp)?;

        fp.ja3 = digest::ja3(&fp);
        fp.ja4 = digest::ja4(&fp);
        Ok(fp)
    }
}
