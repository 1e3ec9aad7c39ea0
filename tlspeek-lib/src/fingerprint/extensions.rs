use tracing::debug;

use super::grease::is_grease;
use super::iana::extension_name;
use super::record::Fingerprint;
use crate::cursor::{ByteCursor, LenWidth};
use crate::error::ParseError;

const SNI_HOSTNAME_TYPE: u16 = 0;

/// The extension types this dispatcher decodes into typed fields. Everything
/// else lands in `Unknown` and is recorded by type id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtensionKind {
    ServerName,
    SupportedGroups,
    EcPointFormats,
    SignatureAlgorithms,
    Alpn,
    Padding,
    SessionTicket,
    SupportedVersions,
    Cookie,
    PskKeyExchangeModes,
    KeyShare,
    RenegotiationInfo,
    Unknown(u16),
}

impl ExtensionKind {
    fn from_id(id: u16) -> Self {
        match id {
            0x0000 => ExtensionKind::ServerName,
            0x000a => ExtensionKind::SupportedGroups,
            0x000b => ExtensionKind::EcPointFormats,
            0x000d => ExtensionKind::SignatureAlgorithms,
            0x0010 => ExtensionKind::Alpn,
            0x0015 => ExtensionKind::Padding,
            0x0023 => ExtensionKind::SessionTicket,
            0x002b => ExtensionKind::SupportedVersions,
            0x002c => ExtensionKind::Cookie,
            0x002d => ExtensionKind::PskKeyExchangeModes,
            0x0033 => ExtensionKind::KeyShare,
            0xff01 => ExtensionKind::RenegotiationInfo,
            other => ExtensionKind::Unknown(other),
        }
    }
}

/// Drains a cursor of u16 values, dropping GREASE entries and raising the
/// record's flag for each one seen. The cursor still advances over dropped
/// values; only the accumulated list changes.
fn read_u16_list_filtered(
    cur: &mut ByteCursor<'_>,
    grease_seen: &mut bool,
) -> Result<Vec<u16>, ParseError> {
    let mut out = Vec::with_capacity(cur.remaining() / 2);
    while !cur.is_empty() {
        let value = cur.read_u16()?;
        if is_grease(value) {
            *grease_seen = true;
        } else {
            out.push(value);
        }
    }
    Ok(out)
}

fn extension_error(id: u16, err: ParseError) -> ParseError {
    ParseError::Extension {
        id,
        name: extension_name(id),
        cause: err.to_string(),
    }
}

/// Iterates the extension block, decoding each (type, length, content)
/// triple into the record.
///
/// Every branch appends the extension type to `extensions` except padding
/// (deliberately excluded, matching established JA3 semantics) and GREASE
/// types (which only raise the `grease` flag). Every branch consumes its
/// entire declared content so the outer cursor stays aligned.
pub fn dispatch(block: &mut ByteCursor<'_>, fp: &mut Fingerprint) -> Result<(), ParseError> {
    while !block.is_empty() {
        let id = block.read_u16()?;
        let content = block
            .read_length_prefixed(LenWidth::Two)
            .map_err(|e| extension_error(id, e))?;

        if is_grease(id) {
            fp.grease = true;
            continue;
        }
        handle_extension(id, content, fp).map_err(|e| extension_error(id, e))?;
    }

    // Established JA3 tooling emits 0 when the ec_point_formats extension is
    // missing instead of leaving the field blank; stay compatible.
    if fp.ec_point_fmt.is_empty() {
        fp.ec_point_fmt.push(0);
    }
    Ok(())
}

fn handle_extension(
    id: u16,
    mut content: ByteCursor<'_>,
    fp: &mut Fingerprint,
) -> Result<(), ParseError> {
    match ExtensionKind::from_id(id) {
        ExtensionKind::ServerName => {
            let mut sni = content.read_length_prefixed(LenWidth::Two)?;
            let sni_type = sni.read_u16()?;
            let hostname = sni.read_length_prefixed_bytes(LenWidth::One)?;
            if sni_type == SNI_HOSTNAME_TYPE {
                fp.sni = Some(String::from_utf8_lossy(hostname).into_owned());
            } else {
                // Consumed but not recorded; keeps the cursor aligned.
                debug!(sni_type, "unexpected SNI entry type");
            }
            fp.extensions.push(id);
        }
        ExtensionKind::Padding => {
            // Padding is excluded from the extension list on purpose: JA3
            // implementations do not count it.
            content.skip_length_prefixed(LenWidth::Two)?;
        }
        ExtensionKind::SupportedGroups => {
            let mut list = content.read_length_prefixed(LenWidth::Two)?;
            fp.e_curves = read_u16_list_filtered(&mut list, &mut fp.grease)?;
            fp.extensions.push(id);
        }
        ExtensionKind::EcPointFormats => {
            fp.ec_point_fmt = content.read_length_prefixed(LenWidth::One)?.read_u8_list()?;
            fp.extensions.push(id);
        }
        ExtensionKind::SignatureAlgorithms => {
            fp.sig_alg = content.read_length_prefixed(LenWidth::Two)?.read_u16_list()?;
            fp.extensions.push(id);
        }
        ExtensionKind::SupportedVersions => {
            let mut list = content.read_length_prefixed(LenWidth::One)?;
            fp.supported_versions = read_u16_list_filtered(&mut list, &mut fp.grease)?;
            fp.extensions.push(id);
        }
        ExtensionKind::Alpn => {
            let mut list = content.read_length_prefixed(LenWidth::Two)?;
            // Reset rather than accumulate in case the same record is run
            // through dispatch twice.
            fp.alpn_protocols.clear();
            while !list.is_empty() {
                let proto = list.read_length_prefixed_bytes(LenWidth::One)?;
                fp.alpn_protocols
                    .push(String::from_utf8_lossy(proto).into_owned());
            }
            fp.extensions.push(id);
        }
        ExtensionKind::KeyShare => {
            let mut list = content.read_length_prefixed(LenWidth::Two)?;
            let mut groups = Vec::new();
            while !list.is_empty() {
                let group = list.read_u16()?;
                list.skip_length_prefixed(LenWidth::Two)?;
                if is_grease(group) {
                    fp.grease = true;
                } else {
                    groups.push(group);
                }
            }
            fp.key_share_groups = Some(groups);
            fp.extensions.push(id);
        }
        ExtensionKind::PskKeyExchangeModes => {
            let modes = content.read_length_prefixed(LenWidth::One)?.read_u8_list()?;
            fp.psk_key_exchange_modes = Some(modes);
            fp.extensions.push(id);
        }
        ExtensionKind::Cookie => {
            let cookie = content.read_length_prefixed_bytes(LenWidth::Two)?;
            fp.cookie = Some(cookie.to_vec());
            fp.extensions.push(id);
        }
        ExtensionKind::RenegotiationInfo => {
            let reneg = content.read_length_prefixed_bytes(LenWidth::One)?;
            fp.renegotiation_info = Some(reneg.to_vec());
            fp.extensions.push(id);
        }
        ExtensionKind::SessionTicket => {
            // Opaque blob; only the length is fingerprint-relevant.
            fp.session_ticket_len = Some(content.remaining());
            fp.extensions.push(id);
        }
        ExtensionKind::Unknown(_) => {
            // Appended first: zero-length extensions are legitimate.
            fp.extensions.push(id);
            if content.remaining() > 1 {
                // Structural well-formedness check only; values discarded.
                content.read_length_prefixed(LenWidth::Two)?.read_u8_list()?;
            }
        }
    }
    Ok(())
}
