use md5::Md5;
use sha2::{Digest, Sha256};

use super::record::{
    Fingerprint, VERSION_TLS10, VERSION_TLS11, VERSION_TLS12, VERSION_TLS13,
};

const EXT_SERVER_NAME: u16 = 0x0000;

/// Dash-joins values in decimal, e.g. `[4865, 4866]` -> `"4865-4866"`.
fn dash_join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

fn md5_hex(text: &str) -> String {
    format!("{:x}", Md5::digest(text.as_bytes()))
}

fn sha256_hex(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// JA3 canonical string, hashed. MD5 is a canonicalization hash here (the
/// established JA3 format), not a security primitive.
///
/// Unhashed layout: `version,ciphers,extensions,curves,point_formats` with
/// each list dash-joined in as-parsed order.
pub fn ja3(fp: &Fingerprint) -> String {
    let unhashed = format!(
        "{},{},{},{},{}",
        fp.tls_version,
        dash_join(&fp.ciphersuite),
        dash_join(&fp.extensions),
        dash_join(&fp.e_curves),
        dash_join(&fp.ec_point_fmt),
    );
    md5_hex(&unhashed)
}

fn version_code(version: u16) -> &'static str {
    match version {
        VERSION_TLS10 => "10",
        VERSION_TLS11 => "11",
        VERSION_TLS12 => "12",
        VERSION_TLS13 => "13",
        _ => "??",
    }
}

/// JA4-style digest string.
///
/// Prefix: `t` + version code + `d`/`i` (SNI extension present or not) +
/// two-digit cipher and extension counts + first ALPN protocol (or `-`).
/// Then comma-separated SHA-256 digests of the dash-joined cipher list,
/// extension list, and ALPN list (`-` when no ALPN was offered).
///
/// Counts above 99 are capped at 99 so the prefix stays fixed-width.
pub fn ja4(fp: &Fingerprint) -> String {
    let sni_indicator = if fp.extensions.contains(&EXT_SERVER_NAME) {
        "d"
    } else {
        "i"
    };

    let first_alpn = fp
        .alpn_protocols
        .first()
        .map(String::as_str)
        .unwrap_or("-");

    let prefix = format!(
        "t{}{}{:02}{:02}{}",
        version_code(fp.tls_version),
        sni_indicator,
        fp.ciphersuite.len().min(99),
        fp.extensions.len().min(99),
        first_alpn,
    );

    let ciphers_hash = sha256_hex(&dash_join(&fp.ciphersuite));
    let extensions_hash = sha256_hex(&dash_join(&fp.extensions));
    let alpn_hash = if fp.alpn_protocols.is_empty() {
        "-".to_string()
    } else {
        sha256_hex(&fp.alpn_protocols.join("-"))
    };

    format!("{prefix},{ciphers_hash},{extensions_hash},{alpn_hash}")
}
