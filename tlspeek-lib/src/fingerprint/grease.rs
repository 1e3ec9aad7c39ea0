/// See <https://datatracker.ietf.org/doc/html/rfc8701>
pub const TLS_GREASE_VALUES: [u16; 16] = [
    0x0a0a, 0x1a1a, 0x2a2a, 0x3a3a, 0x4a4a, 0x5a5a, 0x6a6a, 0x7a7a, 0x8a8a, 0x9a9a, 0xaaaa, 0xbaba,
    0xcaca, 0xdada, 0xeaea, 0xfafa,
];

/// Whether a 16-bit cipher suite, extension, group, or version value is a
/// GREASE reservation. GREASE values are randomized per connection by some
/// clients and must never land in a fingerprint.
pub fn is_grease(value: u16) -> bool {
    TLS_GREASE_VALUES.contains(&value)
}
