//! Shared builders for synthetic ClientHello records.
#![allow(dead_code)]

/// One extension: type, 2-byte length, content.
pub fn ext(id: u16, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + content.len());
    out.extend_from_slice(&id.to_be_bytes());
    out.extend_from_slice(&(content.len() as u16).to_be_bytes());
    out.extend_from_slice(content);
    out
}

/// server_name extension carrying a single hostname entry, wire layout per
/// RFC 6066 (list length, entry type 0, 2-byte name length, name).
pub fn sni_ext(host: &str) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&((host.len() + 3) as u16).to_be_bytes());
    content.push(0); // host_name
    content.extend_from_slice(&(host.len() as u16).to_be_bytes());
    content.extend_from_slice(host.as_bytes());
    ext(0x0000, &content)
}

pub fn alpn_ext(protocols: &[&str]) -> Vec<u8> {
    let mut list = Vec::new();
    for p in protocols {
        list.push(p.len() as u8);
        list.extend_from_slice(p.as_bytes());
    }
    let mut content = Vec::new();
    content.extend_from_slice(&(list.len() as u16).to_be_bytes());
    content.extend_from_slice(&list);
    ext(0x0010, &content)
}

pub fn groups_ext(groups: &[u16]) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&((groups.len() * 2) as u16).to_be_bytes());
    for g in groups {
        content.extend_from_slice(&g.to_be_bytes());
    }
    ext(0x000a, &content)
}

pub fn point_formats_ext(formats: &[u8]) -> Vec<u8> {
    let mut content = Vec::new();
    content.push(formats.len() as u8);
    content.extend_from_slice(formats);
    ext(0x000b, &content)
}

pub fn supported_versions_ext(versions: &[u16]) -> Vec<u8> {
    let mut content = Vec::new();
    content.push((versions.len() * 2) as u8);
    for v in versions {
        content.extend_from_slice(&v.to_be_bytes());
    }
    ext(0x002b, &content)
}

/// Padding extension in the shape the dispatcher expects: an inner 2-byte
/// skip length followed by that many bytes.
pub fn padding_ext(len: u16) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&len.to_be_bytes());
    content.extend(std::iter::repeat(0u8).take(usize::from(len)));
    ext(0x0015, &content)
}

/// Assembles a complete single-record ClientHello.
pub fn client_hello(client_version: u16, ciphers: &[u16], extensions: &[Vec<u8>]) -> Vec<u8> {
    let mut ext_block = Vec::new();
    for e in extensions {
        ext_block.extend_from_slice(e);
    }

    let mut body = Vec::new();
    body.extend_from_slice(&client_version.to_be_bytes());
    body.extend_from_slice(&[0x42u8; 32]); // client random
    body.push(0); // empty session id
    body.extend_from_slice(&((ciphers.len() * 2) as u16).to_be_bytes());
    for c in ciphers {
        body.extend_from_slice(&c.to_be_bytes());
    }
    body.extend_from_slice(&[1, 0]); // one compression method: null
    body.extend_from_slice(&(ext_block.len() as u16).to_be_bytes());
    body.extend_from_slice(&ext_block);

    let mut handshake = Vec::new();
    handshake.push(1); // client_hello
    let len = (body.len() as u32).to_be_bytes();
    handshake.extend_from_slice(&len[1..]); // 3-byte length
    handshake.extend_from_slice(&body);

    let mut record = Vec::new();
    record.push(22); // handshake content type
    record.extend_from_slice(&[0x03, 0x01]); // record version
    record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
    record.extend_from_slice(&handshake);
    record
}
