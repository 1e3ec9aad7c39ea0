use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_hello_timeout_ms() -> u64 {
    10_000
}

/// Listener configuration, loaded from TOML.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address and port to listen on, e.g. "0.0.0.0:8443".
    pub listen: SocketAddr,
    /// TLS certificate configuration for the downstream handshake.
    pub tls: TlsConfig,
    /// Deadline for a client to deliver its ClientHello; a silent peer is
    /// dropped when it expires instead of stalling the connection forever.
    #[serde(default = "default_hello_timeout_ms")]
    pub hello_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
    /// ALPN protocols offered to clients, in preference order.
    #[serde(default)]
    pub alpn: Vec<String>,
}

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| Error::Config(format!("failed to read config file: {e}")))?;
    let cfg: Config =
        toml::from_str(&txt).map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> Result<()> {
    if !Path::new(&cfg.tls.cert_path).exists() {
        return Err(Error::Config(format!(
            "certificate file not found: {}",
            cfg.tls.cert_path
        )));
    }
    if !Path::new(&cfg.tls.key_path).exists() {
        return Err(Error::Config(format!(
            "key file not found: {}",
            cfg.tls.key_path
        )));
    }
    if cfg.hello_timeout_ms == 0 {
        return Err(Error::Config(
            "hello_timeout_ms must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
