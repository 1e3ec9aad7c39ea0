#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tlspeek_lib::{build_tls_acceptor, load_from_path, Config, InterceptingListener, TlsInterceptor};
use tokio::io::AsyncWriteExt;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "TLS server that fingerprints every ClientHello it sees")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(short, long, value_name = "FILE", default_value = "tlspeek.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let cfg = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(%err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    info!(listen = %cfg.listen, "configuration loaded");
    if let Err(err) = run(cfg).await {
        error!(%err, "server exited with error");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> tlspeek_lib::Result<()> {
    let acceptor = build_tls_acceptor(&cfg.tls.cert_path, &cfg.tls.key_path, &cfg.tls.alpn)?;
    let interceptor = Arc::new(TlsInterceptor::new(
        acceptor,
        Duration::from_millis(cfg.hello_timeout_ms),
    ));
    let listener = InterceptingListener::new(
        tokio::net::TcpListener::bind(cfg.listen).await?,
        interceptor,
    );
    info!(addr = %cfg.listen, "listening");

    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(tlspeek_lib::Error::Io)?;

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("received SIGINT, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            result = listener.accept_raw() => {
                let (stream, peer) = match result {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                };
                let interceptor = listener.interceptor();
                tokio::spawn(async move {
                    match interceptor.intercept(stream, peer).await {
                        Ok(conn) => serve_fingerprint(conn).await,
                        Err(e) => warn!(%peer, error = %e, "interception failed"),
                    }
                });
            }
        }
    }
    Ok(())
}

/// Writes the connection's own fingerprint back to the client as JSON, then
/// closes the session.
async fn serve_fingerprint(mut conn: tlspeek_lib::InterceptedTls) {
    let peer = conn.peer_addr();
    let fp = conn.fingerprint().clone();
    info!(%peer, ja3 = %fp.ja3, ja4 = %fp.ja4, sni = fp.sni.as_deref().unwrap_or("-"), "client fingerprinted");

    let body = match serde_json::to_vec_pretty(&fp) {
        Ok(body) => body,
        Err(e) => {
            warn!(%peer, error = %e, "could not serialize fingerprint");
            return;
        }
    };

    if let Err(e) = conn.write_all(&body).await {
        warn!(%peer, error = %e, "write failed");
        return;
    }
    let _ = conn.shutdown().await;
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
