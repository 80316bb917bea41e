//! SSH capture module.
//!
//! Accepts TCP connections, presents an OpenSSH identification banner and
//! records the client's identification string. No key exchange is attempted.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::domain::{Protocol, SshConfig};
use crate::error::{Error, Result};
use crate::handle::{CaptureStats, ShutdownRx, StopHandle};
use crate::ports::CaptureModule;

/// Server identification line sent to every client.
pub const SERVER_IDENT: &str = "SSH-2.0-OpenSSH_8.9p1 Ubuntu-3ubuntu0.1\r\n";

/// How long a client gets to send its identification line.
const CLIENT_IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// RFC 4253 caps the identification line at 255 bytes including CRLF.
const MAX_IDENT_LEN: usize = 255;

/// Pause after a failed accept (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// SSH capture module.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshCapture;

impl SshCapture {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureModule for SshCapture {
    type Config = SshConfig;
    const PROTOCOL: Protocol = Protocol::Ssh;

    async fn start(&self, config: SshConfig) -> Result<StopHandle> {
        let port = config.bind_port;

        if let Some(key) = &config.host_key {
            if !key.is_pem_private_key() {
                return Err(Error::bind(
                    Self::PROTOCOL,
                    port,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("{} does not contain a PEM private key", key.path().display()),
                    ),
                ));
            }
        }

        let addr = SocketAddr::new(config.bind_addr, port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::bind(Self::PROTOCOL, port, e))?;

        info!(
            protocol = %Self::PROTOCOL,
            %addr,
            host_key = ?config.host_key.as_ref().map(|k| k.path()),
            "SSH capture listening"
        );

        let stats = Arc::new(CaptureStats::new());
        let task_stats = Arc::clone(&stats);
        Ok(StopHandle::spawn(Self::PROTOCOL, port, stats, move |shutdown| {
            serve(listener, port, task_stats, shutdown)
        }))
    }
}

/// Accept loop; returns once shutdown is requested, aborting open sessions.
async fn serve(listener: TcpListener, port: u16, stats: Arc<CaptureStats>, mut shutdown: ShutdownRx) {
    let mut sessions = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    stats.record(peer);
                    sessions.spawn(handle_session(stream, peer, port));
                }
                Err(e) => {
                    warn!(protocol = "ssh", port, error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
            Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
        }
    }

    sessions.shutdown().await;
    drop(listener);
    debug!(protocol = "ssh", port, "SSH capture released");
}

async fn handle_session(mut stream: TcpStream, peer: SocketAddr, port: u16) {
    debug!(protocol = "ssh", %peer, port, "Connection accepted");

    if let Err(e) = stream.write_all(SERVER_IDENT.as_bytes()).await {
        debug!(protocol = "ssh", %peer, error = %e, "Failed to send identification");
        return;
    }

    let mut buf = vec![0u8; MAX_IDENT_LEN];
    match tokio::time::timeout(CLIENT_IDENT_TIMEOUT, stream.read(&mut buf)).await {
        Ok(Ok(0)) => {
            info!(protocol = "ssh", %peer, port, "Client closed before identification");
        }
        Ok(Ok(n)) => match parse_client_ident(&buf[..n]) {
            Some(ident) => {
                info!(protocol = "ssh", %peer, port, client = %ident, "SSH connection");
            }
            None => {
                info!(
                    protocol = "ssh",
                    %peer,
                    port,
                    payload = %preview(&buf[..n]),
                    "Non-SSH payload"
                );
            }
        },
        Ok(Err(e)) => {
            debug!(protocol = "ssh", %peer, error = %e, "Read failed");
        }
        Err(_) => {
            info!(protocol = "ssh", %peer, port, "Client sent no identification");
        }
    }
}

/// Extract the client identification line (`SSH-protoversion-softwareversion`).
pub fn parse_client_ident(data: &[u8]) -> Option<String> {
    let line = data.split(|&b| b == b'\n').next()?;
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    if !line.starts_with(b"SSH-") {
        return None;
    }

    Some(preview(line))
}

/// Printable rendition of untrusted bytes for logging.
fn preview(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .trim_end()
        .chars()
        .flat_map(char::escape_default)
        .collect()
}
