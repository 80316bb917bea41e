//! SNMP capture module.
//!
//! Receives UDP datagrams and logs the SNMP version, community string and
//! PDU type of each request. Nothing is ever sent back.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::domain::{Protocol, SnmpConfig};
use crate::error::{Error, Result};
use crate::handle::{CaptureStats, ShutdownRx, StopHandle};
use crate::ports::CaptureModule;

/// Largest UDP payload over IPv4 or IPv6, so nothing is ever truncated.
const MAX_DATAGRAM: usize = u16::MAX as usize;

const RECV_BACKOFF: Duration = Duration::from_millis(100);

// BER tags
const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_SEQUENCE: u8 = 0x30;

/// SNMP message version field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnmpVersion {
    V1,
    V2c,
    V3,
    Other(i64),
}

impl From<i64> for SnmpVersion {
    fn from(value: i64) -> Self {
        match value {
            0 => SnmpVersion::V1,
            1 => SnmpVersion::V2c,
            3 => SnmpVersion::V3,
            other => SnmpVersion::Other(other),
        }
    }
}

impl std::fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnmpVersion::V1 => write!(f, "v1"),
            SnmpVersion::V2c => write!(f, "v2c"),
            SnmpVersion::V3 => write!(f, "v3"),
            SnmpVersion::Other(v) => write!(f, "unknown({})", v),
        }
    }
}

/// PDU type, from the context-specific tag following the community.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduType {
    GetRequest,
    GetNextRequest,
    Response,
    SetRequest,
    TrapV1,
    GetBulkRequest,
    InformRequest,
    TrapV2,
    Report,
    Unknown(u8),
}

impl From<u8> for PduType {
    fn from(tag: u8) -> Self {
        match tag {
            0xA0 => PduType::GetRequest,
            0xA1 => PduType::GetNextRequest,
            0xA2 => PduType::Response,
            0xA3 => PduType::SetRequest,
            0xA4 => PduType::TrapV1,
            0xA5 => PduType::GetBulkRequest,
            0xA6 => PduType::InformRequest,
            0xA7 => PduType::TrapV2,
            0xA8 => PduType::Report,
            other => PduType::Unknown(other),
        }
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PduType::GetRequest => write!(f, "get-request"),
            PduType::GetNextRequest => write!(f, "get-next-request"),
            PduType::Response => write!(f, "response"),
            PduType::SetRequest => write!(f, "set-request"),
            PduType::TrapV1 => write!(f, "trap"),
            PduType::GetBulkRequest => write!(f, "get-bulk-request"),
            PduType::InformRequest => write!(f, "inform-request"),
            PduType::TrapV2 => write!(f, "trap-v2"),
            PduType::Report => write!(f, "report"),
            PduType::Unknown(tag) => write!(f, "unknown(0x{:02x})", tag),
        }
    }
}

/// The envelope of an SNMP message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpMessage {
    pub version: SnmpVersion,
    /// Community string (v1/v2c only).
    pub community: Option<String>,
    /// PDU type (v1/v2c only).
    pub pdu: Option<PduType>,
}

/// Decode the envelope of a BER encoded SNMP message.
///
/// Returns `None` for anything that is not a well-formed
/// `SEQUENCE { INTEGER, ... }` envelope.
pub fn decode_message(data: &[u8]) -> Option<SnmpMessage> {
    let (tag, body, _) = read_tlv(data)?;
    if tag != TAG_SEQUENCE {
        return None;
    }

    let (tag, version, rest) = read_tlv(body)?;
    if tag != TAG_INTEGER {
        return None;
    }
    let version = SnmpVersion::from(decode_integer(version)?);

    if version == SnmpVersion::V3 {
        return Some(SnmpMessage {
            version,
            community: None,
            pdu: None,
        });
    }

    let (tag, community, rest) = read_tlv(rest)?;
    if tag != TAG_OCTET_STRING {
        return None;
    }

    Some(SnmpMessage {
        version,
        community: Some(String::from_utf8_lossy(community).into_owned()),
        pdu: rest.first().map(|&tag| PduType::from(tag)),
    })
}

/// Split one tag-length-value element off the front of `data`.
fn read_tlv(data: &[u8]) -> Option<(u8, &[u8], &[u8])> {
    let (&tag, rest) = data.split_first()?;
    let (&first, rest) = rest.split_first()?;

    let (len, rest) = if first < 0x80 {
        (first as usize, rest)
    } else {
        let count = (first & 0x7f) as usize;
        if count == 0 || count > 4 || rest.len() < count {
            return None;
        }
        let len = rest[..count]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        (len, &rest[count..])
    };

    if rest.len() < len {
        return None;
    }
    Some((tag, &rest[..len], &rest[len..]))
}

/// Decode a two's-complement BER integer of at most 8 bytes.
fn decode_integer(bytes: &[u8]) -> Option<i64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    let initial: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    Some(bytes.iter().fold(initial, |acc, &b| (acc << 8) | b as i64))
}

/// SNMP capture module.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnmpCapture;

impl SnmpCapture {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureModule for SnmpCapture {
    type Config = SnmpConfig;
    const PROTOCOL: Protocol = Protocol::Snmp;

    async fn start(&self, config: SnmpConfig) -> Result<StopHandle> {
        let port = config.bind_port;
        let addr = SocketAddr::new(config.bind_addr, port);
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| Error::bind(Self::PROTOCOL, port, e))?;

        info!(protocol = %Self::PROTOCOL, %addr, "SNMP capture listening");

        let stats = Arc::new(CaptureStats::new());
        let task_stats = Arc::clone(&stats);
        Ok(StopHandle::spawn(Self::PROTOCOL, port, stats, move |shutdown| {
            serve(socket, port, task_stats, shutdown)
        }))
    }
}

async fn serve(socket: UdpSocket, port: u16, stats: Arc<CaptureStats>, mut shutdown: ShutdownRx) {
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, peer)) => {
                    stats.record(peer);
                    log_datagram(&buf[..len], peer, port);
                }
                Err(e) => {
                    warn!(protocol = "snmp", port, error = %e, "Receive failed");
                    tokio::time::sleep(RECV_BACKOFF).await;
                }
            },
        }
    }

    drop(socket);
    debug!(protocol = "snmp", port, "SNMP capture released");
}

fn log_datagram(data: &[u8], peer: SocketAddr, port: u16) {
    match decode_message(data) {
        Some(SnmpMessage {
            version,
            community,
            pdu,
        }) => {
            info!(
                protocol = "snmp",
                %peer,
                port,
                %version,
                community = community.as_deref().unwrap_or("-"),
                pdu = %pdu.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
                "SNMP request"
            );
        }
        None => {
            info!(protocol = "snmp", %peer, port, bytes = data.len(), "Undecodable datagram");
        }
    }
}
