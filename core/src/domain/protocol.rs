//! Supported capture protocols and protocol selection.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Transport a capture protocol listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
    Udp,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Tcp => write!(f, "tcp"),
            Transport::Udp => write!(f, "udp"),
        }
    }
}

/// A protocol with a capture module behind it.
///
/// The set is closed: adding a protocol means adding a variant here, a
/// [`crate::domain::ModuleConfig`] shape and a capture module adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Snmp,
    Ssh,
}

impl Protocol {
    /// All supported protocols, in startup order.
    pub const ALL: [Protocol; 2] = [Protocol::Snmp, Protocol::Ssh];

    /// Name used on the command line and in configuration (case-sensitive).
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Snmp => "snmp",
            Protocol::Ssh => "ssh",
        }
    }

    pub fn transport(&self) -> Transport {
        match self {
            Protocol::Snmp => Transport::Udp,
            Protocol::Ssh => Transport::Tcp,
        }
    }

    /// Port spec used when none is configured.
    pub fn default_ports(&self) -> &'static str {
        match self {
            Protocol::Snmp => "161",
            Protocol::Ssh => "22",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a name matches no protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProtocol(pub String);

impl std::fmt::Display for UnknownProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown protocol {:?}", self.0)
    }
}

impl std::error::Error for UnknownProtocol {}

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownProtocol(s.to_string()))
    }
}

/// Split a comma-separated protocol list into trimmed, non-empty names.
pub fn parse_protocol_names(list: &str) -> HashSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Select the protocols named in a comma-separated list.
///
/// Names are matched exactly; unknown names are logged and ignored. The
/// result follows [`Protocol::ALL`] order and may be empty.
pub fn select_protocols(list: &str) -> Vec<Protocol> {
    let requested = parse_protocol_names(list);

    for name in &requested {
        if name.parse::<Protocol>().is_err() {
            warn!(protocol = %name, "Ignoring unsupported protocol");
        }
    }

    Protocol::ALL
        .into_iter()
        .filter(|p| requested.contains(p.name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_with_whitespace() {
        assert_eq!(
            select_protocols("ssh, snmp"),
            vec![Protocol::Snmp, Protocol::Ssh]
        );
    }

    #[test]
    fn test_select_is_case_sensitive() {
        assert!(select_protocols("SSH").is_empty());
        assert_eq!(select_protocols("SSH,snmp"), vec![Protocol::Snmp]);
    }

    #[test]
    fn test_unknown_and_empty_names_are_ignored() {
        assert!(select_protocols("telnet").is_empty());
        assert!(select_protocols("").is_empty());
        assert_eq!(select_protocols(",ssh,,telnet, "), vec![Protocol::Ssh]);
    }

    #[test]
    fn test_duplicates_select_once() {
        assert_eq!(select_protocols("ssh,ssh , ssh"), vec![Protocol::Ssh]);
    }

    #[test]
    fn test_parse_protocol_names() {
        let names = parse_protocol_names(" ssh ,snmp,, ");
        assert_eq!(names.len(), 2);
        assert!(names.contains("ssh"));
        assert!(names.contains("snmp"));
    }

    #[test]
    fn test_from_str_and_display() {
        assert_eq!("snmp".parse::<Protocol>(), Ok(Protocol::Snmp));
        assert_eq!(
            "Snmp".parse::<Protocol>(),
            Err(UnknownProtocol("Snmp".to_string()))
        );
        assert_eq!(Protocol::Ssh.to_string(), "ssh");
        assert_eq!(Protocol::Ssh.transport(), Transport::Tcp);
        assert_eq!(Protocol::Snmp.transport(), Transport::Udp);
    }
}
