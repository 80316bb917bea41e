//! Port specification resolution.
//!
//! A port spec is a comma-separated list of single ports and inclusive
//! `low-high` ranges, e.g. `"22,2222-2224"`.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lowest bindable port accepted in a spec.
pub const MIN_PORT: u32 = 1;

/// Highest port accepted in a spec.
pub const MAX_PORT: u32 = 65535;

/// An ordered sequence of distinct ports resolved from a port spec.
///
/// Ports keep the order in which they first appeared in the spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortSet {
    ports: Vec<u16>,
}

impl PortSet {
    /// Resolve a textual port spec into a deduplicated port set.
    ///
    /// Fails with [`Error::InvalidPortSpec`] if any token is empty,
    /// non-numeric, a reversed range, or outside 1-65535.
    pub fn resolve(spec: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidPortSpec {
            protocol: None,
            spec: spec.to_string(),
            reason,
        };

        let mut seen = HashSet::new();
        let mut ports = Vec::new();

        for token in spec.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(invalid("empty entry".to_string()));
            }

            let (low, high) = match token.split_once('-') {
                Some((low, high)) => {
                    let low = parse_port(low.trim()).map_err(&invalid)?;
                    let high = parse_port(high.trim()).map_err(&invalid)?;
                    if low > high {
                        return Err(invalid(format!("range {} is reversed", token)));
                    }
                    (low, high)
                }
                None => {
                    let port = parse_port(token).map_err(&invalid)?;
                    (port, port)
                }
            };

            for port in low..=high {
                if seen.insert(port) {
                    ports.push(port);
                }
            }
        }

        Ok(Self { ports })
    }

    /// Ports in first-seen order.
    pub fn as_slice(&self) -> &[u16] {
        &self.ports
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains(&port)
    }
}

impl FromStr for PortSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s)
    }
}

impl<'a> IntoIterator for &'a PortSet {
    type Item = &'a u16;
    type IntoIter = std::slice::Iter<'a, u16>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.iter()
    }
}

impl std::fmt::Display for PortSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{}", joined)
    }
}

/// Parse one port value, accepting plain decimal digits only.
fn parse_port(value: &str) -> std::result::Result<u16, String> {
    if value.is_empty() {
        return Err("missing port number".to_string());
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{:?} is not a number", value));
    }

    let port: u32 = value
        .parse()
        .map_err(|_| format!("{} is out of range ({}-{})", value, MIN_PORT, MAX_PORT))?;

    if !(MIN_PORT..=MAX_PORT).contains(&port) {
        return Err(format!(
            "{} is out of range ({}-{})",
            value, MIN_PORT, MAX_PORT
        ));
    }

    Ok(port as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(spec: &str) {
        match PortSet::resolve(spec) {
            Err(Error::InvalidPortSpec { spec: s, .. }) => assert_eq!(s, spec),
            other => panic!("expected InvalidPortSpec for {:?}, got {:?}", spec, other),
        }
    }

    #[test]
    fn test_single_port() {
        let set = PortSet::resolve("22").unwrap();
        assert_eq!(set.as_slice(), &[22]);
    }

    #[test]
    fn test_ranges_and_dedup_keep_first_seen_order() {
        let set = PortSet::resolve("22,2222-2224,22").unwrap();
        assert_eq!(set.as_slice(), &[22, 2222, 2223, 2224]);
    }

    #[test]
    fn test_overlapping_ranges_are_skipped_silently() {
        let set = PortSet::resolve("10-12, 11-14 ,9").unwrap();
        assert_eq!(set.as_slice(), &[10, 11, 12, 13, 14, 9]);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let set = PortSet::resolve(" 161 , 162 - 163 ").unwrap();
        assert_eq!(set.as_slice(), &[161, 162, 163]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let set = PortSet::resolve("1,65535").unwrap();
        assert_eq!(set.as_slice(), &[1, 65535]);

        let set = PortSet::resolve("65534-65535").unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_single_value_range() {
        let set = PortSet::resolve("80-80").unwrap();
        assert_eq!(set.as_slice(), &[80]);
    }

    #[test]
    fn test_invalid_specs() {
        assert_invalid("");
        assert_invalid("22,");
        assert_invalid("22,,23");
        assert_invalid("ssh");
        assert_invalid("10-5");
        assert_invalid("0");
        assert_invalid("70000");
        assert_invalid("99999999999");
        assert_invalid("-5");
        assert_invalid("5-");
        assert_invalid("+22");
        assert_invalid("1-2-3");
        assert_invalid("0-10");
    }

    #[test]
    fn test_display_and_from_str() {
        let set: PortSet = "2222-2223,22".parse().unwrap();
        assert_eq!(set.to_string(), "2222,2223,22");
        assert!(set.contains(22));
        assert!(!set.contains(2224));
    }
}
