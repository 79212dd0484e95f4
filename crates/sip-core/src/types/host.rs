//! # Hosts
//!
//! A [`Host`] is classified exactly once, when it is built, as a hostname,
//! an IPv4 literal or an IPv6 literal. IPv6 literals are stored without
//! brackets and always encoded with them.
//!
//! ```
//! use sipkit_sip_core::types::host::{Host, HostKind};
//!
//! let host = Host::new("2001:db8::1").unwrap();
//! assert_eq!(host.kind(), HostKind::Ipv6);
//! assert_eq!(host.encode(), "[2001:db8::1]");
//! ```

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parser::host::{is_hostname, is_ipv4, parse_ipv6};

/// Classification of a host literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostKind {
    Hostname,
    Ipv4,
    Ipv6,
}

/// A hostname or IP literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host {
    text: String,
    kind: HostKind,
}

impl Host {
    /// Classifies `text`, trying IPv4, then hostname, then IPv6.
    pub fn new(text: &str) -> Result<Self> {
        let text = text.trim();
        if is_ipv4(text) {
            return Ok(Host {
                text: text.to_string(),
                kind: HostKind::Ipv4,
            });
        }
        if is_hostname(text) {
            return Ok(Host {
                text: text.to_string(),
                kind: HostKind::Hostname,
            });
        }
        if parse_ipv6(text).is_some() {
            return Ok(Host {
                text: text.trim_start_matches('[').trim_end_matches(']').to_string(),
                kind: HostKind::Ipv6,
            });
        }
        Err(Error::InvalidArgument(format!("illegal host: {}", text)))
    }

    pub fn kind(&self) -> HostKind {
        self.kind
    }

    /// Host text without IPv6 brackets.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_hostname(&self) -> bool {
        self.kind == HostKind::Hostname
    }

    pub fn is_ipv4(&self) -> bool {
        self.kind == HostKind::Ipv4
    }

    pub fn is_ipv6(&self) -> bool {
        self.kind == HostKind::Ipv6
    }

    pub fn is_ip_address(&self) -> bool {
        self.kind != HostKind::Hostname
    }

    pub fn ip_addr(&self) -> Option<IpAddr> {
        match self.kind {
            HostKind::Hostname => None,
            _ => self.text.parse().ok(),
        }
    }

    /// Wire form; IPv6 literals are bracketed.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            HostKind::Ipv6 => write!(f, "[{}]", self.text),
            _ => f.write_str(&self.text),
        }
    }
}

impl FromStr for Host {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Host::new(s)
    }
}

/// Validates a port given as a wider integer.
pub fn check_port(port: u32) -> Result<u16> {
    u16::try_from(port).map_err(|_| Error::InvalidArgument(format!("illegal port: {}", port)))
}

/// A host with an optional port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostPort {
    pub host: Host,
    pub port: Option<u16>,
}

impl HostPort {
    pub fn new(host: Host, port: Option<u16>) -> Self {
        HostPort { host, port }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

impl FromStr for HostPort {
    type Err = Error;

    /// Parses `host`, `host:port`, `[v6]` or `[v6]:port`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let end = rest
                .find(']')
                .ok_or_else(|| Error::InvalidArgument(format!("unterminated IPv6 reference: {}", s)))?;
            let port = match &rest[end + 1..] {
                "" => None,
                p => Some(
                    p.strip_prefix(':')
                        .ok_or_else(|| Error::InvalidArgument(format!("illegal host: {}", s)))?,
                ),
            };
            (&s[..end + 2], port)
        } else if s.matches(':').count() == 1 {
            match s.split_once(':') {
                Some((h, p)) => (h, Some(p)),
                None => (s, None),
            }
        } else {
            (s, None)
        };

        let port = match port {
            Some(p) => {
                let value: u32 = p
                    .parse()
                    .map_err(|_| Error::InvalidArgument(format!("illegal port: {}", p)))?;
                Some(check_port(value)?)
            }
            None => None,
        };
        Ok(HostPort::new(Host::new(host)?, port))
    }
}
