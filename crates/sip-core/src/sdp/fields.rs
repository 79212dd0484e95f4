//! # SDP fields
//!
//! One type per SDP line (RFC 4566), wrapped by [`SdpField`]. Each type's
//! `Display` renders the value part; [`SdpField::encode`] renders the full
//! `<tag>=<value>\r\n` line.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::host::Host;

/// Unit suffix of a typed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    pub fn from_suffix(c: char) -> Option<Self> {
        match c {
            'd' => Some(TimeUnit::Days),
            'h' => Some(TimeUnit::Hours),
            'm' => Some(TimeUnit::Minutes),
            's' => Some(TimeUnit::Seconds),
            _ => None,
        }
    }

    pub fn suffix(&self) -> char {
        match self {
            TimeUnit::Days => 'd',
            TimeUnit::Hours => 'h',
            TimeUnit::Minutes => 'm',
            TimeUnit::Seconds => 's',
        }
    }

    /// Seconds per unit.
    pub fn seconds(&self) -> i64 {
        match self {
            TimeUnit::Days => 86_400,
            TimeUnit::Hours => 3_600,
            TimeUnit::Minutes => 60,
            TimeUnit::Seconds => 1,
        }
    }
}

/// A number of time units, e.g. `7d` or `-1h`; a bare number is seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedTime {
    pub amount: i64,
    pub unit: Option<TimeUnit>,
}

impl TypedTime {
    pub fn new(amount: i64, unit: Option<TimeUnit>) -> Self {
        TypedTime { amount, unit }
    }

    /// Value in seconds, or `None` when it does not fit in an `i64`.
    pub fn seconds(&self) -> Option<i64> {
        self.amount
            .checked_mul(self.unit.map(|u| u.seconds()).unwrap_or(1))
    }
}

impl fmt::Display for TypedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount)?;
        if let Some(unit) = self.unit {
            write!(f, "{}", unit.suffix())?;
        }
        Ok(())
    }
}

/// `v=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtoVersion {
    pub version: u32,
}

/// `o=<username> <sess-id> <sess-version> <nettype> <addrtype> <unicast-address>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub username: String,
    pub session_id: u64,
    pub session_version: u64,
    pub nettype: String,
    pub addrtype: String,
    pub address: Host,
}

/// `s=`, `i=` and `u=` carry free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionName(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Information(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriField(pub String);

/// `e=`, either `addr (Name)` or `Name <addr>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub address: String,
    pub display_name: Option<String>,
}

/// `p=`, same two forms as `e=`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    pub number: String,
    pub display_name: Option<String>,
}

/// `c=<nettype> <addrtype> <connection-address>[/<ttl>][/<count>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub nettype: String,
    pub addrtype: String,
    pub address: Host,
    pub ttl: Option<u8>,
    pub address_count: Option<u32>,
}

impl Connection {
    pub fn new(addrtype: &str, address: Host) -> Self {
        Connection {
            nettype: "IN".to_string(),
            addrtype: addrtype.to_string(),
            address,
            ttl: None,
            address_count: None,
        }
    }
}

/// `b=<bwtype>:<bandwidth>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bandwidth {
    pub bwtype: String,
    pub value: u64,
}

/// `t=<start> <stop>`, NTP seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time {
    pub start: u64,
    pub stop: u64,
}

/// `r=<interval> <active duration> <offsets...>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repeat {
    pub interval: TypedTime,
    pub active_duration: TypedTime,
    pub offsets: Vec<TypedTime>,
}

/// One `<adjustment time> <offset>` pair of a `z=` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneAdjustment {
    pub time: u64,
    pub offset: TypedTime,
}

/// `z=`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub adjustments: Vec<ZoneAdjustment>,
}

/// `k=<method>[:<key>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub method: String,
    pub key: Option<String>,
}

/// `a=<name>[:<value>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(name: &str, value: Option<&str>) -> Self {
        Attribute {
            name: name.to_string(),
            value: value.map(str::to_string),
        }
    }
}

/// `m=<media> <port>[/<count>] <proto> <fmt> ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub media: String,
    pub port: u16,
    pub port_count: Option<u32>,
    pub protocol: String,
    pub formats: Vec<String>,
}

impl fmt::Display for ProtoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.username,
            self.session_id,
            self.session_version,
            self.nettype,
            self.addrtype,
            self.address.as_str()
        )
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Information {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UriField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} ({})", self.address, name),
            None => f.write_str(&self.address),
        }
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} ({})", self.number, name),
            None => f.write_str(&self.number),
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SDP writes IPv6 addresses without brackets.
        write!(f, "{} {} {}", self.nettype, self.addrtype, self.address.as_str())?;
        if let Some(ttl) = self.ttl {
            write!(f, "/{}", ttl)?;
        }
        if let Some(count) = self.address_count {
            write!(f, "/{}", count)?;
        }
        Ok(())
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bwtype, self.value)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.start, self.stop)
    }
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.interval, self.active_duration)?;
        for offset in &self.offsets {
            write!(f, " {}", offset)?;
        }
        Ok(())
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, adj) in self.adjustments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{} {}", adj.time, adj.offset)?;
        }
        Ok(())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.method)?;
        if let Some(key) = &self.key {
            write!(f, ":{}", key)?;
        }
        Ok(())
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(value) = &self.value {
            write!(f, ":{}", value)?;
        }
        Ok(())
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.media, self.port)?;
        if let Some(count) = self.port_count {
            write!(f, "/{}", count)?;
        }
        write!(f, " {}", self.protocol)?;
        for format in &self.formats {
            write!(f, " {}", format)?;
        }
        Ok(())
    }
}

/// Any single SDP line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdpField {
    Version(ProtoVersion),
    Origin(Origin),
    SessionName(SessionName),
    Information(Information),
    Uri(UriField),
    Email(Email),
    Phone(Phone),
    Connection(Connection),
    Bandwidth(Bandwidth),
    Time(Time),
    Repeat(Repeat),
    Zone(Zone),
    Key(Key),
    Attribute(Attribute),
    Media(Media),
}

impl SdpField {
    /// The one-letter line type.
    pub fn tag(&self) -> char {
        match self {
            SdpField::Version(_) => 'v',
            SdpField::Origin(_) => 'o',
            SdpField::SessionName(_) => 's',
            SdpField::Information(_) => 'i',
            SdpField::Uri(_) => 'u',
            SdpField::Email(_) => 'e',
            SdpField::Phone(_) => 'p',
            SdpField::Connection(_) => 'c',
            SdpField::Bandwidth(_) => 'b',
            SdpField::Time(_) => 't',
            SdpField::Repeat(_) => 'r',
            SdpField::Zone(_) => 'z',
            SdpField::Key(_) => 'k',
            SdpField::Attribute(_) => 'a',
            SdpField::Media(_) => 'm',
        }
    }

    /// The value part, without tag or line ending.
    pub fn value(&self) -> String {
        match self {
            SdpField::Version(v) => v.to_string(),
            SdpField::Origin(v) => v.to_string(),
            SdpField::SessionName(v) => v.to_string(),
            SdpField::Information(v) => v.to_string(),
            SdpField::Uri(v) => v.to_string(),
            SdpField::Email(v) => v.to_string(),
            SdpField::Phone(v) => v.to_string(),
            SdpField::Connection(v) => v.to_string(),
            SdpField::Bandwidth(v) => v.to_string(),
            SdpField::Time(v) => v.to_string(),
            SdpField::Repeat(v) => v.to_string(),
            SdpField::Zone(v) => v.to_string(),
            SdpField::Key(v) => v.to_string(),
            SdpField::Attribute(v) => v.to_string(),
            SdpField::Media(v) => v.to_string(),
        }
    }

    /// `<tag>=<value>\r\n`
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SdpField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}\r\n", self.tag(), self.value())
    }
}
