//! Header fields and the typed values the refresh machinery reads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lexer::{is_token_char, keyword_table, Keyword, LexerMode};
use crate::types::address::{Address, AddressKind};
use crate::types::method::Method;
use crate::types::name_value::NameValueList;

/// Canonical spelling of a header name; compact forms are expanded.
pub fn canonical_name(name: &str) -> String {
    match keyword_table(LexerMode::CommandKeyword).lookup(name) {
        Some(keyword) => keyword.as_str().to_string(),
        None => name.to_string(),
    }
}

/// A raw header field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    /// Builds a header, normalising the name.
    pub fn new(name: &str, value: impl Into<String>) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || !name.chars().all(is_token_char) {
            return Err(Error::InvalidArgument(format!("illegal header name: {}", name)));
        }
        Ok(Header {
            name: canonical_name(name),
            value: value.into().trim().to_string(),
        })
    }

    // For canonical names this crate writes itself; skips validation.
    pub(crate) fn known(name: &'static str, value: String) -> Self {
        Header {
            name: name.to_string(),
            value,
        }
    }

    /// Case-insensitive match, compact forms included.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(&canonical_name(name))
    }

    pub fn keyword(&self) -> Option<Keyword> {
        keyword_table(LexerMode::CommandKeyword).lookup(&self.name)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// `CSeq: <seq> <method>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CSeq {
    pub seq: u32,
    pub method: Method,
}

impl CSeq {
    pub fn new(seq: u32, method: Method) -> Self {
        CSeq { seq, method }
    }
}

impl fmt::Display for CSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.seq, self.method)
    }
}

impl FromStr for CSeq {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let (seq, method) = match (parts.next(), parts.next(), parts.next()) {
            (Some(seq), Some(method), None) => (seq, method),
            _ => return Err(Error::grammar_at("CSeq", "expected <seq> <method>", 0)),
        };
        let seq = seq
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("illegal CSeq number: {}", seq)))?;
        Ok(CSeq::new(seq, method.parse()?))
    }
}

/// One entry of a `Contact` header: an address with header parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactHeader {
    pub address: Address,
    pub parameters: NameValueList,
}

impl ContactHeader {
    pub fn new(address: Address) -> Self {
        ContactHeader {
            address,
            parameters: NameValueList::new(';'),
        }
    }

    /// Parses a comma-separated `Contact` value.
    pub fn parse_list(text: &str) -> Result<Vec<ContactHeader>> {
        crate::parser::address::parse_contact_list(text)
    }

    pub fn is_wildcard(&self) -> bool {
        self.address.is_wildcard()
    }

    /// The `expires` header parameter.
    pub fn expires(&self) -> Option<u32> {
        self.parameters.get_value("expires")?.parse().ok()
    }

    pub fn set_expires(&mut self, expires: Option<u32>) {
        match expires {
            Some(e) => self.parameters.set("expires", Some(e.to_string())),
            None => {
                self.parameters.remove("expires");
            }
        }
    }

    pub fn q(&self) -> Option<f32> {
        self.parameters.get_value("q")?.parse().ok()
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ContactHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A bare URI carrying its own parameters must be bracketed, or they
        // would read as header parameters.
        let needs_brackets = self.address.kind() == AddressKind::AddressSpec
            && self
                .address
                .uri()
                .map(|u| {
                    u.parameters().map(|p| !p.is_empty()).unwrap_or(false)
                        || u.as_sip().map(|s| !s.headers().is_empty()).unwrap_or(false)
                })
                .unwrap_or(false);
        match (needs_brackets, self.address.uri()) {
            (true, Some(uri)) => write!(f, "<{}>", uri)?,
            _ => write!(f, "{}", self.address)?,
        }
        if !self.parameters.is_empty() {
            write!(f, ";{}", self.parameters)?;
        }
        Ok(())
    }
}

/// Joins contacts into one header value.
pub fn encode_contact_list(contacts: &[ContactHeader]) -> String {
    contacts
        .iter()
        .map(ContactHeader::encode)
        .collect::<Vec<_>>()
        .join(", ")
}
