//! # SIP addresses
//!
//! An [`Address`] is what appears in `From`, `To` and `Contact` headers: a
//! URI, optionally with a display name, or the special `*` wildcard used to
//! remove every binding of a registration.
//!
//! ```
//! use sipkit_sip_core::types::address::{Address, AddressKind};
//!
//! let mut addr: Address = "sip:alice@atlanta.com".parse().unwrap();
//! assert_eq!(addr.kind(), AddressKind::AddressSpec);
//! addr.set_display_name(Some("Alice")).unwrap();
//! addr.set_port(5070).unwrap();
//! assert_eq!(addr.encode(), "\"Alice\" <sip:alice@atlanta.com:5070>");
//!
//! let mut wildcard: Address = "*".parse().unwrap();
//! assert!(wildcard.set_user(Some("bob")).is_err());
//! ```
//!
//! Setters validate their input before touching the address, so a rejected
//! value leaves it exactly as it was.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::host::{check_port, Host};
use crate::types::name_value::NameValue;
use crate::types::tel::TelephoneNumber;
use crate::types::uri::{is_valid_scheme, GenericUri, SipUri, Uri};

/// The three shapes an address can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    /// `["display"] <uri>`
    NameAddr,
    /// Bare URI
    AddressSpec,
    /// `*`
    WildCard,
}

/// A display name and URI, or the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    kind: AddressKind,
    display_name: Option<String>,
    uri: Option<Uri>,
}

impl Address {
    /// A bare `addr-spec` address.
    pub fn new(uri: Uri) -> Self {
        Address {
            kind: AddressKind::AddressSpec,
            display_name: None,
            uri: Some(uri),
        }
    }

    /// A `name-addr` address.
    pub fn name_addr(display_name: Option<&str>, uri: Uri) -> Result<Self> {
        if let Some(name) = display_name {
            check_display_name(name)?;
        }
        Ok(Address {
            kind: AddressKind::NameAddr,
            display_name: display_name.map(str::to_string),
            uri: Some(uri),
        })
    }

    /// The `*` address.
    pub fn wildcard() -> Self {
        Address {
            kind: AddressKind::WildCard,
            display_name: None,
            uri: None,
        }
    }

    /// Parses an address in any of the three forms.
    pub fn parse(text: &str) -> Result<Self> {
        crate::parser::address::parse_address(text)
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn is_wildcard(&self) -> bool {
        self.kind == AddressKind::WildCard
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.is_wildcard() {
            Err(Error::ImmutableWildcard)
        } else {
            Ok(())
        }
    }

    fn uri_mut(&mut self) -> Result<&mut Uri> {
        self.ensure_mutable()?;
        self.uri
            .as_mut()
            .ok_or_else(|| Error::IllegalState("address has no URI".into()))
    }

    fn sip_mut(&mut self) -> Result<&mut SipUri> {
        let uri = self.uri_mut()?;
        let scheme = uri.scheme().to_string();
        uri.as_sip_mut()
            .ok_or_else(|| Error::InvalidArgument(format!("{} URI has no host", scheme)))
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Sets the display name; an addr-spec becomes a name-addr.
    pub fn set_display_name(&mut self, name: Option<&str>) -> Result<()> {
        self.ensure_mutable()?;
        if let Some(n) = name {
            check_display_name(n)?;
            self.kind = AddressKind::NameAddr;
        }
        self.display_name = name.map(str::to_string);
        Ok(())
    }

    pub fn scheme(&self) -> Option<&str> {
        self.uri.as_ref().map(Uri::scheme)
    }

    /// Switches between `sip` and `sips`, or renames an opaque scheme.
    pub fn set_scheme(&mut self, scheme: &str) -> Result<()> {
        let uri = self.uri_mut()?;
        if !is_valid_scheme(scheme) {
            return Err(Error::InvalidArgument(format!("illegal scheme: {}", scheme)));
        }
        let lower = scheme.to_ascii_lowercase();
        match uri {
            Uri::Sip(sip) if lower == "sip" || lower == "sips" => {
                sip.set_secure(lower == "sips");
                Ok(())
            }
            Uri::Tel(_) if lower == "tel" => Ok(()),
            Uri::Generic(g) if !matches!(lower.as_str(), "sip" | "sips" | "tel") => {
                g.scheme = scheme.to_string();
                Ok(())
            }
            other => Err(Error::InvalidArgument(format!(
                "cannot change scheme {} to {}",
                other.scheme(),
                scheme
            ))),
        }
    }

    /// User part of a SIP URI, or the number of a tel URL.
    pub fn user(&self) -> Option<String> {
        match self.uri.as_ref()? {
            Uri::Sip(sip) => sip.user().map(str::to_string),
            Uri::Tel(tel) => Some(format!(
                "{}{}",
                if tel.number.global { "+" } else { "" },
                tel.number.number
            )),
            Uri::Generic(_) => None,
        }
    }

    pub fn set_user(&mut self, user: Option<&str>) -> Result<()> {
        match self.uri_mut()? {
            Uri::Sip(sip) => sip.set_user(user),
            Uri::Tel(tel) => {
                let text = user.ok_or_else(|| {
                    Error::InvalidArgument("tel URL requires a number".into())
                })?;
                let number = TelephoneNumber::new(text)?;
                tel.number.global = number.global;
                tel.number.number = number.number;
                Ok(())
            }
            Uri::Generic(g) => Err(Error::InvalidArgument(format!("{} URI has no user", g.scheme))),
        }
    }

    pub fn uri(&self) -> Option<&Uri> {
        self.uri.as_ref()
    }

    /// Replaces the URI by parsing `text`.
    ///
    /// URI parameters of the old URI that the new text does not mention are
    /// carried over to the new URI.
    pub fn set_uri(&mut self, text: &str) -> Result<()> {
        self.ensure_mutable()?;
        let mut uri = Uri::parse(text)?;
        if let (Some(old), Some(new)) = (
            self.uri.as_ref().and_then(Uri::parameters),
            uri.parameters_mut(),
        ) {
            for nv in old {
                if !new.has(&nv.name) {
                    new.add(nv.clone());
                }
            }
        }
        self.uri = Some(uri);
        Ok(())
    }

    pub fn host(&self) -> Option<&Host> {
        self.uri.as_ref()?.as_sip().map(SipUri::host)
    }

    pub fn set_host(&mut self, host: &str) -> Result<()> {
        self.ensure_mutable()?;
        let parsed = Host::new(host)?;
        let sip = self.sip_mut()?;
        sip.set_host(parsed.as_str())
    }

    /// Port of a SIP URI; 0 when unset.
    pub fn port(&self) -> u16 {
        self.uri
            .as_ref()
            .and_then(Uri::as_sip)
            .and_then(SipUri::port)
            .unwrap_or(0)
    }

    /// Sets the port; 0 removes it, values above 65535 are rejected.
    pub fn set_port(&mut self, port: u32) -> Result<()> {
        self.ensure_mutable()?;
        let port = check_port(port)?;
        let sip = self.sip_mut()?;
        sip.set_port(if port == 0 { None } else { Some(port) });
        Ok(())
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.uri.as_ref()?.parameters()?.get_value(name)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.uri
            .as_ref()
            .and_then(Uri::parameters)
            .map(|p| p.has(name))
            .unwrap_or(false)
    }

    pub fn set_parameter(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        self.uri_mut()?.set_parameter(name, value)
    }

    pub fn remove_parameter(&mut self, name: &str) -> Result<Option<NameValue>> {
        let uri = self.uri_mut()?;
        Ok(uri.parameters_mut().and_then(|p| p.remove(name)))
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.uri
            .as_ref()
            .and_then(Uri::parameters)
            .map(|p| p.names())
            .unwrap_or_default()
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

fn check_display_name(name: &str) -> Result<()> {
    let mut escaped = false;
    for c in name.chars() {
        match c {
            '\r' | '\n' => {
                return Err(Error::InvalidArgument(format!("illegal display name: {:?}", name)))
            }
            '"' if !escaped => {
                return Err(Error::InvalidArgument(format!("illegal display name: {:?}", name)))
            }
            _ => {}
        }
        escaped = c == '\\' && !escaped;
    }
    if escaped {
        return Err(Error::InvalidArgument(format!("illegal display name: {:?}", name)));
    }
    Ok(())
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let uri = match (&self.kind, &self.uri) {
            (AddressKind::WildCard, _) | (_, None) => return f.write_str("*"),
            (_, Some(uri)) => uri,
        };
        match self.kind {
            AddressKind::AddressSpec => write!(f, "{}", uri),
            _ => match &self.display_name {
                Some(name) => write!(f, "\"{}\" <{}>", name, uri),
                None => write!(f, "<{}>", uri),
            },
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl From<Uri> for Address {
    fn from(uri: Uri) -> Self {
        Address::new(uri)
    }
}

impl From<GenericUri> for Address {
    fn from(uri: GenericUri) -> Self {
        Address::new(Uri::Generic(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_getters_are_empty() {
        let addr = Address::wildcard();
        assert_eq!(addr.display_name(), None);
        assert_eq!(addr.user(), None);
        assert_eq!(addr.host(), None);
        assert_eq!(addr.port(), 0);
        assert!(addr.parameter_names().is_empty());
        assert_eq!(addr.encode(), "*");
    }

    #[test]
    fn test_wildcard_rejects_every_mutator() {
        let mut addr = Address::wildcard();
        assert_eq!(addr.set_display_name(Some("x")), Err(Error::ImmutableWildcard));
        assert_eq!(addr.set_scheme("sip"), Err(Error::ImmutableWildcard));
        assert_eq!(addr.set_user(Some("x")), Err(Error::ImmutableWildcard));
        assert_eq!(addr.set_uri("sip:a@b.com"), Err(Error::ImmutableWildcard));
        assert_eq!(addr.set_host("b.com"), Err(Error::ImmutableWildcard));
        assert_eq!(addr.set_port(5060), Err(Error::ImmutableWildcard));
        assert_eq!(addr.set_parameter("lr", None), Err(Error::ImmutableWildcard));
        assert_eq!(addr.remove_parameter("lr"), Err(Error::ImmutableWildcard));
        assert_eq!(addr, Address::wildcard());
    }

    #[test]
    fn test_set_port_zero_removes_and_large_rejected() {
        let mut addr: Address = "sip:alice@atlanta.com:5060".parse().unwrap();
        assert!(matches!(addr.set_port(65536), Err(Error::InvalidArgument(_))));
        assert_eq!(addr.port(), 5060);
        addr.set_port(0).unwrap();
        assert_eq!(addr.port(), 0);
        assert_eq!(addr.encode(), "sip:alice@atlanta.com");
    }

    #[test]
    fn test_set_uri_copies_parameters_forward() {
        let mut addr: Address = "<sip:alice@atlanta.com;transport=tcp;lr>".parse().unwrap();
        addr.set_uri("sip:alice@biloxi.com;lr;ttl=4").unwrap();
        let names = addr.parameter_names();
        assert_eq!(names, vec!["lr", "ttl", "transport"]);
        assert_eq!(addr.parameter("transport"), Some("tcp"));
        assert_eq!(addr.host().unwrap().as_str(), "biloxi.com");
    }

    #[test]
    fn test_semantic_errors_leave_address_unchanged() {
        let mut addr: Address = "\"Bob\" <sip:bob@biloxi.com>".parse().unwrap();
        let before = addr.clone();
        assert!(addr.set_host("bad host").is_err());
        assert!(addr.set_scheme("1abc").is_err());
        assert!(addr.set_scheme("tel").is_err());
        assert!(addr.set_user(Some("b@d")).is_err());
        assert!(addr.set_parameter("x y", Some("1")).is_err());
        assert!(addr.set_display_name(Some("un\"quoted")).is_err());
        assert!(addr.set_uri("not a uri").is_err());
        assert_eq!(addr, before);
    }

    #[test]
    fn test_host_on_tel_url_is_rejected() {
        let mut addr: Address = "tel:+15551234".parse().unwrap();
        assert!(matches!(addr.set_host("example.com"), Err(Error::InvalidArgument(_))));
        assert!(matches!(addr.set_port(5060), Err(Error::InvalidArgument(_))));
        addr.set_user(Some("+15559999")).unwrap();
        assert_eq!(addr.encode(), "tel:+15559999");
    }

    #[test]
    fn test_display_name_promotes_addr_spec() {
        let mut addr: Address = "sips:carol@chicago.com".parse().unwrap();
        addr.set_display_name(Some("Carol")).unwrap();
        assert_eq!(addr.kind(), AddressKind::NameAddr);
        addr.set_scheme("sip").unwrap();
        assert_eq!(addr.encode(), "\"Carol\" <sip:carol@chicago.com>");
    }
}
