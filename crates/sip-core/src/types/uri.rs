//! # URIs
//!
//! [`Uri`] is a closed family of the URI kinds a SIP address can carry:
//!
//! - [`SipUri`] for `sip:` and `sips:`
//! - [`TelUrl`] for `tel:`
//! - [`GenericUri`] for any other scheme, kept as opaque text
//!
//! Callers branch on the variant with [`Uri::is_sip_uri`] and
//! [`Uri::is_tel_url`], or match on the enum directly.
//!
//! ```
//! use sipkit_sip_core::types::uri::Uri;
//!
//! let uri: Uri = "sips:alice@example.com:5061;transport=tcp".parse().unwrap();
//! assert!(uri.is_sip_uri());
//! assert!(uri.is_secure());
//! let sip = uri.as_sip().unwrap();
//! assert_eq!(sip.user(), Some("alice"));
//! assert_eq!(sip.port(), Some(5061));
//! assert_eq!(sip.transport(), Some("tcp"));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lexer::is_token_char;
use crate::types::host::{Host, HostPort};
use crate::types::name_value::{NameValue, NameValueList};
use crate::types::tel::{TelUrl, TelephoneNumber};

/// RFC 3261 `unreserved` characters.
pub fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '!' | '~' | '*' | '\'' | '(' | ')')
}

/// Characters allowed in a SIP user part.
pub fn is_user_char(c: char) -> bool {
    is_unreserved(c) || matches!(c, '%' | '&' | '=' | '+' | '$' | ',' | ';' | '?' | '/')
}

/// Characters allowed in a SIP password.
pub fn is_password_char(c: char) -> bool {
    is_unreserved(c) || matches!(c, '%' | '&' | '=' | '+' | '$' | ',')
}

/// Characters allowed in a URI parameter value.
pub fn is_param_char(c: char) -> bool {
    is_unreserved(c) || matches!(c, '%' | '[' | ']' | '/' | ':' | '&' | '+' | '$')
}

/// `scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
pub fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

fn check_parameter(name: &str, value: Option<&str>) -> Result<()> {
    if name.is_empty() || !name.chars().all(is_token_char) {
        return Err(Error::InvalidArgument(format!("illegal parameter name: {}", name)));
    }
    if let Some(v) = value {
        if v.is_empty() || !v.chars().all(is_param_char) {
            return Err(Error::InvalidArgument(format!("illegal parameter value: {}", v)));
        }
    }
    Ok(())
}

/// A `sip:` or `sips:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipUri {
    secure: bool,
    user: Option<String>,
    password: Option<String>,
    host_port: HostPort,
    parameters: NameValueList,
    headers: NameValueList,
}

impl SipUri {
    pub fn new(host_port: HostPort) -> Self {
        SipUri {
            secure: false,
            user: None,
            password: None,
            host_port,
            parameters: NameValueList::new(';'),
            headers: NameValueList::new('&'),
        }
    }

    pub(crate) fn from_parts(
        secure: bool,
        user: Option<String>,
        password: Option<String>,
        host_port: HostPort,
        parameters: NameValueList,
        headers: NameValueList,
    ) -> Self {
        SipUri {
            secure,
            user,
            password,
            host_port,
            parameters,
            headers,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "sips"
        } else {
            "sip"
        }
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Sets or clears the user part; clearing also drops the password.
    pub fn set_user(&mut self, user: Option<&str>) -> Result<()> {
        match user {
            Some(u) => {
                if u.is_empty() || !u.chars().all(is_user_char) {
                    return Err(Error::InvalidArgument(format!("illegal user: {}", u)));
                }
                self.user = Some(u.to_string());
            }
            None => {
                self.user = None;
                self.password = None;
            }
        }
        Ok(())
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn set_password(&mut self, password: Option<&str>) -> Result<()> {
        if let Some(p) = password {
            if self.user.is_none() {
                return Err(Error::IllegalState("password without user".into()));
            }
            if !p.chars().all(is_password_char) {
                return Err(Error::InvalidArgument(format!("illegal password: {}", p)));
            }
        }
        self.password = password.map(str::to_string);
        Ok(())
    }

    pub fn host(&self) -> &Host {
        &self.host_port.host
    }

    pub fn set_host(&mut self, host: &str) -> Result<()> {
        self.host_port.host = Host::new(host)?;
        Ok(())
    }

    pub fn host_port(&self) -> &HostPort {
        &self.host_port
    }

    pub fn port(&self) -> Option<u16> {
        self.host_port.port
    }

    pub fn set_port(&mut self, port: Option<u16>) {
        self.host_port.port = port;
    }

    pub fn parameters(&self) -> &NameValueList {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut NameValueList {
        &mut self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get_value(name)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.has(name)
    }

    /// Sets a URI parameter; `None` writes a bare flag such as `lr`.
    pub fn set_parameter(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        check_parameter(name, value)?;
        self.parameters.set(name, value);
        Ok(())
    }

    pub fn remove_parameter(&mut self, name: &str) -> Option<NameValue> {
        self.parameters.remove(name)
    }

    pub fn transport(&self) -> Option<&str> {
        self.parameter("transport")
    }

    pub fn set_transport(&mut self, transport: &str) -> Result<()> {
        self.set_parameter("transport", Some(transport))
    }

    pub fn method(&self) -> Option<&str> {
        self.parameter("method")
    }

    pub fn set_method(&mut self, method: &str) -> Result<()> {
        self.set_parameter("method", Some(method))
    }

    pub fn ttl(&self) -> Option<u8> {
        self.parameter("ttl").and_then(|t| t.parse().ok())
    }

    pub fn set_ttl(&mut self, ttl: u8) -> Result<()> {
        self.set_parameter("ttl", Some(&ttl.to_string()))
    }

    pub fn maddr(&self) -> Option<&str> {
        self.parameter("maddr")
    }

    pub fn set_maddr(&mut self, maddr: &str) -> Result<()> {
        Host::new(maddr)?;
        self.set_parameter("maddr", Some(maddr))
    }

    pub fn has_lr(&self) -> bool {
        self.has_parameter("lr")
    }

    pub fn set_lr(&mut self, lr: bool) {
        if lr {
            self.parameters.set("lr", None::<&str>);
        } else {
            self.parameters.remove("lr");
        }
    }

    /// Value of the `user` URI parameter, e.g. `phone` or `ip`.
    pub fn user_param(&self) -> Option<&str> {
        self.parameter("user")
    }

    pub fn set_user_param(&mut self, value: &str) -> Result<()> {
        self.set_parameter("user", Some(value))
    }

    pub fn headers(&self) -> &NameValueList {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get_value(name)
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || !name.chars().all(is_token_char) {
            return Err(Error::InvalidArgument(format!("illegal header name: {}", name)));
        }
        self.headers.set(name, Some(value));
        Ok(())
    }

    pub fn remove_header(&mut self, name: &str) -> Option<NameValue> {
        self.headers.remove(name)
    }

    /// The user part read as a telephone number when `user=phone` is set.
    pub fn telephone_subscriber(&self) -> Option<TelephoneNumber> {
        if !self.user_param()?.eq_ignore_ascii_case("phone") {
            return None;
        }
        self.user.as_deref()?.parse().ok()
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SipUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme())?;
        if let Some(user) = &self.user {
            f.write_str(user)?;
            if let Some(password) = &self.password {
                write!(f, ":{}", password)?;
            }
            f.write_str("@")?;
        }
        write!(f, "{}", self.host_port)?;
        if !self.parameters.is_empty() {
            write!(f, ";{}", self.parameters)?;
        }
        if !self.headers.is_empty() {
            write!(f, "?{}", self.headers)?;
        }
        Ok(())
    }
}

/// Any other scheme, kept as `scheme:opaque`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericUri {
    pub scheme: String,
    pub opaque: String,
}

impl GenericUri {
    pub fn new(scheme: &str, opaque: &str) -> Result<Self> {
        if !is_valid_scheme(scheme) {
            return Err(Error::InvalidArgument(format!("illegal scheme: {}", scheme)));
        }
        Ok(GenericUri {
            scheme: scheme.to_string(),
            opaque: opaque.to_string(),
        })
    }
}

impl fmt::Display for GenericUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.opaque)
    }
}

/// A URI whose kind is fixed when it is parsed or built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Uri {
    Sip(SipUri),
    Tel(TelUrl),
    Generic(GenericUri),
}

impl Uri {
    /// Parses a complete URI.
    pub fn parse(text: &str) -> Result<Self> {
        crate::parser::uri::parse_uri(text)
    }

    pub fn is_sip_uri(&self) -> bool {
        matches!(self, Uri::Sip(_))
    }

    pub fn is_tel_url(&self) -> bool {
        matches!(self, Uri::Tel(_))
    }

    /// True only for `sips:`.
    pub fn is_secure(&self) -> bool {
        matches!(self, Uri::Sip(sip) if sip.is_secure())
    }

    pub fn scheme(&self) -> &str {
        match self {
            Uri::Sip(sip) => sip.scheme(),
            Uri::Tel(_) => "tel",
            Uri::Generic(g) => &g.scheme,
        }
    }

    pub fn as_sip(&self) -> Option<&SipUri> {
        match self {
            Uri::Sip(sip) => Some(sip),
            _ => None,
        }
    }

    pub fn as_sip_mut(&mut self) -> Option<&mut SipUri> {
        match self {
            Uri::Sip(sip) => Some(sip),
            _ => None,
        }
    }

    pub fn as_tel(&self) -> Option<&TelUrl> {
        match self {
            Uri::Tel(tel) => Some(tel),
            _ => None,
        }
    }

    pub fn as_tel_mut(&mut self) -> Option<&mut TelUrl> {
        match self {
            Uri::Tel(tel) => Some(tel),
            _ => None,
        }
    }

    /// URI parameters; generic URIs have none.
    pub fn parameters(&self) -> Option<&NameValueList> {
        match self {
            Uri::Sip(sip) => Some(sip.parameters()),
            Uri::Tel(tel) => Some(&tel.number.parameters),
            Uri::Generic(_) => None,
        }
    }

    pub fn parameters_mut(&mut self) -> Option<&mut NameValueList> {
        match self {
            Uri::Sip(sip) => Some(sip.parameters_mut()),
            Uri::Tel(tel) => Some(&mut tel.number.parameters),
            Uri::Generic(_) => None,
        }
    }

    /// Validates then sets a parameter on a SIP URI or tel URL.
    pub fn set_parameter(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        check_parameter(name, value)?;
        match self.parameters_mut() {
            Some(params) => {
                params.set(name, value);
                Ok(())
            }
            None => Err(Error::InvalidArgument(format!(
                "{} URI has no parameters",
                self.scheme()
            ))),
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uri::Sip(sip) => write!(f, "{}", sip),
            Uri::Tel(tel) => write!(f, "{}", tel),
            Uri::Generic(g) => write!(f, "{}", g),
        }
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uri::parse(s)
    }
}

impl From<SipUri> for Uri {
    fn from(sip: SipUri) -> Self {
        Uri::Sip(sip)
    }
}

impl From<TelUrl> for Uri {
    fn from(tel: TelUrl) -> Self {
        Uri::Tel(tel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_queries() {
        let sip: Uri = "sip:bob@biloxi.com".parse().unwrap();
        assert!(sip.is_sip_uri() && !sip.is_tel_url() && !sip.is_secure());
        let tel: Uri = "tel:+1-201-555-0123".parse().unwrap();
        assert!(tel.is_tel_url());
        assert_eq!(tel.scheme(), "tel");
        let mail: Uri = "mailto:bob@biloxi.com".parse().unwrap();
        assert!(!mail.is_sip_uri() && !mail.is_tel_url());
        assert_eq!(mail.encode(), "mailto:bob@biloxi.com");
    }

    #[test]
    fn test_setters_validate() {
        let mut uri = SipUri::new("example.com".parse().unwrap());
        assert!(uri.set_user(Some("al ice")).is_err());
        assert_eq!(uri.user(), None);
        uri.set_user(Some("alice")).unwrap();
        assert!(uri.set_parameter("trans port", Some("udp")).is_err());
        assert!(uri.set_parameter("transport", Some("u\"dp")).is_err());
        uri.set_transport("udp").unwrap();
        uri.set_lr(true);
        assert_eq!(uri.encode(), "sip:alice@example.com;transport=udp;lr");
    }

    #[test]
    fn test_password_requires_user() {
        let mut uri = SipUri::new("example.com".parse().unwrap());
        assert!(matches!(uri.set_password(Some("x")), Err(Error::IllegalState(_))));
    }

    #[test]
    fn test_telephone_subscriber_needs_user_phone() {
        let uri: Uri = "sip:+1-212-555-1212;isub=1234@gateway.com;user=phone".parse().unwrap();
        let number = uri.as_sip().unwrap().telephone_subscriber().unwrap();
        assert!(number.global);
        assert_eq!(number.isdn_subaddress.as_deref(), Some("1234"));

        let uri: Uri = "sip:12125551212@gateway.com".parse().unwrap();
        assert!(uri.as_sip().unwrap().telephone_subscriber().is_none());
    }
}
