//! URI grammar: `sip:`/`sips:`, `tel:` and opaque schemes.

use tracing::trace;

use crate::error::{Error, Result};
use crate::lexer::{Keyword, Lexer, LexerMode};
use crate::parser::core::ParserCore;
use crate::types::host::{check_port, Host, HostPort};
use crate::types::name_value::NameValueList;
use crate::types::tel::{TelUrl, TelephoneNumber};
use crate::types::uri::{is_password_char, is_user_char, is_valid_scheme, GenericUri, SipUri, Uri};

/// Where a URI sits, which decides where it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriContext {
    /// The URI is the whole input.
    Standalone,
    /// Inside `<...>`; ends at `>`.
    Bracketed,
    /// Bare addr-spec in a header; `;` and `,` belong to the header.
    AddrSpec,
}

impl UriContext {
    fn is_terminator(&self, c: char) -> bool {
        match self {
            UriContext::Standalone => false,
            UriContext::Bracketed => c == '>',
            UriContext::AddrSpec => matches!(c, ';' | ',' | ' ' | '\t' | '\r' | '\n'),
        }
    }
}

/// Parses URIs, switching the borrowed lexer to `sip_url` mode.
pub struct UriParser<'a> {
    lexer: &'a mut Lexer,
}

impl ParserCore for UriParser<'_> {
    fn lexer(&mut self) -> &mut Lexer {
        &mut *self.lexer
    }
}

impl<'a> UriParser<'a> {
    /// Continues on a lexer positioned at the start of a URI.
    pub fn new(lexer: &'a mut Lexer) -> Self {
        lexer.select_lexer(LexerMode::SipUrl);
        UriParser { lexer }
    }

    /// Parses one URI ending where `context` says it does.
    pub fn uri(&mut self, context: UriContext) -> Result<Uri> {
        let scheme = self
            .lexer
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !is_valid_scheme(&scheme) {
            return Err(self.lexical_error("expected URI scheme").into());
        }
        self.expect_char(':')?;
        trace!(scheme = %scheme, "parsing uri");

        match self.lexer.lookup_keyword(&scheme) {
            Some(Keyword::Sip) => self.sip_uri(false, context).map(Uri::Sip),
            Some(Keyword::Sips) => self.sip_uri(true, context).map(Uri::Sip),
            Some(Keyword::Tel) => self.telephone_number(context).map(|n| Uri::Tel(TelUrl::new(n))),
            _ => {
                let opaque = self.lexer.take_while(|c| !context.is_terminator(c));
                if opaque.is_empty() {
                    return Err(self.lexical_error("empty URI").into());
                }
                Ok(Uri::Generic(GenericUri::new(&scheme, &opaque)?))
            }
        }
    }

    fn sip_uri(&mut self, secure: bool, context: UriContext) -> Result<SipUri> {
        let (user, password) = self.userinfo(context)?;
        let host_port = self.host_port()?;

        let mut parameters = NameValueList::new(';');
        let mut headers = NameValueList::new('&');
        if context != UriContext::AddrSpec {
            while self.lexer.look_ahead(0) == ';' {
                self.lexer.consume(1);
                parameters.add(self.name_value('=')?);
            }
            if self.lexer.look_ahead(0) == '?' {
                self.lexer.consume(1);
                loop {
                    headers.add(self.name_value('=')?);
                    if self.lexer.look_ahead(0) != '&' {
                        break;
                    }
                    self.lexer.consume(1);
                }
            }
        }
        Ok(SipUri::from_parts(secure, user, password, host_port, parameters, headers))
    }

    // Tries `user[:password]@`, rewinding when no `@` follows.
    fn userinfo(&mut self, context: UriContext) -> Result<(Option<String>, Option<String>)> {
        self.lexer.mark_input_position();
        let user = self
            .lexer
            .take_while(|c| is_user_char(c) && !(context == UriContext::AddrSpec && c == ','));
        let password = if self.lexer.look_ahead(0) == ':' {
            self.lexer.consume(1);
            Some(self.lexer.take_while(is_password_char))
        } else {
            None
        };
        if self.lexer.look_ahead(0) != '@' {
            self.lexer.rewind_input_position();
            return Ok((None, None));
        }
        if user.is_empty() {
            return Err(self.lexical_error("empty user part").into());
        }
        self.lexer.consume(1);
        Ok((Some(user), password))
    }

    fn host_port(&mut self) -> Result<HostPort> {
        let text = if self.lexer.look_ahead(0) == '[' {
            let mut text = self.lexer.get_next_token(']');
            self.expect_char(']')?;
            text.push(']');
            text
        } else {
            self.lexer
                .take_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        };
        if text.is_empty() {
            return Err(self.lexical_error("expected host").into());
        }
        let host = Host::new(&text)?;

        let port = if self.lexer.look_ahead(0) == ':' {
            self.lexer.consume(1);
            let digits = self.lexer.number()?;
            let value: u32 = digits
                .parse()
                .map_err(|_| Error::InvalidArgument(format!("illegal port: {}", digits)))?;
            Some(check_port(value)?)
        } else {
            None
        };
        Ok(HostPort::new(host, port))
    }

    /// `["+"] digits *( ";" param )`
    pub fn telephone_number(&mut self, context: UriContext) -> Result<TelephoneNumber> {
        let global = self.lexer.look_ahead(0) == '+';
        if global {
            self.lexer.consume(1);
        }
        let number = self.lexer.take_while(|c| {
            c.is_ascii_hexdigit() || matches!(c, '*' | '#' | '-' | '.' | '(' | ')')
        });
        TelephoneNumber::check_digits(global, &number)?;

        let mut tel = TelephoneNumber {
            global,
            number,
            isdn_subaddress: None,
            post_dial: None,
            parameters: NameValueList::new(';'),
        };
        if context == UriContext::AddrSpec {
            return Ok(tel);
        }
        while self.lexer.look_ahead(0) == ';' {
            self.lexer.consume(1);
            let nv = self.name_value('=')?;
            match nv.key().as_str() {
                "isub" => tel.isdn_subaddress = nv.value,
                "postd" => tel.post_dial = nv.value,
                _ => tel.parameters.add(nv),
            }
        }
        Ok(tel)
    }
}

/// Parses a complete URI; trailing input is an error.
pub fn parse_uri(text: &str) -> Result<Uri> {
    let mut lexer = Lexer::new(LexerMode::SipUrl, text.trim());
    let mut parser = UriParser::new(&mut lexer);
    let uri = parser.uri(UriContext::Standalone).map_err(|e| e.in_field("uri"))?;
    parser.expect_end("uri")?;
    Ok(uri)
}

/// Parses a telephone number with parameters, e.g. a `user=phone` user part.
pub fn parse_telephone_number(text: &str) -> Result<TelephoneNumber> {
    let mut lexer = Lexer::new(LexerMode::SipUrl, text.trim());
    let mut parser = UriParser::new(&mut lexer);
    let number = parser
        .telephone_number(UriContext::Standalone)
        .map_err(|e| e.in_field("telephone-subscriber"))?;
    parser.expect_end("telephone-subscriber")?;
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sip_uri() {
        let uri = parse_uri("sip:alice:secret@atlanta.com:5060;transport=tcp;lr?subject=project&priority=urgent").unwrap();
        let sip = uri.as_sip().unwrap();
        assert_eq!(sip.user(), Some("alice"));
        assert_eq!(sip.password(), Some("secret"));
        assert_eq!(sip.host().as_str(), "atlanta.com");
        assert_eq!(sip.port(), Some(5060));
        assert!(sip.has_lr());
        assert_eq!(sip.header("priority"), Some("urgent"));
        assert_eq!(
            uri.encode(),
            "sip:alice:secret@atlanta.com:5060;transport=tcp;lr?subject=project&priority=urgent"
        );
    }

    #[test]
    fn test_host_port_without_user_rewinds() {
        let uri = parse_uri("sip:atlanta.com:5070;maddr=239.255.255.1").unwrap();
        let sip = uri.as_sip().unwrap();
        assert_eq!(sip.user(), None);
        assert_eq!(sip.port(), Some(5070));
        assert_eq!(sip.maddr(), Some("239.255.255.1"));
    }

    #[test]
    fn test_ipv6_host() {
        let uri = parse_uri("sips:[2001:db8::10]:5061").unwrap();
        assert!(uri.is_secure());
        assert!(uri.as_sip().unwrap().host().is_ipv6());
        assert_eq!(uri.encode(), "sips:[2001:db8::10]:5061");
    }

    #[test]
    fn test_port_out_of_range_is_semantic() {
        assert!(matches!(parse_uri("sip:host:70000"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_tel_url_parameters() {
        let uri = parse_uri("tel:+1-201-555-0123;isub=99;postd=pp22;phone-context=example.com").unwrap();
        let tel = uri.as_tel().unwrap();
        assert!(tel.is_global());
        assert_eq!(tel.number.post_dial.as_deref(), Some("pp22"));
        assert_eq!(tel.number.phone_context(), Some("example.com"));
    }

    #[test]
    fn test_addr_spec_stops_at_header_params() {
        let mut lexer = Lexer::new(LexerMode::SipUrl, "sip:bob@biloxi.com;tag=a6c85cf");
        let uri = UriParser::new(&mut lexer).uri(UriContext::AddrSpec).unwrap();
        assert!(uri.parameters().unwrap().is_empty());
        assert_eq!(lexer.rest(), ";tag=a6c85cf");
    }

    #[test]
    fn test_garbage_is_grammar_error() {
        assert!(matches!(parse_uri("sip:"), Err(Error::Grammar { .. })));
        assert!(matches!(parse_uri("1sip:host"), Err(Error::Grammar { .. })));
        assert!(parse_uri("sip:host extra").is_err());
    }
}
