//! Address grammar: `name-addr`, `addr-spec` and `*`, plus header parameter lists.

use crate::error::Result;
use crate::lexer::{Lexer, LexerMode};
use crate::parser::core::ParserCore;
use crate::parser::uri::{UriContext, UriParser};
use crate::types::address::Address;
use crate::types::header::ContactHeader;
use crate::types::name_value::NameValueList;

/// Parses addresses from a borrowed lexer.
pub struct AddressParser<'a> {
    lexer: &'a mut Lexer,
}

impl ParserCore for AddressParser<'_> {
    fn lexer(&mut self) -> &mut Lexer {
        &mut *self.lexer
    }
}

impl<'a> AddressParser<'a> {
    pub fn new(lexer: &'a mut Lexer) -> Self {
        AddressParser { lexer }
    }

    /// Parses one address. `bare` decides where an unbracketed URI ends.
    pub fn address(&mut self, bare: UriContext) -> Result<Address> {
        self.skip_ws();
        match self.lexer.look_ahead(0) {
            '*' => {
                self.lexer.consume(1);
                Ok(Address::wildcard())
            }
            '"' => {
                let display = self.lexer.quoted_string()?;
                self.skip_ws();
                let uri = self.bracketed_uri()?;
                Address::name_addr(Some(&display), uri)
            }
            '<' => {
                let uri = self.bracketed_uri()?;
                Address::name_addr(None, uri)
            }
            _ => {
                // Unquoted display name or a bare URI; only `<` tells them apart.
                let start = self.lexer.position();
                let display = self.lexer.ttoken_allow_space();
                let display = display.trim();
                if self.lexer.look_ahead(0) == '<' && !display.is_empty() {
                    let display = display.to_string();
                    let uri = self.bracketed_uri()?;
                    return Address::name_addr(Some(&display), uri);
                }
                self.lexer.rewind_to(start);
                let uri = UriParser::new(&mut *self.lexer).uri(bare)?;
                Ok(Address::new(uri))
            }
        }
    }

    fn bracketed_uri(&mut self) -> Result<crate::types::uri::Uri> {
        self.expect_char('<')?;
        let uri = UriParser::new(&mut *self.lexer).uri(UriContext::Bracketed)?;
        self.expect_char('>')?;
        Ok(uri)
    }

    /// `*( ";" name[=value] )` after an address.
    pub fn header_parameters(&mut self) -> Result<NameValueList> {
        let mut params = NameValueList::new(';');
        loop {
            self.skip_ws();
            if self.lexer.look_ahead(0) != ';' {
                return Ok(params);
            }
            self.lexer.consume(1);
            self.skip_ws();
            params.add(self.name_value('=')?);
        }
    }

    /// Comma-separated contacts.
    pub fn contact_list(&mut self) -> Result<Vec<ContactHeader>> {
        let mut contacts = Vec::new();
        loop {
            let address = self.address(UriContext::AddrSpec)?;
            let parameters = self.header_parameters()?;
            contacts.push(ContactHeader {
                address,
                parameters,
            });
            self.skip_ws();
            if self.lexer.look_ahead(0) != ',' {
                return Ok(contacts);
            }
            self.lexer.consume(1);
        }
    }
}

/// Parses a complete address; an unbracketed URI keeps its own parameters.
pub fn parse_address(text: &str) -> Result<Address> {
    let mut lexer = Lexer::new(LexerMode::SipUrl, text.trim());
    let mut parser = AddressParser::new(&mut lexer);
    let address = parser
        .address(UriContext::Standalone)
        .map_err(|e| e.in_field("address"))?;
    parser.expect_end("address")?;
    Ok(address)
}

/// Parses a `From`/`To` style value: one address and its header parameters.
pub fn parse_address_header(text: &str) -> Result<(Address, NameValueList)> {
    let mut lexer = Lexer::new(LexerMode::SipUrl, text.trim());
    let mut parser = AddressParser::new(&mut lexer);
    let address = parser
        .address(UriContext::AddrSpec)
        .map_err(|e| e.in_field("address"))?;
    let params = parser
        .header_parameters()
        .map_err(|e| e.in_field("address"))?;
    parser.expect_end("address")?;
    Ok((address, params))
}

/// Parses a `Contact` header value.
pub fn parse_contact_list(text: &str) -> Result<Vec<ContactHeader>> {
    let mut lexer = Lexer::new(LexerMode::SipUrl, text.trim());
    let mut parser = AddressParser::new(&mut lexer);
    let contacts = parser
        .contact_list()
        .map_err(|e| e.in_field("Contact"))?;
    parser.expect_end("Contact")?;
    Ok(contacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::address::AddressKind;

    #[test]
    fn test_quoted_display_name() {
        let addr = parse_address("\"Alice \\\"A\\\" Liddell\" <sip:alice@wonderland.com>").unwrap();
        assert_eq!(addr.kind(), AddressKind::NameAddr);
        assert_eq!(addr.display_name(), Some("Alice \\\"A\\\" Liddell"));
        assert_eq!(addr.user().as_deref(), Some("alice"));
    }

    #[test]
    fn test_token_display_name() {
        let addr = parse_address("Bob Smith <sips:bob@biloxi.com>").unwrap();
        assert_eq!(addr.display_name(), Some("Bob Smith"));
        assert_eq!(addr.encode(), "\"Bob Smith\" <sips:bob@biloxi.com>");
    }

    #[test]
    fn test_addr_spec_and_wildcard() {
        let addr = parse_address("sip:carol@chicago.com;transport=tcp").unwrap();
        assert_eq!(addr.kind(), AddressKind::AddressSpec);
        assert_eq!(addr.parameter("transport"), Some("tcp"));

        let addr = parse_address(" * ").unwrap();
        assert!(addr.is_wildcard());
    }

    #[test]
    fn test_address_header_parameters() {
        let (addr, params) = parse_address_header("sip:bob@biloxi.com;tag=a6c85cf").unwrap();
        assert_eq!(addr.parameter_names().len(), 0);
        assert_eq!(params.get_value("tag"), Some("a6c85cf"));
    }

    #[test]
    fn test_contact_list_with_wildcard() {
        let contacts = parse_contact_list("*").unwrap();
        assert!(contacts[0].is_wildcard());

        let contacts = parse_contact_list(
            "\"Mr. Watson\" <sip:watson@worcester.bell-telephone.com>;q=0.7;expires=3600, <mailto:watson@bell-telephone.com>;q=0.1",
        )
        .unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].expires(), Some(3600));
        assert_eq!(contacts[1].q(), Some(0.1));
        assert!(!contacts[1].address.uri().unwrap().is_sip_uri());
    }

    #[test]
    fn test_unclosed_bracket_is_grammar_error() {
        assert!(matches!(
            parse_address("<sip:alice@atlanta.com"),
            Err(Error::Grammar { .. })
        ));
    }
}
