//! Session-level text fields: `v o s i u e p k a`.

use crate::error::{Error, Result};
use crate::lexer::is_token_char;
use crate::parser::core::ParserCore;
use crate::sdp::fields::{
    Attribute, Email, Information, Key, Origin, Phone, ProtoVersion, SdpField, SessionName,
    UriField,
};
use crate::sdp::parser::{SdpFieldParser, SdpGrammar};
use crate::types::host::Host;

field_parser!(
    /// `v=0`
    ProtoVersionParser
);
field_parser!(
    /// `o=<username> <sess-id> <sess-version> <nettype> <addrtype> <address>`
    OriginParser
);
field_parser!(SessionNameParser);
field_parser!(InformationParser);
field_parser!(UriFieldParser);
field_parser!(
    /// `e=addr (Name)` or `e=Name <addr>`
    EmailParser
);
field_parser!(PhoneParser);
field_parser!(
    /// `k=<method>[:<key>]`
    KeyParser
);
field_parser!(
    /// `a=<name>[:<value>]`; the value runs to the end of the line.
    AttributeParser
);

impl ProtoVersionParser {
    fn version(&mut self) -> Result<ProtoVersion> {
        self.field_tag('v')?;
        let version = self.unsigned("version")?;
        self.expect_end("v=")?;
        let version = u32::try_from(version)
            .map_err(|_| Error::grammar_at("v=", "version out of range", 2))?;
        Ok(ProtoVersion { version })
    }
}

impl SdpFieldParser for ProtoVersionParser {
    fn parse(&mut self) -> Result<SdpField> {
        self.version().map(SdpField::Version).map_err(|e| e.in_field("v="))
    }
}

impl OriginParser {
    fn origin(&mut self) -> Result<Origin> {
        self.field_tag('o')?;
        let username = self.word("username")?;
        self.space()?;
        let session_id = self.unsigned("session id")?;
        self.space()?;
        let session_version = self.unsigned("session version")?;
        self.space()?;
        let nettype = self.word("network type")?;
        self.space()?;
        let addrtype = self.word("address type")?;
        self.space()?;
        let address = Host::new(&self.word("unicast address")?)?;
        self.expect_end("o=")?;
        Ok(Origin {
            username,
            session_id,
            session_version,
            nettype,
            addrtype,
            address,
        })
    }
}

impl SdpFieldParser for OriginParser {
    fn parse(&mut self) -> Result<SdpField> {
        self.origin().map(SdpField::Origin).map_err(|e| e.in_field("o="))
    }
}

fn text_field<P: SdpGrammar>(parser: &mut P, tag: char, what: &str) -> Result<String> {
    parser.field_tag(tag)?;
    parser.text(what)
}

impl SdpFieldParser for SessionNameParser {
    fn parse(&mut self) -> Result<SdpField> {
        text_field(self, 's', "session name")
            .map(|t| SdpField::SessionName(SessionName(t)))
            .map_err(|e| e.in_field("s="))
    }
}

impl SdpFieldParser for InformationParser {
    fn parse(&mut self) -> Result<SdpField> {
        text_field(self, 'i', "session information")
            .map(|t| SdpField::Information(Information(t)))
            .map_err(|e| e.in_field("i="))
    }
}

impl SdpFieldParser for UriFieldParser {
    fn parse(&mut self) -> Result<SdpField> {
        text_field(self, 'u', "uri")
            .map(|t| SdpField::Uri(UriField(t)))
            .map_err(|e| e.in_field("u="))
    }
}

// `addr (Name)`, `Name <addr>` or a bare `addr`.
fn address_and_name<P: SdpGrammar>(parser: &mut P, tag: char) -> Result<(String, Option<String>)> {
    parser.field_tag(tag)?;
    let first = parser.lexer().get_next_token_any(&['(', '<']);
    let (address, name) = match parser.lexer().look_ahead(0) {
        '(' => {
            let name = parser.lexer().comment()?;
            (first.trim().to_string(), Some(name))
        }
        '<' => {
            parser.lexer().consume(1);
            let address = parser.lexer().get_next_token('>');
            parser.expect_char('>')?;
            (address.trim().to_string(), Some(first.trim().to_string()))
        }
        _ => (first.trim().to_string(), None),
    };
    parser.expect_end(&format!("{}=", tag))?;
    if address.is_empty() {
        return Err(parser.lexical_error("expected address").into());
    }
    Ok((address, name.filter(|n| !n.is_empty())))
}

impl SdpFieldParser for EmailParser {
    fn parse(&mut self) -> Result<SdpField> {
        address_and_name(self, 'e')
            .map(|(address, display_name)| SdpField::Email(Email { address, display_name }))
            .map_err(|e| e.in_field("e="))
    }
}

impl SdpFieldParser for PhoneParser {
    fn parse(&mut self) -> Result<SdpField> {
        address_and_name(self, 'p')
            .map(|(number, display_name)| SdpField::Phone(Phone { number, display_name }))
            .map_err(|e| e.in_field("p="))
    }
}

impl KeyParser {
    fn key(&mut self) -> Result<Key> {
        self.field_tag('k')?;
        let method = self.lexer().get_next_token(':');
        if method.is_empty() || !method.chars().all(is_token_char) {
            return Err(self.lexical_error("expected key method").into());
        }
        let key = if self.lexer().look_ahead(0) == ':' {
            self.lexer().consume(1);
            Some(self.lexer().get_rest())
        } else {
            None
        };
        Ok(Key { method, key })
    }
}

impl SdpFieldParser for KeyParser {
    fn parse(&mut self) -> Result<SdpField> {
        self.key().map(SdpField::Key).map_err(|e| e.in_field("k="))
    }
}

impl AttributeParser {
    fn attribute(&mut self) -> Result<Attribute> {
        self.field_tag('a')?;
        let name = self.lexer().get_next_token(':');
        if name.is_empty() || !name.chars().all(is_token_char) {
            return Err(self.lexical_error("expected attribute name").into());
        }
        let value = if self.lexer().look_ahead(0) == ':' {
            self.lexer().consume(1);
            Some(self.lexer().get_rest())
        } else {
            None
        };
        Ok(Attribute { name, value })
    }
}

impl SdpFieldParser for AttributeParser {
    fn parse(&mut self) -> Result<SdpField> {
        self.attribute().map(SdpField::Attribute).map_err(|e| e.in_field("a="))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdp::parser::parse_field;

    #[test]
    fn test_origin() {
        match parse_field("o=jdoe 2890844526 2890842807 IN IP4 10.47.16.5").unwrap() {
            SdpField::Origin(o) => {
                assert_eq!(o.username, "jdoe");
                assert_eq!(o.session_id, 2890844526);
                assert!(o.address.is_ipv4());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse_field("o=jdoe x 1 IN IP4 10.47.16.5"),
            Err(Error::Grammar { .. })
        ));
    }

    #[test]
    fn test_email_forms() {
        let a = parse_field("e=j.doe@example.com (Jane Doe)").unwrap();
        let b = parse_field("e=Jane Doe <j.doe@example.com>").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.encode(), "e=j.doe@example.com (Jane Doe)\r\n");
        match parse_field("p=+1 617 555-6011").unwrap() {
            SdpField::Phone(p) => {
                assert_eq!(p.number, "+1 617 555-6011");
                assert_eq!(p.display_name, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_attribute_value_is_rest_of_line() {
        match parse_field("a=fmtp:96 profile-level-id=42e01f; packetization-mode=1").unwrap() {
            SdpField::Attribute(a) => {
                assert_eq!(a.name, "fmtp");
                assert_eq!(a.value.as_deref(), Some("96 profile-level-id=42e01f; packetization-mode=1"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_field("a=").is_err());
    }

    #[test]
    fn test_key_with_and_without_value() {
        assert_eq!(
            parse_field("k=prompt").unwrap(),
            SdpField::Key(Key { method: "prompt".into(), key: None })
        );
        assert_eq!(
            parse_field("k=base64:c2VjcmV0").unwrap().encode(),
            "k=base64:c2VjcmV0\r\n"
        );
    }

    #[test]
    fn test_version_must_be_numeric() {
        assert_eq!(parse_field("v=0").unwrap(), SdpField::Version(ProtoVersion { version: 0 }));
        assert!(parse_field("v=x").is_err());
        assert!(parse_field("v=0 1").is_err());
    }
}
