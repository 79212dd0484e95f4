//! # SDP line parsers
//!
//! Every SDP line type has its own parser. A parser matches the one-letter
//! tag and `=`, then runs the grammar of its line type and returns a typed
//! [`SdpField`]. [`FIELD_PARSERS`] maps each tag to a factory building the
//! parser for a line:
//!
//! ```
//! use sipkit_sip_core::sdp::parser::parse_field;
//! use sipkit_sip_core::sdp::fields::SdpField;
//!
//! match parse_field("b=AS:128").unwrap() {
//!     SdpField::Bandwidth(b) => assert_eq!(b.value, 128),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

/// Declares a line parser owning an `sdp` mode lexer.
macro_rules! field_parser {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name {
            lexer: $crate::lexer::Lexer,
        }

        impl $name {
            pub fn new(line: &str) -> Self {
                $name {
                    lexer: $crate::lexer::Lexer::new($crate::lexer::LexerMode::Sdp, line),
                }
            }

            pub fn boxed(line: &str) -> Box<dyn $crate::sdp::parser::SdpFieldParser> {
                Box::new(Self::new(line))
            }
        }

        impl $crate::parser::core::ParserCore for $name {
            fn lexer(&mut self) -> &mut $crate::lexer::Lexer {
                &mut self.lexer
            }
        }
    };
}

mod connection;
mod media;
mod session_fields;
mod time;

pub use connection::{BandwidthParser, ConnectionParser};
pub use media::MediaParser;
pub use session_fields::{
    AttributeParser, EmailParser, InformationParser, KeyParser, OriginParser, PhoneParser,
    ProtoVersionParser, SessionNameParser, UriFieldParser,
};
pub use time::{RepeatParser, TimeParser, ZoneParser};

use tracing::trace;

use crate::error::{Error, Result};
use crate::lexer::TokenClass;
use crate::parser::core::ParserCore;
use crate::sdp::fields::{SdpField, TimeUnit, TypedTime};

/// Parses one SDP line into its typed field.
pub trait SdpFieldParser {
    fn parse(&mut self) -> Result<SdpField>;
}

/// Builds the parser for one line.
pub type FieldParserFactory = fn(&str) -> Box<dyn SdpFieldParser>;

/// Tag letter to parser factory, in RFC 4566 order.
pub const FIELD_PARSERS: &[(char, FieldParserFactory)] = &[
    ('v', ProtoVersionParser::boxed),
    ('o', OriginParser::boxed),
    ('s', SessionNameParser::boxed),
    ('i', InformationParser::boxed),
    ('u', UriFieldParser::boxed),
    ('e', EmailParser::boxed),
    ('p', PhoneParser::boxed),
    ('c', ConnectionParser::boxed),
    ('b', BandwidthParser::boxed),
    ('t', TimeParser::boxed),
    ('r', RepeatParser::boxed),
    ('z', ZoneParser::boxed),
    ('k', KeyParser::boxed),
    ('a', AttributeParser::boxed),
    ('m', MediaParser::boxed),
];

/// Factory for the line type `tag`.
pub fn parser_for(tag: char) -> Option<FieldParserFactory> {
    FIELD_PARSERS
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, factory)| *factory)
}

/// Parses a single SDP line, dispatching on its first character.
pub fn parse_field(line: &str) -> Result<SdpField> {
    let line = line.trim_end_matches(['\r', '\n']);
    let tag = line
        .chars()
        .next()
        .ok_or_else(|| Error::grammar_at("sdp", "empty line", 0))?;
    let factory = parser_for(tag)
        .ok_or_else(|| Error::grammar_at("sdp", format!("unknown field type '{}'", tag), 0))?;
    trace!(tag = %tag, "dispatching sdp line");
    factory(line).parse()
}

/// Sub-grammars shared by the SDP line parsers.
pub trait SdpGrammar: ParserCore {
    /// Matches `<tag>=`.
    fn field_tag(&mut self, tag: char) -> Result<()> {
        let lexer = self.lexer();
        lexer.match_token(TokenClass::Char(tag))?;
        lexer.match_token(TokenClass::Char('='))?;
        Ok(())
    }

    /// A non-empty run up to the next space.
    fn word(&mut self, what: &str) -> Result<String> {
        let word = self.lexer().get_next_token(' ');
        if word.is_empty() {
            return Err(self.lexical_error(&format!("expected {}", what)).into());
        }
        Ok(word)
    }

    /// One or more spaces.
    fn space(&mut self) -> Result<()> {
        self.expect_char(' ')?;
        self.skip_ws();
        Ok(())
    }

    /// The rest of the line, which must not be empty.
    fn text(&mut self, what: &str) -> Result<String> {
        let text = self.lexer().get_rest();
        if text.is_empty() {
            return Err(self.lexical_error(&format!("expected {}", what)).into());
        }
        Ok(text)
    }

    /// Unsigned decimal number.
    fn unsigned(&mut self, what: &str) -> Result<u64> {
        let digits = self.lexer().number()?;
        digits
            .parse()
            .map_err(|_| self.lexical_error(&format!("{} out of range", what)).into())
    }

    /// `[-] 1*DIGIT [d|h|m|s]`; the sign is accepted only when `signed`.
    fn typed_time(&mut self, signed: bool) -> Result<TypedTime> {
        let negative = signed && self.lexer().look_ahead(0) == '-';
        if negative {
            self.lexer().consume(1);
        }
        let amount = self.unsigned("typed time")?;
        let amount = i64::try_from(amount)
            .map_err(|_| Error::from(self.lexical_error("typed time out of range")))?;
        let next = self.lexer().look_ahead(0);
        let unit = if next.is_ascii_alphabetic() {
            let unit = TimeUnit::from_suffix(next)
                .ok_or_else(|| Error::from(self.lexical_error(&format!("invalid time unit '{}'", next))))?;
            self.lexer().consume(1);
            Some(unit)
        } else {
            None
        };
        if !matches!(self.lexer().look_ahead(0), ' ' | '\0') {
            return Err(self.lexical_error("unexpected character after typed time").into());
        }
        let time = TypedTime::new(if negative { -amount } else { amount }, unit);
        if time.seconds().is_none() {
            return Err(self.lexical_error("typed time out of range").into());
        }
        Ok(time)
    }
}

impl<T: ParserCore + ?Sized> SdpGrammar for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_tag() {
        for tag in "vosiuepcbtrzkam".chars() {
            assert!(parser_for(tag).is_some(), "missing parser for {}", tag);
        }
        assert!(parser_for('x').is_none());
    }

    #[test]
    fn test_unknown_tag_is_error() {
        assert!(matches!(parse_field("x=1"), Err(Error::Grammar { .. })));
        assert!(parse_field("").is_err());
    }

    #[test]
    fn test_dispatch_returns_matching_field() {
        for line in [
            "v=0",
            "s=-",
            "c=IN IP4 10.0.0.1",
            "t=0 0",
            "a=recvonly",
            "m=audio 49170 RTP/AVP 0",
        ] {
            let field = parse_field(line).unwrap();
            assert_eq!(field.tag(), line.chars().next().unwrap());
            assert_eq!(field.encode(), format!("{}\r\n", line));
        }
    }
}
