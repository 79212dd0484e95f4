//! `c=` and `b=` lines, which may appear at session or media level.

use crate::error::Result;
use crate::lexer::is_token_char;
use crate::parser::core::ParserCore;
use crate::sdp::fields::{Bandwidth, Connection, SdpField};
use crate::sdp::parser::{SdpFieldParser, SdpGrammar};
use crate::types::host::Host;

field_parser!(
    /// `c=<nettype> <addrtype> <connection-address>`
    ///
    /// IPv4 multicast addresses carry `/<ttl>[/<count>]`, IPv6 ones `/<count>`.
    ConnectionParser
);
field_parser!(
    /// `b=<bwtype>:<bandwidth>`
    BandwidthParser
);

impl ConnectionParser {
    fn connection(&mut self) -> Result<Connection> {
        self.field_tag('c')?;
        let nettype = self.word("network type")?;
        self.space()?;
        let addrtype = self.word("address type")?;
        self.space()?;
        let address = self.lexer().take_while(|c| c != '/' && c != ' ');
        if address.is_empty() {
            return Err(self.lexical_error("expected connection address").into());
        }
        let address = Host::new(&address)?;

        let mut suffixes = Vec::new();
        while self.lexer().look_ahead(0) == '/' && suffixes.len() < 2 {
            self.lexer().consume(1);
            suffixes.push(self.unsigned("multicast suffix")?);
        }
        self.expect_end("c=")?;

        let mut connection = Connection {
            nettype,
            addrtype,
            address,
            ttl: None,
            address_count: None,
        };
        match (connection.addrtype.eq_ignore_ascii_case("IP6"), suffixes.as_slice()) {
            (_, []) => {}
            (true, [count]) => connection.address_count = Some(self.count(*count)?),
            (false, [ttl]) => connection.ttl = Some(self.ttl(*ttl)?),
            (false, [ttl, count]) => {
                connection.ttl = Some(self.ttl(*ttl)?);
                connection.address_count = Some(self.count(*count)?);
            }
            _ => return Err(self.lexical_error("too many multicast suffixes").into()),
        }
        Ok(connection)
    }

    fn ttl(&mut self, value: u64) -> Result<u8> {
        u8::try_from(value).map_err(|_| self.lexical_error("ttl above 255").into())
    }

    fn count(&mut self, value: u64) -> Result<u32> {
        u32::try_from(value).map_err(|_| self.lexical_error("address count out of range").into())
    }
}

impl SdpFieldParser for ConnectionParser {
    fn parse(&mut self) -> Result<SdpField> {
        self.connection()
            .map(SdpField::Connection)
            .map_err(|e| e.in_field("c="))
    }
}

impl BandwidthParser {
    fn bandwidth(&mut self) -> Result<Bandwidth> {
        self.field_tag('b')?;
        let bwtype = self.lexer().get_next_token(':');
        if bwtype.is_empty() || !bwtype.chars().all(is_token_char) {
            return Err(self.lexical_error("expected bandwidth type").into());
        }
        self.expect_char(':')?;
        let value = self.unsigned("bandwidth")?;
        self.expect_end("b=")?;
        Ok(Bandwidth { bwtype, value })
    }
}

impl SdpFieldParser for BandwidthParser {
    fn parse(&mut self) -> Result<SdpField> {
        self.bandwidth()
            .map(SdpField::Bandwidth)
            .map_err(|e| e.in_field("b="))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::sdp::parser::parse_field;

    fn connection(line: &str) -> Connection {
        match parse_field(line).unwrap() {
            SdpField::Connection(c) => c,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_multicast_suffixes() {
        let c = connection("c=IN IP4 224.2.1.1/127/3");
        assert_eq!(c.ttl, Some(127));
        assert_eq!(c.address_count, Some(3));

        let c = connection("c=IN IP6 FF15::101/3");
        assert_eq!(c.ttl, None);
        assert_eq!(c.address_count, Some(3));
        assert_eq!(SdpField::Connection(c).encode(), "c=IN IP6 FF15::101/3\r\n");

        assert!(parse_field("c=IN IP4 224.2.1.1/300").is_err());
    }

    #[test]
    fn test_bandwidth() {
        match parse_field("b=CT:1024").unwrap() {
            SdpField::Bandwidth(b) => {
                assert_eq!(b.bwtype, "CT");
                assert_eq!(b.value, 1024);
            }
            other => panic!("unexpected {:?}", other),
        }
        let err = parse_field("b=AS:12x").unwrap_err();
        assert!(matches!(err, Error::Grammar { ref field, .. } if field == "b="));
        assert!(err.position().is_some());
        assert!(parse_field("b=AS").is_err());
    }
}
