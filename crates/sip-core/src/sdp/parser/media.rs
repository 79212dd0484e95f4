use crate::error::Result;
use crate::parser::core::ParserCore;
use crate::sdp::fields::{Media, SdpField};
use crate::sdp::parser::{SdpFieldParser, SdpGrammar};

field_parser!(
    /// `m=<media> <port>[/<number of ports>] <proto> <fmt> ...`
    MediaParser
);

impl MediaParser {
    fn media(&mut self) -> Result<Media> {
        self.field_tag('m')?;
        let media = self.word("media type")?;
        self.space()?;
        let port = self.unsigned("port")?;
        let port = u16::try_from(port).map_err(|_| self.lexical_error("port above 65535"))?;
        let port_count = if self.lexer().look_ahead(0) == '/' {
            self.lexer().consume(1);
            let count = self.unsigned("port count")?;
            Some(u32::try_from(count).map_err(|_| self.lexical_error("port count out of range"))?)
        } else {
            None
        };
        self.space()?;
        let protocol = self.word("transport protocol")?;

        let mut formats = Vec::new();
        while self.lexer().has_more_chars() {
            self.space()?;
            if !self.lexer().has_more_chars() {
                break;
            }
            formats.push(self.word("format")?);
        }
        if formats.is_empty() {
            return Err(self.lexical_error("expected at least one format").into());
        }
        Ok(Media {
            media,
            port,
            port_count,
            protocol,
            formats,
        })
    }
}

impl SdpFieldParser for MediaParser {
    fn parse(&mut self) -> Result<SdpField> {
        self.media().map(SdpField::Media).map_err(|e| e.in_field("m="))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdp::parser::parse_field;

    fn media(line: &str) -> Media {
        match parse_field(line).unwrap() {
            SdpField::Media(m) => m,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_media_line() {
        let m = media("m=video 51372 RTP/AVP 99 100");
        assert_eq!(m.media, "video");
        assert_eq!(m.port, 51372);
        assert_eq!(m.protocol, "RTP/AVP");
        assert_eq!(m.formats, vec!["99", "100"]);
    }

    #[test]
    fn test_port_count() {
        let m = media("m=audio 49170/2 RTP/AVP 0");
        assert_eq!(m.port_count, Some(2));
        assert_eq!(SdpField::Media(m).encode(), "m=audio 49170/2 RTP/AVP 0\r\n");
    }

    #[test]
    fn test_invalid_media_lines() {
        assert!(parse_field("m=audio 70000 RTP/AVP 0").is_err());
        assert!(parse_field("m=audio 49170 RTP/AVP").is_err());
        assert!(parse_field("m=audio port RTP/AVP 0").is_err());
    }
}
