//! Start line, header section and body of a SIP message.

use bytes::Bytes;
use tracing::trace;

use crate::error::{Error, Result};
use crate::lexer::{Lexer, LexerMode, TokenClass};
use crate::parser::core::{CoreParser, ParserCore};
use crate::types::header::Header;
use crate::types::message::{Request, Response, SIP_VERSION};
use crate::types::method::Method;
use crate::types::uri::Uri;

struct RawMessage<'a> {
    start_line: &'a str,
    headers: Vec<Header>,
    body: &'a str,
}

// Splits the head from the body and unfolds continuation lines.
fn split_message(text: &str) -> Result<RawMessage<'_>> {
    let (head, body) = match text.find("\r\n\r\n") {
        Some(i) => (&text[..i], &text[i + 4..]),
        None => match text.find("\n\n") {
            Some(i) => (&text[..i], &text[i + 2..]),
            None => (text.trim_end_matches(['\r', '\n']), ""),
        },
    };

    let mut lines = head.lines().map(|l| l.trim_end_matches('\r'));
    let start_line = lines
        .next()
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| Error::grammar_at("start-line", "empty message", 0))?;

    let mut unfolded: Vec<String> = Vec::new();
    for line in lines {
        if line.starts_with([' ', '\t']) {
            match unfolded.last_mut() {
                Some(prev) => {
                    prev.push(' ');
                    prev.push_str(line.trim());
                }
                None => return Err(Error::grammar_at("header", "continuation without header", 0)),
            }
        } else {
            unfolded.push(line.to_string());
        }
    }

    let mut headers = Vec::with_capacity(unfolded.len());
    for line in &unfolded {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::grammar_at("header", format!("missing ':' in \"{}\"", line), 0))?;
        headers.push(Header::new(name, value)?);
    }

    Ok(RawMessage {
        start_line,
        headers,
        body,
    })
}

fn body_bytes(headers: &[Header], body: &str) -> Result<Bytes> {
    let length = headers
        .iter()
        .find(|h| h.is("Content-Length"))
        .map(|h| {
            h.value
                .parse::<usize>()
                .map_err(|_| Error::InvalidArgument(format!("illegal Content-Length: {}", h.value)))
        })
        .transpose()?;
    let bytes = body.as_bytes();
    let take = length.unwrap_or(bytes.len()).min(bytes.len());
    Ok(Bytes::copy_from_slice(&bytes[..take]))
}

fn expect_version(parser: &mut CoreParser, field: &str) -> Result<()> {
    let version = parser.lexer().get_next_token(' ');
    if version != SIP_VERSION {
        return Err(parser.grammar_error(field, &format!("unsupported version \"{}\"", version)));
    }
    Ok(())
}

/// Parses `Method SP Request-URI SP SIP-Version` and what follows.
pub fn parse_request(text: &str) -> Result<Request> {
    let raw = split_message(text)?;
    let mut parser = CoreParser::new(Lexer::new(LexerMode::MethodKeyword, raw.start_line.trim()));

    let method: Method = parser
        .lexer()
        .match_token(TokenClass::Id)
        .map_err(|e| Error::grammar("request-line", e))?
        .text
        .parse()?;
    parser.expect_char(' ').map_err(|e| e.in_field("request-line"))?;
    let uri_text = parser.lexer().get_next_token(' ');
    let uri = Uri::parse(&uri_text)?;
    parser.expect_char(' ').map_err(|e| e.in_field("request-line"))?;
    expect_version(&mut parser, "request-line")?;
    parser.expect_end("request-line")?;

    trace!(method = %method, headers = raw.headers.len(), "parsed request");
    Ok(Request {
        method,
        uri,
        body: body_bytes(&raw.headers, raw.body)?,
        headers: raw.headers,
    })
}

/// Parses `SIP-Version SP Status-Code SP Reason-Phrase` and what follows.
pub fn parse_response(text: &str) -> Result<Response> {
    let raw = split_message(text)?;
    let mut parser = CoreParser::new(Lexer::new(LexerMode::Sdp, raw.start_line.trim()));

    expect_version(&mut parser, "status-line")?;
    parser.expect_char(' ').map_err(|e| e.in_field("status-line"))?;
    let code = parser
        .lexer()
        .number()
        .map_err(|e| Error::grammar("status-line", e))?;
    let status_code: u16 = code
        .parse()
        .ok()
        .filter(|c| (100..700).contains(c))
        .ok_or_else(|| Error::InvalidArgument(format!("illegal status code: {}", code)))?;
    parser.skip_ws();
    let reason_phrase = parser.lexer().get_rest();

    trace!(status = status_code, headers = raw.headers.len(), "parsed response");
    Ok(Response {
        status_code,
        reason_phrase,
        body: body_bytes(&raw.headers, raw.body)?,
        headers: raw.headers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::message::SipMessage;

    const REGISTER: &str = "REGISTER sip:registrar.biloxi.com SIP/2.0\r\n\
        Via: SIP/2.0/UDP bobspc.biloxi.com:5060;branch=z9hG4bKnashds7\r\n\
        To: Bob <sip:bob@biloxi.com>\r\n\
        From: Bob <sip:bob@biloxi.com>;tag=456248\r\n\
        i: 843817637684230@998sdasdh09\r\n\
        CSeq: 1826 REGISTER\r\n\
        m: <sip:bob@192.0.2.4>\r\n\
        Expires: 7200\r\n\
        Content-Length: 0\r\n\r\n";

    #[test]
    fn test_parse_register() {
        let req = parse_request(REGISTER).unwrap();
        assert_eq!(req.method, Method::Register);
        assert_eq!(req.call_id(), Some("843817637684230@998sdasdh09"));
        assert_eq!(req.cseq().unwrap().seq, 1826);
        assert_eq!(req.contacts().unwrap()[0].address.port(), 0);
        assert_eq!(req.expires(), Some(7200));
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_folded_header_is_unfolded() {
        let text = "OPTIONS sip:carol@chicago.com SIP/2.0\r\nSubject: lunch\r\n  tomorrow\r\nCSeq: 1 OPTIONS\r\n\r\n";
        let req = parse_request(text).unwrap();
        assert_eq!(req.header("Subject"), Some("lunch tomorrow"));
    }

    #[test]
    fn test_parse_response_with_body() {
        let text = "SIP/2.0 200 OK\r\nCSeq: 2 REGISTER\r\nExpires: 60\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello trailing";
        let resp = parse_response(text).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.reason_phrase, "OK");
        assert_eq!(&resp.body[..], b"hello");
    }

    #[test]
    fn test_bad_start_lines() {
        assert!(parse_request("").is_err());
        assert!(parse_request("REGISTER sip:a.com SIP/3.0\r\n\r\n").is_err());
        assert!(parse_response("SIP/2.0 99 Low\r\n\r\n").is_err());
        assert!(parse_request("INVITE sip:a.com SIP/2.0\r\nNoColonHere\r\n\r\n").is_err());
    }
}
