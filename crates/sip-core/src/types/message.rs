//! # SIP requests and responses
//!
//! Messages keep their headers as an ordered list of raw [`Header`]s and
//! parse the typed values (`CSeq`, `Expires`, `Contact`) on access. The
//! [`SipMessage`] trait carries the accessors shared by [`Request`] and
//! [`Response`].
//!
//! ```
//! use sipkit_sip_core::types::message::{Request, SipMessage};
//! use sipkit_sip_core::types::method::Method;
//! use sipkit_sip_core::types::header::CSeq;
//!
//! let mut request = Request::new(Method::Register, "sip:registrar.example.com".parse().unwrap());
//! request.set_cseq(CSeq::new(1, Method::Register));
//! request.set_expires(3600);
//! assert_eq!(request.increment_cseq().unwrap(), 2);
//! assert_eq!(request.expires(), Some(3600));
//! ```

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::header::{encode_contact_list, CSeq, ContactHeader, Header};
use crate::types::method::Method;
use crate::types::uri::Uri;

pub const SIP_VERSION: &str = "SIP/2.0";

/// Accessors shared by requests and responses.
pub trait SipMessage {
    fn headers(&self) -> &[Header];
    fn headers_mut(&mut self) -> &mut Vec<Header>;
    fn body(&self) -> &Bytes;
    fn body_mut(&mut self) -> &mut Bytes;

    /// First value of `name`; compact forms match their full names.
    fn header(&self, name: &str) -> Option<&str> {
        self.headers()
            .iter()
            .find(|h| h.is(name))
            .map(|h| h.value.as_str())
    }

    fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers()
            .iter()
            .filter(|h| h.is(name))
            .map(|h| h.value.as_str())
            .collect()
    }

    fn add_header(&mut self, name: &str, value: &str) -> Result<()> {
        let header = Header::new(name, value)?;
        self.headers_mut().push(header);
        Ok(())
    }

    /// Replaces every `name` header with one value at the first one's position.
    fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.replace_header(Header::new(name, value)?);
        Ok(())
    }

    /// Replaces every header named like `header` with it, at the first
    /// one's position.
    fn replace_header(&mut self, header: Header) {
        let headers = self.headers_mut();
        match headers.iter().position(|h| h.is(&header.name)) {
            Some(first) => {
                let name = header.name.clone();
                headers[first] = header;
                let mut index = 0;
                headers.retain(|h| {
                    let keep = index <= first || !h.is(&name);
                    index += 1;
                    keep
                });
            }
            None => headers.push(header),
        }
    }

    /// Removes every `name` header, returning how many were removed.
    fn remove_header(&mut self, name: &str) -> usize {
        let headers = self.headers_mut();
        let before = headers.len();
        headers.retain(|h| !h.is(name));
        before - headers.len()
    }

    fn call_id(&self) -> Option<&str> {
        self.header("Call-ID")
    }

    fn cseq(&self) -> Option<CSeq> {
        self.header("CSeq")?.parse().ok()
    }

    fn set_cseq(&mut self, cseq: CSeq) {
        self.replace_header(Header::known("CSeq", cseq.to_string()));
    }

    /// Bumps the CSeq number and returns the new value.
    fn increment_cseq(&mut self) -> Result<u32> {
        let mut cseq = self
            .cseq()
            .ok_or_else(|| Error::IllegalState("message has no CSeq".into()))?;
        cseq.seq = cseq
            .seq
            .checked_add(1)
            .ok_or_else(|| Error::IllegalState("CSeq overflow".into()))?;
        self.set_cseq(cseq.clone());
        Ok(cseq.seq)
    }

    fn expires(&self) -> Option<u32> {
        self.header("Expires")?.trim().parse().ok()
    }

    fn set_expires(&mut self, expires: u32) {
        self.replace_header(Header::known("Expires", expires.to_string()));
    }

    /// All contacts across every `Contact` header.
    fn contacts(&self) -> Result<Vec<ContactHeader>> {
        let mut contacts = Vec::new();
        for value in self.header_values("Contact") {
            contacts.extend(ContactHeader::parse_list(value)?);
        }
        Ok(contacts)
    }

    /// Replaces the `Contact` headers; an empty list removes them.
    fn set_contacts(&mut self, contacts: &[ContactHeader]) {
        if contacts.is_empty() {
            self.remove_header("Contact");
        } else {
            self.replace_header(Header::known("Contact", encode_contact_list(contacts)));
        }
    }

    fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Sets the body and its `Content-Type`.
    fn set_body(&mut self, content_type: &str, body: Bytes) -> Result<()> {
        self.set_header("Content-Type", content_type)?;
        *self.body_mut() = body;
        Ok(())
    }

    /// Drops the body along with `Content-Type`.
    fn clear_body(&mut self) {
        self.remove_header("Content-Type");
        *self.body_mut() = Bytes::new();
    }

    fn has_body(&self) -> bool {
        !self.body().is_empty()
    }
}

fn encode_message(start_line: &str, headers: &[Header], body: &Bytes) -> Bytes {
    let mut out = BytesMut::with_capacity(256 + body.len());
    out.put_slice(start_line.as_bytes());
    out.put_slice(b"\r\n");
    for header in headers.iter().filter(|h| !h.is("Content-Length")) {
        out.put_slice(header.to_string().as_bytes());
        out.put_slice(b"\r\n");
    }
    out.put_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
    out.put_slice(body);
    out.freeze()
}

/// A SIP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: Method,
    pub uri: Uri,
    pub headers: Vec<Header>,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, uri: Uri) -> Self {
        Request {
            method,
            uri,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Builder-style header append.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        self.add_header(name, value)?;
        Ok(self)
    }

    pub fn parse(text: &str) -> Result<Self> {
        crate::parser::message::parse_request(text)
    }

    pub fn start_line(&self) -> String {
        format!("{} {} {}", self.method, self.uri, SIP_VERSION)
    }

    /// Wire form with `Content-Length` recomputed.
    pub fn encode(&self) -> Bytes {
        encode_message(&self.start_line(), &self.headers, &self.body)
    }
}

impl SipMessage for Request {
    fn headers(&self) -> &[Header] {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Vec<Header> {
        &mut self.headers
    }

    fn body(&self) -> &Bytes {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Bytes {
        &mut self.body
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.encode()))
    }
}

/// A SIP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status_code: u16,
    pub reason_phrase: String,
    pub headers: Vec<Header>,
    pub body: Bytes,
}

impl Response {
    /// A response with the standard reason phrase for `status_code`.
    pub fn new(status_code: u16) -> Self {
        Response::with_reason(status_code, reason_phrase(status_code))
    }

    pub fn with_reason(status_code: u16, reason: &str) -> Self {
        Response {
            status_code,
            reason_phrase: reason.to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        crate::parser::message::parse_response(text)
    }

    pub fn is_provisional(&self) -> bool {
        (100..200).contains(&self.status_code)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn start_line(&self) -> String {
        format!("{} {} {}", SIP_VERSION, self.status_code, self.reason_phrase)
    }

    pub fn encode(&self) -> Bytes {
        encode_message(&self.start_line(), &self.headers, &self.body)
    }
}

impl SipMessage for Response {
    fn headers(&self) -> &[Header] {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Vec<Header> {
        &mut self.headers
    }

    fn body(&self) -> &Bytes {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Bytes {
        &mut self.body
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.encode()))
    }
}

/// Standard reason phrase for common status codes.
pub fn reason_phrase(status_code: u16) -> &'static str {
    match status_code {
        100 => "Trying",
        180 => "Ringing",
        183 => "Session Progress",
        200 => "OK",
        202 => "Accepted",
        301 => "Moved Permanently",
        302 => "Moved Temporarily",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        423 => "Interval Too Brief",
        480 => "Temporarily Unavailable",
        481 => "Call/Transaction Does Not Exist",
        486 => "Busy Here",
        489 => "Bad Event",
        500 => "Server Internal Error",
        503 => "Service Unavailable",
        504 => "Server Time-out",
        603 => "Decline",
        _ => "Unknown",
    }
}
