//! # Session descriptions
//!
//! [`SessionDescription::parse`] feeds each line of an SDP body to
//! [`parse_field`] and files the result. Once an `m=` line has been seen,
//! `i c b k a` lines belong to that media description; before it they
//! belong to the session. `r=` lines attach to the preceding `t=`.
//!
//! ```
//! use sipkit_sip_core::sdp::SessionDescription;
//!
//! let sdp = SessionDescription::parse(
//!     "v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\ns=-\r\nt=0 0\r\n\
//!      m=audio 49170 RTP/AVP 0\r\na=sendrecv\r\n",
//! ).unwrap();
//! assert_eq!(sdp.media[0].attribute("sendrecv").map(|a| a.value.is_none()), Some(true));
//! assert!(sdp.attribute("sendrecv").is_none());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::sdp::fields::*;
use crate::sdp::parser::parse_field;

/// A `t=` line and the `r=` lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDescription {
    pub time: Time,
    pub repeats: Vec<Repeat>,
}

/// An `m=` line and its media-level fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescription {
    pub media: Media,
    pub information: Option<Information>,
    pub connections: Vec<Connection>,
    pub bandwidths: Vec<Bandwidth>,
    pub key: Option<Key>,
    pub attributes: Vec<Attribute>,
}

impl MediaDescription {
    pub fn new(media: Media) -> Self {
        MediaDescription {
            media,
            information: None,
            connections: Vec::new(),
            bandwidths: Vec::new(),
            key: None,
            attributes: Vec::new(),
        }
    }

    /// First attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find_attribute(&self.attributes, name)
    }

    /// Every attribute called `name`, e.g. all `rtpmap` lines.
    pub fn attributes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Attribute> + 'a {
        self.attributes.iter().filter(move |a| a.name == name)
    }

    pub fn set_attribute(&mut self, name: &str, value: Option<&str>) {
        set_attribute(&mut self.attributes, name, value)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        remove_attribute(&mut self.attributes, name)
    }

    pub fn bandwidth(&self, bwtype: &str) -> Option<u64> {
        find_bandwidth(&self.bandwidths, bwtype)
    }

    pub fn set_bandwidth(&mut self, bwtype: &str, value: u64) {
        set_bandwidth(&mut self.bandwidths, bwtype, value)
    }

    pub fn formats(&self) -> &[String] {
        &self.media.formats
    }

    pub fn set_port(&mut self, port: u16) {
        self.media.port = port;
    }

    fn encode_into(&self, out: &mut String) {
        out.push_str(&SdpField::Media(self.media.clone()).encode());
        if let Some(i) = &self.information {
            out.push_str(&SdpField::Information(i.clone()).encode());
        }
        for c in &self.connections {
            out.push_str(&SdpField::Connection(c.clone()).encode());
        }
        for b in &self.bandwidths {
            out.push_str(&SdpField::Bandwidth(b.clone()).encode());
        }
        if let Some(k) = &self.key {
            out.push_str(&SdpField::Key(k.clone()).encode());
        }
        for a in &self.attributes {
            out.push_str(&SdpField::Attribute(a.clone()).encode());
        }
    }
}

/// A complete SDP body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionDescription {
    pub version: Option<ProtoVersion>,
    pub origin: Option<Origin>,
    pub session_name: Option<SessionName>,
    pub information: Option<Information>,
    pub uri: Option<UriField>,
    pub emails: Vec<Email>,
    pub phones: Vec<Phone>,
    pub connection: Option<Connection>,
    pub bandwidths: Vec<Bandwidth>,
    pub time_descriptions: Vec<TimeDescription>,
    pub zone: Option<Zone>,
    pub key: Option<Key>,
    pub attributes: Vec<Attribute>,
    pub media: Vec<MediaDescription>,
}

impl SessionDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a full SDP body. Blank lines are skipped; the first bad line
    /// aborts the parse.
    pub fn parse(text: &str) -> Result<Self> {
        let mut session = SessionDescription::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let field = parse_field(line).map_err(|e| {
                debug!(line = index + 1, error = %e, "rejecting sdp body");
                e
            })?;
            session.add_field(field)?;
        }
        Ok(session)
    }

    /// Files one parsed line, scoping it to the current media description
    /// when one is open.
    pub fn add_field(&mut self, field: SdpField) -> Result<()> {
        if let Some(media) = self.media.last_mut() {
            match field {
                SdpField::Information(i) => {
                    media.information = Some(i);
                    return Ok(());
                }
                SdpField::Connection(c) => {
                    media.connections.push(c);
                    return Ok(());
                }
                SdpField::Bandwidth(b) => {
                    media.bandwidths.push(b);
                    return Ok(());
                }
                SdpField::Key(k) => {
                    media.key = Some(k);
                    return Ok(());
                }
                SdpField::Attribute(a) => {
                    media.attributes.push(a);
                    return Ok(());
                }
                other => return self.add_session_field(other),
            }
        }
        self.add_session_field(field)
    }

    fn add_session_field(&mut self, field: SdpField) -> Result<()> {
        match field {
            SdpField::Version(v) => self.version = Some(v),
            SdpField::Origin(o) => self.origin = Some(o),
            SdpField::SessionName(s) => self.session_name = Some(s),
            SdpField::Information(i) => self.information = Some(i),
            SdpField::Uri(u) => self.uri = Some(u),
            SdpField::Email(e) => self.emails.push(e),
            SdpField::Phone(p) => self.phones.push(p),
            SdpField::Connection(c) => self.connection = Some(c),
            SdpField::Bandwidth(b) => self.bandwidths.push(b),
            SdpField::Time(time) => self.time_descriptions.push(TimeDescription {
                time,
                repeats: Vec::new(),
            }),
            SdpField::Repeat(r) => match self.time_descriptions.last_mut() {
                Some(td) => td.repeats.push(r),
                None => return Err(Error::grammar_at("r=", "repeat time without a preceding t= line", 0)),
            },
            SdpField::Zone(z) => self.zone = Some(z),
            SdpField::Key(k) => self.key = Some(k),
            SdpField::Attribute(a) => self.attributes.push(a),
            SdpField::Media(m) => self.media.push(MediaDescription::new(m)),
        }
        Ok(())
    }

    /// Session-level attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find_attribute(&self.attributes, name)
    }

    pub fn set_attribute(&mut self, name: &str, value: Option<&str>) {
        set_attribute(&mut self.attributes, name, value)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        remove_attribute(&mut self.attributes, name)
    }

    pub fn bandwidth(&self, bwtype: &str) -> Option<u64> {
        find_bandwidth(&self.bandwidths, bwtype)
    }

    pub fn set_bandwidth(&mut self, bwtype: &str, value: u64) {
        set_bandwidth(&mut self.bandwidths, bwtype, value)
    }

    /// Media descriptions of type `media`, e.g. `audio`.
    pub fn media_of_type<'a>(&'a self, media: &'a str) -> impl Iterator<Item = &'a MediaDescription> + 'a {
        self.media.iter().filter(move |m| m.media.media == media)
    }

    /// Renders the body in RFC 4566 field order.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        let mut push = |field: SdpField| out.push_str(&field.encode());

        if let Some(v) = self.version {
            push(SdpField::Version(v));
        }
        if let Some(o) = &self.origin {
            push(SdpField::Origin(o.clone()));
        }
        if let Some(s) = &self.session_name {
            push(SdpField::SessionName(s.clone()));
        }
        if let Some(i) = &self.information {
            push(SdpField::Information(i.clone()));
        }
        if let Some(u) = &self.uri {
            push(SdpField::Uri(u.clone()));
        }
        for e in &self.emails {
            push(SdpField::Email(e.clone()));
        }
        for p in &self.phones {
            push(SdpField::Phone(p.clone()));
        }
        if let Some(c) = &self.connection {
            push(SdpField::Connection(c.clone()));
        }
        for b in &self.bandwidths {
            push(SdpField::Bandwidth(b.clone()));
        }
        for td in &self.time_descriptions {
            push(SdpField::Time(td.time));
            for r in &td.repeats {
                push(SdpField::Repeat(r.clone()));
            }
        }
        if let Some(z) = &self.zone {
            push(SdpField::Zone(z.clone()));
        }
        if let Some(k) = &self.key {
            push(SdpField::Key(k.clone()));
        }
        for a in &self.attributes {
            push(SdpField::Attribute(a.clone()));
        }

        for media in &self.media {
            media.encode_into(&mut out);
        }
        out
    }
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for SessionDescription {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn find_attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attributes.iter().find(|a| a.name == name)
}

// Replaces the first attribute with this name, or appends.
fn set_attribute(attributes: &mut Vec<Attribute>, name: &str, value: Option<&str>) {
    let attribute = Attribute::new(name, value);
    match attributes.iter_mut().find(|a| a.name == name) {
        Some(existing) => *existing = attribute,
        None => attributes.push(attribute),
    }
}

fn remove_attribute(attributes: &mut Vec<Attribute>, name: &str) -> Option<Attribute> {
    let index = attributes.iter().position(|a| a.name == name)?;
    Some(attributes.remove(index))
}

fn find_bandwidth(bandwidths: &[Bandwidth], bwtype: &str) -> Option<u64> {
    bandwidths
        .iter()
        .find(|b| b.bwtype.eq_ignore_ascii_case(bwtype))
        .map(|b| b.value)
}

fn set_bandwidth(bandwidths: &mut Vec<Bandwidth>, bwtype: &str, value: u64) {
    match bandwidths.iter_mut().find(|b| b.bwtype.eq_ignore_ascii_case(bwtype)) {
        Some(existing) => existing.value = value,
        None => bandwidths.push(Bandwidth {
            bwtype: bwtype.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFER: &str = "v=0\r\n\
        o=jdoe 2890844526 2890842807 IN IP4 10.47.16.5\r\n\
        s=SDP Seminar\r\n\
        i=A Seminar on the session description protocol\r\n\
        u=http://www.example.com/seminars/sdp.pdf\r\n\
        e=j.doe@example.com (Jane Doe)\r\n\
        c=IN IP4 224.2.17.12/127\r\n\
        b=CT:1000\r\n\
        t=2873397496 2873404696\r\n\
        r=7d 1h 0 25h\r\n\
        a=recvonly\r\n\
        m=audio 49170 RTP/AVP 0\r\n\
        i=voice\r\n\
        b=AS:64\r\n\
        m=video 51372 RTP/AVP 99\r\n\
        c=IN IP4 10.0.0.2\r\n\
        a=rtpmap:99 h263-1998/90000\r\n";

    #[test]
    fn test_fields_are_scoped_to_current_media() {
        let sdp = SessionDescription::parse(OFFER).unwrap();
        assert_eq!(sdp.information.as_ref().map(|i| i.0.as_str()), Some("A Seminar on the session description protocol"));
        assert_eq!(sdp.bandwidth("ct"), Some(1000));
        assert_eq!(sdp.attributes.len(), 1);
        assert_eq!(sdp.media.len(), 2);

        let audio = &sdp.media[0];
        assert_eq!(audio.information.as_ref().map(|i| i.0.as_str()), Some("voice"));
        assert_eq!(audio.bandwidth("AS"), Some(64));
        assert!(audio.attributes.is_empty());

        let video = &sdp.media[1];
        assert_eq!(video.connections.len(), 1);
        assert_eq!(video.attribute("rtpmap").and_then(|a| a.value.as_deref()), Some("99 h263-1998/90000"));
        assert_eq!(sdp.time_descriptions[0].repeats.len(), 1);
    }

    #[test]
    fn test_encode_reproduces_body() {
        let sdp = SessionDescription::parse(OFFER).unwrap();
        assert_eq!(sdp.encode(), OFFER);
        assert_eq!(SessionDescription::parse(&sdp.encode()).unwrap(), sdp);
    }

    #[test]
    fn test_repeat_without_time_is_error() {
        let err = SessionDescription::parse("v=0\r\nr=7d 1h 0\r\n").unwrap_err();
        assert!(matches!(err, Error::Grammar { ref field, .. } if field == "r="));
    }

    #[test]
    fn test_first_bad_line_aborts() {
        assert!(SessionDescription::parse("v=0\r\nx=unknown\r\ns=-\r\n").is_err());
        assert!(SessionDescription::parse("v=0\r\nm=audio 1 RTP/AVP\r\n").is_err());
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let sdp = SessionDescription::parse("v=0\n\ns=-\n").unwrap();
        assert_eq!(sdp.session_name, Some(SessionName("-".into())));
    }

    #[test]
    fn test_attribute_mutators() {
        let mut sdp = SessionDescription::parse(OFFER).unwrap();
        sdp.set_attribute("recvonly", None);
        assert_eq!(sdp.attributes.len(), 1);
        sdp.set_attribute("tool", Some("sipkit"));
        assert_eq!(sdp.attribute("tool").and_then(|a| a.value.as_deref()), Some("sipkit"));
        assert!(sdp.remove_attribute("recvonly").is_some());
        assert!(sdp.remove_attribute("recvonly").is_none());

        let video = &mut sdp.media[1];
        video.set_port(0);
        video.set_bandwidth("AS", 256);
        assert!(sdp.encode().contains("m=video 0 RTP/AVP 99\r\nc=IN IP4 10.0.0.2\r\nb=AS:256\r\n"));
        assert_eq!(sdp.media_of_type("audio").count(), 1);
    }
}
