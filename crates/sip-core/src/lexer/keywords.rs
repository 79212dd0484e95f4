//! Named keyword tables shared by every lexer selecting the same mode.
//!
//! Tables live in a process-wide registry guarded by a `RwLock` inside a
//! `once_cell::sync::Lazy`. A table is built the first time any lexer selects
//! its mode and is handed out as an `Arc` afterwards, so concurrent first use
//! from several threads builds each table exactly once.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Keywords recognised by the built-in lexer modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    // URI schemes
    Sip,
    Sips,
    Tel,
    // URI parameter names
    Transport,
    User,
    Method,
    Ttl,
    Maddr,
    Lr,
    Phone,
    Ip,
    // Header names
    Contact,
    From,
    To,
    CallId,
    CSeq,
    Expires,
    ContentType,
    ContentLength,
    Via,
    MaxForwards,
    Event,
    Supported,
    Subject,
    Route,
    RecordRoute,
    // Methods
    Invite,
    Ack,
    Bye,
    Cancel,
    Register,
    Options,
    Subscribe,
    Notify,
    Refer,
    Message,
    Info,
    Prack,
    Update,
    Publish,
}

impl Keyword {
    /// Canonical spelling used when re-encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Sip => "sip",
            Keyword::Sips => "sips",
            Keyword::Tel => "tel",
            Keyword::Transport => "transport",
            Keyword::User => "user",
            Keyword::Method => "method",
            Keyword::Ttl => "ttl",
            Keyword::Maddr => "maddr",
            Keyword::Lr => "lr",
            Keyword::Phone => "phone",
            Keyword::Ip => "ip",
            Keyword::Contact => "Contact",
            Keyword::From => "From",
            Keyword::To => "To",
            Keyword::CallId => "Call-ID",
            Keyword::CSeq => "CSeq",
            Keyword::Expires => "Expires",
            Keyword::ContentType => "Content-Type",
            Keyword::ContentLength => "Content-Length",
            Keyword::Via => "Via",
            Keyword::MaxForwards => "Max-Forwards",
            Keyword::Event => "Event",
            Keyword::Supported => "Supported",
            Keyword::Subject => "Subject",
            Keyword::Route => "Route",
            Keyword::RecordRoute => "Record-Route",
            Keyword::Invite => "INVITE",
            Keyword::Ack => "ACK",
            Keyword::Bye => "BYE",
            Keyword::Cancel => "CANCEL",
            Keyword::Register => "REGISTER",
            Keyword::Options => "OPTIONS",
            Keyword::Subscribe => "SUBSCRIBE",
            Keyword::Notify => "NOTIFY",
            Keyword::Refer => "REFER",
            Keyword::Message => "MESSAGE",
            Keyword::Info => "INFO",
            Keyword::Prack => "PRACK",
            Keyword::Update => "UPDATE",
            Keyword::Publish => "PUBLISH",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lexer modes, each naming one keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexerMode {
    /// URI schemes and URI parameter names
    SipUrl,
    /// SIP header names, including compact forms
    CommandKeyword,
    /// SIP request methods
    MethodKeyword,
    /// SDP lines; no keywords
    Sdp,
}

impl LexerMode {
    pub fn name(&self) -> &'static str {
        match self {
            LexerMode::SipUrl => "sip_url",
            LexerMode::CommandKeyword => "command_keyword",
            LexerMode::MethodKeyword => "method_keyword",
            LexerMode::Sdp => "sdp",
        }
    }

    fn build_table(&self) -> KeywordTable {
        let mut table = KeywordTable::new(self.name());
        match self {
            LexerMode::SipUrl => {
                for kw in [
                    Keyword::Sip,
                    Keyword::Sips,
                    Keyword::Tel,
                    Keyword::Transport,
                    Keyword::User,
                    Keyword::Method,
                    Keyword::Ttl,
                    Keyword::Maddr,
                    Keyword::Lr,
                    Keyword::Phone,
                    Keyword::Ip,
                ] {
                    table.add(kw.as_str(), kw);
                }
            }
            LexerMode::CommandKeyword => {
                for kw in [
                    Keyword::Contact,
                    Keyword::From,
                    Keyword::To,
                    Keyword::CallId,
                    Keyword::CSeq,
                    Keyword::Expires,
                    Keyword::ContentType,
                    Keyword::ContentLength,
                    Keyword::Via,
                    Keyword::MaxForwards,
                    Keyword::Event,
                    Keyword::Supported,
                    Keyword::Subject,
                    Keyword::Route,
                    Keyword::RecordRoute,
                ] {
                    table.add(kw.as_str(), kw);
                }
                // RFC 3261 compact forms
                table.add("m", Keyword::Contact);
                table.add("f", Keyword::From);
                table.add("t", Keyword::To);
                table.add("i", Keyword::CallId);
                table.add("c", Keyword::ContentType);
                table.add("l", Keyword::ContentLength);
                table.add("v", Keyword::Via);
                table.add("o", Keyword::Event);
                table.add("k", Keyword::Supported);
                table.add("s", Keyword::Subject);
            }
            LexerMode::MethodKeyword => {
                for kw in [
                    Keyword::Invite,
                    Keyword::Ack,
                    Keyword::Bye,
                    Keyword::Cancel,
                    Keyword::Register,
                    Keyword::Options,
                    Keyword::Subscribe,
                    Keyword::Notify,
                    Keyword::Refer,
                    Keyword::Message,
                    Keyword::Info,
                    Keyword::Prack,
                    Keyword::Update,
                    Keyword::Publish,
                ] {
                    table.add(kw.as_str(), kw);
                }
            }
            LexerMode::Sdp => {}
        }
        table
    }
}

/// Case-insensitive keyword lookup table.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    name: &'static str,
    entries: HashMap<String, Keyword>,
}

impl KeywordTable {
    fn new(name: &'static str) -> Self {
        KeywordTable {
            name,
            entries: HashMap::new(),
        }
    }

    fn add(&mut self, text: &str, keyword: Keyword) {
        self.entries.insert(text.to_ascii_uppercase(), keyword);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Looks up `text` ignoring case.
    pub fn lookup(&self, text: &str) -> Option<Keyword> {
        self.entries.get(&text.to_ascii_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

static KEYWORD_TABLES: Lazy<RwLock<HashMap<&'static str, Arc<KeywordTable>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns the shared table for `mode`, building it on first use.
pub fn keyword_table(mode: LexerMode) -> Arc<KeywordTable> {
    {
        let tables = KEYWORD_TABLES.read().unwrap_or_else(|e| e.into_inner());
        if let Some(table) = tables.get(mode.name()) {
            return Arc::clone(table);
        }
    }
    let mut tables = KEYWORD_TABLES.write().unwrap_or_else(|e| e.into_inner());
    // Another thread may have won the race between the two locks.
    Arc::clone(
        tables
            .entry(mode.name())
            .or_insert_with(|| Arc::new(mode.build_table())),
    )
}
