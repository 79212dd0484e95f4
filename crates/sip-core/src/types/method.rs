use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lexer::{is_token_char, keyword_table, Keyword, LexerMode};

/// SIP request methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
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
    /// Any other token
    Extension(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Invite => "INVITE",
            Method::Ack => "ACK",
            Method::Bye => "BYE",
            Method::Cancel => "CANCEL",
            Method::Register => "REGISTER",
            Method::Options => "OPTIONS",
            Method::Subscribe => "SUBSCRIBE",
            Method::Notify => "NOTIFY",
            Method::Refer => "REFER",
            Method::Message => "MESSAGE",
            Method::Info => "INFO",
            Method::Prack => "PRACK",
            Method::Update => "UPDATE",
            Method::Publish => "PUBLISH",
            Method::Extension(name) => name,
        }
    }

    fn from_keyword(keyword: Keyword) -> Option<Self> {
        Some(match keyword {
            Keyword::Invite => Method::Invite,
            Keyword::Ack => Method::Ack,
            Keyword::Bye => Method::Bye,
            Keyword::Cancel => Method::Cancel,
            Keyword::Register => Method::Register,
            Keyword::Options => Method::Options,
            Keyword::Subscribe => Method::Subscribe,
            Keyword::Notify => Method::Notify,
            Keyword::Refer => Method::Refer,
            Keyword::Message => Method::Message,
            Keyword::Info => Method::Info,
            Keyword::Prack => Method::Prack,
            Keyword::Update => Method::Update,
            Keyword::Publish => Method::Publish,
            _ => return None,
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(method) = keyword_table(LexerMode::MethodKeyword)
            .lookup(s)
            .and_then(Method::from_keyword)
        {
            return Ok(method);
        }
        if s.is_empty() || !s.chars().all(is_token_char) {
            return Err(Error::InvalidArgument(format!("illegal method: {}", s)));
        }
        Ok(Method::Extension(s.to_string()))
    }
}
