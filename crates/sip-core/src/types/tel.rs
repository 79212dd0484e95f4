//! Telephone numbers and `tel:` URLs (RFC 3966).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::name_value::NameValueList;

/// Visual separators allowed inside a telephone number.
pub fn is_visual_separator(c: char) -> bool {
    matches!(c, '-' | '.' | '(' | ')')
}

fn is_global_digit(c: char) -> bool {
    c.is_ascii_digit() || is_visual_separator(c)
}

fn is_local_digit(c: char) -> bool {
    c.is_ascii_hexdigit() || c == '*' || c == '#' || is_visual_separator(c)
}

/// A global (`+`) or local telephone number with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelephoneNumber {
    pub global: bool,
    /// Digits and visual separators, without the leading `+`
    pub number: String,
    /// `isub` parameter
    pub isdn_subaddress: Option<String>,
    /// `postd` parameter
    pub post_dial: Option<String>,
    /// Every other parameter, `phone-context` included
    pub parameters: NameValueList,
}

impl TelephoneNumber {
    /// Builds a number from its digit text; a leading `+` makes it global.
    pub fn new(text: &str) -> Result<Self> {
        let (global, digits) = match text.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        Self::check_digits(global, digits)?;
        Ok(TelephoneNumber {
            global,
            number: digits.to_string(),
            isdn_subaddress: None,
            post_dial: None,
            parameters: NameValueList::new(';'),
        })
    }

    pub(crate) fn check_digits(global: bool, digits: &str) -> Result<()> {
        let valid = if global {
            digits.chars().any(|c| c.is_ascii_digit()) && digits.chars().all(is_global_digit)
        } else {
            !digits.is_empty() && digits.chars().all(is_local_digit)
        };
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!("illegal telephone number: {}", digits)))
        }
    }

    pub fn phone_context(&self) -> Option<&str> {
        self.parameters.get_value("phone-context")
    }

    pub fn set_phone_context(&mut self, context: Option<&str>) {
        match context {
            Some(c) => self.parameters.set("phone-context", Some(c)),
            None => {
                self.parameters.remove("phone-context");
            }
        }
    }

    /// Digits only, visual separators removed.
    pub fn digits(&self) -> String {
        self.number.chars().filter(|c| !is_visual_separator(*c)).collect()
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TelephoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.global {
            f.write_str("+")?;
        }
        f.write_str(&self.number)?;
        if let Some(isub) = &self.isdn_subaddress {
            write!(f, ";isub={}", isub)?;
        }
        if let Some(postd) = &self.post_dial {
            write!(f, ";postd={}", postd)?;
        }
        if !self.parameters.is_empty() {
            write!(f, ";{}", self.parameters)?;
        }
        Ok(())
    }
}

impl FromStr for TelephoneNumber {
    type Err = Error;

    /// Parses `number[;param]*`, as found after `tel:` or in a SIP user part.
    fn from_str(s: &str) -> Result<Self> {
        crate::parser::uri::parse_telephone_number(s)
    }
}

/// A `tel:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelUrl {
    pub number: TelephoneNumber,
}

impl TelUrl {
    pub fn new(number: TelephoneNumber) -> Self {
        TelUrl { number }
    }

    pub fn is_global(&self) -> bool {
        self.number.global
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TelUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tel:{}", self.number)
    }
}
