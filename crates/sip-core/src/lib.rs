//! # sipkit-sip-core
//!
//! Parsing and encoding core for SIP (RFC 3261) and SDP (RFC 4566).
//!
//! - [`lexer`]: a backtracking character lexer with per-mode keyword tables
//! - [`parser`]: recursive-descent parsers for URIs, addresses and messages
//! - [`types`]: hosts, URIs, addresses, headers, requests and responses
//! - [`sdp`]: SDP line parsers and the session description assembler
//!
//! ```
//! use sipkit_sip_core::prelude::*;
//!
//! let address: Address = "\"Bob\" <sip:bob@biloxi.com;transport=tcp>".parse().unwrap();
//! assert_eq!(address.display_name(), Some("Bob"));
//! assert_eq!(address.host().map(|h| h.as_str()), Some("biloxi.com"));
//! assert_eq!(
//!     address.uri().and_then(|u| u.as_sip()).and_then(|u| u.transport()),
//!     Some("tcp")
//! );
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod sdp;
pub mod types;

pub use error::{Error, LexicalError, Result};

/// Commonly used types.
pub mod prelude {
    pub use crate::error::{Error, LexicalError, Result};
    pub use crate::lexer::{Lexer, LexerMode};
    pub use crate::sdp::{MediaDescription, SdpField, SessionDescription};
    pub use crate::types::{
        Address, AddressKind, CSeq, ContactHeader, Header, Host, HostKind, HostPort, Method,
        NameValue, NameValueList, Request, Response, SipMessage, SipUri, TelUrl,
        TelephoneNumber, Uri,
    };
}
