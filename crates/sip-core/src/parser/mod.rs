//! # Parsers
//!
//! Recursive-descent parsers for SIP URIs, addresses and messages. They are
//! built on the [`Lexer`](crate::lexer::Lexer) and share the sub-grammars of
//! [`ParserCore`]. Host names and IP literals are recognized with `nom`
//! combinators in [`host`].

pub mod address;
pub mod core;
pub mod host;
pub mod message;
pub mod uri;

pub use self::address::{parse_address, parse_address_header, parse_contact_list, AddressParser};
pub use self::core::{CoreParser, ParserCore};
pub use self::message::{parse_request, parse_response};
pub use self::uri::{parse_telephone_number, parse_uri, UriContext, UriParser};
