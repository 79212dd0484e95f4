//! # SDP
//!
//! Session Description Protocol (RFC 4566): one typed value per line in
//! [`fields`], one parser per line type in [`parser`], and the
//! [`SessionDescription`] that assembles a full body.

pub mod fields;
pub mod parser;
pub mod session;

pub use fields::SdpField;
pub use parser::{parse_field, SdpFieldParser};
pub use session::{MediaDescription, SessionDescription, TimeDescription};
