//! # SIP types
//!
//! The value model: name-value parameters, hosts, URIs, addresses, headers
//! and messages. Every type renders its wire form through `Display` and most
//! parse it back through `FromStr`.

pub mod address;
pub mod header;
pub mod host;
pub mod message;
pub mod method;
pub mod name_value;
pub mod tel;
pub mod uri;

pub use address::{Address, AddressKind};
pub use header::{canonical_name, encode_contact_list, CSeq, ContactHeader, Header};
pub use host::{check_port, Host, HostKind, HostPort};
pub use message::{reason_phrase, Request, Response, SipMessage, SIP_VERSION};
pub use method::Method;
pub use name_value::{NameValue, NameValueList};
pub use tel::{TelUrl, TelephoneNumber};
pub use uri::{GenericUri, SipUri, Uri};
