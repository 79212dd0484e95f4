//! Address, URI and contact behavior through the public API.

use sipkit_sip_core::error::Error;
use sipkit_sip_core::parser::{parse_address_header, parse_contact_list};
use sipkit_sip_core::types::{Address, AddressKind, ContactHeader, Uri};

#[test]
fn test_three_address_forms() {
    let wildcard: Address = "*".parse().unwrap();
    assert!(wildcard.is_wildcard());

    let spec: Address = "sip:alice@atlanta.com;transport=udp".parse().unwrap();
    assert_eq!(spec.kind(), AddressKind::AddressSpec);
    assert_eq!(spec.parameter("transport"), Some("udp"));

    let named: Address = "Alice Smith <sip:alice@atlanta.com>".parse().unwrap();
    assert_eq!(named.kind(), AddressKind::NameAddr);
    assert_eq!(named.display_name(), Some("Alice Smith"));
    assert_eq!(named.to_string(), "\"Alice Smith\" <sip:alice@atlanta.com>");
}

#[test]
fn test_header_parameters_stay_outside_bare_uri() {
    let (address, params) = parse_address_header("sip:bob@biloxi.com;tag=8321234356").unwrap();
    assert_eq!(address.to_string(), "sip:bob@biloxi.com");
    assert_eq!(params.get_value("tag"), Some("8321234356"));

    let (address, params) =
        parse_address_header("\"Bob\" <sip:bob@biloxi.com;lr>;tag=a6c85cf").unwrap();
    assert!(address.has_parameter("lr"));
    assert_eq!(params.names(), vec!["tag"]);
}

#[test]
fn test_wildcard_is_immutable_through_contacts() {
    let contacts = parse_contact_list("*").unwrap();
    assert_eq!(contacts.len(), 1);
    assert!(contacts[0].is_wildcard());

    let mut address = contacts[0].address.clone();
    assert_eq!(address.set_host("example.com"), Err(Error::ImmutableWildcard));
    assert_eq!(address.set_port(5060), Err(Error::ImmutableWildcard));
    assert_eq!(address.to_string(), "*");
}

#[test]
fn test_contact_list_with_expires_and_q() {
    let contacts = parse_contact_list(
        "<sip:alice@192.0.2.4>;expires=3600;q=0.7, \"Mobile\" <sip:alice@198.51.100.1:5070>",
    )
    .unwrap();
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0].expires(), Some(3600));
    assert_eq!(contacts[0].q(), Some(0.7));
    assert_eq!(contacts[1].address.port(), 5070);
    assert_eq!(contacts[1].address.display_name(), Some("Mobile"));

    let mut first: ContactHeader = contacts[0].clone();
    first.set_expires(Some(0));
    assert_eq!(first.expires(), Some(0));
    first.set_expires(None);
    assert_eq!(first.expires(), None);
}

#[test]
fn test_uri_schemes() {
    let sips = Uri::parse("sips:alice@atlanta.com:5061").unwrap();
    assert!(sips.is_secure());
    assert_eq!(sips.as_sip().and_then(|u| u.port()), Some(5061));

    let tel = Uri::parse("tel:+1-201-555-0123;phone-context=example.com").unwrap();
    assert!(tel.is_tel_url());
    assert_eq!(
        tel.as_tel().and_then(|t| t.number.phone_context()),
        Some("example.com")
    );

    let other = Uri::parse("mailto:alice@atlanta.com").unwrap();
    assert_eq!(other.scheme(), "mailto");
    assert_eq!(other.to_string(), "mailto:alice@atlanta.com");
}

#[test]
fn test_malformed_addresses_report_position() {
    let err = Address::parse("<sip:alice@atlanta.com").unwrap_err();
    assert!(err.position().is_some());
    assert!(Address::parse("sip:alice@").is_err());
    assert!(Address::parse("\"unterminated <sip:a@b.com>").is_err());
}
