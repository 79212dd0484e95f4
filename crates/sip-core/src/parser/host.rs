//! nom recognizers for the three host literal forms.

use std::net::{Ipv4Addr, Ipv6Addr};

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1, take_while_m_n},
    character::complete::char,
    combinator::{all_consuming, map_res, opt, recognize, verify},
    multi::separated_list1,
    sequence::{delimited, terminated, tuple},
    IResult,
};

// IPv4address = 1*3DIGIT "." 1*3DIGIT "." 1*3DIGIT "." 1*3DIGIT
// Recognized first, then validated by std so that octets above 255 fail.
pub(crate) fn ipv4_address(input: &str) -> IResult<&str, Ipv4Addr> {
    let octet = || take_while_m_n(1, 3, |c: char| c.is_ascii_digit());
    map_res(
        recognize(tuple((
            octet(),
            tag("."),
            octet(),
            tag("."),
            octet(),
            tag("."),
            octet(),
        ))),
        |s: &str| s.parse::<Ipv4Addr>(),
    )(input)
}

fn label(input: &str) -> IResult<&str, &str> {
    verify(
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-'),
        |s: &str| !s.starts_with('-') && !s.ends_with('-'),
    )(input)
}

// hostname = *( domainlabel "." ) toplabel [ "." ]
// toplabel = ALPHA / ALPHA *( alphanum / "-" ) alphanum
pub(crate) fn hostname(input: &str) -> IResult<&str, &str> {
    recognize(terminated(
        verify(separated_list1(char('.'), label), |labels: &Vec<&str>| {
            labels
                .last()
                .and_then(|top| top.chars().next())
                .map(|c| c.is_ascii_alphabetic())
                .unwrap_or(false)
        }),
        opt(char('.')),
    ))(input)
}

fn ipv6_chars(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_hexdigit() || c == ':' || c == '.')(input)
}

// IPv6reference = "[" IPv6address "]", brackets optional on input
pub(crate) fn ipv6_reference(input: &str) -> IResult<&str, Ipv6Addr> {
    let bracketed = delimited(char('['), ipv6_chars, char(']'));
    map_res(alt((bracketed, ipv6_chars)), |s: &str| {
        s.parse::<Ipv6Addr>()
    })(input)
}

pub(crate) fn is_ipv4(text: &str) -> bool {
    all_consuming(ipv4_address)(text).is_ok()
}

pub(crate) fn is_hostname(text: &str) -> bool {
    all_consuming(hostname)(text).is_ok()
}

pub(crate) fn parse_ipv6(text: &str) -> Option<Ipv6Addr> {
    all_consuming(ipv6_reference)(text).ok().map(|(_, addr)| addr)
}
