//! Subcommand implementations. Each returns the text to print.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use sipkit_sip_core::prelude::*;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
}

fn render<T: Serialize>(value: &T, text: impl FnOnce(&T) -> String, output: Output) -> Result<String> {
    match output {
        Output::Text => Ok(text(value)),
        Output::Json => serde_json::to_string_pretty(value).context("serializing result"),
    }
}

/// Parses an SDP body and prints its canonical encoding.
pub fn sdp(text: &str, output: Output) -> Result<String> {
    let session = SessionDescription::parse(text).context("invalid SDP body")?;
    debug!(media = session.media.len(), "parsed session description");
    render(&session, |s| s.encode(), output)
}

pub fn address(text: &str, output: Output) -> Result<String> {
    let address = Address::parse(text).context("invalid address")?;
    render(
        &address,
        |a| {
            let mut lines = vec![a.encode(), format!("kind: {:?}", a.kind())];
            if let Some(name) = a.display_name() {
                lines.push(format!("display name: {}", name));
            }
            if let Some(scheme) = a.scheme() {
                lines.push(format!("scheme: {}", scheme));
            }
            if let Some(user) = a.user() {
                lines.push(format!("user: {}", user));
            }
            if let Some(host) = a.host() {
                lines.push(format!("host: {} ({:?})", host, host.kind()));
                lines.push(format!("port: {}", a.port()));
            }
            lines.join("\n")
        },
        output,
    )
}

pub fn uri(text: &str, output: Output) -> Result<String> {
    let uri = Uri::parse(text).context("invalid URI")?;
    render(
        &uri,
        |u| format!("{}\nscheme: {}\nsecure: {}", u.encode(), u.scheme(), u.is_secure()),
        output,
    )
}

pub fn host(text: &str, output: Output) -> Result<String> {
    let host = Host::new(text).context("invalid host")?;
    render(&host, |h| format!("{}\nkind: {:?}", h.encode(), h.kind()), output)
}

/// Reads `path`, or standard input when absent.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading standard input")?;
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_output() {
        assert_eq!(host("::1", Output::Text).unwrap(), "[::1]\nkind: Ipv6");
        assert!(host("bad host!", Output::Text).is_err());
    }

    #[test]
    fn test_address_text() {
        let out = address("\"Bob\" <sip:bob@biloxi.com:5070>", Output::Text).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "\"Bob\" <sip:bob@biloxi.com:5070>");
        assert!(lines.contains(&"display name: Bob"));
        assert!(lines.contains(&"port: 5070"));
    }

    #[test]
    fn test_uri_json() {
        let out = uri("sips:alice@atlanta.com", Output::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(value.is_object());
    }

    #[test]
    fn test_sdp_error_carries_cause() {
        let err = sdp("v=0\r\nt=x 0\r\n", Output::Text).unwrap_err();
        assert!(format!("{:#}", err).starts_with("invalid SDP body: "));
    }
}
