//! Session descriptions end to end.

use sipkit_sip_core::error::Error;
use sipkit_sip_core::sdp::fields::{Attribute, SdpField};
use sipkit_sip_core::sdp::SessionDescription;

const OFFER: &str = "v=0\r\n\
    o=alice 2890844526 2890844526 IN IP6 2001:db8::1\r\n\
    s=-\r\n\
    c=IN IP6 2001:db8::1\r\n\
    t=0 0\r\n\
    z=2882844526 -1h 2898848070 0\r\n\
    a=group:BUNDLE audio video\r\n\
    m=audio 49170 RTP/AVP 0 8 97\r\n\
    a=rtpmap:0 PCMU/8000\r\n\
    a=rtpmap:8 PCMA/8000\r\n\
    a=rtpmap:97 iLBC/8000\r\n\
    m=video 51372 RTP/AVP 31 32\r\n\
    b=AS:512\r\n\
    a=rtpmap:31 H261/90000\r\n";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

#[test]
fn test_offer_structure() {
    let sdp: SessionDescription = OFFER.parse().unwrap();
    assert_eq!(sdp.origin.as_ref().map(|o| o.address.is_ipv6()), Some(true));
    assert_eq!(sdp.zone.as_ref().map(|z| z.adjustments.len()), Some(2));
    assert_eq!(
        sdp.attribute("group").and_then(|a| a.value.as_deref()),
        Some("BUNDLE audio video")
    );

    let audio = &sdp.media[0];
    assert_eq!(audio.formats(), ["0", "8", "97"]);
    assert_eq!(audio.attributes_named("rtpmap").count(), 3);
    assert_eq!(audio.bandwidth("AS"), None);
    assert_eq!(sdp.media[1].bandwidth("AS"), Some(512));
}

#[test]
fn test_encode_is_stable() {
    let sdp = SessionDescription::parse(OFFER).unwrap();
    assert_eq!(sdp.to_string(), OFFER);
}

#[test]
fn test_answer_built_from_offer() {
    let mut answer = SessionDescription::parse(OFFER).unwrap();
    answer.media[1].set_port(0);
    answer.media[0].attributes.retain(|a| a.value.as_deref() != Some("97 iLBC/8000"));
    answer.media[0].set_attribute("sendrecv", None);

    let text = answer.encode();
    assert!(text.contains("m=video 0 RTP/AVP 31 32\r\n"));
    assert!(!text.contains("iLBC"));
    assert_eq!(
        answer.media[0].attributes.last(),
        Some(&Attribute::new("sendrecv", None))
    );
}

#[test]
fn test_error_names_offending_line_type() {
    init_tracing();
    let err = SessionDescription::parse("v=0\r\nt=0 zero\r\n").unwrap_err();
    match err {
        Error::Grammar { field, position, .. } => {
            assert_eq!(field, "t=");
            assert_eq!(position, 4);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_serde_round_trip() {
    let sdp = SessionDescription::parse(OFFER).unwrap();
    let json = serde_json::to_string(&sdp).unwrap();
    let back: SessionDescription = serde_json::from_str(&json).unwrap();
    assert_eq!(back, sdp);
    assert_eq!(
        back.media[0].attributes.first().cloned().map(SdpField::Attribute).map(|f| f.encode()),
        Some("a=rtpmap:0 PCMU/8000\r\n".to_string())
    );
}
