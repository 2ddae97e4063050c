use evasionlab_core::{EvasionLabError, PayloadEncoder, TransformSpec};

#[test]
fn test_chain_base64_then_rot13() {
    let encoder = PayloadEncoder::new();
    let chain = vec![TransformSpec::new("base64"), TransformSpec::new("rot13")];

    let chained = encoder.chain("whoami", &chain).unwrap();
    let sequential = encoder.rot13(&encoder.base64_encode("whoami"));

    assert_eq!(chained, sequential);
    assert_eq!(chained, "q2uiLJ1c");
    assert_ne!(chained, encoder.base64_encode("whoami"));
    assert_ne!(chained, encoder.rot13("whoami"));
}

#[test]
fn test_empty_chain_is_identity() {
    let encoder = PayloadEncoder::new();
    assert_eq!(encoder.chain("whoami", &[]).unwrap(), "whoami");
}

#[test]
fn test_chain_with_parameters_round_trips() {
    let encoder = PayloadEncoder::new();
    let forward = vec![
        TransformSpec::new("xor").with_param("key", "k3y"),
        TransformSpec::new("base64"),
    ];
    let backward = vec![
        TransformSpec::new("base64").with_param("decode", true),
        TransformSpec::new("xor")
            .with_param("key", "k3y")
            .with_param("decode", true),
    ];

    let encoded = encoder.chain("net user /add", &forward).unwrap();
    assert_eq!(encoder.chain(&encoded, &backward).unwrap(), "net user /add");
}

#[test]
fn test_chain_validates_before_applying() {
    let encoder = PayloadEncoder::new();
    // The bad step comes last; nothing is returned
    let chain = vec![
        TransformSpec::new("base64"),
        TransformSpec::new("rot13"),
        TransformSpec::new("gzip"),
    ];

    let err = encoder.chain("whoami", &chain).unwrap_err();
    assert!(matches!(err, EvasionLabError::UnknownMethod(ref name) if name == "gzip"));
}

#[test]
fn test_chain_step_failure_aborts() {
    let encoder = PayloadEncoder::new();
    // rot13 output is not valid hex
    let chain = vec![
        TransformSpec::new("rot13"),
        TransformSpec::new("hex").with_param("decode", true),
    ];
    assert!(matches!(
        encoder.chain("whoami", &chain),
        Err(EvasionLabError::Format(_))
    ));
}

#[test]
fn test_hex_decode_rejects_malformed() {
    let encoder = PayloadEncoder::new();
    for bad in ["abc", "zz", "7768 6f", "0x77"] {
        assert!(
            matches!(encoder.hex_decode(bad), Err(EvasionLabError::Format(_))),
            "{:?} should be rejected",
            bad
        );
    }
}

#[test]
fn test_hex_decode_rejects_non_utf8() {
    let encoder = PayloadEncoder::new();
    assert!(matches!(
        encoder.hex_decode("ff"),
        Err(EvasionLabError::Format(_))
    ));
}

#[test]
fn test_base64_decode_rejects_malformed() {
    let encoder = PayloadEncoder::new();
    for bad in ["d2hvYW1", "d2hvYW1p=", "d2h*YW1p", "===="] {
        assert!(
            matches!(encoder.base64_decode(bad), Err(EvasionLabError::Format(_))),
            "{:?} should be rejected",
            bad
        );
    }
}

#[test]
fn test_base64_flag_dispatch() {
    let encoder = PayloadEncoder::new();
    assert_eq!(encoder.base64("whoami", false).unwrap(), "d2hvYW1p");
    assert_eq!(encoder.base64("d2hvYW1p", true).unwrap(), "whoami");
}

#[test]
fn test_xor_decode_with_wrong_key_differs() {
    let encoder = PayloadEncoder::new();
    let encoded = encoder.xor("whoami", "secret", false).unwrap();
    assert_eq!(encoded.len(), 12);
    assert_ne!(encoder.xor(&encoded, "other!", true).unwrap(), "whoami");
}

#[test]
fn test_empty_payload() {
    let encoder = PayloadEncoder::new();
    assert_eq!(encoder.base64_encode(""), "");
    assert_eq!(encoder.base64_decode("").unwrap(), "");
    assert_eq!(encoder.rot13(""), "");
    assert_eq!(encoder.xor_encode("", "secret").unwrap(), "");
    assert_eq!(encoder.xor_decode("", "secret").unwrap(), "");
    assert_eq!(encoder.hex_encode(""), "");
    assert_eq!(encoder.hex_decode("").unwrap(), "");
    assert_eq!(encoder.unicode_escape(""), "");
}
