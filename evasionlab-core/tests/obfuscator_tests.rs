use evasionlab_core::{ObfuscationMethod, StringObfuscator};

#[test]
fn test_seeded_obfuscators_are_reproducible() {
    let mut first = StringObfuscator::with_seed(42);
    let mut second = StringObfuscator::with_seed(42);

    for _ in 0..5 {
        assert_eq!(
            first.random_insert("powershell -enc", Some(4)),
            second.random_insert("powershell -enc", Some(4))
        );
        assert_eq!(
            first.case_vary("powershell -enc"),
            second.case_vary("powershell -enc")
        );
    }
}

#[test]
fn test_random_insert_default_count() {
    let mut obf = StringObfuscator::with_seed(7);
    // max(1, 6 / 3) == 2
    assert_eq!(obf.random_insert("whoami", None).chars().count(), 8);
    // max(1, 2 / 3) == 1
    assert_eq!(obf.random_insert("id", None).chars().count(), 3);
}

#[test]
fn test_random_insert_keeps_original_order() {
    let mut obf = StringObfuscator::with_seed(3);
    let out = obf.random_insert("whoami", Some(5));

    // Removing inserted characters one by one must leave the payload as a subsequence
    let mut remaining = "whoami".chars().peekable();
    for c in out.chars() {
        if remaining.peek() == Some(&c) {
            remaining.next();
        } else {
            assert!(c.is_ascii_alphanumeric());
        }
    }
    assert!(remaining.next().is_none());
}

#[test]
fn test_case_vary_only_changes_case() {
    let mut obf = StringObfuscator::with_seed(11);
    let out = obf.case_vary("cmd.exe /c whoami");
    assert_eq!(out.to_lowercase(), "cmd.exe /c whoami");
}

#[test]
fn test_multi_layer_applies_in_order() {
    let mut obf = StringObfuscator::with_seed(1);
    assert_eq!(obf.multi_layer("a b", &["reverse", "escape"]), "b\\x20a");
    assert_eq!(obf.multi_layer("ab", &["split", "reverse"]), "b\"+\" \"a");
}

#[test]
fn test_multi_layer_skips_unknown_methods() {
    let mut obf = StringObfuscator::with_seed(1);
    let with_unknown = obf.multi_layer("whoami", &["reverse", "base64", "split"]);
    let known_only = obf.multi_layer("whoami", &["reverse", "split"]);
    assert_eq!(with_unknown, known_only);
    assert_eq!(obf.multi_layer("whoami", &["nope"]), "whoami");
}

#[test]
fn test_multi_layer_empty_list_is_identity() {
    let mut obf = StringObfuscator::with_seed(1);
    let methods: [&str; 0] = [];
    assert_eq!(obf.multi_layer("whoami", &methods), "whoami");
}

#[test]
fn test_empty_payload_through_every_method() {
    let mut obf = StringObfuscator::with_seed(5);
    for method in ObfuscationMethod::all() {
        assert_eq!(obf.apply(method, ""), "", "{} on empty payload", method);
    }
    assert_eq!(obf.variable_concat("").expression, "");
    assert!(obf.variable_concat("").variables.is_empty());
}

#[test]
fn test_unicode_escape_matches_encoder() {
    let obf = StringObfuscator::with_seed(1);
    let encoder = evasionlab_core::PayloadEncoder::new();
    assert_eq!(obf.unicode_escape("sh"), encoder.unicode_escape("sh"));
}
