//! Naive signature detector
//!
//! Literal, case-insensitive substring matching. No word boundaries, no
//! regex semantics, no scoring.

use crate::{EvasionLabError, Result};
use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Command names flagged on sight
pub const DEFAULT_SIGNATURES: &[&str] = &[
    "whoami",
    "tasklist",
    "powershell",
    "cmd.exe",
    "nc.exe",
    "bash",
    "sh",
    "wget",
    "curl",
    "ncat",
];

/// Execution-related keywords
pub const DEFAULT_KEYWORDS: &[&str] = &["exec", "system", "subprocess", "shell", "eval"];

static DEFAULT_SIGNATURE_SET: Lazy<SignatureSet> =
    Lazy::new(|| SignatureSet::new(DEFAULT_SIGNATURES.to_vec(), DEFAULT_KEYWORDS.to_vec()));

static DEFAULT_AUTOMATON: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::new(DEFAULT_SIGNATURE_SET.needles())
        .expect("default signatures are valid literals")
});

/// Signatures and keywords, stored lowercase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSet {
    signatures: Vec<String>,
    keywords: Vec<String>,
}

impl SignatureSet {
    pub fn new<S, K>(signatures: Vec<S>, keywords: Vec<K>) -> Self
    where
        S: AsRef<str>,
        K: AsRef<str>,
    {
        Self {
            signatures: signatures.iter().map(|s| s.as_ref().to_lowercase()).collect(),
            keywords: keywords.iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty() && self.keywords.is_empty()
    }

    fn needles(&self) -> impl Iterator<Item = &String> {
        self.signatures.iter().chain(self.keywords.iter())
    }
}

impl Default for SignatureSet {
    fn default() -> Self {
        DEFAULT_SIGNATURE_SET.clone()
    }
}

/// Outcome of checking an original payload against its transformed form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvasionResult {
    pub original_detected: bool,
    pub transformed_detected: bool,
    /// Flagged before the transform and not after it
    pub evasion_success: bool,
}

impl EvasionResult {
    pub fn new(original_detected: bool, transformed_detected: bool) -> Self {
        Self {
            original_detected,
            transformed_detected,
            evasion_success: original_detected && !transformed_detected,
        }
    }
}

/// Detector over an immutable signature set
#[derive(Debug, Clone)]
pub struct Detector {
    signatures: SignatureSet,
    automaton: AhoCorasick,
}

impl Detector {
    /// Detector with the built-in signatures and keywords
    pub fn new() -> Self {
        Self {
            signatures: SignatureSet::default(),
            automaton: DEFAULT_AUTOMATON.clone(),
        }
    }

    pub fn with_signatures(signatures: SignatureSet) -> Result<Self> {
        let automaton = AhoCorasick::new(signatures.needles())
            .map_err(|e| EvasionLabError::Configuration(format!("signature set: {}", e)))?;
        Ok(Self {
            signatures,
            automaton,
        })
    }

    pub fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    /// True iff any signature or keyword occurs in the lowercased payload
    pub fn detect(&self, payload: &str) -> bool {
        self.automaton.is_match(&payload.to_lowercase())
    }

    /// Distinct signatures and keywords found in the payload, in set order
    pub fn matches(&self, payload: &str) -> Vec<String> {
        let lowered = payload.to_lowercase();
        let mut found: Vec<String> = Vec::new();
        for needle in self.signatures.needles() {
            if lowered.contains(needle.as_str()) && !found.contains(needle) {
                found.push(needle.clone());
            }
        }
        found
    }

    pub fn compare_evasion(&self, original: &str, transformed: &str) -> EvasionResult {
        EvasionResult::new(self.detect(original), self.detect(transformed))
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}
