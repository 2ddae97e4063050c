//! Transform registry: the named methods chains are built from

use crate::{EvasionLabError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Key used by `xor` chain steps that do not specify one
pub const DEFAULT_XOR_KEY: &str = "secret";

/// One named, parameterized step of a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

/// Ordered steps, applied left to right. Empty is identity.
pub type TransformChain = Vec<TransformSpec>;

impl TransformSpec {
    /// Create a step with no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    /// Attach a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    fn bool_param(&self, key: &str) -> Result<Option<bool>> {
        match self.params.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.invalid(format!("`{}` must be a boolean, got {}", key, other))),
        }
    }

    fn str_param(&self, key: &str) -> Result<Option<&str>> {
        match self.params.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(format!("`{}` must be a string, got {}", key, other))),
        }
    }

    fn reject_unknown_params(&self, allowed: &[&str]) -> Result<()> {
        match self.params.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(self.invalid(format!("unexpected parameter `{}`", key))),
            None => Ok(()),
        }
    }

    fn invalid(&self, reason: String) -> EvasionLabError {
        EvasionLabError::InvalidParameter {
            method: self.name.clone(),
            reason,
        }
    }
}

/// Encoder methods addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMethod {
    Base64,
    Rot13,
    Xor,
    Hex,
    Unicode,
}

impl EncodingMethod {
    /// Every encoder method, in registry order
    pub fn all() -> Vec<EncodingMethod> {
        vec![
            EncodingMethod::Base64,
            EncodingMethod::Rot13,
            EncodingMethod::Xor,
            EncodingMethod::Hex,
            EncodingMethod::Unicode,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            EncodingMethod::Base64 => "base64",
            EncodingMethod::Rot13 => "rot13",
            EncodingMethod::Xor => "xor",
            EncodingMethod::Hex => "hex",
            EncodingMethod::Unicode => "unicode",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EncodingMethod::Base64 => "Base64 encoding/decoding",
            EncodingMethod::Rot13 => "ROT13 substitution cipher",
            EncodingMethod::Xor => "XOR encryption with custom key",
            EncodingMethod::Hex => "Hexadecimal encoding",
            EncodingMethod::Unicode => "Unicode escape encoding",
        }
    }
}

impl fmt::Display for EncodingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncodingMethod {
    type Err = EvasionLabError;

    fn from_str(s: &str) -> Result<Self> {
        EncodingMethod::all()
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| EvasionLabError::UnknownMethod(s.to_string()))
    }
}

/// A resolved encoder step with its parameters checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingStep {
    Base64 { decode: bool },
    Rot13,
    Xor { key: String, decode: bool },
    Hex { decode: bool },
    Unicode,
}

impl EncodingStep {
    /// Resolve a `TransformSpec` against the encoder registry.
    ///
    /// Fails with `UnknownMethod` for names outside the registry, with
    /// `InvalidParameter` for mistyped or unexpected parameters and with
    /// `InvalidKey` for an empty xor key.
    pub fn resolve(spec: &TransformSpec) -> Result<Self> {
        let method: EncodingMethod = spec.name.parse()?;
        let step = match method {
            EncodingMethod::Base64 => {
                spec.reject_unknown_params(&["decode"])?;
                EncodingStep::Base64 {
                    decode: spec.bool_param("decode")?.unwrap_or(false),
                }
            }
            EncodingMethod::Rot13 => {
                spec.reject_unknown_params(&[])?;
                EncodingStep::Rot13
            }
            EncodingMethod::Xor => {
                spec.reject_unknown_params(&["key", "decode"])?;
                let key = spec.str_param("key")?.unwrap_or(DEFAULT_XOR_KEY);
                if key.is_empty() {
                    return Err(EvasionLabError::InvalidKey(
                        "XOR key cannot be empty".to_string(),
                    ));
                }
                EncodingStep::Xor {
                    key: key.to_string(),
                    decode: spec.bool_param("decode")?.unwrap_or(false),
                }
            }
            EncodingMethod::Hex => {
                spec.reject_unknown_params(&["decode"])?;
                EncodingStep::Hex {
                    decode: spec.bool_param("decode")?.unwrap_or(false),
                }
            }
            EncodingMethod::Unicode => {
                spec.reject_unknown_params(&[])?;
                EncodingStep::Unicode
            }
        };
        Ok(step)
    }

    pub fn method(&self) -> EncodingMethod {
        match self {
            EncodingStep::Base64 { .. } => EncodingMethod::Base64,
            EncodingStep::Rot13 => EncodingMethod::Rot13,
            EncodingStep::Xor { .. } => EncodingMethod::Xor,
            EncodingStep::Hex { .. } => EncodingMethod::Hex,
            EncodingStep::Unicode => EncodingMethod::Unicode,
        }
    }
}

impl From<EncodingMethod> for EncodingStep {
    fn from(method: EncodingMethod) -> Self {
        match method {
            EncodingMethod::Base64 => EncodingStep::Base64 { decode: false },
            EncodingMethod::Rot13 => EncodingStep::Rot13,
            EncodingMethod::Xor => EncodingStep::Xor {
                key: DEFAULT_XOR_KEY.to_string(),
                decode: false,
            },
            EncodingMethod::Hex => EncodingStep::Hex { decode: false },
            EncodingMethod::Unicode => EncodingStep::Unicode,
        }
    }
}

/// Obfuscator methods usable in a multi-layer pass.
/// All of them run with default parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObfuscationMethod {
    RandomInsert,
    Split,
    Reverse,
    Escape,
    Unicode,
    Homograph,
    CaseVary,
}

impl ObfuscationMethod {
    pub fn all() -> Vec<ObfuscationMethod> {
        vec![
            ObfuscationMethod::RandomInsert,
            ObfuscationMethod::Split,
            ObfuscationMethod::Reverse,
            ObfuscationMethod::Escape,
            ObfuscationMethod::Unicode,
            ObfuscationMethod::Homograph,
            ObfuscationMethod::CaseVary,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ObfuscationMethod::RandomInsert => "random_insert",
            ObfuscationMethod::Split => "split",
            ObfuscationMethod::Reverse => "reverse",
            ObfuscationMethod::Escape => "escape",
            ObfuscationMethod::Unicode => "unicode",
            ObfuscationMethod::Homograph => "homograph",
            ObfuscationMethod::CaseVary => "case_vary",
        }
    }
}

impl fmt::Display for ObfuscationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObfuscationMethod {
    type Err = EvasionLabError;

    fn from_str(s: &str) -> Result<Self> {
        ObfuscationMethod::all()
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| EvasionLabError::UnknownMethod(s.to_string()))
    }
}
