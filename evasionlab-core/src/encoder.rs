//! Deterministic, mostly reversible payload encodings

use crate::transform::{EncodingMethod, EncodingStep, TransformSpec};
use crate::{EvasionLabError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::BTreeMap;
use tracing::debug;

/// Prefix of an XOR value wider than one byte
const WIDE_XOR_MARKER: char = 'u';

/// Stateless encoder. Safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadEncoder;

impl PayloadEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode or decode with standard padded Base64
    pub fn base64(&self, payload: &str, decode: bool) -> Result<String> {
        if decode {
            self.base64_decode(payload)
        } else {
            Ok(self.base64_encode(payload))
        }
    }

    pub fn base64_encode(&self, payload: &str) -> String {
        STANDARD.encode(payload.as_bytes())
    }

    pub fn base64_decode(&self, payload: &str) -> Result<String> {
        let bytes = STANDARD.decode(payload)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// ROT13 over ASCII letters; self-inverse
    pub fn rot13(&self, payload: &str) -> String {
        payload
            .chars()
            .map(|c| match c {
                'a'..='z' => rotate(c, b'a'),
                'A'..='Z' => rotate(c, b'A'),
                _ => c,
            })
            .collect()
    }

    /// XOR with a repeating key, in either direction
    pub fn xor(&self, payload: &str, key: &str, decode: bool) -> Result<String> {
        if decode {
            self.xor_decode(payload, key)
        } else {
            self.xor_encode(payload, key)
        }
    }

    /// XOR each character's code point with the key's character at the same
    /// position (key repeated). A result up to 0xff is written as two
    /// lowercase hex digits; a wider result as `u` plus six hex digits.
    pub fn xor_encode(&self, payload: &str, key: &str) -> Result<String> {
        let key = key_chars(key)?;
        let mut out = String::with_capacity(payload.len() * 2);
        for (c, k) in payload.chars().zip(key.iter().cycle()) {
            let value = c as u32 ^ *k as u32;
            if value <= 0xff {
                out.push_str(&format!("{:02x}", value));
            } else {
                out.push(WIDE_XOR_MARKER);
                out.push_str(&format!("{:06x}", value));
            }
        }
        Ok(out)
    }

    /// Reverse of [`xor_encode`](Self::xor_encode) for the same key
    pub fn xor_decode(&self, payload: &str, key: &str) -> Result<String> {
        let key = key_chars(key)?;
        let mut out = String::new();
        let mut rest = payload;
        let mut index = 0;

        while !rest.is_empty() {
            let (width, digits) = match rest.strip_prefix(WIDE_XOR_MARKER) {
                Some(tail) => (6, tail),
                None => (2, rest),
            };
            let chunk = digits.get(..width).ok_or_else(|| {
                EvasionLabError::Format(format!("truncated XOR value at `{}`", rest))
            })?;
            let value = hex::decode(chunk)?
                .iter()
                .fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
            let code = value ^ key[index % key.len()] as u32;
            let c = char::from_u32(code).ok_or_else(|| {
                EvasionLabError::Format(format!("XOR result {:#x} is not a character", code))
            })?;

            out.push(c);
            rest = &digits[width..];
            index += 1;
        }
        Ok(out)
    }

    /// Lowercase hex of the UTF-8 bytes
    pub fn hex_encode(&self, payload: &str) -> String {
        hex::encode(payload.as_bytes())
    }

    pub fn hex_decode(&self, payload: &str) -> Result<String> {
        let bytes = hex::decode(payload)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// `\uXXXX` per character. One-way.
    pub fn unicode_escape(&self, payload: &str) -> String {
        unicode_escape(payload)
    }

    /// Run one resolved step
    pub fn apply(&self, step: &EncodingStep, payload: &str) -> Result<String> {
        match step {
            EncodingStep::Base64 { decode } => self.base64(payload, *decode),
            EncodingStep::Rot13 => Ok(self.rot13(payload)),
            EncodingStep::Xor { key, decode } => self.xor(payload, key, *decode),
            EncodingStep::Hex { decode: false } => Ok(self.hex_encode(payload)),
            EncodingStep::Hex { decode: true } => self.hex_decode(payload),
            EncodingStep::Unicode => Ok(self.unicode_escape(payload)),
        }
    }

    /// Apply a chain of named encodings left to right.
    ///
    /// Every step is resolved before the first one runs, so an unknown name
    /// or bad parameter anywhere in the chain fails without producing output.
    /// A failing step aborts the rest of the chain.
    pub fn chain(&self, payload: &str, specs: &[TransformSpec]) -> Result<String> {
        let steps = specs
            .iter()
            .map(EncodingStep::resolve)
            .collect::<Result<Vec<_>>>()?;

        debug!(steps = steps.len(), "applying encoding chain");

        steps
            .iter()
            .try_fold(payload.to_string(), |current, step| {
                debug!(method = %step.method(), "chain step");
                self.apply(step, &current)
            })
    }

    /// Name and description of every encoding
    pub fn encoding_info(&self) -> BTreeMap<&'static str, &'static str> {
        EncodingMethod::all()
            .into_iter()
            .map(|m| (m.name(), m.description()))
            .collect()
    }
}

pub(crate) fn unicode_escape(payload: &str) -> String {
    payload
        .chars()
        .map(|c| format!("\\u{:04x}", c as u32))
        .collect()
}

fn rotate(c: char, base: u8) -> char {
    (((c as u8 - base) + 13) % 26 + base) as char
}

fn key_chars(key: &str) -> Result<Vec<char>> {
    if key.is_empty() {
        return Err(EvasionLabError::InvalidKey(
            "XOR key cannot be empty".to_string(),
        ));
    }
    Ok(key.chars().collect())
}
