//! Heuristic string obfuscation
//!
//! Most of these transforms are one-way: several are lossy and two of them
//! (`random_insert`, `case_vary`) draw from the obfuscator's random source,
//! so repeated calls differ unless the source was seeded.

use crate::encoder;
use crate::transform::ObfuscationMethod;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Delimiter used by `split_join` when none is given
pub const DEFAULT_SPLIT_DELIMITER: &str = "\" \"+\"";

/// Size of the chunks produced by `variable_concat`
pub const CONCAT_CHUNK_SIZE: usize = 3;

const INSERT_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Applied in order, each rule over the output of the previous one
const HOMOGRAPHS: [(char, char); 4] = [('0', 'O'), ('1', 'l'), ('5', 'S'), ('O', '0')];

/// Result of splitting a payload into synthetic variables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableConcat {
    /// Quoted chunks joined with ` + `
    pub expression: String,
    /// `(var_N, chunk)` in chunk order
    pub variables: Vec<(String, String)>,
}

impl VariableConcat {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(var, _)| var == name)
            .map(|(_, chunk)| chunk.as_str())
    }

    /// Concatenate the chunks back into the payload
    pub fn reassemble(&self) -> String {
        self.variables.iter().map(|(_, chunk)| chunk.as_str()).collect()
    }
}

/// String obfuscator over an injected random source
pub struct StringObfuscator<R = StdRng> {
    rng: R,
}

impl StringObfuscator<StdRng> {
    /// Obfuscator seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible obfuscator: identical seeds give identical outputs
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StringObfuscator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> StringObfuscator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Insert `count` random alphanumerics at random positions.
    ///
    /// Defaults to `max(1, len / 3)` characters; an empty payload defaults
    /// to zero insertions.
    pub fn random_insert(&mut self, payload: &str, count: Option<usize>) -> String {
        let mut chars: Vec<char> = payload.chars().collect();
        let count = count.unwrap_or_else(|| default_insert_count(chars.len()));

        for _ in 0..count {
            let pos = self.rng.random_range(0..=chars.len());
            let c = INSERT_ALPHABET[self.rng.random_range(0..INSERT_ALPHABET.len())] as char;
            chars.insert(pos, c);
        }

        chars.into_iter().collect()
    }

    /// Put `delimiter` between every pair of characters
    pub fn split_join(&self, payload: &str, delimiter: Option<&str>) -> String {
        let delimiter = delimiter.unwrap_or(DEFAULT_SPLIT_DELIMITER);
        let mut out = String::with_capacity(payload.len() * (delimiter.len() + 1));
        for (i, c) in payload.chars().enumerate() {
            if i > 0 {
                out.push_str(delimiter);
            }
            out.push(c);
        }
        out
    }

    pub fn reverse(&self, payload: &str) -> String {
        payload.chars().rev().collect()
    }

    /// Replace space, `\n`, `\t` and `\r` with `\xNN`
    pub fn escape_whitespace(&self, payload: &str) -> String {
        let mut out = String::with_capacity(payload.len());
        for c in payload.chars() {
            match c {
                ' ' | '\n' | '\t' | '\r' => out.push_str(&format!("\\x{:02x}", c as u32)),
                _ => out.push(c),
            }
        }
        out
    }

    /// Sequential look-alike substitution. Later rules see the output of
    /// earlier ones, so `0` maps to `O` and back to `0`.
    pub fn homograph_substitute(&self, payload: &str) -> String {
        HOMOGRAPHS
            .iter()
            .fold(payload.to_string(), |current, (from, to)| {
                current.replace(*from, &to.to_string())
            })
    }

    /// Randomize the case of each alphabetic character
    pub fn case_vary(&mut self, payload: &str) -> String {
        let mut out = String::with_capacity(payload.len());
        for c in payload.chars() {
            if !c.is_alphabetic() {
                out.push(c);
            } else if self.rng.random_bool(0.5) {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
        }
        out
    }

    /// Split into 3-character chunks bound to synthetic variable names
    pub fn variable_concat(&self, payload: &str) -> VariableConcat {
        let chars: Vec<char> = payload.chars().collect();
        let variables: Vec<(String, String)> = chars
            .chunks(CONCAT_CHUNK_SIZE)
            .enumerate()
            .map(|(i, chunk)| (format!("var_{}", i), chunk.iter().collect()))
            .collect();

        let expression = variables
            .iter()
            .map(|(_, chunk)| format!("'{}'", chunk))
            .collect::<Vec<_>>()
            .join(" + ");

        VariableConcat {
            expression,
            variables,
        }
    }

    pub fn unicode_escape(&self, payload: &str) -> String {
        encoder::unicode_escape(payload)
    }

    /// Run one method with its default parameters
    pub fn apply(&mut self, method: ObfuscationMethod, payload: &str) -> String {
        match method {
            ObfuscationMethod::RandomInsert => self.random_insert(payload, None),
            ObfuscationMethod::Split => self.split_join(payload, None),
            ObfuscationMethod::Reverse => self.reverse(payload),
            ObfuscationMethod::Escape => self.escape_whitespace(payload),
            ObfuscationMethod::Unicode => self.unicode_escape(payload),
            ObfuscationMethod::Homograph => self.homograph_substitute(payload),
            ObfuscationMethod::CaseVary => self.case_vary(payload),
        }
    }

    /// Apply named methods in order. Unknown names are skipped, not errors.
    pub fn multi_layer<S: AsRef<str>>(&mut self, payload: &str, methods: &[S]) -> String {
        let mut result = payload.to_string();
        for name in methods {
            let name = name.as_ref();
            match name.parse::<ObfuscationMethod>() {
                Ok(method) => result = self.apply(method, &result),
                Err(_) => debug!(method = name, "skipping unknown obfuscation method"),
            }
        }
        result
    }
}

fn default_insert_count(len: usize) -> usize {
    if len == 0 {
        0
    } else {
        std::cmp::max(1, len / 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Random source that only ever yields zero
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
    }

    #[test]
    fn test_random_insert_with_fixed_source() {
        let mut obf = StringObfuscator::with_rng(ZeroRng);
        // position 0, first alphabet character, twice
        assert_eq!(obf.random_insert("abc", Some(2)), "aaabc");
    }

    #[test]
    fn test_case_vary_with_fixed_source() {
        let mut obf = StringObfuscator::with_rng(ZeroRng);
        assert_eq!(obf.case_vary("who-am-i 42"), "WHO-AM-I 42");
    }

    #[test]
    fn test_default_insert_count() {
        assert_eq!(default_insert_count(0), 0);
        assert_eq!(default_insert_count(2), 1);
        assert_eq!(default_insert_count(6), 2);
        assert_eq!(default_insert_count(10), 3);
    }

    #[test]
    fn test_split_join() {
        let obf = StringObfuscator::with_seed(1);
        assert_eq!(obf.split_join("abc", Some("-")), "a-b-c");
        assert_eq!(obf.split_join("ab", None), "a\" \"+\"b");
        assert_eq!(obf.split_join("a", None), "a");
    }

    #[test]
    fn test_escape_whitespace() {
        let obf = StringObfuscator::with_seed(1);
        assert_eq!(
            obf.escape_whitespace("net user\tadmin\r\n"),
            "net\\x20user\\x09admin\\x0d\\x0a"
        );
    }

    #[test]
    fn test_homograph_rules_chain_within_pass() {
        let obf = StringObfuscator::with_seed(1);
        // 0 -> O -> 0, O -> 0, 1 -> l, 5 -> S
        assert_eq!(obf.homograph_substitute("0O15"), "00lS");
    }

    #[test]
    fn test_variable_concat() {
        let obf = StringObfuscator::with_seed(1);
        let concat = obf.variable_concat("whoami!");
        assert_eq!(concat.expression, "'who' + 'ami' + '!'");
        assert_eq!(concat.variables.len(), 3);
        assert_eq!(concat.get("var_1"), Some("ami"));
        assert_eq!(concat.get("var_2"), Some("!"));
        assert_eq!(concat.reassemble(), "whoami!");
    }
}
