use crate::detector::{SignatureSet, DEFAULT_KEYWORDS, DEFAULT_SIGNATURES};
use crate::transform::{EncodingStep, TransformChain, TransformSpec, DEFAULT_XOR_KEY};
use crate::{EvasionLabError, Result};
use config as config_rs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Prefix for environment overrides, e.g. `EVASIONLAB_XOR_KEY`
pub const ENV_PREFIX: &str = "EVASIONLAB";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub signatures: Vec<String>,
    pub keywords: Vec<String>,
    /// Key for the `xor` encoding of an analysis run
    pub xor_key: String,
    /// Fixed obfuscator seed; OS-seeded when absent
    pub seed: Option<u64>,
    /// Obfuscator methods tried by an analysis run
    pub obfuscations: Vec<String>,
    /// Named encoder chains tried by an analysis run
    pub chains: BTreeMap<String, TransformChain>,
}

impl Default for LabConfig {
    fn default() -> Self {
        let mut chains = BTreeMap::new();
        chains.insert(
            "base64_rot13".to_string(),
            vec![TransformSpec::new("base64"), TransformSpec::new("rot13")],
        );

        Self {
            signatures: DEFAULT_SIGNATURES.iter().map(|s| s.to_string()).collect(),
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            xor_key: DEFAULT_XOR_KEY.to_string(),
            seed: None,
            obfuscations: ["random_insert", "split", "reverse", "escape", "homograph", "case_vary"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            chains,
        }
    }
}

impl LabConfig {
    pub fn signature_set(&self) -> SignatureSet {
        SignatureSet::new(self.signatures.clone(), self.keywords.clone())
    }

    /// Check the XOR key and resolve every chain step up front
    pub fn validate(&self) -> Result<()> {
        if self.xor_key.is_empty() {
            return Err(EvasionLabError::InvalidKey(
                "xor_key cannot be empty".to_string(),
            ));
        }
        for spec in self.chains.values().flatten() {
            EncodingStep::resolve(spec)?;
        }
        Ok(())
    }
}

/// Load configuration: defaults, then the optional file (format chosen by
/// extension), then `EVASIONLAB_*` environment variables.
pub fn load_config(path: Option<&Path>) -> Result<LabConfig> {
    let mut builder = config_rs::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config_rs::File::from(path));
    }

    builder = builder.add_source(
        config_rs::Environment::with_prefix(ENV_PREFIX).try_parsing(true),
    );

    let cfg: LabConfig = builder.build()?.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
}
