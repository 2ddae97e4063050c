//! EvasionLab: payload transformation and naive signature detection

pub mod config;
pub mod detector;
pub mod encoder;
pub mod errors;
pub mod obfuscator;
pub mod report;
pub mod transform;

// Re-exports
pub use config::{load_config, LabConfig};
pub use detector::{Detector, EvasionResult, SignatureSet};
pub use encoder::PayloadEncoder;
pub use errors::{EvasionLabError, Result};
pub use obfuscator::{StringObfuscator, VariableConcat};
pub use report::{Report, ReportSummary};
pub use transform::{
    EncodingMethod, EncodingStep, ObfuscationMethod, TransformChain, TransformSpec,
};

use rand::rngs::StdRng;
use rand::RngCore;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Prefix of chain entries in a report
pub const CHAIN_PREFIX: &str = "chain:";

/// Encoder, obfuscator and detector wired together for analysis runs
pub struct EvasionLab<R = StdRng> {
    encoder: PayloadEncoder,
    obfuscator: StringObfuscator<R>,
    detector: Detector,
    config: LabConfig,
}

impl EvasionLab<StdRng> {
    /// Build from configuration; the obfuscator is seeded when `seed` is set
    pub fn new(config: LabConfig) -> Result<Self> {
        let obfuscator = match config.seed {
            Some(seed) => StringObfuscator::with_seed(seed),
            None => StringObfuscator::new(),
        };
        Self::with_obfuscator(config, obfuscator)
    }
}

impl<R: RngCore> EvasionLab<R> {
    pub fn with_obfuscator(config: LabConfig, obfuscator: StringObfuscator<R>) -> Result<Self> {
        config.validate()?;
        let detector = Detector::with_signatures(config.signature_set())?;

        Ok(Self {
            encoder: PayloadEncoder::new(),
            obfuscator,
            detector,
            config,
        })
    }

    pub fn encoder(&self) -> &PayloadEncoder {
        &self.encoder
    }

    /// Run the payload through every encoding, configured obfuscation and
    /// configured chain. Unknown obfuscation names are skipped; a failing
    /// chain fails the whole call.
    pub fn transform_all(&mut self, payload: &str) -> Result<BTreeMap<String, String>> {
        let mut outputs = BTreeMap::new();

        for method in EncodingMethod::all() {
            let step = match method {
                EncodingMethod::Xor => EncodingStep::Xor {
                    key: self.config.xor_key.clone(),
                    decode: false,
                },
                other => EncodingStep::from(other),
            };
            outputs.insert(method.to_string(), self.encoder.apply(&step, payload)?);
        }

        for name in &self.config.obfuscations {
            match name.parse::<ObfuscationMethod>() {
                Ok(method) => {
                    outputs.insert(method.to_string(), self.obfuscator.apply(method, payload));
                }
                Err(_) => warn!(method = name.as_str(), "skipping unknown obfuscation method"),
            }
        }

        for (name, chain) in &self.config.chains {
            let output = self.encoder.chain(payload, chain)?;
            outputs.insert(format!("{}{}", CHAIN_PREFIX, name), output);
        }

        Ok(outputs)
    }

    /// Full analysis run: transform, compare each output against the
    /// original, and build a report.
    pub fn analyze(&mut self, payload: &str) -> Result<Report> {
        let encodings = self.transform_all(payload)?;

        let evasion_results: BTreeMap<String, bool> = encodings
            .iter()
            .map(|(name, transformed)| {
                let result = self.detector.compare_evasion(payload, transformed);
                debug!(
                    transform = name.as_str(),
                    original_detected = result.original_detected,
                    transformed_detected = result.transformed_detected,
                    "evasion comparison"
                );
                (name.clone(), result.evasion_success)
            })
            .collect();

        let report = Report::new(payload, encodings, evasion_results);

        info!(
            "Analysis complete: {} transforms, {} tests, {:.1}% evasion success",
            report.summary.total_encodings,
            report.summary.total_tests,
            report.summary.evasion_success_rate
        );

        Ok(report)
    }
}
