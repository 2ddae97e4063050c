use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evasionlab_core::{
    load_config, Detector, EncodingStep, EvasionLab, PayloadEncoder, StringObfuscator,
    TransformSpec,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// Payload fed to the demo
pub const DEMO_PAYLOAD: &str = "whoami";

#[derive(Parser)]
#[command(name = "evasionlab", version)]
#[command(about = "Payload encoding, obfuscation and naive detection playground")]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the fixed `whoami` demonstration
    Demo,
    /// Encode or decode a payload
    Encode {
        payload: String,
        #[arg(short, long, default_value = "base64")]
        method: String,
        #[arg(short, long)]
        decode: bool,
        /// XOR key
        #[arg(short, long)]
        key: Option<String>,
        /// Comma separated encoder chain; overrides --method
        #[arg(long, value_delimiter = ',', conflicts_with_all = ["decode", "key"])]
        chain: Vec<String>,
    },
    /// Apply obfuscation layers (unknown names are skipped)
    Obfuscate {
        payload: String,
        #[arg(short, long, value_delimiter = ',', default_value = "reverse")]
        methods: Vec<String>,
        #[arg(short, long)]
        seed: Option<u64>,
        /// Print the variable concatenation form instead
        #[arg(long)]
        concat: bool,
    },
    /// Check a payload against the signature set
    Detect { payload: String },
    /// Compare detection of an original and a transformed payload
    Compare {
        original: String,
        transformed: String,
    },
    /// Full analysis run producing a report
    Analyze {
        payload: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
}

pub fn demo_command() -> Result<()> {
    let encoder = PayloadEncoder::new();
    let detector = Detector::new();

    println!("\n=== Payload Encoder & Obfuscation Framework ===");
    println!("\nOriginal: {}", DEMO_PAYLOAD);
    println!("Base64: {}", encoder.base64_encode(DEMO_PAYLOAD));
    println!("ROT13: {}", encoder.rot13(DEMO_PAYLOAD));
    println!("Detected: {}", detector.detect(DEMO_PAYLOAD));
    Ok(())
}

pub fn encode_command(
    payload: &str,
    method: &str,
    decode: bool,
    key: Option<String>,
    chain: &[String],
) -> Result<()> {
    let encoder = PayloadEncoder::new();

    let result = if chain.is_empty() {
        let mut spec = TransformSpec::new(method);
        if decode {
            spec = spec.with_param("decode", true);
        }
        if let Some(key) = key {
            spec = spec.with_param("key", key);
        }
        let step = EncodingStep::resolve(&spec)?;
        encoder.apply(&step, payload)?
    } else {
        let specs: Vec<TransformSpec> = chain.iter().map(TransformSpec::new).collect();
        encoder.chain(payload, &specs)?
    };

    println!("{}", result);
    Ok(())
}

pub fn obfuscate_command(
    payload: &str,
    methods: &[String],
    seed: Option<u64>,
    concat: bool,
) -> Result<()> {
    let mut obfuscator = match seed {
        Some(seed) => StringObfuscator::with_seed(seed),
        None => StringObfuscator::new(),
    };

    if concat {
        let concat = obfuscator.variable_concat(payload);
        println!("{}", output::render(&concat, OutputFormat::Json)?);
    } else {
        println!("{}", obfuscator.multi_layer(payload, methods));
    }
    Ok(())
}

pub fn detect_command(payload: &str) -> Result<()> {
    let detector = Detector::new();
    let verdict = json!({
        "payload": payload,
        "detected": detector.detect(payload),
        "matches": detector.matches(payload),
    });
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

pub fn compare_command(original: &str, transformed: &str) -> Result<()> {
    let result = Detector::new().compare_evasion(original, transformed);
    println!("{}", output::render(&result, OutputFormat::Json)?);
    Ok(())
}

pub fn analyze_command(
    payload: &str,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let cfg = load_config(config.as_deref()).context("loading configuration")?;
    info!(
        "Analyzing payload with {} signatures, {} keywords",
        cfg.signatures.len(),
        cfg.keywords.len()
    );

    let mut lab = EvasionLab::new(cfg)?;
    let report = lab.analyze(payload)?;

    output::emit_report(&report, format, output.as_deref())
}
