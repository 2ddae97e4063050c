use anyhow::{Context, Result};
use clap::ValueEnum;
use evasionlab_core::Report;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(rendered)
}

/// Print the report, or write it to `output` when given
pub fn emit_report(report: &Report, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    match (output, format) {
        (Some(path), OutputFormat::Json) => report
            .save(path)
            .with_context(|| format!("writing report to {}", path.display()))?,
        (Some(path), OutputFormat::Yaml) => fs::write(path, render(report, format)?)
            .with_context(|| format!("writing report to {}", path.display()))?,
        (None, _) => println!("{}", render(report, format)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_yaml_render_has_summary() {
        let report = Report::new("whoami", BTreeMap::new(), BTreeMap::new());
        let yaml = render(&report, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("original_payload: whoami"));
        assert!(yaml.contains("evasion_success_rate: 0.0"));
    }
}
