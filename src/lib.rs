//! ruleshift: Snort/Suricata rule parser, dialect classifier and converter.
//!
//! Parses IDS rules into a structured form, guesses which dialect a rule
//! set is written in, and rewrites rules into the other dialect while
//! logging every decision that could change what the rule detects.
//!
//! # Quick Start
//!
//! ```no_run
//! use ruleshift::{convert, ConvertOptions};
//! use ruleshift::ir::Dialect;
//!
//! let text = std::fs::read_to_string("local.rules").unwrap();
//! let report = convert(&text, Dialect::Suricata, &ConvertOptions::default()).unwrap();
//! println!("{}", report.batch.text());
//! ```

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod convert;
pub mod error;
pub mod ir;
pub mod output;
pub mod parser;

use std::path::PathBuf;

use analysis::RuleAnalysis;
use config::Config;
use convert::BatchConversion;
use error::{Result, ShiftError};
use ir::Dialect;
use output::OutputFormat;

pub use classifier::detect_dialect;
pub use parser::{is_valid_rule, parse_rule, parse_rules};

/// Options for a conversion invocation.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Path to config file (defaults to `.ruleshift.toml` in the working directory).
    pub config_path: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// Run the diff analyzer on every converted rule.
    pub analyze: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            format: OutputFormat::Console,
            analyze: false,
        }
    }
}

/// Complete conversion report.
#[derive(Debug)]
pub struct ConversionReport {
    pub batch: BatchConversion,
    pub analysis: Vec<RuleAnalysis>,
}

impl ConversionReport {
    /// True when every rule converted without falling back.
    pub fn is_clean(&self) -> bool {
        self.batch.failed_count() == 0
    }
}

/// Run a complete conversion: load config, classify, convert, analyze.
pub fn convert(text: &str, target: Dialect, options: &ConvertOptions) -> Result<ConversionReport> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(".ruleshift.toml"));
    let config = Config::load(&config_path)?;

    let batch = config.converter().convert_text(text, target);

    let analysis = if options.analyze {
        batch
            .pairs()
            .map(|(original, converted)| {
                analysis::analyze(original, converted, target, &config.analysis)
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(ConversionReport { batch, analysis })
}

/// The dialect to convert into: `requested` when given, otherwise the
/// counterpart of whatever `text` is detected as.
pub fn resolve_target(text: &str, requested: Option<Dialect>) -> Result<Dialect> {
    if let Some(target) = requested {
        return Ok(target);
    }
    detect_dialect(text)
        .dialect()
        .map(|source| source.counterpart())
        .ok_or_else(|| {
            ShiftError::UnsupportedTarget(
                "source dialect is unknown; pass --to snort or --to suricata".into(),
            )
        })
}

/// Render a conversion report in the specified format.
pub fn render_report(report: &ConversionReport, format: OutputFormat) -> Result<String> {
    output::render(&report.batch, &report.analysis, format)
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::convert::LogSeverity;
    use crate::ir::DialectGuess;
    use pretty_assertions::assert_eq;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/rules/{name}")).unwrap()
    }

    fn options() -> ConvertOptions {
        ConvertOptions {
            config_path: Some(PathBuf::from("tests/fixtures/none.toml")),
            ..Default::default()
        }
    }

    #[test]
    fn snort_file_detected_and_converted() {
        let text = fixture("snort_local.rules");
        assert_eq!(detect_dialect(&text), DialectGuess::Snort);

        let report = convert(&text, Dialect::Suricata, &options()).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.batch.outcomes.len(), parse_rules(&text).len());
        assert!(!report.batch.text().contains("fast_pattern"));
        assert!(!report.batch.text().contains("openappid"));
    }

    #[test]
    fn suricata_file_detected_and_converted() {
        let text = fixture("suricata_local.rules");
        assert_eq!(detect_dialect(&text), DialectGuess::Suricata);

        let report = convert(&text, Dialect::Snort, &options()).unwrap();
        let out = report.batch.text();
        assert!(!out.contains("tls."));
        assert!(!out.contains("dns.query"));
        assert!(!out.contains("filestore"));
        for line in out.lines() {
            let rule = parse_rule(line).unwrap();
            assert!(matches!(rule.protocol.as_str(), "tcp" | "udp" | "icmp" | "ip"));
        }
        assert!(report.batch.log.count(LogSeverity::Warning) > 0);
    }

    #[test]
    fn mixed_file_isolates_bad_rule() {
        let text = fixture("mixed_with_errors.rules");
        let report = convert(
            &text,
            Dialect::Suricata,
            &ConvertOptions {
                analyze: true,
                ..options()
            },
        )
        .unwrap();
        assert_eq!(report.batch.outcomes.len(), 3);
        assert_eq!(report.batch.text().lines().count(), 3);
        assert_eq!(report.batch.failed_count(), 1);
        assert!(report.batch.log.count(LogSeverity::Error) >= 1);
        assert_eq!(report.analysis.len(), 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn suricata_to_snort_and_back_restores_sids() {
        let text = fixture("suricata_local.rules");
        let there = convert(&text, Dialect::Snort, &options()).unwrap();
        let back = convert(&there.batch.text(), Dialect::Suricata, &options()).unwrap();

        let sids = |t: &str| -> Vec<String> {
            parse_rules(t)
                .iter()
                .filter_map(|r| r.sid().map(str::to_string))
                .collect()
        };
        assert_eq!(sids(&back.batch.text()), sids(&text));
    }

    #[test]
    fn target_defaults_to_other_dialect() {
        let snort = fixture("snort_local.rules");
        assert_eq!(resolve_target(&snort, None).unwrap(), Dialect::Suricata);
        let suricata = fixture("suricata_local.rules");
        assert_eq!(resolve_target(&suricata, None).unwrap(), Dialect::Snort);
        assert_eq!(
            resolve_target(&suricata, Some(Dialect::Suricata)).unwrap(),
            Dialect::Suricata
        );
        assert!(matches!(
            resolve_target("# nothing\n", None),
            Err(ShiftError::UnsupportedTarget(_))
        ));
    }

    #[test]
    fn renders_every_format() {
        let text = fixture("snort_local.rules");
        let report = convert(
            &text,
            Dialect::Suricata,
            &ConvertOptions {
                analyze: true,
                ..options()
            },
        )
        .unwrap();
        let console = render_report(&report, OutputFormat::Console).unwrap();
        assert!(console.contains("Conversion log:"));
        assert!(console.contains("Analysis for sid:"));
        let json = render_report(&report, OutputFormat::Json).unwrap();
        assert!(json.contains("\"analysis\""));
        let rules = render_report(&report, OutputFormat::Rules).unwrap();
        assert_eq!(rules.trim_end(), report.batch.text());
    }
}
