use crate::analysis::RuleAnalysis;
use crate::convert::{BatchConversion, LogEntry};
use crate::error::Result;
use crate::ir::{Dialect, DialectGuess};

use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    target: Dialect,
    detected: DialectGuess,
    converted: usize,
    failed: usize,
    rules: Vec<String>,
    log: &'a [LogEntry],
    #[serde(skip_serializing_if = "no_analysis")]
    analysis: &'a [RuleAnalysis],
}

fn no_analysis(analysis: &&[RuleAnalysis]) -> bool {
    analysis.is_empty()
}

/// Render a batch conversion as a JSON report.
pub fn render(batch: &BatchConversion, analysis: &[RuleAnalysis]) -> Result<String> {
    let report = JsonReport {
        target: batch.target,
        detected: batch.detected,
        converted: batch.converted_count(),
        failed: batch.failed_count(),
        rules: batch.outcomes.iter().map(|o| o.output_line()).collect(),
        log: batch.log.entries(),
        analysis,
    };
    let json = serde_json::to_string_pretty(&report)?;
    Ok(json)
}
