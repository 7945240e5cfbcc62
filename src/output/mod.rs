pub mod console;
pub mod json;

use serde::{Deserialize, Serialize};

use crate::analysis::RuleAnalysis;
use crate::convert::BatchConversion;
use crate::error::Result;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    /// Converted rule text only.
    Rules,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Some(Self::Console),
            "json" => Some(Self::Json),
            "rules" | "raw" => Some(Self::Rules),
            _ => None,
        }
    }
}

/// Render a batch conversion (and optional per-rule analysis) in the specified format.
pub fn render(
    batch: &BatchConversion,
    analysis: &[RuleAnalysis],
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(console::render(batch, analysis)),
        OutputFormat::Json => json::render(batch, analysis),
        OutputFormat::Rules => {
            let mut text = batch.text();
            if !text.is_empty() {
                text.push('\n');
            }
            Ok(text)
        }
    }
}
