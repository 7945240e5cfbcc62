//! Post-conversion analysis: what changed between an original rule and its
//! conversion, and what that means for detection quality.

pub mod diff;

use serde::{Deserialize, Serialize};

pub use diff::{
    analyze, ChangeKind, ChangeRecord, OptimizationRecord, Recommendation, RiskLevel, RiskRecord,
    RuleAnalysis,
};

/// Tunables for the analyzer, loaded from `[analysis]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Content length above which a Snort rule should carry `fast_pattern`.
    pub fast_pattern_min_length: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            fast_pattern_min_length: 50,
        }
    }
}
