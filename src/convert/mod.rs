//! Rule conversion engine.
//!
//! `Converter::convert` rewrites one parsed rule into a new rule for the
//! target dialect, narrating every decision into a [`ConversionLog`].
//! `Converter::convert_text` runs a whole batch; a rule that fails is
//! logged as an error and emitted unchanged, so one bad rule never aborts
//! the batch.

pub mod heuristics;
pub mod log;
mod to_snort;
mod to_suricata;

use serde::{Deserialize, Serialize};

use crate::classifier::{Classification, SignatureTable};
use crate::error::{Result, ShiftError};
use crate::ir::{Dialect, DialectGuess, OptionValue, Rule, RuleOptions};
use crate::parser::{is_valid_rule, parse_rule};

pub use heuristics::{KeywordHeuristics, TrafficHeuristics, TrafficSignals};
pub use log::{ConversionLog, LogEntry, LogSeverity};

/// Tunables for the conversion engine, loaded from `[conversion]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    /// Offset between the two dialects' user SID ranges.
    pub sid_offset: u64,
    pub renumber_sids: bool,
    /// Promote `tcp`/`udp` to application-layer protocols when heuristics match.
    pub promote_protocols: bool,
    /// Add a reference to malware rules that have none (Snort-bound).
    pub inject_reference: bool,
    pub reference: String,
    /// `metadata` value stamped on rules that have none (Suricata-bound).
    pub metadata_marker: String,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            sid_offset: 1_000_000,
            renumber_sids: true,
            promote_protocols: true,
            inject_reference: true,
            reference: "url,virustotal.com".into(),
            metadata_marker: "converted_from snort".into(),
        }
    }
}

/// Result of converting one rule-shaped input line.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RuleOutcome {
    Converted { original: Rule, converted: Rule },
    Failed {
        /// Present when the line parsed but conversion failed.
        original: Option<Rule>,
        /// Text emitted in place of a converted rule.
        fallback: String,
        error: String,
    },
}

impl RuleOutcome {
    /// The line this outcome contributes to the output text.
    pub fn output_line(&self) -> String {
        match self {
            Self::Converted { converted, .. } => converted.to_string(),
            Self::Failed { fallback, .. } => fallback.clone(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Everything one batch conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchConversion {
    pub target: Dialect,
    pub detected: DialectGuess,
    pub classification: Classification,
    pub outcomes: Vec<RuleOutcome>,
    pub log: ConversionLog,
}

impl BatchConversion {
    /// Newline-joined output, one line per rule-shaped input line.
    pub fn text(&self) -> String {
        self.outcomes
            .iter()
            .map(RuleOutcome::output_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn converted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_failed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// `(original, converted)` pairs for rules that converted.
    pub fn pairs(&self) -> impl Iterator<Item = (&Rule, &Rule)> {
        self.outcomes.iter().filter_map(|o| match o {
            RuleOutcome::Converted {
                original,
                converted,
            } => Some((original, converted)),
            RuleOutcome::Failed { .. } => None,
        })
    }
}

pub struct Converter {
    settings: ConversionSettings,
    signatures: SignatureTable,
    heuristics: Box<dyn TrafficHeuristics>,
}

impl Converter {
    pub fn new(settings: ConversionSettings) -> Self {
        Self {
            settings,
            signatures: SignatureTable::new(),
            heuristics: Box::new(KeywordHeuristics),
        }
    }

    pub fn with_signatures(mut self, signatures: SignatureTable) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn with_heuristics(mut self, heuristics: Box<dyn TrafficHeuristics>) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Convert one rule, returning a new rule. `rule` is left untouched.
    pub fn convert(&self, rule: &Rule, target: Dialect, log: &mut ConversionLog) -> Result<Rule> {
        let mut converted = rule.clone();
        match target {
            Dialect::Snort => to_snort::rewrite(&mut converted, self, log)?,
            Dialect::Suricata => to_suricata::rewrite(&mut converted, self, log)?,
        }
        if self.settings.renumber_sids {
            self.renumber_sid(&mut converted, target, log)?;
        }
        Ok(converted)
    }

    /// Convert every rule-shaped line of `text` with a fresh log.
    pub fn convert_text(&self, text: &str, target: Dialect) -> BatchConversion {
        let mut log = ConversionLog::new();
        let classification = self.signatures.classify(text);
        let detected = classification.verdict();

        log.info(format!(
            "Detected source dialect: {} (snort {}, suricata {})",
            detected, classification.snort, classification.suricata
        ));
        if detected == DialectGuess::from(target) {
            log.warning(format!(
                "Input already looks like {target}; converting anyway"
            ));
        }

        let mut outcomes = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if !is_valid_rule(line) {
                continue;
            }
            let outcome = self.convert_line(line, target, &mut log);
            if let RuleOutcome::Failed { error, .. } = &outcome {
                tracing::warn!(line = idx + 1, error = %error, "rule kept as-is");
            }
            outcomes.push(outcome);
        }

        let mut batch = BatchConversion {
            target,
            detected,
            classification,
            outcomes,
            log,
        };
        let (ok, total) = (batch.converted_count(), batch.outcomes.len());
        batch
            .log
            .info(format!("Converted {ok} of {total} rule(s) to {target}"));
        tracing::debug!(converted = ok, total, target = %target, "batch finished");
        batch
    }

    fn convert_line(&self, line: &str, target: Dialect, log: &mut ConversionLog) -> RuleOutcome {
        let rule = match parse_rule(line) {
            Ok(rule) => rule,
            Err(e) => {
                log.error(format!("Failed to parse rule, keeping original: {e}"));
                return RuleOutcome::Failed {
                    original: None,
                    fallback: line.trim().to_string(),
                    error: e.to_string(),
                };
            }
        };

        match self.convert(&rule, target, log) {
            Ok(converted) => {
                log.success(format!("Converted {} to {target}", converted.label()));
                RuleOutcome::Converted {
                    original: rule,
                    converted,
                }
            }
            Err(e) => {
                log.error(format!(
                    "Failed to convert {}, keeping original: {e}",
                    rule.label()
                ));
                RuleOutcome::Failed {
                    fallback: rule.to_string(),
                    original: Some(rule),
                    error: e.to_string(),
                }
            }
        }
    }

    /// Move user SIDs between the two dialects' ranges.
    ///
    /// Snort-bound SIDs below the offset gain it; Suricata-bound SIDs above
    /// it lose it. Other values are left alone.
    fn renumber_sid(&self, rule: &mut Rule, target: Dialect, log: &mut ConversionLog) -> Result<()> {
        let label = rule.label();
        let offset = self.settings.sid_offset;
        let Some(value) = rule.options.get_mut("sid") else {
            return Ok(());
        };

        let sid: u64 = value.as_str().trim().parse().map_err(|_| ShiftError::Conversion {
            rule: label.clone(),
            message: format!("sid '{}' is not numeric", value.as_str()),
        })?;

        let renumbered = match target {
            Dialect::Snort if sid < offset => {
                Some(sid.checked_add(offset).ok_or_else(|| ShiftError::Conversion {
                    rule: label.clone(),
                    message: format!("sid {sid} overflows when offset by {offset}"),
                })?)
            }
            Dialect::Suricata if sid > offset => Some(sid - offset),
            _ => None,
        };

        if let Some(new_sid) = renumbered {
            *value = OptionValue::Bare(new_sid.to_string());
            log.info(format!("{label}: renumbered sid {sid} -> {new_sid}"));
        }
        Ok(())
    }

    fn heuristics(&self) -> &dyn TrafficHeuristics {
        self.heuristics.as_ref()
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConversionSettings::default())
    }
}

/// Swap an `isdataat` relative marker, returning true when changed.
fn swap_isdataat(rule: &mut Rule, from: &str, to: &str) -> bool {
    let mut changed = false;
    for option in rule.options.values_mut("isdataat") {
        if let OptionValue::Bare(v) | OptionValue::Quoted(v) = option {
            if v.contains(from) {
                *v = v.replace(from, to);
                changed = true;
            }
        }
    }
    changed
}

/// Where a new sticky buffer can go without rebinding existing matches:
/// before the first `content` not already under a buffer. With no content
/// at all, before `sid` (or at the end). `None` when every content is bound.
fn buffer_insert_point(options: &RuleOptions) -> Option<usize> {
    let mut buffered = false;
    let mut saw_content = false;
    for (idx, option) in options.iter().enumerate() {
        match option.key.as_str() {
            "content" if !buffered => return Some(idx),
            "content" => saw_content = true,
            "pkt_data" => buffered = false,
            key if option.value.is_flag() && (key.contains('.') || key.ends_with("_data")) => {
                buffered = true
            }
            _ => {}
        }
    }
    if saw_content {
        None
    } else {
        Some(options.position("sid").unwrap_or(options.len()))
    }
}

fn warn_urilen(rule: &Rule, target: Dialect, log: &mut ConversionLog) {
    if rule.options.contains("urilen") {
        log.warning(format!(
            "{}: urilen range boundaries differ between dialects (inclusive vs exclusive); value kept as-is for {target}",
            rule.label()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn convert_one(line: &str, target: Dialect) -> (Rule, ConversionLog) {
        let mut log = ConversionLog::new();
        let rule = parse_rule(line).unwrap();
        let converted = Converter::default().convert(&rule, target, &mut log).unwrap();
        (converted, log)
    }

    #[test]
    fn web_post_rule_to_suricata() {
        let line = r#"alert tcp $EXTERNAL_NET any -> $HOME_NET 80 (msg:"X"; content:"POST"; fast_pattern; sid:1000001; rev:3;)"#;
        let (rule, log) = convert_one(line, Dialect::Suricata);
        assert!(!rule.options.contains("fast_pattern"));
        assert_eq!(rule.sid(), Some("1"));
        assert_eq!(rule.protocol, "http");
        assert!(log
            .entries()
            .iter()
            .any(|e| e.severity == LogSeverity::Info && e.message.contains("fast_pattern")));
    }

    #[test]
    fn sid_round_trip_through_snort() {
        let line = r#"alert tcp any any -> any any (msg:"x"; content:"abc"; sid:42;)"#;
        let (snort, _) = convert_one(line, Dialect::Snort);
        assert_eq!(snort.sid(), Some("1000042"));
        let mut log = ConversionLog::new();
        let back = Converter::default()
            .convert(&snort, Dialect::Suricata, &mut log)
            .unwrap();
        assert_eq!(back.sid(), Some("42"));
    }

    #[test]
    fn snort_range_sid_moves_after_round_trip() {
        // small sids belong to the Suricata range, so only the Snort-bound leg renumbers
        let line = r#"alert tcp any any -> any any (msg:"x"; content:"abc"; sid:42;)"#;
        let (suricata, _) = convert_one(line, Dialect::Suricata);
        assert_eq!(suricata.sid(), Some("42"));
        let mut log = ConversionLog::new();
        let back = Converter::default()
            .convert(&suricata, Dialect::Snort, &mut log)
            .unwrap();
        assert_eq!(back.sid(), Some("1000042"));
    }

    #[test]
    fn sid_boundaries_untouched() {
        let (r, _) = convert_one(
            "alert tcp any any -> any any (msg:\"x\"; sid:1000000;)",
            Dialect::Suricata,
        );
        assert_eq!(r.sid(), Some("1000000"));
        let (r, _) = convert_one(
            "alert tcp any any -> any any (msg:\"x\"; sid:2000000;)",
            Dialect::Snort,
        );
        assert_eq!(r.sid(), Some("2000000"));
    }

    #[test]
    fn non_numeric_sid_is_an_error() {
        let rule = parse_rule("alert tcp any any -> any any (msg:\"x\"; sid:abc;)").unwrap();
        let mut log = ConversionLog::new();
        let err = Converter::default()
            .convert(&rule, Dialect::Snort, &mut log)
            .unwrap_err();
        assert!(matches!(err, ShiftError::Conversion { .. }));
    }

    #[test]
    fn renumbering_can_be_disabled() {
        let settings = ConversionSettings {
            renumber_sids: false,
            ..Default::default()
        };
        let rule = parse_rule("alert tcp any any -> any any (msg:\"x\"; sid:5;)").unwrap();
        let mut log = ConversionLog::new();
        let out = Converter::new(settings)
            .convert(&rule, Dialect::Snort, &mut log)
            .unwrap();
        assert_eq!(out.sid(), Some("5"));
    }

    #[test]
    fn original_rule_is_not_mutated() {
        let rule = parse_rule(
            r#"alert http any any -> any any (msg:"x"; http.request_body; content:"a"; sid:3;)"#,
        )
        .unwrap();
        let before = rule.clone();
        let mut log = ConversionLog::new();
        let out = Converter::default()
            .convert(&rule, Dialect::Snort, &mut log)
            .unwrap();
        assert_eq!(rule, before);
        assert_ne!(out, rule);
    }

    #[test]
    fn batch_isolates_failures() {
        let text = "\
alert tcp any any -> any 22 (msg:\"first\"; content:\"a\"; sid:1;)
alert tcp any any -> any 22 (msg:\"bad\"; content:\"b\"; sid:oops;)
alert tcp any any -> any 22 (msg:\"third\"; content:\"c\"; sid:3;)
";
        let batch = Converter::default().convert_text(text, Dialect::Snort);
        let out = batch.text();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(batch.log.count(LogSeverity::Error) >= 1);
        assert!(lines[0].contains("sid:1000001;"));
        assert!(lines[1].contains("sid:oops;"));
        assert!(lines[2].contains("sid:1000003;"));
        assert_eq!(batch.converted_count(), 2);
        assert_eq!(batch.failed_count(), 1);
    }

    #[test]
    fn batch_keeps_undecomposable_lines() {
        let text = "alert tcp any any -> any any (sid:1;)\n  alert tcp (x) -> any any (sid:2;)\n";
        let batch = Converter::default().convert_text(text, Dialect::Snort);
        assert_eq!(batch.outcomes.len(), 2);
        assert_eq!(batch.text().lines().nth(1), Some("alert tcp (x) -> any any (sid:2;)"));
        assert_eq!(batch.log.count(LogSeverity::Error), 1);
    }

    #[test]
    fn batch_log_starts_with_detection_and_ends_with_summary() {
        let text = "# comment\n\nalert tcp any any -> any any (msg:\"a\"; content:\"x\"; fast_pattern; sid:1;)\n";
        let batch = Converter::default().convert_text(text, Dialect::Snort);
        let entries = batch.log.entries();
        assert!(entries[0].message.starts_with("Detected source dialect: Snort"));
        assert!(entries
            .iter()
            .any(|e| e.severity == LogSeverity::Warning && e.message.contains("already looks like Snort")));
        assert_eq!(
            entries.last().map(|e| e.message.as_str()),
            Some("Converted 1 of 1 rule(s) to Snort")
        );
        assert_eq!(batch.detected, DialectGuess::Snort);
    }

    #[test]
    fn empty_batch_is_unknown_and_empty() {
        let batch = Converter::default().convert_text("# nothing here\n", Dialect::Suricata);
        assert_eq!(batch.detected, DialectGuess::Unknown);
        assert!(batch.outcomes.is_empty());
        assert_eq!(batch.text(), "");
    }
}
