//! Heuristic dialect classifier.
//!
//! A linear, additive scorer over a table of `(matcher, weight, dialect)`
//! signatures. Every rule-shaped line contributes the weights of the
//! signatures it matches; the side with the strictly greater total wins and
//! a tie is `Unknown`.

pub mod signatures;

use serde::{Deserialize, Serialize};

use crate::ir::{Dialect, DialectGuess};
use crate::parser::is_valid_rule;

/// What a signature looks for in a rule line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// Case-insensitive substring anywhere in the line.
    Keyword(String),
    /// The header's protocol token is one of these.
    HeaderProtocol(Vec<String>),
}

impl Matcher {
    fn matches(&self, lower_line: &str, protocol: &str) -> bool {
        match self {
            Self::Keyword(kw) => lower_line.contains(kw.as_str()),
            Self::HeaderProtocol(protocols) => protocols.iter().any(|p| p == protocol),
        }
    }
}

impl std::fmt::Display for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyword(kw) => write!(f, "{kw}"),
            Self::HeaderProtocol(protocols) => write!(f, "protocol in [{}]", protocols.join(",")),
        }
    }
}

/// One weighted dialect signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub matcher: Matcher,
    pub weight: u32,
    pub dialect: Dialect,
}

impl Signature {
    pub fn keyword(keyword: impl Into<String>, weight: u32, dialect: Dialect) -> Self {
        Self {
            matcher: Matcher::Keyword(keyword.into().to_lowercase()),
            weight,
            dialect,
        }
    }
}

/// Accumulated scores for one classification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub snort: u32,
    pub suricata: u32,
    /// Number of rule-shaped lines that were scored.
    pub rules_scored: usize,
}

impl Classification {
    pub fn verdict(&self) -> DialectGuess {
        use std::cmp::Ordering;
        match self.snort.cmp(&self.suricata) {
            Ordering::Greater => DialectGuess::Snort,
            Ordering::Less => DialectGuess::Suricata,
            Ordering::Equal => DialectGuess::Unknown,
        }
    }

    fn add(&mut self, dialect: Dialect, weight: u32) {
        match dialect {
            Dialect::Snort => self.snort += weight,
            Dialect::Suricata => self.suricata += weight,
        }
    }
}

/// Scoring table. Signatures can be added at runtime without touching the
/// parser or the converter.
#[derive(Debug, Clone)]
pub struct SignatureTable {
    signatures: Vec<Signature>,
}

impl SignatureTable {
    /// Table preloaded with the built-in signatures.
    pub fn new() -> Self {
        Self {
            signatures: signatures::builtin(),
        }
    }

    pub fn empty() -> Self {
        Self {
            signatures: Vec::new(),
        }
    }

    pub fn push(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Score a single line. Non-rule lines score nothing.
    pub fn score_line(&self, line: &str) -> Classification {
        let mut scores = Classification::default();
        if !is_valid_rule(line) {
            return scores;
        }

        let lower = line.trim().to_lowercase();
        let protocol = lower.split_whitespace().nth(1).unwrap_or("");
        for sig in &self.signatures {
            if sig.matcher.matches(&lower, protocol) {
                scores.add(sig.dialect, sig.weight);
            }
        }
        scores.rules_scored = 1;
        scores
    }

    /// Score every line of `text`.
    pub fn classify(&self, text: &str) -> Classification {
        text.lines().fold(Classification::default(), |mut acc, line| {
            let s = self.score_line(line);
            acc.snort += s.snort;
            acc.suricata += s.suricata;
            acc.rules_scored += s.rules_scored;
            acc
        })
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify a rule or a batch of rules with the built-in table.
pub fn detect_dialect(text: &str) -> DialectGuess {
    SignatureTable::new().classify(text).verdict()
}
