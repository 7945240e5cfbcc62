//! Structured representation of a detection rule.
//!
//! The parser produces a `Rule`, the converter produces a new `Rule` from it,
//! and the diff analyzer compares the two. A `Rule` is never mutated after
//! the parser hands it out; conversion works on a clone.

pub mod options;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

pub use options::{OptionValue, RuleOption, RuleOptions};

/// One parsed detection rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub action: Action,
    /// Free-form protocol token (`tcp`, `http`, `dns`, ...).
    pub protocol: String,
    /// Source address/port expression, carried through verbatim.
    pub source: String,
    pub direction: Direction,
    /// Destination address/port expression, carried through verbatim.
    pub destination: String,
    pub options: RuleOptions,
    /// Original line, kept for diagnostics and fallback output.
    pub raw: String,
}

impl Rule {
    /// First `sid` value, if present.
    pub fn sid(&self) -> Option<&str> {
        self.options.get("sid").map(OptionValue::as_str)
    }

    /// First `msg` value, if present.
    pub fn message(&self) -> Option<&str> {
        self.options.get("msg").map(OptionValue::as_str)
    }

    /// Short label used in log lines: `sid:N`, else the message, else the raw text.
    pub fn label(&self) -> String {
        if let Some(sid) = self.sid() {
            return format!("sid:{sid}");
        }
        if let Some(msg) = self.message() {
            return format!("\"{msg}\"");
        }
        self.raw.chars().take(48).collect()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} ({})",
            self.action, self.protocol, self.source, self.direction, self.destination, self.options
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Alert,
    Log,
    Pass,
    Drop,
    Reject,
    Sdrop,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Self::Alert,
        Self::Log,
        Self::Pass,
        Self::Drop,
        Self::Reject,
        Self::Sdrop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Log => "log",
            Self::Pass => "pass",
            Self::Drop => "drop",
            Self::Reject => "reject",
            Self::Sdrop => "sdrop",
        }
    }
}

impl FromStr for Action {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == lower)
            .ok_or_else(|| ParseError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `->`
    Unidirectional,
    /// `<>`
    Bidirectional,
}

impl Direction {
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Unidirectional => "->",
            Self::Bidirectional => "<>",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// A rule language variant that rules can be converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Snort,
    Suricata,
}

impl Dialect {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "snort" | "snort3" => Some(Self::Snort),
            "suricata" | "suri" => Some(Self::Suricata),
            _ => None,
        }
    }

    /// The other dialect.
    pub fn counterpart(&self) -> Self {
        match self {
            Self::Snort => Self::Suricata,
            Self::Suricata => Self::Snort,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snort => write!(f, "Snort"),
            Self::Suricata => write!(f, "Suricata"),
        }
    }
}

/// Classifier verdict. Ties resolve to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectGuess {
    Snort,
    Suricata,
    Unknown,
}

impl DialectGuess {
    pub fn dialect(&self) -> Option<Dialect> {
        match self {
            Self::Snort => Some(Dialect::Snort),
            Self::Suricata => Some(Dialect::Suricata),
            Self::Unknown => None,
        }
    }
}

impl From<Dialect> for DialectGuess {
    fn from(d: Dialect) -> Self {
        match d {
            Dialect::Snort => Self::Snort,
            Dialect::Suricata => Self::Suricata,
        }
    }
}

impl fmt::Display for DialectGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dialect() {
            Some(d) => d.fmt(f),
            None => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parses_case_insensitively() {
        assert_eq!("ALERT".parse::<Action>().unwrap(), Action::Alert);
        assert_eq!("sdrop".parse::<Action>().unwrap(), Action::Sdrop);
        assert_eq!(
            "rejectsrc".parse::<Action>(),
            Err(ParseError::UnknownAction("rejectsrc".into()))
        );
    }

    #[test]
    fn dialect_lenient_names() {
        assert_eq!(Dialect::from_str_lenient("Suricata"), Some(Dialect::Suricata));
        assert_eq!(Dialect::from_str_lenient("snort3"), Some(Dialect::Snort));
        assert_eq!(Dialect::from_str_lenient("zeek"), None);
        assert_eq!(Dialect::Snort.counterpart(), Dialect::Suricata);
    }

    #[test]
    fn label_prefers_sid() {
        let mut options = RuleOptions::default();
        options.push("msg", OptionValue::Quoted("Test".into()));
        let mut rule = Rule {
            action: Action::Alert,
            protocol: "tcp".into(),
            source: "any any".into(),
            direction: Direction::Unidirectional,
            destination: "any any".into(),
            options,
            raw: String::new(),
        };
        assert_eq!(rule.label(), "\"Test\"");
        rule.options.push("sid", OptionValue::Bare("7".into()));
        assert_eq!(rule.label(), "sid:7");
    }
}
