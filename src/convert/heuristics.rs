//! Keyword heuristics used to promote protocols and add sticky buffers.
//!
//! These are substring checks over a rule's message, content payloads,
//! destination and option keys. They do not parse any protocol and will
//! produce false positives; each predicate is a free function so its
//! behavior can be pinned down by tests on its own.

use crate::ir::{OptionValue, Rule};

const WEB_PORTS: &[&str] = &["80", "8000", "8008", "8080", "8888", "$http_ports"];
const WEB_METHODS: &[&str] = &["get", "post", "put", "delete", "head", "options", "patch"];
const WEB_CONTENT: &[&str] = &[
    "http/1.",
    "user-agent",
    "host:",
    "cookie:",
    "content-type",
    ".php",
    ".asp",
    ".jsp",
];
const WEB_MESSAGE: &[&str] = &["http", "web", "url"];

const TLS_PORTS: &[&str] = &["443", "8443", "465", "993", "995"];
const TLS_CONTENT: &[&str] = &["|16 03", "|160301|", "|160303|"];
const TLS_MESSAGE: &[&str] = &["tls", "ssl", "certificate"];

const DNS_PORTS: &[&str] = &["53"];
const DNS_MESSAGE: &[&str] = &["dns", "query"];
const TLD_SUFFIXES: &[&str] = &[
    ".com", ".net", ".org", ".info", ".biz", ".io", ".ru", ".cn", ".xyz", ".top", ".tk",
];

const FILE_MESSAGE: &[&str] = &["file", "upload", "malware"];
/// Magic bytes, matched case-sensitively as written in rules.
const FILE_MAGIC: &[&str] = &["MZ", "%PDF", "PK|03 04|", "|7F|ELF", "Rar!"];
/// Hex forms of the same, matched case-insensitively.
const FILE_MAGIC_HEX: &[&str] = &[
    "|4d 5a",
    "|25 50 44 46",
    "|50 4b 03 04",
    "|7f 45 4c 46",
    "|52 61 72 21",
    "|1f 8b",
];

/// The text fields a heuristic may look at, lower-cased where noted.
#[derive(Debug, Clone, Default)]
pub struct TrafficSignals {
    /// Lower-cased protocol token.
    pub protocol: String,
    /// Lower-cased `msg`, empty when absent.
    pub message: String,
    /// Every `content` payload, as written.
    pub contents: Vec<String>,
    /// Lower-cased destination expression.
    pub destination: String,
    /// Option keys in order.
    pub keys: Vec<String>,
}

impl TrafficSignals {
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            protocol: rule.protocol.to_lowercase(),
            message: rule.message().unwrap_or_default().to_lowercase(),
            contents: rule
                .options
                .get_all("content")
                .map(OptionValue::as_str)
                .map(str::to_string)
                .collect(),
            destination: rule.destination.to_lowercase(),
            keys: rule.options.iter().map(|o| o.key.clone()).collect(),
        }
    }

    /// Port tokens of the destination: the last whitespace field, split on
    /// list and range punctuation.
    pub fn destination_ports(&self) -> Vec<&str> {
        self.destination
            .split_whitespace()
            .last()
            .map(|ports| {
                ports
                    .split(|c| matches!(c, '[' | ']' | ',' | ':' | '!'))
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn port_in(&self, ports: &[&str]) -> bool {
        self.destination_ports().iter().any(|p| ports.contains(p))
    }

    fn message_mentions(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.message.contains(w))
    }

    fn content_contains_ci(&self, needles: &[&str]) -> bool {
        self.contents.iter().any(|c| {
            let lower = c.to_lowercase();
            needles.iter().any(|n| lower.contains(n))
        })
    }

    fn has_key_prefix(&self, prefix: &str) -> bool {
        self.keys.iter().any(|k| k.starts_with(prefix))
    }
}

pub fn is_web_traffic(s: &TrafficSignals) -> bool {
    s.protocol == "http"
        || s.port_in(WEB_PORTS)
        || s.has_key_prefix("http.")
        || s.has_key_prefix("http_")
        || s.contents
            .iter()
            .any(|c| WEB_METHODS.contains(&c.trim().to_lowercase().as_str()))
        || s.content_contains_ci(WEB_CONTENT)
        || s.message_mentions(WEB_MESSAGE)
}

pub fn is_tls_traffic(s: &TrafficSignals) -> bool {
    s.protocol == "tls"
        || s.port_in(TLS_PORTS)
        || s.has_key_prefix("tls.")
        || s.content_contains_ci(TLS_CONTENT)
        || s.message_mentions(TLS_MESSAGE)
}

pub fn is_dns_traffic(s: &TrafficSignals) -> bool {
    s.protocol == "dns"
        || s.port_in(DNS_PORTS)
        || s.has_key_prefix("dns.")
        || s.message_mentions(DNS_MESSAGE)
        || s.content_contains_ci(TLD_SUFFIXES)
}

pub fn is_file_content(s: &TrafficSignals) -> bool {
    s.message_mentions(FILE_MESSAGE)
        || s.contents
            .iter()
            .any(|c| FILE_MAGIC.iter().any(|m| c.contains(m)))
        || s.content_contains_ci(FILE_MAGIC_HEX)
}

/// Heuristics the converter consults. Override individual predicates to
/// tune promotion without touching the conversion engine.
pub trait TrafficHeuristics: Send + Sync {
    fn is_web_traffic(&self, signals: &TrafficSignals) -> bool {
        is_web_traffic(signals)
    }

    fn is_tls_traffic(&self, signals: &TrafficSignals) -> bool {
        is_tls_traffic(signals)
    }

    fn is_dns_traffic(&self, signals: &TrafficSignals) -> bool {
        is_dns_traffic(signals)
    }

    fn is_file_content(&self, signals: &TrafficSignals) -> bool {
        is_file_content(signals)
    }
}

/// Default heuristics: the free predicates in this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordHeuristics;

impl TrafficHeuristics for KeywordHeuristics {}
