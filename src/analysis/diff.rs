use serde::{Deserialize, Serialize};

use super::AnalysisSettings;
use crate::classifier::signatures::{SURICATA_FILE_KEYWORDS, TCP_APP_PROTOCOLS, UDP_APP_PROTOCOLS};
use crate::ir::{Dialect, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Protocol,
    Action,
    OptionAdded,
    OptionRemoved,
    OptionModified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRecord {
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRecord {
    pub category: String,
    pub description: String,
    pub level: RiskLevel,
    pub mitigation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    pub description: String,
    pub priority: RiskLevel,
}

/// Everything the analyzer derived for one `(original, converted)` pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleAnalysis {
    /// `sid` of the converted rule, if any.
    pub sid: Option<String>,
    pub changes: Vec<ChangeRecord>,
    pub optimizations: Vec<OptimizationRecord>,
    pub risks: Vec<RiskRecord>,
    pub recommendations: Vec<Recommendation>,
}

impl RuleAnalysis {
    pub fn highest_risk(&self) -> Option<RiskLevel> {
        self.risks.iter().map(|r| r.level).max()
    }

    fn change(&mut self, kind: ChangeKind, description: String) {
        self.changes.push(ChangeRecord { kind, description });
    }

    fn optimization(&mut self, category: &str, description: String) {
        self.optimizations.push(OptimizationRecord {
            category: category.into(),
            description,
        });
    }

    fn risk(&mut self, category: &str, level: RiskLevel, description: String, mitigation: &str) {
        self.risks.push(RiskRecord {
            category: category.into(),
            description,
            level,
            mitigation: mitigation.into(),
        });
    }

    fn recommend(&mut self, category: &str, priority: RiskLevel, description: String) {
        self.recommendations.push(Recommendation {
            category: category.into(),
            description,
            priority,
        });
    }
}

fn is_app_protocol(p: &str) -> bool {
    TCP_APP_PROTOCOLS.contains(&p) || UDP_APP_PROTOCOLS.contains(&p)
}

fn is_tcp_family(p: &str) -> bool {
    p == "tcp" || TCP_APP_PROTOCOLS.contains(&p)
}

fn is_file_keyword(k: &str) -> bool {
    k == "file_data" || k.starts_with("file.") || k.starts_with("file_") || SURICATA_FILE_KEYWORDS.contains(&k)
}

/// Compare a rule with its conversion in one pass over both option sets.
pub fn analyze(
    original: &Rule,
    converted: &Rule,
    target: Dialect,
    settings: &AnalysisSettings,
) -> RuleAnalysis {
    let mut a = RuleAnalysis {
        sid: converted.sid().map(str::to_string),
        ..Default::default()
    };

    let before = original.options.keys();
    let after = converted.options.keys();
    let removed: Vec<&str> = before.iter().copied().filter(|k| !after.contains(k)).collect();
    let added: Vec<&str> = after.iter().copied().filter(|k| !before.contains(k)).collect();

    // changes
    if original.protocol != converted.protocol {
        a.change(
            ChangeKind::Protocol,
            format!("Protocol changed from {} to {}", original.protocol, converted.protocol),
        );
    }
    if original.action != converted.action {
        a.change(
            ChangeKind::Action,
            format!("Action changed from {} to {}", original.action, converted.action),
        );
    }
    for key in &removed {
        a.change(ChangeKind::OptionRemoved, format!("Removed option {key}"));
    }
    for key in &added {
        a.change(ChangeKind::OptionAdded, format!("Added option {key}"));
    }
    for key in before.iter().filter(|k| after.contains(k)) {
        let old = original.options.get(key).map(|v| v.as_str()).unwrap_or_default();
        let new = converted.options.get(key).map(|v| v.as_str()).unwrap_or_default();
        if old != new {
            a.change(ChangeKind::OptionModified, format!("{key}: {old} -> {new}"));
        }
    }

    // optimizations
    if !is_app_protocol(&original.protocol) && is_app_protocol(&converted.protocol) {
        a.optimization(
            "protocol",
            format!(
                "Application-layer protocol {} enables protocol-aware inspection",
                converted.protocol
            ),
        );
    }
    for key in &added {
        match *key {
            "bsize" => a.optimization(
                "buffer",
                "bsize pins the buffer length for an exact match".into(),
            ),
            "http.user_agent" | "http.cookie" => a.optimization(
                "buffer",
                format!("Dedicated {key} buffer replaces the generic header buffer"),
            ),
            "file_data" | "dns.query" => a.optimization(
                "buffer",
                format!("{key} restricts content matching to the relevant buffer"),
            ),
            _ => {}
        }
    }

    // risks
    for key in &removed {
        match *key {
            "fast_pattern" => a.risk(
                "performance",
                RiskLevel::Medium,
                "fast_pattern removed; the engine now picks the fast pattern itself".into(),
                "Check that the automatically chosen pattern is the intended anchor",
            ),
            "openappid" | "appid" => a.risk(
                "detection",
                RiskLevel::Low,
                format!("{key} removed; application identification is no longer enforced"),
                "Constrain the rule by protocol or port instead",
            ),
            "dns.query" => a.risk(
                "detection",
                RiskLevel::Medium,
                "dns.query removed; content is matched against the whole packet".into(),
                "Anchor the content with offset/depth inside the query section",
            ),
            "bsize" => a.risk(
                "detection",
                RiskLevel::Low,
                "bsize removed; the exact-length constraint is gone".into(),
                "Add an isdataat or depth check if the length matters",
            ),
            k if k.starts_with("tls.") => a.risk(
                "functionality",
                RiskLevel::High,
                format!("{k} removed; TLS inspection is lost"),
                "Recreate the check with ssl_state/ssl_version or a TLS-aware rule",
            ),
            k if is_file_keyword(k) => a.risk(
                "functionality",
                RiskLevel::High,
                format!("{k} removed; file inspection is lost"),
                "Use file policy or file rules on the target engine",
            ),
            _ => {}
        }
    }
    let folded = ["http.user_agent", "http.cookie"]
        .iter()
        .any(|k| removed.contains(k));
    if folded && added.contains(&"http.header") {
        a.risk(
            "accuracy",
            RiskLevel::Medium,
            "Specific HTTP buffer folded into http.header; the match is broader".into(),
            "Prefix the content with the header name, e.g. \"User-Agent: \"",
        );
    }
    if is_app_protocol(&original.protocol) && !is_app_protocol(&converted.protocol) {
        a.risk(
            "detection",
            RiskLevel::Medium,
            format!(
                "Protocol {} demoted to {}; protocol-aware matching is lost",
                original.protocol, converted.protocol
            ),
            "Add port constraints or a service option",
        );
    }
    if converted.options.contains("urilen") {
        a.risk(
            "accuracy",
            RiskLevel::Low,
            "urilen range boundaries differ between dialects".into(),
            "Review the range endpoints by hand",
        );
    }
    if original.action != converted.action {
        a.risk(
            "behavior",
            RiskLevel::Low,
            format!("Action {} replaced by {}", original.action, converted.action),
            "Confirm the replacement action is acceptable for this deployment",
        );
    }

    // recommendations
    if target == Dialect::Snort && !converted.options.contains("fast_pattern") {
        if let Some(len) = converted
            .options
            .get_all("content")
            .map(|v| v.as_str().len())
            .filter(|&len| len > settings.fast_pattern_min_length)
            .max()
        {
            a.recommend(
                "performance",
                RiskLevel::Medium,
                format!("Content of {len} bytes has no fast_pattern; consider adding one"),
            );
        }
    }
    if !converted.options.contains("msg") {
        a.recommend("maintenance", RiskLevel::Low, "Add a msg describing the rule".into());
    }
    if !converted.options.contains("rev") {
        a.recommend("maintenance", RiskLevel::Low, "Add rev to track rule revisions".into());
    }
    if !converted.options.contains("classtype") {
        a.recommend("maintenance", RiskLevel::Low, "Add a classtype for alert prioritization".into());
    }
    if is_tcp_family(&converted.protocol) && !converted.options.contains("flow") {
        a.recommend(
            "performance",
            RiskLevel::Medium,
            "Add flow (e.g. flow:established,to_server) to limit inspection to real sessions".into(),
        );
    }

    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConversionLog, Converter};
    use crate::parser::parse_rule;
    use pretty_assertions::assert_eq;

    fn pair(line: &str, target: Dialect) -> RuleAnalysis {
        let original = parse_rule(line).unwrap();
        let mut log = ConversionLog::new();
        let converted = Converter::default().convert(&original, target, &mut log).unwrap();
        analyze(&original, &converted, target, &AnalysisSettings::default())
    }

    #[test]
    fn fast_pattern_removal_is_medium_risk() {
        let a = pair(
            r#"alert tcp $EXTERNAL_NET any -> $HOME_NET 80 (msg:"X"; content:"POST"; fast_pattern; sid:1000001; rev:3;)"#,
            Dialect::Suricata,
        );
        let kinds: Vec<ChangeKind> = a.changes.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::Protocol,
                ChangeKind::OptionRemoved,
                ChangeKind::OptionAdded,
                ChangeKind::OptionModified
            ]
        );
        assert!(a
            .risks
            .iter()
            .any(|r| r.level == RiskLevel::Medium && r.description.contains("fast_pattern")));
        assert!(a.optimizations.iter().any(|o| o.category == "protocol"));
        assert_eq!(a.sid.as_deref(), Some("1"));
    }

    #[test]
    fn tls_removal_is_high_risk() {
        let a = pair(
            r#"alert tls any any -> any any (msg:"x"; tls.cert_subject; content:"CN=evil"; flow:established; sid:1; rev:1;)"#,
            Dialect::Snort,
        );
        assert_eq!(a.highest_risk(), Some(RiskLevel::High));
        assert!(a.risks.iter().any(|r| r.description.contains("demoted")));
    }

    #[test]
    fn folded_header_is_flagged() {
        let a = pair(
            r#"alert http any any -> any any (msg:"x"; http.user_agent; content:"curl"; flow:established; sid:1;)"#,
            Dialect::Snort,
        );
        assert!(a.risks.iter().any(|r| r.category == "accuracy"));
    }

    #[test]
    fn long_content_without_fast_pattern_recommended_for_snort() {
        let payload = "A".repeat(60);
        let line = format!(
            r#"alert tcp any any -> any 22 (msg:"x"; flow:established; content:"{payload}"; classtype:misc; sid:1; rev:1;)"#
        );
        let a = pair(&line, Dialect::Snort);
        assert_eq!(a.recommendations.len(), 1);
        assert!(a.recommendations[0].description.contains("60 bytes"));
    }

    #[test]
    fn complete_rule_has_no_recommendations() {
        let a = pair(
            r#"alert udp any any -> any 123 (msg:"ntp"; content:"|17|"; classtype:misc; sid:3; rev:2;)"#,
            Dialect::Snort,
        );
        assert!(a.recommendations.is_empty());
        assert!(a.risks.is_empty());
    }

    #[test]
    fn identical_rules_have_no_changes() {
        let rule = parse_rule(r#"alert tcp any any -> any any (msg:"x"; sid:1;)"#).unwrap();
        let a = analyze(&rule, &rule, Dialect::Suricata, &AnalysisSettings::default());
        assert!(a.changes.is_empty());
        assert!(a.optimizations.is_empty());
    }
}
