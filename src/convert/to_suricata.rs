use super::{buffer_insert_point, swap_isdataat, warn_urilen, ConversionLog, Converter, TrafficSignals};
use crate::error::Result;
use crate::ir::{Action, Dialect, OptionValue, Rule, RuleOption};

/// Snort-native options Suricata does not need.
const SNORT_ONLY: &[&str] = &["fast_pattern", "openappid", "appid"];

/// User-Agent literals that pin the buffer size when matched exactly.
const KNOWN_USER_AGENTS: &[&str] = &["Mozilla/5.0"];

pub(super) fn rewrite(rule: &mut Rule, conv: &Converter, log: &mut ConversionLog) -> Result<()> {
    let label = rule.label();

    if rule.action == Action::Sdrop {
        rule.action = Action::Drop;
        log.warning(format!("{label}: action sdrop is not supported by Suricata, using drop"));
    }

    for key in SNORT_ONLY {
        let removed = rule.options.remove_all(key);
        if removed > 0 {
            log.info(format!("{label}: removed {key} (not needed by Suricata)"));
        }
    }

    if rule.options.rename("http.content", "http.request_body") > 0 {
        log.info(format!("{label}: renamed http.content to http.request_body"));
    }

    split_http_header(rule, &label, log);

    if swap_isdataat(rule, "!0,relative", "!1,relative") {
        log.info(format!("{label}: isdataat !0,relative rewritten as !1,relative"));
    }
    warn_urilen(rule, Dialect::Suricata, log);

    let signals = TrafficSignals::from_rule(rule);
    let heuristics = conv.heuristics();

    if conv.settings.promote_protocols {
        let promoted = match rule.protocol.as_str() {
            "tcp" if heuristics.is_web_traffic(&signals) => Some("http"),
            "tcp" if heuristics.is_tls_traffic(&signals) => Some("tls"),
            "udp" if heuristics.is_dns_traffic(&signals) => Some("dns"),
            _ => None,
        };
        if let Some(protocol) = promoted {
            log.info(format!(
                "{label}: promoted protocol {} to {protocol}",
                rule.protocol
            ));
            rule.protocol = protocol.to_string();
        }
    }

    if !rule.options.contains("file_data") && heuristics.is_file_content(&signals) {
        add_buffer(rule, "file_data", &label, log);
    }

    if rule.protocol == "dns"
        && !rule.options.contains("dns.query")
        && heuristics.is_dns_traffic(&signals)
    {
        add_buffer(rule, "dns.query", &label, log);
    }

    if !rule.options.contains("metadata") {
        let marker = conv.settings.metadata_marker.clone();
        rule.options.insert_before(
            "sid",
            RuleOption::new("metadata", OptionValue::Bare(marker.clone())),
        );
        log.info(format!("{label}: added metadata:{marker}"));
    }

    Ok(())
}

/// Re-derive `http.user_agent` / `http.cookie` from generic `http.header`
/// buffers by sniffing the payload each one inspects.
fn split_http_header(rule: &mut Rule, label: &str, log: &mut ConversionLog) {
    // back to front so inserted bsize options do not shift pending indices
    for idx in rule.options.positions("http.header").into_iter().rev() {
        let (payload_idx, payload) = match rule.options.at(idx).map(|o| &o.value) {
            Some(OptionValue::Flag) => match rule.options.position_after(idx, "content") {
                Some(c) => (c, rule.options.at(c).map(|o| o.value.as_str().to_string())),
                None => continue,
            },
            Some(value) => (idx, Some(value.as_str().to_string())),
            None => continue,
        };
        let Some(payload) = payload else { continue };
        let lower = payload.to_lowercase();

        let buffer = if lower.contains("user-agent") || lower.contains("mozilla") {
            "http.user_agent"
        } else if lower.contains("cookie") {
            "http.cookie"
        } else {
            continue;
        };

        if let Some(option) = rule.options.at_mut(idx) {
            option.key = buffer.to_string();
        }
        log.info(format!("{label}: split http.header into {buffer}"));

        if buffer == "http.user_agent" && KNOWN_USER_AGENTS.contains(&payload.as_str()) {
            let size = payload.len();
            rule.options.insert(
                payload_idx + 1,
                RuleOption::new("bsize", OptionValue::Bare(size.to_string())),
            );
            log.info(format!("{label}: added bsize:{size} for exact User-Agent match"));
        }
    }
}

fn add_buffer(rule: &mut Rule, buffer: &str, label: &str, log: &mut ConversionLog) {
    match buffer_insert_point(&rule.options) {
        Some(idx) => {
            rule.options.insert(idx, RuleOption::flag(buffer));
            log.info(format!("{label}: added {buffer} buffer"));
        }
        None => log.info(format!(
            "{label}: {buffer} suggested but every content is already bound to a buffer"
        )),
    }
}
