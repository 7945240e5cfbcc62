use super::{swap_isdataat, warn_urilen, ConversionLog, Converter};
use crate::classifier::signatures::{SURICATA_FILE_KEYWORDS, TCP_APP_PROTOCOLS, UDP_APP_PROTOCOLS};
use crate::error::Result;
use crate::ir::{Dialect, OptionValue, Rule, RuleOption};

/// Specific HTTP buffers Snort only knows as the generic header buffer.
const FOLDED_HTTP_BUFFERS: &[&str] = &["http.user_agent", "http.cookie"];

/// File keywords dropped on the way to Snort, besides [`SURICATA_FILE_KEYWORDS`].
const FILE_KEYWORDS: &[&str] = &["file_data", "file.data", "file_ext", "filename", "file.name", "filesize"];

pub(super) fn rewrite(rule: &mut Rule, conv: &Converter, log: &mut ConversionLog) -> Result<()> {
    let label = rule.label();

    demote_protocol(rule, &label, log);

    for buffer in FOLDED_HTTP_BUFFERS {
        if rule.options.rename(buffer, "http.header") > 0 {
            log.warning(format!(
                "{label}: {buffer} folded into http.header; match is broader than before"
            ));
        }
    }

    if rule.options.rename("http.request_body", "http.content") > 0 {
        log.info(format!("{label}: renamed http.request_body to http.content"));
    }

    let tls = rule.options.remove_where(|k| k.starts_with("tls."));
    for key in dedup(tls) {
        log.warning(format!("{label}: removed {key}; TLS inspection is lost in Snort"));
    }

    let files = rule.options.remove_where(|k| {
        FILE_KEYWORDS.contains(&k) || SURICATA_FILE_KEYWORDS.contains(&k)
    });
    for key in dedup(files) {
        log.warning(format!("{label}: removed {key}; file inspection is lost in Snort"));
    }

    if rule.options.remove_all("dns.query") > 0 {
        log.warning(format!("{label}: removed dns.query; content now matches the raw packet"));
    }

    if rule.options.remove_all("bsize") > 0 {
        log.warning(format!("{label}: removed bsize; no Snort equivalent"));
    }

    warn_urilen(rule, Dialect::Snort, log);

    if swap_isdataat(rule, "!1,relative", "!0,relative") {
        log.info(format!("{label}: isdataat !1,relative rewritten as !0,relative"));
    }

    if conv.settings.inject_reference && !rule.options.contains("reference") {
        let mentions_malware = rule
            .message()
            .map(|m| m.to_lowercase().contains("malware"))
            .unwrap_or(false);
        if mentions_malware {
            let reference = conv.settings.reference.clone();
            rule.options.insert_before(
                "sid",
                RuleOption::new("reference", OptionValue::Bare(reference.clone())),
            );
            log.info(format!("{label}: added reference:{reference}"));
        }
    }

    Ok(())
}

fn demote_protocol(rule: &mut Rule, label: &str, log: &mut ConversionLog) {
    let transport = if TCP_APP_PROTOCOLS.contains(&rule.protocol.as_str()) {
        "tcp"
    } else if UDP_APP_PROTOCOLS.contains(&rule.protocol.as_str()) {
        "udp"
    } else {
        return;
    };
    log.warning(format!(
        "{label}: protocol {} is not a Snort header protocol, using {transport}",
        rule.protocol
    ));
    rule.protocol = transport.to_string();
}

fn dedup(mut keys: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    keys.retain(|k| {
        if seen.contains(k) {
            false
        } else {
            seen.push(k.clone());
            true
        }
    });
    keys
}
