use super::{Matcher, Signature};
use crate::ir::Dialect;

/// Protocols carried over TCP that only Suricata accepts in a rule header.
pub const TCP_APP_PROTOCOLS: &[&str] = &[
    "http", "http2", "tls", "smtp", "ftp", "ssh", "smb", "imap", "pop3",
];

/// Protocols carried over UDP that only Suricata accepts in a rule header.
pub const UDP_APP_PROTOCOLS: &[&str] = &["dns"];

/// File-extraction keywords specific to Suricata.
pub const SURICATA_FILE_KEYWORDS: &[&str] = &[
    "filestore",
    "fileext",
    "filemagic",
    "filemd5",
    "filesha1",
    "filesha256",
];

/// The built-in scoring table.
pub fn builtin() -> Vec<Signature> {
    let mut table = Vec::new();

    for kw in ["fast_pattern", "openappid", "appid:"] {
        table.push(Signature::keyword(kw, 3, Dialect::Snort));
    }
    for kw in ["http.request_body", "http.user_agent", "dns.query"] {
        table.push(Signature::keyword(kw, 3, Dialect::Suricata));
    }
    for kw in SURICATA_FILE_KEYWORDS {
        table.push(Signature::keyword(*kw, 3, Dialect::Suricata));
    }
    for kw in ["http.content", "http.method"] {
        table.push(Signature::keyword(kw, 2, Dialect::Snort));
    }
    for kw in ["bsize:", "tls.", "file_"] {
        table.push(Signature::keyword(kw, 2, Dialect::Suricata));
    }

    let app_protocols = TCP_APP_PROTOCOLS
        .iter()
        .chain(UDP_APP_PROTOCOLS)
        .map(|p| p.to_string())
        .collect();
    table.push(Signature {
        matcher: Matcher::HeaderProtocol(app_protocols),
        weight: 2,
        dialect: Dialect::Suricata,
    });

    // weaker secondary signals
    for kw in ["service:", "sd_pattern", "rem:"] {
        table.push(Signature::keyword(kw, 1, Dialect::Snort));
    }
    for kw in ["app-layer-event", "dataset:", "ja3.hash", "xbits:"] {
        table.push(Signature::keyword(kw, 1, Dialect::Suricata));
    }

    table
}
