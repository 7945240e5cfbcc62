use crate::ir::{OptionValue, RuleOption, RuleOptions};

/// Splits the body of an options block into ordered options.
///
/// A `;` ends a field only outside quotes. Quotes may be `"` or `'`; inside
/// them a backslash escapes the next character, so `\"` does not close the
/// quote. Each field splits on its first `:` into key and value; a field
/// without a colon is a flag.
pub fn split_options(body: &str) -> RuleOptions {
    split_fields(body)
        .into_iter()
        .filter_map(|field| parse_field(&field))
        .collect()
}

/// Quote-aware split on `;`. Empty fields are dropped.
pub fn split_fields(body: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in body.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                ';' => {
                    push_field(&mut fields, &current);
                    current.clear();
                }
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                _ => current.push(c),
            },
        }
    }
    push_field(&mut fields, &current);

    fields
}

fn push_field(fields: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        fields.push(trimmed.to_string());
    }
}

fn parse_field(field: &str) -> Option<RuleOption> {
    let (key, value) = match field.split_once(':') {
        Some((k, v)) => (k.trim(), Some(v.trim())),
        None => (field.trim(), None),
    };
    if key.is_empty() {
        return None;
    }

    let value = match value {
        None => OptionValue::Flag,
        Some(v) => match strip_quotes(v) {
            Some(inner) => OptionValue::Quoted(inner.to_string()),
            None => OptionValue::Bare(v.to_string()),
        },
    };

    Some(RuleOption::new(key, value))
}

/// Returns the inner text when `v` is wrapped in one matching pair of quotes.
fn strip_quotes(v: &str) -> Option<&str> {
    let first = v.chars().next()?;
    if (first == '"' || first == '\'') && v.len() >= 2 && v.ends_with(first) {
        Some(&v[1..v.len() - 1])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn semicolons_and_parens_inside_quotes() {
        let opts = split_options(r#"content:"a;b(c)"; sid:1;"#);
        assert_eq!(opts.len(), 2);
        assert_eq!(opts.get("content"), Some(&OptionValue::Quoted("a;b(c)".into())));
        assert_eq!(opts.get("sid"), Some(&OptionValue::Bare("1".into())));
    }

    #[test]
    fn escaped_quote_does_not_close() {
        let opts = split_options(r#"pcre:"/a\";b/i"; sid:2;"#);
        assert_eq!(opts.len(), 2);
        assert_eq!(opts.get("pcre").map(OptionValue::as_str), Some(r#"/a\";b/i"#));
    }

    #[test]
    fn single_quotes_and_pipes() {
        let opts = split_options("content:'|3B|;x'; nocase;");
        assert_eq!(opts.get("content"), Some(&OptionValue::Quoted("|3B|;x".into())));
        assert_eq!(opts.get("nocase"), Some(&OptionValue::Flag));
    }

    #[test]
    fn splits_on_first_colon_only() {
        let opts = split_options("reference:url,http://example.com/a; Flow:established,to_server;");
        assert_eq!(
            opts.get("reference").map(OptionValue::as_str),
            Some("url,http://example.com/a")
        );
        // keys are lower-cased
        assert!(opts.contains("flow"));
    }

    #[test]
    fn repeated_content_is_kept() {
        let opts = split_options(r#"content:"one"; content:"two"; content:"three";"#);
        assert_eq!(opts.get_all("content").count(), 3);
    }

    #[test]
    fn missing_trailing_semicolon_and_blank_fields() {
        let opts = split_options(r#"msg:"x";; ; sid:5"#);
        assert_eq!(opts.keys(), vec!["msg", "sid"]);
    }

    proptest! {
        #[test]
        fn quoted_payload_never_splits(payload in "[a-zA-Z0-9 ;()|:,]{0,24}") {
            let body = format!("content:\"{payload}\"; sid:1;");
            let opts = split_options(&body);
            prop_assert_eq!(opts.len(), 2);
            prop_assert_eq!(opts.get("content").map(OptionValue::as_str), Some(payload.as_str()));
        }
    }
}
