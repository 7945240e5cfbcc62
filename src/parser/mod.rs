//! Rule tokenizer: header fields plus a quote-aware option list.

pub mod options;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;
use crate::ir::{Action, Direction, Rule};

pub use options::split_options;

/// `<action> <protocol> <anything> (->|<>) <anything> ( <options> )`, anchored.
static RULE_SHAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(alert|log|pass|drop|reject|sdrop)\s+\S+\s+.+?(->|<>).+?\(.*\)$").unwrap()
});

/// True when the trimmed line looks like a rule rather than a comment,
/// blank line, or prose.
pub fn is_valid_rule(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#') && RULE_SHAPE_RE.is_match(trimmed)
}

/// Decompose a single line into a [`Rule`].
pub fn parse_rule(line: &str) -> Result<Rule, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Err(ParseError::NotARule);
    }

    let (action, rest) = next_token(trimmed).ok_or(ParseError::MissingHeader)?;
    let action: Action = action.parse()?;
    let (protocol, rest) = next_token(rest).ok_or(ParseError::MissingHeader)?;

    let open = rest.find('(').ok_or(ParseError::MissingOptions)?;
    let close = rest.rfind(')').ok_or(ParseError::MissingOptions)?;
    if close < open || !rest[close + 1..].trim().is_empty() {
        return Err(ParseError::MissingOptions);
    }

    let (source, direction, destination) = split_direction(&rest[..open])?;
    let options = split_options(&rest[open + 1..close]);

    Ok(Rule {
        action,
        protocol: protocol.to_lowercase(),
        source,
        direction,
        destination,
        options,
        raw: line.to_string(),
    })
}

/// Parse every rule-shaped line in `text`.
///
/// Comments, blank lines and prose are skipped silently. Shape-valid lines
/// that still fail to decompose are skipped with a debug event.
pub fn parse_rules(text: &str) -> Vec<Rule> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| is_valid_rule(line))
        .filter_map(|(idx, line)| match parse_rule(line) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::debug!(line = idx + 1, error = %e, "skipping undecomposable rule");
                None
            }
        })
        .collect()
}

fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    let (token, rest) = s.split_once(char::is_whitespace)?;
    Some((token, rest.trim_start()))
}

/// Split the address segment on the first `->` or `<>`.
fn split_direction(header: &str) -> Result<(String, Direction, String), ParseError> {
    let uni = header.find("->");
    let bi = header.find("<>");
    let (idx, direction) = match (uni, bi) {
        (Some(u), Some(b)) if b < u => (b, Direction::Bidirectional),
        (Some(u), _) => (u, Direction::Unidirectional),
        (None, Some(b)) => (b, Direction::Bidirectional),
        (None, None) => return Err(ParseError::MissingDirection),
    };

    let source = header[..idx].trim();
    let destination = header[idx + 2..].trim();
    if source.is_empty() {
        return Err(ParseError::EmptyAddress("source"));
    }
    if destination.is_empty() {
        return Err(ParseError::EmptyAddress("destination"));
    }

    Ok((source.to_string(), direction, destination.to_string()))
}
