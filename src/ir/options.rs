use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload of a single rule option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum OptionValue {
    /// Option with no payload (`nocase;`, `fast_pattern;`).
    Flag,
    /// Unquoted payload (`sid:1000;`).
    Bare(String),
    /// Payload that was quote-delimited in the source, stored without the quotes.
    Quoted(String),
}

impl OptionValue {
    /// Payload text; flags read as the literal `"true"`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Flag => "true",
            Self::Bare(s) | Self::Quoted(s) => s,
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, Self::Flag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOption {
    /// Lower-cased option keyword.
    pub key: String,
    pub value: OptionValue,
}

impl RuleOption {
    pub fn new(key: impl Into<String>, value: OptionValue) -> Self {
        Self {
            key: key.into().to_lowercase(),
            value,
        }
    }

    pub fn flag(key: impl Into<String>) -> Self {
        Self::new(key, OptionValue::Flag)
    }
}

impl fmt::Display for RuleOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            OptionValue::Flag => write!(f, "{};", self.key),
            OptionValue::Bare(v) => write!(f, "{}:{};", self.key, v),
            OptionValue::Quoted(v) => {
                let quote = if has_unescaped(v, '"') { '\'' } else { '"' };
                write!(f, "{}:{quote}{}{quote};", self.key, v)
            }
        }
    }
}

/// True when `c` occurs in `text` without a preceding backslash escape.
fn has_unescaped(text: &str, c: char) -> bool {
    let mut escaped = false;
    for ch in text.chars() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == c {
            return true;
        }
    }
    false
}

/// Ordered multi-map of rule options.
///
/// Keys may repeat (`content` usually does) and every occurrence is kept in
/// source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleOptions(Vec<RuleOption>);

impl RuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleOption> {
        self.0.iter()
    }

    pub fn push(&mut self, key: impl Into<String>, value: OptionValue) {
        self.0.push(RuleOption::new(key, value));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|o| o.key == key)
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.iter().find(|o| o.key == key).map(|o| &o.value)
    }

    /// Every value stored under `key`, in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a OptionValue> + 'a {
        self.0.iter().filter(move |o| o.key == key).map(|o| &o.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut OptionValue> {
        self.0.iter_mut().find(|o| o.key == key).map(|o| &mut o.value)
    }

    /// Mutable access to every value stored under `key`.
    pub fn values_mut<'a>(
        &'a mut self,
        key: &'a str,
    ) -> impl Iterator<Item = &'a mut OptionValue> + 'a {
        self.0
            .iter_mut()
            .filter(move |o| o.key == key)
            .map(|o| &mut o.value)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|o| o.key == key)
    }

    /// Distinct keys in first-seen order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for option in &self.0 {
            if !keys.contains(&option.key.as_str()) {
                keys.push(&option.key);
            }
        }
        keys
    }

    /// Removes every occurrence of `key`, returning how many were removed.
    pub fn remove_all(&mut self, key: &str) -> usize {
        let before = self.0.len();
        self.0.retain(|o| o.key != key);
        before - self.0.len()
    }

    /// Removes every option whose key satisfies `pred`, returning the removed keys.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut removed = Vec::new();
        self.0.retain(|o| {
            if pred(&o.key) {
                removed.push(o.key.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Renames every occurrence of `from` to `to` in place, returning the count.
    pub fn rename(&mut self, from: &str, to: &str) -> usize {
        let mut count = 0;
        for option in self.0.iter_mut().filter(|o| o.key == from) {
            option.key = to.to_string();
            count += 1;
        }
        count
    }

    /// Inserts `option` at `index`, clamped to the end.
    pub fn insert(&mut self, index: usize, option: RuleOption) {
        let index = index.min(self.0.len());
        self.0.insert(index, option);
    }

    /// Inserts `option` before the first occurrence of `anchor`, or appends it.
    pub fn insert_before(&mut self, anchor: &str, option: RuleOption) {
        match self.position(anchor) {
            Some(idx) => self.0.insert(idx, option),
            None => self.0.push(option),
        }
    }

    /// Indices of every occurrence of `key`.
    pub fn positions(&self, key: &str) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, o)| o.key == key)
            .map(|(i, _)| i)
            .collect()
    }

    /// Index of the first `key` strictly after `idx`.
    pub fn position_after(&self, idx: usize, key: &str) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .skip(idx + 1)
            .find(|(_, o)| o.key == key)
            .map(|(i, _)| i)
    }

    pub fn at(&self, idx: usize) -> Option<&RuleOption> {
        self.0.get(idx)
    }

    pub fn at_mut(&mut self, idx: usize) -> Option<&mut RuleOption> {
        self.0.get_mut(idx)
    }
}

impl FromIterator<RuleOption> for RuleOptions {
    fn from_iter<I: IntoIterator<Item = RuleOption>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RuleOptions {
    type Item = &'a RuleOption;
    type IntoIter = std::slice::Iter<'a, RuleOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for RuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, option) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{option}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RuleOptions {
        let mut opts = RuleOptions::new();
        opts.push("msg", OptionValue::Quoted("x".into()));
        opts.push("content", OptionValue::Quoted("GET".into()));
        opts.push("nocase", OptionValue::Flag);
        opts.push("content", OptionValue::Quoted("/admin".into()));
        opts.push("sid", OptionValue::Bare("10".into()));
        opts
    }

    #[test]
    fn repeated_keys_survive() {
        let opts = sample();
        let contents: Vec<&str> = opts.get_all("content").map(OptionValue::as_str).collect();
        assert_eq!(contents, vec!["GET", "/admin"]);
        assert_eq!(opts.keys(), vec!["msg", "content", "nocase", "sid"]);
    }

    #[test]
    fn renders_flags_and_quotes() {
        assert_eq!(
            sample().to_string(),
            r#"msg:"x"; content:"GET"; nocase; content:"/admin"; sid:10;"#
        );
    }

    #[test]
    fn insert_before_anchor_or_append() {
        let mut opts = sample();
        opts.insert_before("sid", RuleOption::new("metadata", OptionValue::Bare("a b".into())));
        assert_eq!(opts.position("metadata"), Some(4));

        let mut bare = RuleOptions::new();
        bare.insert_before("sid", RuleOption::flag("file_data"));
        assert_eq!(bare.position("file_data"), Some(0));
    }

    #[test]
    fn rename_and_remove() {
        let mut opts = sample();
        assert_eq!(opts.rename("content", "http.content"), 2);
        assert!(!opts.contains("content"));
        assert_eq!(opts.remove_all("http.content"), 2);
        assert_eq!(opts.len(), 3);
        let removed = opts.remove_where(|k| k == "nocase" || k == "msg");
        assert_eq!(removed, vec!["msg".to_string(), "nocase".to_string()]);
    }

    #[test]
    fn payload_with_double_quote_renders_single_quoted() {
        let option = RuleOption::new("content", OptionValue::Quoted("a\"b;c".into()));
        assert_eq!(option.to_string(), r#"content:'a"b;c';"#);

        let escaped = RuleOption::new("pcre", OptionValue::Quoted(r#"/a\"b/"#.into()));
        assert_eq!(escaped.to_string(), r#"pcre:"/a\"b/";"#);
    }

    #[test]
    fn flag_reads_as_true() {
        assert_eq!(OptionValue::Flag.as_str(), "true");
        assert!(OptionValue::Flag.is_flag());
        assert!(!OptionValue::Bare("true".into()).is_flag());
    }
}
