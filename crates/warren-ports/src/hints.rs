use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::BindingError;

/// Textual key/value attributes attached to a binding request, e.g. `cs = "3"` for a chip-select
/// binding or `base`/`size` for mapping a bus target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingHints(BTreeMap<String, String>);

impl BindingHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses the hint at `key` as an unsigned scalar.
    pub fn scalar(&self, key: &'static str) -> Result<u64, BindingError> {
        let value = self.get(key).ok_or(BindingError::MissingHint { key })?;
        parse_scalar(value).ok_or_else(|| BindingError::MalformedHint {
            key,
            value: value.to_owned(),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BindingHints {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Decimal or `0x`-prefixed hexadecimal; surrounding whitespace and `_` separators are ignored.
pub fn parse_scalar(text: &str) -> Option<u64> {
    let text = text.trim().replace('_', "");
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok();
    }
    text.parse().ok()
}
