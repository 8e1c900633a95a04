//! Recursive string rewriting over JSON trees

use serde_json::Value;

/// Which keyed strings a walk rewrites
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyFilter {
    /// Every string, keyed or not
    #[default]
    All,
    /// Only strings stored directly under one of these keys
    Keys(Vec<String>),
}

impl KeyFilter {
    /// Filter from an optional key list; empty means [`KeyFilter::All`]
    #[must_use]
    pub fn from_keys(keys: Vec<String>) -> Self {
        if keys.is_empty() {
            Self::All
        } else {
            Self::Keys(keys)
        }
    }

    /// Whether a string under `key` is selected
    ///
    /// Array elements and a root string have no key.
    #[must_use]
    pub fn accepts(&self, key: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Keys(keys) => key.is_some_and(|k| keys.iter().any(|want| want == k)),
        }
    }
}

/// Rewrite every string for which `predicate(key, value)` holds
///
/// `transform` returns `Some(new)` to replace a string. Object key order and
/// every other value are preserved. Returns the number of strings changed.
pub fn rewrite_strings<P, T>(value: &mut Value, predicate: P, mut transform: T) -> usize
where
    P: Fn(Option<&str>, &str) -> bool,
    T: FnMut(&str) -> Option<String>,
{
    visit(value, None, &predicate, &mut transform)
}

fn visit<P, T>(value: &mut Value, key: Option<&str>, predicate: &P, transform: &mut T) -> usize
where
    P: Fn(Option<&str>, &str) -> bool,
    T: FnMut(&str) -> Option<String>,
{
    match value {
        Value::String(s) => {
            if !predicate(key, s.as_str()) {
                return 0;
            }
            match transform(s.as_str()) {
                Some(next) if next != *s => {
                    *s = next;
                    1
                }
                _ => 0,
            }
        }
        Value::Array(items) => {
            let mut count = 0;
            for item in items {
                count += visit(item, None, predicate, transform);
            }
            count
        }
        Value::Object(map) => {
            let mut count = 0;
            for (k, v) in map.iter_mut() {
                count += visit(v, Some(k.as_str()), predicate, transform);
            }
            count
        }
        _ => 0,
    }
}
