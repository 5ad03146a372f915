//! Ordered header dictionary with key-replace semantics.

/// Header name/value pairs kept in insertion order.
///
/// Inserting a name that is already present (compared case-insensitively)
/// overwrites the value in place; the entry keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Applies every pair of `other` on top of `self`, in order.
    pub fn replace_with<I, K, V>(&mut self, other: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (k, v) in other {
            self.insert(k, v);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self
            .entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `base` with `self` applied on top: `self` wins on collisions,
    /// `base` ordering comes first.
    pub fn merged_over(&self, base: &Headers) -> Headers {
        let mut merged = base.clone();
        merged.replace_with(self.iter());
        merged
    }

    /// Renders `Name: value` lines as sent on the wire.
    pub fn to_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}: {}", k.trim(), v.trim()))
            .collect()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        headers.replace_with(iter);
        headers
    }
}
