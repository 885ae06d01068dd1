//! Utility types for validation.

use std::collections::HashMap;

/// Case-insensitive name lookup that remembers the original spelling.
#[derive(Debug, Clone, Default)]
pub struct CaseInsensitiveSet {
    /// Uppercase name -> original name
    inner: HashMap<String, String>,
}

impl CaseInsensitiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(name);
        }
        set
    }

    pub fn insert(&mut self, value: impl AsRef<str>) {
        let s = value.as_ref();
        self.inner.insert(s.to_uppercase(), s.to_string());
    }

    pub fn contains(&self, value: impl AsRef<str>) -> bool {
        self.inner.contains_key(&value.as_ref().to_uppercase())
    }

    /// Original column name for a variable.
    pub fn get(&self, value: impl AsRef<str>) -> Option<&str> {
        self.inner
            .get(&value.as_ref().to_uppercase())
            .map(String::as_str)
    }

    /// Original names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_set() {
        let set = CaseInsensitiveSet::from_names(["USUBJID", "STUDYID", "Domain"]);

        assert!(set.contains("usubjid"));
        assert!(set.contains("DOMAIN"));
        assert_eq!(set.get("domain"), Some("Domain"));
        assert!(!set.contains("OTHER"));
        assert_eq!(set.len(), 3);
    }
}
