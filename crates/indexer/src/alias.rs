use docbot_archive::ClassName;
use std::collections::{BTreeSet, HashMap};

/// Lookup keys to canonical class names.
///
/// Each class contributes its simple and full name, both verbatim and lower-cased. One key
/// may point at several classes (`list` -> `java.util.List`, `java.awt.List`).
#[derive(Debug, Default)]
pub struct AliasIndex {
    aliases: HashMap<String, BTreeSet<String>>,
}

impl AliasIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a query: exact case first, lower case only if that found nothing.
    ///
    /// A hit in the exact-case table is never widened with lower-case matches.
    pub fn resolve(&self, query: &str) -> BTreeSet<String> {
        if let Some(names) = self.aliases.get(query).filter(|names| !names.is_empty()) {
            return names.clone();
        }
        self.aliases
            .get(&query.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn insert(&mut self, class: &ClassName) {
        for key in simple_keys(class).into_iter().chain(full_keys(class)) {
            self.aliases
                .entry(key)
                .or_default()
                .insert(class.full.clone());
        }
    }

    /// Drop `class.full` from the keys derived from its simple name.
    pub(crate) fn remove_simple(&mut self, class: &ClassName) {
        for key in simple_keys(class) {
            self.remove_key(&key, &class.full);
        }
    }

    /// Drop `class.full` from the keys derived from its full name.
    pub(crate) fn remove_full(&mut self, class: &ClassName) {
        for key in full_keys(class) {
            self.remove_key(&key, &class.full);
        }
    }

    fn remove_key(&mut self, key: &str, full: &str) {
        let Some(names) = self.aliases.get_mut(key) else {
            return;
        };
        names.remove(full);
        if names.is_empty() {
            self.aliases.remove(key);
        }
    }

    /// Number of distinct lookup keys
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

fn simple_keys(class: &ClassName) -> [String; 2] {
    [class.simple.clone(), class.simple.to_lowercase()]
}

fn full_keys(class: &ClassName) -> [String; 2] {
    [class.full.clone(), class.full.to_lowercase()]
}
