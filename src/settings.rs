use std::cmp::Ordering;

use rustc_hash::FxHashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Metadata of one intention: where it is grouped and how it is named.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IntentionMeta {
    /// Ordered category labels, outermost first.
    pub category: Vec<String>,
    /// Display (family) name.
    pub family: String,
}

impl IntentionMeta {
    /// Creates intention metadata from a category path and a family name.
    pub fn new<I, S>(category: I, family: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category: category.into_iter().map(Into::into).collect(),
            family: family.into(),
        }
    }
}

/// Orders intentions by category path (element-wise, prefix first), then by family.
pub fn compare_intentions(a: &IntentionMeta, b: &IntentionMeta) -> Ordering {
    a.category
        .cmp(&b.category)
        .then_with(|| a.family.cmp(&b.family))
}

/// Returns a sorted copy of the given intentions.
pub fn copy_and_sort(intentions: &[IntentionMeta]) -> Vec<IntentionMeta> {
    let mut copy = intentions.to_vec();
    copy.sort_by(compare_intentions);
    copy
}

/// Source of truth for intention enablement.
///
/// Implementations own the persisted state; the panel only reads the list and
/// writes flags back on apply.
pub trait IntentionSettings {
    /// Returns every known intention in any order.
    fn intentions(&self) -> Vec<IntentionMeta>;
    /// Returns whether the intention is enabled.
    fn is_enabled(&self, intention: &IntentionMeta) -> bool;
    /// Stores the enabled flag for the intention.
    fn set_enabled(&mut self, intention: &IntentionMeta, enabled: bool);
}

/// In-memory settings source.
#[derive(Clone, Debug, Default)]
pub struct MemorySettings {
    intentions: Vec<IntentionMeta>,
    enabled: FxHashMap<IntentionMeta, bool>,
    default_enabled: bool,
}

impl MemorySettings {
    /// Creates an empty source where unknown intentions are disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag reported for intentions without an explicit value.
    #[must_use]
    pub const fn default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    /// Registers an intention with an initial flag.
    pub fn insert(&mut self, intention: IntentionMeta, enabled: bool) {
        if !self.enabled.contains_key(&intention) {
            self.intentions.push(intention.clone());
        }
        self.enabled.insert(intention, enabled);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, intention: IntentionMeta, enabled: bool) -> Self {
        self.insert(intention, enabled);
        self
    }

    /// Number of registered intentions.
    pub fn len(&self) -> usize {
        self.intentions.len()
    }

    /// Returns `true` if no intention is registered.
    pub fn is_empty(&self) -> bool {
        self.intentions.is_empty()
    }
}

impl IntentionSettings for MemorySettings {
    fn intentions(&self) -> Vec<IntentionMeta> {
        self.intentions.clone()
    }

    fn is_enabled(&self, intention: &IntentionMeta) -> bool {
        self.enabled
            .get(intention)
            .copied()
            .unwrap_or(self.default_enabled)
    }

    fn set_enabled(&mut self, intention: &IntentionMeta, enabled: bool) {
        if let Some(flag) = self.enabled.get_mut(intention) {
            *flag = enabled;
        } else {
            self.insert(intention.clone(), enabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_category_then_family() {
        let items = vec![
            IntentionMeta::new(["Rust", "Style"], "b"),
            IntentionMeta::new(["Rust"], "z"),
            IntentionMeta::new(["Rust", "Style"], "a"),
            IntentionMeta::new(["Go"], "x"),
        ];

        let sorted = copy_and_sort(&items);
        let names: Vec<_> = sorted.iter().map(|m| m.family.as_str()).collect();

        assert_eq!(names, vec!["x", "z", "a", "b"]);
        // Input is left untouched.
        assert_eq!(items[0].family, "b");
    }

    #[test]
    fn memory_settings_falls_back_to_default() {
        let known = IntentionMeta::new(["A"], "known");
        let unknown = IntentionMeta::new(["A"], "unknown");
        let settings = MemorySettings::new()
            .default_enabled(true)
            .with(known.clone(), false);

        assert!(!settings.is_enabled(&known));
        assert!(settings.is_enabled(&unknown));
        assert_eq!(settings.len(), 1);
    }

    #[test]
    fn set_enabled_registers_unknown_intention_once() {
        let mut settings = MemorySettings::new();
        let meta = IntentionMeta::new(["A"], "a");

        settings.set_enabled(&meta, true);
        settings.set_enabled(&meta, false);

        assert_eq!(settings.intentions(), vec![meta.clone()]);
        assert!(!settings.is_enabled(&meta));
    }
}
