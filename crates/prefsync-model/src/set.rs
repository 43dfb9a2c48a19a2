//! Preference sets
//!
//! A [`PreferenceSet`] is either the full set for a user or a partial
//! update. Both share one representation: an ordered key → bool map.
//! Channel flags are stored independently of their group's enable flag;
//! only their effect is gated (see [`PreferenceSet::is_effective`]).

use crate::catalog::{group, KeyCategory, PreferenceKey};
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mapping from preference key to value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PreferenceSet {
    values: BTreeMap<PreferenceKey, bool>,
}

impl PreferenceSet {
    /// Create an empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every catalog key set to `value`
    #[must_use]
    pub fn uniform(value: bool) -> Self {
        PreferenceKey::ALL.into_iter().map(|k| (k, value)).collect()
    }

    /// Builder-style insert
    #[inline]
    #[must_use]
    pub fn with(mut self, key: PreferenceKey, value: bool) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Stored value, if present
    #[inline]
    #[must_use]
    pub fn get(&self, key: PreferenceKey) -> Option<bool> {
        self.values.get(&key).copied()
    }

    /// Insert or overwrite a value, returning the previous one
    #[inline]
    pub fn set(&mut self, key: PreferenceKey, value: bool) -> Option<bool> {
        self.values.insert(key, value)
    }

    /// Key-wise override: every entry of `partial` replaces ours
    pub fn merge(&mut self, partial: &PreferenceSet) {
        for (key, value) in &partial.values {
            self.values.insert(*key, *value);
        }
    }

    /// Whether a flag currently has an operative effect
    ///
    /// Enable flags are operative when true. Channel flags are operative
    /// when true and their group's enable flag is true.
    #[must_use]
    pub fn is_effective(&self, key: PreferenceKey) -> bool {
        let own = self.get(key).unwrap_or(false);
        match key.category() {
            KeyCategory::Enable(_) => own,
            KeyCategory::Channel(g, _) => own && self.get(group(g).enable_key).unwrap_or(false),
        }
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys present
    pub fn keys(&self) -> impl Iterator<Item = PreferenceKey> + '_ {
        self.values.keys().copied()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (PreferenceKey, bool)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<(PreferenceKey, bool)> for PreferenceSet {
    fn from_iter<I: IntoIterator<Item = (PreferenceKey, bool)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for PreferenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}

// Backends may return fields this build does not know about; skip them
// instead of failing the whole fetch.
impl<'de> Deserialize<'de> for PreferenceSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = PreferenceSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of preference keys to booleans")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut set = PreferenceSet::new();
                while let Some(name) = map.next_key::<String>()? {
                    match name.parse::<PreferenceKey>() {
                        Ok(key) => {
                            let value: bool = map.next_value()?;
                            set.set(key, value);
                        }
                        Err(_) => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(SetVisitor)
    }
}

/// Edits not yet confirmed by the remote service
///
/// Last write for a key wins within the buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingMutation {
    edits: PreferenceSet,
}

impl PendingMutation {
    /// Create an empty buffer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a partial edit
    #[inline]
    pub fn merge(&mut self, partial: &PreferenceSet) {
        self.edits.merge(partial);
    }

    /// Snapshot and clear
    #[inline]
    pub fn take(&mut self) -> PreferenceSet {
        std::mem::take(&mut self.edits)
    }

    /// Drop everything buffered
    #[inline]
    pub fn clear(&mut self) {
        self.edits = PreferenceSet::new();
    }

    /// Buffered edits
    #[inline]
    #[must_use]
    pub fn edits(&self) -> &PreferenceSet {
        &self.edits
    }

    /// Whether nothing is buffered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}
