use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

pub const DEFAULT_TOP_N: usize = 10;

/// One row of a [`TopNTable`].
///
/// Ordered by value descending, then key descending, so the first entry is
/// the top one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<K, V> {
    key: K,
    value: V,
}

impl<K, V> Entry<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }
}

impl<K: Ord, V: Ord> Ord for Entry<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .value
            .cmp(&self.value)
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl<K: Ord, V: Ord> PartialOrd for Entry<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Entry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Keeps the `n` highest-valued keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopNTable<K, V> {
    n: usize,
    entries: BTreeSet<Entry<K, V>>,
}

impl<K: Ord, V: Ord> Default for TopNTable<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl<K: Ord, V: Ord> TopNTable<K, V> {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            entries: BTreeSet::new(),
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from the top down.
    pub fn entries(&self) -> impl Iterator<Item = &Entry<K, V>> {
        self.entries.iter()
    }

    pub fn entry(&self, key: &K) -> Option<&Entry<K, V>> {
        self.entries.iter().find(|entry| entry.key == *key)
    }

    /// Sets the value for `key`, then drops the lowest entries beyond `n`.
    pub fn update(&mut self, key: K, value: V) -> &mut Self {
        if let Some(existing) = self.entry(&key) {
            if existing.value == value {
                return self;
            }
            self.entries.retain(|entry| entry.key != key);
        }

        self.entries.insert(Entry { key, value });
        while self.entries.len() > self.n {
            self.entries.pop_last();
        }
        self
    }

    /// Updates this table with every entry of `other`.
    pub fn add_all(&mut self, other: &TopNTable<K, V>) -> &mut Self
    where
        K: Clone,
        V: Clone,
    {
        for entry in other.entries() {
            self.update(entry.key.clone(), entry.value.clone());
        }
        self
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for TopNTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{n={}, entries=[", self.n)?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", entry)?;
        }
        f.write_str("]}")
    }
}
