use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Occurrence counts per element, plus the overall total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution<E: Eq + Hash> {
    counts: HashMap<E, i64>,
    total_count: i64,
}

impl<E: Eq + Hash> Default for Distribution<E> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
            total_count: 0,
        }
    }
}

impl<E: Eq + Hash> Distribution<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> &HashMap<E, i64> {
        &self.counts
    }

    /// Count for `element`; zero if never seen.
    pub fn count(&self, element: &E) -> i64 {
        self.counts.get(element).copied().unwrap_or(0)
    }

    pub fn total_count(&self) -> i64 {
        self.total_count
    }

    pub fn increment(&mut self, element: E, amount: i64) -> &mut Self {
        let count = self.counts.entry(element).or_insert(0);
        *count = count.wrapping_add(amount);
        self.total_count = self.total_count.wrapping_add(amount);
        self
    }

    pub fn add_all(&mut self, other: &Distribution<E>) -> &mut Self
    where
        E: Clone,
    {
        for (element, amount) in &other.counts {
            self.increment(element.clone(), *amount);
        }
        self
    }
}

impl<E: Eq + Hash + fmt::Display> fmt::Display for Distribution<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{distribution=")?;
        super::write_map(f, &self.counts)?;
        write!(f, ", totalCount={}}}", self.total_count)
    }
}
