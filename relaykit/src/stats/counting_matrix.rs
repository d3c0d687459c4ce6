use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// Sparse `(k1, k2) → count` matrix with running totals per `k1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountingMatrix<K1: Eq + Hash, K2: Eq + Hash> {
    cells: HashMap<K1, HashMap<K2, i64>>,
    totals: HashMap<K1, i64>,
}

impl<K1: Eq + Hash, K2: Eq + Hash> Default for CountingMatrix<K1, K2> {
    fn default() -> Self {
        Self {
            cells: HashMap::new(),
            totals: HashMap::new(),
        }
    }
}

impl<K1: Eq + Hash + Clone, K2: Eq + Hash> CountingMatrix<K1, K2> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every first-dimension key seen so far.
    pub fn keys(&self) -> HashSet<&K1> {
        self.cells.keys().collect()
    }

    /// Second-dimension keys seen with `k1`, or `None` if `k1` was never
    /// incremented.
    pub fn keys_of(&self, k1: &K1) -> Option<HashSet<&K2>> {
        self.cells.get(k1).map(|row| row.keys().collect())
    }

    pub fn count(&self, k1: &K1, k2: &K2) -> i64 {
        self.cells
            .get(k1)
            .and_then(|row| row.get(k2))
            .copied()
            .unwrap_or(0)
    }

    pub fn increment(&mut self, k1: K1, k2: K2, amount: i64) {
        let cell = self
            .cells
            .entry(k1.clone())
            .or_default()
            .entry(k2)
            .or_insert(0);
        *cell = cell.wrapping_add(amount);
        let total = self.totals.entry(k1).or_insert(0);
        *total = total.wrapping_add(amount);
    }

    /// Sum of all counts in the `k1` row.
    pub fn total_count(&self, k1: &K1) -> i64 {
        self.totals.get(k1).copied().unwrap_or(0)
    }
}

impl<K1, K2> fmt::Display for CountingMatrix<K1, K2>
where
    K1: Eq + Hash + fmt::Display,
    K2: Eq + Hash + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{sparseMatrix={")?;
        for (i, (k1, row)) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}=", k1)?;
            super::write_map(f, row)?;
        }
        f.write_str("}, totalCounts=")?;
        super::write_map(f, &self.totals)?;
        f.write_str("}")
    }
}
