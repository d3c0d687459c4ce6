//! # Streaming Statistics
//!
//! Small single-threaded containers for summarising data streams:
//!
//! - [`LongStatistics`] / [`DoubleStatistics`]: sum, sum of squares, min
//!   and max, with mean, variance and standard deviation derived on demand
//! - [`Distribution`]: occurrence counts per element
//! - [`CountingMatrix`]: sparse two-key counts with per-row totals
//! - [`TopNTable`]: the `n` highest-valued keys
//!
//! Share them between threads behind a lock.

pub mod counting_matrix;
pub mod distribution;
pub mod statistics;
pub mod topn;

use std::collections::HashMap;
use std::fmt;

pub use counting_matrix::CountingMatrix;
pub use distribution::Distribution;
pub use statistics::{DoubleStatistics, LongStatistics, Statistics};
pub use topn::{Entry, TopNTable, DEFAULT_TOP_N};

/// Writes `map` as `{k=v, k=v}`.
fn write_map<K: fmt::Display, V: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    map: &HashMap<K, V>,
) -> fmt::Result {
    f.write_str("{")?;
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}={}", key, value)?;
    }
    f.write_str("}")
}
