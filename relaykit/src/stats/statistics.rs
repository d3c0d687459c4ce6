use std::fmt;

/// Running accumulator over a stream of numeric samples.
///
/// The sample count is tracked by the caller and passed to the derived
/// measures, so several accumulators can share one count.
pub trait Statistics {
    type Value: Copy;

    fn accumulator(&self) -> Self::Value;

    fn squared_accumulator(&self) -> Self::Value;

    fn min(&self) -> Self::Value;

    fn max(&self) -> Self::Value;

    /// Arithmetic mean over `n` samples.
    fn mean(&self, n: u64) -> f64;

    /// Population variance over `n` samples.
    fn variance(&self, n: u64) -> f64 {
        let mean = self.mean(n);
        self.squared_mean(n) - mean * mean
    }

    fn std_deviation(&self, n: u64) -> f64 {
        self.variance(n).sqrt()
    }

    /// Mean of the squared samples over `n` samples.
    fn squared_mean(&self, n: u64) -> f64;

    fn add(&mut self, value: Self::Value) -> &mut Self;

    /// Merges another accumulator into this one.
    fn add_all(&mut self, other: &Self) -> &mut Self;
}

/// Integer statistics. Sums wrap on overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongStatistics {
    accumulator: i64,
    squared_accumulator: i64,
    min: i64,
    max: i64,
}

impl Default for LongStatistics {
    fn default() -> Self {
        Self {
            accumulator: 0,
            squared_accumulator: 0,
            min: i64::MAX,
            max: i64::MIN,
        }
    }
}

impl LongStatistics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Statistics for LongStatistics {
    type Value = i64;

    fn accumulator(&self) -> i64 {
        self.accumulator
    }

    fn squared_accumulator(&self) -> i64 {
        self.squared_accumulator
    }

    fn min(&self) -> i64 {
        self.min
    }

    fn max(&self) -> i64 {
        self.max
    }

    fn mean(&self, n: u64) -> f64 {
        self.accumulator as f64 / n as f64
    }

    fn squared_mean(&self, n: u64) -> f64 {
        self.squared_accumulator as f64 / n as f64
    }

    fn add(&mut self, value: i64) -> &mut Self {
        self.accumulator = self.accumulator.wrapping_add(value);
        self.squared_accumulator = self
            .squared_accumulator
            .wrapping_add(value.wrapping_mul(value));
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self
    }

    fn add_all(&mut self, other: &Self) -> &mut Self {
        self.accumulator = self.accumulator.wrapping_add(other.accumulator);
        self.squared_accumulator = self
            .squared_accumulator
            .wrapping_add(other.squared_accumulator);
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self
    }
}

impl fmt::Display for LongStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{accumulator={}, squaredAccumulator={}, min={}, max={}}}",
            self.accumulator, self.squared_accumulator, self.min, self.max
        )
    }
}

/// Floating point statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleStatistics {
    accumulator: f64,
    squared_accumulator: f64,
    min: f64,
    max: f64,
}

impl Default for DoubleStatistics {
    fn default() -> Self {
        Self {
            accumulator: 0.0,
            squared_accumulator: 0.0,
            min: f64::MAX,
            max: -f64::MAX,
        }
    }
}

impl DoubleStatistics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Statistics for DoubleStatistics {
    type Value = f64;

    fn accumulator(&self) -> f64 {
        self.accumulator
    }

    fn squared_accumulator(&self) -> f64 {
        self.squared_accumulator
    }

    fn min(&self) -> f64 {
        self.min
    }

    fn max(&self) -> f64 {
        self.max
    }

    fn mean(&self, n: u64) -> f64 {
        self.accumulator / n as f64
    }

    fn squared_mean(&self, n: u64) -> f64 {
        self.squared_accumulator / n as f64
    }

    fn add(&mut self, value: f64) -> &mut Self {
        self.accumulator += value;
        self.squared_accumulator += value * value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self
    }

    fn add_all(&mut self, other: &Self) -> &mut Self {
        self.accumulator += other.accumulator;
        self.squared_accumulator += other.squared_accumulator;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self
    }
}

impl fmt::Display for DoubleStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{accumulator={:.6}, squaredAccumulator={:.6}, min={:.6}, max={:.6}}}",
            self.accumulator, self.squared_accumulator, self.min, self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_measures() {
        let mut stats = LongStatistics::new();
        for value in [2, 4, 4, 4, 5, 5, 7, 9] {
            stats.add(value);
        }

        assert_eq!(stats.accumulator(), 40);
        assert_eq!(stats.squared_accumulator(), 232);
        assert_eq!(stats.min(), 2);
        assert_eq!(stats.max(), 9);
        assert_eq!(stats.mean(8), 5.0);
        assert_eq!(stats.variance(8), 4.0);
        assert_eq!(stats.std_deviation(8), 2.0);
    }

    #[test]
    fn long_sums_wrap() {
        let mut stats = LongStatistics::new();
        stats.add(i64::MAX).add(1);
        assert_eq!(stats.accumulator(), i64::MIN);
    }

    #[test]
    fn empty_display_shows_sentinels() {
        assert_eq!(
            LongStatistics::new().to_string(),
            format!(
                "{{accumulator=0, squaredAccumulator=0, min={}, max={}}}",
                i64::MAX,
                i64::MIN
            )
        );
        let double = DoubleStatistics::new();
        assert_eq!(double.min(), f64::MAX);
        assert_eq!(double.max(), -f64::MAX);
    }

    #[test]
    fn double_display_uses_six_decimals() {
        let mut stats = DoubleStatistics::new();
        stats.add(1.5);
        assert_eq!(
            stats.to_string(),
            "{accumulator=1.500000, squaredAccumulator=2.250000, min=1.500000, max=1.500000}"
        );
    }
}
