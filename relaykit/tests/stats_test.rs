use relaykit::stats::{
    CountingMatrix, Distribution, DoubleStatistics, LongStatistics, Statistics, TopNTable,
};

#[test]
fn test_merging_equals_adding_every_point() {
    let points: Vec<i64> = (1..=20).map(|i| i * 3 - 17).collect();

    let mut all = LongStatistics::new();
    for &point in &points {
        all.add(point);
    }

    let (left, right) = points.split_at(7);
    let mut merged = LongStatistics::new();
    let mut other = LongStatistics::new();
    for &point in left {
        merged.add(point);
    }
    for &point in right {
        other.add(point);
    }
    merged.add_all(&other);

    assert_eq!(merged, all);
    assert_eq!(merged.min(), -14);
    assert_eq!(merged.max(), 43);
}

#[test]
fn test_double_statistics_measures() {
    let mut stats = DoubleStatistics::new();
    for value in [1.0, 2.0, 3.0, 4.0] {
        stats.add(value);
    }

    assert_eq!(stats.accumulator(), 10.0);
    assert_eq!(stats.squared_accumulator(), 30.0);
    assert_eq!(stats.mean(4), 2.5);
    assert!((stats.variance(4) - 1.25).abs() < 1e-12);
    assert!((stats.std_deviation(4) - 1.25f64.sqrt()).abs() < 1e-12);

    let mut empty = DoubleStatistics::new();
    empty.add_all(&stats);
    assert_eq!(empty, stats);
}

#[test]
fn test_distribution_merge() {
    let mut english = Distribution::new();
    english.increment("the".to_string(), 5).increment("rust".to_string(), 2);

    let mut more = Distribution::new();
    more.increment("rust".to_string(), 3).increment("cargo".to_string(), 1);

    english.add_all(&more);
    assert_eq!(english.count(&"rust".to_string()), 5);
    assert_eq!(english.count(&"cargo".to_string()), 1);
    assert_eq!(english.total_count(), 11);
    assert_eq!(english.counts().len(), 3);
}

#[test]
fn test_counting_matrix_sparse_rows() {
    let mut matrix: CountingMatrix<u32, String> = CountingMatrix::new();
    matrix.increment(2024, "jan".to_string(), 10);
    matrix.increment(2024, "feb".to_string(), 4);
    matrix.increment(2025, "jan".to_string(), 1);

    assert_eq!(matrix.total_count(&2024), 14);
    assert_eq!(matrix.count(&2025, &"jan".to_string()), 1);
    assert_eq!(matrix.count(&2025, &"feb".to_string()), 0);
    assert!(matrix.keys().contains(&2025));
}

#[test]
fn test_top_n_never_exceeds_n() {
    let mut table = TopNTable::new(3);
    for (i, value) in [5u32, 1, 9, 7, 3, 9, 2].iter().enumerate() {
        table.update(i, *value);
        assert!(table.len() <= 3);
    }

    let top: Vec<(usize, u32)> = table
        .entries()
        .map(|entry| (*entry.key(), *entry.value()))
        .collect();
    assert_eq!(top, vec![(5, 9), (2, 9), (3, 7)]);
}

#[test]
fn test_top_n_merge() {
    let mut mine = TopNTable::new(2);
    mine.update("a", 1).update("b", 2);

    let mut theirs = TopNTable::new(2);
    theirs.update("c", 3).update("a", 4);

    mine.add_all(&theirs);
    assert_eq!(mine.to_string(), "{n=2, entries=[a=4, c=3]}");
}
