//! Deterministic row sampling.

use datasnap_model::Record;

use crate::options::DEFAULT_SAMPLE_SIZE;

/// Sample size actually used for a table of `total_rows` rows.
pub fn effective_sample_size(requested: Option<usize>, total_rows: usize) -> usize {
    requested
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_SAMPLE_SIZE)
        .min(total_rows)
}

/// Evenly strided subsequence of `rows`.
///
/// When the table exceeds `sample_size`, every `floor(total / sample_size)`-th
/// row is taken starting at row 0. Repeated calls on the same table return
/// the same rows.
pub fn sample_rows(rows: &[Record], sample_size: usize) -> Vec<&Record> {
    if sample_size == 0 {
        return Vec::new();
    }
    if rows.len() <= sample_size {
        return rows.iter().collect();
    }
    let stride = rows.len() / sample_size;
    rows.iter().step_by(stride).take(sample_size).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasnap_model::Value;

    fn rows(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let mut row = Record::new();
                row.insert("i".into(), Value::Number(i as f64));
                row
            })
            .collect()
    }

    #[test]
    fn test_effective_sample_size() {
        assert_eq!(effective_sample_size(None, 50), 50);
        assert_eq!(effective_sample_size(None, 5000), 1000);
        assert_eq!(effective_sample_size(Some(10), 5000), 10);
        assert_eq!(effective_sample_size(Some(0), 20), 20);
    }

    #[test]
    fn test_small_table_is_fully_sampled() {
        let table = rows(5);
        assert_eq!(sample_rows(&table, 10).len(), 5);
    }

    #[test]
    fn test_strided_sample() {
        let table = rows(25);
        let sample = sample_rows(&table, 10);
        assert_eq!(sample.len(), 10);
        assert_eq!(sample[0]["i"], Value::Number(0.0));
        assert_eq!(sample[1]["i"], Value::Number(2.0));
        assert_eq!(sample[9]["i"], Value::Number(18.0));
    }
}
