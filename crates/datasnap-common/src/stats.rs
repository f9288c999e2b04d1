//! Descriptive statistics over numeric slices.
//!
//! All functions return `None` for inputs too small to define the statistic.

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median (average of the two middle values for even lengths).
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Quantile with linear interpolation between closest ranks.
///
/// `q` is clamped to `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Moment-based skewness. Zero when the values have no spread.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let sd = std_dev(values)?;
    if sd == 0.0 {
        return Some(0.0);
    }
    let n = values.len() as f64;
    Some(values.iter().map(|v| ((v - m) / sd).powi(3)).sum::<f64>() / n)
}

/// Excess kurtosis (normal distribution = 0). Zero when there is no spread.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let sd = std_dev(values)?;
    if sd == 0.0 {
        return Some(0.0);
    }
    let n = values.len() as f64;
    Some(values.iter().map(|v| ((v - m) / sd).powi(4)).sum::<f64>() / n - 3.0)
}

/// Pearson correlation coefficient of two equally long series.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

/// Values outside `[q1 - k*IQR, q3 + k*IQR]`, with the bounds used.
#[derive(Debug, Clone, PartialEq)]
pub struct IqrOutliers {
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Indexes into the input slice.
    pub indexes: Vec<usize>,
}

/// Detect outliers with the interquartile-range rule.
pub fn iqr_outliers(values: &[f64], threshold: f64) -> Option<IqrOutliers> {
    let q1 = quantile(values, 0.25)?;
    let q3 = quantile(values, 0.75)?;
    let iqr = q3 - q1;
    let lower_bound = q1 - threshold * iqr;
    let upper_bound = q3 + threshold * iqr;
    let indexes = values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v < lower_bound || **v > upper_bound)
        .map(|(idx, _)| idx)
        .collect();
    Some(IqrOutliers {
        lower_bound,
        upper_bound,
        indexes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_median() {
        assert_eq!(mean(&[]), None);
        assert!(approx(mean(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5));
        assert!(approx(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5));
        assert!(approx(median(&[5.0, 1.0, 3.0]).unwrap(), 3.0));
    }

    #[test]
    fn test_std_dev_population_vs_sample() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(std_dev(&values).unwrap(), 2.0));
        assert!(sample_std_dev(&values).unwrap() > 2.0);
        assert_eq!(sample_std_dev(&[1.0]), None);
    }

    #[test]
    fn test_quantiles_interpolate() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(approx(quantile(&values, 0.25).unwrap(), 2.0));
        assert!(approx(quantile(&values, 0.75).unwrap(), 4.0));
        assert!(approx(quantile(&[1.0, 2.0], 0.5).unwrap(), 1.5));
    }

    #[test]
    fn test_skewness_sign() {
        assert!(skewness(&[1.0, 1.0, 1.0, 2.0, 10.0]).unwrap() > 0.5);
        assert!(skewness(&[-10.0, -2.0, -1.0, -1.0, -1.0]).unwrap() < -0.5);
        assert_eq!(skewness(&[3.0, 3.0]), Some(0.0));
    }

    #[test]
    fn test_pearson() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!(approx(pearson(&xs, &ys).unwrap(), 1.0));
        assert_eq!(pearson(&xs, &[1.0, 1.0, 1.0, 1.0]), None);
    }

    #[test]
    fn test_iqr_outliers() {
        let values = [10.0, 11.0, 12.0, 11.0, 10.0, 95.0];
        let outliers = iqr_outliers(&values, 1.5).unwrap();
        assert_eq!(outliers.indexes, vec![5]);
    }
}
