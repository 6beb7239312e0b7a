//! Per-column mean-center/stdev-scale normalization. Fit on a training
//! matrix, applied identically to every row extracted afterward. Non-finite
//! entries are ignored when fitting and become zero after normalization.

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Normalizer {
    pub means: Vec<f64>,
    pub stdevs: Vec<f64>,
}

impl Normalizer {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut sums = vec![0.0; width];
        let mut counts = vec![0usize; width];
        for row in rows {
            for (j, &v) in row.iter().enumerate() {
                if v.is_finite() {
                    sums[j] += v;
                    counts[j] += 1;
                }
            }
        }
        let means: Vec<f64> = sums
            .iter()
            .zip(&counts)
            .map(|(&s, &n)| if n > 0 { s / n as f64 } else { 0.0 })
            .collect();

        let mut variances = vec![0.0; width];
        for row in rows {
            for (j, &v) in row.iter().enumerate() {
                if v.is_finite() {
                    let d = v - means[j];
                    variances[j] += d * d;
                }
            }
        }
        let stdevs: Vec<f64> = variances
            .iter()
            .zip(&counts)
            .map(|(&ss, &n)| {
                if n == 0 {
                    return 1.0;
                }
                let stdev = (ss / n as f64).sqrt();
                if stdev < 1e-12 {
                    1.0
                } else {
                    stdev
                }
            })
            .collect();
        Self { means, stdevs }
    }

    /// Mean-center, scale by stdev, then replace any non-finite result
    /// (including propagated-NaN inputs) with zero.
    pub fn apply(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, &v)| {
                if !v.is_finite() {
                    return 0.0;
                }
                let mean = self.means.get(j).copied().unwrap_or(0.0);
                let stdev = self.stdevs.get(j).copied().unwrap_or(1.0);
                let z = (v - mean) / stdev;
                if z.is_finite() {
                    z
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Fraction of entries in `rows` that are non-finite before normalization.
    pub fn nonfinite_fraction(rows: &[Vec<f64>]) -> f64 {
        let mut total = 0usize;
        let mut bad = 0usize;
        for row in rows {
            for &v in row {
                total += 1;
                if !v.is_finite() {
                    bad += 1;
                }
            }
        }
        if total == 0 {
            0.0
        } else {
            bad as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_and_scales() {
        let rows = vec![vec![0.0, 1.0], vec![2.0, 1.0], vec![4.0, 1.0]];
        let normalizer = Normalizer::fit(&rows);
        let applied = normalizer.apply(&rows[1]);
        assert!(applied[0].abs() < 1e-9);
        // constant column collapses stdev to 1.0, so centered value is 0
        assert!(applied[1].abs() < 1e-9);
    }

    #[test]
    fn nan_becomes_zero_after_normalization() {
        let rows = vec![vec![1.0], vec![3.0], vec![f64::NAN]];
        let normalizer = Normalizer::fit(&rows);
        let applied = normalizer.apply(&[f64::NAN]);
        assert_eq!(applied[0], 0.0);
    }
}
