/// Comparison of the retrieved Green's function against a reference
///
/// Both fields are expected to be normalised and muted the same way, so the
/// metrics are amplitude-aware.

use marchenko_core::TimeGather;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// ‖g - truth‖ / ‖truth‖, undefined for an all-zero reference
    pub nrms_misfit: Option<f64>,
    /// Zero-lag correlation coefficient over all samples
    pub correlation: f64,
    /// Largest absolute sample difference
    pub max_abs_error: f64,
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.nrms_misfit {
            Some(m) => write!(f, "NRMS misfit {:.4}", m)?,
            None => write!(f, "NRMS misfit n/a (zero reference)")?,
        }
        write!(
            f,
            ", correlation {:.4}, max error {:.4e}",
            self.correlation, self.max_abs_error
        )
    }
}

/// Compare two gathers of equal shape. A zero reference leaves the misfit
/// undefined; a zero field on either side gives zero correlation.
pub fn compare(retrieved: &TimeGather, truth: &TimeGather) -> Comparison {
    let diff = retrieved.sub(truth);
    let truth_norm = truth.l2_norm();
    let nrms_misfit = (truth_norm > 0.0).then(|| diff.l2_norm() / truth_norm);

    let denom = retrieved.l2_norm() * truth_norm;
    let correlation = if denom > 0.0 {
        retrieved
            .as_slice()
            .iter()
            .zip(truth.as_slice())
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / denom
    } else {
        0.0
    };

    Comparison {
        nrms_misfit,
        correlation,
        max_abs_error: diff.peak_abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_fields() {
        let g = TimeGather::from_fn(16, 2, |t, r| (t as f64 * 0.4 + r as f64).cos());
        let c = compare(&g, &g);
        assert_eq!(c.nrms_misfit, Some(0.0));
        assert!((c.correlation - 1.0).abs() < 1e-12);
        assert_eq!(c.max_abs_error, 0.0);
    }

    #[test]
    fn test_polarity_flip() {
        let g = TimeGather::from_fn(16, 2, |t, _| if t == 4 { 1.0 } else { 0.0 });
        let c = compare(&g.map(|v| -v), &g);
        assert!((c.correlation + 1.0).abs() < 1e-12);
        assert!((c.nrms_misfit.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_reference() {
        let g = TimeGather::from_fn(4, 1, |t, _| t as f64);
        let c = compare(&g, &TimeGather::zeros(4, 1));
        assert_eq!(c.nrms_misfit, None);
        assert_eq!(c.correlation, 0.0);
        assert!(c.to_string().contains("n/a"));

        let json = serde_json::to_string(&c).unwrap();
        let back: Comparison = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
