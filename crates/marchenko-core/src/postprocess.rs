//! Amplitude normalisation and the pre-arrival mute.

use crate::error::{MarchenkoError, Result};
use crate::gather::TimeGather;
use crate::window::{MaskSide, TimeWindow};

/// Peak absolute amplitude of `g`, rejecting a zero or non-finite peak.
pub fn peak_amplitude(g: &TimeGather, field: &'static str) -> Result<f64> {
    let peak = g.peak_abs();
    if peak == 0.0 || !peak.is_finite() || !g.is_finite() {
        return Err(MarchenkoError::DegenerateNormalization { field });
    }
    Ok(peak)
}

/// Divide every sample by `peak`.
pub fn normalize_by(g: &TimeGather, peak: f64) -> TimeGather {
    g.map(|v| v / peak)
}

/// Normalise `g` by its own peak so the largest magnitude becomes 1.
pub fn normalize(g: &TimeGather, field: &'static str) -> Result<TimeGather> {
    let peak = peak_amplitude(g, field)?;
    Ok(normalize_by(g, peak))
}

/// Suppress residual energy inside the window: multiply by `1 - Θ`.
pub fn mute(g: &TimeGather, window: &TimeWindow) -> TimeGather {
    window.apply_time(g, MaskSide::Outside)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sets_unit_peak() {
        let g = TimeGather::from_vec(2, 2, vec![0.5, -3.0, 1.5, 0.0]).unwrap();
        let n = normalize(&g, "g").unwrap();
        assert_eq!(n.peak_abs(), 1.0);
        assert_eq!(n.get(0, 1), -1.0);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let g = TimeGather::from_fn(16, 3, |t, r| ((t * 5 + r) as f64 * 0.37).sin() * 7.3);
        let once = normalize(&g, "g").unwrap();
        let twice = normalize(&once, "g").unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.peak_abs(), 1.0);
    }

    #[test]
    fn test_zero_field_is_degenerate() {
        let g = TimeGather::zeros(4, 2);
        assert_eq!(
            normalize(&g, "g_total"),
            Err(MarchenkoError::DegenerateNormalization { field: "g_total" })
        );
    }

    #[test]
    fn test_nan_field_is_degenerate() {
        let mut g = TimeGather::zeros(4, 2);
        g.set(1, 1, f64::NAN);
        g.set(2, 0, 3.0);
        assert!(normalize(&g, "fk+").is_err());
    }

    #[test]
    fn test_mute_uses_complement() {
        let theta = TimeGather::from_vec(1, 3, vec![1.0, 0.25, 0.0]).unwrap();
        let w = TimeWindow::new(theta);
        let g = TimeGather::from_vec(1, 3, vec![2.0, 4.0, 8.0]).unwrap();
        let muted = mute(&g, &w);
        assert_eq!(muted.as_slice(), &[0.0, 3.0, 8.0]);
    }
}
