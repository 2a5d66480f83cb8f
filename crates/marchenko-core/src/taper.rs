//! Channel taper applied before every spatial summation.

use std::f64::consts::PI;

use crate::error::{MarchenkoError, Result};

/// Cosine (Tukey) taper over `ns` channels.
///
/// `fraction` is the share of the aperture covered by the two cosine ramps
/// together: `0` leaves every interior channel at 1, `1` is a full Hann
/// window. The two edge channels are always 0, so the taper varies
/// continuously with `fraction` over the whole closed interval.
pub fn cosine_taper(ns: usize, fraction: f64) -> Result<Vec<f64>> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(MarchenkoError::DegenerateTaper(fraction));
    }
    if ns == 1 {
        return Ok(vec![1.0]);
    }

    let half_width = fraction / 2.0;
    let last = (ns - 1) as f64;
    let taper = (0..ns)
        .map(|i| {
            // Fold onto the left half; the taper is symmetric.
            let x = (i as f64 / last).min(1.0 - i as f64 / last);
            if i == 0 || i == ns - 1 {
                0.0
            } else if x < half_width {
                0.5 * (1.0 - (PI * x / half_width).cos())
            } else {
                1.0
            }
        })
        .collect();
    Ok(taper)
}
