//! Multidimensional convolution with the reflection response.
//!
//! In the frequency domain the convolution over source positions is a
//! matrix-vector product per frequency bin:
//!
//! ```text
//!   B[f, r] = Σ_s  A[f, s] · R[f, r, s] · tap[s]
//! ```

use num_complex::Complex64;

use crate::gather::{Cube, SpectralGather};
use crate::transform::SpectralTransform;

/// Frequency-domain reflection response, scaled and ready for convolution.
#[derive(Debug, Clone)]
pub struct Reflectivity {
    spectrum: Cube<Complex64>,
}

impl Reflectivity {
    /// Amplitude factor applied to every bin: `-2·dt·dx·scaling`.
    pub fn scale_factor(dt: f64, dx: f64, scaling: f64) -> f64 {
        -2.0 * dt * dx * scaling
    }

    /// Transform a causally recorded `ts × ns × ns` response.
    pub fn from_time(
        cube: &Cube<f64>,
        transform: &SpectralTransform,
        dt: f64,
        dx: f64,
        scaling: f64,
    ) -> Self {
        let scale = Self::scale_factor(dt, dx, scaling);
        Self {
            spectrum: transform.forward_causal_cube(cube, scale),
        }
    }

    /// Use an already transformed and scaled response as is.
    pub fn from_spectrum(spectrum: Cube<Complex64>) -> Self {
        Self { spectrum }
    }

    pub fn spectrum(&self) -> &Cube<Complex64> {
        &self.spectrum
    }

    pub fn ts(&self) -> usize {
        self.spectrum.ts()
    }

    pub fn ns(&self) -> usize {
        self.spectrum.ns()
    }

    /// Convolve one spectrum per source with the response, summing over
    /// sources in ascending order.
    pub fn convolve(&self, operand: &SpectralGather, taper: &[f64]) -> SpectralGather {
        let ts = self.ts();
        let ns = self.ns();
        debug_assert_eq!(operand.shape(), (ts, ns));
        debug_assert_eq!(taper.len(), ns);

        let mut out = SpectralGather::zeros(ts, ns);
        let mut weighted = vec![Complex64::new(0.0, 0.0); ns];
        for f in 0..ts {
            for (w, (&a, &tap)) in weighted.iter_mut().zip(operand.row(f).iter().zip(taper)) {
                *w = a * tap;
            }
            for r in 0..ns {
                let acc = self
                    .spectrum
                    .row(f, r)
                    .iter()
                    .zip(weighted.iter())
                    .fold(Complex64::new(0.0, 0.0), |acc, (&refl, &w)| acc + refl * w);
                out.set(f, r, acc);
            }
        }
        out
    }
}
