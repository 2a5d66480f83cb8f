//! Domain switching along the time axis.
//!
//! Every time-domain gather in the engine uses the *centered* layout: for a
//! trace of `n` samples, index `n / 2` is zero time. Spectra are the
//! unnormalised forward DFT of the *uncentered* trace (zero time at index 0),
//! so a multiplication of two spectra is a circular convolution aligned on
//! zero lag. [`center`] and [`uncenter`] are the only place this convention
//! lives; [`SpectralTransform::forward`] and [`SpectralTransform::inverse`]
//! apply them around every FFT.
//!
//! ```text
//!   forward:  centered trace ──uncenter──▶ FFT ──▶ spectrum
//!   inverse:  spectrum ──IFFT / n──▶ real part ──center──▶ centered trace
//! ```

use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::gather::{Cube, SpectralGather, TimeGather};

/// Move zero time from index 0 to index `n / 2`.
pub fn center<T: Copy>(x: &[T]) -> Vec<T> {
    let n = x.len();
    let h = n / 2;
    (0..n).map(|j| x[(j + n - h) % n]).collect()
}

/// Move zero time from index `n / 2` back to index 0. Inverse of [`center`].
pub fn uncenter<T: Copy>(x: &[T]) -> Vec<T> {
    let n = x.len();
    let h = n / 2;
    (0..n).map(|i| x[(i + h) % n]).collect()
}

/// Reverse a centered trace about zero time: `t → -t`.
///
/// Index `n / 2` stays in place; the sample at lag `+k` swaps with the one
/// at lag `-k`, wrapping circularly. On the spectrum of a real trace this is
/// complex conjugation.
pub fn reverse_about_zero<T: Copy>(x: &[T]) -> Vec<T> {
    let n = x.len();
    let h = n / 2;
    (0..n).map(|k| x[(2 * h + n - k) % n]).collect()
}

/// Time-reverse every receiver of a centered gather.
pub fn flip(g: &TimeGather) -> TimeGather {
    let mut out = TimeGather::zeros(g.ts(), g.ns());
    for r in 0..g.ns() {
        out.set_trace(r, &reverse_about_zero(&g.trace(r)));
    }
    out
}

/// Planned forward/inverse FFT pair for one trace length.
///
/// Planned once per run and reused for every gather of that length.
pub struct SpectralTransform {
    len: usize,
    fwd: Arc<dyn Fft<f64>>,
    inv: Arc<dyn Fft<f64>>,
}

impl SpectralTransform {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fwd = planner.plan_fft_forward(len);
        let inv = planner.plan_fft_inverse(len);
        Self { len, fwd, inv }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forward transform of a single centered trace.
    pub fn forward_trace(&self, trace: &[f64]) -> Vec<Complex64> {
        debug_assert_eq!(trace.len(), self.len);
        let mut buf: Vec<Complex64> = uncenter(trace)
            .into_iter()
            .map(|v| Complex64::new(v, 0.0))
            .collect();
        self.fwd.process(&mut buf);
        buf
    }

    /// Inverse transform of a single spectrum to a centered real trace.
    pub fn inverse_trace(&self, spectrum: &[Complex64]) -> Vec<f64> {
        debug_assert_eq!(spectrum.len(), self.len);
        let mut buf = spectrum.to_vec();
        self.inv.process(&mut buf);
        let inv_n = 1.0 / self.len as f64;
        let real: Vec<f64> = buf.iter().map(|c| c.re * inv_n).collect();
        center(&real)
    }

    /// Forward transform of every receiver of a centered gather.
    pub fn forward(&self, g: &TimeGather) -> SpectralGather {
        let mut out = SpectralGather::zeros(g.ts(), g.ns());
        for r in 0..g.ns() {
            out.set_trace(r, &self.forward_trace(&g.trace(r)));
        }
        out
    }

    /// Inverse transform of every receiver, real part, centered.
    pub fn inverse(&self, g: &SpectralGather) -> TimeGather {
        let mut out = TimeGather::zeros(g.ts(), g.ns());
        for r in 0..g.ns() {
            out.set_trace(r, &self.inverse_trace(&g.trace(r)));
        }
        out
    }

    /// Forward transform of a causally recorded cube (zero time at index 0,
    /// so no uncentering), multiplying every bin by `scale`.
    pub fn forward_causal_cube(&self, cube: &Cube<f64>, scale: f64) -> Cube<Complex64> {
        let ns = cube.ns();
        let mut out = Cube::<Complex64>::zeros(cube.ts(), ns);
        let mut buf = vec![Complex64::new(0.0, 0.0); self.len];
        for r in 0..ns {
            for s in 0..ns {
                for (b, v) in buf.iter_mut().zip(cube.trace(r, s)) {
                    *b = Complex64::new(v, 0.0);
                }
                self.fwd.process(&mut buf);
                for b in buf.iter_mut() {
                    *b *= scale;
                }
                out.set_trace(r, s, &buf);
            }
        }
        out
    }
}
