//! The fixed operators shared by every stage of a run.

use crate::convolution::Reflectivity;
use crate::gather::{SpectralGather, TimeGather};
use crate::transform::SpectralTransform;
use crate::window::TimeWindow;

/// Reflectivity, taper, window and FFT plans for one dataset.
///
/// Built once by the engine; immutable for the lifetime of the run.
pub struct Kernel {
    pub transform: SpectralTransform,
    pub reflectivity: Reflectivity,
    pub taper: Vec<f64>,
    pub window: TimeWindow,
}

impl Kernel {
    pub fn new(
        transform: SpectralTransform,
        reflectivity: Reflectivity,
        taper: Vec<f64>,
        window: TimeWindow,
    ) -> Self {
        Self {
            transform,
            reflectivity,
            taper,
            window,
        }
    }

    pub fn ts(&self) -> usize {
        self.reflectivity.ts()
    }

    pub fn ns(&self) -> usize {
        self.reflectivity.ns()
    }

    /// Tapered multidimensional convolution with the reflectivity.
    pub fn convolve(&self, operand: &SpectralGather) -> SpectralGather {
        self.reflectivity.convolve(operand, &self.taper)
    }

    pub fn forward(&self, g: &TimeGather) -> SpectralGather {
        self.transform.forward(g)
    }

    pub fn inverse(&self, g: &SpectralGather) -> TimeGather {
        self.transform.inverse(g)
    }
}
