//! Time-domain truncation window and its complement.

use crate::gather::{DualGather, SpectralGather, TimeGather};
use crate::transform::{flip, SpectralTransform};

/// Which side of the window to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskSide {
    /// `Θ`: samples before the direct arrival (the coda being solved for)
    Inside,
    /// `1 - Θ`: the mute applied to the final Green's functions
    Outside,
}

/// The window `Θ` together with its precomputed complement.
#[derive(Debug, Clone)]
pub struct TimeWindow {
    theta: TimeGather,
    complement: TimeGather,
}

impl TimeWindow {
    pub fn new(theta: TimeGather) -> Self {
        let out_of_range = theta
            .as_slice()
            .iter()
            .filter(|&&v| !(0.0..=1.0).contains(&v))
            .count();
        if out_of_range > 0 {
            log::warn!(
                "Time window has {} samples outside [0, 1]; applying as given",
                out_of_range
            );
        }
        let complement = theta.complement();
        Self { theta, complement }
    }

    pub fn theta(&self) -> &TimeGather {
        &self.theta
    }

    pub fn mask(&self, side: MaskSide) -> &TimeGather {
        match side {
            MaskSide::Inside => &self.theta,
            MaskSide::Outside => &self.complement,
        }
    }

    /// Multiply a centered time-domain gather by the chosen mask.
    pub fn apply_time(&self, g: &TimeGather, side: MaskSide) -> TimeGather {
        g.mul(self.mask(side))
    }

    /// Inverse-transform a spectrum and mask it, staying in the time domain.
    pub fn window_spectrum(
        &self,
        transform: &SpectralTransform,
        spectrum: &SpectralGather,
        side: MaskSide,
    ) -> TimeGather {
        self.apply_time(&transform.inverse(spectrum), side)
    }

    /// Full window operator: inverse transform, mask, optionally reverse in
    /// time, forward transform. Both representations of the result are
    /// returned.
    pub fn apply(
        &self,
        transform: &SpectralTransform,
        spectrum: &SpectralGather,
        side: MaskSide,
        reverse: bool,
    ) -> DualGather {
        let masked = self.window_spectrum(transform, spectrum, side);
        let time = if reverse { flip(&masked) } else { masked };
        let spectrum = transform.forward(&time);
        DualGather { time, spectrum }
    }
}
