//! Green's function retrieval from converged focusing functions.
//!
//! ```text
//!   g+      =  flip(fk+) - R * flip(fk-)
//!   g-      = -fk-       + R * fk+
//!   g_total =  g+ + g-
//! ```
//!
//! The signs decide causality of the retrieved wavefield.

use crate::focusing::FocusingFunctions;
use crate::gather::TimeGather;
use crate::kernel::Kernel;
use crate::transform::flip;

#[derive(Debug, Clone)]
pub struct GreensFunctions {
    /// Downgoing
    pub g_plus: TimeGather,
    /// Upgoing
    pub g_minus: TimeGather,
    pub g_total: TimeGather,
}

impl GreensFunctions {
    /// Single convolution pass; no iteration.
    pub fn retrieve(kernel: &Kernel, focusing: &FocusingFunctions) -> Self {
        let g_plus_raw = kernel.convolve(&focusing.fk_minus_reversed);
        let g_minus_raw = kernel.convolve(&focusing.fk_plus.spectrum);

        let g_plus = flip(&focusing.fk_plus.time).sub(&kernel.inverse(&g_plus_raw));
        let g_minus = kernel.inverse(&g_minus_raw).sub(&focusing.fk_minus.time);
        let g_total = g_plus.add(&g_minus);

        Self {
            g_plus,
            g_minus,
            g_total,
        }
    }
}
