//! Focusing functions: order-zero estimate and the fixed-point iteration.
//!
//! With `Θ` the time window, `*` the tapered convolution with the
//! reflectivity and `flip` time reversal about zero lag:
//!
//! ```text
//!   f0+ = flip(T_d)
//!   f0- = Θ (R * f0+)
//!
//!   repeat nitr times:
//!     mk+ = flip(Θ (R * flip(fk-)))
//!     fk- = f0- + Θ (R * mk+)
//!
//!   fk+ = f0+ + mk+
//! ```
//!
//! `fk+` is formed from the last `mk+`, which was computed from the
//! previous `fk-`. It therefore trails `fk-` by half an iteration. This is
//! how the published recursion terminates and is kept as is.

use crate::gather::{DualGather, SpectralGather, TimeGather};
use crate::kernel::Kernel;
use crate::transform::flip;
use crate::window::MaskSide;

/// Order-zero focusing functions.
#[derive(Debug, Clone)]
pub struct InitialEstimate {
    pub f0_plus: DualGather,
    pub f0_minus: DualGather,
}

impl InitialEstimate {
    /// Seed `f0+` from the time-reversed direct arrival and derive `f0-`
    /// from one convolution and window pass.
    pub fn new(kernel: &Kernel, direct_arrival: &TimeGather) -> Self {
        let f0_plus_time = flip(direct_arrival);
        let f0_plus = DualGather {
            spectrum: kernel.forward(&f0_plus_time),
            time: f0_plus_time,
        };

        let coda = kernel.convolve(&f0_plus.spectrum);
        let f0_minus = kernel
            .window
            .apply(&kernel.transform, &coda, MaskSide::Inside, false);

        log::debug!(
            "Initial estimate: |f0+| = {:.6e}, |f0-| = {:.6e}",
            f0_plus.time.l2_norm(),
            f0_minus.time.l2_norm()
        );
        Self { f0_plus, f0_minus }
    }
}

/// Solver state after a number of iterations. Each step builds a new state
/// from the previous one; nothing is shared between them.
#[derive(Debug, Clone)]
pub struct SolverState {
    pub iteration: usize,
    /// Upgoing focusing function, both domains
    pub fk_minus: DualGather,
    /// Spectrum of the time-reversed upgoing focusing function
    pub fk_minus_reversed: SpectralGather,
    /// Last downgoing correction (zero before the first iteration)
    pub mk_plus: DualGather,
}

impl SolverState {
    /// State before any iteration: `fk- = f0-`, `mk+ = 0`.
    pub fn initial(kernel: &Kernel, f0: &InitialEstimate) -> Self {
        let (ts, ns) = f0.f0_minus.time.shape();
        Self {
            iteration: 0,
            fk_minus: f0.f0_minus.clone(),
            fk_minus_reversed: kernel.forward(&flip(&f0.f0_minus.time)),
            mk_plus: DualGather {
                time: TimeGather::zeros(ts, ns),
                spectrum: SpectralGather::zeros(ts, ns),
            },
        }
    }

    /// One transition of the recursion.
    pub fn step(&self, kernel: &Kernel, f0: &InitialEstimate) -> Self {
        let window = &kernel.window;

        let mk_plus_raw = kernel.convolve(&self.fk_minus_reversed);
        let mk_plus = window.apply(&kernel.transform, &mk_plus_raw, MaskSide::Inside, true);

        let fk_minus_raw = kernel.convolve(&mk_plus.spectrum);
        let update = window.window_spectrum(&kernel.transform, &fk_minus_raw, MaskSide::Inside);
        let fk_minus_time = f0.f0_minus.time.add(&update);

        let fk_minus_reversed = kernel.forward(&flip(&fk_minus_time));
        let fk_minus = DualGather {
            spectrum: kernel.forward(&fk_minus_time),
            time: fk_minus_time,
        };

        Self {
            iteration: self.iteration + 1,
            fk_minus,
            fk_minus_reversed,
            mk_plus,
        }
    }

    /// L2 norm of the change in `fk-` relative to an earlier state.
    pub fn update_norm(&self, previous: &SolverState) -> f64 {
        self.fk_minus.time.sub(&previous.fk_minus.time).l2_norm()
    }
}

/// Converged focusing functions and what Green's function retrieval needs.
#[derive(Debug, Clone)]
pub struct FocusingFunctions {
    pub f0_plus: DualGather,
    pub f0_minus: DualGather,
    pub fk_plus: DualGather,
    pub fk_minus: DualGather,
    pub fk_minus_reversed: SpectralGather,
    pub iterations: usize,
}

/// Runs the recursion for a fixed number of iterations. There is no
/// convergence test; `iterations` is chosen by the caller.
#[derive(Debug, Clone, Copy)]
pub struct FocusingSolver {
    pub iterations: usize,
}

impl FocusingSolver {
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    pub fn solve(&self, kernel: &Kernel, f0: InitialEstimate) -> FocusingFunctions {
        let mut state = SolverState::initial(kernel, &f0);
        for _ in 0..self.iterations {
            let next = state.step(kernel, &f0);
            log::debug!(
                "Iteration {}/{}: |Δfk-| = {:.6e}",
                next.iteration,
                self.iterations,
                next.update_norm(&state)
            );
            state = next;
        }

        let fk_plus = DualGather {
            time: f0.f0_plus.time.add(&state.mk_plus.time),
            spectrum: f0.f0_plus.spectrum.add(&state.mk_plus.spectrum),
        };

        FocusingFunctions {
            f0_plus: f0.f0_plus,
            f0_minus: f0.f0_minus,
            fk_plus,
            fk_minus: state.fk_minus,
            fk_minus_reversed: state.fk_minus_reversed,
            iterations: state.iteration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convolution::Reflectivity;
    use crate::gather::Cube;
    use crate::transform::SpectralTransform;
    use crate::window::TimeWindow;

    const TS: usize = 64;
    const NS: usize = 4;
    const TD: usize = 10;

    fn window() -> TimeGather {
        let h = TS / 2;
        TimeGather::from_fn(TS, NS, |t, _| if t.abs_diff(h) < TD - 1 { 1.0 } else { 0.0 })
    }

    fn direct_arrival() -> TimeGather {
        TimeGather::from_fn(TS, NS, |t, _| if t == TS / 2 + TD { 1.0 } else { 0.0 })
    }

    /// Two spikes per trace, weak enough for the recursion to contract.
    fn kernel(amplitude: f64) -> Kernel {
        let transform = SpectralTransform::new(TS);
        let cube = Cube::from_fn(TS, NS, |t, r, s| {
            let d = 6 + r.abs_diff(s);
            if t == d {
                amplitude
            } else if t == 2 * d {
                -0.5 * amplitude
            } else {
                0.0
            }
        });
        let reflectivity = Reflectivity::from_time(&cube, &transform, 0.002, 16.0, 1.0);
        Kernel::new(transform, reflectivity, vec![1.0; NS], TimeWindow::new(window()))
    }

    #[test]
    fn test_f0_plus_is_reversed_direct_arrival() {
        let k = kernel(1.0);
        let f0 = InitialEstimate::new(&k, &direct_arrival());
        assert_eq!(f0.f0_plus.time.get(TS / 2 - TD, 0), 1.0);
        assert!(k.inverse(&f0.f0_plus.spectrum).max_abs_diff(&f0.f0_plus.time) < 1e-12);
    }

    #[test]
    fn test_f0_minus_is_windowed() {
        let k = kernel(1.0);
        let f0 = InitialEstimate::new(&k, &direct_arrival());
        let outside = k.window.apply_time(&f0.f0_minus.time, MaskSide::Outside);
        assert!(outside.peak_abs() < 1e-12);
        assert!(f0.f0_minus.time.peak_abs() > 1e-3);
    }

    #[test]
    fn test_zero_iterations_keep_initial_estimate() {
        let k = kernel(1.0);
        let f0 = InitialEstimate::new(&k, &direct_arrival());
        let out = FocusingSolver::new(0).solve(&k, f0.clone());
        assert_eq!(out.iterations, 0);
        assert_eq!(out.fk_plus.time, f0.f0_plus.time);
        assert_eq!(out.fk_minus.time, f0.f0_minus.time);
    }

    #[test]
    fn test_fk_plus_uses_last_correction() {
        let k = kernel(1.0);
        let f0 = InitialEstimate::new(&k, &direct_arrival());
        let s0 = SolverState::initial(&k, &f0);
        let s1 = s0.step(&k, &f0);
        let s2 = s1.step(&k, &f0);
        let out = FocusingSolver::new(2).solve(&k, f0.clone());
        let expected = f0.f0_plus.time.add(&s2.mk_plus.time);
        assert!(out.fk_plus.time.max_abs_diff(&expected) < 1e-15);
        assert!(out.fk_minus.time.max_abs_diff(&s2.fk_minus.time) < 1e-15);
    }

    #[test]
    fn test_update_norm_does_not_grow() {
        let k = kernel(1.0);
        let f0 = InitialEstimate::new(&k, &direct_arrival());
        let mut state = SolverState::initial(&k, &f0);
        let mut norms = Vec::new();
        for _ in 0..6 {
            let next = state.step(&k, &f0);
            norms.push(next.update_norm(&state));
            state = next;
        }
        for pair in norms.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-12, "update norms {:?}", norms);
        }
    }
}
