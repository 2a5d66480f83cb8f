//! Engine boundary: validation, the stage sequence, and the output record.

use serde::{Deserialize, Serialize};

use crate::convolution::Reflectivity;
use crate::error::{MarchenkoError, Result};
use crate::focusing::{FocusingFunctions, FocusingSolver, InitialEstimate};
use crate::gather::{Cube, TimeGather};
use crate::geometry::SurveyGeometry;
use crate::green::GreensFunctions;
use crate::kernel::Kernel;
use crate::postprocess::{mute, normalize_by, peak_amplitude};
use crate::taper::cosine_taper;
use crate::transform::SpectralTransform;
use crate::window::TimeWindow;

/// Scalar run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarchenkoParams {
    /// Number of iterations
    #[serde(default = "default_nitr")]
    pub nitr: usize,
    /// Taper fraction in [0, 1]
    #[serde(default = "default_taper")]
    pub tp: f64,
    /// Reflectivity amplitude scale
    #[serde(default = "default_scaling")]
    pub scaling: f64,
    /// Time sample interval (s)
    pub dt: f64,
    /// Receiver spacing (m)
    pub dx: f64,
    /// Offset of the first channel (m)
    #[serde(default)]
    pub o_min: f64,
}

fn default_nitr() -> usize {
    5
}

fn default_taper() -> f64 {
    0.1
}

fn default_scaling() -> f64 {
    1.0
}

impl MarchenkoParams {
    pub fn new(dt: f64, dx: f64) -> Self {
        Self {
            nitr: default_nitr(),
            tp: default_taper(),
            scaling: default_scaling(),
            dt,
            dx,
            o_min: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(MarchenkoError::InvalidParameter {
                name: "dt",
                value: self.dt,
            });
        }
        if !(self.dx.is_finite() && self.dx > 0.0) {
            return Err(MarchenkoError::InvalidParameter {
                name: "dx",
                value: self.dx,
            });
        }
        if !self.scaling.is_finite() {
            return Err(MarchenkoError::InvalidParameter {
                name: "scaling",
                value: self.scaling,
            });
        }
        if !self.o_min.is_finite() {
            return Err(MarchenkoError::InvalidParameter {
                name: "o_min",
                value: self.o_min,
            });
        }
        if !(0.0..=1.0).contains(&self.tp) {
            return Err(MarchenkoError::DegenerateTaper(self.tp));
        }
        Ok(())
    }
}

/// The three precomputed inputs plus optional ground truth.
#[derive(Debug, Clone)]
pub struct MarchenkoInputs {
    /// Causal reflection response, `ts × ns × ns`
    pub reflectivity: Cube<f64>,
    /// Direct arrival, centered, `ts × ns`
    pub direct_arrival: TimeGather,
    /// Window `Θ`, centered, `ts × ns`
    pub window: TimeGather,
    /// Reference Green's function, centered, `ts × ns`
    pub ground_truth: Option<TimeGather>,
}

impl MarchenkoInputs {
    /// Check that every field shares `ts` and `ns` with the reflectivity.
    pub fn validate(&self) -> Result<()> {
        let ts = self.reflectivity.ts();
        let ns = self.reflectivity.ns();
        if ts == 0 || ns == 0 {
            return Err(MarchenkoError::ShapeMismatch {
                field: "reflectivity",
                expected: "non-empty time and channel axes".to_string(),
                found: self.reflectivity.describe_shape(),
            });
        }

        let mut fields = vec![
            ("direct arrival", &self.direct_arrival),
            ("time window", &self.window),
        ];
        if let Some(truth) = &self.ground_truth {
            fields.push(("ground truth", truth));
        }
        for (field, g) in fields {
            if g.shape() != (ts, ns) {
                return Err(MarchenkoError::ShapeMismatch {
                    field,
                    expected: format!("{}x{}", ts, ns),
                    found: g.describe_shape(),
                });
            }
        }
        Ok(())
    }

    pub fn geometry(&self, params: &MarchenkoParams) -> SurveyGeometry {
        SurveyGeometry::new(
            self.reflectivity.ts(),
            self.reflectivity.ns(),
            params.dt,
            params.dx,
            params.o_min,
        )
    }
}

/// Normalised time-domain results of one run.
#[derive(Debug, Clone)]
pub struct MarchenkoOutputs {
    pub f0_plus: TimeGather,
    pub f0_minus: TimeGather,
    pub fk_plus: TimeGather,
    pub fk_minus: TimeGather,
    pub g_plus: TimeGather,
    pub g_minus: TimeGather,
    pub g_total: TimeGather,
    /// Ground truth, normalised and muted like `g_total`
    pub ground_truth: Option<TimeGather>,
    /// Channel offsets (m)
    pub offsets: Vec<f64>,
    /// Half the recording duration (s)
    pub max_t: f64,
    /// Peak of `g_total` before normalisation
    pub g_peak: f64,
    /// Peak of `fk+` before normalisation
    pub f_peak: f64,
}

/// Holds the kernel for one dataset and runs the stages in order.
pub struct MarchenkoEngine {
    kernel: Kernel,
    geometry: SurveyGeometry,
    params: MarchenkoParams,
}

impl MarchenkoEngine {
    /// Validate inputs and parameters, then transform the reflectivity and
    /// build the taper. Nothing is computed if validation fails.
    pub fn new(inputs: &MarchenkoInputs, params: &MarchenkoParams) -> Result<Self> {
        params.validate()?;
        inputs.validate()?;

        let geometry = inputs.geometry(params);
        let taper = cosine_taper(geometry.ns, params.tp)?;
        let transform = SpectralTransform::new(geometry.ts);
        let reflectivity = Reflectivity::from_time(
            &inputs.reflectivity,
            &transform,
            params.dt,
            params.dx,
            params.scaling,
        );
        let window = TimeWindow::new(inputs.window.clone());

        log::info!(
            "Marchenko engine: ts={}, ns={}, dt={}, dx={}, taper={}, scale={:.4e}",
            geometry.ts,
            geometry.ns,
            params.dt,
            params.dx,
            params.tp,
            Reflectivity::scale_factor(params.dt, params.dx, params.scaling)
        );

        Ok(Self {
            kernel: Kernel::new(transform, reflectivity, taper, window),
            geometry,
            params: *params,
        })
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn geometry(&self) -> &SurveyGeometry {
        &self.geometry
    }

    /// A gather passed after construction must match the kernel's shape.
    fn check_shape(&self, field: &'static str, g: &TimeGather) -> Result<()> {
        let expected = (self.geometry.ts, self.geometry.ns);
        if g.shape() != expected {
            return Err(MarchenkoError::ShapeMismatch {
                field,
                expected: format!("{}x{}", expected.0, expected.1),
                found: g.describe_shape(),
            });
        }
        Ok(())
    }

    /// Order-zero estimate and `nitr` iterations.
    pub fn focus(&self, direct_arrival: &TimeGather) -> Result<FocusingFunctions> {
        self.check_shape("direct arrival", direct_arrival)?;
        let f0 = InitialEstimate::new(&self.kernel, direct_arrival);
        let solver = FocusingSolver::new(self.params.nitr);
        let focusing = solver.solve(&self.kernel, f0);
        log::info!("Focusing functions computed after {} iterations", focusing.iterations);
        Ok(focusing)
    }

    /// Full pipeline: focus, retrieve, normalise, mute.
    ///
    /// `inputs` may differ from the set the engine was built from, but the
    /// direct arrival and ground truth must share its shape.
    pub fn run(&self, inputs: &MarchenkoInputs) -> Result<MarchenkoOutputs> {
        self.check_shape("direct arrival", &inputs.direct_arrival)?;
        if let Some(truth) = &inputs.ground_truth {
            self.check_shape("ground truth", truth)?;
        }
        let focusing = self.focus(&inputs.direct_arrival)?;
        let greens = GreensFunctions::retrieve(&self.kernel, &focusing);
        log::info!("Green's functions retrieved");
        self.finish(focusing, greens, inputs.ground_truth.as_ref())
    }

    fn finish(
        &self,
        focusing: FocusingFunctions,
        greens: GreensFunctions,
        ground_truth: Option<&TimeGather>,
    ) -> Result<MarchenkoOutputs> {
        let window = &self.kernel.window;

        let g_peak = peak_amplitude(&greens.g_total, "g_total")?;
        let f_peak = peak_amplitude(&focusing.fk_plus.time, "fk+")?;

        let normalize_green = |g: &TimeGather| mute(&normalize_by(g, g_peak), window);

        Ok(MarchenkoOutputs {
            f0_plus: normalize_by(&focusing.f0_plus.time, f_peak),
            f0_minus: normalize_by(&focusing.f0_minus.time, f_peak),
            fk_plus: normalize_by(&focusing.fk_plus.time, f_peak),
            fk_minus: normalize_by(&focusing.fk_minus.time, f_peak),
            g_plus: normalize_green(&greens.g_plus),
            g_minus: normalize_green(&greens.g_minus),
            g_total: normalize_green(&greens.g_total),
            ground_truth: ground_truth.map(normalize_green),
            offsets: self.geometry.offsets(),
            max_t: self.geometry.max_t(),
            g_peak,
            f_peak,
        })
    }
}

/// Validate, build and run in one call.
pub fn run(inputs: &MarchenkoInputs, params: &MarchenkoParams) -> Result<MarchenkoOutputs> {
    MarchenkoEngine::new(inputs, params)?.run(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::focusing::SolverState;

    /// Unit impulse per channel at `ts/2 + delay + r` (lag `delay + r`).
    fn impulse_arrival(ts: usize, ns: usize, delay: usize) -> TimeGather {
        TimeGather::from_fn(ts, ns, |t, r| if t == ts / 2 + delay + r { 1.0 } else { 0.0 })
    }

    /// Ones strictly between the time-reversed and the direct arrival.
    fn window_for(ts: usize, ns: usize, delay: usize) -> TimeGather {
        TimeGather::from_fn(ts, ns, |t, r| {
            if t.abs_diff(ts / 2) + 2 <= delay + r {
                1.0
            } else {
                0.0
            }
        })
    }

    fn scenario_params() -> MarchenkoParams {
        MarchenkoParams {
            nitr: 5,
            tp: 0.2,
            scaling: 1.0,
            dt: 0.002,
            dx: 16.0,
            o_min: 4.0,
        }
    }

    fn layered_inputs(ts: usize, ns: usize, delay: usize) -> MarchenkoInputs {
        let reflectivity = Cube::from_fn(ts, ns, |t, r, s| {
            let d = 2 * delay + r.abs_diff(s);
            if t == d {
                0.8
            } else if t == d + delay / 2 {
                -0.4
            } else {
                0.0
            }
        });
        MarchenkoInputs {
            reflectivity,
            direct_arrival: impulse_arrival(ts, ns, delay),
            window: window_for(ts, ns, delay),
            ground_truth: None,
        }
    }

    #[test]
    fn test_zero_reflectivity_scenario() {
        let (ts, ns) = (500, 10);
        let td = impulse_arrival(ts, ns, 40);
        let inputs = MarchenkoInputs {
            reflectivity: Cube::zeros(ts, ns),
            direct_arrival: td.clone(),
            window: window_for(ts, ns, 40),
            ground_truth: Some(td.map(|v| 2.0 * v)),
        };
        let params = scenario_params();
        let engine = MarchenkoEngine::new(&inputs, &params).unwrap();
        let focusing = engine.focus(&inputs.direct_arrival).unwrap();
        assert_eq!(focusing.iterations, 5);
        assert_eq!(focusing.fk_plus.time, focusing.f0_plus.time);
        assert_eq!(focusing.fk_minus.time.peak_abs(), 0.0);
        assert_eq!(focusing.f0_minus.time.peak_abs(), 0.0);

        let out = engine.run(&inputs).unwrap();
        assert_eq!(out.fk_plus, out.f0_plus);
        assert_eq!(out.fk_minus.peak_abs(), 0.0);
        assert_eq!(out.f0_minus.peak_abs(), 0.0);
        // The downgoing Green's function is the direct arrival itself.
        assert!(out.g_total.max_abs_diff(&td) < 1e-12);
        assert!(out.g_plus.max_abs_diff(&td) < 1e-12);
        assert_eq!(out.g_minus.peak_abs(), 0.0);
        // Ground truth shares the g_total divisor.
        assert!(out.ground_truth.unwrap().max_abs_diff(&td.map(|v| 2.0 * v)) < 1e-12);

        assert_eq!(out.offsets.len(), 10);
        assert_eq!(out.offsets[0], 4.0);
        assert_eq!(out.offsets[1], 20.0);
        assert!((out.max_t - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_iterations_match_initial_estimate() {
        let inputs = layered_inputs(128, 6, 12);
        let mut params = scenario_params();
        params.nitr = 0;
        let out = run(&inputs, &params).unwrap();
        let engine = MarchenkoEngine::new(&inputs, &params).unwrap();
        let f0 = InitialEstimate::new(engine.kernel(), &inputs.direct_arrival);
        let f_peak = out.f_peak;
        assert!(out.fk_plus.max_abs_diff(&normalize_by(&f0.f0_plus.time, f_peak)) < 1e-12);
        assert!(out.fk_minus.max_abs_diff(&normalize_by(&f0.f0_minus.time, f_peak)) < 1e-12);
        assert_eq!(out.fk_plus, out.f0_plus);
        assert_eq!(out.fk_minus, out.f0_minus);
    }

    #[test]
    fn test_outputs_are_normalised_and_muted() {
        let inputs = layered_inputs(128, 6, 12);
        let out = run(&inputs, &scenario_params()).unwrap();
        assert!((out.fk_plus.peak_abs() - 1.0).abs() < 1e-12);
        assert!(out.g_total.peak_abs() <= 1.0 + 1e-12);
        let theta = &inputs.window;
        for (g, w) in out.g_total.as_slice().iter().zip(theta.as_slice()) {
            if *w == 1.0 {
                assert_eq!(*g, 0.0);
            }
        }
    }

    #[test]
    fn test_update_norm_non_increasing() {
        let inputs = layered_inputs(128, 6, 12);
        let params = scenario_params();
        let engine = MarchenkoEngine::new(&inputs, &params).unwrap();
        let kernel = engine.kernel();
        let f0 = InitialEstimate::new(kernel, &inputs.direct_arrival);
        let mut state = SolverState::initial(kernel, &f0);
        let mut norms = Vec::new();
        for _ in 0..8 {
            let next = state.step(kernel, &f0);
            norms.push(next.update_norm(&state));
            state = next;
        }
        for pair in norms.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-12, "update norms {:?}", norms);
        }
    }

    #[test]
    fn test_output_continuous_in_taper() {
        let inputs = layered_inputs(128, 6, 12);
        let mut params = scenario_params();
        params.nitr = 2;
        let mut previous: Option<MarchenkoOutputs> = None;
        for step in 0..=20 {
            params.tp = step as f64 / 20.0;
            let current = run(&inputs, &params).unwrap();
            if let Some(prev) = &previous {
                let diff = current.fk_minus.max_abs_diff(&prev.fk_minus);
                assert!(diff < 0.25, "jump {} at tp={}", diff, params.tp);
            }
            previous = Some(current);
        }
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let mut inputs = layered_inputs(64, 4, 8);
        inputs.window = TimeGather::zeros(63, 4);
        let err = run(&inputs, &scenario_params()).unwrap_err();
        assert!(matches!(
            err,
            MarchenkoError::ShapeMismatch {
                field: "time window",
                ..
            }
        ));

        let mut inputs = layered_inputs(64, 4, 8);
        inputs.ground_truth = Some(TimeGather::zeros(64, 3));
        assert!(matches!(
            run(&inputs, &scenario_params()),
            Err(MarchenkoError::ShapeMismatch {
                field: "ground truth",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let inputs = layered_inputs(64, 4, 8);
        let mut params = scenario_params();
        params.tp = 1.2;
        assert_eq!(
            run(&inputs, &params).unwrap_err(),
            MarchenkoError::DegenerateTaper(1.2)
        );

        let mut params = scenario_params();
        params.dt = 0.0;
        assert!(matches!(
            run(&inputs, &params),
            Err(MarchenkoError::InvalidParameter { name: "dt", .. })
        ));
    }

    #[test]
    fn test_zero_direct_arrival_is_degenerate() {
        let mut inputs = layered_inputs(64, 4, 8);
        inputs.direct_arrival = TimeGather::zeros(64, 4);
        assert!(matches!(
            run(&inputs, &scenario_params()),
            Err(MarchenkoError::DegenerateNormalization { field: "g_total" })
        ));
    }

    #[test]
    fn test_engine_rejects_inputs_of_another_shape() {
        let engine = MarchenkoEngine::new(&layered_inputs(64, 4, 8), &scenario_params()).unwrap();

        let shorter = layered_inputs(32, 4, 6);
        assert!(shorter.validate().is_ok());
        let err = engine.run(&shorter).unwrap_err();
        assert_eq!(
            err,
            MarchenkoError::ShapeMismatch {
                field: "direct arrival",
                expected: "64x4".to_string(),
                found: shorter.direct_arrival.describe_shape(),
            }
        );
        assert!(engine.focus(&TimeGather::zeros(64, 5)).is_err());

        let mut truth_mismatch = layered_inputs(64, 4, 8);
        truth_mismatch.ground_truth = Some(TimeGather::zeros(32, 4));
        assert!(matches!(
            engine.run(&truth_mismatch),
            Err(MarchenkoError::ShapeMismatch {
                field: "ground truth",
                ..
            })
        ));
    }
}
