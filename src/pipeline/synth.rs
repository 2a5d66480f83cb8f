/// Synthetic scenario generator
///
/// Writes a self-consistent input set (reflectivity, direct arrival, window
/// and a run configuration) for checking an installation end to end. The
/// direct arrival is a unit impulse per channel with linear moveout, and
/// the window opens just inside the arrival and its time reverse.

use marchenko_core::{Cube, MarchenkoParams, TimeGather};
use marchenko_io::{write_cube_file, write_gather_file, ElementKind};
use std::path::{Path, PathBuf};

use super::config::{InputPaths, Precision, RunConfig};
use super::PipelineError;

/// Samples kept between the window edge and the direct arrival.
const WINDOW_MARGIN: usize = 2;

/// A single flat reflector, recorded as one spike per trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflector {
    pub amplitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthOptions {
    pub ts: usize,
    pub ns: usize,
    pub dt: f64,
    pub dx: f64,
    pub o_min: f64,
    /// Lag of the direct arrival on the first channel (samples)
    pub arrival_samples: usize,
    /// Extra lag per channel (samples)
    pub moveout_samples: usize,
    pub nitr: usize,
    pub tp: f64,
    pub reflector: Option<Reflector>,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            ts: 500,
            ns: 10,
            dt: 0.002,
            dx: 16.0,
            o_min: 4.0,
            arrival_samples: 50,
            moveout_samples: 1,
            nitr: 5,
            tp: 0.1,
            reflector: None,
        }
    }
}

impl SynthOptions {
    fn arrival_lag(&self, r: usize) -> usize {
        self.arrival_samples + r * self.moveout_samples
    }

    /// Every arrival and its two-way reflection must fit in the positive half.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.ts < 4 || self.ns == 0 {
            return Err(PipelineError::Config(format!(
                "synthetic shape too small (ts={}, ns={})",
                self.ts, self.ns
            )));
        }
        let latest = self.arrival_lag(self.ns - 1);
        let two_way = 2 * latest + self.ns * self.moveout_samples;
        if self.arrival_samples <= WINDOW_MARGIN || two_way >= self.ts / 2 {
            return Err(PipelineError::Config(format!(
                "arrival lags {}..={} samples do not fit in ts={}",
                self.arrival_samples, latest, self.ts
            )));
        }
        Ok(())
    }

    pub fn direct_arrival(&self) -> TimeGather {
        let zero = self.ts / 2;
        TimeGather::from_fn(self.ts, self.ns, |t, r| {
            if t == zero + self.arrival_lag(r) {
                1.0
            } else {
                0.0
            }
        })
    }

    /// Ones where `|t| + margin <= arrival lag`, zero elsewhere.
    pub fn window(&self) -> TimeGather {
        let zero = self.ts / 2;
        TimeGather::from_fn(self.ts, self.ns, |t, r| {
            if t.abs_diff(zero) + WINDOW_MARGIN <= self.arrival_lag(r) {
                1.0
            } else {
                0.0
            }
        })
    }

    /// Causal reflection response: zero, or one spike at the two-way time.
    pub fn reflectivity(&self) -> Cube<f64> {
        match self.reflector {
            None => Cube::zeros(self.ts, self.ns),
            Some(Reflector { amplitude }) => Cube::from_fn(self.ts, self.ns, |t, r, s| {
                let lag = 2 * self.arrival_samples + r.abs_diff(s) * self.moveout_samples;
                if t == lag {
                    amplitude
                } else {
                    0.0
                }
            }),
        }
    }

    pub fn params(&self) -> MarchenkoParams {
        MarchenkoParams {
            nitr: self.nitr,
            tp: self.tp,
            o_min: self.o_min,
            ..MarchenkoParams::new(self.dt, self.dx)
        }
    }
}

/// Write the scenario into `dir` and return the path of its configuration.
///
/// Without a reflector the exact Green's function is the direct arrival,
/// which is written as ground truth.
pub fn write_scenario(dir: &Path, opts: &SynthOptions) -> Result<PathBuf, PipelineError> {
    opts.validate()?;
    std::fs::create_dir_all(dir)?;

    let td = opts.direct_arrival();
    write_cube_file(&dir.join("R.mkar"), &opts.reflectivity(), ElementKind::F32)?;
    write_gather_file(&dir.join("Td.mkar"), &td, ElementKind::F32)?;
    write_gather_file(&dir.join("theta.mkar"), &opts.window(), ElementKind::F32)?;
    let ground_truth = if opts.reflector.is_none() {
        write_gather_file(&dir.join("G_truth.mkar"), &td, ElementKind::F32)?;
        Some(PathBuf::from("G_truth.mkar"))
    } else {
        None
    };

    let config = RunConfig {
        inputs: InputPaths {
            reflectivity: PathBuf::from("R.mkar"),
            direct_arrival: PathBuf::from("Td.mkar"),
            window: PathBuf::from("theta.mkar"),
            ground_truth,
            raw: None,
        },
        output_dir: PathBuf::from("output"),
        precision: Precision::F32,
        params: opts.params(),
    };
    let path = dir.join("config.json");
    config.save(&path)?;
    log::info!(
        "Wrote synthetic scenario ({}x{}x{}) to {}",
        opts.ts,
        opts.ns,
        opts.ns,
        dir.display()
    );
    Ok(path)
}
