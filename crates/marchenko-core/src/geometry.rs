//! Survey geometry derived from the input shape and sampling parameters.

use serde::{Deserialize, Serialize};

/// Regular split-spread line: `ns` co-located sources and receivers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurveyGeometry {
    pub ts: usize,
    pub ns: usize,
    /// Time sample interval (s)
    pub dt: f64,
    /// Channel spacing (m)
    pub dx: f64,
    /// Offset of the first channel (m)
    pub o_min: f64,
}

impl SurveyGeometry {
    pub fn new(ts: usize, ns: usize, dt: f64, dx: f64, o_min: f64) -> Self {
        Self {
            ts,
            ns,
            dt,
            dx,
            o_min,
        }
    }

    /// Channel offsets `o_min + i·dx`.
    pub fn offsets(&self) -> Vec<f64> {
        (0..self.ns)
            .map(|i| self.o_min + i as f64 * self.dx)
            .collect()
    }

    /// Half the recording duration (s); outputs span `[-max_t, max_t)`.
    pub fn max_t(&self) -> f64 {
        self.ts as f64 * self.dt / 2.0
    }

    /// Time of every sample in the centered layout.
    pub fn time_axis(&self) -> Vec<f64> {
        let zero = (self.ts / 2) as f64;
        (0..self.ts)
            .map(|i| (i as f64 - zero) * self.dt)
            .collect()
    }

    /// Centered sample index closest to time `t`, if it falls on the grid.
    pub fn sample_at(&self, t: f64) -> Option<usize> {
        let idx = (t / self.dt).round() as i64 + (self.ts / 2) as i64;
        if idx >= 0 && (idx as usize) < self.ts {
            Some(idx as usize)
        } else {
            None
        }
    }
}
