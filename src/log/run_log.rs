/// Run record
///
/// A run is logged as a sequence of typed stages (inputs, solve, normalise,
/// outputs, comparison) carrying the numbers needed to check it: input
/// shapes, the full parameter set, the normalisation peaks and the files
/// written. Stages are timed from the start of the session.
///
/// The record is saved next to the outputs as:
/// - `run_log.txt`, a readable summary
/// - `run_log.json`, the full record
/// - `reproduce.sh`, which recreates the resolved configuration and reruns it

use chrono::{DateTime, Local};
use marchenko_core::{MarchenkoParams, Reflectivity};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::pipeline::comparison::Comparison;
use crate::pipeline::config::{Precision, RunConfig};
use crate::pipeline::PipelineError;

/// What one pipeline stage did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Inputs {
        reflectivity: String,
        direct_arrival: String,
        window: String,
        ground_truth: bool,
        raw: bool,
    },
    Solve {
        params: MarchenkoParams,
    },
    Normalise {
        g_peak: f64,
        f_peak: f64,
    },
    Outputs {
        precision: Precision,
        files: Vec<PathBuf>,
    },
    Comparison(Comparison),
}

impl Stage {
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Inputs { .. } => "Load inputs",
            Stage::Solve { .. } => "Marchenko solve",
            Stage::Normalise { .. } => "Normalise and mute",
            Stage::Outputs { .. } => "Write outputs",
            Stage::Comparison(_) => "Ground truth comparison",
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Stage::Inputs {
                reflectivity,
                direct_arrival,
                window,
                ground_truth,
                raw,
            } => format!(
                "R {}, Td {}, window {}{}{}",
                reflectivity,
                direct_arrival,
                window,
                if *ground_truth { ", ground truth" } else { "" },
                if *raw { " (headerless f32)" } else { "" }
            ),
            Stage::Solve { params } => format!(
                "nitr={}, taper={}, dt={} s, dx={} m, o_min={} m, R scale {:.4e}",
                params.nitr,
                params.tp,
                params.dt,
                params.dx,
                params.o_min,
                Reflectivity::scale_factor(params.dt, params.dx, params.scaling)
            ),
            Stage::Normalise { g_peak, f_peak } => format!(
                "Green's functions / {:.6e}, focusing functions / {:.6e}",
                g_peak, f_peak
            ),
            Stage::Outputs { precision, files } => {
                format!("{} {} arrays", files.len(), precision)
            }
            Stage::Comparison(c) => c.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    /// 1-based position in the run
    pub index: usize,
    pub at: DateTime<Local>,
    /// Milliseconds since the session started
    pub elapsed_ms: i64,
    #[serde(flatten)]
    pub stage: Stage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub session_id: String,
    pub started: DateTime<Local>,
    pub software_version: String,
    pub config_path: PathBuf,
    /// Configuration after path resolution and CLI overrides
    pub config: RunConfig,
    pub stages: Vec<StageRecord>,
}

impl RunLog {
    pub fn new(config_path: &Path, config: &RunConfig) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            started: Local::now(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            config_path: config_path.to_path_buf(),
            config: config.clone(),
            stages: Vec::new(),
        }
    }

    pub fn record(&mut self, stage: Stage) {
        let at = Local::now();
        let index = self.stages.len() + 1;
        log::info!("[{}] {}: {}", index, stage.title(), stage.summary());
        self.stages.push(StageRecord {
            index,
            at,
            elapsed_ms: (at - self.started).num_milliseconds(),
            stage,
        });
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The normalisation peaks, if the run got that far.
    pub fn peaks(&self) -> Option<(f64, f64)> {
        self.stages.iter().find_map(|r| match r.stage {
            Stage::Normalise { g_peak, f_peak } => Some((g_peak, f_peak)),
            _ => None,
        })
    }

    /// Command line that reruns the configuration file with the recorded
    /// overrides applied.
    pub fn rerun_command(&self, config_path: &Path, out: &Path) -> String {
        let mut cmd = format!(
            "marchenko run --config \"{}\" --nitr {} --taper {} --out \"{}\"",
            config_path.display(),
            self.config.params.nitr,
            self.config.params.tp,
            out.display()
        );
        if self.config.precision == Precision::F64 {
            cmd.push_str(" --f64");
        }
        cmd
    }

    pub fn to_text(&self) -> String {
        let params = &self.config.params;
        let mut out = String::new();
        let _ = writeln!(out, "Marchenko run {}", self.session_id);
        let _ = writeln!(out, "  marchenko v{}", self.software_version);
        let _ = writeln!(out, "  started   {}", self.started.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "  config    {}", self.config_path.display());
        let _ = writeln!(out, "  output    {}", self.config.output_dir.display());
        let _ = writeln!(
            out,
            "  params    nitr={} tp={} scaling={} dt={} dx={} o_min={}",
            params.nitr, params.tp, params.scaling, params.dt, params.dx, params.o_min
        );
        out.push('\n');
        for r in &self.stages {
            let _ = writeln!(
                out,
                "{:>2}. {:>8.3}s  {:<24} {}",
                r.index,
                r.elapsed_ms as f64 / 1000.0,
                r.stage.title(),
                r.stage.summary()
            );
            if let Stage::Outputs { files, .. } = &r.stage {
                for f in files {
                    let _ = writeln!(out, "               {}", f.display());
                }
            }
        }
        out
    }

    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Shell script that writes the resolved configuration next to itself
    /// and reruns it into `rerun/`, so a later edit of the original file
    /// does not change what is reproduced.
    pub fn to_shell_script(&self) -> Result<String, PipelineError> {
        let config_json = serde_json::to_string_pretty(&self.config)?;
        let mut out = String::new();
        out.push_str("#!/bin/bash\n");
        let _ = writeln!(out, "# Rerun of Marchenko session {}", self.session_id);
        let _ = writeln!(
            out,
            "# Recorded {} by marchenko v{} from {}",
            self.started.format("%Y-%m-%d %H:%M:%S"),
            self.software_version,
            self.config_path.display()
        );
        out.push_str("set -euo pipefail\n\n");
        out.push_str("HERE=\"$(cd \"$(dirname \"$0\")\" && pwd)\"\n");
        out.push_str("cat > \"$HERE/run_config.json\" <<'MARCHENKO_CONFIG'\n");
        out.push_str(&config_json);
        out.push_str("\nMARCHENKO_CONFIG\n\n");
        out.push_str(&self.rerun_command(
            Path::new("$HERE/run_config.json"),
            Path::new("$HERE/rerun"),
        ));
        out.push('\n');
        if let Some((g_peak, f_peak)) = self.peaks() {
            out.push_str("\n# Recorded normalisation peaks:\n");
            let _ = writeln!(out, "#   g_total {:.6e}", g_peak);
            let _ = writeln!(out, "#   fk+     {:.6e}", f_peak);
        }
        Ok(out)
    }

    /// Write the text, JSON and script exports into `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), PipelineError> {
        std::fs::write(dir.join("run_log.txt"), self.to_text())?;
        std::fs::write(dir.join("run_log.json"), self.to_json()?)?;
        let script = dir.join("reproduce.sh");
        std::fs::write(&script, self.to_shell_script()?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }
}
