/// End-to-end run: load, solve, write, compare
///
/// Each stage is recorded in the run log. Outputs land in the
/// configured directory as one array file per field plus the geometry
/// vectors and a JSON report.

use marchenko_core::{MarchenkoEngine, MarchenkoOutputs, SurveyGeometry, TimeGather};
use marchenko_io::{write_gather_file, write_vector_file, ElementKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::comparison::{compare, Comparison};
use super::config::{Precision, RunConfig};
use super::PipelineError;
use crate::data::dataset::load_inputs;
use crate::log::run_log::{RunLog, Stage};

impl From<Precision> for ElementKind {
    fn from(p: Precision) -> Self {
        match p {
            Precision::F32 => ElementKind::F32,
            Precision::F64 => ElementKind::F64,
        }
    }
}

/// Summary written to `report.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub session_id: String,
    pub ts: usize,
    pub ns: usize,
    pub geometry: SurveyGeometry,
    pub nitr: usize,
    pub taper: f64,
    pub max_t: f64,
    pub g_total_peak: f64,
    pub fk_plus_peak: f64,
    pub comparison: Option<Comparison>,
    pub outputs: Vec<PathBuf>,
}

/// Named output gathers in write order.
fn output_fields(out: &MarchenkoOutputs) -> Vec<(&'static str, &TimeGather)> {
    let mut fields = vec![
        ("f0_plus", &out.f0_plus),
        ("f0_minus", &out.f0_minus),
        ("fk_plus", &out.fk_plus),
        ("fk_minus", &out.fk_minus),
        ("g_plus", &out.g_plus),
        ("g_minus", &out.g_minus),
        ("g_total", &out.g_total),
    ];
    if let Some(truth) = &out.ground_truth {
        fields.push(("ground_truth", truth));
    }
    fields
}

/// Write every output field and the geometry vectors into `dir`.
pub fn write_outputs(
    dir: &Path,
    out: &MarchenkoOutputs,
    time_axis: &[f64],
    kind: ElementKind,
) -> Result<Vec<PathBuf>, PipelineError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (name, gather) in output_fields(out) {
        let path = dir.join(format!("{}.mkar", name));
        write_gather_file(&path, gather, kind)?;
        written.push(path);
    }

    let offsets = dir.join("offsets.mkar");
    write_vector_file(&offsets, &out.offsets, ElementKind::F64)?;
    written.push(offsets);
    let time = dir.join("time.mkar");
    write_vector_file(&time, time_axis, ElementKind::F64)?;
    written.push(time);
    Ok(written)
}

/// Run the full pipeline for a loaded configuration, recording each stage
/// in `log` and saving it next to the outputs.
pub fn run_pipeline(config: &RunConfig, log: &mut RunLog) -> Result<RunReport, PipelineError> {
    let inputs = load_inputs(&config.inputs)?;
    log.record(Stage::Inputs {
        reflectivity: inputs.reflectivity.describe_shape(),
        direct_arrival: inputs.direct_arrival.describe_shape(),
        window: inputs.window.describe_shape(),
        ground_truth: inputs.ground_truth.is_some(),
        raw: config.inputs.raw.is_some(),
    });

    let params = &config.params;
    let engine = MarchenkoEngine::new(&inputs, params)?;
    let geometry = *engine.geometry();
    let outputs = engine.run(&inputs)?;
    log.record(Stage::Solve { params: *params });
    log.record(Stage::Normalise {
        g_peak: outputs.g_peak,
        f_peak: outputs.f_peak,
    });

    let written = write_outputs(
        &config.output_dir,
        &outputs,
        &geometry.time_axis(),
        config.precision.into(),
    )?;
    log.record(Stage::Outputs {
        precision: config.precision,
        files: written.clone(),
    });

    let comparison = outputs
        .ground_truth
        .as_ref()
        .map(|truth| compare(&outputs.g_total, truth));
    if let Some(c) = comparison {
        log.record(Stage::Comparison(c));
    }

    let report = RunReport {
        session_id: log.session_id.clone(),
        ts: geometry.ts,
        ns: geometry.ns,
        geometry,
        nitr: params.nitr,
        taper: params.tp,
        max_t: outputs.max_t,
        g_total_peak: outputs.g_peak,
        fk_plus_peak: outputs.f_peak,
        comparison,
        outputs: written,
    };
    std::fs::write(
        config.output_dir.join("report.json"),
        serde_json::to_string_pretty(&report)?,
    )?;
    log.save(&config.output_dir)?;
    Ok(report)
}
