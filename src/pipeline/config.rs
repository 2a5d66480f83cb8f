/// Run configuration
///
/// A run is described by one JSON file naming the three input arrays, an
/// optional ground truth, the output directory and the scalar engine
/// parameters. Relative paths are resolved against the file's directory.

use marchenko_core::MarchenkoParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::PipelineError;

/// Precision of the arrays written to the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    #[default]
    F32,
    F64,
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precision::F32 => write!(f, "f32"),
            Precision::F64 => write!(f, "f64"),
        }
    }
}

/// Shape of headerless `f32` inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawLayout {
    pub ts: usize,
    pub ns: usize,
    /// Data was written with the opposite byte order
    #[serde(default)]
    pub swap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPaths {
    pub reflectivity: PathBuf,
    pub direct_arrival: PathBuf,
    pub window: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<PathBuf>,
    /// If set, inputs are headerless `f32` files of this shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub inputs: InputPaths,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub precision: Precision,
    pub params: MarchenkoParams,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl RunConfig {
    /// Read and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        let mut config: RunConfig = serde_json::from_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Make relative paths relative to `base`.
    pub fn resolve_relative(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.inputs.reflectivity);
        resolve(&mut self.inputs.direct_arrival);
        resolve(&mut self.inputs.window);
        if let Some(p) = self.inputs.ground_truth.as_mut() {
            resolve(p);
        }
        resolve(&mut self.output_dir);
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        self.params.validate()?;
        if let Some(raw) = &self.inputs.raw {
            if raw.ts == 0 || raw.ns == 0 {
                return Err(PipelineError::Config(format!(
                    "raw input shape must be non-empty (ts={}, ns={})",
                    raw.ts, raw.ns
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> &'static str {
        r#"{
            "inputs": {
                "reflectivity": "R.mkar",
                "direct_arrival": "Td.mkar",
                "window": "theta.mkar"
            },
            "params": { "dt": 0.004, "dx": 12.5 }
        }"#
    }

    #[test]
    fn test_defaults_applied() {
        let config: RunConfig = serde_json::from_str(sample()).unwrap();
        assert_eq!(config.params.nitr, 5);
        assert_eq!(config.params.tp, 0.1);
        assert_eq!(config.params.scaling, 1.0);
        assert_eq!(config.params.o_min, 0.0);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.precision, Precision::F32);
        assert!(config.inputs.ground_truth.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config: RunConfig = serde_json::from_str(sample()).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_relative_paths_resolved() {
        let mut config: RunConfig = serde_json::from_str(sample()).unwrap();
        config.resolve_relative(Path::new("/data/run1"));
        assert_eq!(config.inputs.reflectivity, PathBuf::from("/data/run1/R.mkar"));
        assert_eq!(config.output_dir, PathBuf::from("/data/run1/output"));
    }

    #[test]
    fn test_invalid_taper_rejected() {
        let mut config: RunConfig = serde_json::from_str(sample()).unwrap();
        config.params.tp = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_raw_shape_rejected() {
        let mut config: RunConfig = serde_json::from_str(sample()).unwrap();
        config.inputs.raw = Some(RawLayout { ts: 0, ns: 4, swap: false });
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }
}
