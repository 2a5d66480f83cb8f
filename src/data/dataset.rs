/// Input dataset loading
///
/// Reads the reflectivity, direct arrival, window and optional ground truth
/// named in a run configuration, either as self-describing array files or
/// as headerless `f32` files of a configured shape.

use marchenko_core::{Cube, MarchenkoInputs, TimeGather};
use marchenko_io::{read_cube_file, read_gather_file, read_raw_f32_file, ReadError};
use std::path::Path;

use crate::pipeline::config::{InputPaths, RawLayout};
use crate::pipeline::PipelineError;

fn read_error(path: &Path) -> impl FnOnce(ReadError) -> PipelineError + '_ {
    move |source| PipelineError::Read {
        path: path.display().to_string(),
        source,
    }
}

fn load_gather(path: &Path, raw: Option<&RawLayout>) -> Result<TimeGather, PipelineError> {
    let gather = match raw {
        Some(layout) => {
            let data = read_raw_f32_file(path, &[layout.ts, layout.ns], layout.swap)
                .map_err(read_error(path))?;
            TimeGather::from_vec(layout.ts, layout.ns, data)?
        }
        None => read_gather_file(path).map_err(read_error(path))?,
    };
    log::debug!("Loaded {} ({})", path.display(), gather.describe_shape());
    Ok(gather)
}

fn load_cube(path: &Path, raw: Option<&RawLayout>) -> Result<Cube<f64>, PipelineError> {
    let cube = match raw {
        Some(layout) => {
            let data = read_raw_f32_file(path, &[layout.ts, layout.ns, layout.ns], layout.swap)
                .map_err(read_error(path))?;
            Cube::from_vec(layout.ts, layout.ns, data)?
        }
        None => read_cube_file(path).map_err(read_error(path))?,
    };
    log::debug!("Loaded {} ({})", path.display(), cube.describe_shape());
    Ok(cube)
}

/// Load every input named in `paths`. Shapes are checked later by the engine.
pub fn load_inputs(paths: &InputPaths) -> Result<MarchenkoInputs, PipelineError> {
    let raw = paths.raw.as_ref();
    let reflectivity = load_cube(&paths.reflectivity, raw)?;
    let direct_arrival = load_gather(&paths.direct_arrival, raw)?;
    let window = load_gather(&paths.window, raw)?;
    let ground_truth = match &paths.ground_truth {
        Some(p) => Some(load_gather(p, raw)?),
        None => None,
    };
    Ok(MarchenkoInputs {
        reflectivity,
        direct_arrival,
        window,
        ground_truth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use marchenko_io::{write_cube_file, write_gather_file, ElementKind};
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("marchenko-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_headed_inputs() {
        let dir = scratch_dir("dataset");
        let cube = Cube::from_fn(8, 2, |t, r, s| (t + r + s) as f64);
        let td = TimeGather::from_fn(8, 2, |t, _| if t == 6 { 1.0 } else { 0.0 });
        let theta = TimeGather::from_fn(8, 2, |t, _| if t.abs_diff(4) < 2 { 1.0 } else { 0.0 });
        write_cube_file(&dir.join("R.mkar"), &cube, ElementKind::F64).unwrap();
        write_gather_file(&dir.join("Td.mkar"), &td, ElementKind::F32).unwrap();
        write_gather_file(&dir.join("theta.mkar"), &theta, ElementKind::F32).unwrap();

        let paths = InputPaths {
            reflectivity: dir.join("R.mkar"),
            direct_arrival: dir.join("Td.mkar"),
            window: dir.join("theta.mkar"),
            ground_truth: None,
            raw: None,
        };
        let inputs = load_inputs(&paths).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(inputs.reflectivity, cube);
        assert_eq!(inputs.direct_arrival, td);
        assert_eq!(inputs.window, theta);
        assert!(inputs.validate().is_ok());
    }

    #[test]
    fn test_load_raw_inputs() {
        let dir = scratch_dir("raw");
        let values: Vec<u8> = (0..12).flat_map(|i| (i as f32).to_ne_bytes()).collect();
        std::fs::write(dir.join("g.bin"), &values).unwrap();
        let layout = RawLayout { ts: 6, ns: 2, swap: false };
        let g = load_gather(&dir.join("g.bin"), Some(&layout)).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(g.get(5, 1), 11.0);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_gather(Path::new("/nonexistent/Td.mkar"), None).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/Td.mkar"));
    }
}
