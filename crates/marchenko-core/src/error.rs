//! Precondition failures raised at the engine boundary.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarchenkoError {
    #[error("shape mismatch for {field}: expected {expected}, found {found}")]
    ShapeMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },
    #[error("taper fraction must lie in [0, 1], got {0}")]
    DegenerateTaper(f64),
    #[error("cannot normalise {field}: peak amplitude is zero or not finite")]
    DegenerateNormalization { field: &'static str },
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, MarchenkoError>;
