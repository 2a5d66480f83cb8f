//! Marchenko redatuming core: focusing functions and Green's functions from
//! surface reflection data.
//!
//! The pipeline runs strictly forward:
//!
//! ```text
//!   R, T_d, Θ ──▶ initial estimate ──▶ fixed-point iteration ──▶
//!   Green's function retrieval ──▶ normalisation + mute
//! ```
//!
//! Time-domain gathers use the centered layout described in [`transform`];
//! the reflectivity is the one input recorded causally.

pub mod convolution;
pub mod engine;
pub mod error;
pub mod focusing;
pub mod gather;
pub mod geometry;
pub mod green;
pub mod kernel;
pub mod postprocess;
pub mod taper;
pub mod transform;
pub mod window;

pub use convolution::Reflectivity;
pub use engine::{run, MarchenkoEngine, MarchenkoInputs, MarchenkoOutputs, MarchenkoParams};
pub use error::MarchenkoError;
pub use focusing::{FocusingFunctions, FocusingSolver, InitialEstimate, SolverState};
pub use gather::{Cube, DualGather, Gather, SpectralGather, TimeGather};
pub use geometry::SurveyGeometry;
pub use green::GreensFunctions;
pub use kernel::Kernel;
pub use taper::cosine_taper;
pub use transform::SpectralTransform;
pub use window::{MaskSide, TimeWindow};
