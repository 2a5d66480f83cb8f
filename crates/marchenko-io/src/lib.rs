//! Array I/O for Marchenko gathers: self-describing binary files,
//! headerless `f32` import, and byte-swapping.

pub mod byteswap;
pub mod header;
pub mod reader;
pub mod writer;

pub use byteswap::*;
pub use header::*;
pub use reader::*;
pub use writer::*;
