//! Array reader: header + data from files or streams.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use byteorder::{ByteOrder, NativeEndian};
use marchenko_core::{Cube, MarchenkoError, TimeGather};
use thiserror::Error;

use crate::byteswap::{bswap4, bswap8};
use crate::header::{ArrayHeader, ElementKind, HdrStatus, HEADER_BYTES};

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("Data truncated: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
    #[error("Trailing data: expected {expected} bytes, found {extra} more")]
    TrailingData { expected: usize, extra: u64 },
    #[error("Array of {count} values is too large to address")]
    Oversized { count: usize },
    #[error("Expected a rank-{expected} array, found rank {found}")]
    Rank { expected: usize, found: usize },
    #[error(transparent)]
    Shape(#[from] MarchenkoError),
}

/// Read an array header from a reader.
pub fn read_header<R: Read>(reader: &mut R) -> Result<(ArrayHeader, HdrStatus), ReadError> {
    let buf = read_raw_bytes(reader, HEADER_BYTES)?;
    ArrayHeader::from_bytes(&buf).map_err(ReadError::InvalidHeader)
}

/// Read exactly `count` bytes, reporting a short read as [`ReadError::Truncated`].
///
/// The buffer grows with the data actually read, so a header announcing
/// more data than the stream holds fails without a large allocation.
pub fn read_raw_bytes<R: Read>(reader: &mut R, count: usize) -> Result<Vec<u8>, ReadError> {
    let mut buf = Vec::new();
    reader.take(count as u64).read_to_end(&mut buf)?;
    if buf.len() != count {
        return Err(ReadError::Truncated {
            expected: count,
            got: buf.len(),
        });
    }
    Ok(buf)
}

/// Read `count` values of the given kind, widening to f64.
pub fn read_values<R: Read>(
    reader: &mut R,
    kind: ElementKind,
    count: usize,
    needs_swap: bool,
) -> Result<Vec<f64>, ReadError> {
    let bytes = count
        .checked_mul(kind.size())
        .ok_or(ReadError::Oversized { count })?;
    let mut buf = read_raw_bytes(reader, bytes)?;
    let values = match kind {
        ElementKind::F32 => {
            if needs_swap {
                bswap4(&mut buf);
            }
            buf.chunks_exact(4)
                .map(|c| NativeEndian::read_f32(c) as f64)
                .collect()
        }
        ElementKind::F64 => {
            if needs_swap {
                bswap8(&mut buf);
            }
            buf.chunks_exact(8).map(NativeEndian::read_f64).collect()
        }
    };
    Ok(values)
}

/// Fail with [`ReadError::TrailingData`] unless the stream is exhausted.
pub fn expect_end<R: Read>(reader: &mut R, expected: usize) -> Result<(), ReadError> {
    let extra = io::copy(reader, &mut io::sink())?;
    if extra > 0 {
        return Err(ReadError::TrailingData { expected, extra });
    }
    Ok(())
}

/// Read a complete array: header and all data, up to the end of the stream.
pub fn read_array<R: Read>(reader: &mut R) -> Result<(ArrayHeader, Vec<f64>), ReadError> {
    let (header, status) = read_header(reader)?;
    if status == HdrStatus::Swapped {
        log::debug!("Array written with opposite byte order; swapping");
    }
    let count = header
        .element_count()
        .ok_or_else(|| ReadError::InvalidHeader(format!("dimensions {:?} overflow", header.dims)))?;
    let data = read_values(reader, header.kind, count, status == HdrStatus::Swapped)?;
    expect_end(reader, HEADER_BYTES + count * header.kind.size())?;
    Ok((header, data))
}

fn expect_rank(header: &ArrayHeader, rank: usize) -> Result<(), ReadError> {
    if header.rank() != rank {
        return Err(ReadError::Rank {
            expected: rank,
            found: header.rank(),
        });
    }
    Ok(())
}

/// Read a `ts × ns` gather from a stream.
pub fn read_gather<R: Read>(reader: &mut R) -> Result<TimeGather, ReadError> {
    let (header, data) = read_array(reader)?;
    expect_rank(&header, 2)?;
    Ok(TimeGather::from_vec(header.dims[0], header.dims[1], data)?)
}

/// Read a `ts × ns × ns` cube from a stream.
pub fn read_cube<R: Read>(reader: &mut R) -> Result<Cube<f64>, ReadError> {
    let (header, data) = read_array(reader)?;
    expect_rank(&header, 3)?;
    if header.dims[1] != header.dims[2] {
        return Err(ReadError::Shape(MarchenkoError::ShapeMismatch {
            field: "reflectivity",
            expected: "equal receiver and source axes".to_string(),
            found: format!("{}x{}x{}", header.dims[0], header.dims[1], header.dims[2]),
        }));
    }
    Ok(Cube::from_vec(header.dims[0], header.dims[1], data)?)
}

pub fn read_gather_file(path: &Path) -> Result<TimeGather, ReadError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_gather(&mut reader)
}

pub fn read_cube_file(path: &Path) -> Result<Cube<f64>, ReadError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_cube(&mut reader)
}

/// Read a headerless `f32` file of known shape (`dims` row-major).
pub fn read_raw_f32_file(
    path: &Path,
    dims: &[usize],
    needs_swap: bool,
) -> Result<Vec<f64>, ReadError> {
    let mut reader = BufReader::new(File::open(path)?);
    let count = dims
        .iter()
        .try_fold(1usize, |n, &d| n.checked_mul(d))
        .ok_or(ReadError::Oversized { count: usize::MAX })?;
    let values = read_values(&mut reader, ElementKind::F32, count, needs_swap)?;
    expect_end(&mut reader, count * ElementKind::F32.size())?;
    Ok(values)
}
