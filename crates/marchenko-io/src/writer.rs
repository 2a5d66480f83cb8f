//! Array writer: header + data to files or streams, native byte order.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use byteorder::{NativeEndian, WriteBytesExt};
use marchenko_core::{Cube, TimeGather};
use thiserror::Error;

use crate::header::{ArrayHeader, ElementKind};

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Cannot encode header: {0}")]
    InvalidHeader(String),
}

pub fn write_header<W: Write>(writer: &mut W, header: &ArrayHeader) -> Result<(), WriteError> {
    let bytes = header.to_bytes().map_err(WriteError::InvalidHeader)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Write values narrowed or kept according to `kind`.
pub fn write_values<W: Write>(
    writer: &mut W,
    data: &[f64],
    kind: ElementKind,
) -> Result<(), WriteError> {
    let mut buf = Vec::with_capacity(data.len() * kind.size());
    for &v in data {
        match kind {
            ElementKind::F32 => buf.write_f32::<NativeEndian>(v as f32)?,
            ElementKind::F64 => buf.write_f64::<NativeEndian>(v)?,
        }
    }
    writer.write_all(&buf)?;
    Ok(())
}

/// Write a complete array: header and data.
pub fn write_array<W: Write>(
    writer: &mut W,
    header: &ArrayHeader,
    data: &[f64],
) -> Result<(), WriteError> {
    debug_assert_eq!(header.element_count(), Some(data.len()));
    write_header(writer, header)?;
    write_values(writer, data, header.kind)
}

pub fn write_gather<W: Write>(
    writer: &mut W,
    gather: &TimeGather,
    kind: ElementKind,
) -> Result<(), WriteError> {
    let header = ArrayHeader::new(kind, &[gather.ts(), gather.ns()]);
    write_array(writer, &header, gather.as_slice())
}

pub fn write_cube<W: Write>(
    writer: &mut W,
    cube: &Cube<f64>,
    kind: ElementKind,
) -> Result<(), WriteError> {
    let header = ArrayHeader::new(kind, &[cube.ts(), cube.ns(), cube.ns()]);
    write_array(writer, &header, cube.as_slice())
}

pub fn write_gather_file(path: &Path, gather: &TimeGather, kind: ElementKind) -> Result<(), WriteError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_gather(&mut out, gather, kind)?;
    out.flush()?;
    Ok(())
}

pub fn write_cube_file(path: &Path, cube: &Cube<f64>, kind: ElementKind) -> Result<(), WriteError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_cube(&mut out, cube, kind)?;
    out.flush()?;
    Ok(())
}

/// Write a 1-D vector (offsets, time axis) as a rank-1 array.
pub fn write_vector_file(path: &Path, values: &[f64], kind: ElementKind) -> Result<(), WriteError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_array(&mut out, &ArrayHeader::new(kind, &[values.len()]), values)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HEADER_BYTES;
    use crate::reader::{read_array, read_gather_file};
    use std::io::Cursor;

    #[test]
    fn test_written_size() {
        let g = TimeGather::zeros(10, 4);
        let mut buf = Vec::new();
        write_gather(&mut buf, &g, ElementKind::F32).unwrap();
        assert_eq!(buf.len(), HEADER_BYTES + 10 * 4 * 4);
    }

    #[test]
    fn test_vector_is_rank_one() {
        let values = [1.0, 2.0, 3.0];
        let mut buf = Vec::new();
        write_array(&mut buf, &ArrayHeader::new(ElementKind::F64, &[3]), &values).unwrap();
        let (header, data) = read_array(&mut Cursor::new(buf)).unwrap();
        assert_eq!(header.rank(), 1);
        assert_eq!(data, values);
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("mkar-writer-{}.mkar", std::process::id()));
        let g = TimeGather::from_fn(6, 2, |t, r| (t as f64).powi(2) - r as f64);
        write_gather_file(&path, &g, ElementKind::F64).unwrap();
        let back = read_gather_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, g);
    }

    #[test]
    fn test_unencodable_header_writes_nothing() {
        let mut buf = Vec::new();
        let header = ArrayHeader::new(ElementKind::F32, &[1, 1, 1, 1]);
        let err = write_array(&mut buf, &header, &[0.0]).unwrap_err();
        assert!(matches!(err, WriteError::InvalidHeader(_)));
        assert!(buf.is_empty());
    }
}
