//! Array file header.
//!
//! ```text
//!   offset  size  field
//!   0       4     magic "MKAR"
//!   4       4     version (u32)
//!   8       4     element kind (u32): 1 = f32, 2 = f64
//!   12      4     rank (u32): 2 or 3
//!   16      12    dimensions (3 × u32), unused trailing ones are 1
//!   28      4     byte order marker (f32 2.345)
//! ```
//!
//! Data follows in row-major order: time, receiver, then source.

use byteorder::{ByteOrder, NativeEndian};

use crate::byteswap::{bswap4, needs_swap, ORDER_MARKER};

pub const MAGIC: &[u8; 4] = b"MKAR";
pub const HEADER_BYTES: usize = 32;
pub const FORMAT_VERSION: u32 = 1;
pub const MAX_RANK: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    F32,
    F64,
}

impl ElementKind {
    pub fn code(self) -> u32 {
        match self {
            ElementKind::F32 => 1,
            ElementKind::F64 => 2,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(ElementKind::F32),
            2 => Some(ElementKind::F64),
            _ => None,
        }
    }

    pub fn size(self) -> usize {
        match self {
            ElementKind::F32 => 4,
            ElementKind::F64 => 8,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::F32 => write!(f, "f32"),
            ElementKind::F64 => write!(f, "f64"),
        }
    }
}

/// Whether the file matched native byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdrStatus {
    Ok,
    Swapped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayHeader {
    pub kind: ElementKind,
    pub dims: Vec<usize>,
}

impl ArrayHeader {
    pub fn new(kind: ElementKind, dims: &[usize]) -> Self {
        Self {
            kind,
            dims: dims.to_vec(),
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of samples, `None` if the dimensions overflow `usize`.
    pub fn element_count(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |n, &d| n.checked_mul(d))
    }

    pub fn data_bytes(&self) -> Option<usize> {
        self.element_count()?.checked_mul(self.kind.size())
    }

    /// Serialise in native byte order. Fails for ranks outside 1..=3 or
    /// dimensions that do not fit the 32-bit fields.
    pub fn to_bytes(&self) -> Result<[u8; HEADER_BYTES], String> {
        if !(1..=MAX_RANK).contains(&self.rank()) {
            return Err(format!("unsupported rank {}", self.rank()));
        }
        let mut buf = [0u8; HEADER_BYTES];
        buf[0..4].copy_from_slice(MAGIC);
        NativeEndian::write_u32(&mut buf[4..8], FORMAT_VERSION);
        NativeEndian::write_u32(&mut buf[8..12], self.kind.code());
        NativeEndian::write_u32(&mut buf[12..16], self.rank() as u32);
        for i in 0..MAX_RANK {
            let d = self.dims.get(i).copied().unwrap_or(1);
            let d = u32::try_from(d).map_err(|_| format!("dimension {} too large: {}", i, d))?;
            NativeEndian::write_u32(&mut buf[16 + 4 * i..20 + 4 * i], d);
        }
        NativeEndian::write_f32(&mut buf[28..32], ORDER_MARKER);
        Ok(buf)
    }

    /// Parse a header, detecting a byte-swapped file from the order marker.
    pub fn from_bytes(buf: &[u8]) -> Result<(Self, HdrStatus), String> {
        if buf.len() < HEADER_BYTES {
            return Err("buffer too small for array header".to_string());
        }
        if &buf[0..4] != MAGIC {
            return Err("missing MKAR magic".to_string());
        }

        let marker = [buf[28], buf[29], buf[30], buf[31]];
        let swap = needs_swap(marker).ok_or("byte order check failed")?;
        let mut words = buf[4..HEADER_BYTES].to_vec();
        if swap {
            bswap4(&mut words);
        }

        let version = NativeEndian::read_u32(&words[0..4]);
        if version != FORMAT_VERSION {
            return Err(format!("unsupported format version {}", version));
        }
        let code = NativeEndian::read_u32(&words[4..8]);
        let kind = ElementKind::from_code(code).ok_or(format!("unknown element kind {}", code))?;
        let rank = NativeEndian::read_u32(&words[8..12]) as usize;
        if !(1..=MAX_RANK).contains(&rank) {
            return Err(format!("unsupported rank {}", rank));
        }
        let dims = (0..rank)
            .map(|i| NativeEndian::read_u32(&words[12 + 4 * i..16 + 4 * i]) as usize)
            .collect();

        let status = if swap { HdrStatus::Swapped } else { HdrStatus::Ok };
        Ok((Self { kind, dims }, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_bytes() {
        let hdr = ArrayHeader::new(ElementKind::F64, &[500, 10, 10]);
        let (parsed, status) = ArrayHeader::from_bytes(&hdr.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, hdr);
        assert_eq!(status, HdrStatus::Ok);
        assert_eq!(parsed.data_bytes(), Some(500 * 10 * 10 * 8));
    }

    #[test]
    fn test_swapped_header_detected() {
        let hdr = ArrayHeader::new(ElementKind::F32, &[64, 3]);
        let mut bytes = hdr.to_bytes().unwrap();
        bswap4(&mut bytes[4..]);
        let (parsed, status) = ArrayHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, hdr);
        assert_eq!(status, HdrStatus::Swapped);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = ArrayHeader::new(ElementKind::F32, &[4, 4]).to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(ArrayHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_oversized_header_not_written() {
        let hdr = ArrayHeader::new(ElementKind::F32, &[2, 2, 2, 2]);
        assert!(hdr.to_bytes().is_err());
        let hdr = ArrayHeader::new(ElementKind::F32, &[]);
        assert!(hdr.to_bytes().is_err());
        #[cfg(target_pointer_width = "64")]
        {
            let hdr = ArrayHeader::new(ElementKind::F64, &[(u32::MAX as usize) + 1, 1]);
            assert!(hdr.to_bytes().unwrap_err().contains("too large"));
        }
    }

    #[test]
    fn test_element_count_overflow() {
        let hdr = ArrayHeader::new(ElementKind::F64, &[usize::MAX, 2]);
        assert_eq!(hdr.element_count(), None);
        assert_eq!(hdr.data_bytes(), None);
        let hdr = ArrayHeader::new(ElementKind::F64, &[usize::MAX / 4, 2]);
        assert!(hdr.element_count().is_some());
        assert_eq!(hdr.data_bytes(), None);
    }
}
