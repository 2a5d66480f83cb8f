//! Byte-swap helpers for arrays written on a machine of the other
//! endianness.

/// Swap bytes of 4-byte words in place.
pub fn bswap4(buf: &mut [u8]) {
    debug_assert!(buf.len() % 4 == 0, "bswap4: buffer length must be multiple of 4");
    for chunk in buf.chunks_exact_mut(4) {
        chunk.swap(0, 3);
        chunk.swap(1, 2);
    }
}

/// Swap bytes of 8-byte words in place.
pub fn bswap8(buf: &mut [u8]) {
    debug_assert!(buf.len() % 8 == 0, "bswap8: buffer length must be multiple of 8");
    for chunk in buf.chunks_exact_mut(8) {
        chunk.reverse();
    }
}

/// Byte order marker stored in every array header.
pub const ORDER_MARKER: f32 = 2.345;

/// `true` if a marker read in native order shows the file was written with
/// the opposite byte order.
pub fn needs_swap(marker_bytes: [u8; 4]) -> Option<bool> {
    let native = f32::from_ne_bytes(marker_bytes);
    if (native - ORDER_MARKER).abs() < 0.001 {
        return Some(false);
    }
    let mut swapped = marker_bytes;
    swapped.reverse();
    if (f32::from_ne_bytes(swapped) - ORDER_MARKER).abs() < 0.001 {
        return Some(true);
    }
    None
}
