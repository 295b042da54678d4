//! Little-endian conversions for fixed-width byte groups.
//!
//! Every function is total over its input array and independent of host byte order.

/// Decodes a little-endian `u16`.
#[inline(always)]
pub fn u16_le(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}

/// Decodes a little-endian `u32`.
#[inline(always)]
pub fn u32_le(bytes: [u8; 4]) -> u32 {
    u32::from_le_bytes(bytes)
}

/// Decodes a little-endian `i16` (the `u16` bit pattern reinterpreted as signed).
#[inline(always)]
pub fn i16_le(bytes: [u8; 2]) -> i16 {
    u16_le(bytes) as i16
}

/// Assembles a packed 24-bit little-endian sample into an `i32`, sign-extending bit 23.
#[inline(always)]
pub fn i24_le(bytes: [u8; 3]) -> i32 {
    let raw = (bytes[0] as u32) | ((bytes[1] as u32) << 8) | ((bytes[2] as u32) << 16);
    if raw & 0x0080_0000 != 0 {
        (raw | 0xFF00_0000) as i32
    } else {
        raw as i32
    }
}

/// Decodes a little-endian `i32` (the `u32` bit pattern reinterpreted as signed).
#[inline(always)]
pub fn i32_le(bytes: [u8; 4]) -> i32 {
    u32_le(bytes) as i32
}

/// Reinterprets four little-endian bytes as an IEEE-754 binary32 value.
#[inline(always)]
pub fn f32_le(bytes: [u8; 4]) -> f32 {
    f32::from_bits(u32_le(bytes))
}
