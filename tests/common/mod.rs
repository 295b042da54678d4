//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const PCM: u16 = 1;
pub const FLOAT: u16 = 3;
pub const EXTENSIBLE: u16 = 0xFFFE;

/// Encodes a chunk: id, little-endian size, body and a pad byte when the body is odd.
pub fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + body.len() + 1);
    out.extend_from_slice(id);
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    if body.len() % 2 != 0 {
        out.push(0);
    }
    out
}

/// The 16-byte body of a classic `fmt ` chunk.
pub fn fmt_body(audio_format: u16, channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * (bits / 8);
    let mut body = Vec::with_capacity(16);
    body.extend_from_slice(&audio_format.to_le_bytes());
    body.extend_from_slice(&channels.to_le_bytes());
    body.extend_from_slice(&sample_rate.to_le_bytes());
    body.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    body.extend_from_slice(&block_align.to_le_bytes());
    body.extend_from_slice(&bits.to_le_bytes());
    body
}

/// A 40-byte extensible `fmt ` body carrying `sub_format`.
pub fn extensible_fmt_body(
    channels: u16,
    sample_rate: u32,
    bits: u16,
    sub_format: [u8; 16],
) -> Vec<u8> {
    let mut body = fmt_body(EXTENSIBLE, channels, sample_rate, bits);
    body.extend_from_slice(&22u16.to_le_bytes());
    body.extend_from_slice(&bits.to_le_bytes());
    body.extend_from_slice(&0u32.to_le_bytes());
    body.extend_from_slice(&sub_format);
    body
}

/// Wraps encoded chunks in a RIFF/WAVE header.
pub fn riff(chunks: &[Vec<u8>]) -> Vec<u8> {
    let body_len: usize = chunks.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(12 + body_len);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((4 + body_len) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    for c in chunks {
        out.extend_from_slice(c);
    }
    out
}

/// A complete single-`fmt`, single-`data` file.
pub fn simple_wav(
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    bits: u16,
    payload: &[u8],
) -> Vec<u8> {
    riff(&[
        chunk(b"fmt ", &fmt_body(audio_format, channels, sample_rate, bits)),
        chunk(b"data", payload),
    ])
}

/// Writes `bytes` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).expect("write fixture");
    path
}

pub fn i16_payload(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
