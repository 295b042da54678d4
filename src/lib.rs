//! Locates and decodes the audio payload of RIFF/WAVE files.
//!
//! Parsing yields a validated [`FormatDescriptor`]; decoding turns the payload it points at
//! into a [`SampleBuffer`] of normalized, channel-interleaved `f32` samples. Linear PCM at
//! 8/16/24/32 bits and IEEE float at 32 bits are supported, including their
//! WAVE_FORMAT_EXTENSIBLE spellings.
//!
//! ```no_run
//! let descriptor = wave_ingest::open("input.wav")?;
//! let samples = wave_ingest::decode(&descriptor, "input.wav")?;
//! assert_eq!(samples.len() as u64, descriptor.frame_count() * descriptor.channels() as u64);
//! # Ok::<(), wave_ingest::Error>(())
//! ```

pub mod buffer;
pub mod bytes;
pub mod config;
pub mod decoder;
pub mod error;
pub mod format;
mod riff;

use std::path::Path;

pub use buffer::SampleBuffer;
pub use config::ReaderConfig;
pub use decoder::{decode, decode_from_reader, decode_with};
pub use error::{Error, ErrorKind, Result};
pub use format::{AudioFormat, FormatDescriptor, FormatExtension, SampleFormat};

/// Parses the WAVE file at `path`. Shorthand for [`FormatDescriptor::open`].
pub fn open(path: impl AsRef<Path>) -> Result<FormatDescriptor> {
    FormatDescriptor::open(path)
}

/// Parses and decodes the WAVE file at `path` in one call.
pub fn load(path: impl AsRef<Path>) -> Result<(FormatDescriptor, SampleBuffer)> {
    let path = path.as_ref();
    let descriptor = FormatDescriptor::open(path)?;
    let samples = decode(&descriptor, path)?;
    Ok((descriptor, samples))
}
