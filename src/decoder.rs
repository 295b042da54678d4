//! Payload decoding into normalized `f32` samples.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use enum_dispatch::enum_dispatch;
use log::debug;

use crate::buffer::SampleBuffer;
use crate::bytes::{f32_le, i16_le, i24_le, i32_le};
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::format::{FormatDescriptor, SampleFormat};

/// Upper bound on the payload buffer reserved before reading. Larger payloads grow as bytes
/// actually arrive, so a lying `data` header cannot force a huge allocation.
const MAX_PREALLOC: usize = 1 << 24;

/// Converts one frame of raw little-endian samples into normalized floats.
#[enum_dispatch]
trait FrameDecoder {
    /// `frame` holds exactly `out.len()` samples, one per channel.
    fn decode_frame(&self, frame: &[u8], out: &mut [f32]);
}

#[derive(Debug, Clone, Copy)]
struct Uint8Codec;

#[derive(Debug, Clone, Copy)]
struct Int16Codec;

#[derive(Debug, Clone, Copy)]
struct Int24Codec;

#[derive(Debug, Clone, Copy)]
struct Int32Codec;

#[derive(Debug, Clone, Copy)]
struct Float32Codec;

impl FrameDecoder for Uint8Codec {
    #[inline]
    fn decode_frame(&self, frame: &[u8], out: &mut [f32]) {
        debug_assert_eq!(frame.len(), out.len());
        for (&byte, sample) in frame.iter().zip(out.iter_mut()) {
            *sample = (byte as i32 - 128) as f32 / 128.0;
        }
    }
}

impl FrameDecoder for Int16Codec {
    #[inline]
    fn decode_frame(&self, frame: &[u8], out: &mut [f32]) {
        debug_assert_eq!(frame.len(), out.len() * 2);
        for (window, sample) in frame.chunks_exact(2).zip(out.iter_mut()) {
            *sample = i16_le(*bytemuck::from_bytes(window)) as f32 / 32768.0;
        }
    }
}

impl FrameDecoder for Int24Codec {
    #[inline]
    fn decode_frame(&self, frame: &[u8], out: &mut [f32]) {
        debug_assert_eq!(frame.len(), out.len() * 3);
        for (window, sample) in frame.chunks_exact(3).zip(out.iter_mut()) {
            *sample = i24_le(*bytemuck::from_bytes(window)) as f32 / 8_388_608.0;
        }
    }
}

impl FrameDecoder for Int32Codec {
    #[inline]
    fn decode_frame(&self, frame: &[u8], out: &mut [f32]) {
        debug_assert_eq!(frame.len(), out.len() * 4);
        for (window, sample) in frame.chunks_exact(4).zip(out.iter_mut()) {
            // f32 cannot hold 32 significant bits; scale in f64 first.
            *sample = (i32_le(*bytemuck::from_bytes(window)) as f64 / 2_147_483_648.0) as f32;
        }
    }
}

impl FrameDecoder for Float32Codec {
    #[inline]
    fn decode_frame(&self, frame: &[u8], out: &mut [f32]) {
        debug_assert_eq!(frame.len(), out.len() * 4);
        for (window, sample) in frame.chunks_exact(4).zip(out.iter_mut()) {
            *sample = f32_le(*bytemuck::from_bytes(window));
        }
    }
}

/// Codec selected once per decode call from the descriptor's encoding.
#[enum_dispatch(FrameDecoder)]
#[derive(Debug, Clone, Copy)]
enum Codec {
    Uint8(Uint8Codec),
    Int16(Int16Codec),
    Int24(Int24Codec),
    Int32(Int32Codec),
    Float32(Float32Codec),
}

impl Codec {
    fn for_descriptor(descriptor: &FormatDescriptor) -> Result<Self> {
        let format = descriptor
            .sample_format()
            .ok_or(Error::UnsupportedEncoding {
                audio_format: descriptor.audio_format().tag(),
                bits_per_sample: descriptor.bits_per_sample(),
            })?;

        Ok(match format {
            SampleFormat::Uint8 => Uint8Codec.into(),
            SampleFormat::Int16 => Int16Codec.into(),
            SampleFormat::Int24 => Int24Codec.into(),
            SampleFormat::Int32 => Int32Codec.into(),
            SampleFormat::Float32 => Float32Codec.into(),
        })
    }
}

/// Reads and decodes the payload described by `descriptor` from the file at `path`.
///
/// # Errors
/// Fails if the file cannot be reopened, the seek fails, fewer than `data_size` bytes are
/// available, or the encoding is not one of PCM 8/16/24/32 or float 32.
pub fn decode(descriptor: &FormatDescriptor, path: impl AsRef<Path>) -> Result<SampleBuffer> {
    decode_with(descriptor, path, &ReaderConfig::default())
}

/// Like [`decode`] with explicit reader settings.
pub fn decode_with(
    descriptor: &FormatDescriptor,
    path: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<SampleBuffer> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    decode_from_reader(
        descriptor,
        BufReader::with_capacity(config.effective_capacity(), file),
    )
}

/// Decodes the payload described by `descriptor` from an already opened source.
///
/// `descriptor.data_offset()` is interpreted as an absolute position within `source`.
pub fn decode_from_reader<R: Read + Seek>(
    descriptor: &FormatDescriptor,
    mut source: R,
) -> Result<SampleBuffer> {
    let channels = descriptor.channels() as usize;
    let block_align = descriptor.block_align() as usize;
    let data_size = descriptor.data_size() as usize;
    if channels == 0 || block_align == 0 {
        return Err(Error::MalformedFormat("empty frame layout"));
    }
    if data_size == 0 {
        return Err(Error::MissingPayload);
    }
    let codec = Codec::for_descriptor(descriptor)?;

    source.seek(SeekFrom::Start(descriptor.data_offset()))?;
    let mut payload = Vec::with_capacity(data_size.min(MAX_PREALLOC));
    let read = source
        .by_ref()
        .take(data_size as u64)
        .read_to_end(&mut payload)?;
    if read != data_size {
        return Err(Error::ShortRead {
            expected: data_size as u64,
            actual: read as u64,
        });
    }

    // Floor division: bytes past the last whole frame are dropped.
    let frame_count = data_size / block_align;
    let mut buffer =
        SampleBuffer::zeroed(descriptor.channels(), descriptor.sample_rate(), frame_count);
    for (frame, out) in payload
        .chunks_exact(block_align)
        .zip(buffer.as_mut_slice().chunks_exact_mut(channels))
    {
        codec.decode_frame(frame, out);
    }

    debug!(
        "{}: decoded {} frames ({:?})",
        descriptor.path().display(),
        frame_count,
        codec
    );
    Ok(buffer)
}

impl FormatDescriptor {
    /// Decodes this descriptor's payload, reopening the file it was parsed from.
    pub fn decode(&self) -> Result<SampleBuffer> {
        decode(self, self.path())
    }
}
