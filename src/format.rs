//! The validated format descriptor produced by a successful parse.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Subformat GUID of linear PCM inside a WAVE_FORMAT_EXTENSIBLE chunk
/// (`00000001-0000-0010-8000-00AA00389B71`, mixed-endian on disk).
pub const KSDATAFORMAT_SUBTYPE_PCM: [u8; 16] = [
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

/// Subformat GUID of IEEE-754 float inside a WAVE_FORMAT_EXTENSIBLE chunk
/// (`00000003-0000-0010-8000-00AA00389B71`).
pub const KSDATAFORMAT_SUBTYPE_IEEE_FLOAT: [u8; 16] = [
    0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

/// WAVE format tag (`wFormatTag`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    /// Linear integer PCM (tag 1).
    Pcm,
    /// IEEE-754 floating point (tag 3).
    IeeeFloat,
    /// WAVE_FORMAT_EXTENSIBLE whose subformat GUID was absent or not recognized.
    Extensible,
    /// Any other tag, kept verbatim.
    Other(u16),
}

impl AudioFormat {
    pub const PCM_TAG: u16 = 0x0001;
    pub const IEEE_FLOAT_TAG: u16 = 0x0003;
    pub const EXTENSIBLE_TAG: u16 = 0xFFFE;

    /// Maps a raw format tag to its variant.
    pub const fn from_tag(tag: u16) -> Self {
        match tag {
            Self::PCM_TAG => AudioFormat::Pcm,
            Self::IEEE_FLOAT_TAG => AudioFormat::IeeeFloat,
            Self::EXTENSIBLE_TAG => AudioFormat::Extensible,
            other => AudioFormat::Other(other),
        }
    }

    /// The numeric tag as it appears on disk.
    pub const fn tag(self) -> u16 {
        match self {
            AudioFormat::Pcm => Self::PCM_TAG,
            AudioFormat::IeeeFloat => Self::IEEE_FLOAT_TAG,
            AudioFormat::Extensible => Self::EXTENSIBLE_TAG,
            AudioFormat::Other(tag) => tag,
        }
    }
}

/// Decodable sample encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Unsigned 8-bit integer samples, centered on 128.
    Uint8,
    /// Signed 16-bit integer samples.
    Int16,
    /// Signed packed 24-bit integer samples.
    Int24,
    /// Signed 32-bit integer samples.
    Int32,
    /// IEEE-754 binary32 samples.
    Float32,
}

impl SampleFormat {
    /// Returns the number of bytes per sample for this format.
    #[inline]
    pub fn bytes_per_sample(&self) -> u16 {
        match self {
            SampleFormat::Uint8 => 1,
            SampleFormat::Int16 => 2,
            SampleFormat::Int24 => 3,
            SampleFormat::Int32 | SampleFormat::Float32 => 4,
        }
    }

    /// Resolves the decodable encoding for a tag and bit depth, if there is one.
    pub fn from_parts(audio_format: AudioFormat, bits_per_sample: u16) -> Option<Self> {
        match (audio_format, bits_per_sample) {
            (AudioFormat::Pcm, 8) => Some(SampleFormat::Uint8),
            (AudioFormat::Pcm, 16) => Some(SampleFormat::Int16),
            (AudioFormat::Pcm, 24) => Some(SampleFormat::Int24),
            (AudioFormat::Pcm, 32) => Some(SampleFormat::Int32),
            (AudioFormat::IeeeFloat, 32) => Some(SampleFormat::Float32),
            _ => None,
        }
    }
}

/// The WAVE_FORMAT_EXTENSIBLE tail of a `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatExtension {
    pub valid_bits_per_sample: u16,
    pub channel_mask: u32,
    pub sub_format: [u8; 16],
}

impl FormatExtension {
    /// Returns the concrete format named by the subformat GUID, if it is a known one.
    pub fn resolve(&self) -> Option<AudioFormat> {
        match self.sub_format {
            KSDATAFORMAT_SUBTYPE_PCM => Some(AudioFormat::Pcm),
            KSDATAFORMAT_SUBTYPE_IEEE_FLOAT => Some(AudioFormat::IeeeFloat),
            _ => None,
        }
    }
}

/// Fields of a `fmt ` chunk as read from disk, before descriptor validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FormatFields {
    pub audio_format: AudioFormat,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub extension: Option<FormatExtension>,
}

impl FormatFields {
    /// True when none of the required fields is zero.
    pub fn is_valid(&self) -> bool {
        self.channels > 0
            && self.sample_rate > 0
            && self.block_align > 0
            && self.bits_per_sample > 0
    }
}

/// Position and declared length of the `data` chunk payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DataExtent {
    pub offset: u64,
    pub size: u32,
}

/// Validated, immutable description of a WAVE file's audio payload.
///
/// Only the container parser creates descriptors, so every instance satisfies
/// `block_align == channels * (bits_per_sample / 8)` with non-zero fields and a
/// bit depth of 8, 16, 24 or 32.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    path: PathBuf,
    riff_size: u32,
    audio_format: AudioFormat,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
    extension: Option<FormatExtension>,
    data_offset: u64,
    data_size: u32,
}

impl FormatDescriptor {
    pub(crate) fn try_from_parts(
        path: PathBuf,
        riff_size: u32,
        format: Option<FormatFields>,
        data: Option<DataExtent>,
    ) -> Result<Self> {
        let format = match format {
            Some(format) if format.is_valid() => format,
            Some(_) => return Err(Error::MalformedFormat("zero-valued required field")),
            None => return Err(Error::MalformedFormat("missing fmt chunk")),
        };
        let data = match data {
            Some(data) if data.offset > 0 && data.size > 0 => data,
            _ => return Err(Error::MissingPayload),
        };

        if !matches!(format.bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(Error::MalformedFormat("unsupported bit depth"));
        }
        let bytes_per_sample = format.bits_per_sample / 8;
        if format.channels.checked_mul(bytes_per_sample) != Some(format.block_align) {
            return Err(Error::MalformedFormat(
                "block align does not match channels and bit depth",
            ));
        }

        Ok(Self {
            path,
            riff_size,
            audio_format: format.audio_format,
            channels: format.channels,
            sample_rate: format.sample_rate,
            byte_rate: format.byte_rate,
            block_align: format.block_align,
            bits_per_sample: format.bits_per_sample,
            extension: format.extension,
            data_offset: data.offset,
            data_size: data.size,
        })
    }

    /// Path the descriptor was parsed from (provenance only).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size declared in the outer RIFF header. Informational; never validated.
    pub fn riff_size(&self) -> u32 {
        self.riff_size
    }

    pub fn audio_format(&self) -> AudioFormat {
        self.audio_format
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Average bytes per second as declared in the `fmt ` chunk.
    pub fn byte_rate(&self) -> u32 {
        self.byte_rate
    }

    /// Bytes per frame.
    pub fn block_align(&self) -> u16 {
        self.block_align
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// Extensible-format tail, when the `fmt ` chunk carried one.
    pub fn extension(&self) -> Option<&FormatExtension> {
        self.extension.as_ref()
    }

    /// Absolute file offset of the first payload byte.
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    /// Declared payload length in bytes.
    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    /// The decodable encoding, or `None` for unresolved or unsupported tags.
    pub fn sample_format(&self) -> Option<SampleFormat> {
        SampleFormat::from_parts(self.audio_format, self.bits_per_sample)
    }

    /// Number of complete frames in the payload. A trailing partial frame is not counted.
    pub fn frame_count(&self) -> u64 {
        self.data_size as u64 / self.block_align as u64
    }

    /// Payload duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm16_stereo() -> FormatFields {
        FormatFields {
            audio_format: AudioFormat::Pcm,
            channels: 2,
            sample_rate: 44100,
            byte_rate: 176_400,
            block_align: 4,
            bits_per_sample: 16,
            extension: None,
        }
    }

    fn extent(size: u32) -> Option<DataExtent> {
        Some(DataExtent { offset: 44, size })
    }

    #[test]
    fn builds_descriptor_from_valid_parts() {
        let desc =
            FormatDescriptor::try_from_parts("a.wav".into(), 36, Some(pcm16_stereo()), extent(8))
                .expect("valid parts");
        assert_eq!(desc.channels(), 2);
        assert_eq!(desc.frame_count(), 2);
        assert_eq!(desc.sample_format(), Some(SampleFormat::Int16));
        assert_eq!(desc.path(), Path::new("a.wav"));
    }

    #[test]
    fn rejects_alignment_violation() {
        let mut fmt = pcm16_stereo();
        fmt.block_align = 3;
        let err = FormatDescriptor::try_from_parts("a.wav".into(), 0, Some(fmt), extent(8))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedFormat(_)));
    }

    #[test]
    fn rejects_block_align_overflowing_u16() {
        let mut fmt = pcm16_stereo();
        fmt.channels = u16::MAX;
        fmt.bits_per_sample = 32;
        fmt.block_align = u16::MAX.wrapping_mul(4);
        let err = FormatDescriptor::try_from_parts("a.wav".into(), 0, Some(fmt), extent(8))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedFormat(_)));
    }

    #[test]
    fn rejects_unsupported_bit_depth() {
        let mut fmt = pcm16_stereo();
        fmt.bits_per_sample = 12;
        fmt.block_align = 2;
        let err = FormatDescriptor::try_from_parts("a.wav".into(), 0, Some(fmt), extent(8))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedFormat("unsupported bit depth")));
    }

    #[test]
    fn rejects_zero_fields_and_missing_payload() {
        let mut fmt = pcm16_stereo();
        fmt.sample_rate = 0;
        assert!(matches!(
            FormatDescriptor::try_from_parts("a.wav".into(), 0, Some(fmt), extent(8)),
            Err(Error::MalformedFormat(_))
        ));
        assert!(matches!(
            FormatDescriptor::try_from_parts("a.wav".into(), 0, Some(pcm16_stereo()), extent(0)),
            Err(Error::MissingPayload)
        ));
        assert!(matches!(
            FormatDescriptor::try_from_parts("a.wav".into(), 0, Some(pcm16_stereo()), None),
            Err(Error::MissingPayload)
        ));
    }

    #[test]
    fn extension_resolves_known_guids_only() {
        let mut ext = FormatExtension {
            valid_bits_per_sample: 24,
            channel_mask: 0x3,
            sub_format: KSDATAFORMAT_SUBTYPE_PCM,
        };
        assert_eq!(ext.resolve(), Some(AudioFormat::Pcm));
        ext.sub_format = KSDATAFORMAT_SUBTYPE_IEEE_FLOAT;
        assert_eq!(ext.resolve(), Some(AudioFormat::IeeeFloat));
        ext.sub_format[15] ^= 0xFF;
        assert_eq!(ext.resolve(), None);
    }

    #[test]
    fn float_needs_32_bits() {
        assert_eq!(
            SampleFormat::from_parts(AudioFormat::IeeeFloat, 32),
            Some(SampleFormat::Float32)
        );
        assert_eq!(SampleFormat::from_parts(AudioFormat::IeeeFloat, 16), None);
        assert_eq!(SampleFormat::from_parts(AudioFormat::Extensible, 16), None);
        assert_eq!(AudioFormat::from_tag(0x0011), AudioFormat::Other(0x0011));
        assert_eq!(AudioFormat::Other(0x0011).tag(), 0x0011);
    }
}
