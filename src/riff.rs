//! RIFF/WAVE container parsing.
//!
//! The parser walks the top-level subchunks once, keeping the last `fmt ` chunk it sees and
//! stopping at the first `data` chunk. Everything else is skipped without being read.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use fallible_streaming_iterator::FallibleStreamingIterator;
use log::{debug, trace, warn};

use crate::bytes::{u16_le, u32_le};
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::format::{AudioFormat, DataExtent, FormatDescriptor, FormatExtension, FormatFields};

const RIFF_ID: [u8; 4] = *b"RIFF";
const RF64_ID: [u8; 4] = *b"RF64";
const WAVE_ID: [u8; 4] = *b"WAVE";
const FMT_ID: [u8; 4] = *b"fmt ";
const DATA_ID: [u8; 4] = *b"data";

/// Minimum `fmt ` body: the classic WAVEFORMAT fields.
const FMT_MIN_SIZE: u32 = 16;
/// `fmt ` body size that carries a full WAVEFORMATEXTENSIBLE tail.
const FMT_EXTENSIBLE_SIZE: u32 = 40;

/// The 12-byte outer header.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RiffHeader {
    magic: [u8; 4],
    size: [u8; 4],
    form: [u8; 4],
}

/// A subchunk id and its declared payload length.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub(crate) struct ChunkHeader {
    id: [u8; 4],
    size: [u8; 4],
}

impl ChunkHeader {
    pub fn id(&self) -> &[u8; 4] {
        &self.id
    }

    pub fn size(&self) -> u32 {
        u32_le(self.size)
    }

    /// Payload length rounded up to the RIFF word boundary.
    pub fn padded_size(&self) -> u64 {
        let size = self.size() as u64;
        size + (size & 1)
    }
}

/// The 16 leading bytes of a `fmt ` chunk.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RawFormat {
    audio_format: [u8; 2],
    channels: [u8; 2],
    sample_rate: [u8; 4],
    byte_rate: [u8; 4],
    block_align: [u8; 2],
    bits_per_sample: [u8; 2],
}

/// Bytes 16..40 of an extensible `fmt ` chunk.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RawExtension {
    cb_size: [u8; 2],
    valid_bits_per_sample: [u8; 2],
    channel_mask: [u8; 4],
    sub_format: [u8; 16],
}

impl From<RawFormat> for FormatFields {
    fn from(raw: RawFormat) -> Self {
        Self {
            audio_format: AudioFormat::from_tag(u16_le(raw.audio_format)),
            channels: u16_le(raw.channels),
            sample_rate: u32_le(raw.sample_rate),
            byte_rate: u32_le(raw.byte_rate),
            block_align: u16_le(raw.block_align),
            bits_per_sample: u16_le(raw.bits_per_sample),
            extension: None,
        }
    }
}

impl From<RawExtension> for FormatExtension {
    fn from(raw: RawExtension) -> Self {
        Self {
            valid_bits_per_sample: u16_le(raw.valid_bits_per_sample),
            channel_mask: u32_le(raw.channel_mask),
            sub_format: raw.sub_format,
        }
    }
}

/// Walks the subchunks of a RIFF body, yielding each chunk header in turn.
///
/// A header that cannot be read in full ends the iteration instead of failing it.
struct ChunkParser<'a, R: Read + Seek> {
    reader: &'a mut R,
    position: u64,
    current: Option<ChunkHeader>,
    exhausted: bool,
}

impl<'a, R: Read + Seek> ChunkParser<'a, R> {
    fn new(reader: &'a mut R, position: u64) -> Self {
        Self {
            reader,
            position,
            current: None,
            exhausted: false,
        }
    }

    /// Absolute stream position of the next unread byte.
    fn position(&self) -> u64 {
        self.position
    }

    /// Skips `n` bytes. Seeking past the end of the stream is not an error here; the next
    /// header read comes up short and ends the scan.
    fn skip_bytes(&mut self, n: u64) -> Result<()> {
        if n > 0 {
            self.reader.seek_relative(n as i64)?;
            self.position += n;
        }
        Ok(())
    }

    /// Reads the body of a `fmt ` chunk of the given declared size and leaves the stream at
    /// the start of the next chunk header.
    fn read_format(&mut self, header: &ChunkHeader) -> Result<FormatFields> {
        let size = header.size();
        if size < FMT_MIN_SIZE {
            return Err(Error::MalformedFormat("fmt chunk smaller than 16 bytes"));
        }

        let raw: RawFormat = bytemuck::cast(self.read_fmt_bytes::<16>()?);
        let mut consumed = FMT_MIN_SIZE as u64;
        let mut fields = FormatFields::from(raw);

        if fields.audio_format == AudioFormat::Extensible && size >= FMT_EXTENSIBLE_SIZE {
            let raw: RawExtension = bytemuck::cast(self.read_fmt_bytes::<24>()?);
            consumed += 24;
            let extension = FormatExtension::from(raw);
            match extension.resolve() {
                Some(resolved) => fields.audio_format = resolved,
                None => warn!(
                    "unrecognized extensible subformat {:02X?}, leaving format unresolved",
                    extension.sub_format
                ),
            }
            fields.extension = Some(extension);
        }

        self.skip_bytes(header.padded_size() - consumed)?;
        Ok(fields)
    }

    fn read_fmt_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::MalformedFormat("truncated fmt chunk"),
            _ => Error::Io(e),
        })?;
        self.position += N as u64;
        Ok(buf)
    }
}

impl<R: Read + Seek> FallibleStreamingIterator for ChunkParser<'_, R> {
    type Item = ChunkHeader;
    type Error = Error;

    fn advance(&mut self) -> Result<()> {
        self.current = None;
        if self.exhausted {
            return Ok(());
        }

        let mut raw = [0u8; 8];
        match self.reader.read_exact(&mut raw) {
            Ok(()) => {
                self.position += 8;
                self.current = Some(bytemuck::cast(raw));
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => self.exhausted = true,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn get(&self) -> Option<&ChunkHeader> {
        self.current.as_ref()
    }
}

fn read_riff_header<R: Read>(reader: &mut R) -> Result<RiffHeader> {
    let mut raw = [0u8; 12];
    reader.read_exact(&mut raw).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::MalformedContainer("truncated RIFF header"),
        _ => Error::Io(e),
    })?;

    let header: RiffHeader = bytemuck::cast(raw);
    if header.magic != RIFF_ID && header.magic != RF64_ID {
        return Err(Error::MalformedContainer("missing RIFF or RF64 tag"));
    }
    if header.form != WAVE_ID {
        return Err(Error::MalformedContainer("missing WAVE form type"));
    }
    Ok(header)
}

/// Parses a WAVE stream positioned at its first byte.
fn parse<R: Read + Seek>(reader: &mut R, path: PathBuf) -> Result<FormatDescriptor> {
    let riff = read_riff_header(reader)?;
    let riff_size = u32_le(riff.size);
    let start = reader.stream_position()?;

    let mut format: Option<FormatFields> = None;
    let mut data: Option<DataExtent> = None;
    let mut parser = ChunkParser::new(reader, start);

    loop {
        let header = match parser.next()? {
            Some(header) => *header,
            None => break,
        };
        trace!(
            "chunk '{}' ({} bytes) at offset {}",
            header.id().escape_ascii(),
            header.size(),
            parser.position() - 8
        );

        match *header.id() {
            FMT_ID => {
                let fields = parser.read_format(&header)?;
                if format.is_some() {
                    warn!("{}: repeated fmt chunk replaces the earlier one", path.display());
                }
                format = Some(fields);
            }
            DATA_ID => {
                data = Some(DataExtent {
                    offset: parser.position(),
                    size: header.size(),
                });
                break;
            }
            _ => parser.skip_bytes(header.padded_size())?,
        }
    }

    let descriptor = FormatDescriptor::try_from_parts(path, riff_size, format, data)?;
    debug!(
        "{}: {} Hz, {} ch, {} bits, tag 0x{:04X}, {} payload bytes at {}",
        descriptor.path().display(),
        descriptor.sample_rate(),
        descriptor.channels(),
        descriptor.bits_per_sample(),
        descriptor.audio_format().tag(),
        descriptor.data_size(),
        descriptor.data_offset()
    );
    Ok(descriptor)
}

impl FormatDescriptor {
    /// Opens and parses the WAVE file at `path`.
    ///
    /// # Errors
    /// Fails if the file cannot be opened, is not a RIFF/WAVE container, carries a missing or
    /// inconsistent `fmt ` chunk, or has no non-empty `data` chunk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &ReaderConfig::default())
    }

    /// Like [`FormatDescriptor::open`] with explicit reader settings.
    pub fn open_with(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::with_capacity(config.effective_capacity(), file);
        parse(&mut reader, path.to_path_buf())
    }

    /// Parses a WAVE stream from any seekable source positioned at its first byte.
    ///
    /// `label` is recorded as the descriptor's path. Offsets are absolute within `source`.
    pub fn from_reader<R: Read + Seek>(mut source: R, label: impl Into<PathBuf>) -> Result<Self> {
        parse(&mut source, label.into())
    }
}
