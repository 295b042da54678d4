//! Owned output of a decode call.

use std::ops::Deref;
use std::slice::ChunksExact;

use aligned_vec::{AVec, CACHELINE_ALIGN};

/// Normalized, channel-interleaved samples.
///
/// Sample `channel` of frame `frame` lives at index `frame * channels + channel`. Storage is
/// cache-line aligned so the buffer can be handed to vectorized spectral code as-is.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: AVec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Allocates `frames * channels` zeroed samples.
    pub(crate) fn zeroed(channels: u16, sample_rate: u32, frames: usize) -> Self {
        let len = frames * channels as usize;
        Self {
            samples: AVec::from_iter(CACHELINE_ALIGN, std::iter::repeat(0.0f32).take(len)),
            channels,
            sample_rate,
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of complete frames held.
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// All samples, interleaved.
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    /// The samples of one frame, one per channel.
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        let channels = self.channels as usize;
        let start = index.checked_mul(channels)?;
        self.samples.get(start..start.checked_add(channels)?)
    }

    /// Iterates over frames in order.
    pub fn frames(&self) -> ChunksExact<'_, f32> {
        self.samples.chunks_exact(self.channels.max(1) as usize)
    }

    /// Iterates over the samples of a single channel.
    pub fn channel(&self, channel: u16) -> impl Iterator<Item = f32> + '_ {
        let valid = channel < self.channels;
        self.frames()
            .filter(move |_| valid)
            .map(move |frame| frame[channel as usize])
    }

    /// Copies the samples into an ordinary `Vec`.
    pub fn into_vec(self) -> Vec<f32> {
        self.samples.to_vec()
    }
}

impl Deref for SampleBuffer {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.samples
    }
}

impl AsRef<[f32]> for SampleBuffer {
    fn as_ref(&self) -> &[f32] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo(values: &[f32]) -> SampleBuffer {
        let mut buffer = SampleBuffer::zeroed(2, 48000, values.len() / 2);
        buffer.as_mut_slice().copy_from_slice(values);
        buffer
    }

    #[test]
    fn zeroed_buffer_is_aligned_and_sized() {
        let buffer = SampleBuffer::zeroed(3, 8000, 5);
        assert_eq!(buffer.len(), 15);
        assert_eq!(buffer.frame_count(), 5);
        assert!(buffer.iter().all(|&s| s == 0.0));
        assert_eq!(buffer.as_ptr() as usize % CACHELINE_ALIGN, 0);
    }

    #[test]
    fn frames_and_channels_follow_interleaving() {
        let buffer = stereo(&[0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);
        assert_eq!(buffer.frame(1), Some(&[0.2, -0.2][..]));
        assert_eq!(buffer.frame(3), None);
        assert_eq!(buffer.frames().count(), 3);
        assert_eq!(buffer.channel(1).collect::<Vec<_>>(), vec![-0.1, -0.2, -0.3]);
        assert_eq!(buffer.channel(2).count(), 0);
        assert_eq!(buffer.into_vec(), vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);
    }
}
