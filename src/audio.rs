//! PCM output buffer.
//!
//! A fixed-capacity, single-precision, non-interleaved buffer.  The pipeline
//! allocates one per call with capacity equal to the vocoder's sample count and
//! hands ownership to the caller.

use std::path::Path;

use tracing::info;

use crate::error::{TtsError, TtsResult};

/// Sample layout of a [`PcmBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    pub const fn mono(sample_rate: u32) -> Self {
        Self { sample_rate, channels: 1 }
    }
}

/// Mono float PCM audio.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    format: AudioFormat,
    frame_capacity: usize,
    frame_length: usize,
    data: Vec<f32>,
}

impl PcmBuffer {
    /// Allocate a zeroed buffer of `frame_capacity` frames with length 0.
    ///
    /// Fails with `AudioBufferCreationFailed` for a zero capacity or when the
    /// allocation cannot be satisfied.
    pub fn with_capacity(format: AudioFormat, frame_capacity: usize) -> TtsResult<Self> {
        if frame_capacity == 0 || format.channels != 1 {
            return Err(TtsError::AudioBufferCreationFailed);
        }
        let mut data = Vec::new();
        data.try_reserve_exact(frame_capacity)
            .map_err(|_| TtsError::AudioBufferCreationFailed)?;
        data.resize(frame_capacity, 0.0);
        Ok(Self { format, frame_capacity, frame_length: 0, data })
    }

    /// Allocate a buffer sized to `samples` and fill it completely.
    pub fn from_samples(format: AudioFormat, samples: &[f32]) -> TtsResult<Self> {
        let mut buffer = Self::with_capacity(format, samples.len())?;
        buffer.set_frame_length(buffer.frame_capacity())?;
        buffer.channel_data_mut().copy_from_slice(samples);
        Ok(buffer)
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.format.channels
    }

    pub fn frame_capacity(&self) -> usize {
        self.frame_capacity
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    /// Mark the first `frames` frames as valid.
    pub fn set_frame_length(&mut self, frames: usize) -> TtsResult<()> {
        if frames > self.frame_capacity {
            return Err(TtsError::AudioBufferCreationFailed);
        }
        self.frame_length = frames;
        Ok(())
    }

    /// Valid samples.
    pub fn samples(&self) -> &[f32] {
        &self.data[..self.frame_length]
    }

    /// Writable view of the valid frames.
    pub fn channel_data_mut(&mut self) -> &mut [f32] {
        &mut self.data[..self.frame_length]
    }

    pub fn into_samples(mut self) -> Vec<f32> {
        self.data.truncate(self.frame_length);
        self.data
    }

    pub fn duration_secs(&self) -> f32 {
        self.frame_length as f32 / self.format.sample_rate as f32
    }

    /// Write the valid samples to a 16-bit PCM WAV file.
    ///
    /// 16-bit PCM rather than 32-bit float: Android's `MediaPlayer` does not
    /// reliably decode IEEE-float WAV.
    pub fn write_wav(&self, output_path: &Path) -> TtsResult<()> {
        let spec = hound::WavSpec {
            channels: self.format.channels,
            sample_rate: self.format.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(output_path, spec)?;
        for &s in self.samples() {
            // f32 [-1.0, 1.0] → i16 [-32768, 32767].
            let s16 = (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            writer.write_sample(s16)?;
        }
        writer.finalize()?;
        info!(
            samples = self.frame_length,
            seconds = self.duration_secs(),
            path = %output_path.display(),
            "saved WAV"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FMT: AudioFormat = AudioFormat::mono(22_050);

    #[test]
    fn test_from_samples_fills_capacity() {
        let buf = PcmBuffer::from_samples(FMT, &[0.1, -0.2, 0.3]).unwrap();
        assert_eq!(buf.frame_capacity(), 3);
        assert_eq!(buf.frame_length(), 3);
        assert_eq!(buf.samples(), &[0.1, -0.2, 0.3]);
        assert_eq!(buf.sample_rate(), 22_050);
        assert_eq!(buf.channels(), 1);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = PcmBuffer::from_samples(FMT, &[]).unwrap_err();
        assert!(matches!(err, TtsError::AudioBufferCreationFailed));
    }

    #[test]
    fn test_frame_length_bounded_by_capacity() {
        let mut buf = PcmBuffer::with_capacity(FMT, 4).unwrap();
        assert_eq!(buf.frame_length(), 0);
        assert!(buf.samples().is_empty());
        assert!(buf.set_frame_length(5).is_err());
        buf.set_frame_length(2).unwrap();
        assert_eq!(buf.into_samples(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_duration() {
        let buf = PcmBuffer::from_samples(FMT, &vec![0.0; 22_050]).unwrap();
        assert!((buf.duration_secs() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_write_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let buf = PcmBuffer::from_samples(FMT, &[0.0, 1.0, -1.0, 2.0]).unwrap();
        buf.write_wav(&path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples, vec![0, i16::MAX, -i16::MAX, i16::MAX]);
    }
}
