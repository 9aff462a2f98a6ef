use std::path::Path;

use anyhow::Context;

use super::frame::StereoFrame;

// Decoded audio, already converted to the output device's rate.
#[derive(Clone, Debug, Default)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>,
}

impl SampleBuffer {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Interpolated read at a fractional frame position. Past the end reads
    // silence.
    #[inline]
    pub fn read(&self, pos: f32) -> StereoFrame {
        if pos < 0.0 {
            return StereoFrame::zero();
        }
        let i = pos as usize;
        let Some(&a) = self.data.get(i) else {
            return StereoFrame::zero();
        };
        let b = self.data.get(i + 1).copied().unwrap_or(a);
        StereoFrame::lerp(a, b, pos - i as f32)
    }

    // Decode a WAV file into stereo frames at `target_rate`
    pub fn load_wav(path: &Path, target_rate: u32, target_channels: u16) -> anyhow::Result<Self> {
        if target_channels != 2 {
            anyhow::bail!("only stereo output is supported, got {target_channels} channels");
        }
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let frames: Vec<StereoFrame> = match channels {
            1 => samples.into_iter().map(StereoFrame::mono).collect(),
            // extra channels beyond the first two are dropped
            n => samples
                .chunks_exact(n)
                .map(|c| StereoFrame {
                    left: c[0],
                    right: c[1],
                })
                .collect(),
        };

        Ok(Self {
            data: resample_linear(&frames, spec.sample_rate, target_rate),
        })
    }
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    if source_rate == target_rate || source_rate == 0 || frames.is_empty() {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let last = frames[frames.len() - 1];

    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx = src_pos.floor() as usize;
            if idx + 1 >= frames.len() {
                last
            } else {
                StereoFrame::lerp(frames[idx], frames[idx + 1], (src_pos - idx as f64) as f32)
            }
        })
        .collect()
}
