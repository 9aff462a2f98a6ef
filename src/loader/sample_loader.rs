use std::path::PathBuf;

use anyhow::Context;

use crate::audio::SampleBuffer;

/// Source of decoded sample assets. The loader calls this from worker threads,
/// once per sampled pitch.
pub trait SampleFetcher: Send + Sync {
    fn fetch(&self, instrument: &str, file_name: &str) -> anyhow::Result<SampleBuffer>;
}

// Reads <root>/<instrument>/<file> from disk and decodes it for the output rate
pub struct FsFetcher {
    root: PathBuf,
    sample_rate: u32,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            root: root.into(),
            sample_rate,
        }
    }

    pub fn path_for(&self, instrument: &str, file_name: &str) -> PathBuf {
        self.root.join(instrument).join(file_name)
    }
}

impl SampleFetcher for FsFetcher {
    fn fetch(&self, instrument: &str, file_name: &str) -> anyhow::Result<SampleBuffer> {
        let path = self.path_for(instrument, file_name);
        SampleBuffer::load_wav(&path, self.sample_rate, 2)
            .with_context(|| format!("reading {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_tone(path: &Path, rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut w = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let s = ((i as f32 * 0.05).sin() * 8000.0) as i16;
            w.write_sample(s).unwrap();
        }
        w.finalize().unwrap();
    }

    #[test]
    fn reads_from_instrument_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_tone(&dir.path().join("piano").join("As4.wav"), 44100, 100);

        let fetcher = FsFetcher::new(dir.path(), 44100);
        let buffer = fetcher.fetch("piano", "As4.wav").unwrap();
        assert_eq!(buffer.data.len(), 100);
        // mono is duplicated into both channels
        assert_eq!(buffer.data[10].left, buffer.data[10].right);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new(dir.path(), 44100);
        let err = fetcher.fetch("piano", "C4.wav").unwrap_err();
        assert!(format!("{err:#}").contains("C4.wav"));
    }

    #[test]
    fn resamples_to_output_rate() {
        let dir = tempfile::tempdir().unwrap();
        write_tone(&dir.path().join("flute").join("C4.wav"), 22050, 100);
        let buffer = FsFetcher::new(dir.path(), 44100).fetch("flute", "C4.wav").unwrap();
        assert_eq!(buffer.data.len(), 200);
    }
}
