//! Per-turn WAV files.
//!
//! Each captured utterance can be written as `recording_<timestamp>.wav`
//! (mono, 16-bit) and is removed once the turn is transcribed unless the
//! store was configured to keep recordings.

use std::path::{Path, PathBuf};

use chrono::Local;
use sleepcoach_core::error::CoachError;

use crate::AudioClip;

fn wav_error(context: &str, err: hound::Error) -> CoachError {
    CoachError::Audio(format!("{context}: {err}"))
}

/// Writes, reads and cleans up per-turn WAV recordings.
#[derive(Debug, Clone)]
pub struct RecordingStore {
    dir: PathBuf,
    keep: bool,
}

impl RecordingStore {
    pub fn new(dir: impl Into<PathBuf>, keep: bool) -> Self {
        Self {
            dir: dir.into(),
            keep,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn keeps_recordings(&self) -> bool {
        self.keep
    }

    /// Write a clip to a timestamped WAV file and return its path.
    pub fn save(&self, clip: &AudioClip) -> Result<PathBuf, CoachError> {
        std::fs::create_dir_all(&self.dir)?;
        let filename = format!("recording_{}.wav", Local::now().format("%Y%m%d_%H%M%S"));
        let path = self.dir.join(filename);

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: clip.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec)
            .map_err(|e| wav_error("Failed to create WAV file", e))?;
        for sample in &clip.samples {
            writer
                .write_sample(*sample)
                .map_err(|e| wav_error("Failed to write WAV sample", e))?;
        }
        writer
            .finalize()
            .map_err(|e| wav_error("Failed to finalize WAV file", e))?;

        tracing::debug!(path = %path.display(), samples = clip.samples.len(), "Recording saved");
        Ok(path)
    }

    /// Read a mono 16-bit WAV file back into a clip.
    pub fn read(path: &Path) -> Result<AudioClip, CoachError> {
        let mut reader =
            hound::WavReader::open(path).map_err(|e| wav_error("Failed to open WAV file", e))?;
        let spec = reader.spec();
        if spec.channels != 1 || spec.bits_per_sample != 16 {
            return Err(CoachError::Audio(format!(
                "Expected mono 16-bit WAV, got {} channel(s) at {} bits",
                spec.channels, spec.bits_per_sample
            )));
        }
        let samples = reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| wav_error("Failed to read WAV samples", e))?;
        Ok(AudioClip::new(samples, spec.sample_rate))
    }

    /// Remove a recording after its turn, unless recordings are kept.
    ///
    /// Returns `true` when the file was removed.
    pub fn discard(&self, path: &Path) -> Result<bool, CoachError> {
        if self.keep {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordingStore::new(dir.path(), false);
        let clip = AudioClip::new(vec![0, 1200, -1200, i16::MAX, i16::MIN], 16_000);

        let path = store.save(&clip).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("recording_"));
        assert!(name.ends_with(".wav"));

        let loaded = RecordingStore::read(&path).unwrap();
        assert_eq!(loaded, clip);
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordingStore::new(dir.path().join("turns"), true);
        let path = store.save(&AudioClip::new(vec![0; 160], 8_000)).unwrap();
        assert!(path.exists());
        assert_eq!(store.dir(), dir.path().join("turns"));
    }

    #[test]
    fn test_discard_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordingStore::new(dir.path(), false);
        let path = store.save(&AudioClip::new(vec![0; 160], 16_000)).unwrap();
        assert!(store.discard(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_discard_keeps_file_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordingStore::new(dir.path(), true);
        assert!(store.keeps_recordings());
        let path = store.save(&AudioClip::new(vec![0; 160], 16_000)).unwrap();
        assert!(!store.discard(&path).unwrap());
        assert!(path.exists());
    }

    #[test]
    fn test_read_rejects_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        let err = RecordingStore::read(&path).unwrap_err();
        assert!(matches!(err, CoachError::Audio(_)));
    }

    #[test]
    fn test_read_missing_file() {
        assert!(RecordingStore::read(Path::new("/no/such/recording.wav")).is_err());
    }
}
