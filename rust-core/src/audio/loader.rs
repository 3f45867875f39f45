//! WAV loading with hound
//!
//! Reads a PCM waveform into a mono `Recording`, keeping only the first channel
//! and the file's native sample scale

use hound::{SampleFormat, WavReader};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("File not found: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("File contains no samples: {}", .0.display())]
    Empty(PathBuf),

    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("Unsupported sample format: {bits}-bit {format:?}")]
    UnsupportedFormat { format: SampleFormat, bits: u16 },

    #[error("Recording '{0}' has no samples")]
    NoSamples(String),

    #[error("Sample rate must be positive")]
    ZeroSampleRate,
}

/// Mono recording held in memory for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    label: String,
    sample_rate: u32,
    samples: Vec<f64>,
}

impl Recording {
    /// Create a recording from mono samples
    ///
    /// Rejects an empty sample vector and a zero sample rate.
    pub fn new(label: impl Into<String>, sample_rate: u32, samples: Vec<f64>) -> Result<Self, AudioError> {
        let label = label.into();
        if sample_rate == 0 {
            return Err(AudioError::ZeroSampleRate);
        }
        if samples.is_empty() {
            return Err(AudioError::NoSamples(label));
        }

        Ok(Self {
            label,
            sample_rate,
            samples,
        })
    }

    /// Silent stand-in with the same length and rate as `other`
    pub fn silent_like(other: &Recording, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sample_rate: other.sample_rate,
            samples: vec![0.0; other.samples.len()],
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed recording
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }
}

/// Header-level description of a WAV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sample_format: SampleFormat,

    /// Number of frames (samples per channel)
    pub frames: u32,
}

impl WavInfo {
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    /// Sample type name, e.g. "int16" or "float32"
    pub fn format_name(&self) -> String {
        match self.sample_format {
            SampleFormat::Int => format!("int{}", self.bits_per_sample),
            SampleFormat::Float => format!("float{}", self.bits_per_sample),
        }
    }
}

fn open(path: &Path) -> Result<WavReader<std::io::BufReader<std::fs::File>>, AudioError> {
    if !path.exists() {
        return Err(AudioError::FileMissing(path.to_path_buf()));
    }

    WavReader::open(path).map_err(|source| AudioError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Read WAV header information without decoding samples
pub fn probe(path: impl AsRef<Path>) -> Result<WavInfo, AudioError> {
    let path = path.as_ref();
    let reader = open(path)?;
    let spec = reader.spec();

    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        sample_format: spec.sample_format,
        frames: reader.duration(),
    })
}

/// Load a WAV file as a mono recording
///
/// # Arguments
/// * `path` - WAV file path
/// * `label` - Display label (also used in CSV column names)
///
/// # Returns
/// Recording with the first channel's samples in their native scale
pub fn load(path: impl AsRef<Path>, label: impl Into<String>) -> Result<Recording, AudioError> {
    let path = path.as_ref();
    let reader = open(path)?;
    let spec = reader.spec();

    let samples = first_channel(reader, path)?;
    if samples.is_empty() {
        return Err(AudioError::Empty(path.to_path_buf()));
    }

    log::info!(
        "Loaded {} ({} Hz, {} samples, {} channel(s), {}-bit {:?})",
        path.display(),
        spec.sample_rate,
        samples.len(),
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );
    if spec.channels > 1 {
        log::info!("Converted {} to mono (first channel)", path.display());
    }

    Recording::new(label, spec.sample_rate, samples)
}

/// Decode interleaved samples and keep channel 0
fn first_channel<R: Read>(mut reader: WavReader<R>, path: &Path) -> Result<Vec<f64>, AudioError> {
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;
    let decode_err = |source| AudioError::Decode {
        path: path.to_path_buf(),
        source,
    };

    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8..=32) => reader
            .samples::<i32>()
            .step_by(channels)
            .map(|s| s.map(|v| v as f64).map_err(decode_err))
            .collect(),
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .step_by(channels)
            .map(|s| s.map(|v| v as f64).map_err(decode_err))
            .collect(),
        (format, bits) => Err(AudioError::UnsupportedFormat { format, bits }),
    }
}
