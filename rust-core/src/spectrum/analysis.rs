//! Static spectrum snapshot
//!
//! Combines windowing with the FFT engine and normalizes magnitudes to the
//! slice's own peak, in dB

use super::fft::{FftEngine, SpectrumError};
use super::windowing::{apply_window, WindowType};

/// Spectrum analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// FFT size (number of samples, non-zero)
    pub fft_size: usize,

    /// Window type for spectral analysis
    pub window_type: WindowType,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

/// Peak-normalized magnitude spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Bin frequencies in Hz
    pub frequencies: Vec<f64>,

    /// 20*log10(|X| / max|X|), index-aligned with `frequencies`
    pub magnitudes_db: Vec<f64>,

    /// Set when every magnitude was zero and the curve is flat 0 dB
    pub degenerate: bool,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency of the 0 dB bin (first one on ties), None if degenerate
    pub fn peak_frequency(&self) -> Option<f64> {
        if self.degenerate {
            return None;
        }
        self.magnitudes_db
            .iter()
            .position(|&db| db == 0.0)
            .map(|idx| self.frequencies[idx])
    }
}

/// Static spectrum analyzer
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    fft_engine: FftEngine,
}

impl SpectrumAnalyzer {
    /// Create new spectrum analyzer
    pub fn new(config: AnalyzerConfig) -> Self {
        let fft_engine = FftEngine::new(config.fft_size);
        Self { config, fft_engine }
    }

    /// Window, transform and peak-normalize a slice
    ///
    /// The analysis window is generated for `slice.len()` samples before the
    /// slice is fitted to the FFT size.
    pub fn analyze(&mut self, slice: &[f64]) -> Result<Spectrum, SpectrumError> {
        let windowed = apply_window(slice, self.config.window_type);
        let magnitudes = self.fft_engine.compute_magnitude(&windowed)?;
        let (magnitudes_db, degenerate) = normalize_to_peak_db(&magnitudes);

        if degenerate {
            log::warn!(
                "Degenerate spectrum ({} samples, all-zero magnitude); emitting flat 0 dB curve",
                slice.len()
            );
        }

        Ok(Spectrum {
            frequencies: self.frequency_bins_hz(),
            magnitudes_db,
            degenerate,
        })
    }

    /// Get frequency bins in Hz
    pub fn frequency_bins_hz(&self) -> Vec<f64> {
        self.fft_engine
            .frequency_axis_hz(self.config.sample_rate as f64)
    }
}

/// Convert magnitudes to dB relative to their own maximum
///
/// Returns the dB curve and whether the input was degenerate (peak == 0),
/// in which case the curve is all zeros instead of -inf/NaN.
pub fn normalize_to_peak_db(magnitudes: &[f64]) -> (Vec<f64>, bool) {
    let peak = magnitudes.iter().copied().fold(0.0f64, f64::max);

    if peak > 0.0 {
        let db = magnitudes
            .iter()
            .map(|&mag| 20.0 * (mag / peak).log10())
            .collect();
        (db, false)
    } else {
        (vec![0.0; magnitudes.len()], true)
    }
}

/// One-shot static spectrum of a slice
///
/// # Arguments
/// * `slice` - Raw (unwindowed) samples
/// * `window_type` - Analysis window applied over the whole slice
/// * `fft_size` - Transform length; the slice is zero-padded or truncated to it
/// * `sample_rate` - Sample rate in Hz, for the frequency axis
pub fn static_spectrum(
    slice: &[f64],
    window_type: WindowType,
    fft_size: usize,
    sample_rate: u32,
) -> Result<Spectrum, SpectrumError> {
    if fft_size == 0 {
        return Err(SpectrumError::InvalidFftSize(fft_size));
    }

    let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig {
        fft_size,
        window_type,
        sample_rate,
    });
    analyzer.analyze(slice)
}
