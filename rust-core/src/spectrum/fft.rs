//! FFT engine using realfft for real-valued signals
//!
//! Fixed-size one-sided transform with explicit padding/truncation semantics

use num_complex::Complex;
use realfft::{FftError, RealFftPlanner, RealToComplex};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectrumError {
    #[error("FFT processing failed: {0}")]
    Fft(#[from] FftError),

    #[error("FFT size must be non-zero (got {0})")]
    InvalidFftSize(usize),

    #[error("Invalid STFT framing: segment length {segment_length}, overlap {overlap}")]
    InvalidSegment {
        segment_length: usize,
        overlap: usize,
    },
}

/// FFT engine for real-valued signals
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Reusable input buffer
    input_buffer: Vec<f64>,

    /// Reusable output buffer (complex spectrum)
    output_buffer: Vec<Complex<f64>>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples, must be non-zero)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        let input_buffer = r2c.make_input_vec();
        let output_buffer = r2c.make_output_vec();

        Self {
            fft_size,
            r2c,
            input_buffer,
            output_buffer,
        }
    }

    /// Compute FFT and return magnitude spectrum
    ///
    /// The signal is fitted to `fft_size` before transforming:
    /// * shorter signals are zero-padded at the end
    /// * longer signals are truncated, keeping the first `fft_size` samples
    ///
    /// Padding interpolates the spectrum without adding resolution; truncation
    /// discards the tail of the slice entirely.
    ///
    /// # Returns
    /// Magnitude spectrum |X[k]| for k = 0..=fft_size/2
    pub fn compute_magnitude(&mut self, signal: &[f64]) -> Result<Vec<f64>, SpectrumError> {
        self.transform(signal)?;
        Ok(self.output_buffer.iter().map(|c| c.norm()).collect())
    }

    /// Compute power spectrum |X[k]|², same padding rules as [`compute_magnitude`]
    ///
    /// [`compute_magnitude`]: FftEngine::compute_magnitude
    pub fn compute_power(&mut self, signal: &[f64]) -> Result<Vec<f64>, SpectrumError> {
        self.transform(signal)?;
        Ok(self.output_buffer.iter().map(|c| c.norm_sqr()).collect())
    }

    fn transform(&mut self, signal: &[f64]) -> Result<(), SpectrumError> {
        // Copy signal to input buffer with zero-padding
        let copy_len = signal.len().min(self.fft_size);
        self.input_buffer[..copy_len].copy_from_slice(&signal[..copy_len]);
        self.input_buffer[copy_len..].fill(0.0);

        self.r2c
            .process(&mut self.input_buffer, &mut self.output_buffer)?;

        Ok(())
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Convert bin index to frequency in Hz
    pub fn bin_to_hz(&self, bin: usize, sample_rate: f64) -> f64 {
        bin as f64 * sample_rate / self.fft_size as f64
    }

    /// Frequency axis in Hz: k * sample_rate / fft_size
    pub fn frequency_axis_hz(&self, sample_rate: f64) -> Vec<f64> {
        (0..self.num_bins())
            .map(|bin| self.bin_to_hz(bin, sample_rate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_fft_dc_signal() {
        let mut fft = FftEngine::new(1024);

        // DC signal (constant), zero-padded from 100 to 1024 samples
        let signal = vec![1.0; 100];
        let spectrum = fft.compute_magnitude(&signal).unwrap();

        assert_eq!(spectrum.len(), 513);
        assert!((spectrum[0] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_fft_sine_wave() {
        let mut fft = FftEngine::new(1024);

        // 64 cycles over 1024 samples lands exactly on bin 64
        let signal: Vec<f64> = (0..1024)
            .map(|n| (2.0 * PI * 64.0 * n as f64 / 1024.0).sin())
            .collect();

        let spectrum = fft.compute_magnitude(&signal).unwrap();

        let (peak_bin, &peak_mag) = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();

        assert_eq!(peak_bin, 64);

        // Peak magnitude should be N/2 for a unit sine
        assert!((peak_mag - 512.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_padding_matches_explicit_padding() {
        let mut fft = FftEngine::new(256);

        let short: Vec<f64> = (0..100).map(|n| (n as f64 * 0.3).cos()).collect();
        let mut padded = short.clone();
        padded.resize(256, 0.0);

        let a = fft.compute_magnitude(&short).unwrap();
        let b = fft.compute_magnitude(&padded).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_truncation_keeps_leading_samples() {
        let mut fft = FftEngine::new(128);

        let long: Vec<f64> = (0..500).map(|n| (n as f64 * 0.1).sin()).collect();
        let head = &long[..128];

        let a = fft.compute_magnitude(&long).unwrap();
        let b = fft.compute_magnitude(head).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_power_is_magnitude_squared() {
        let mut fft = FftEngine::new(64);
        let signal: Vec<f64> = (0..64).map(|n| (n % 5) as f64).collect();

        let mag = fft.compute_magnitude(&signal).unwrap();
        let power = fft.compute_power(&signal).unwrap();

        for (m, p) in mag.iter().zip(power.iter()) {
            assert!((m * m - p).abs() < 1e-6 * p.max(1.0));
        }
    }

    #[test]
    fn test_frequency_axis() {
        let fft = FftEngine::new(4096);
        let freqs = fft.frequency_axis_hz(16000.0);

        assert_eq!(freqs.len(), 2049);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1] - 16000.0 / 4096.0).abs() < 1e-12);
        assert!((freqs[2048] - 8000.0).abs() < 1e-9);
    }
}
