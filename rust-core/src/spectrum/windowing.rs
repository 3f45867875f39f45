//! Analysis window functions
//!
//! Applies windows to time-domain slices before FFT to reduce spectral leakage
//! from the slice's hard edges.

use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/M)
    /// Sidelobe attenuation: ~31 dB (first sidelobe)
    #[default]
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/M)
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/M) + 0.08*cos(4πn/M)
    Blackman,

    /// Rectangular window (no windowing)
    Rectangular,
}

impl WindowType {
    /// Short lowercase name, as accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            WindowType::Hann => "hann",
            WindowType::Hamming => "hamming",
            WindowType::Blackman => "blackman",
            WindowType::Rectangular => "rectangular",
        }
    }
}

/// Generate periodic (DFT-even) window coefficients
///
/// The periodic form is the symmetric window of length M+1 with its last
/// sample dropped, which is the conventional choice for spectral analysis.
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    if length == 1 {
        return vec![1.0];
    }

    let m = length as f64;

    match window_type {
        WindowType::Hann => (0..length)
            .map(|n| {
                let angle = 2.0 * PI * n as f64 / m;
                0.5 - 0.5 * angle.cos()
            })
            .collect(),

        WindowType::Hamming => (0..length)
            .map(|n| {
                let angle = 2.0 * PI * n as f64 / m;
                0.54 - 0.46 * angle.cos()
            })
            .collect(),

        WindowType::Blackman => (0..length)
            .map(|n| {
                let angle1 = 2.0 * PI * n as f64 / m;
                let angle2 = 4.0 * PI * n as f64 / m;
                0.42 - 0.5 * angle1.cos() + 0.08 * angle2.cos()
            })
            .collect(),

        WindowType::Rectangular => vec![1.0; length],
    }
}

/// Apply window to signal
///
/// # Arguments
/// * `signal` - Input signal
/// * `window_type` - Type of window to apply
///
/// # Returns
/// Windowed signal (the spectral slice)
pub fn apply_window(signal: &[f64], window_type: WindowType) -> Vec<f64> {
    let window = generate_window(window_type, signal.len());

    signal
        .iter()
        .zip(window.iter())
        .map(|(&s, &w)| s * w)
        .collect()
}

/// Apply precomputed window coefficients in-place
pub fn apply_window_inplace(signal: &mut [f64], window: &[f64]) {
    for (s, w) in signal.iter_mut().zip(window.iter()) {
        *s *= w;
    }
}
