//! Spectral analysis with FFT

pub mod fft;
pub mod windowing;
pub mod analysis;
pub mod stft;

pub use fft::{FftEngine, SpectrumError};
pub use windowing::{apply_window, generate_window, WindowType};
pub use analysis::{static_spectrum, Spectrum, SpectrumAnalyzer};
pub use stft::{spectrogram, spectrogram_average, TimeFrequencyMap};
