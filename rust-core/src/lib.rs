//! Sonic Analyzer - microphone frequency-response comparison
//! 
//! Loads two recordings of the same source, slices matching time windows and
//! compares their spectra as figures and a CSV table.

pub mod audio;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod spectrum;

pub use audio::{Recording, TimeWindow};
pub use config::AnalysisConfig;
pub use pipeline::{run, PipelineError, RunOutcome};
pub use report::ReportBuilder;
pub use spectrum::{static_spectrum, spectrogram_average, Spectrum, TimeFrequencyMap, WindowType};
