//! Command-line configuration
//!
//! Every analysis parameter is explicit so one pipeline covers every
//! window-width variant of the comparison.

use crate::audio::TimeWindow;
use crate::spectrum::WindowType;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be at least {min} (got {value})")]
    TooSmall {
        name: &'static str,
        min: usize,
        value: usize,
    },

    #[error("{name} must be a positive number of seconds (got {value})")]
    NonPositiveDuration { name: &'static str, value: f64 },

    #[error("{name} must be finite (got {value})")]
    NotFinite { name: &'static str, value: f64 },

    #[error("labels must differ (both are '{0}')")]
    DuplicateLabel(String),
}

#[derive(Parser, Debug)]
#[command(
    name = "sonic-analyzer",
    version,
    about = "Compare the frequency response of two microphone recordings",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub analysis: AnalysisConfig,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the two-recording comparison (default)
    Compare(AnalysisConfig),

    /// Print WAV header diagnostics for each file
    Probe {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

impl Cli {
    /// The command to run, defaulting to `compare` with top-level options
    pub fn into_command(self) -> Command {
        self.command
            .unwrap_or(Command::Compare(self.analysis))
    }
}

/// Parameters of one comparison run
#[derive(Args, Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Primary recording (required to exist)
    #[arg(long, default_value = "sm7b.wav")]
    pub primary: PathBuf,

    /// Secondary recording (replaced by silence if missing)
    #[arg(long, default_value = "samson.wav")]
    pub secondary: PathBuf,

    #[arg(long, default_value = "SM7B")]
    pub label1: String,

    #[arg(long, default_value = "Samson")]
    pub label2: String,

    /// Time of the transient to zoom in on, in seconds
    #[arg(long, default_value_t = 0.49)]
    pub consonant_time: f64,

    /// Width of the transient zoom window, in seconds
    #[arg(long, default_value_t = 0.1)]
    pub zoom_width: f64,

    /// Centre of the vowel used for the static spectrum, in seconds
    #[arg(long, default_value_t = 2.0)]
    pub vowel_center: f64,

    /// Length of the vowel window, in seconds
    #[arg(long, default_value_t = 0.05)]
    pub vowel_duration: f64,

    /// Segment length of the full-length spectrograms (overlap is half)
    #[arg(long, default_value_t = 2048)]
    pub n_fft: usize,

    /// Segment length of the focused vowel spectrograms (overlap is half)
    #[arg(long, default_value_t = 256)]
    pub focus_segment: usize,

    /// FFT size of the static spectrum
    #[arg(long, default_value_t = 4096)]
    pub fft_size: usize,

    #[arg(long, value_enum, default_value_t = WindowType::Hann)]
    pub window: WindowType,

    /// Directory for rendered figures
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// CSV output path
    #[arg(long, default_value = "spectrum_comparison.csv")]
    pub csv: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            primary: PathBuf::from("sm7b.wav"),
            secondary: PathBuf::from("samson.wav"),
            label1: "SM7B".to_string(),
            label2: "Samson".to_string(),
            consonant_time: 0.49,
            zoom_width: 0.1,
            vowel_center: 2.0,
            vowel_duration: 0.05,
            n_fft: 2048,
            focus_segment: 256,
            fft_size: 4096,
            window: WindowType::Hann,
            out_dir: PathBuf::from("."),
            csv: PathBuf::from("spectrum_comparison.csv"),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("consonant_time", self.consonant_time),
            ("vowel_center", self.vowel_center),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }

        for (name, value) in [
            ("zoom_width", self.zoom_width),
            ("vowel_duration", self.vowel_duration),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveDuration { name, value });
            }
        }

        for (name, value) in [
            ("n_fft", self.n_fft),
            ("focus_segment", self.focus_segment),
            ("fft_size", self.fft_size),
        ] {
            if value < 2 {
                return Err(ConfigError::TooSmall { name, min: 2, value });
            }
        }

        if self.label1 == self.label2 {
            return Err(ConfigError::DuplicateLabel(self.label1.clone()));
        }

        Ok(())
    }

    /// Transient zoom window
    pub fn zoom_window(&self) -> TimeWindow {
        TimeWindow::centered(self.consonant_time, self.zoom_width)
    }

    /// Vowel window for the static spectrum and focused spectrograms
    pub fn vowel_window(&self) -> TimeWindow {
        TimeWindow::centered(self.vowel_center, self.vowel_duration)
    }

    pub fn n_fft_overlap(&self) -> usize {
        self.n_fft / 2
    }

    pub fn focus_overlap(&self) -> usize {
        self.focus_segment / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli() {
        let cli = Cli::parse_from(["sonic-analyzer"]);
        match cli.into_command() {
            Command::Compare(config) => assert_eq!(config, AnalysisConfig::default()),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_compare_subcommand_options() {
        let cli = Cli::parse_from([
            "sonic-analyzer",
            "compare",
            "--primary",
            "a.wav",
            "--zoom-width",
            "0.02",
            "--window",
            "blackman",
        ]);
        match cli.into_command() {
            Command::Compare(config) => {
                assert_eq!(config.primary, PathBuf::from("a.wav"));
                assert_eq!(config.zoom_width, 0.02);
                assert_eq!(config.window, WindowType::Blackman);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_probe_subcommand() {
        let cli = Cli::parse_from(["sonic-analyzer", "probe", "a.wav", "b.wav"]);
        match cli.into_command() {
            Command::Probe { paths } => assert_eq!(paths.len(), 2),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_validate() {
        assert!(AnalysisConfig::default().validate().is_ok());

        let config = AnalysisConfig {
            fft_size: 0,
            ..AnalysisConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooSmall {
                name: "fft_size",
                min: 2,
                value: 0
            })
        );

        let config = AnalysisConfig {
            zoom_width: -0.1,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveDuration { name: "zoom_width", .. })
        ));

        let config = AnalysisConfig {
            label2: "SM7B".to_string(),
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateLabel(_))));
    }

    #[test]
    fn test_windows_and_overlaps() {
        let config = AnalysisConfig::default();
        let zoom = config.zoom_window();
        assert!((zoom.start_time - 0.44).abs() < 1e-12);
        assert!((zoom.end_time - 0.54).abs() < 1e-12);
        assert_eq!(config.n_fft_overlap(), 1024);
        assert_eq!(config.focus_overlap(), 128);
    }
}
