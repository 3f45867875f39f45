//! Comparison pipeline driver
//!
//! Each stage returns a `Result`. Failures after loading are recorded and the
//! run moves on, so the report is always flushed with whatever was produced.

use std::path::PathBuf;
use thiserror::Error;

use crate::audio::{self, time_window::linspace, AudioError, Recording, TimeWindow};
use crate::config::{AnalysisConfig, ConfigError};
use crate::report::{self, Figure, ReportBuilder, ReportError, ReportSummary, Series};
use crate::spectrum::{self, Spectrum, SpectrumError, WindowType};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Primary recording not found: {}", .0.display())]
    PrimaryMissing(PathBuf),

    #[error("Failed to load {stage}: {source}")]
    Audio {
        stage: &'static str,
        #[source]
        source: AudioError,
    },

    #[error("{stage} failed: {source}")]
    Spectrum {
        stage: &'static str,
        #[source]
        source: SpectrumError,
    },

    #[error("{stage} failed: {source}")]
    Report {
        stage: &'static str,
        #[source]
        source: ReportError,
    },
}

/// Everything a run produced, including the failures it recovered from
#[derive(Debug)]
pub struct RunOutcome {
    pub primary: Recording,
    pub secondary: Recording,

    /// Secondary file was missing and replaced by silence
    pub secondary_substituted: bool,

    /// Zoom-window slice length per recording, None if the window was invalid
    pub zoom_lengths: [Option<usize>; 2],

    /// Static spectra of the vowel window, if at least one window was valid
    pub spectra: Option<(Spectrum, Spectrum)>,

    /// CSV data rows, if the CSV was written
    pub csv_rows: Option<usize>,

    pub report: ReportSummary,

    /// Stage failures recorded after loading
    pub failures: Vec<PipelineError>,
}

impl RunOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Log and keep a stage failure, returning the value on success
fn record<T>(failures: &mut Vec<PipelineError>, result: Result<T, PipelineError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log::error!("{}", err);
            failures.push(err);
            None
        }
    }
}

fn load_primary(config: &AnalysisConfig) -> Result<Recording, PipelineError> {
    audio::load(&config.primary, config.label1.as_str()).map_err(|err| match err {
        AudioError::FileMissing(path) => PipelineError::PrimaryMissing(path),
        source => PipelineError::Audio {
            stage: "primary recording",
            source,
        },
    })
}

/// Load the secondary recording, substituting silence shaped like the primary
/// when it is missing or unreadable
fn load_secondary(
    config: &AnalysisConfig,
    primary: &Recording,
    failures: &mut Vec<PipelineError>,
) -> (Recording, bool) {
    match audio::load(&config.secondary, config.label2.as_str()) {
        Ok(recording) => (recording, false),
        Err(AudioError::FileMissing(path)) => {
            log::warn!(
                "File {} not found. Will analyze only {}.",
                path.display(),
                primary.label()
            );
            (Recording::silent_like(primary, config.label2.as_str()), true)
        }
        Err(source) => {
            record::<()>(
                failures,
                Err(PipelineError::Audio {
                    stage: "secondary recording",
                    source,
                }),
            );
            (Recording::silent_like(primary, config.label2.as_str()), true)
        }
    }
}

fn waveform_figures(
    config: &AnalysisConfig,
    recordings: [&Recording; 2],
    report: &mut ReportBuilder,
) -> [Option<usize>; 2] {
    log::info!("Generating waveform plots...");
    let zoom = config.zoom_window();
    let slices = recordings.map(|rec| audio::window(rec, &zoom));

    let valid: Vec<&[f64]> = slices.iter().flatten().copied().collect();
    let Some(y_range) = report::shared_y_range(&valid) else {
        log::warn!("No valid transient window in either recording; skipping waveform plots");
        return [None, None];
    };

    for (rec, slice) in recordings.iter().zip(slices.iter()) {
        let Some(slice) = slice else {
            continue;
        };
        let times = linspace(zoom.start_time, zoom.end_time, slice.len());
        report.add(Figure::Waveform {
            title: format!(
                "{} Transient Zoom ({:.0} ms around {:.2}s)",
                rec.label(),
                config.zoom_width * 1000.0,
                config.consonant_time
            ),
            series: Series::new(rec.label(), times, slice.to_vec()),
            y_range,
        });
    }

    slices.map(|slice| slice.map(|s| s.len()))
}

fn spectrogram_figures(
    config: &AnalysisConfig,
    recordings: [&Recording; 2],
    report: &mut ReportBuilder,
) -> Result<(), PipelineError> {
    log::info!("Generating spectrograms...");
    for rec in recordings {
        let map = spectrum::spectrogram(
            rec.samples(),
            config.n_fft,
            config.n_fft_overlap(),
            config.window,
            rec.sample_rate(),
        )
        .map_err(|source| PipelineError::Spectrum {
            stage: "spectrogram",
            source,
        })?;

        report.add(Figure::Spectrogram {
            title: format!(
                "{} Spectrogram ({} window, n_fft={}, hop={})",
                rec.label(),
                config.window.name(),
                config.n_fft,
                config.n_fft_overlap()
            ),
            map,
            max_frequency: rec.sample_rate() as f64 / 2.0,
        });
    }
    Ok(())
}

fn focus_figure(
    config: &AnalysisConfig,
    recordings: [&Recording; 2],
    report: &mut ReportBuilder,
) -> Result<(), PipelineError> {
    log::info!("Generating focused spectrogram comparison...");
    let vowel = config.vowel_window();

    let mut maps = Vec::with_capacity(2);
    let mut averages = Vec::with_capacity(2);
    for rec in recordings {
        let Some(slice) = audio::window(rec, &vowel) else {
            continue;
        };
        let map = spectrum::spectrogram_average(
            slice,
            config.focus_segment,
            config.focus_overlap(),
            config.window,
            rec.sample_rate(),
        )
        .map_err(|source| PipelineError::Spectrum {
            stage: "focused spectrogram",
            source,
        })?;

        averages.push(Series::new(rec.label(), map.frequencies.clone(), map.average_spectrum()));
        maps.push((rec.label().to_string(), map));
    }

    if maps.is_empty() {
        log::warn!("No valid vowel window in either recording; skipping focused comparison");
        return Ok(());
    }

    report.add(Figure::FocusComparison {
        title: format!(
            "Focused Spectrograms ({:.0} ms around {:.2}s)",
            config.vowel_duration * 1000.0,
            config.vowel_center
        ),
        maps,
        averages,
        max_frequency: recordings[0].sample_rate() as f64 / 2.0,
    });
    Ok(())
}

fn vowel_spectrum(
    config: &AnalysisConfig,
    rec: &Recording,
    vowel: &TimeWindow,
    window_type: WindowType,
) -> Result<Option<Spectrum>, PipelineError> {
    let Some(slice) = audio::window(rec, vowel) else {
        return Ok(None);
    };
    spectrum::static_spectrum(slice, window_type, config.fft_size, rec.sample_rate())
        .map(Some)
        .map_err(|source| PipelineError::Spectrum {
            stage: "static spectrum",
            source,
        })
}

/// Static spectra of both recordings; an invalid window yields a flat curve
/// for the CSV but no line in the overlay
fn static_spectra(
    config: &AnalysisConfig,
    recordings: [&Recording; 2],
    report: &mut ReportBuilder,
) -> Result<Option<(Spectrum, Spectrum)>, PipelineError> {
    log::info!("Generating static spectrum snapshot...");
    let vowel = config.vowel_window();

    let first = vowel_spectrum(config, recordings[0], &vowel, config.window)?;
    let second = vowel_spectrum(config, recordings[1], &vowel, config.window)?;

    if first.is_none() && second.is_none() {
        log::warn!("No valid vowel window in either recording; skipping static spectrum");
        return Ok(None);
    }

    if recordings[0].sample_rate() != recordings[1].sample_rate() {
        log::warn!(
            "Sample rates differ ({} vs {} Hz); CSV rows follow {}'s frequency axis",
            recordings[0].sample_rate(),
            recordings[1].sample_rate(),
            recordings[0].label()
        );
    }

    let series: Vec<Series> = recordings
        .iter()
        .zip([&first, &second])
        .filter_map(|(rec, s)| s.as_ref().map(|s| Series::from_spectrum(rec.label(), s)))
        .collect();

    report.add(Figure::SpectrumOverlay {
        title: format!(
            "Static Spectrum ({} window, {:.0} ms around {:.2}s)",
            config.window.name(),
            config.vowel_duration * 1000.0,
            config.vowel_center
        ),
        series,
        max_frequency: recordings[0].sample_rate() as f64 / 2.0,
    });

    let flat = |rec: &Recording| {
        spectrum::static_spectrum(&[], config.window, config.fft_size, rec.sample_rate())
            .map_err(|source| PipelineError::Spectrum {
                stage: "static spectrum",
                source,
            })
    };
    let first = match first {
        Some(s) => s,
        None => flat(recordings[0])?,
    };
    let second = match second {
        Some(s) => s,
        None => flat(recordings[1])?,
    };

    Ok(Some((first, second)))
}

/// Run the comparison
///
/// Returns Err only for conditions that stop the run before analysis: an
/// invalid configuration, or a missing or unreadable primary recording.
/// Every later failure is recorded in `RunOutcome::failures` and the report
/// is still flushed.
pub fn run(config: &AnalysisConfig) -> Result<RunOutcome, PipelineError> {
    config.validate()?;

    log::info!("Attempting to load audio files...");
    let primary = load_primary(config)?;

    let mut failures = Vec::new();
    let (secondary, secondary_substituted) = load_secondary(config, &primary, &mut failures);
    let recordings = [&primary, &secondary];

    let mut report = ReportBuilder::new();

    let zoom_lengths = waveform_figures(config, recordings, &mut report);
    record(&mut failures, spectrogram_figures(config, recordings, &mut report));
    record(&mut failures, focus_figure(config, recordings, &mut report));
    let spectra = record(&mut failures, static_spectra(config, recordings, &mut report)).flatten();

    let csv_rows = spectra.as_ref().and_then(|(first, second)| {
        let result = report::write_spectrum_csv(
            &config.csv,
            (primary.label(), first),
            (secondary.label(), second),
        )
        .map_err(|source| PipelineError::Report {
            stage: "CSV export",
            source,
        });
        record(&mut failures, result)
    });

    log::info!("Rendering {} figure(s)...", report.len());
    let report = record(
        &mut failures,
        report.flush(&config.out_dir).map_err(|source| PipelineError::Report {
            stage: "figure rendering",
            source,
        }),
    )
    .unwrap_or_default();

    if report.failed > 0 {
        log::warn!("{} figure(s) could not be rendered", report.failed);
    }

    Ok(RunOutcome {
        primary,
        secondary,
        secondary_substituted,
        zoom_lengths,
        spectra,
        csv_rows,
        report,
        failures,
    })
}
