//! Comparison report: figure descriptors, rendering and CSV export
//!
//! Figures accumulate in a `ReportBuilder` and are only drawn when the
//! builder is flushed, so a failed analysis stage still leaves every figure
//! produced before it renderable.

pub mod csv;
pub mod render;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::spectrum::{Spectrum, TimeFrequencyMap};

pub use csv::write_spectrum_csv;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Figure '{0}' has no data to draw")]
    EmptyFigure(String),

    #[error("Spectra have different lengths ({first} vs {second} bins)")]
    LengthMismatch { first: usize, second: usize },
}

/// Labelled (x, y) curve
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Series {
    pub fn new(label: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            x,
            y,
        }
    }

    pub fn from_spectrum(label: impl Into<String>, spectrum: &Spectrum) -> Self {
        Self::new(label, spectrum.frequencies.clone(), spectrum.magnitudes_db.clone())
    }
}

/// Figure descriptor, drawn on flush
#[derive(Debug, Clone)]
pub enum Figure {
    /// Zoomed waveform of one recording, y-range shared with its counterpart
    Waveform {
        title: String,
        series: Series,
        y_range: (f64, f64),
    },

    /// Full-length spectrogram of one recording
    Spectrogram {
        title: String,
        map: TimeFrequencyMap,
        max_frequency: f64,
    },

    /// Focused spectrograms stacked above an overlay of their averaged responses
    FocusComparison {
        title: String,
        maps: Vec<(String, TimeFrequencyMap)>,
        averages: Vec<Series>,
        max_frequency: f64,
    },

    /// Overlay of normalized static spectra
    SpectrumOverlay {
        title: String,
        series: Vec<Series>,
        max_frequency: f64,
    },
}

impl Figure {
    pub fn title(&self) -> &str {
        match self {
            Figure::Waveform { title, .. }
            | Figure::Spectrogram { title, .. }
            | Figure::FocusComparison { title, .. }
            | Figure::SpectrumOverlay { title, .. } => title,
        }
    }

    fn has_data(&self) -> bool {
        match self {
            Figure::Waveform { series, .. } => !series.y.is_empty(),
            Figure::Spectrogram { map, .. } => map.num_frames() > 0,
            Figure::FocusComparison { maps, .. } => {
                !maps.is_empty() && maps.iter().all(|(_, m)| m.num_frames() > 0)
            }
            Figure::SpectrumOverlay { series, .. } => series.iter().any(|s| !s.y.is_empty()),
        }
    }
}

/// Outcome of flushing a report
#[derive(Debug, Default)]
pub struct ReportSummary {
    pub written: Vec<PathBuf>,
    pub failed: usize,
}

/// Owns the figures of one run until they are rendered
#[derive(Debug, Default)]
pub struct ReportBuilder {
    figures: Vec<Figure>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, figure: Figure) {
        log::info!("  Created figure: {}", figure.title());
        self.figures.push(figure);
    }

    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    pub fn len(&self) -> usize {
        self.figures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    /// Render every figure to `<out_dir>/<NN>_<slug>.png`
    ///
    /// A figure that fails to render is logged and counted; the rest are
    /// still written. Only failing to create `out_dir` is an error.
    pub fn flush(self, out_dir: &Path) -> Result<ReportSummary, ReportError> {
        std::fs::create_dir_all(out_dir)?;

        let mut summary = ReportSummary::default();
        for (index, figure) in self.figures.iter().enumerate() {
            let path = out_dir.join(format!("{:02}_{}.png", index + 1, slugify(figure.title())));
            match render_to(figure, &path) {
                Ok(()) => {
                    log::info!("Wrote {} ({})", path.display(), figure.title());
                    summary.written.push(path);
                }
                Err(err) => {
                    log::warn!("Could not render '{}': {}", figure.title(), err);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

fn render_to(figure: &Figure, path: &Path) -> Result<(), ReportError> {
    if !figure.has_data() {
        return Err(ReportError::EmptyFigure(figure.title().to_string()));
    }
    render::render(figure).save(path)?;
    Ok(())
}

/// Lowercase file-name slug: alphanumerics kept, everything else collapsed to '_'
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Joint y-axis range of several waveform slices, padded by 10% of the span on each side
///
/// Returns None when no slice has samples. A flat union falls back to ±1
/// around its value.
pub fn shared_y_range(slices: &[&[f64]]) -> Option<(f64, f64)> {
    let (lo, hi) = slices
        .iter()
        .flat_map(|s| s.iter().copied())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if lo > hi {
        return None;
    }

    let margin = (hi - lo) * 0.1;
    if margin > 0.0 {
        Some((lo - margin, hi + margin))
    } else {
        Some((lo - 1.0, hi + 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{spectrogram, WindowType};
    use tempfile::TempDir;

    #[test]
    fn test_shared_y_range() {
        let a = [-1.0, 0.5];
        let b = [2.0, 0.0];
        let (lo, hi) = shared_y_range(&[&a, &b]).unwrap();

        assert!((lo + 1.3).abs() < 1e-12);
        assert!((hi - 2.3).abs() < 1e-12);
    }

    #[test]
    fn test_shared_y_range_flat_and_empty() {
        assert_eq!(shared_y_range(&[&[0.0, 0.0], &[0.0]]), Some((-1.0, 1.0)));
        assert_eq!(shared_y_range(&[]), None);
        assert_eq!(shared_y_range(&[&[]]), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(
            slugify("SM7B Transient Zoom (100 ms around 0.49s)"),
            "sm7b_transient_zoom_100_ms_around_0_49s"
        );
        assert_eq!(slugify("--a--b--"), "a_b");
    }

    #[test]
    fn test_flush_writes_pngs_and_counts_failures() {
        let dir = TempDir::new().unwrap();
        let tone: Vec<f64> = (0..2048).map(|n| (n as f64 * 0.2).sin()).collect();
        let map = spectrogram(&tone, 256, 128, WindowType::Hann, 8000).unwrap();

        let mut report = ReportBuilder::new();
        report.add(Figure::Waveform {
            title: "Wave".to_string(),
            series: Series::new("a", vec![0.0, 1.0, 2.0], vec![0.0, 1.0, -1.0]),
            y_range: (-1.1, 1.1),
        });
        report.add(Figure::Spectrogram {
            title: "Spectrogram".to_string(),
            map,
            max_frequency: 4000.0,
        });
        report.add(Figure::SpectrumOverlay {
            title: "Nothing".to_string(),
            series: Vec::new(),
            max_frequency: 4000.0,
        });
        assert_eq!(report.len(), 3);

        let summary = report.flush(dir.path()).unwrap();
        assert_eq!(summary.written.len(), 2);
        assert_eq!(summary.failed, 1);
        assert!(summary.written.iter().all(|p| p.exists()));
        assert!(summary.written[0].ends_with("01_wave.png"));
        assert!(summary.written[1].ends_with("02_spectrogram.png"));
    }
}
