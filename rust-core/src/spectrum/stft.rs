//! Short-time Fourier transform and averaged frequency response

use ndarray::{Array2, Axis};

use super::fft::{FftEngine, SpectrumError};
use super::windowing::{apply_window_inplace, generate_window, WindowType};

/// Additive floor before the logarithm, keeps silent frames finite
pub const POWER_FLOOR: f64 = 1e-10;

/// Time-frequency power grid
#[derive(Debug, Clone)]
pub struct TimeFrequencyMap {
    /// Bin frequencies in Hz (segment_length/2 + 1 entries)
    pub frequencies: Vec<f64>,

    /// Frame centres in seconds, relative to the slice start
    pub time_bins: Vec<f64>,

    /// 10*log10(|X|² + floor), shaped [frequency][time]
    pub power_db: Array2<f64>,
}

impl TimeFrequencyMap {
    pub fn num_frequencies(&self) -> usize {
        self.frequencies.len()
    }

    pub fn num_frames(&self) -> usize {
        self.time_bins.len()
    }

    /// Mean frequency response: arithmetic mean of the dB values per bin
    ///
    /// This averages in the log domain, which is not the same as converting
    /// the mean power to dB.
    pub fn average_spectrum(&self) -> Vec<f64> {
        match self.power_db.mean_axis(Axis(1)) {
            Some(mean) => mean.to_vec(),
            None => vec![0.0; self.frequencies.len()],
        }
    }

    /// Lowest and highest dB value in the grid
    pub fn db_range(&self) -> (f64, f64) {
        self.power_db.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        )
    }
}

/// Compute a spectrogram over a slice
///
/// # Arguments
/// * `slice` - Raw samples
/// * `segment_length` - Frame length in samples (also the FFT size)
/// * `overlap` - Samples shared by consecutive frames, must be < segment_length
/// * `window_type` - Analysis window applied to every frame
/// * `sample_rate` - Sample rate in Hz
///
/// A slice shorter than one segment is zero-padded into a single frame.
pub fn spectrogram(
    slice: &[f64],
    segment_length: usize,
    overlap: usize,
    window_type: WindowType,
    sample_rate: u32,
) -> Result<TimeFrequencyMap, SpectrumError> {
    if segment_length == 0 || overlap >= segment_length {
        return Err(SpectrumError::InvalidSegment {
            segment_length,
            overlap,
        });
    }

    let hop = segment_length - overlap;
    let num_frames = if slice.len() <= segment_length {
        1
    } else {
        (slice.len() - segment_length) / hop + 1
    };

    let mut engine = FftEngine::new(segment_length);
    let window = generate_window(window_type, segment_length);
    let num_bins = engine.num_bins();
    let sr = sample_rate as f64;

    let mut power_db = Array2::<f64>::zeros((num_bins, num_frames));
    let mut frame = vec![0.0; segment_length];
    let mut time_bins = Vec::with_capacity(num_frames);

    for (j, mut column) in power_db.axis_iter_mut(Axis(1)).enumerate() {
        let start = j * hop;
        let end = (start + segment_length).min(slice.len());
        let available = end - start;

        frame[..available].copy_from_slice(&slice[start..end]);
        frame[available..].fill(0.0);
        apply_window_inplace(&mut frame, &window);

        let power = engine.compute_power(&frame)?;
        for (cell, p) in column.iter_mut().zip(power) {
            *cell = 10.0 * (p + POWER_FLOOR).log10();
        }

        time_bins.push((start as f64 + segment_length as f64 / 2.0) / sr);
    }

    Ok(TimeFrequencyMap {
        frequencies: engine.frequency_axis_hz(sr),
        time_bins,
        power_db,
    })
}

/// Spectrogram whose `average_spectrum` is the mean frequency response of the slice
///
/// Same framing as [`spectrogram`]; callers read the averaged curve with
/// [`TimeFrequencyMap::average_spectrum`].
pub fn spectrogram_average(
    slice: &[f64],
    segment_length: usize,
    overlap: usize,
    window_type: WindowType,
    sample_rate: u32,
) -> Result<TimeFrequencyMap, SpectrumError> {
    let map = spectrogram(slice, segment_length, overlap, window_type, sample_rate)?;
    log::debug!(
        "Averaged {} frames x {} bins (segment {}, overlap {})",
        map.num_frames(),
        map.num_frequencies(),
        segment_length,
        overlap
    );
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_frequency_axis_length() {
        let signal: Vec<f64> = (0..5000).map(|n| (n as f64 * 0.05).sin()).collect();

        for segment in [64usize, 255, 256, 1024] {
            let map = spectrogram_average(&signal, segment, segment / 2, WindowType::Hann, 16000)
                .unwrap();
            assert_eq!(map.num_frequencies(), segment / 2 + 1);
            assert_eq!(map.power_db.nrows(), segment / 2 + 1);
            assert_eq!(map.average_spectrum().len(), segment / 2 + 1);
        }
    }

    #[test]
    fn test_frame_count_and_time_bins() {
        let signal = vec![1.0; 1000];
        let map = spectrogram(&signal, 256, 128, WindowType::Hann, 1000).unwrap();

        // (1000 - 256) / 128 + 1 = 6 frames
        assert_eq!(map.num_frames(), 6);
        assert_eq!(map.power_db.ncols(), 6);
        assert!((map.time_bins[0] - 0.128).abs() < 1e-12);
        assert!((map.time_bins[1] - 0.256).abs() < 1e-12);
    }

    #[test]
    fn test_short_slice_is_single_padded_frame() {
        let signal = vec![1.0; 100];
        let map = spectrogram(&signal, 256, 128, WindowType::Hann, 8000).unwrap();

        assert_eq!(map.num_frames(), 1);
        assert_eq!(map.num_frequencies(), 129);
    }

    #[test]
    fn test_silence_hits_power_floor() {
        let silence = vec![0.0; 2048];
        let map = spectrogram_average(&silence, 512, 256, WindowType::Hann, 8000).unwrap();

        assert!(map.power_db.iter().all(|&v| (v + 100.0).abs() < 1e-9));
        assert!(map.average_spectrum().iter().all(|&v| (v + 100.0).abs() < 1e-9));
    }

    #[test]
    fn test_average_is_mean_of_db_not_power() {
        // Loud first half, silent second half
        let mut signal: Vec<f64> = (0..1024)
            .map(|n| 1000.0 * (2.0 * PI * 1000.0 * n as f64 / 8000.0).sin())
            .collect();
        signal.extend(std::iter::repeat(0.0).take(1024));

        let map = spectrogram_average(&signal, 256, 128, WindowType::Hann, 8000).unwrap();
        let avg = map.average_spectrum();

        let bin = 32; // 1000 Hz at 8000/256 Hz per bin
        let column = map.power_db.row(bin);
        let mean_db = column.iter().sum::<f64>() / column.len() as f64;
        let mean_power = column.iter().map(|&db| 10f64.powf(db / 10.0)).sum::<f64>()
            / column.len() as f64;
        let power_mean_db = 10.0 * mean_power.log10();

        assert!((avg[bin] - mean_db).abs() < 1e-9);
        assert!(power_mean_db - avg[bin] > 10.0);
    }

    #[test]
    fn test_tone_peak_bin() {
        let signal: Vec<f64> = (0..8000)
            .map(|n| (2.0 * PI * 1000.0 * n as f64 / 8000.0).sin())
            .collect();
        let map = spectrogram_average(&signal, 256, 128, WindowType::Hann, 8000).unwrap();
        let avg = map.average_spectrum();

        let peak_bin = avg
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(map.frequencies[peak_bin], 1000.0);
    }

    #[test]
    fn test_invalid_framing_is_rejected() {
        let signal = vec![1.0; 4000];

        for (segment_length, overlap) in [(256, 256), (256, 300), (0, 0)] {
            let err = spectrogram_average(&signal, segment_length, overlap, WindowType::Hann, 8000)
                .unwrap_err();
            assert!(matches!(
                err,
                SpectrumError::InvalidSegment { segment_length: s, overlap: o }
                    if s == segment_length && o == overlap
            ));
        }

        assert!(spectrogram(&signal, 256, 255, WindowType::Hann, 8000).is_ok());
    }
}
