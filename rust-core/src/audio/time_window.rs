//! Time windows resolved against a recording
//!
//! Out-of-range windows are clamped to the recording; a window that collapses
//! after clamping is reported as invalid (`None`) instead of an error, so a
//! short recording still yields partial results.

use super::loader::Recording;

/// Requested time span in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start_time: f64,
    pub end_time: f64,
}

/// Clamped half-open sample range [start_index, end_index)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub start_index: usize,
    pub end_index: usize,
}

impl ResolvedWindow {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    /// Never true for a resolved window
    pub fn is_empty(&self) -> bool {
        self.end_index == self.start_index
    }
}

impl TimeWindow {
    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Window of `width` seconds centred on `center`
    pub fn centered(center: f64, width: f64) -> Self {
        Self::new(center - width / 2.0, center + width / 2.0)
    }

    /// Resolve to sample indices for a recording of `len` samples at `sample_rate`
    ///
    /// `index = round(time * sample_rate)`, start clamped to 0, end clamped to
    /// `len - 1`. Returns None when the clamped end is not after the start.
    pub fn resolve_indices(&self, sample_rate: u32, len: usize) -> Option<ResolvedWindow> {
        if len == 0 {
            return None;
        }

        let sr = sample_rate as f64;
        let last = (len - 1) as i64;

        let start = ((self.start_time * sr).round() as i64).clamp(0, last);
        let mut end = (self.end_time * sr).round() as i64;
        if end >= len as i64 {
            end = last;
        }

        if end <= start {
            return None;
        }

        Some(ResolvedWindow {
            start_index: start as usize,
            end_index: end as usize,
        })
    }

    pub fn resolve(&self, recording: &Recording) -> Option<ResolvedWindow> {
        self.resolve_indices(recording.sample_rate(), recording.len())
    }
}

/// Extract the samples covered by `window`, or None if it is invalid
pub fn window<'a>(recording: &'a Recording, window: &TimeWindow) -> Option<&'a [f64]> {
    match window.resolve(recording) {
        Some(range) => Some(&recording.samples()[range.start_index..range.end_index]),
        None => {
            log::warn!(
                "Invalid time window {:.3}s..{:.3}s for {} ({:.3}s long); skipping",
                window.start_time,
                window.end_time,
                recording.label(),
                recording.duration()
            );
            None
        }
    }
}

/// Evenly spaced values from `start` to `end` inclusive (`count` points)
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(len: usize, sample_rate: u32) -> Recording {
        Recording::new("r", sample_rate, (0..len).map(|n| n as f64).collect()).unwrap()
    }

    #[test]
    fn test_consonant_window_length() {
        let rec = recording(32000, 16000);
        let range = TimeWindow::centered(0.49, 0.1).resolve(&rec).unwrap();

        assert!((range.len() as i64 - 1600).abs() <= 1);
        assert!((range.start_index as i64 - 7040).abs() <= 1);
    }

    #[test]
    fn test_negative_start_clamped() {
        let rec = recording(1000, 1000);
        let range = TimeWindow::new(-0.5, 0.2).resolve(&rec).unwrap();

        assert_eq!(range.start_index, 0);
        assert_eq!(range.end_index, 200);
    }

    #[test]
    fn test_end_clamped_to_last_sample() {
        let rec = recording(1000, 1000);
        let range = TimeWindow::new(0.9, 5.0).resolve(&rec).unwrap();

        assert_eq!(range.start_index, 900);
        assert_eq!(range.end_index, 999);

        let slice = window(&rec, &TimeWindow::new(0.9, 5.0)).unwrap();
        assert_eq!(slice.len(), 99);
        assert_eq!(slice[0], 900.0);
    }

    #[test]
    fn test_window_past_end_is_invalid() {
        let rec = recording(1000, 1000);
        assert!(TimeWindow::centered(2.0, 0.05).resolve(&rec).is_none());
        assert!(window(&rec, &TimeWindow::centered(2.0, 0.05)).is_none());
    }

    #[test]
    fn test_window_before_start_is_invalid() {
        let rec = recording(1000, 1000);
        assert!(TimeWindow::new(-1.0, -0.5).resolve(&rec).is_none());
    }

    #[test]
    fn test_overlapping_windows_are_valid() {
        for sample_rate in [8000u32, 44100, 96000] {
            let len = sample_rate as usize * 2;
            let rec = recording(len, sample_rate);

            for &(start, end) in &[(-1.0, 0.5), (0.5, 1.5), (1.5, 10.0), (-3.0, 30.0)] {
                let range = TimeWindow::new(start, end).resolve(&rec).unwrap();
                assert!(range.end_index > range.start_index);
                assert!(range.end_index < len);
            }
        }
    }

    #[test]
    fn test_linspace() {
        let t = linspace(0.44, 0.54, 11);
        assert_eq!(t.len(), 11);
        assert_eq!(t[0], 0.44);
        assert!((t[10] - 0.54).abs() < 1e-12);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
    }
}
