//! Rasterization of figure descriptors into RGB images
//!
//! Plots carry no glyphs: a figure is a set of framed panels holding line
//! series or a greyscale spectrogram. Titles travel in the file name.

use image::{Rgb, RgbImage};

use super::{Figure, Series};
use crate::spectrum::TimeFrequencyMap;

pub const FIGURE_WIDTH: u32 = 960;
pub const PANEL_HEIGHT: u32 = 360;
const MARGIN: u32 = 24;

/// Dynamic range of spectrogram greyscale, dB below the map's peak
pub const SPECTROGRAM_RANGE_DB: f64 = 80.0;

/// Lowest dB shown on normalized spectrum plots
const SPECTRUM_FLOOR_DB: f64 = -120.0;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const FRAME: Rgb<u8> = Rgb([64, 64, 64]);
const GRID: Rgb<u8> = Rgb([220, 220, 220]);

/// Line colors, assigned to series in order
pub const PALETTE: [Rgb<u8>; 4] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
];

/// Pixel rectangle inside an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panel {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Panel {
    /// Panel `index` of a vertical stack of `PANEL_HEIGHT` rows, inset by the margin
    pub fn stacked(index: u32) -> Self {
        Self {
            x: MARGIN,
            y: index * PANEL_HEIGHT + MARGIN,
            width: FIGURE_WIDTH - 2 * MARGIN,
            height: PANEL_HEIGHT - 2 * MARGIN,
        }
    }
}

/// Data-to-pixel mapping for one panel
pub struct Axes {
    panel: Panel,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Axes {
    pub fn new(panel: Panel, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self {
            panel,
            x_range: widen_if_flat(x_range),
            y_range: widen_if_flat(y_range),
        }
    }

    /// Map data coordinates to fractional pixel coordinates (y grows downward)
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let (x0, x1) = self.x_range;
        let (y0, y1) = self.y_range;
        let px = self.panel.x as f64 + (x - x0) / (x1 - x0) * (self.panel.width - 1) as f64;
        let py = self.panel.y as f64 + (y1 - y) / (y1 - y0) * (self.panel.height - 1) as f64;
        (px, py)
    }

    fn contains(&self, px: i64, py: i64) -> bool {
        let p = self.panel;
        px >= p.x as i64
            && py >= p.y as i64
            && px < (p.x + p.width) as i64
            && py < (p.y + p.height) as i64
    }

    /// Panel border plus a horizontal line at y = 0 when it is in range
    pub fn frame(&self, img: &mut RgbImage) {
        let (y0, y1) = self.y_range;
        if y0 < 0.0 && y1 > 0.0 {
            let (_, py) = self.to_pixel(self.x_range.0, 0.0);
            let py = py.round() as i64;
            for px in self.panel.x..self.panel.x + self.panel.width {
                self.plot(img, px as i64, py, GRID);
            }
        }

        let p = self.panel;
        for px in p.x..p.x + p.width {
            img.put_pixel(px, p.y, FRAME);
            img.put_pixel(px, p.y + p.height - 1, FRAME);
        }
        for py in p.y..p.y + p.height {
            img.put_pixel(p.x, py, FRAME);
            img.put_pixel(p.x + p.width - 1, py, FRAME);
        }
    }

    fn plot(&self, img: &mut RgbImage, px: i64, py: i64, color: Rgb<u8>) {
        if self.contains(px, py) {
            img.put_pixel(px as u32, py as u32, color);
        }
    }

    /// Bresenham segment, clipped to the panel
    fn line(&self, img: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
        let (mut x0, mut y0) = (from.0.round() as i64, from.1.round() as i64);
        let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(img, x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Connect consecutive finite points; non-finite values break the line
    pub fn polyline(&self, img: &mut RgbImage, xs: &[f64], ys: &[f64], color: Rgb<u8>) {
        let mut previous: Option<(f64, f64)> = None;

        for (&x, &y) in xs.iter().zip(ys.iter()) {
            if !(x.is_finite() && y.is_finite()) {
                previous = None;
                continue;
            }
            let y = y.clamp(self.y_range.0, self.y_range.1);
            let point = self.to_pixel(x, y);
            match previous {
                Some(prev) => self.line(img, prev, point, color),
                None => self.line(img, point, point, color),
            }
            previous = Some(point);
        }
    }
}

fn widen_if_flat((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 1.0, lo + 1.0)
    }
}

/// Map a dB value to greyscale relative to `max_db` over the display range
pub fn db_to_greyscale(db: f64, max_db: f64) -> u8 {
    let relative = (db - max_db).clamp(-SPECTROGRAM_RANGE_DB, 0.0);
    ((relative + SPECTROGRAM_RANGE_DB) / SPECTROGRAM_RANGE_DB * 255.0) as u8
}

/// Nearest-neighbour spectrogram fill: low frequencies at the bottom
pub fn heatmap(img: &mut RgbImage, panel: Panel, map: &TimeFrequencyMap, max_frequency: f64) {
    let (_, max_db) = map.db_range();
    let rows = map.num_frequencies();
    let cols = map.num_frames();
    if rows == 0 || cols == 0 {
        return;
    }

    let top_frequency = map.frequencies[rows - 1];
    let visible = if top_frequency > 0.0 {
        (max_frequency / top_frequency).clamp(0.0, 1.0)
    } else {
        1.0
    };

    for py in 0..panel.height {
        let fraction = 1.0 - (py as f64 + 0.5) / panel.height as f64;
        let row = ((fraction * visible * (rows - 1) as f64).round() as usize).min(rows - 1);

        for px in 0..panel.width {
            let col = ((px as u64 * cols as u64) / panel.width as u64) as usize;
            let grey = db_to_greyscale(map.power_db[[row, col]], max_db);
            img.put_pixel(panel.x + px, panel.y + py, Rgb([grey, grey, grey]));
        }
    }
}

fn series_bounds(series: &[Series]) -> ((f64, f64), (f64, f64)) {
    let mut x = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y = (f64::INFINITY, f64::NEG_INFINITY);

    for s in series {
        for (&xv, &yv) in s.x.iter().zip(s.y.iter()) {
            if xv.is_finite() && yv.is_finite() {
                x = (x.0.min(xv), x.1.max(xv));
                y = (y.0.min(yv), y.1.max(yv));
            }
        }
    }

    if !x.0.is_finite() {
        x = (0.0, 1.0);
    }
    if !y.0.is_finite() {
        y = (-1.0, 1.0);
    }
    (x, y)
}

fn draw_series(img: &mut RgbImage, panel: Panel, series: &[Series], x_range: (f64, f64), y_range: (f64, f64)) {
    let axes = Axes::new(panel, x_range, y_range);
    axes.frame(img);
    for (s, color) in series.iter().zip(PALETTE.iter().cycle()) {
        axes.polyline(img, &s.x, &s.y, *color);
    }
}

fn dbfs_range(series: &[Series]) -> (f64, f64) {
    let (_, (lo, hi)) = series_bounds(series);
    let lo = lo.max(SPECTRUM_FLOOR_DB);
    (lo, hi.max(lo) + 1.0)
}

fn blank(panels: u32) -> RgbImage {
    RgbImage::from_pixel(FIGURE_WIDTH, panels * PANEL_HEIGHT, BACKGROUND)
}

/// Rasterize one figure
pub fn render(figure: &Figure) -> RgbImage {
    match figure {
        Figure::Waveform { series, y_range, .. } => {
            let mut img = blank(1);
            let (x_range, _) = series_bounds(std::slice::from_ref(series));
            draw_series(&mut img, Panel::stacked(0), std::slice::from_ref(series), x_range, *y_range);
            img
        }

        Figure::Spectrogram { map, max_frequency, .. } => {
            let mut img = blank(1);
            let panel = Panel::stacked(0);
            heatmap(&mut img, panel, map, *max_frequency);
            Axes::new(panel, (0.0, 1.0), (0.0, 1.0)).frame(&mut img);
            img
        }

        Figure::FocusComparison {
            maps,
            averages,
            max_frequency,
            ..
        } => {
            let mut img = blank(maps.len() as u32 + 1);
            for (i, (_, map)) in maps.iter().enumerate() {
                let panel = Panel::stacked(i as u32);
                heatmap(&mut img, panel, map, *max_frequency);
                Axes::new(panel, (0.0, 1.0), (0.0, 1.0)).frame(&mut img);
            }
            let (_, y_range) = series_bounds(averages);
            draw_series(
                &mut img,
                Panel::stacked(maps.len() as u32),
                averages,
                (0.0, *max_frequency),
                y_range,
            );
            img
        }

        Figure::SpectrumOverlay { series, max_frequency, .. } => {
            let mut img = blank(1);
            draw_series(
                &mut img,
                Panel::stacked(0),
                series,
                (0.0, *max_frequency),
                dbfs_range(series),
            );
            img
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{spectrogram, WindowType};

    #[test]
    fn test_db_to_greyscale() {
        assert_eq!(db_to_greyscale(0.0, 0.0), 255);
        assert_eq!(db_to_greyscale(-80.0, 0.0), 0);
        assert_eq!(db_to_greyscale(-200.0, 0.0), 0);
        assert_eq!(db_to_greyscale(-40.0, 0.0), 127);
    }

    #[test]
    fn test_to_pixel_corners() {
        let panel = Panel {
            x: 10,
            y: 20,
            width: 101,
            height: 51,
        };
        let axes = Axes::new(panel, (0.0, 100.0), (-1.0, 1.0));

        assert_eq!(axes.to_pixel(0.0, 1.0), (10.0, 20.0));
        assert_eq!(axes.to_pixel(100.0, -1.0), (110.0, 70.0));
    }

    #[test]
    fn test_polyline_draws_in_panel() {
        let mut img = blank(1);
        let panel = Panel::stacked(0);
        let axes = Axes::new(panel, (0.0, 1.0), (0.0, 1.0));
        axes.polyline(&mut img, &[0.0, 1.0], &[0.0, 1.0], PALETTE[0]);

        // Both diagonal endpoints are painted
        assert_eq!(*img.get_pixel(panel.x, panel.y + panel.height - 1), PALETTE[0]);
        assert_eq!(*img.get_pixel(panel.x + panel.width - 1, panel.y), PALETTE[0]);
    }

    #[test]
    fn test_render_dimensions() {
        let tone: Vec<f64> = (0..4096).map(|n| (n as f64 * 0.3).sin()).collect();
        let map = spectrogram(&tone, 256, 128, WindowType::Hann, 8000).unwrap();

        let figure = Figure::FocusComparison {
            title: "focus".to_string(),
            maps: vec![("a".to_string(), map.clone()), ("b".to_string(), map.clone())],
            averages: vec![Series::new("a", map.frequencies.clone(), map.average_spectrum())],
            max_frequency: 4000.0,
        };
        let img = render(&figure);
        assert_eq!(img.width(), FIGURE_WIDTH);
        assert_eq!(img.height(), 3 * PANEL_HEIGHT);
    }
}
