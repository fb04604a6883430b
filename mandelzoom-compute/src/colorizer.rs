//! Escape results to RGBA colors.
//!
//! Escaped points are normalized linearly (`iterations / max_iterations`) and
//! looked up in a 4096-entry table built from a fixed gradient. Interior
//! points are opaque black.

use mandelzoom_core::{EscapeResult, PaletteKind};
use serde::{Deserialize, Serialize};

const LUT_SIZE: usize = 4096;

/// Color of points that never escaped.
pub const INTERIOR_COLOR: [u8; 4] = [0, 0, 0, 255];

/// A color stop in the gradient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: [u8; 3],
}

/// Piecewise-linear gradient interpolated per sRGB channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub stops: Vec<ColorStop>,
}

impl Gradient {
    /// Stops are sorted by position.
    pub fn new(mut stops: Vec<ColorStop>) -> Self {
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { stops }
    }

    /// Built-in gradient for a palette.
    pub fn for_palette(palette: PaletteKind) -> Self {
        let stops: &[(f64, [u8; 3])] = match palette {
            PaletteKind::Classic => &[
                (0.0, [0, 7, 100]),
                (0.16, [0, 2, 0]),
                (0.33, [0, 7, 100]),
                (0.5, [32, 107, 203]),
                (0.66, [255, 170, 0]),
                (1.0, [237, 255, 255]),
            ],
            PaletteKind::Fire => &[
                (0.0, [0, 0, 0]),
                (0.2, [128, 0, 0]),
                (0.4, [255, 0, 0]),
                (0.6, [255, 128, 0]),
                (0.8, [255, 255, 0]),
                (1.0, [255, 255, 255]),
            ],
            PaletteKind::Ocean => &[
                (0.0, [0, 0, 64]),
                (0.25, [0, 64, 128]),
                (0.5, [0, 128, 192]),
                (0.75, [64, 192, 255]),
                (1.0, [255, 255, 255]),
            ],
            PaletteKind::Grayscale => &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])],
        };

        Self::new(
            stops
                .iter()
                .map(|&(position, color)| ColorStop { position, color })
                .collect(),
        )
    }

    /// Color at `t` in `[0, 1]`; values outside are clamped.
    pub fn sample(&self, t: f64) -> [u8; 3] {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return [0, 0, 0],
        };
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        if t <= first.position {
            return first.color;
        }
        if t >= last.position {
            return last.color;
        }

        let seg = self
            .stops
            .windows(2)
            .find(|pair| t <= pair[1].position)
            .unwrap_or_else(|| &self.stops[self.stops.len() - 2..]);
        let (s0, s1) = (&seg[0], &seg[1]);

        let span = s1.position - s0.position;
        let local = if span.abs() < 1e-10 {
            0.0
        } else {
            ((t - s0.position) / span).clamp(0.0, 1.0)
        };

        let lerp = |a: u8, b: u8| {
            (f64::from(a) + local * (f64::from(b) - f64::from(a)))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        [
            lerp(s0.color[0], s1.color[0]),
            lerp(s0.color[1], s1.color[1]),
            lerp(s0.color[2], s1.color[2]),
        ]
    }

    /// Generate a 4096-entry LUT.
    pub fn to_lut(&self) -> Vec<[u8; 3]> {
        (0..LUT_SIZE)
            .map(|i| self.sample(i as f64 / (LUT_SIZE - 1) as f64))
            .collect()
    }
}

/// Pure mapping from escape results to RGBA, shared by every backend.
#[derive(Clone, Debug)]
pub struct ColorMapper {
    palette: PaletteKind,
    lut: Vec<[u8; 3]>,
}

impl Default for ColorMapper {
    fn default() -> Self {
        Self::new(PaletteKind::default())
    }
}

impl ColorMapper {
    pub fn new(palette: PaletteKind) -> Self {
        Self {
            palette,
            lut: Gradient::for_palette(palette).to_lut(),
        }
    }

    pub fn palette(&self) -> PaletteKind {
        self.palette
    }

    /// RGBA for one escape result.
    #[inline]
    pub fn color_for(&self, result: EscapeResult, max_iterations: u32) -> [u8; 4] {
        if !result.escaped || max_iterations == 0 {
            return INTERIOR_COLOR;
        }
        let t = (f64::from(result.iterations) / f64::from(max_iterations)).min(1.0);
        let idx = (t * (LUT_SIZE - 1) as f64).round() as usize;
        let [r, g, b] = self.lut[idx.min(LUT_SIZE - 1)];
        [r, g, b, 255]
    }

    /// Write RGBA for a row-major grid of results into `pixels`.
    ///
    /// `pixels` must hold four bytes per result; extra results are ignored.
    pub fn colorize_into(&self, results: &[EscapeResult], max_iterations: u32, pixels: &mut [u8]) {
        for (result, px) in results.iter().zip(pixels.chunks_exact_mut(4)) {
            px.copy_from_slice(&self.color_for(*result, max_iterations));
        }
    }
}
