//! Render backend capability and the raster it produces.

use crate::{ComplexViewport, RenderError};
use std::fmt;

/// Which implementation produced a raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Gpu,
    Cpu,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Gpu => write!(f, "GPU"),
            BackendKind::Cpu => write!(f, "CPU"),
        }
    }
}

/// Records that a request was retried on another backend.
#[derive(Clone, Debug, PartialEq)]
pub struct FallbackEvent {
    pub from: BackendKind,
    pub to: BackendKind,
    pub reason: RenderError,
}

impl fmt::Display for FallbackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} fallback: {}", self.from, self.to, self.reason)
    }
}

/// A finished RGBA8 raster, row-major with row 0 at the top.
///
/// Owned by the caller; backends keep no reference to it.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOutput {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Wall-clock duration of the render in seconds.
    pub elapsed_seconds: f64,
    pub backend: BackendKind,
    pub fallback: Option<FallbackEvent>,
}

impl RenderOutput {
    /// RGBA value at `(col, row)`, or `None` outside the raster.
    pub fn pixel(&self, col: u32, row: u32) -> Option<[u8; 4]> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let idx = (row as usize * self.width as usize + col as usize) * 4;
        let px = self.pixels.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn used_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Renders a viewport into an RGBA raster.
///
/// Implementations own long-lived resources (thread pool, GPU device) and
/// take `&mut self` so callers serialize access.
pub trait RenderBackend {
    fn kind(&self) -> BackendKind;

    fn render(
        &mut self,
        viewport: &ComplexViewport,
        width: u32,
        height: u32,
        max_iterations: u32,
    ) -> Result<RenderOutput, RenderError>;
}
