//! Plain f64 view bounds exchanged with the UI and persistence layers.

use crate::{ComplexViewport, DdComplex, DoubleDouble, RenderError, REFERENCE_WIDTH};
use serde::{Deserialize, Serialize};

/// Rectangle of the complex plane as four f64 bounds.
///
/// `x` is the real axis and `y` the imaginary axis. This is the shape in which
/// saved views travel; the renderer only ever sees the [`ComplexViewport`]
/// built from it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ViewBounds {
    /// The full-set view.
    pub const HOME: Self = Self {
        x_min: -2.0,
        x_max: 1.0,
        y_min: -1.5,
        y_max: 1.5,
    };

    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn from_center_size(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            x_min: center_x - width / 2.0,
            x_max: center_x + width / 2.0,
            y_min: center_y - height / 2.0,
            y_max: center_y + height / 2.0,
        }
    }

    pub fn center_x(&self) -> f64 {
        (self.x_min + self.x_max) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.y_min + self.y_max) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Zoom depth: reference width / width.
    pub fn magnification(&self) -> f64 {
        REFERENCE_WIDTH / self.width()
    }

    /// Parse bounds given as decimal strings, keeping precision beyond f64 in
    /// the returned viewport.
    pub fn parse_viewport(
        x_min: &str,
        x_max: &str,
        y_min: &str,
        y_max: &str,
    ) -> Result<ComplexViewport, RenderError> {
        let parse = |s: &str| {
            s.parse::<DoubleDouble>()
                .map_err(|e| RenderError::invalid_viewport(e.to_string()))
        };
        ComplexViewport::new(
            DdComplex::new(parse(x_min)?, parse(y_min)?),
            DdComplex::new(parse(x_max)?, parse(y_max)?),
        )
    }
}

impl Default for ViewBounds {
    fn default() -> Self {
        Self::HOME
    }
}

impl TryFrom<ViewBounds> for ComplexViewport {
    type Error = RenderError;

    fn try_from(bounds: ViewBounds) -> Result<Self, Self::Error> {
        ComplexViewport::from_bounds(bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max)
    }
}

impl From<&ComplexViewport> for ViewBounds {
    fn from(viewport: &ComplexViewport) -> Self {
        let bl = viewport.bottom_left();
        let tr = viewport.top_right();
        Self {
            x_min: bl.re.to_f64(),
            x_max: tr.re.to_f64(),
            y_min: bl.im.to_f64(),
            y_max: tr.im.to_f64(),
        }
    }
}
