use crate::{DdComplex, DoubleDouble, PixelRect, RenderError, REFERENCE_WIDTH};

/// Axis-aligned region of the complex plane to render (y-up).
///
/// Corners are stored in double-double precision. A value of this type is
/// always non-degenerate: `top_right` lies strictly above and to the right of
/// `bottom_left`. Pan and zoom build a new viewport rather than mutating one.
///
/// The pixel mapping stretches each axis independently; use
/// [`ComplexViewport::fit_to_aspect`] to get square pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComplexViewport {
    bottom_left: DdComplex,
    top_right: DdComplex,
}

impl ComplexViewport {
    /// Create a viewport from its corners, rejecting inverted, empty or
    /// non-finite rectangles and extents that overflow.
    pub fn new(bottom_left: DdComplex, top_right: DdComplex) -> Result<Self, RenderError> {
        if !bottom_left.is_finite() || !top_right.is_finite() {
            return Err(RenderError::invalid_viewport("corners must be finite"));
        }
        if top_right.re <= bottom_left.re {
            return Err(RenderError::invalid_viewport(format!(
                "real range is empty or inverted: {} .. {}",
                bottom_left.re.to_f64(),
                top_right.re.to_f64()
            )));
        }
        if top_right.im <= bottom_left.im {
            return Err(RenderError::invalid_viewport(format!(
                "imaginary range is empty or inverted: {} .. {}",
                bottom_left.im.to_f64(),
                top_right.im.to_f64()
            )));
        }
        if !top_right.re.sub(&bottom_left.re).is_finite()
            || !top_right.im.sub(&bottom_left.im).is_finite()
        {
            return Err(RenderError::invalid_viewport(
                "extent overflows double-double range",
            ));
        }
        Ok(Self {
            bottom_left,
            top_right,
        })
    }

    /// Create from f64 bounds (`x` = real axis, `y` = imaginary axis).
    pub fn from_bounds(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self, RenderError> {
        Self::new(
            DdComplex::from_f64(x_min, y_min),
            DdComplex::from_f64(x_max, y_max),
        )
    }

    /// Create from a center point and extent.
    pub fn from_center_size(
        center: DdComplex,
        width: DoubleDouble,
        height: DoubleDouble,
    ) -> Result<Self, RenderError> {
        let half_w = width.mul_f64(0.5);
        let half_h = height.mul_f64(0.5);
        Self::new(
            DdComplex::new(center.re.sub(&half_w), center.im.sub(&half_h)),
            DdComplex::new(center.re.add(&half_w), center.im.add(&half_h)),
        )
    }

    /// The full-set view, -2-1.5i .. 1+1.5i.
    pub fn home() -> Self {
        Self {
            bottom_left: DdComplex::from_f64(-2.0, -1.5),
            top_right: DdComplex::from_f64(1.0, 1.5),
        }
    }

    pub fn bottom_left(&self) -> DdComplex {
        self.bottom_left
    }

    pub fn top_right(&self) -> DdComplex {
        self.top_right
    }

    /// Extent along the real axis.
    pub fn width(&self) -> DoubleDouble {
        self.top_right.re.sub(&self.bottom_left.re)
    }

    /// Extent along the imaginary axis.
    pub fn height(&self) -> DoubleDouble {
        self.top_right.im.sub(&self.bottom_left.im)
    }

    pub fn center(&self) -> DdComplex {
        DdComplex::new(
            self.bottom_left.re.midpoint(&self.top_right.re),
            self.bottom_left.im.midpoint(&self.top_right.im),
        )
    }

    /// Zoom depth relative to the reference width.
    pub fn magnification(&self) -> f64 {
        REFERENCE_WIDTH / self.width().to_f64()
    }

    /// Largest absolute coordinate touched by the viewport.
    pub fn max_abs_coordinate(&self) -> f64 {
        [
            self.bottom_left.re.to_f64(),
            self.bottom_left.im.to_f64(),
            self.top_right.re.to_f64(),
            self.top_right.im.to_f64(),
        ]
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Reject empty rasters.
    pub fn check_raster(width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::invalid_viewport(format!(
                "raster size must be positive, got {width}x{height}"
            )));
        }
        Ok(())
    }

    /// Real coordinate at the center of pixel column `col`.
    ///
    /// No range check; backends call this per column after validating the raster.
    #[inline]
    pub fn column_re(&self, col: u32, width: u32) -> DoubleDouble {
        let frac = DoubleDouble::from_f64(f64::from(col) + 0.5).div_f64(f64::from(width));
        self.bottom_left.re.add(&frac.mul(&self.width()))
    }

    /// Imaginary coordinate at the center of pixel row `row` (row 0 = top).
    #[inline]
    pub fn row_im(&self, row: u32, height: u32) -> DoubleDouble {
        let frac = DoubleDouble::from_f64(f64::from(row) + 0.5).div_f64(f64::from(height));
        self.top_right.im.sub(&frac.mul(&self.height()))
    }

    /// Map a pixel to the complex coordinate at its center.
    pub fn map_pixel_to_complex(
        &self,
        col: u32,
        row: u32,
        width: u32,
        height: u32,
    ) -> Result<DdComplex, RenderError> {
        Self::check_raster(width, height)?;
        if col >= width || row >= height {
            return Err(RenderError::invalid_viewport(format!(
                "pixel ({col}, {row}) outside {width}x{height} raster"
            )));
        }
        Ok(DdComplex::new(
            self.column_re(col, width),
            self.row_im(row, height),
        ))
    }

    /// Map a continuous raster position (0,0 = top-left corner of the image)
    /// to the complex plane. Callers check the raster first.
    fn map_raster_point(&self, x: f64, y: f64, width: u32, height: u32) -> DdComplex {
        let fx = DoubleDouble::from_f64(x).div_f64(f64::from(width));
        let fy = DoubleDouble::from_f64(y).div_f64(f64::from(height));
        DdComplex::new(
            self.bottom_left.re.add(&fx.mul(&self.width())),
            self.top_right.im.sub(&fy.mul(&self.height())),
        )
    }

    /// Per-pixel step (real, imaginary) for a raster.
    pub fn pixel_step(
        &self,
        width: u32,
        height: u32,
    ) -> Result<(DoubleDouble, DoubleDouble), RenderError> {
        Self::check_raster(width, height)?;
        Ok((
            self.width().div_f64(f64::from(width)),
            self.height().div_f64(f64::from(height)),
        ))
    }

    /// New viewport covering a selection rectangle of the current raster.
    pub fn zoom_to_pixel_rect(
        &self,
        rect: &PixelRect,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        Self::check_raster(width, height)?;
        if rect.is_empty() {
            return Err(RenderError::invalid_viewport("selection rectangle is empty"));
        }
        if !rect.fits_within(width, height) {
            return Err(RenderError::invalid_viewport(format!(
                "selection {rect:?} exceeds {width}x{height} raster"
            )));
        }

        let left_top = self.map_raster_point(f64::from(rect.x), f64::from(rect.y), width, height);
        let right_bottom =
            self.map_raster_point(rect.right() as f64, rect.bottom() as f64, width, height);

        Self::new(
            DdComplex::new(left_top.re, right_bottom.im),
            DdComplex::new(right_bottom.re, left_top.im),
        )
    }

    /// Scale about the center; `factor > 1` zooms in.
    pub fn zoom_about_center(&self, factor: f64) -> Result<Self, RenderError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(RenderError::invalid_viewport(format!(
                "zoom factor must be positive and finite, got {factor}"
            )));
        }
        Self::from_center_size(
            self.center(),
            self.width().div_f64(factor),
            self.height().div_f64(factor),
        )
    }

    /// Expand the shorter axis about the center so pixels come out square.
    pub fn fit_to_aspect(&self, width: u32, height: u32) -> Result<Self, RenderError> {
        let (step_re, step_im) = self.pixel_step(width, height)?;
        let step = if step_re > step_im { step_re } else { step_im };
        Self::from_center_size(
            self.center(),
            step.mul_f64(f64::from(width)),
            step.mul_f64(f64::from(height)),
        )
    }
}
