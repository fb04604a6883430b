//! Escape-time iteration for z ← z² + c.

use mandelzoom_core::{ComplexViewport, EscapeComplex, EscapeResult, RenderError};
use rayon::prelude::*;

/// Iterate `z ← z² + c` from `z = 0` until `|z|² > bailout_radius_sq` or the
/// budget runs out.
///
/// A NaN or infinite magnitude counts as escaped, so overflow can never be
/// mistaken for an interior point. Deterministic for a given precision.
#[inline]
pub fn evaluate<C: EscapeComplex>(c: C, max_iterations: u32, bailout_radius_sq: f64) -> EscapeResult {
    let mut z = C::zero();
    let mut n = 0;
    let mut norm_sq = 0.0;

    while norm_sq <= bailout_radius_sq && n < max_iterations {
        z = z.square().add(&c);
        n += 1;
        norm_sq = z.norm_sq();
    }

    EscapeResult {
        iterations: n,
        escaped: !(norm_sq <= bailout_radius_sq),
    }
}

/// Evaluate every pixel of a raster in precision `C`, row-major, row 0 at the top.
///
/// Pixel centers are mapped in double-double and then narrowed to `C`, so the
/// `F32Complex` instantiation shows what an f32 kernel sees for the same grid.
pub fn compute_escape_grid<C: EscapeComplex + Send + Sync>(
    viewport: &ComplexViewport,
    width: u32,
    height: u32,
    max_iterations: u32,
    bailout_radius_sq: f64,
) -> Result<Vec<EscapeResult>, RenderError> {
    ComplexViewport::check_raster(width, height)?;
    let len = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| RenderError::OutOfMemory {
            width,
            height,
            reason: "pixel count overflows usize".to_string(),
        })?;

    let mut grid = Vec::new();
    grid.try_reserve_exact(len)
        .map_err(|e| RenderError::OutOfMemory {
            width,
            height,
            reason: e.to_string(),
        })?;
    grid.resize(len, EscapeResult::default());

    let columns: Vec<_> = (0..width).map(|col| viewport.column_re(col, width)).collect();

    grid.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(row, results)| {
            let im = viewport.row_im(row as u32, height);
            for (re, result) in columns.iter().zip(results.iter_mut()) {
                *result = evaluate(C::from_dd_pair(*re, im), max_iterations, bailout_radius_sq);
            }
        });

    Ok(grid)
}
