//! Data-parallel CPU renderer in double-double precision.

use crate::colorizer::ColorMapper;
use crate::kernel::evaluate;
use mandelzoom_core::{
    BackendKind, ComplexViewport, DdComplex, RenderBackend, RenderError, RenderOutput,
    RendererConfig,
};
use rayon::prelude::*;
use std::time::Instant;

/// Renders on a rayon pool, one row per work item.
///
/// Each worker writes only its own row slice of the RGBA buffer, so output is
/// byte-identical for any thread count.
pub struct CpuBackend {
    /// Dedicated pool; `None` runs on rayon's global pool.
    pool: Option<rayon::ThreadPool>,
    bailout_radius_sq: f64,
    colorizer: ColorMapper,
}

impl CpuBackend {
    /// `threads == 0` uses the global pool (one worker per core).
    pub fn new(threads: usize, bailout_radius_sq: f64, colorizer: ColorMapper) -> Self {
        let pool = if threads == 0 {
            None
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("mandelzoom-cpu-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    log::warn!("Failed to build {threads}-thread pool, using global pool: {e}");
                    None
                }
            }
        };

        Self {
            pool,
            bailout_radius_sq,
            colorizer,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(
            config.cpu_threads,
            config.bailout_radius_sq,
            ColorMapper::new(config.palette),
        )
    }

    /// Number of worker threads that will run a render.
    pub fn thread_count(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Same as [`RenderBackend::render`] but through `&self`, so concurrent
    /// renders need no lock.
    pub fn render_frame(
        &self,
        viewport: &ComplexViewport,
        width: u32,
        height: u32,
        max_iterations: u32,
    ) -> Result<RenderOutput, RenderError> {
        ComplexViewport::check_raster(width, height)?;

        let start = Instant::now();
        let pixels = self.render_rows(viewport, width, height, max_iterations)?;
        let elapsed_seconds = start.elapsed().as_secs_f64();

        log::debug!(
            "CPU render {}x{} ({} iterations, {} threads) took {:.1}ms",
            width,
            height,
            max_iterations,
            self.thread_count(),
            elapsed_seconds * 1000.0
        );

        Ok(RenderOutput {
            pixels,
            width,
            height,
            elapsed_seconds,
            backend: BackendKind::Cpu,
            fallback: None,
        })
    }

    fn render_rows(
        &self,
        viewport: &ComplexViewport,
        width: u32,
        height: u32,
        max_iterations: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let oom = |reason: String| RenderError::OutOfMemory {
            width,
            height,
            reason,
        };

        let row_bytes = (width as usize)
            .checked_mul(4)
            .ok_or_else(|| oom("row size overflows usize".to_string()))?;
        let len = row_bytes
            .checked_mul(height as usize)
            .ok_or_else(|| oom("raster size overflows usize".to_string()))?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|e| oom(e.to_string()))?;
        pixels.resize(len, 0u8);

        let mut columns = Vec::new();
        columns
            .try_reserve_exact(width as usize)
            .map_err(|e| oom(e.to_string()))?;
        columns.extend((0..width).map(|col| viewport.column_re(col, width)));

        let bailout = self.bailout_radius_sq;
        let colorizer = &self.colorizer;
        let columns = &columns;

        let work = move || {
            pixels
                .par_chunks_mut(row_bytes)
                .enumerate()
                .for_each(|(row, row_pixels)| {
                    let im = viewport.row_im(row as u32, height);
                    for (re, px) in columns.iter().zip(row_pixels.chunks_exact_mut(4)) {
                        let result = evaluate(DdComplex::new(*re, im), max_iterations, bailout);
                        px.copy_from_slice(&colorizer.color_for(result, max_iterations));
                    }
                });
            pixels
        };

        Ok(match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        })
    }
}

impl RenderBackend for CpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn render(
        &mut self,
        viewport: &ComplexViewport,
        width: u32,
        height: u32,
        max_iterations: u32,
    ) -> Result<RenderOutput, RenderError> {
        self.render_frame(viewport, width, height, max_iterations)
    }
}
