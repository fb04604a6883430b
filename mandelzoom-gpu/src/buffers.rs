//! GPU buffer management for the escape-time compute shader.

use crate::constants::{ESCAPED_BIT, ITERATION_MASK};
use bytemuck::{Pod, Zeroable};
use mandelzoom_core::{ComplexViewport, EscapeResult, RenderError};

/// Uniform block; layout must match `Uniforms` in `escape_time.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub bailout_radius_sq: f32,
    /// Center of the top-left pixel.
    pub origin_re: f32,
    pub origin_im: f32,
    pub step_re: f32,
    pub step_im: f32,
}

impl Uniforms {
    /// Pixel grid for a viewport. Origin and step are computed in
    /// double-double and rounded to f32 once.
    pub fn new(
        viewport: &ComplexViewport,
        width: u32,
        height: u32,
        max_iterations: u32,
        bailout_radius_sq: f64,
    ) -> Result<Self, RenderError> {
        let (step_re, step_im) = viewport.pixel_step(width, height)?;
        Ok(Self {
            width,
            height,
            max_iterations,
            bailout_radius_sq: bailout_radius_sq as f32,
            origin_re: viewport.column_re(0, width).to_f64() as f32,
            origin_im: viewport.row_im(0, height).to_f64() as f32,
            step_re: step_re.to_f64() as f32,
            step_im: step_im.to_f64() as f32,
        })
    }
}

/// Unpack a shader result word.
#[inline]
pub fn decode_result(word: u32) -> EscapeResult {
    EscapeResult {
        iterations: word & ITERATION_MASK,
        escaped: word & ESCAPED_BIT != 0,
    }
}

/// Buffers for one raster size. Recreated only when the size changes.
pub struct GpuBuffers {
    pub uniforms: wgpu::Buffer,
    pub results: wgpu::Buffer,
    pub staging_results: wgpu::Buffer,
    pub pixel_count: usize,
}

impl GpuBuffers {
    /// Byte size of the result buffer for a raster, if it fits in u64.
    pub fn results_size(width: u32, height: u32) -> Option<u64> {
        u64::from(width)
            .checked_mul(u64::from(height))?
            .checked_mul(std::mem::size_of::<u32>() as u64)
    }

    /// Callers check `results_size` against device limits first.
    pub fn new(device: &wgpu::Device, results_size: u64) -> Self {
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("escape_time_uniforms"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let results = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("escape_time_results"),
            size: results_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_results = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("escape_time_staging_results"),
            size: results_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            uniforms,
            results,
            staging_results,
            pixel_count: (results_size / std::mem::size_of::<u32>() as u64) as usize,
        }
    }
}
