//! GPU-accelerated Mandelbrot rendering using wgpu.

mod buffers;
mod constants;
mod device;
mod error;
mod pipeline;
mod renderer;
#[cfg(test)]
mod tests;

pub use buffers::{decode_result, GpuBuffers, Uniforms};
pub use constants::{ESCAPED_BIT, ITERATION_MASK, MIN_RELATIVE_STEP, WORKGROUP_SIZE};
pub use device::{GpuAvailability, GpuContext};
pub use error::GpuError;
pub use pipeline::{GpuPipeline, ESCAPE_TIME_SHADER};
pub use renderer::{check_f32_resolution, GpuBackend, GpuRenderResult};
