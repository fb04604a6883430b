//! GPU error types.

use mandelzoom_core::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("No GPU adapter found")]
    NoAdapter,

    #[error("Failed to create device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    #[error("Buffer mapping failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("Shader pipeline failed to compile: {0}")]
    PipelineCompilation(String),

    #[error("GPU dispatch failed: {0}")]
    Execution(String),

    #[error("Raster {width}x{height} does not fit on the device: {reason}")]
    OutOfMemory {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("Pixel step {step:e} is below f32 resolution at magnitude {magnitude:e}")]
    PrecisionExceeded { step: f64, magnitude: f64 },

    #[error("GPU unavailable: {0}")]
    Unavailable(String),
}

impl From<GpuError> for RenderError {
    fn from(e: GpuError) -> Self {
        match e {
            GpuError::NoAdapter | GpuError::DeviceCreation(_) | GpuError::Unavailable(_) => {
                RenderError::DeviceUnavailable(e.to_string())
            }
            GpuError::PipelineCompilation(msg) => RenderError::PipelineCompilationFailed(msg),
            GpuError::BufferMap(_) | GpuError::Execution(_) => {
                RenderError::DeviceExecutionFailed(e.to_string())
            }
            GpuError::OutOfMemory {
                width,
                height,
                reason,
            } => RenderError::OutOfMemory {
                width,
                height,
                reason,
            },
            GpuError::PrecisionExceeded { step, magnitude } => {
                RenderError::PrecisionExceeded { step, magnitude }
            }
        }
    }
}
