//! Render error taxonomy.

use thiserror::Error;

/// Errors surfaced by renderers and the orchestrator.
///
/// GPU-path variants are fallback signals: the orchestrator retries the same
/// request once on the CPU. `InvalidViewport` means caller misuse and is never
/// retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("GPU device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("GPU pipeline compilation failed: {0}")]
    PipelineCompilationFailed(String),

    #[error("GPU execution failed: {0}")]
    DeviceExecutionFailed(String),

    #[error("GPU precision exceeded: pixel step {step:e} is below f32 resolution at magnitude {magnitude:e}")]
    PrecisionExceeded { step: f64, magnitude: f64 },

    #[error("Out of memory rendering {width}x{height}: {reason}")]
    OutOfMemory {
        width: u32,
        height: u32,
        reason: String,
    },
}

impl RenderError {
    /// True when the failure is specific to the GPU path and the request may
    /// be retried on the CPU backend.
    pub fn is_gpu_recoverable(&self) -> bool {
        !matches!(self, RenderError::InvalidViewport(_))
    }

    pub fn invalid_viewport(msg: impl Into<String>) -> Self {
        RenderError::InvalidViewport(msg.into())
    }
}
