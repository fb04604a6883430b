//! Mandelbrot renderer front end: backend selection with CPU fallback.

pub mod orchestrator;

pub use orchestrator::RenderOrchestrator;

// Re-export the types callers need alongside the orchestrator
pub use mandelzoom_compute::{ColorMapper, CpuBackend};
pub use mandelzoom_core::*;
pub use mandelzoom_gpu::{GpuBackend, GpuError};
