pub mod colorizer;
pub mod cpu_backend;
pub mod kernel;

pub use colorizer::{ColorMapper, ColorStop, Gradient, INTERIOR_COLOR};
pub use cpu_backend::CpuBackend;
pub use kernel::{compute_escape_grid, evaluate};

// Re-export core types for convenience
pub use mandelzoom_core::*;
