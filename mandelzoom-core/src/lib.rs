pub mod backend;
pub mod bounds;
pub mod complex;
pub mod compute_data;
pub mod config;
pub mod double_double;
pub mod error;
pub mod pixel_rect;
pub mod viewport;

pub use backend::{BackendKind, FallbackEvent, RenderBackend, RenderOutput};
pub use bounds::ViewBounds;
pub use complex::{DdComplex, EscapeComplex, F32Complex, F64Complex};
pub use compute_data::EscapeResult;
pub use config::{
    calculate_render_max_iterations, ConfigError, IterationPolicy, PaletteKind, RendererConfig,
    DEFAULT_BAILOUT_RADIUS_SQ, DEFAULT_ITERATION_POLICY, REFERENCE_WIDTH,
};
pub use double_double::{DoubleDouble, ParseDoubleDoubleError};
pub use error::RenderError;
pub use pixel_rect::PixelRect;
pub use viewport::ComplexViewport;
