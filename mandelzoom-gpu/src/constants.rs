/// Workgroup edge length; must match `@workgroup_size` in the shader.
pub const WORKGROUP_SIZE: u32 = 8;

/// Bit 31 of a result word: the point escaped.
pub const ESCAPED_BIT: u32 = 1 << 31;

/// Bits 0..30 of a result word: iteration count.
pub const ITERATION_MASK: u32 = ESCAPED_BIT - 1;

/// Smallest pixel step, relative to the coordinate magnitude, that f32 can
/// still separate from its neighbour with a few ulps to spare.
pub const MIN_RELATIVE_STEP: f64 = 4.0 * f32::EPSILON as f64;
