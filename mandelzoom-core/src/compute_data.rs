use serde::{Deserialize, Serialize};

/// Outcome of iterating a single point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeResult {
    /// Iterations performed before escape, or the full budget if the point
    /// never escaped.
    pub iterations: u32,
    /// Whether |z|² exceeded the bailout radius.
    pub escaped: bool,
}

impl EscapeResult {
    pub fn escaped_at(iterations: u32) -> Self {
        Self {
            iterations,
            escaped: true,
        }
    }

    pub fn interior(max_iterations: u32) -> Self {
        Self {
            iterations: max_iterations,
            escaped: false,
        }
    }
}
