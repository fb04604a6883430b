//! Renderer configuration and the default iteration-budget policy.
//!
//! This module holds the configuration read by the orchestrator and the
//! backends, plus pure helpers shared by both.

use crate::ComplexViewport;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Width of the home view; magnification is measured against it.
pub const REFERENCE_WIDTH: f64 = 3.0;

/// Squared bailout radius: |z| > 2 guarantees divergence.
pub const DEFAULT_BAILOUT_RADIUS_SQ: f64 = 4.0;

/// Default iteration-budget policy.
pub static DEFAULT_ITERATION_POLICY: IterationPolicy = IterationPolicy {
    reference_width: REFERENCE_WIDTH,
    base_iterations: 256,
    scale: 100.0,
    power: 1.5,
    min_iterations: 64,
    max_iterations: 100_000,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Maps viewport width to a default iteration budget.
///
/// `zoom_exponent = max(0, log10(reference_width / width))`,
/// `iterations = base + scale * zoom_exponent^power`, clamped to
/// `[min_iterations, max_iterations]`. Deeper zoom never lowers the budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationPolicy {
    pub reference_width: f64,
    pub base_iterations: u32,
    pub scale: f64,
    pub power: f64,
    pub min_iterations: u32,
    pub max_iterations: u32,
}

impl Default for IterationPolicy {
    fn default() -> Self {
        DEFAULT_ITERATION_POLICY.clone()
    }
}

impl IterationPolicy {
    /// Iteration budget for a viewport of the given real-axis width.
    pub fn iterations_for_width(&self, width: f64) -> u32 {
        let zoom = self.reference_width / width;
        let zoom_exponent = if zoom.is_finite() && zoom > 1.0 {
            zoom.log10()
        } else if zoom.is_infinite() {
            return self.max_iterations.max(self.min_iterations);
        } else {
            0.0
        };

        let raw = f64::from(self.base_iterations) + self.scale * zoom_exponent.powf(self.power);
        let clamped = raw
            .min(f64::from(self.max_iterations))
            .max(f64::from(self.min_iterations));
        clamped as u32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.reference_width.is_finite() && self.reference_width > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "reference_width must be positive, got {}",
                self.reference_width
            )));
        }
        if !(self.scale.is_finite() && self.scale >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "scale must be non-negative, got {}",
                self.scale
            )));
        }
        if !(self.power.is_finite() && self.power > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "power must be positive, got {}",
                self.power
            )));
        }
        if self.min_iterations == 0 || self.min_iterations > self.max_iterations {
            return Err(ConfigError::Invalid(format!(
                "iteration bounds must satisfy 0 < min <= max, got {}..{}",
                self.min_iterations, self.max_iterations
            )));
        }
        Ok(())
    }
}

/// Fixed color palettes available to the colorizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    #[default]
    Classic,
    Fire,
    Ocean,
    Grayscale,
}

impl std::str::FromStr for PaletteKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(PaletteKind::Classic),
            "fire" => Ok(PaletteKind::Fire),
            "ocean" => Ok(PaletteKind::Ocean),
            "grayscale" => Ok(PaletteKind::Grayscale),
            other => Err(ConfigError::Invalid(format!("unknown palette {other:?}"))),
        }
    }
}

/// Configuration consumed by the renderer core. Read-only once constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Try the GPU backend before the CPU backend.
    pub gpu_enabled: bool,
    /// Squared escape radius; must be at least 4.
    pub bailout_radius_sq: f64,
    /// CPU worker threads; 0 uses one per available core.
    pub cpu_threads: usize,
    pub palette: PaletteKind,
    pub iterations: IterationPolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            gpu_enabled: true,
            bailout_radius_sq: DEFAULT_BAILOUT_RADIUS_SQ,
            cpu_threads: 0,
            palette: PaletteKind::default(),
            iterations: IterationPolicy::default(),
        }
    }
}

impl RendererConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.bailout_radius_sq.is_finite() && self.bailout_radius_sq >= 4.0) {
            return Err(ConfigError::Invalid(format!(
                "bailout_radius_sq must be finite and >= 4, got {}",
                self.bailout_radius_sq
            )));
        }
        self.iterations.validate()
    }
}

/// Default iteration budget for a viewport.
pub fn calculate_render_max_iterations(viewport: &ComplexViewport, policy: &IterationPolicy) -> u32 {
    policy.iterations_for_width(viewport.width().to_f64())
}
