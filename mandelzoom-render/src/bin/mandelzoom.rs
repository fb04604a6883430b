//! Still-frame export: render a view of the Mandelbrot set to PNG.

use anyhow::{Context, Result};
use clap::Parser;
use mandelzoom_render::{
    ComplexViewport, PaletteKind, RenderOrchestrator, RenderOutput, RendererConfig, ViewBounds,
};
use std::path::PathBuf;

/// Render the Mandelbrot set to a PNG file
#[derive(Parser, Debug)]
#[command(name = "mandelzoom")]
#[command(version)]
struct Args {
    /// Output PNG path
    #[arg(short, long, default_value = "mandelbrot.png")]
    output: PathBuf,

    /// View bounds as X_MIN X_MAX Y_MIN Y_MAX (decimal, extra digits kept)
    #[arg(
        long,
        num_args = 4,
        value_names = ["X_MIN", "X_MAX", "Y_MIN", "Y_MAX"],
        allow_hyphen_values = true
    )]
    bounds: Option<Vec<String>>,

    /// Image width in pixels
    #[arg(long, default_value = "1024")]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value = "768")]
    height: u32,

    /// Zoom factor applied about the center of the bounds
    #[arg(long)]
    zoom: Option<f64>,

    /// Expand the bounds so pixels come out square
    #[arg(long)]
    square_pixels: bool,

    /// Iteration budget (default: derived from zoom depth)
    #[arg(short, long)]
    iterations: Option<u32>,

    /// CPU worker threads (0 = one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Color palette: classic, fire, ocean, grayscale
    #[arg(long)]
    palette: Option<PaletteKind>,

    /// JSON renderer config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the GPU backend
    #[arg(long)]
    cpu_only: bool,
}

fn load_config(args: &Args) -> Result<RendererConfig> {
    let mut config = match &args.config {
        Some(path) => RendererConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RendererConfig::default(),
    };

    if args.cpu_only {
        config.gpu_enabled = false;
    }
    if let Some(threads) = args.threads {
        config.cpu_threads = threads;
    }
    if let Some(palette) = args.palette {
        config.palette = palette;
    }
    config.validate()?;
    Ok(config)
}

fn build_viewport(args: &Args) -> Result<ComplexViewport> {
    let mut viewport = match args.bounds.as_deref() {
        Some([x_min, x_max, y_min, y_max]) => {
            ViewBounds::parse_viewport(x_min, x_max, y_min, y_max)?
        }
        Some(other) => anyhow::bail!("--bounds takes 4 values, got {}", other.len()),
        None => ComplexViewport::home(),
    };

    if let Some(factor) = args.zoom {
        viewport = viewport.zoom_about_center(factor)?;
    }
    if args.square_pixels {
        viewport = viewport.fit_to_aspect(args.width, args.height)?;
    }
    Ok(viewport)
}

/// One-line report of a finished render, including any fallback.
fn render_summary(output: &RenderOutput) -> String {
    let fallback = output
        .fallback
        .as_ref()
        .map(|event| format!(" ({event})"))
        .unwrap_or_default();
    format!(
        "Rendered {}x{} on {}{} in {:.3}s",
        output.width, output.height, output.backend, fallback, output.elapsed_seconds
    )
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let viewport = build_viewport(&args)?;

    let bounds = ViewBounds::from(&viewport);
    log::info!(
        "Rendering {}x{} centered at ({}, {}), magnification {:.3e}",
        args.width,
        args.height,
        bounds.center_x(),
        bounds.center_y(),
        viewport.magnification()
    );

    let orchestrator = RenderOrchestrator::new(config);
    let output = orchestrator.render(&viewport, args.width, args.height, args.iterations)?;

    let summary = render_summary(&output);
    let image = image::RgbaImage::from_raw(output.width, output.height, output.pixels)
        .context("raster size does not match dimensions")?;
    image
        .save_with_format(&args.output, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!("{summary} -> {}", args.output.display());
    Ok(())
}
