//! Tests for the GPU backend. Each test skips itself when no adapter exists.

use crate::{GpuAvailability, GpuBackend, GpuContext, GpuError, GpuPipeline};
use mandelzoom_compute::{compute_escape_grid, ColorMapper, CpuBackend, INTERIOR_COLOR};
use mandelzoom_core::{
    ComplexViewport, F32Complex, RenderBackend, RenderError, RendererConfig,
    DEFAULT_BAILOUT_RADIUS_SQ,
};

async fn backend() -> Option<GpuBackend> {
    let GpuAvailability::Available(ctx) = GpuContext::try_init().await else {
        println!("Skipping test: no GPU available");
        return None;
    };
    match GpuBackend::new(ctx, &RendererConfig::default()).await {
        Ok(backend) => Some(backend),
        Err(e) => {
            println!("Skipping test: pipeline unavailable: {e}");
            None
        }
    }
}

/// Test that GPU initialization doesn't panic.
#[test]
fn gpu_init_does_not_panic() {
    pollster::block_on(async {
        match GpuContext::try_init().await {
            GpuAvailability::Available(ctx) => {
                println!("GPU available: {}", ctx.adapter_info.name);
            }
            GpuAvailability::Unavailable(reason) => {
                println!("GPU unavailable: {reason}");
            }
        }
    });
}

#[test]
fn try_init_reports_device_unavailable_or_succeeds() {
    match GpuBackend::try_init(&RendererConfig::default()) {
        Ok(backend) => println!("GPU backend on {}", backend.adapter_info().name),
        Err(e) => assert!(e.is_gpu_recoverable(), "unexpected error {e}"),
    }
}

/// GPU classification must match the f32 CPU kernel on the home view.
#[test]
fn gpu_matches_f32_kernel_classification() {
    pollster::block_on(async {
        let Some(mut gpu) = backend().await else {
            return;
        };

        let vp = ComplexViewport::home();
        let (width, height, max_iter) = (128, 128, 256);

        let gpu_result = gpu.compute(&vp, width, height, max_iter).await.unwrap();
        let cpu = compute_escape_grid::<F32Complex>(
            &vp,
            width,
            height,
            max_iter,
            DEFAULT_BAILOUT_RADIUS_SQ,
        )
        .unwrap();

        assert_eq!(gpu_result.results.len(), cpu.len());
        let agree = gpu_result
            .results
            .iter()
            .zip(&cpu)
            .filter(|(g, c)| g.escaped == c.escaped)
            .count();
        let ratio = agree as f64 / cpu.len() as f64;
        println!("GPU/CPU classification agreement: {:.4}", ratio);
        assert!(ratio >= 0.99, "agreement {ratio:.4}");

        let cpu_interior = cpu.iter().filter(|r| !r.escaped).count() as f64;
        let gpu_interior = gpu_result.interior_count() as f64;
        assert!((cpu_interior - gpu_interior).abs() <= cpu_interior * 0.01);
    });
}

/// Full GPU render against the double-double CPU render of the same view.
#[test]
fn gpu_render_matches_cpu_render_classification() {
    pollster::block_on(async {
        let Some(mut gpu) = backend().await else {
            return;
        };
        let mut cpu = CpuBackend::from_config(&RendererConfig::default());

        let vp = ComplexViewport::home();
        let (width, height, max_iter) = (160, 160, 256);

        let gpu_out = gpu.render(&vp, width, height, max_iter).unwrap();
        let cpu_out = cpu.render(&vp, width, height, max_iter).unwrap();
        assert_eq!(gpu_out.pixels.len(), cpu_out.pixels.len());

        let is_interior = |px: &[u8]| px == INTERIOR_COLOR;
        let total = (width * height) as usize;
        let agree = gpu_out
            .pixels
            .chunks_exact(4)
            .zip(cpu_out.pixels.chunks_exact(4))
            .filter(|&(g, c)| is_interior(g) == is_interior(c))
            .count();
        let ratio = agree as f64 / total as f64;
        println!("GPU/CPU render agreement: {:.4}", ratio);
        assert!(ratio >= 0.99, "agreement {ratio:.4}");

        let interior_count =
            |pixels: &[u8]| pixels.chunks_exact(4).filter(|&px| is_interior(px)).count() as f64;
        let gpu_interior = interior_count(&gpu_out.pixels);
        let cpu_interior = interior_count(&cpu_out.pixels);
        assert!(cpu_interior > 0.0);
        assert!(
            (cpu_interior - gpu_interior).abs() <= cpu_interior * 0.01,
            "interior GPU {gpu_interior} vs CPU {cpu_interior}"
        );
    });
}

#[test]
fn gpu_output_is_colorized_raster() {
    pollster::block_on(async {
        let Some(mut gpu) = backend().await else {
            return;
        };

        let vp = ComplexViewport::from_bounds(-0.6, -0.4, -0.1, 0.1).unwrap();
        let out = gpu.render(&vp, 9, 9, 200).unwrap();
        assert_eq!(out.pixels.len(), 9 * 9 * 4);
        assert_eq!(out.pixel(4, 4), Some(INTERIOR_COLOR));
        assert!(out.pixels.chunks_exact(4).all(|px| px[3] == 255));
    });
}

#[test]
fn gpu_and_cpu_colors_share_one_mapper() {
    pollster::block_on(async {
        let Some(mut gpu) = backend().await else {
            return;
        };

        // Far from the boundary both precisions agree exactly
        let vp = ComplexViewport::from_bounds(1.0, 2.0, 1.0, 2.0).unwrap();
        let result = gpu.compute(&vp, 16, 16, 50).await.unwrap();
        let mut expected = vec![0u8; 16 * 16 * 4];
        ColorMapper::default().colorize_into(&result.results, 50, &mut expected);

        let out = gpu.render(&vp, 16, 16, 50).unwrap();
        assert!(out.pixels == expected);
    });
}

#[test]
fn buffers_are_reused_for_same_dimensions() {
    pollster::block_on(async {
        let Some(mut gpu) = backend().await else {
            return;
        };

        let vp = ComplexViewport::home();
        gpu.compute(&vp, 32, 16, 64).await.unwrap();
        assert_eq!(gpu.buffer_dimensions(), Some((32, 16)));
        gpu.compute(&vp, 32, 16, 64).await.unwrap();
        assert_eq!(gpu.buffer_dimensions(), Some((32, 16)));
        gpu.compute(&vp, 8, 8, 64).await.unwrap();
        assert_eq!(gpu.buffer_dimensions(), Some((8, 8)));
    });
}

#[test]
fn deep_zoom_reports_precision_exceeded() {
    pollster::block_on(async {
        let Some(mut gpu) = backend().await else {
            return;
        };

        let vp = ComplexViewport::from_bounds(-0.7436, -0.7436 + 1e-9, 0.1318, 0.1318 + 1e-9)
            .unwrap();
        let err = gpu.render(&vp, 100, 100, 500).unwrap_err();
        assert!(matches!(err, RenderError::PrecisionExceeded { .. }), "got {err:?}");
    });
}

#[test]
fn oversized_raster_reports_out_of_memory() {
    pollster::block_on(async {
        let Some(mut gpu) = backend().await else {
            return;
        };

        let err = gpu
            .render(&ComplexViewport::home(), 1_000_000, 1_000_000, 10)
            .unwrap_err();
        assert!(matches!(err, RenderError::OutOfMemory { .. }), "got {err:?}");
    });
}

#[test]
fn broken_shader_reports_pipeline_compilation_failure() {
    pollster::block_on(async {
        let GpuAvailability::Available(ctx) = GpuContext::try_init().await else {
            println!("Skipping test: no GPU available");
            return;
        };

        let result = GpuPipeline::from_wgsl(&ctx.device, "@compute fn main( {").await;
        let Err(err) = result else {
            panic!("broken shader compiled");
        };
        assert!(matches!(err, GpuError::PipelineCompilation(_)));
        assert!(matches!(
            RenderError::from(err),
            RenderError::PipelineCompilationFailed(_)
        ));
    });
}
