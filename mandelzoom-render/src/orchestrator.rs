//! Backend selection, iteration defaults and GPU-to-CPU fallback.

use mandelzoom_compute::CpuBackend;
use mandelzoom_core::{
    calculate_render_max_iterations, BackendKind, ComplexViewport, FallbackEvent, RenderBackend,
    RenderError, RenderOutput, RendererConfig, ViewBounds,
};
use mandelzoom_gpu::GpuBackend;
use std::sync::Mutex;
use std::time::Instant;

/// Entry point for rendering a viewport.
///
/// Tries the GPU backend when one was acquired and configuration allows it.
/// Any GPU-path error re-runs the same request once on the CPU and records a
/// [`FallbackEvent`] on the output. `InvalidViewport` is returned as-is and
/// CPU errors are terminal.
///
/// The GPU backend sits behind a mutex so a dispatch and its read-back finish
/// before the next dispatch begins. CPU renders take no lock.
pub struct RenderOrchestrator<G: RenderBackend = GpuBackend> {
    config: RendererConfig,
    gpu: Option<Mutex<G>>,
    cpu: CpuBackend,
}

impl RenderOrchestrator<GpuBackend> {
    /// Build from configuration, acquiring the GPU once when enabled.
    pub fn new(config: RendererConfig) -> Self {
        let gpu = if config.gpu_enabled {
            match GpuBackend::try_init(&config) {
                Ok(gpu) => {
                    log::info!("GPU backend ready on {}", gpu.adapter_info().name);
                    Some(gpu)
                }
                Err(e) => {
                    log::warn!("GPU backend unavailable, rendering on CPU: {e}");
                    None
                }
            }
        } else {
            log::info!("GPU disabled by configuration, rendering on CPU");
            None
        };
        Self::with_gpu(config, gpu)
    }
}

impl<G: RenderBackend> RenderOrchestrator<G> {
    /// Build with an explicit GPU backend (or none).
    pub fn with_gpu(config: RendererConfig, gpu: Option<G>) -> Self {
        let cpu = CpuBackend::from_config(&config);
        Self {
            config,
            gpu: gpu.map(Mutex::new),
            cpu,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// True when renders will try the GPU first.
    pub fn gpu_active(&self) -> bool {
        self.config.gpu_enabled && self.gpu.is_some()
    }

    /// Default iteration budget for a viewport under the configured policy.
    pub fn default_iterations(&self, viewport: &ComplexViewport) -> u32 {
        calculate_render_max_iterations(viewport, &self.config.iterations)
    }

    /// Render `viewport` into a `width` x `height` RGBA raster.
    ///
    /// `max_iterations: None` uses the configured policy.
    pub fn render(
        &self,
        viewport: &ComplexViewport,
        width: u32,
        height: u32,
        max_iterations: Option<u32>,
    ) -> Result<RenderOutput, RenderError> {
        ComplexViewport::check_raster(width, height)?;
        let max_iterations = max_iterations.unwrap_or_else(|| self.default_iterations(viewport));
        let start = Instant::now();

        let gpu = match &self.gpu {
            Some(gpu) if self.config.gpu_enabled => gpu,
            _ => return self.cpu.render_frame(viewport, width, height, max_iterations),
        };

        let gpu_result = match gpu.lock() {
            Ok(mut backend) => backend.render(viewport, width, height, max_iterations),
            Err(_) => Err(RenderError::DeviceExecutionFailed(
                "GPU backend lock poisoned by an earlier panic".to_string(),
            )),
        };

        let reason = match gpu_result {
            Ok(output) => return Ok(output),
            Err(e) if e.is_gpu_recoverable() => e,
            Err(e) => return Err(e),
        };

        log::warn!("GPU render failed, retrying on CPU: {reason}");
        let mut output = self.cpu.render_frame(viewport, width, height, max_iterations)?;
        output.elapsed_seconds = start.elapsed().as_secs_f64();
        output.fallback = Some(FallbackEvent {
            from: BackendKind::Gpu,
            to: BackendKind::Cpu,
            reason,
        });
        Ok(output)
    }

    /// Render the home view (-2-1.5i .. 1+1.5i) with the default budget.
    pub fn render_default(&self, width: u32, height: u32) -> Result<RenderOutput, RenderError> {
        self.render(&ComplexViewport::home(), width, height, None)
    }

    /// Render from plain f64 bounds.
    pub fn render_bounds(
        &self,
        bounds: ViewBounds,
        width: u32,
        height: u32,
        max_iterations: Option<u32>,
    ) -> Result<RenderOutput, RenderError> {
        let viewport = ComplexViewport::try_from(bounds)?;
        self.render(&viewport, width, height, max_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// GPU stand-in that always fails with the given error.
    struct FailingGpu {
        error: RenderError,
        calls: Arc<AtomicUsize>,
    }

    impl RenderBackend for FailingGpu {
        fn kind(&self) -> BackendKind {
            BackendKind::Gpu
        }

        fn render(
            &mut self,
            _viewport: &ComplexViewport,
            _width: u32,
            _height: u32,
            _max_iterations: u32,
        ) -> Result<RenderOutput, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    fn cpu_only_config() -> RendererConfig {
        RendererConfig {
            gpu_enabled: false,
            ..RendererConfig::default()
        }
    }

    fn failing(error: RenderError) -> (RenderOrchestrator<FailingGpu>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let gpu = FailingGpu {
            error,
            calls: calls.clone(),
        };
        (
            RenderOrchestrator::with_gpu(RendererConfig::default(), Some(gpu)),
            calls,
        )
    }

    #[test]
    fn cpu_only_render_has_no_fallback() {
        let orchestrator = RenderOrchestrator::<FailingGpu>::with_gpu(cpu_only_config(), None);
        let out = orchestrator.render_default(64, 48).unwrap();
        assert_eq!(out.backend, BackendKind::Cpu);
        assert!(out.fallback.is_none());
        assert_eq!(out.pixels.len(), 64 * 48 * 4);
    }

    #[test]
    fn disabled_gpu_is_never_called() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gpu = FailingGpu {
            error: RenderError::DeviceUnavailable("unused".into()),
            calls: calls.clone(),
        };
        let orchestrator = RenderOrchestrator::with_gpu(cpu_only_config(), Some(gpu));
        assert!(!orchestrator.gpu_active());
        orchestrator.render_default(16, 16).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn pipeline_failure_falls_back_to_cpu() {
        let (orchestrator, calls) =
            failing(RenderError::PipelineCompilationFailed("bad shader".into()));
        let out = orchestrator.render_default(32, 32).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(out.backend, BackendKind::Cpu);
        let event = out.fallback.expect("fallback event");
        assert_eq!(event.from, BackendKind::Gpu);
        assert_eq!(event.to, BackendKind::Cpu);
        assert!(matches!(event.reason, RenderError::PipelineCompilationFailed(_)));
    }

    #[test]
    fn fallback_output_matches_plain_cpu_render() {
        let (orchestrator, _) = failing(RenderError::PrecisionExceeded {
            step: 1e-12,
            magnitude: 1.0,
        });
        let cpu = RenderOrchestrator::<FailingGpu>::with_gpu(cpu_only_config(), None);

        let vp = ComplexViewport::from_bounds(-0.76, -0.72, 0.08, 0.12).unwrap();
        let a = orchestrator.render(&vp, 40, 30, Some(200)).unwrap();
        let b = cpu.render(&vp, 40, 30, Some(200)).unwrap();
        assert!(a.pixels == b.pixels);
    }

    #[test]
    fn invalid_raster_is_rejected_before_any_backend() {
        let (orchestrator, calls) = failing(RenderError::DeviceUnavailable("x".into()));
        let err = orchestrator.render_default(0, 10).unwrap_err();
        assert!(matches!(err, RenderError::InvalidViewport(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_viewport_from_gpu_is_not_retried() {
        let (orchestrator, calls) = failing(RenderError::invalid_viewport("bad"));
        let err = orchestrator.render_default(8, 8).unwrap_err();
        assert!(matches!(err, RenderError::InvalidViewport(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn each_render_retries_at_most_once() {
        let (orchestrator, calls) =
            failing(RenderError::DeviceExecutionFailed("lost device".into()));
        for _ in 0..3 {
            let out = orchestrator.render_default(8, 8).unwrap();
            assert!(out.used_fallback());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn cpu_out_of_memory_is_terminal() {
        let (orchestrator, _) = failing(RenderError::OutOfMemory {
            width: u32::MAX,
            height: u32::MAX,
            reason: "device limits".into(),
        });
        let err = orchestrator
            .render(&ComplexViewport::home(), u32::MAX, u32::MAX, Some(1))
            .unwrap_err();
        assert!(matches!(err, RenderError::OutOfMemory { .. }));
    }

    #[test]
    fn explicit_budget_overrides_policy() {
        let orchestrator = RenderOrchestrator::<FailingGpu>::with_gpu(cpu_only_config(), None);
        assert_eq!(orchestrator.default_iterations(&ComplexViewport::home()), 256);

        // With a budget of 1 every escaped pixel hits t = 1
        let out = orchestrator
            .render(&ComplexViewport::from_bounds(5.0, 6.0, 5.0, 6.0).unwrap(), 2, 2, Some(1))
            .unwrap();
        assert_eq!(out.pixel(0, 0), Some([237, 255, 255, 255]));
    }

    #[test]
    fn render_bounds_validates_bounds() {
        let orchestrator = RenderOrchestrator::<FailingGpu>::with_gpu(cpu_only_config(), None);
        let err = orchestrator
            .render_bounds(ViewBounds::new(1.0, -1.0, 0.0, 1.0), 4, 4, None)
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidViewport(_)));
        assert!(orchestrator
            .render_bounds(ViewBounds::HOME, 4, 4, None)
            .is_ok());
    }
}
