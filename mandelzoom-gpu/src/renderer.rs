//! High-level GPU renderer API.

use crate::buffers::{decode_result, GpuBuffers, Uniforms};
use crate::constants::{ITERATION_MASK, MIN_RELATIVE_STEP, WORKGROUP_SIZE};
use crate::device::GpuContext;
use crate::error::GpuError;
use crate::pipeline::GpuPipeline;
use mandelzoom_compute::ColorMapper;
use mandelzoom_core::{
    BackendKind, ComplexViewport, EscapeResult, RenderBackend, RenderError, RenderOutput,
    RendererConfig,
};
use std::time::Instant;

/// Escape results read back from the device.
pub struct GpuRenderResult {
    pub results: Vec<EscapeResult>,
    pub compute_time_ms: f64,
}

impl GpuRenderResult {
    pub fn interior_count(&self) -> usize {
        self.results.iter().filter(|r| !r.escaped).count()
    }
}

/// Fail when neighbouring pixel centers would collapse in f32.
///
/// The shader derives each `c` from an f32 origin plus an f32 step, so the
/// step must stay well above one ulp at the viewport's largest coordinate.
pub fn check_f32_resolution(
    viewport: &ComplexViewport,
    width: u32,
    height: u32,
) -> Result<(), GpuError> {
    let (step_re, step_im) = viewport
        .pixel_step(width, height)
        .map_err(|e| GpuError::Execution(e.to_string()))?;
    let step = step_re.to_f64().min(step_im.to_f64());
    let magnitude = viewport.max_abs_coordinate().max(1.0);

    if step / magnitude < MIN_RELATIVE_STEP {
        return Err(GpuError::PrecisionExceeded { step, magnitude });
    }
    Ok(())
}

/// wgpu compute backend evaluating the escape-time loop in f32.
///
/// Device, queue and pipeline are acquired once; buffers are reused while
/// the raster size is unchanged. Colors are applied on the host.
pub struct GpuBackend {
    context: GpuContext,
    pipeline: GpuPipeline,
    buffers: Option<GpuBuffers>,
    current_dimensions: Option<(u32, u32)>,
    bailout_radius_sq: f64,
    colorizer: ColorMapper,
}

impl GpuBackend {
    pub async fn new(context: GpuContext, config: &RendererConfig) -> Result<Self, GpuError> {
        let pipeline = GpuPipeline::new(&context.device).await?;
        Ok(Self {
            context,
            pipeline,
            buffers: None,
            current_dimensions: None,
            bailout_radius_sq: config.bailout_radius_sq,
            colorizer: ColorMapper::new(config.palette),
        })
    }

    /// Acquire an adapter, device and pipeline, blocking until done.
    pub fn try_init(config: &RendererConfig) -> Result<Self, RenderError> {
        pollster::block_on(async {
            let context = GpuContext::init().await?;
            Self::new(context, config).await
        })
        .map_err(|e| {
            log::warn!("GPU backend unavailable: {e}");
            RenderError::from(e)
        })
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.context.adapter_info
    }

    /// Raster size the current buffers were built for.
    pub fn buffer_dimensions(&self) -> Option<(u32, u32)> {
        self.current_dimensions
    }

    /// Check a raster against the device limits and return the result
    /// buffer size.
    fn check_limits(&self, width: u32, height: u32) -> Result<u64, GpuError> {
        let limits = self.context.device.limits();
        let oom = |reason: String| GpuError::OutOfMemory {
            width,
            height,
            reason,
        };

        let size = GpuBuffers::results_size(width, height)
            .ok_or_else(|| oom("result size overflows u64".to_string()))?;
        if size > limits.max_buffer_size {
            return Err(oom(format!(
                "{size} bytes exceeds max_buffer_size {}",
                limits.max_buffer_size
            )));
        }
        if size > u64::from(limits.max_storage_buffer_binding_size) {
            return Err(oom(format!(
                "{size} bytes exceeds max_storage_buffer_binding_size {}",
                limits.max_storage_buffer_binding_size
            )));
        }

        let groups_x = width.div_ceil(WORKGROUP_SIZE);
        let groups_y = height.div_ceil(WORKGROUP_SIZE);
        let max_groups = limits.max_compute_workgroups_per_dimension;
        if groups_x > max_groups || groups_y > max_groups {
            return Err(oom(format!(
                "dispatch {groups_x}x{groups_y} exceeds {max_groups} workgroups per dimension"
            )));
        }
        Ok(size)
    }

    async fn ensure_buffers(&mut self, width: u32, height: u32) -> Result<(), GpuError> {
        if self.current_dimensions == Some((width, height)) && self.buffers.is_some() {
            return Ok(());
        }
        let size = self.check_limits(width, height)?;

        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffers = GpuBuffers::new(device, size);
        if let Some(err) = device.pop_error_scope().await {
            self.buffers = None;
            self.current_dimensions = None;
            return Err(GpuError::OutOfMemory {
                width,
                height,
                reason: err.to_string(),
            });
        }

        log::debug!("Allocated GPU buffers for {width}x{height}");
        self.buffers = Some(buffers);
        self.current_dimensions = Some((width, height));
        Ok(())
    }

    /// Evaluate every pixel on the device and read back the escape results.
    pub async fn compute(
        &mut self,
        viewport: &ComplexViewport,
        width: u32,
        height: u32,
        max_iterations: u32,
    ) -> Result<GpuRenderResult, GpuError> {
        if max_iterations > ITERATION_MASK {
            return Err(GpuError::Execution(format!(
                "iteration budget {max_iterations} does not fit the 31-bit result word"
            )));
        }
        check_f32_resolution(viewport, width, height)?;
        let uniforms = Uniforms::new(
            viewport,
            width,
            height,
            max_iterations,
            self.bailout_radius_sq,
        )
        .map_err(|e| GpuError::Execution(e.to_string()))?;

        let start = Instant::now();
        self.ensure_buffers(width, height).await?;
        let buffers = self
            .buffers
            .as_ref()
            .ok_or_else(|| GpuError::Execution("buffers missing after allocation".into()))?;

        let device = &self.context.device;
        let queue = &self.context.queue;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        queue.write_buffer(&buffers.uniforms, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("escape_time_bind_group"),
            layout: &self.pipeline.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.results.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("escape_time_encoder"),
        });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("escape_time_pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline.compute_pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(
                width.div_ceil(WORKGROUP_SIZE),
                height.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }

        let pixel_count = width as usize * height as usize;
        encoder.copy_buffer_to_buffer(
            &buffers.results,
            0,
            &buffers.staging_results,
            0,
            (pixel_count * std::mem::size_of::<u32>()) as u64,
        );

        queue.submit(std::iter::once(encoder.finish()));

        if let Some(err) = device.pop_error_scope().await {
            return Err(GpuError::Execution(err.to_string()));
        }

        let words = self.read_buffer_u32(&buffers.staging_results).await?;
        let results = words
            .iter()
            .take(pixel_count)
            .map(|&w| decode_result(w))
            .collect();

        Ok(GpuRenderResult {
            results,
            compute_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    async fn read_buffer_u32(&self, buffer: &wgpu::Buffer) -> Result<Vec<u32>, GpuError> {
        let slice = buffer.slice(..);

        let (tx, rx) = futures_channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        self.context.device.poll(wgpu::Maintain::Wait);

        rx.await
            .map_err(|_| GpuError::Unavailable("Channel closed".into()))?
            .map_err(GpuError::BufferMap)?;

        let data = {
            let view = slice.get_mapped_range();
            bytemuck::cast_slice(&view).to_vec()
        };
        buffer.unmap();

        Ok(data)
    }
}

impl RenderBackend for GpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gpu
    }

    fn render(
        &mut self,
        viewport: &ComplexViewport,
        width: u32,
        height: u32,
        max_iterations: u32,
    ) -> Result<RenderOutput, RenderError> {
        ComplexViewport::check_raster(width, height)?;

        let start = Instant::now();
        let gpu_result = pollster::block_on(self.compute(viewport, width, height, max_iterations))?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(gpu_result.results.len() * 4)
            .map_err(|e| RenderError::OutOfMemory {
                width,
                height,
                reason: e.to_string(),
            })?;
        pixels.resize(gpu_result.results.len() * 4, 0u8);
        self.colorizer
            .colorize_into(&gpu_result.results, max_iterations, &mut pixels);

        let elapsed_seconds = start.elapsed().as_secs_f64();
        log::debug!(
            "GPU render {}x{} ({} iterations) compute {:.1}ms, total {:.1}ms",
            width,
            height,
            max_iterations,
            gpu_result.compute_time_ms,
            elapsed_seconds * 1000.0
        );

        Ok(RenderOutput {
            pixels,
            width,
            height,
            elapsed_seconds,
            backend: BackendKind::Gpu,
            fallback: None,
        })
    }
}
