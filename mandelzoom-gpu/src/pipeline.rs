//! Compute pipeline for the escape-time shader.

use crate::error::GpuError;

pub const ESCAPE_TIME_SHADER: &str = include_str!("shaders/escape_time.wgsl");

pub struct GpuPipeline {
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub compute_pipeline: wgpu::ComputePipeline,
}

impl GpuPipeline {
    /// Compile the built-in escape-time shader.
    pub async fn new(device: &wgpu::Device) -> Result<Self, GpuError> {
        Self::from_wgsl(device, ESCAPE_TIME_SHADER).await
    }

    /// Compile a shader with the escape-time binding layout.
    ///
    /// Shader and pipeline validation errors are captured in an error scope
    /// and returned as `PipelineCompilation` instead of reaching the device's
    /// uncaptured-error handler.
    pub async fn from_wgsl(device: &wgpu::Device, source: &str) -> Result<Self, GpuError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("escape_time_shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("escape_time_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("escape_time_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("escape_time_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        if let Some(err) = device.pop_error_scope().await {
            return Err(GpuError::PipelineCompilation(err.to_string()));
        }

        log::info!("Escape-time compute pipeline ready");

        Ok(Self {
            bind_group_layout,
            compute_pipeline,
        })
    }
}
