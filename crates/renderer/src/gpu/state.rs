use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use driver::ShaderParameters;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;

use crate::types::ColorSpaceMode;

use super::context::GpuContext;
use super::pipeline::{EffectPipeline, PipelineLayouts};
use super::uniforms::EffectUniforms;

/// Owns the GPU context, the effect pipeline, and its uniform buffer.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: EffectPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: EffectUniforms,
    frame_count: u64,
    frames_since_last_update: u32,
    last_stats_update: Instant,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        wrapped_effect: String,
        base_color: [f32; 4],
        color_space: ColorSpaceMode,
        vsync: bool,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, color_space, vsync)?;
        let layouts = PipelineLayouts::new(&context.device);

        // Shader translation and pipeline validation errors would otherwise
        // reach the uncaptured error handler and abort the process.
        context
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = EffectPipeline::new(
            &context.device,
            &layouts,
            context.surface_format,
            wrapped_effect,
        );
        if let Some(err) = pollster::block_on(context.device.pop_error_scope()) {
            return Err(anyhow!("failed to compile color effect: {err}"));
        }

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("effect uniform buffer"),
            size: std::mem::size_of::<EffectUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("effect uniform bind group"),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let uniforms = EffectUniforms::new(base_color);
        Self::write_uniforms(&context.queue, &uniform_buffer, &uniforms);

        Ok(Self {
            context,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            frame_count: 0,
            frames_since_last_update: 0,
            last_stats_update: Instant::now(),
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size == self.context.size {
            return;
        }
        debug!(
            width = new_size.width,
            height = new_size.height,
            "resizing surface"
        );
        self.context.resize(new_size);
    }

    /// Reconfigures the surface at its current size after it was lost or outdated.
    pub(crate) fn recover_surface(&mut self) {
        self.context.reconfigure();
    }

    /// Uploads `params` and draws one frame of the effect.
    pub(crate) fn render(&mut self, params: &ShaderParameters) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;

        self.uniforms.apply(params);
        Self::write_uniforms(&self.context.queue, &self.uniform_buffer, &self.uniforms);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("effect encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("effect pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        self.frame_count += 1;
        self.frames_since_last_update += 1;
        self.log_stats(params);
        Ok(())
    }

    fn log_stats(&mut self, params: &ShaderParameters) {
        let now = Instant::now();
        let since_update = now.saturating_duration_since(self.last_stats_update);
        if since_update < Duration::from_secs(1) {
            return;
        }
        let fps = self.frames_since_last_update as f32 / since_update.as_secs_f32();
        if fps < 1.0 {
            warn!(fps, "render loop is falling behind");
        }
        debug!(
            fps = fps.round(),
            frame_count = self.frame_count,
            time = params.time,
            amplitude = params.amplitude,
            interaction = params.interaction,
            "render stats"
        );
        self.frames_since_last_update = 0;
        self.last_stats_update = now;
    }

    fn write_uniforms(queue: &wgpu::Queue, buffer: &wgpu::Buffer, uniforms: &EffectUniforms) {
        queue.write_buffer(buffer, 0, bytemuck::bytes_of(uniforms));
    }
}
