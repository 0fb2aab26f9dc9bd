//! wgpu implementation of [`SpriteBackend`].
//!
//! Point sprites are emulated with instanced quads: each sprite is one
//! instance of six vertices, and every attribute lives in its own
//! per-instance vertex buffer. Each batch is written, encoded and submitted
//! on its own so a reused buffer is never overwritten before the previous
//! batch has been drawn from it.
//!
//! The backend draws into an explicit target set with
//! [`GpuSpriteBackend::set_target`], or into a window surface attached with
//! [`GpuSpriteBackend::with_surface`], in which case each frame acquires and
//! presents a swapchain texture.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::color::Color;
use crate::error::RenderError;
use crate::projection::Viewport;
use crate::render::batch::{GlyphBatch, ParticleBatch, SpriteBackend};
use crate::render::shaders::{ProgramKind, VERTICES_PER_SPRITE};

use super::{GpuContext, ShaderManager};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    resolution: [f32; 2],
    _padding: [f32; 2],
}

impl Uniforms {
    fn new(viewport: Viewport) -> Self {
        Self {
            resolution: [viewport.width, viewport.height],
            _padding: [0.0; 2],
        }
    }
}

/// Floats per sprite in each particle attribute buffer.
const PARTICLE_COMPONENTS: [u64; 4] = [2, 3, 1, 1];
/// Floats per glyph in each glyph attribute buffer.
const GLYPH_COMPONENTS: [u64; 5] = [2, 3, 1, 2, 1];

struct GpuResources {
    shaders: ShaderManager,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    particle_buffers: Vec<wgpu::Buffer>,
    glyph_buffers: Vec<wgpu::Buffer>,
    capacity: usize,
}

/// Window surface the backend presents to.
struct Presenter {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    frame: Option<wgpu::SurfaceTexture>,
}

pub struct GpuSpriteBackend {
    context: GpuContext,
    resources: Option<GpuResources>,
    target: Option<wgpu::TextureView>,
    presenter: Option<Presenter>,
    viewport: Viewport,
}

fn create_attribute_buffers(
    device: &wgpu::Device,
    label: &str,
    components: &[u64],
    capacity: usize,
) -> Vec<wgpu::Buffer> {
    components
        .iter()
        .enumerate()
        .map(|(i, n)| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{} Attribute {}", label, i)),
                size: n * std::mem::size_of::<f32>() as u64 * capacity as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })
        .collect()
}

impl GpuSpriteBackend {
    /// Build the backend for render targets of `format`, with buffers sized
    /// for `capacity` sprites per draw.
    pub fn new(
        context: GpuContext,
        format: wgpu::TextureFormat,
        viewport: Viewport,
        capacity: usize,
    ) -> Result<Self, RenderError> {
        let capacity = capacity.max(1);
        let device = &context.device;

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sprite Uniform Buffer"),
            contents: bytemuck::bytes_of(&Uniforms::new(viewport)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sprite Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shaders = ShaderManager::new(device, format, &pipeline_layout)?;
        let particle_buffers =
            create_attribute_buffers(device, "Particle", &PARTICLE_COMPONENTS, capacity);
        let glyph_buffers = create_attribute_buffers(device, "Glyph", &GLYPH_COMPONENTS, capacity);

        log::info!(
            "sprite backend ready: {:?}, {} sprites per batch",
            format,
            capacity
        );

        Ok(Self {
            context,
            resources: Some(GpuResources {
                shaders,
                uniform_buffer,
                bind_group,
                particle_buffers,
                glyph_buffers,
                capacity,
            }),
            target: None,
            presenter: None,
            viewport,
        })
    }

    /// Build the backend around a window surface, configured with `config`.
    pub fn with_surface(
        context: GpuContext,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
        capacity: usize,
    ) -> Result<Self, RenderError> {
        let viewport = Viewport::new(config.width as f32, config.height as f32);
        let mut backend = Self::new(context, config.format, viewport, capacity)?;
        surface.configure(&backend.context.device, &config);
        backend.presenter = Some(Presenter {
            surface,
            config,
            frame: None,
        });
        Ok(backend)
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Bind the texture the next draws render into.
    pub fn set_target(&mut self, view: wgpu::TextureView) {
        self.target = Some(view);
    }

    /// Unbind and return the current target.
    pub fn take_target(&mut self) -> Option<wgpu::TextureView> {
        self.target.take()
    }

    /// Shader programs, while the backend is live.
    pub fn shaders(&self) -> Result<&ShaderManager, RenderError> {
        self.resources
            .as_ref()
            .map(|r| &r.shaders)
            .ok_or(RenderError::Released)
    }

    /// Grow every attribute buffer when a batch exceeds the current capacity.
    fn ensure_capacity(&mut self, sprites: usize) -> Result<(), RenderError> {
        let device = &self.context.device;
        let resources = self.resources.as_mut().ok_or(RenderError::Released)?;
        if sprites <= resources.capacity {
            return Ok(());
        }
        let capacity = sprites.next_power_of_two();
        log::debug!(
            "growing sprite buffers from {} to {}",
            resources.capacity,
            capacity
        );
        resources.particle_buffers =
            create_attribute_buffers(device, "Particle", &PARTICLE_COMPONENTS, capacity);
        resources.glyph_buffers =
            create_attribute_buffers(device, "Glyph", &GLYPH_COMPONENTS, capacity);
        resources.capacity = capacity;
        Ok(())
    }

    /// Upload `attributes` into the buffers of `kind` and draw `count`
    /// instances in one submission.
    fn submit(
        &mut self,
        kind: ProgramKind,
        attributes: &[&[f32]],
        count: usize,
    ) -> Result<(), RenderError> {
        if count == 0 {
            return Ok(());
        }
        self.ensure_capacity(count)?;

        let GpuContext { device, queue, .. } = &self.context;
        let resources = self.resources.as_mut().ok_or(RenderError::Released)?;
        let target = self.target.as_ref().ok_or(RenderError::NoTarget)?;

        let buffers = match kind {
            ProgramKind::Circle => &resources.particle_buffers,
            ProgramKind::Turbulence => &resources.glyph_buffers,
        };
        for (buffer, data) in buffers.iter().zip(attributes) {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(*data));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Sprite Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(kind.name()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let program = resources.shaders.use_program(kind)?;
            pass.set_pipeline(&program.pipeline);
            pass.set_bind_group(0, &resources.bind_group, &[]);
            for (slot, (buffer, data)) in buffers.iter().zip(attributes).enumerate() {
                let bytes = std::mem::size_of_val(*data) as u64;
                pass.set_vertex_buffer(slot as u32, buffer.slice(..bytes));
            }
            pass.draw(0..VERTICES_PER_SPRITE, 0..count as u32);
        }
        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

impl SpriteBackend for GpuSpriteBackend {
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        if self.resources.is_none() {
            return Err(RenderError::Released);
        }
        let Some(presenter) = self.presenter.as_mut() else {
            return Ok(());
        };

        match presenter.surface.get_current_texture() {
            Ok(frame) => {
                self.target = Some(
                    frame
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default()),
                );
                presenter.frame = Some(frame);
                Ok(())
            }
            Err(e) => {
                if matches!(e, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) {
                    log::debug!("reconfiguring surface after {:?}", e);
                    presenter
                        .surface
                        .configure(&self.context.device, &presenter.config);
                }
                Err(e.into())
            }
        }
    }

    fn end_frame(&mut self) {
        if let Some(frame) = self.presenter.as_mut().and_then(|p| p.frame.take()) {
            self.target = None;
            frame.present();
        }
    }

    fn clear(&mut self, color: Color) -> Result<(), RenderError> {
        if self.resources.is_none() {
            return Err(RenderError::Released);
        }
        let target = self.target.as_ref().ok_or(RenderError::NoTarget)?;
        let [r, g, b] = color.normalized();

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn draw_particles(&mut self, batch: &ParticleBatch) -> Result<(), RenderError> {
        self.submit(
            ProgramKind::Circle,
            &[
                batch.positions.as_slice(),
                batch.colors.as_slice(),
                batch.sizes.as_slice(),
                batch.alphas.as_slice(),
            ],
            batch.len(),
        )
    }

    fn draw_glyphs(&mut self, batch: &GlyphBatch) -> Result<(), RenderError> {
        self.submit(
            ProgramKind::Turbulence,
            &[
                batch.positions.as_slice(),
                batch.colors.as_slice(),
                batch.sizes.as_slice(),
                batch.directions.as_slice(),
                batch.radii.as_slice(),
            ],
            batch.len(),
        )
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Some(presenter) = &mut self.presenter {
            presenter.config.width = (viewport.width as u32).max(1);
            presenter.config.height = (viewport.height as u32).max(1);
            presenter
                .surface
                .configure(&self.context.device, &presenter.config);
        }
        if let Some(resources) = &self.resources {
            self.context.queue.write_buffer(
                &resources.uniform_buffer,
                0,
                bytemuck::bytes_of(&Uniforms::new(viewport)),
            );
        }
    }

    fn release(&mut self) {
        if let Some(mut resources) = self.resources.take() {
            resources.shaders.cleanup();
            for buffer in resources
                .particle_buffers
                .iter()
                .chain(&resources.glyph_buffers)
                .chain(std::iter::once(&resources.uniform_buffer))
            {
                buffer.destroy();
            }
            log::debug!("released sprite backend resources");
        }
        if let Some(presenter) = &mut self.presenter {
            presenter.frame = None;
        }
        self.target = None;
    }
}
