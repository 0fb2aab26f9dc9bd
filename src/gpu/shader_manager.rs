//! Compiled render pipelines for the sprite programs, looked up by name.

use std::collections::HashMap;

use crate::error::RenderError;
use crate::render::shaders::ProgramKind;

const POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const COLOR: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const SIZE: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32];
const ALPHA: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32];
const DIRECTION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32x2];
const RADIUS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![4 => Float32];

/// One per-instance vertex buffer holding `components` floats per sprite.
fn instance_layout(
    attributes: &'static [wgpu::VertexAttribute],
    components: u64,
) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: components * std::mem::size_of::<f32>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    }
}

/// Vertex buffer layouts a program expects, in slot order.
pub(crate) fn buffer_layouts(kind: ProgramKind) -> Vec<wgpu::VertexBufferLayout<'static>> {
    match kind {
        ProgramKind::Circle => vec![
            instance_layout(&POSITION, 2),
            instance_layout(&COLOR, 3),
            instance_layout(&SIZE, 1),
            instance_layout(&ALPHA, 1),
        ],
        ProgramKind::Turbulence => vec![
            instance_layout(&POSITION, 2),
            instance_layout(&COLOR, 3),
            instance_layout(&SIZE, 1),
            instance_layout(&DIRECTION, 2),
            instance_layout(&RADIUS, 1),
        ],
    }
}

pub struct ShaderProgram {
    pub kind: ProgramKind,
    pub pipeline: wgpu::RenderPipeline,
}

/// Owns the compiled programs.
///
/// Every program is compiled once at construction; a compile or pipeline
/// validation failure aborts construction.
pub struct ShaderManager {
    programs: HashMap<&'static str, ShaderProgram>,
    active: Option<ProgramKind>,
    released: bool,
}

impl ShaderManager {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        layout: &wgpu::PipelineLayout,
    ) -> Result<Self, RenderError> {
        let mut programs = HashMap::new();
        for kind in ProgramKind::ALL {
            let pipeline = compile(device, kind, format, layout)?;
            log::debug!("compiled shader program '{}'", kind.name());
            programs.insert(kind.name(), ShaderProgram { kind, pipeline });
        }

        Ok(Self {
            programs,
            active: None,
            released: false,
        })
    }

    /// Look a program up by name.
    pub fn get(&self, name: &str) -> Result<&ShaderProgram, RenderError> {
        if self.released {
            return Err(RenderError::Released);
        }
        self.programs
            .get(name)
            .ok_or_else(|| RenderError::ProgramNotFound(name.to_string()))
    }

    /// Mark `kind` as the active program and return it.
    pub fn use_program(&mut self, kind: ProgramKind) -> Result<&ShaderProgram, RenderError> {
        if self.released {
            return Err(RenderError::Released);
        }
        self.active = Some(kind);
        self.programs
            .get(kind.name())
            .ok_or_else(|| RenderError::ProgramNotFound(kind.name().to_string()))
    }

    #[inline]
    pub fn active(&self) -> Option<ProgramKind> {
        self.active
    }

    /// Drop every pipeline. Safe to call more than once.
    pub fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.programs.clear();
        self.active = None;
        self.released = true;
    }
}

fn compile(
    device: &wgpu::Device,
    kind: ProgramKind,
    format: wgpu::TextureFormat,
    layout: &wgpu::PipelineLayout,
) -> Result<wgpu::RenderPipeline, RenderError> {
    compile_source(
        device,
        kind.name(),
        kind.source(),
        &buffer_layouts(kind),
        format,
        layout,
    )
}

/// Build a pipeline from WGSL source, turning validation errors into
/// [`RenderError::ShaderCompile`].
fn compile_source(
    device: &wgpu::Device,
    name: &str,
    source: &str,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    format: wgpu::TextureFormat,
    layout: &wgpu::PipelineLayout,
) -> Result<wgpu::RenderPipeline, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(name),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(name),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(RenderError::ShaderCompile {
            program: name.to_string(),
            message: error.to_string(),
        }),
        None => Ok(pipeline),
    }
}
