use std::sync::Arc;

use log::debug;
use nalgebra::Matrix4;
use vulkano::{
    buffer::{BufferUsage, CpuAccessibleBuffer, TypedBufferAccess},
    command_buffer::{AutoCommandBufferBuilder, PrimaryAutoCommandBuffer},
    device::Device,
    pipeline::{
        graphics::{
            depth_stencil::DepthStencilState,
            input_assembly::{InputAssemblyState, PrimitiveTopology},
            vertex_input::BuffersDefinition,
            viewport::ViewportState,
        },
        GraphicsPipeline, PartialStateMode, Pipeline, StateMode,
    },
    render_pass::Subpass,
};

use super::Viewport;
use crate::{
    axes::axis_lines,
    error::{Error, Result},
    render_loop::FrameParams,
    scene::Scene,
    vertex::Vertex,
};

mod vs {
    vulkano_shaders::shader! {
        ty: "vertex",
        types_meta: {
            use bytemuck::{Pod, Zeroable};

            #[derive(Clone, Copy, Zeroable, Pod)]
        },
        src: "
#version 450

layout(location = 0) in vec3 position;
layout(location = 1) in vec3 color;

layout(location = 0) out vec3 v_color;

layout(push_constant) uniform PushConstants {
    mat4 view_proj;
    // x: point size in pixels
    vec4 settings;
} pc;

void main() {
    gl_Position = pc.view_proj * vec4(position, 1.0);
    gl_PointSize = pc.settings.x;
    v_color = color;
}"
    }
}

mod fs {
    vulkano_shaders::shader! {
        ty: "fragment",
        src: "
#version 450

layout(location = 0) in vec3 v_color;
layout(location = 0) out vec4 f_color;

void main() {
    f_color = vec4(v_color, 1.0);
}"
    }
}

fn build_pipeline(
    device: Arc<Device>,
    subpass: Subpass,
    topology: PrimitiveTopology,
) -> Result<Arc<GraphicsPipeline>> {
    let vs = vs::load(device.clone()).map_err(Error::resource_init)?;
    let fs = fs::load(device.clone()).map_err(Error::resource_init)?;
    let vs_main = vs
        .entry_point("main")
        .ok_or_else(|| Error::resource_init("vertex shader has no main"))?;
    let fs_main = fs
        .entry_point("main")
        .ok_or_else(|| Error::resource_init("fragment shader has no main"))?;

    GraphicsPipeline::start()
        .vertex_input_state(BuffersDefinition::new().vertex::<Vertex>())
        .vertex_shader(vs_main, ())
        .input_assembly_state(InputAssemblyState {
            topology: PartialStateMode::Fixed(topology),
            primitive_restart_enable: StateMode::Fixed(false),
        })
        .viewport_state(ViewportState::viewport_dynamic_scissor_irrelevant())
        .fragment_shader(fs_main, ())
        .depth_stencil_state(DepthStencilState::simple_depth_test())
        .render_pass(subpass)
        .build(device)
        .map_err(Error::resource_init)
}

/// Draws a scene as a point list with a per-frame camera and point size,
/// plus the reference axes as a line list.
pub struct PointCloudRenderer {
    pipeline: Arc<GraphicsPipeline>,
    axes_pipeline: Arc<GraphicsPipeline>,
    /// unit length axes, scaled by push constant
    axes_buffer: Arc<CpuAccessibleBuffer<[Vertex]>>,
    device: Arc<Device>,
    vertex_buffer: Option<Arc<CpuAccessibleBuffer<[Vertex]>>>,
    /// id of the scene whose vertices are in `vertex_buffer`
    uploaded: Option<u64>,
    large_points: bool,
}

impl PointCloudRenderer {
    pub fn new(device: Arc<Device>, subpass: Subpass) -> Result<Self> {
        let large_points = device.enabled_features().large_points;
        let pipeline =
            build_pipeline(device.clone(), subpass.clone(), PrimitiveTopology::PointList)?;
        let axes_pipeline =
            build_pipeline(device.clone(), subpass, PrimitiveTopology::LineList)?;
        let axes_buffer = CpuAccessibleBuffer::from_iter(
            device.clone(),
            BufferUsage::vertex_buffer(),
            false,
            axis_lines(1.),
        )
        .map_err(Error::resource_init)?;

        Ok(PointCloudRenderer {
            pipeline,
            axes_pipeline,
            axes_buffer,
            device,
            vertex_buffer: None,
            uploaded: None,
            large_points,
        })
    }

    /// Copies the scene's vertices to the GPU unless they are already there.
    fn upload(&mut self, scene: &Scene) -> Result<()> {
        let key = scene.id();
        if self.uploaded == Some(key) {
            return Ok(());
        }
        self.vertex_buffer = if scene.is_empty() {
            None
        } else {
            Some(
                CpuAccessibleBuffer::from_iter(
                    self.device.clone(),
                    BufferUsage::vertex_buffer(),
                    false,
                    scene.vertices().iter().copied(),
                )
                .map_err(Error::render)?,
            )
        };
        self.uploaded = Some(key);
        debug!("uploaded {} vertices", scene.len());
        Ok(())
    }

    /// Records the draw into an already begun render pass.
    pub fn draw(
        &mut self,
        builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
        scene: &Scene,
        params: &FrameParams,
        viewport: &Viewport,
    ) -> Result<()> {
        self.upload(scene)?;
        let view_proj = Viewport::depth_correction() * params.view_projection();
        builder.set_viewport(0, [viewport.to_vulkan()]);

        if let Some(vertex_buffer) = &self.vertex_buffer {
            let point_size = if self.large_points {
                params.point_size
            } else {
                1.
            };
            let push_constants = vs::ty::PushConstants {
                view_proj: view_proj.into(),
                settings: [point_size, 0., 0., 0.],
            };
            builder
                .bind_pipeline_graphics(self.pipeline.clone())
                .push_constants(self.pipeline.layout().clone(), 0, push_constants)
                .bind_vertex_buffers(0, vertex_buffer.clone())
                .draw(vertex_buffer.len() as u32, 1, 0, 0)
                .map_err(Error::render)?;
        }

        if let Some(axes_size) = params.axes {
            let push_constants = vs::ty::PushConstants {
                view_proj: (view_proj * Matrix4::new_scaling(axes_size)).into(),
                settings: [1., 0., 0., 0.],
            };
            builder
                .bind_pipeline_graphics(self.axes_pipeline.clone())
                .push_constants(self.axes_pipeline.layout().clone(), 0, push_constants)
                .bind_vertex_buffers(0, self.axes_buffer.clone())
                .draw(self.axes_buffer.len() as u32, 1, 0, 0)
                .map_err(Error::render)?;
        }
        Ok(())
    }
}
