//! # Deferred Renderer — The wgpu Frame Backend
//!
//! Owns every GPU resource the frame needs and executes the pass sequence
//! from [`frame::plan`](super::frame::plan).
//!
//! ## Per-Frame Flow
//!
//! ```text
//! render(gpu, scene)
//!   │
//!   ├─ 1. Resize check ── rebuild the G-buffer if the surface changed
//!   ├─ 2. Upload ──────── camera, model records, light records,
//!   │                     emitter + icon vertices
//!   ├─ 3. Acquire ─────── surface texture + command encoder
//!   └─ 4. run_frame ───── FramePasses executes each Pass:
//!
//!        Clear      G-buffer + back buffer + both depths
//!        Geometry   [color, normal] + scene depth       (pass stays open)
//!        Reset      closes the open pass
//!        Lighting   [lighting] + light depth            (pass stays open)
//!        Combine ┐
//!        Skybox  │  back buffer + scene depth, one open pass
//!        Particles
//!        Overlay ┘
//!        Present    close, submit, present
//! ```
//!
//! ## Bind Groups
//!
//! | Stage             | 0              | 1                 | 2               |
//! |-------------------|----------------|-------------------|-----------------|
//! | Geometry          | camera         | material          | model (dynamic) |
//! | Point/Directional | camera         | normal + depth    | light (dynamic) |
//! | Combine           | color + light  |                   |                 |
//! | Skybox            | camera         | cube map          |                 |
//! | Particles/Overlay | camera         | texture           |                 |
//!
//! Pipelines are built from [`DrawStage::state`] and rebuilt per shader on
//! hot reload. A reload that fails validation keeps the old pipelines.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use super::frame::{run_frame, FrameBackend, FrameStats, Pass};
use super::gpu::GpuContext;
use super::mesh::{MeshHandle, MeshSource, MeshStore};
use super::shader::ShaderKind;
use super::states::DrawStage;
use super::targets::{
    combine_inputs_layout, lighting_inputs_layout, GBuffer, COLOR_FORMAT, LIGHTING_FORMAT, NORMAL_FORMAT,
};
use super::texture::{create_cubemap, load_cube_faces, procedural_sky, ColorSpace, TextureHandle, TextureStore};
use super::uniform::{dynamic_uniform_layout, DynamicUniform};
use super::vertex::{CameraUniform, LightUniform, MeshVertex, ModelUniform};
use crate::config::{RenderConfig, SkyboxConfig};
use crate::material::{material_layout, GpuMaterial, Material, MaterialDesc};
use crate::particles::ParticleVertex;
use crate::scene::{Scene, SceneAssets};

/// Background the G-buffer color target is cleared to. The skybox covers
/// it wherever nothing was drawn.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.15,
    a: 1.0,
};

struct Layouts {
    camera: wgpu::BindGroupLayout,
    material: wgpu::BindGroupLayout,
    model: wgpu::BindGroupLayout,
    light: wgpu::BindGroupLayout,
    lighting_inputs: wgpu::BindGroupLayout,
    combine_inputs: wgpu::BindGroupLayout,
    sky: wgpu::BindGroupLayout,
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        Self {
            camera: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("camera layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            }),
            material: material_layout(device),
            model: dynamic_uniform_layout::<ModelUniform>(device, "model layout", wgpu::ShaderStages::VERTEX),
            light: dynamic_uniform_layout::<LightUniform>(device, "light layout", wgpu::ShaderStages::VERTEX_FRAGMENT),
            lighting_inputs: lighting_inputs_layout(device),
            combine_inputs: combine_inputs_layout(device),
            sky: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sky layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::Cube,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            }),
        }
    }
}

pub struct DeferredRenderer {
    layouts: Layouts,
    pipelines: HashMap<DrawStage, wgpu::RenderPipeline>,
    surface_format: wgpu::TextureFormat,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    models: DynamicUniform<ModelUniform>,
    lights: DynamicUniform<LightUniform>,
    sky_bind_group: wgpu::BindGroup,

    gbuffer: GBuffer,
    meshes: MeshStore,
    textures: TextureStore,
    materials: Vec<GpuMaterial>,
}

impl DeferredRenderer {
    pub fn new(gpu: &GpuContext, config: &RenderConfig) -> Self {
        let device = &gpu.device;
        let layouts = Layouts::new(device);
        let textures = TextureStore::new(device, &gpu.queue);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera uniform"),
            contents: bytemuck::bytes_of(&<CameraUniform as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &layouts.camera,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let models = DynamicUniform::new(device, &layouts.model, "model records", 16);
        let lights = DynamicUniform::new(device, &layouts.light, "light records", 8);
        let sky_bind_group = create_sky_bind_group(gpu, &layouts.sky, &textures, &config.skybox);
        let gbuffer = GBuffer::new(
            device,
            gpu.surface_size(),
            &layouts.lighting_inputs,
            &layouts.combine_inputs,
        );

        let mut renderer = Self {
            layouts,
            pipelines: HashMap::new(),
            surface_format: gpu.surface_format(),
            camera_buffer,
            camera_bind_group,
            models,
            lights,
            sky_bind_group,
            gbuffer,
            meshes: MeshStore::new(device),
            textures,
            materials: Vec::new(),
        };

        for kind in ShaderKind::ALL {
            let module = create_shader(device, kind, kind.embedded_source());
            for &stage in kind.stages() {
                let pipeline = renderer.build_pipeline(device, stage, &module);
                renderer.pipelines.insert(stage, pipeline);
            }
        }
        log::info!("Deferred renderer ready ({} pipelines)", renderer.pipelines.len());

        renderer
    }

    /// Resolver that loads scene meshes and textures into this renderer.
    pub fn assets<'a>(&'a mut self, gpu: &'a GpuContext) -> GpuAssets<'a> {
        GpuAssets {
            device: &gpu.device,
            queue: &gpu.queue,
            meshes: &mut self.meshes,
            textures: &mut self.textures,
        }
    }

    /// Create one bind group per scene material, in the same order.
    pub fn upload_materials(&mut self, gpu: &GpuContext, materials: &[Material]) {
        self.materials = materials
            .iter()
            .map(|m| GpuMaterial::new(&gpu.device, &self.layouts.material, m, &self.textures))
            .collect();
    }

    /// Rebuild the G-buffer for the current surface size.
    pub fn resize(&mut self, gpu: &GpuContext) {
        let size = gpu.surface_size();
        if self.gbuffer.resize_if_needed(
            &gpu.device,
            size,
            &self.layouts.lighting_inputs,
            &self.layouts.combine_inputs,
        ) {
            log::debug!("G-buffer resized to {}x{}", size.0, size.1);
        }
    }

    /// Draw one frame of `scene`.
    pub fn render(&mut self, gpu: &GpuContext, scene: &mut Scene, overlay: bool) -> Result<FrameStats, wgpu::SurfaceError> {
        self.resize(gpu);
        self.upload(gpu, scene, overlay);

        let output = gpu.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("kiln frame encoder"),
        });

        let contents = scene.contents(overlay);
        let mut passes = FramePasses {
            renderer: self,
            scene,
            queue: &gpu.queue,
            surface_view: view,
            output: Some(output),
            encoder: Some(encoder),
            open: None,
        };
        Ok(run_frame(&mut passes, &contents))
    }

    fn upload(&mut self, gpu: &GpuContext, scene: &mut Scene, overlay: bool) {
        let camera = &scene.camera;
        let uniform = CameraUniform::new(
            camera.view(),
            camera.projection(),
            camera.sky_view_projection(),
            camera.position(),
            gpu.surface_size(),
        );
        gpu.queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));

        let models: Vec<ModelUniform> = scene
            .entities
            .iter()
            .map(|e| ModelUniform {
                model: e.transform.matrix().to_cols_array_2d(),
                normal_matrix: e.transform.normal_matrix().to_cols_array_2d(),
            })
            .collect();
        self.models.write(&gpu.device, &gpu.queue, &self.layouts.model, &models);

        let lights: Vec<LightUniform> = scene.lights.iter().map(|l| l.light.uniform()).collect();
        self.lights.write(&gpu.device, &gpu.queue, &self.layouts.light, &lights);

        for emitter in &mut scene.emitters {
            if emitter.living() > 0 {
                emitter.prepare_gpu(&gpu.device, &gpu.queue);
            }
        }
        if overlay && !scene.icons.is_empty() {
            scene.icons.prepare_gpu(&gpu.device, &gpu.queue);
        }
    }

    /// Recompile `kind` from `source` and swap in its pipelines. On a
    /// validation error the current pipelines stay and the error is returned.
    pub fn reload_shader(&mut self, gpu: &GpuContext, kind: ShaderKind, source: &str) -> Result<(), String> {
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = create_shader(&gpu.device, kind, source);
        let candidates: Vec<(DrawStage, wgpu::RenderPipeline)> = kind
            .stages()
            .iter()
            .map(|&stage| (stage, self.build_pipeline(&gpu.device, stage, &module)))
            .collect();

        if let Some(err) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(err.to_string());
        }
        self.pipelines.extend(candidates);
        Ok(())
    }

    fn build_pipeline(&self, device: &wgpu::Device, stage: DrawStage, module: &wgpu::ShaderModule) -> wgpu::RenderPipeline {
        let layouts = &self.layouts;
        let bind_groups: Vec<&wgpu::BindGroupLayout> = match stage {
            DrawStage::Geometry => vec![&layouts.camera, &layouts.material, &layouts.model],
            DrawStage::PointLight | DrawStage::DirectionalLight => {
                vec![&layouts.camera, &layouts.lighting_inputs, &layouts.light]
            }
            DrawStage::Combine => vec![&layouts.combine_inputs],
            DrawStage::Skybox => vec![&layouts.camera, &layouts.sky],
            DrawStage::Particles | DrawStage::Overlay => vec![&layouts.camera, self.textures.layout()],
        };
        let buffers: &[wgpu::VertexBufferLayout<'static>] = match stage {
            DrawStage::Geometry | DrawStage::PointLight | DrawStage::Skybox => &[MeshVertex::LAYOUT],
            DrawStage::Particles | DrawStage::Overlay => &[ParticleVertex::LAYOUT],
            DrawStage::DirectionalLight | DrawStage::Combine => &[],
        };

        let state = stage.state();
        let targets: Vec<Option<wgpu::ColorTargetState>> = match stage {
            DrawStage::Geometry => vec![state.color_target(COLOR_FORMAT), state.color_target(NORMAL_FORMAT)],
            DrawStage::PointLight | DrawStage::DirectionalLight => vec![state.color_target(LIGHTING_FORMAT)],
            _ => vec![state.color_target(self.surface_format)],
        };

        let label = format!("{stage:?} pipeline");
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&label),
            bind_group_layouts: &bind_groups,
            push_constant_ranges: &[],
        });
        let (vs, fs) = stage.entry_points();

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some(vs),
                buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some(fs),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: state.primitive(),
            depth_stencil: state.depth_stencil(),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn pipeline(&self, stage: DrawStage) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&stage)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

fn create_shader(device: &wgpu::Device, kind: ShaderKind, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kind.file_name()),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

/// Cube map from six files, or the gradient when none are configured or
/// they fail to load.
fn create_sky_bind_group(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    textures: &TextureStore,
    config: &SkyboxConfig,
) -> wgpu::BindGroup {
    let loaded = config.faces.as_ref().and_then(|paths| match load_cube_faces(paths) {
        Ok(faces) => {
            log::info!("Loaded skybox faces ({}px)", faces.0);
            Some(faces)
        }
        Err(e) => {
            log::warn!("{e}; using gradient sky");
            None
        }
    });
    let (size, faces) = loaded.unwrap_or_else(|| {
        let size = config.size.max(1);
        (size, procedural_sky(size, &config.gradient))
    });
    let view = create_cubemap(&gpu.device, &gpu.queue, size, &faces);

    gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("sky bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(textures.sampler()),
            },
        ],
    })
}

fn color_attachment(
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
    })
}

fn depth_attachment(view: &wgpu::TextureView, load: wgpu::LoadOp<f32>) -> Option<wgpu::RenderPassDepthStencilAttachment<'_>> {
    Some(wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    })
}

// ── Scene asset resolution ──────────────────────────────────────────────

/// [`SceneAssets`] backed by the renderer's mesh and texture stores.
pub struct GpuAssets<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    meshes: &'a mut MeshStore,
    textures: &'a mut TextureStore,
}

impl SceneAssets for GpuAssets<'_> {
    fn mesh(&mut self, source: &MeshSource) -> MeshHandle {
        self.meshes.resolve(self.device, source)
    }

    fn material(&mut self, desc: &MaterialDesc) -> Material {
        Material::resolve(desc, self.device, self.queue, self.textures)
    }

    fn texture(&mut self, path: Option<&str>, fallback: TextureHandle) -> TextureHandle {
        self.textures.load_or(self.device, self.queue, path, ColorSpace::Srgb, fallback)
    }
}

// ── Pass execution ──────────────────────────────────────────────────────

/// Attachment set of the currently open render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    GBuffer,
    Lighting,
    BackBuffer,
}

/// One frame in flight. Implements [`FrameBackend`] over a single command
/// encoder; at most one render pass is open at a time.
struct FramePasses<'a> {
    renderer: &'a DeferredRenderer,
    scene: &'a Scene,
    queue: &'a wgpu::Queue,
    surface_view: wgpu::TextureView,
    output: Option<wgpu::SurfaceTexture>,
    encoder: Option<wgpu::CommandEncoder>,
    open: Option<(Target, wgpu::RenderPass<'static>)>,
}

impl FrameBackend for FramePasses<'_> {
    fn run_pass(&mut self, pass: Pass) -> u32 {
        match pass {
            Pass::Clear => {
                self.clear();
                0
            }
            Pass::Geometry => self.geometry(),
            Pass::ResetBindings => {
                self.open = None;
                0
            }
            Pass::Lighting => self.lighting(),
            Pass::Combine => self.combine(),
            Pass::Skybox => self.skybox(),
            Pass::Particles => self.particles(),
            Pass::Overlay => self.overlay(),
            Pass::Present => {
                self.present();
                0
            }
        }
    }
}

impl FramePasses<'_> {
    fn clear(&mut self) {
        self.open = None;
        let Some(encoder) = self.encoder.as_mut() else {
            return;
        };
        let gbuffer = &self.renderer.gbuffer;

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear targets"),
            color_attachments: &[
                color_attachment(&gbuffer.color, wgpu::LoadOp::Clear(CLEAR_COLOR)),
                color_attachment(&gbuffer.normal, wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)),
                color_attachment(&gbuffer.lighting, wgpu::LoadOp::Clear(wgpu::Color::BLACK)),
                color_attachment(&self.surface_view, wgpu::LoadOp::Clear(CLEAR_COLOR)),
            ],
            depth_stencil_attachment: depth_attachment(&gbuffer.depth, wgpu::LoadOp::Clear(1.0)),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear lighting depth"),
            color_attachments: &[],
            depth_stencil_attachment: depth_attachment(&gbuffer.light_depth, wgpu::LoadOp::Clear(1.0)),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }

    /// The open pass for `target`, opening it (and closing any other) if
    /// needed.
    fn begin(&mut self, target: Target) -> Option<&mut wgpu::RenderPass<'static>> {
        if self.open.as_ref().is_some_and(|(t, _)| *t != target) {
            self.open = None;
        }
        // Later passes load what earlier ones stored.
        if self.open.is_none() {
            let encoder = self.encoder.as_mut()?;
            let gbuffer = &self.renderer.gbuffer;

            let load = wgpu::LoadOp::Load;
            let (colors, depth) = match target {
                Target::GBuffer => (
                    vec![color_attachment(&gbuffer.color, load), color_attachment(&gbuffer.normal, load)],
                    &gbuffer.depth,
                ),
                Target::Lighting => (vec![color_attachment(&gbuffer.lighting, load)], &gbuffer.light_depth),
                Target::BackBuffer => (vec![color_attachment(&self.surface_view, load)], &gbuffer.depth),
            };

            let pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(match target {
                        Target::GBuffer => "geometry pass",
                        Target::Lighting => "lighting pass",
                        Target::BackBuffer => "back buffer pass",
                    }),
                    color_attachments: &colors,
                    depth_stencil_attachment: depth_attachment(depth, wgpu::LoadOp::Load),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.open = Some((target, pass));
        }
        self.open.as_mut().map(|(_, pass)| pass)
    }

    fn geometry(&mut self) -> u32 {
        let (renderer, scene) = (self.renderer, self.scene);
        let Some(pipeline) = renderer.pipeline(DrawStage::Geometry) else {
            return 0;
        };
        let Some(pass) = self.begin(Target::GBuffer) else {
            return 0;
        };

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &renderer.camera_bind_group, &[]);

        let mut draws = 0;
        let mut bound_material = None;
        for (i, entity) in scene.entities.iter().enumerate() {
            let Some(material) = renderer.materials.get(entity.material) else {
                continue;
            };
            if bound_material != Some(entity.material) {
                pass.set_bind_group(1, &material.bind_group, &[]);
                bound_material = Some(entity.material);
            }
            pass.set_bind_group(2, renderer.models.bind_group(), &[renderer.models.offset(i)]);
            renderer.meshes.get(entity.mesh).draw(pass);
            draws += 1;
        }
        draws
    }

    fn lighting(&mut self) -> u32 {
        let (renderer, scene) = (self.renderer, self.scene);
        let Some(pass) = self.begin(Target::Lighting) else {
            return 0;
        };

        pass.set_bind_group(0, &renderer.camera_bind_group, &[]);
        pass.set_bind_group(1, &renderer.gbuffer.lighting_inputs, &[]);

        let volume = renderer.meshes.get(MeshHandle::SPHERE);
        let mut draws = 0;
        let mut bound_stage = None;
        for (i, scene_light) in scene.lights.iter().enumerate() {
            let stage = scene_light.light.stage();
            if bound_stage != Some(stage) {
                let Some(pipeline) = renderer.pipeline(stage) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                bound_stage = Some(stage);
            }
            pass.set_bind_group(2, renderer.lights.bind_group(), &[renderer.lights.offset(i)]);
            match stage {
                DrawStage::PointLight => volume.draw(pass),
                _ => pass.draw(0..3, 0..1),
            }
            draws += 1;
        }
        draws
    }

    fn combine(&mut self) -> u32 {
        let renderer = self.renderer;
        let Some(pipeline) = renderer.pipeline(DrawStage::Combine) else {
            return 0;
        };
        let Some(pass) = self.begin(Target::BackBuffer) else {
            return 0;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &renderer.gbuffer.combine_inputs, &[]);
        pass.draw(0..3, 0..1);
        1
    }

    fn skybox(&mut self) -> u32 {
        let renderer = self.renderer;
        let Some(pipeline) = renderer.pipeline(DrawStage::Skybox) else {
            return 0;
        };
        let Some(pass) = self.begin(Target::BackBuffer) else {
            return 0;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &renderer.camera_bind_group, &[]);
        pass.set_bind_group(1, &renderer.sky_bind_group, &[]);
        renderer.meshes.get(MeshHandle::SPHERE).draw(pass);
        1
    }

    fn particles(&mut self) -> u32 {
        let (renderer, scene) = (self.renderer, self.scene);
        let Some(pipeline) = renderer.pipeline(DrawStage::Particles) else {
            return 0;
        };
        let Some(pass) = self.begin(Target::BackBuffer) else {
            return 0;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &renderer.camera_bind_group, &[]);

        let mut draws = 0;
        for emitter in &scene.emitters {
            if emitter.living() == 0 {
                continue;
            }
            pass.set_bind_group(1, &renderer.textures.get(emitter.texture()).bind_group, &[]);
            draws += emitter.draw(pass);
        }
        draws
    }

    fn overlay(&mut self) -> u32 {
        let (renderer, scene) = (self.renderer, self.scene);
        let Some(pipeline) = renderer.pipeline(DrawStage::Overlay) else {
            return 0;
        };
        let Some(pass) = self.begin(Target::BackBuffer) else {
            return 0;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &renderer.camera_bind_group, &[]);
        pass.set_bind_group(1, &renderer.textures.get(scene.icons.texture()).bind_group, &[]);
        scene.icons.draw(pass)
    }

    fn present(&mut self) {
        self.open = None;
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        if let Some(output) = self.output.take() {
            output.present();
        }
    }
}
