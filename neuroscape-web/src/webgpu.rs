//! WebGPU renderer for the backdrop
//!
//! Spheres and particles are instanced billboards, lines are a line list.
//! Geometry arrives already in world space from the frame's draw list, so
//! the shaders only project, size and shade.

use neuroscape_scene::draw::{Blend, DrawList};
use neuroscape_scene::frame::{Frame, Renderer};
use neuroscape_scene::math;
use neuroscape_scene::{Scene, SceneError, Viewport};
use web_sys::HtmlCanvasElement;
use wgpu::util::DeviceExt;

/// Corner of a billboard quad
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    position: [f32; 2],
}

/// Instance data for each sphere
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SphereInstance {
    world_pos: [f32; 3],
    radius: f32,
    color: [f32; 4],
}

/// Instance data for each particle sprite
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct PointInstance {
    world_pos: [f32; 3],
    size: f32,
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct LineVertex {
    position: [f32; 3],
    color: [f32; 4],
}

/// Uniform buffer shared by all pipelines
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniforms {
    view_proj: [f32; 16],
    canvas_size: [f32; 2],
    /// x and y focal scale of the projection matrix
    proj_scale: [f32; 2],
    pixel_ratio: f32,
    _padding: [f32; 3],
}

const QUAD: [QuadVertex; 6] = [
    QuadVertex {
        position: [-1.0, -1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, -1.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, 1.0],
    },
];

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Vertex or instance buffer that grows to fit
struct DynamicBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    label: &'static str,
}

impl DynamicBuffer {
    fn new(device: &wgpu::Device, label: &'static str, capacity: u64) -> Self {
        Self {
            buffer: Self::allocate(device, label, capacity),
            capacity,
            label,
        }
    }

    fn allocate(device: &wgpu::Device, label: &'static str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size.max(16),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        let needed = bytes.len() as u64;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::allocate(device, self.label, self.capacity);
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
    }
}

/// WebGPU renderer
pub struct WebGpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    quad_buffer: wgpu::Buffer,

    sphere_pipeline: wgpu::RenderPipeline,
    sphere_instances: DynamicBuffer,
    sphere_count: u32,

    point_pipeline: wgpu::RenderPipeline,
    point_instances: DynamicBuffer,
    point_count: u32,

    line_pipeline: wgpu::RenderPipeline,
    additive_line_pipeline: wgpu::RenderPipeline,
    line_vertices: DynamicBuffer,
    /// Normal-blend vertices come first, additive after
    normal_line_vertices: u32,
    line_vertex_count: u32,

    camera_uniform_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    viewport: Viewport,
    draw: DrawList,
}

impl WebGpuRenderer {
    /// Create a new WebGPU renderer (async)
    pub async fn new(canvas: HtmlCanvasElement, viewport: Viewport) -> Result<Self, SceneError> {
        let (width, height) = viewport.device_size();
        canvas.set_width(width);
        canvas.set_height(height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
            .map_err(|e| SceneError::MissingSurface(format!("Failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| SceneError::MissingSurface("Failed to find adapter".into()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("neuroscape"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| SceneError::MissingSurface(format!("Failed to create device: {}", e)))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| SceneError::MissingSurface("Surface has no formats".into()))?;
        let alpha_mode = if surface_caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            wgpu::CompositeAlphaMode::Auto
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniforms {
                view_proj: math::IDENTITY,
                canvas_size: [width as f32, height as f32],
                proj_scale: [1.0, 1.0],
                pixel_ratio: viewport.pixel_ratio,
                _padding: [0.0; 3],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
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
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Backdrop Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let billboard = |label: &str,
                         source: &str,
                         stride: usize,
                         attributes: &[wgpu::VertexAttribute],
                         blend: wgpu::BlendState| {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(shader_source(source).into()),
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    buffers: &[
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                        },
                        wgpu::VertexBufferLayout {
                            array_stride: stride as wgpu::BufferAddress,
                            step_mode: wgpu::VertexStepMode::Instance,
                            attributes,
                        },
                    ],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let sphere_pipeline = billboard(
            "Sphere Pipeline",
            SPHERE_SHADER,
            std::mem::size_of::<SphereInstance>(),
            &wgpu::vertex_attr_array![1 => Float32x3, 2 => Float32, 3 => Float32x4],
            wgpu::BlendState::ALPHA_BLENDING,
        );
        let point_pipeline = billboard(
            "Particle Pipeline",
            PARTICLE_SHADER,
            std::mem::size_of::<PointInstance>(),
            &wgpu::vertex_attr_array![1 => Float32x3, 2 => Float32, 3 => Float32x4],
            ADDITIVE,
        );

        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source(LINE_SHADER).into()),
        });
        let line = |label: &str, blend: wgpu::BlendState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &line_shader,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4],
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &line_shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::LineList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        let line_pipeline = line("Line Pipeline", wgpu::BlendState::ALPHA_BLENDING);
        let additive_line_pipeline = line("Additive Line Pipeline", ADDITIVE);

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let sphere_instances = DynamicBuffer::new(
            &device,
            "Sphere Instance Buffer",
            256 * std::mem::size_of::<SphereInstance>() as u64,
        );
        let point_instances = DynamicBuffer::new(
            &device,
            "Particle Instance Buffer",
            1024 * std::mem::size_of::<PointInstance>() as u64,
        );
        let line_vertices = DynamicBuffer::new(
            &device,
            "Line Vertex Buffer",
            4096 * std::mem::size_of::<LineVertex>() as u64,
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            quad_buffer,
            sphere_pipeline,
            sphere_instances,
            sphere_count: 0,
            point_pipeline,
            point_instances,
            point_count: 0,
            line_pipeline,
            additive_line_pipeline,
            line_vertices,
            normal_line_vertices: 0,
            line_vertex_count: 0,
            camera_uniform_buffer,
            camera_bind_group,
            viewport,
            draw: DrawList::default(),
        })
    }

    /// Upload the draw list; spheres are sorted far to near for blending
    fn upload(&mut self, frame: &Frame) {
        let view_proj = &frame.camera.view_projection;
        let depth = |p| math::transform(view_proj, p)[3];

        let mut spheres: Vec<(f32, SphereInstance)> = self
            .draw
            .spheres
            .iter()
            .map(|s| {
                (
                    depth(s.center),
                    SphereInstance {
                        world_pos: s.center.to_array(),
                        radius: s.radius,
                        color: s.color.with_alpha(s.opacity),
                    },
                )
            })
            .collect();
        spheres.sort_by(|a, b| b.0.total_cmp(&a.0));
        let spheres: Vec<SphereInstance> = spheres.into_iter().map(|(_, s)| s).collect();

        let points: Vec<PointInstance> = self
            .draw
            .points
            .iter()
            .map(|p| PointInstance {
                world_pos: p.position.to_array(),
                size: p.size,
                color: p.color.with_alpha(p.opacity),
            })
            .collect();

        let mut lines = Vec::with_capacity(self.draw.lines.len() * 2);
        for blend in [Blend::Normal, Blend::Additive] {
            if blend == Blend::Additive {
                self.normal_line_vertices = lines.len() as u32;
            }
            for l in self.draw.lines.iter().filter(|l| l.blend == blend) {
                lines.push(LineVertex {
                    position: l.a.to_array(),
                    color: l.color_a.with_alpha(l.opacity),
                });
                lines.push(LineVertex {
                    position: l.b.to_array(),
                    color: l.color_b.with_alpha(l.opacity),
                });
            }
        }

        self.sphere_instances
            .write(&self.device, &self.queue, bytemuck::cast_slice(&spheres));
        self.point_instances
            .write(&self.device, &self.queue, bytemuck::cast_slice(&points));
        self.line_vertices
            .write(&self.device, &self.queue, bytemuck::cast_slice(&lines));
        self.sphere_count = spheres.len() as u32;
        self.point_count = points.len() as u32;
        self.line_vertex_count = lines.len() as u32;

        let (width, height) = self.viewport.device_size();
        let uniforms = CameraUniforms {
            view_proj: frame.camera.view_projection,
            canvas_size: [width as f32, height as f32],
            proj_scale: [frame.camera.projection[0], frame.camera.projection[5]],
            pixel_ratio: frame.particle_uniforms.pixel_ratio,
            _padding: [0.0; 3],
        };
        self.queue.write_buffer(
            &self.camera_uniform_buffer,
            0,
            bytemuck::cast_slice(&[uniforms]),
        );
    }
}

impl Renderer for WebGpuRenderer {
    fn resize(&mut self, viewport: Viewport) {
        let (width, height) = viewport.device_size();
        if width > 0 && height > 0 {
            self.viewport = viewport;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn render(&mut self, scene: &Scene, frame: &Frame) {
        self.draw.rebuild(scene, frame);
        self.upload(frame);

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(_) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            // Lines first (behind spheres)
            if self.line_vertex_count > 0 {
                render_pass.set_vertex_buffer(0, self.line_vertices.buffer.slice(..));
                if self.normal_line_vertices > 0 {
                    render_pass.set_pipeline(&self.line_pipeline);
                    render_pass.draw(0..self.normal_line_vertices, 0..1);
                }
                if self.line_vertex_count > self.normal_line_vertices {
                    render_pass.set_pipeline(&self.additive_line_pipeline);
                    render_pass.draw(self.normal_line_vertices..self.line_vertex_count, 0..1);
                }
            }

            render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
            if self.point_count > 0 {
                render_pass.set_pipeline(&self.point_pipeline);
                render_pass.set_vertex_buffer(1, self.point_instances.buffer.slice(..));
                render_pass.draw(0..6, 0..self.point_count);
            }
            if self.sphere_count > 0 {
                render_pass.set_pipeline(&self.sphere_pipeline);
                render_pass.set_vertex_buffer(1, self.sphere_instances.buffer.slice(..));
                render_pass.draw(0..6, 0..self.sphere_count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

// WGSL Shaders

/// Prefix a shader body with the shared uniform block
fn shader_source(body: &str) -> String {
    format!("{CAMERA_UNIFORMS}{body}")
}

const CAMERA_UNIFORMS: &str = r#"
struct CameraUniforms {
    view_proj: mat4x4<f32>,
    canvas_size: vec2<f32>,
    proj_scale: vec2<f32>,
    pixel_ratio: f32,
}

@group(0) @binding(0)
var<uniform> camera: CameraUniforms;
"#;

const SPHERE_SHADER: &str = r#"
struct InstanceInput {
    @location(1) world_pos: vec3<f32>,
    @location(2) radius: f32,
    @location(3) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) local_pos: vec2<f32>,
}

@vertex
fn vs_main(@location(0) corner: vec2<f32>, instance: InstanceInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(instance.world_pos, 1.0);
    // clip-space offset; the perspective divide shrinks it with distance
    out.clip_position.x += corner.x * instance.radius * camera.proj_scale.x;
    out.clip_position.y += corner.y * instance.radius * camera.proj_scale.y;
    out.color = instance.color;
    out.local_pos = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.local_pos);
    if (dist > 1.0) {
        discard;
    }
    let alpha = smoothstep(1.0, 0.9, dist);
    return vec4<f32>(in.color.rgb, in.color.a * alpha);
}
"#;

const PARTICLE_SHADER: &str = r#"
struct InstanceInput {
    @location(1) world_pos: vec3<f32>,
    @location(2) size: f32,
    @location(3) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) local_pos: vec2<f32>,
}

@vertex
fn vs_main(@location(0) corner: vec2<f32>, instance: InstanceInput) -> VertexOutput {
    var out: VertexOutput;
    let clip = camera.view_proj * vec4<f32>(instance.world_pos, 1.0);
    // sprite diameter in device pixels, as a point size would be
    let diameter = instance.size * camera.pixel_ratio * (60.0 / max(clip.w, 0.001));
    out.clip_position = clip;
    out.clip_position.x += corner.x * diameter / camera.canvas_size.x * clip.w;
    out.clip_position.y += corner.y * diameter / camera.canvas_size.y * clip.w;
    out.color = instance.color;
    out.local_pos = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let d = length(in.local_pos) * 0.5;
    if (d > 0.5) {
        discard;
    }
    let alpha = (1.0 - smoothstep(0.0, 0.5, d)) * in.color.a;
    return vec4<f32>(in.color.rgb, alpha);
}
"#;

const LINE_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
