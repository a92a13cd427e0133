//! SDF-based WebGPU render pipeline
//!
//! Renders the entire playfield in the fragment shader using signed
//! distance fields: one fullscreen triangle, one uniform buffer of
//! globals, and a storage buffer per entity class uploaded every frame.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::consts::MAX_BALLS;
use crate::sim::{BrickStatus, GamePhase, GameState};

/// Brick slots in the GPU buffer (8x5 grid plus headroom)
const MAX_BRICKS: usize = 64;
/// Falling-entity slots; spawns are probabilistic so this is generous
const MAX_POWERUPS: usize = 32;
const MAX_HAZARDS: usize = 32;

// GPU data structures (layouts must match sdf_shader.wgsl)

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2],
    field: [f32; 2],
    time: f32,
    ball_count: u32,
    brick_count: u32,
    powerup_count: u32,
    hazard_count: u32,
    /// 0=ready 1=playing 2=gameOver 3=win
    phase: u32,
    /// 1 while the hazard flash sequence holds the paddle lit
    paddle_flash: u32,
    _pad: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PaddleUniform {
    pos: [f32; 2],
    size: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BallData {
    pos: [f32; 2],
    radius: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BrickData {
    pos: [f32; 2],
    size: [f32; 2],
    /// Category color packed 0xRRGGBBAA
    color: u32,
    /// 0=empty 1=active 2=regenerating
    status: u32,
    _pad: [u32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PowerUpData {
    pos: [f32; 2],
    size: f32,
    /// 0=multiball 1=split
    kind: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct HazardData {
    pos: [f32; 2],
    size: f32,
    _pad: u32,
}

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    paddle_buffer: wgpu::Buffer,
    balls_buffer: wgpu::Buffer,
    bricks_buffer: wgpu::Buffer,
    powerups_buffer: wgpu::Buffer,
    hazards_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Self {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [width as f32, height as f32],
                field: [0.0, 0.0],
                time: 0.0,
                ball_count: 0,
                brick_count: 0,
                powerup_count: 0,
                hazard_count: 0,
                phase: 0,
                paddle_flash: 0,
                _pad: 0,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let paddle_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("paddle"),
            contents: bytemuck::bytes_of(&PaddleUniform {
                pos: [0.0, 0.0],
                size: [0.0, 0.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let balls_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("balls"),
            size: (std::mem::size_of::<BallData>() * MAX_BALLS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bricks_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bricks"),
            size: (std::mem::size_of::<BrickData>() * MAX_BRICKS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let powerups_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("powerups"),
            size: (std::mem::size_of::<PowerUpData>() * MAX_POWERUPS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let hazards_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("hazards"),
            size: (std::mem::size_of::<HazardData>() * MAX_HAZARDS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                storage_entry(2),
                storage_entry(3),
                storage_entry(4),
                storage_entry(5),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: paddle_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: balls_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: bricks_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: powerups_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: hazards_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            paddle_buffer,
            balls_buffer,
            bricks_buffer,
            powerups_buffer,
            hazards_buffer,
            bind_group,
            size: (width, height),
        }
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Upload the frame's entity data and draw. `time` is ms since page
    /// load from requestAnimationFrame.
    pub fn render(&mut self, state: &GameState, time: f64) -> Result<(), wgpu::SurfaceError> {
        let elapsed = (time / 1000.0) as f32;

        let ball_count = state.balls.len().min(MAX_BALLS) as u32;
        let brick_count = state.bricks.len().min(MAX_BRICKS) as u32;
        let powerup_count = state.powerups.len().min(MAX_POWERUPS) as u32;
        let hazard_count = state.hazards.len().min(MAX_HAZARDS) as u32;

        let globals = Globals {
            resolution: [self.size.0 as f32, self.size.1 as f32],
            field: [state.width, state.height],
            time: elapsed,
            ball_count,
            brick_count,
            powerup_count,
            hazard_count,
            phase: match state.phase {
                GamePhase::Ready => 0,
                GamePhase::Playing => 1,
                GamePhase::GameOver => 2,
                GamePhase::Win => 3,
            },
            paddle_flash: u32::from(state.paddle.flash_on),
            _pad: 0,
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let paddle = PaddleUniform {
            pos: [state.paddle.pos.x, state.paddle.pos.y],
            size: [state.paddle.w, state.paddle.h],
        };
        self.queue
            .write_buffer(&self.paddle_buffer, 0, bytemuck::bytes_of(&paddle));

        let mut balls_data = [BallData {
            pos: [0.0; 2],
            radius: 0.0,
            _pad: 0.0,
        }; MAX_BALLS];
        for (i, ball) in state.balls.iter().take(MAX_BALLS).enumerate() {
            balls_data[i] = BallData {
                pos: [ball.pos.x, ball.pos.y],
                radius: ball.radius,
                _pad: 0.0,
            };
        }
        self.queue
            .write_buffer(&self.balls_buffer, 0, bytemuck::cast_slice(&balls_data));

        let mut bricks_data = [BrickData {
            pos: [0.0; 2],
            size: [0.0; 2],
            color: 0,
            status: 0,
            _pad: [0; 2],
        }; MAX_BRICKS];
        for (i, brick) in state.bricks.iter().take(MAX_BRICKS).enumerate() {
            bricks_data[i] = BrickData {
                pos: [brick.rect.pos.x, brick.rect.pos.y],
                size: [brick.rect.size.x, brick.rect.size.y],
                color: state.book.category_color_rgba(brick.category),
                status: match brick.status {
                    BrickStatus::Empty => 0,
                    BrickStatus::Active => 1,
                    BrickStatus::Regenerating => 2,
                },
                _pad: [0; 2],
            };
        }
        self.queue
            .write_buffer(&self.bricks_buffer, 0, bytemuck::cast_slice(&bricks_data));

        let mut powerups_data = [PowerUpData {
            pos: [0.0; 2],
            size: 0.0,
            kind: 0,
        }; MAX_POWERUPS];
        for (i, p) in state.powerups.iter().take(MAX_POWERUPS).enumerate() {
            powerups_data[i] = PowerUpData {
                pos: [p.pos.x, p.pos.y],
                size: p.size,
                kind: match p.kind {
                    crate::sim::PowerUpKind::Multiball => 0,
                    crate::sim::PowerUpKind::Split => 1,
                },
            };
        }
        self.queue.write_buffer(
            &self.powerups_buffer,
            0,
            bytemuck::cast_slice(&powerups_data),
        );

        let mut hazards_data = [HazardData {
            pos: [0.0; 2],
            size: 0.0,
            _pad: 0,
        }; MAX_HAZARDS];
        for (i, h) in state.hazards.iter().take(MAX_HAZARDS).enumerate() {
            hazards_data[i] = HazardData {
                pos: [h.pos.x, h.pos.y],
                size: h.size,
                _pad: 0,
            };
        }
        self.queue
            .write_buffer(&self.hazards_buffer, 0, bytemuck::cast_slice(&hazards_data));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
