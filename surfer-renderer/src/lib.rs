use clock::Clock;
use wgpu::util::DeviceExt;
use winit::{
    error::EventLoopError,
    event::{ElementState, Event, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use surfer_game::{
    gpu::DrawRecorder,
    input::InputState,
    mesh::{Mesh, MeshData},
    Error, Game, GameConfig,
};

pub mod clock;

mod camera;
mod mesh_renderer;
mod texture;
mod wgpu_device;

pub use wgpu_device::WgpuDevice;

const SKY_BLUE: wgpu::Color = wgpu::Color {
    r: 0.4,
    g: 0.6,
    b: 0.9,
    a: 1.0,
};

/// Scroll distance in pixels that counts as one wheel notch.
const PIXELS_PER_LINE: f32 = 40.0;

pub struct State<'a, C: Clock> {
    surface: wgpu::Surface<'a>,
    gpu: WgpuDevice,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    window: &'a Window,
    camera: camera::Camera,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    depth_texture: texture::Texture,
    mesh_renderer: mesh_renderer::MeshRenderer,
    recorder: DrawRecorder,
    game: Game,
    controls: InputState,
    show_bounding_boxes: bool,
    clock: C,
    last_frame: C::Instant,
}

impl<'a, C: Clock> State<'a, C> {
    pub async fn new(
        window: &'a Window,
        backends: wgpu::Backends,
        clock: C,
        game_config: GameConfig,
        character: MeshData,
    ) -> surfer_game::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|err| Error::Gpu(err.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| Error::Gpu("no compatible adapter".to_owned()))?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    label: None,
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|err| Error::Gpu(err.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);

        let fallback_format = *surface_caps
            .formats
            .first()
            .ok_or_else(|| Error::Gpu("surface has no supported formats".to_owned()))?;
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(fallback_format);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera = camera::Camera::new(config.width as f32 / config.height as f32);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera.uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let depth_texture =
            texture::Texture::create_depth_texture(&device, &config, "depth_texture");

        let mesh_renderer =
            mesh_renderer::MeshRenderer::new(&device, &camera_bind_group_layout, config.format);

        let mut gpu = WgpuDevice::new(device);
        let character = Mesh::new(character, &mut gpu)?;
        let game = Game::new(game_config, character, &mut gpu)?;

        Ok(Self {
            surface,
            gpu,
            queue,
            config,
            size,
            window,
            camera,
            camera_buffer,
            camera_bind_group,
            depth_texture,
            mesh_renderer,
            recorder: DrawRecorder::default(),
            game,
            controls: InputState::default(),
            show_bounding_boxes: false,
            last_frame: clock.now(),
            clock,
        })
    }

    pub fn run(&mut self, event_loop: EventLoop<()>) -> Result<(), EventLoopError> {
        event_loop.run(move |event, control_flow| match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == self.window.id() => {
                if !self.input(event) {
                    match event {
                        WindowEvent::CloseRequested
                        | WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    state: ElementState::Pressed,
                                    physical_key:
                                        PhysicalKey::Code(KeyCode::KeyQ | KeyCode::Escape),
                                    ..
                                },
                            ..
                        } => control_flow.exit(),
                        WindowEvent::Resized(physical_size) => {
                            self.resize(*physical_size);
                        }
                        WindowEvent::RedrawRequested => {
                            self.window.request_redraw();

                            if let Err(err) = self.update() {
                                log::error!("Game update failed: {err}");
                                control_flow.exit();
                                return;
                            }
                            match self.render() {
                                Ok(_) => {}
                                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                    self.resize(self.size);
                                }
                                Err(
                                    wgpu::SurfaceError::OutOfMemory | wgpu::SurfaceError::Other,
                                ) => {
                                    log::error!("OutOfMemory");
                                    control_flow.exit();
                                }
                                Err(wgpu::SurfaceError::Timeout) => {
                                    log::warn!("Surface timeout")
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(self.gpu.device(), &self.config);

        self.depth_texture =
            texture::Texture::create_depth_texture(self.gpu.device(), &self.config, "depth_texture");

        self.camera.aspect = new_size.width as f32 / new_size.height as f32;
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform()]),
        );
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = *state == ElementState::Pressed;
                match code {
                    KeyCode::KeyW | KeyCode::ArrowUp => self.controls.forward = pressed,
                    KeyCode::KeyS | KeyCode::ArrowDown => self.controls.back = pressed,
                    KeyCode::KeyA | KeyCode::ArrowLeft => self.controls.left = pressed,
                    KeyCode::KeyD | KeyCode::ArrowRight => self.controls.right = pressed,
                    KeyCode::Space => self.controls.jump = pressed,
                    KeyCode::KeyR => self.controls.restart = pressed,
                    KeyCode::KeyB => {
                        if pressed && !repeat {
                            self.show_bounding_boxes = !self.show_bounding_boxes;
                            log::debug!("Bounding boxes visible: {}", self.show_bounding_boxes);
                        }
                    }
                    _ => return false,
                }
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.controls.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
                };
                true
            }
            _ => false,
        }
    }

    fn update(&mut self) -> surfer_game::Result<()> {
        let this_frame = self.clock.now();
        let delta_time = self.clock.seconds_elapsed(self.last_frame, this_frame);

        self.game.update(delta_time, &self.controls, &mut self.gpu)?;
        self.controls.end_frame();
        self.gpu.collect_garbage();

        self.camera.update(self.game.state());
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform()]),
        );

        self.last_frame = this_frame;
        Ok(())
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        if self.size.width == 0 || self.size.height == 0 {
            return Ok(());
        }

        self.recorder.draws.clear();
        self.game.draw(&mut self.recorder, self.show_bounding_boxes);
        self.mesh_renderer
            .prepare(self.gpu.device(), &self.queue, &self.recorder.draws);

        let output = self.surface.get_current_texture()?;

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.gpu
                .device()
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
                        load: wgpu::LoadOp::Clear(SKY_BLUE),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.mesh_renderer.render(
                &mut render_pass,
                &self.camera_bind_group,
                &self.recorder.draws,
                &self.gpu,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
