//! BeatBounce: keep the pad under a ball that bounces on the beat.
//!
//! The host loop lives here: window and GPU bring-up, pointer sampling, one
//! simulation tick plus one scene-graph traversal per frame, then a 3D pass
//! and a 2D overlay pass over the resulting node matrices.

mod beat;
mod input;
mod options;
mod scene_setup;
mod sim;

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use beatbounce_audio::track::{render_track, BeatHit};
use beatbounce_audio::MusicPlayer;
use beatbounce_render::camera::GameCamera;
use beatbounce_render::context::RenderContext;
use beatbounce_render::mesh::{generate_box, generate_sphere, MeshRegistry};
use beatbounce_render::pipelines::overlay::OverlayPipeline;
use beatbounce_render::pipelines::scene3d::{
    FrameUniform, NodeBind, NodeUniform, ScenePipeline, MAX_LIGHTS,
};
use beatbounce_render::text::generate_text_mesh;
use beatbounce_scene::{MeshHandle, NodeId, NodeKind, SceneGraph, TextureHandle};

use crate::beat::hall_of_the_mountain_king;
use crate::input::PointerInput;
use crate::options::GameOptions;
use crate::scene_setup::{build_scene, SceneHandles};
use crate::sim::{MusicCommand, Simulation};

/// Clamp per-frame delta so a stall doesn't teleport the ball.
const MAX_FRAME_TIME: f64 = 0.1;

/// Base pitch of the first beat; each subsequent beat climbs the accelerando.
const TRACK_BASE_FREQUENCY: f32 = 110.0;

/// A geometry node with its GPU uniform slot and base color.
struct DrawItem {
    node: NodeId,
    bind: NodeBind,
    color: [f32; 4],
}

struct App {
    window: Option<Arc<Window>>,
    render_ctx: Option<RenderContext>,
    scene_pipeline: Option<ScenePipeline>,
    overlay_pipeline: Option<OverlayPipeline>,
    meshes: MeshRegistry,
    draw_items: Vec<DrawItem>,
    graph: SceneGraph,
    handles: SceneHandles,
    sim: Simulation,
    camera: GameCamera,
    input: PointerInput,
    player: MusicPlayer,
    // Raw pointer state, folded into `input` once per tick.
    left_down: bool,
    right_down: bool,
    last_cursor: Option<(f64, f64)>,
    last_frame: Instant,
}

impl App {
    fn new(options: GameOptions) -> Self {
        let mut graph = SceneGraph::new();
        let handles = build_scene(&mut graph);

        let schedule = hall_of_the_mountain_king();

        let player = MusicPlayer::new();
        if options.enable_music && player.is_enabled() {
            let hits: Vec<BeatHit> = schedule
                .beat_times()
                .iter()
                .enumerate()
                .map(|(i, &time)| BeatHit {
                    time,
                    frequency: TRACK_BASE_FREQUENCY * 2.0f32.powf(i as f32 / 36.0),
                    volume: 0.5,
                })
                .collect();
            player.set_track(render_track(&hits, player.sample_rate()));
        }

        let sim = Simulation::new(options, schedule);

        Self {
            window: None,
            render_ctx: None,
            scene_pipeline: None,
            overlay_pipeline: None,
            meshes: MeshRegistry::new(),
            draw_items: Vec::new(),
            graph,
            handles,
            sim,
            camera: GameCamera::new(),
            input: PointerInput::new(),
            player,
            left_down: false,
            right_down: false,
            last_cursor: None,
            last_frame: Instant::now(),
        }
    }

    /// Upload the procedural meshes and bind them to their nodes.
    fn upload_meshes(&mut self, ctx: &RenderContext, scene_pipeline: &ScenePipeline) {
        let items = [
            (
                self.handles.box_node,
                "Box",
                generate_box(Simulation::box_dimensions(), true),
                [0.17, 0.19, 0.28, 1.0],
            ),
            (
                self.handles.pad,
                "Pad",
                generate_box(Simulation::pad_dimensions(), false),
                [0.82, 0.84, 0.88, 1.0],
            ),
            (
                self.handles.ball,
                "Ball",
                generate_sphere(1.0, 40, 40),
                [0.93, 0.89, 0.80, 1.0],
            ),
        ];

        for (node, label, (vertices, indices), color) in items {
            let handle = self.meshes.upload(&ctx.device, label, &vertices, &indices);
            let target = self.graph.node_mut(node);
            target.mesh = Some(MeshHandle(handle));
            target.index_count = indices.len() as u32;
            self.draw_items.push(DrawItem {
                node,
                bind: scene_pipeline.create_node_bind(&ctx.device),
                color,
            });
        }

        let (vertices, indices) = generate_text_mesh("CLICK TO START", 39.0 / 29.0, 420.0);
        let handle = self.meshes.upload(&ctx.device, "Text", &vertices, &indices);
        let text = self.graph.node_mut(self.handles.text);
        text.mesh = Some(MeshHandle(handle));
        text.index_count = indices.len() as u32;
        // The font atlas is the only texture; the overlay pipeline owns it.
        text.texture = Some(TextureHandle(0));
        text.position = glam::Vec3::new(40.0, 40.0, 0.0);
    }

    fn render_frame(&mut self) {
        let aspect = match &self.render_ctx {
            Some(ctx) => ctx.aspect(),
            None => return,
        };

        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame)
            .as_secs_f64()
            .min(MAX_FRAME_TIME);
        self.last_frame = now;

        self.input.update_buttons(self.left_down, self.right_down);
        let command = self
            .sim
            .tick(dt, &self.input, &mut self.graph, &self.handles);
        match command {
            Some(MusicCommand::Play(offset)) => self.player.play(offset),
            Some(MusicCommand::Pause) => self.player.pause(),
            Some(MusicCommand::Resume) => self.player.resume(),
            Some(MusicCommand::Stop) => self.player.stop(),
            None => {}
        }

        let (pad_x, pad_z) = self.sim.pad_axes();
        let view_projection = self
            .camera
            .view_projection(aspect, pad_x as f32, pad_z as f32);
        self.graph.update_transforms(view_projection);

        let (Some(ctx), Some(scene_pipeline), Some(overlay_pipeline)) = (
            &self.render_ctx,
            &self.scene_pipeline,
            &self.overlay_pipeline,
        ) else {
            return;
        };

        // Per-frame shader inputs: lights from the graph, camera, ball.
        let ball_center = self.graph.node(self.handles.ball).position;
        let mut frame = FrameUniform::new(
            self.camera.position,
            ball_center,
            sim::BALL_RADIUS as f32,
        );
        for (i, &light) in self.graph.lights().iter().take(MAX_LIGHTS).enumerate() {
            match self.graph.node(light).kind {
                NodeKind::PointLight {
                    color,
                    world_position,
                    ..
                }
                | NodeKind::SpotLight {
                    color,
                    world_position,
                    ..
                } => frame.set_light(i, world_position, color),
                NodeKind::Geometry | NodeKind::Geometry2d => {}
            }
        }
        scene_pipeline.update_frame(&ctx.queue, &frame);

        for item in &self.draw_items {
            let node = self.graph.node(item.node);
            item.bind.update(
                &ctx.queue,
                &NodeUniform::new(node.clip, node.model, node.normal, item.color),
            );
        }

        let text_model = self.graph.node(self.handles.text).model;
        overlay_pipeline.update_transform(
            &ctx.queue,
            ctx.config.width as f32,
            ctx.config.height as f32,
            text_model,
        );

        let frame_tex = match ctx.surface.get_current_texture() {
            Ok(frame_tex) => frame_tex,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost; reconfiguring");
                ctx.surface.configure(&ctx.device, &ctx.config);
                return;
            }
            Err(e) => {
                log::warn!("failed to acquire frame: {e:?}");
                return;
            }
        };
        let view = frame_tex
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.008,
                            g: 0.010,
                            b: 0.018,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&scene_pipeline.pipeline);
            pass.set_bind_group(0, &scene_pipeline.frame_bind_group, &[]);
            for item in &self.draw_items {
                let node = self.graph.node(item.node);
                let Some(mesh) = node.mesh else { continue };
                let mesh = self.meshes.get(mesh.0);
                pass.set_bind_group(1, &item.bind.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..node.index_count, 0, 0..1);
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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

            let text = self.graph.node(self.handles.text);
            if let Some(mesh) = text.mesh {
                let mesh = self.meshes.get(mesh.0);
                pass.set_pipeline(&overlay_pipeline.pipeline);
                pass.set_bind_group(0, &overlay_pipeline.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..text.index_count, 0, 0..1);
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame_tex.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title("BeatBounce")
                        .with_inner_size(winit::dpi::LogicalSize::new(1366, 768)),
                )
                .expect("Failed to create window"),
        );
        window.set_cursor_visible(false);
        let _ = window.set_cursor_grab(CursorGrabMode::Confined);

        let ctx = pollster::block_on(RenderContext::new(window.clone()));
        let scene_pipeline = ScenePipeline::new(&ctx);
        let overlay_pipeline = OverlayPipeline::new(&ctx);

        self.upload_meshes(&ctx, &scene_pipeline);

        log::info!(
            "initialized scene with {} nodes ({} lights)",
            self.graph.descendant_count(self.graph.root()) + 1,
            self.graph.lights().len()
        );
        log::info!("ready. click to start");

        self.window = Some(window);
        self.render_ctx = Some(ctx);
        self.scene_pipeline = Some(scene_pipeline);
        self.overlay_pipeline = Some(overlay_pipeline);
        self.last_frame = Instant::now();
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(ctx) = &mut self.render_ctx {
                    ctx.resize(new_size);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::MouseInput { state, button, .. } => match button {
                MouseButton::Left => self.left_down = state == ElementState::Pressed,
                MouseButton::Right => self.right_down = state == ElementState::Pressed,
                _ => {}
            },
            WindowEvent::CursorMoved { position, .. } => {
                if let (Some((last_x, last_y)), Some(ctx)) = (self.last_cursor, &self.render_ctx) {
                    let dx = position.x - last_x;
                    let dy = position.y - last_y;
                    self.input.apply_pointer_delta(
                        dx,
                        dy,
                        ctx.config.width as f64,
                        ctx.config.height as f64,
                    );
                }
                self.last_cursor = Some((position.x, position.y));
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();
    let options = GameOptions::parse();
    if options.enable_autoplay {
        log::info!("autoplay enabled: the pad will track the ball");
    }

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(options);
    event_loop.run_app(&mut app).expect("Event loop failed");
}
