use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use sparkburst::prelude::*;

const BURST_SIZE: usize = 200;
const ORBIT_STEP: f32 = 0.05;
const ORBIT_DISTANCE: f32 = 1000.0;

const TURBULENCE_POINTS: usize = 50;
const TURBULENCE_SPREAD: f32 = 300.0;
const TURBULENCE_FORCE: f32 = 15.0;
const TURBULENCE_RADIUS: f32 = 80.0;

/// Everything that can stop the demo.
#[derive(Debug)]
pub enum DemoError {
    EventLoop(winit::error::EventLoopError),
    Window(winit::error::OsError),
    Gpu(GpuError),
    Render(RenderError),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoError::EventLoop(e) => write!(f, "Event loop error: {}", e),
            DemoError::Window(e) => write!(f, "Failed to create window: {}", e),
            DemoError::Gpu(e) => write!(f, "{}", e),
            DemoError::Render(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DemoError::EventLoop(e) => Some(e),
            DemoError::Window(e) => Some(e),
            DemoError::Gpu(e) => Some(e),
            DemoError::Render(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for DemoError {
    fn from(e: winit::error::EventLoopError) -> Self {
        DemoError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for DemoError {
    fn from(e: winit::error::OsError) -> Self {
        DemoError::Window(e)
    }
}

impl From<GpuError> for DemoError {
    fn from(e: GpuError) -> Self {
        DemoError::Gpu(e)
    }
}

impl From<RenderError> for DemoError {
    fn from(e: RenderError) -> Self {
        DemoError::Render(e)
    }
}

impl From<wgpu::CreateSurfaceError> for DemoError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        DemoError::Gpu(GpuError::SurfaceCreation(e))
    }
}

struct Scene {
    renderer: RenderEngine,
    engine: ParticleEngine,
    camera: Camera,
    clock: FrameClock,
    orbit: Vec2,
}

impl Scene {
    fn new(window: Arc<Window>) -> Result<Self, DemoError> {
        let size = window.inner_size();
        let viewport = Viewport::new(size.width as f32, size.height as f32);
        let config = RenderConfig::default();

        let instance = GpuContext::create_instance();
        let surface = instance.create_surface(window)?;
        let context = pollster::block_on(GpuContext::request(instance, Some(&surface)))?;
        let surface_config = context.surface_config(&surface, size.width, size.height)?;
        let backend =
            GpuSpriteBackend::with_surface(context, surface, surface_config, config.batch_size)?;

        let mut scene = Self {
            renderer: RenderEngine::gpu(backend, viewport, config),
            engine: ParticleEngine::new().with_turbulence(TurbulenceField::new()),
            camera: Camera::default(),
            clock: FrameClock::new(config.fps),
            orbit: Vec2::ZERO,
        };
        scene.reset_turbulence();
        scene.update_camera();
        Ok(scene)
    }

    fn center(&self) -> Vec3 {
        self.renderer.viewport().center().extend(0.0)
    }

    fn reset_turbulence(&mut self) {
        let center = self.center();
        if let Some(field) = self.engine.turbulence_mut() {
            field.create_random_pattern(
                center,
                TURBULENCE_SPREAD,
                TURBULENCE_POINTS,
                TURBULENCE_FORCE,
                TURBULENCE_RADIUS,
            );
        }
    }

    fn update_camera(&mut self) {
        let center = self.center();
        self.camera
            .rotate_orbit(self.orbit.x, self.orbit.y, ORBIT_DISTANCE, center);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.renderer
            .resize(Viewport::new(width as f32, height as f32));
        self.update_camera();
    }

    fn key(&mut self, code: KeyCode) {
        match code {
            KeyCode::ArrowLeft => self.orbit.y -= ORBIT_STEP,
            KeyCode::ArrowRight => self.orbit.y += ORBIT_STEP,
            KeyCode::ArrowUp => self.orbit.x -= ORBIT_STEP,
            KeyCode::ArrowDown => self.orbit.x += ORBIT_STEP,
            KeyCode::KeyT => {
                let show = !self.renderer.show_turbulence();
                self.renderer.set_show_turbulence(show);
                log::info!("turbulence glyphs {}", if show { "on" } else { "off" });
                return;
            }
            KeyCode::KeyP => {
                let next = match self.renderer.particle_projection() {
                    ParticleProjection::Perspective => ParticleProjection::Camera,
                    ParticleProjection::Camera => ParticleProjection::Perspective,
                };
                self.renderer.set_particle_projection(next);
                log::info!("particle projection: {:?}", next);
                return;
            }
            KeyCode::KeyR => {
                self.reset_turbulence();
                return;
            }
            KeyCode::KeyF => {
                let next = match self.engine.factory() {
                    ParticleFactory::Default => ParticleFactory::Fire,
                    ParticleFactory::Fire => ParticleFactory::Water,
                    _ => ParticleFactory::Default,
                };
                log::info!("factory: {}", next.name());
                self.engine.set_factory(next);
                return;
            }
            KeyCode::Space => {
                if self.clock.is_paused() {
                    self.clock.resume();
                } else {
                    self.clock.pause();
                }
                return;
            }
            _ => return,
        }
        self.update_camera();
    }

    /// Step and draw if a frame is due.
    fn frame(&mut self) -> Result<(), RenderError> {
        let Some(delta_ms) = self.clock.tick(Instant::now()) else {
            return Ok(());
        };
        self.engine.update(delta_ms);
        self.engine.sort_particles();
        self.renderer
            .render_frame(self.engine.particles(), self.engine.turbulence(), &self.camera)?;
        Ok(())
    }
}

pub struct App {
    window: Option<Arc<Window>>,
    scene: Option<Scene>,
    cursor: Option<Vec2>,
    error: Option<DemoError>,
}

impl App {
    pub fn new() -> Self {
        Self {
            window: None,
            scene: None,
            cursor: None,
            error: None,
        }
    }

    /// Error that ended the event loop, if any.
    pub fn into_result(self) -> Result<(), DemoError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: DemoError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("sparkburst")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        self.window = Some(window.clone());

        match Scene::new(window.clone()) {
            Ok(scene) => {
                self.scene = Some(scene);
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(mut scene) = self.scene.take() {
                    scene.renderer.cleanup();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(scene) = &mut self.scene {
                    scene.resize(physical_size.width, physical_size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let (Some(scene), Some(cursor)) = (&mut self.scene, self.cursor) {
                    scene
                        .engine
                        .spawn_particles(cursor.extend(0.0), BURST_SIZE);
                    log::debug!("burst at {:?}, {} live", cursor, scene.engine.len());
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape {
                    event_loop.exit();
                } else if let Some(scene) = &mut self.scene {
                    scene.key(code);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(scene) = &mut self.scene {
                    match scene.frame() {
                        Ok(()) => {}
                        Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                            return self.fail(
                                event_loop,
                                RenderError::Surface(wgpu::SurfaceError::OutOfMemory).into(),
                            );
                        }
                        // Lost and outdated surfaces are reconfigured by the backend
                        Err(RenderError::Surface(e)) => log::warn!("skipped frame: {}", e),
                        Err(e) => return self.fail(event_loop, e.into()),
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
