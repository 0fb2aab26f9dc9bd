//! Integration tests for projection and the rendering paths.
//!
//! GPU-free: the batch path is driven through a counting backend and the
//! 2D path draws into an in-memory image.

use std::sync::mpsc;

use image::Rgba;
use sparkburst::prelude::*;
use sparkburst::projection::{project_point, project_point_camera};
use sparkburst::render::{pack_sprite, BatchRenderer, GlyphBatch, ParticleBatch, SpriteBackend};
use sparkburst::{Canvas2dRenderer, FrameStats, SpriteData};

#[derive(Default)]
struct CountingBackend {
    particle_draws: Vec<usize>,
    glyph_draws: Vec<usize>,
    packed: Vec<f32>,
}

impl SpriteBackend for CountingBackend {
    fn clear(&mut self, _color: Color) -> Result<(), RenderError> {
        Ok(())
    }

    fn draw_particles(&mut self, batch: &ParticleBatch) -> Result<(), RenderError> {
        self.particle_draws.push(batch.len());
        self.packed.extend_from_slice(&batch.positions);
        Ok(())
    }

    fn draw_glyphs(&mut self, batch: &GlyphBatch) -> Result<(), RenderError> {
        self.glyph_draws.push(batch.len());
        Ok(())
    }

    fn resize(&mut self, _viewport: Viewport) {}

    fn release(&mut self) {}
}

fn burst(n: usize) -> ParticleEngine {
    let mut engine = ParticleEngine::with_seed(21);
    engine.spawn_particles(Vec3::new(640.0, 360.0, 0.0), n);
    engine.update(300.0);
    engine
}

// ============================================================================
// Projection
// ============================================================================

#[test]
fn test_projection_is_pure() {
    let viewport = Viewport::new(1280.0, 720.0);
    let camera = Camera::default();
    let p = Vec3::new(120.0, -40.0, 250.0);

    assert_eq!(
        project_point(p, 3.0, 1000.0, viewport),
        project_point(p, 3.0, 1000.0, viewport)
    );
    assert_eq!(
        project_point_camera(p, 3.0, &camera, viewport),
        project_point_camera(p, 3.0, &camera, viewport)
    );
}

#[test]
fn test_projection_is_continuous() {
    let viewport = Viewport::new(800.0, 600.0);
    let camera = Camera::default();
    let p = Vec3::new(50.0, 80.0, -100.0);
    let q = p + Vec3::splat(1e-3);

    let a = project_point(p, 3.0, 1000.0, viewport).unwrap();
    let b = project_point(q, 3.0, 1000.0, viewport).unwrap();
    assert!((a.x - b.x).abs() < 1e-2 && (a.y - b.y).abs() < 1e-2);

    let a = project_point_camera(p, 3.0, &camera, viewport).unwrap();
    let b = project_point_camera(q, 3.0, &camera, viewport).unwrap();
    assert!((a.x - b.x).abs() < 1e-2 && (a.y - b.y).abs() < 1e-2);
}

#[test]
fn test_singular_inputs_are_errors() {
    let viewport = Viewport::new(800.0, 600.0);
    assert_eq!(
        project_point(Vec3::new(0.0, 0.0, -1000.0), 3.0, 1000.0, viewport),
        Err(ProjectionError::SingularPerspective)
    );

    let camera = Camera::new(Vec3::ONE, Vec3::ONE);
    assert_eq!(
        project_point_camera(Vec3::ZERO, 3.0, &camera, viewport),
        Err(ProjectionError::DegenerateBasis)
    );
}

// ============================================================================
// Batch path
// ============================================================================

#[test]
fn test_batch_submissions_are_ceil() {
    let engine = burst(2345);
    let projector = Projector::Perspective { perspective: 1000.0 };

    for batch_size in [1000, 500, 2345, 4000] {
        let mut renderer = BatchRenderer::new(
            CountingBackend::default(),
            Viewport::new(1280.0, 720.0),
            &RenderConfig::default().with_batch_size(batch_size),
        );
        let drawn = renderer
            .draw_particles_batch(engine.particles(), &projector)
            .unwrap();
        assert_eq!(drawn, 2345);
        assert_eq!(
            renderer.backend().particle_draws.len(),
            (2345 + batch_size - 1) / batch_size
        );
    }
}

#[test]
fn test_batch_positions_match_single_projection() {
    let engine = burst(300);
    let viewport = Viewport::new(1280.0, 720.0);
    let camera = Camera::default();
    let projector = Projector::Camera(&camera);

    let mut renderer = BatchRenderer::new(
        CountingBackend::default(),
        viewport,
        &RenderConfig::default().with_batch_size(64),
    );
    renderer
        .draw_particles_batch(engine.particles(), &projector)
        .unwrap();

    let single: Vec<f32> = engine
        .particles()
        .iter()
        .filter_map(|p| pack_sprite(p, &projector, viewport).ok())
        .flat_map(|s| [s.position.x, s.position.y])
        .collect();
    assert_eq!(renderer.backend().packed, single);
}

#[test]
fn test_render_engine_draws_glyphs_after_particles() {
    let mut field = TurbulenceField::with_seed(2);
    field.create_random_pattern(Vec3::ZERO, 100.0, 50, 10.0, 20.0);
    let mut engine = burst(100);
    engine.set_turbulence(Some(field));

    let mut renderer = RenderEngine::gpu(
        CountingBackend::default(),
        Viewport::new(1280.0, 720.0),
        RenderConfig::default(),
    );
    let stats = renderer
        .render_frame(engine.particles(), engine.turbulence(), &Camera::default())
        .unwrap();
    assert_eq!(stats, FrameStats { particles: 100, glyphs: 50 });
}

// ============================================================================
// 2D path
// ============================================================================

#[test]
fn test_canvas_draws_particles_into_image() {
    let sprites = [
        SpriteData {
            position: Vec3::new(20.0, 20.0, 0.0),
            color: Color::WHITE,
            size: 4.0,
            alpha: 1.0,
        },
        SpriteData {
            position: Vec3::new(60.0, 60.0, -200.0),
            color: Color::RED,
            size: 4.0,
            alpha: 1.0,
        },
    ];
    let projector = Projector::Perspective { perspective: 1000.0 };
    let mut canvas = Canvas2dRenderer::new(ImageSurface::new(100, 100));
    canvas.clear().unwrap();
    let drawn = canvas.draw_particles_batch(&sprites, &projector).unwrap();
    assert_eq!(drawn, 2);

    let surface = canvas.surface();
    assert_eq!(surface.pixel(20, 20), Some(Rgba([255, 255, 255, 255])));
    assert_eq!(surface.pixel(90, 10), Some(Rgba([0, 0, 0, 255])));

    // The near particle is a dimmed hexagon, so red but not full intensity
    let near = project_point(sprites[1].position, 4.0, 1000.0, surface.size()).unwrap();
    let px = surface.pixel(near.x as u32, near.y as u32).unwrap();
    assert!(px[0] > 0 && px[0] < 255);
    assert_eq!((px[1], px[2]), (0, 0));
}

// ============================================================================
// Offload
// ============================================================================

#[test]
fn test_worker_receives_snapshots() {
    let (tx, rx) = mpsc::channel();
    let worker = RenderWorker::spawn(
        || Ok(RenderEngine::canvas(ImageSurface::new(320, 240), RenderConfig::default())),
        move |_, stats| {
            let _ = tx.send(stats.particles);
        },
    );

    let mut engine = burst(64);
    worker.submit(WorkerMessage::Render(engine.snapshot())).unwrap();
    engine.update(100_000.0);
    worker.submit(WorkerMessage::Render(engine.snapshot())).unwrap();
    worker.shutdown();

    assert_eq!(rx.iter().collect::<Vec<_>>(), vec![64, 0]);
}
