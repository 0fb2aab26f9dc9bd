//! Rendering on a separate thread.
//!
//! The simulation stays on the caller's thread. Each frame it copies the
//! drawable state into a [`FrameSnapshot`] and sends it to a
//! [`RenderWorker`], which owns the renderer. Nothing else crosses the
//! thread boundary.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use glam::Vec3;

use crate::camera::Camera;
use crate::color::Color;
use crate::error::RenderError;
use crate::particle::{Sprite, SpriteData};
use crate::projection::Viewport;
use crate::render::{FrameStats, RenderEngine};

/// Drawable state of a particle population as flat arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSnapshot {
    /// x, y, z per particle.
    pub positions: Vec<f32>,
    /// r, g, b per particle.
    pub colors: Vec<u8>,
    pub sizes: Vec<f32>,
    pub alphas: Vec<f32>,
}

impl FrameSnapshot {
    pub fn from_sprites<S: Sprite>(sprites: &[S]) -> Self {
        let mut snapshot = Self {
            positions: Vec::with_capacity(sprites.len() * 3),
            colors: Vec::with_capacity(sprites.len() * 3),
            sizes: Vec::with_capacity(sprites.len()),
            alphas: Vec::with_capacity(sprites.len()),
        };
        for sprite in sprites {
            let p = sprite.position();
            let c = sprite.color();
            snapshot.positions.extend_from_slice(&[p.x, p.y, p.z]);
            snapshot.colors.extend_from_slice(&[c.r, c.g, c.b]);
            snapshot.sizes.push(sprite.size());
            snapshot.alphas.push(sprite.alpha());
        }
        snapshot
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Rebuild per-particle sprites from the arrays.
    ///
    /// Arrays of mismatched length yield as many sprites as the shortest
    /// one describes.
    pub fn sprites(&self) -> Vec<SpriteData> {
        self.positions
            .chunks_exact(3)
            .zip(self.colors.chunks_exact(3))
            .zip(self.sizes.iter().zip(&self.alphas))
            .map(|((p, c), (&size, &alpha))| SpriteData {
                position: Vec3::new(p[0], p[1], p[2]),
                color: Color::rgb(c[0], c[1], c[2]),
                size,
                alpha,
            })
            .collect()
    }
}

/// Messages accepted by a [`RenderWorker`].
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Draw one frame.
    Render(FrameSnapshot),
    SetPerspective(f32),
    /// Replace the camera used for camera-projected draws.
    SetCamera(Camera),
    Resize(Viewport),
}

/// Owns a [`RenderEngine`] on a background thread.
///
/// The renderer is built on the worker thread by `make_renderer`, so it
/// never has to be `Send`. After every frame `present` is called with the
/// renderer and what was drawn.
pub struct RenderWorker {
    sender: Option<Sender<WorkerMessage>>,
    handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    pub fn spawn<M, P>(make_renderer: M, present: P) -> Self
    where
        M: FnOnce() -> Result<RenderEngine, RenderError> + Send + 'static,
        P: FnMut(&mut RenderEngine, FrameStats) + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || run(receiver, make_renderer, present));
        log::debug!("render worker started");
        Self {
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    /// Queue a message for the worker.
    pub fn submit(&self, message: WorkerMessage) -> Result<(), RenderError> {
        self.sender
            .as_ref()
            .ok_or(RenderError::WorkerStopped)?
            .send(message)
            .map_err(|_| RenderError::WorkerStopped)
    }

    /// Close the channel and wait for queued frames to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("render worker panicked");
            }
            log::debug!("render worker stopped");
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<M, P>(receiver: Receiver<WorkerMessage>, make_renderer: M, mut present: P)
where
    M: FnOnce() -> Result<RenderEngine, RenderError>,
    P: FnMut(&mut RenderEngine, FrameStats),
{
    let mut renderer = match make_renderer() {
        Ok(renderer) => renderer,
        Err(e) => {
            log::error!("render worker could not create a renderer: {}", e);
            return;
        }
    };
    let mut camera = Camera::default();

    for message in receiver {
        match message {
            WorkerMessage::Render(snapshot) => {
                let sprites = snapshot.sprites();
                match renderer.render_frame(&sprites, None, &camera) {
                    Ok(stats) => present(&mut renderer, stats),
                    Err(e) => log::warn!("render worker dropped a frame: {}", e),
                }
            }
            WorkerMessage::SetPerspective(perspective) => renderer.set_perspective(perspective),
            WorkerMessage::SetCamera(c) => camera = c,
            WorkerMessage::Resize(viewport) => renderer.resize(viewport),
        }
    }

    renderer.cleanup();
}
