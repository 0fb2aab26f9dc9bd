//! Error types for sparkburst.
//!
//! GPU acquisition and shader compilation are construction-time failures:
//! a renderer that could not be built is never handed out. Projection
//! failures are per-entity and are skipped by the renderers.

use std::fmt;

/// Errors that can occur while acquiring a GPU context.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The surface reports no supported texture formats for this adapter.
    NoSurfaceFormat,
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::NoSurfaceFormat => write!(f, "Surface is not compatible with the selected adapter"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors raised by renderers and their shader programs.
#[derive(Debug)]
pub enum RenderError {
    /// GPU context acquisition failed.
    Gpu(GpuError),
    /// A shader program failed to compile or link.
    ShaderCompile {
        /// Name of the program that failed.
        program: String,
        /// Compiler or validation message.
        message: String,
    },
    /// A program was requested by a name that was never registered.
    ProgramNotFound(String),
    /// The renderer's resources were already released by `cleanup`.
    Released,
    /// No render target was bound before drawing.
    NoTarget,
    /// Acquiring the next swapchain texture failed.
    Surface(wgpu::SurfaceError),
    /// The render worker thread has exited.
    WorkerStopped,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Gpu(e) => write!(f, "GPU error: {}", e),
            RenderError::ShaderCompile { program, message } => {
                write!(f, "Shader program '{}' failed to compile: {}", program, message)
            }
            RenderError::ProgramNotFound(name) => write!(f, "Shader program '{}' not found", name),
            RenderError::Released => write!(f, "Renderer resources have already been released"),
            RenderError::NoTarget => write!(f, "No render target bound; call set_target() first"),
            RenderError::Surface(e) => write!(f, "Surface error: {}", e),
            RenderError::WorkerStopped => write!(f, "Render worker is no longer running"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Gpu(e) => Some(e),
            RenderError::Surface(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GpuError> for RenderError {
    fn from(e: GpuError) -> Self {
        RenderError::Gpu(e)
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(e: wgpu::SurfaceError) -> Self {
        RenderError::Surface(e)
    }
}

/// Numeric degeneracies hit while projecting a single point.
///
/// These are recoverable: the offending entity is skipped for the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionError {
    /// Camera position equals its target, or the view direction is parallel
    /// to world up, so no orthonormal basis exists.
    DegenerateBasis,
    /// The point lies on or behind the camera's view plane.
    BehindViewPlane,
    /// `far` is not beyond `near`.
    DegenerateDepthRange,
    /// `perspective + z` is zero or negative.
    SingularPerspective,
    /// Viewport width or height is zero.
    EmptyViewport,
    /// The projection produced NaN or infinity.
    NonFinite,
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionError::DegenerateBasis => write!(f, "camera basis is degenerate"),
            ProjectionError::BehindViewPlane => write!(f, "point is on or behind the view plane"),
            ProjectionError::DegenerateDepthRange => write!(f, "far plane is not beyond the near plane"),
            ProjectionError::SingularPerspective => write!(f, "perspective denominator is not positive"),
            ProjectionError::EmptyViewport => write!(f, "viewport has zero area"),
            ProjectionError::NonFinite => write!(f, "projection produced a non-finite value"),
        }
    }
}

impl std::error::Error for ProjectionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_not_found_names_the_program() {
        let err = RenderError::ProgramNotFound("sparkle".into());
        assert_eq!(err.to_string(), "Shader program 'sparkle' not found");
    }

    #[test]
    fn test_gpu_error_wraps_into_render_error() {
        let err: RenderError = GpuError::NoAdapter.into();
        assert!(matches!(err, RenderError::Gpu(GpuError::NoAdapter)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
