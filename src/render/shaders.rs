//! WGSL sources for the two sprite programs.
//!
//! Both programs draw each sprite as an instanced quad of six vertices and
//! read per-instance attributes from separate vertex buffers. Pixel
//! positions are mapped to clip space with a `resolution` uniform, y down.

/// Soft disk, one per particle.
pub const CIRCLE_SHADER: &str = include_str!("circle.wgsl");

/// Point, influence disk and direction arrow, one per turbulence point.
pub const TURBULENCE_SHADER: &str = include_str!("turbulence.wgsl");

/// Vertices emitted per sprite instance.
pub const VERTICES_PER_SPRITE: u32 = 6;

/// The registered shader programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Circle,
    Turbulence,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 2] = [ProgramKind::Circle, ProgramKind::Turbulence];

    /// Registry name.
    pub fn name(&self) -> &'static str {
        match self {
            ProgramKind::Circle => "circle",
            ProgramKind::Turbulence => "turbulence",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            ProgramKind::Circle => CIRCLE_SHADER,
            ProgramKind::Turbulence => TURBULENCE_SHADER,
        }
    }

    /// Look a program up by its registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(module)
    }

    fn has_entry_point(module: &naga::Module, name: &str) -> bool {
        module.entry_points.iter().any(|ep| ep.name == name)
    }

    #[test]
    fn test_circle_shader_is_valid() {
        let module = validate_wgsl(CIRCLE_SHADER).unwrap();
        assert!(has_entry_point(&module, "vs_main"));
        assert!(has_entry_point(&module, "fs_main"));
    }

    #[test]
    fn test_turbulence_shader_is_valid() {
        let module = validate_wgsl(TURBULENCE_SHADER).unwrap();
        assert!(has_entry_point(&module, "vs_main"));
        assert!(has_entry_point(&module, "fs_main"));
    }

    #[test]
    fn test_circle_falloff_constants() {
        assert!(CIRCLE_SHADER.contains("smoothstep(0.4, 0.9, dist)"));
    }

    #[test]
    fn test_program_names() {
        assert_eq!(ProgramKind::from_name("circle"), Some(ProgramKind::Circle));
        assert_eq!(ProgramKind::from_name("turbulence"), Some(ProgramKind::Turbulence));
        assert_eq!(ProgramKind::from_name("sparkle"), None);
    }
}
