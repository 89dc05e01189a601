//! WGSL sources and which draw stages each one feeds.
//!
//! Sources are compiled into the binary with `include_str!`. When the crate
//! is run from its source tree the same files are also found on disk, which
//! is what shader hot reload watches.

use std::path::PathBuf;

use super::states::DrawStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Geometry,
    Lighting,
    Combine,
    Skybox,
    Particle,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 5] = [
        ShaderKind::Geometry,
        ShaderKind::Lighting,
        ShaderKind::Combine,
        ShaderKind::Skybox,
        ShaderKind::Particle,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ShaderKind::Geometry => "geometry.wgsl",
            ShaderKind::Lighting => "lighting.wgsl",
            ShaderKind::Combine => "combine.wgsl",
            ShaderKind::Skybox => "skybox.wgsl",
            ShaderKind::Particle => "particle.wgsl",
        }
    }

    /// Source compiled into the binary.
    pub fn embedded_source(self) -> &'static str {
        match self {
            ShaderKind::Geometry => include_str!("shaders/geometry.wgsl"),
            ShaderKind::Lighting => include_str!("shaders/lighting.wgsl"),
            ShaderKind::Combine => include_str!("shaders/combine.wgsl"),
            ShaderKind::Skybox => include_str!("shaders/skybox.wgsl"),
            ShaderKind::Particle => include_str!("shaders/particle.wgsl"),
        }
    }

    /// The source file on disk, if the source tree is still around.
    pub fn source_path(self) -> Option<PathBuf> {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("src")
            .join("render")
            .join("shaders")
            .join(self.file_name());
        path.exists().then_some(path)
    }

    /// Stages whose pipelines are built from this shader.
    pub fn stages(self) -> &'static [DrawStage] {
        match self {
            ShaderKind::Geometry => &[DrawStage::Geometry],
            ShaderKind::Lighting => &[DrawStage::PointLight, DrawStage::DirectionalLight],
            ShaderKind::Combine => &[DrawStage::Combine],
            ShaderKind::Skybox => &[DrawStage::Skybox],
            ShaderKind::Particle => &[DrawStage::Particles, DrawStage::Overlay],
        }
    }
}

impl DrawStage {
    pub fn shader(self) -> ShaderKind {
        match self {
            DrawStage::Geometry => ShaderKind::Geometry,
            DrawStage::PointLight | DrawStage::DirectionalLight => ShaderKind::Lighting,
            DrawStage::Combine => ShaderKind::Combine,
            DrawStage::Skybox => ShaderKind::Skybox,
            DrawStage::Particles | DrawStage::Overlay => ShaderKind::Particle,
        }
    }

    /// Vertex and fragment entry points.
    pub fn entry_points(self) -> (&'static str, &'static str) {
        match self {
            DrawStage::PointLight => ("vs_point", "fs_main"),
            DrawStage::DirectionalLight => ("vs_directional", "fs_main"),
            DrawStage::Particles => ("vs_main", "fs_additive"),
            DrawStage::Overlay => ("vs_main", "fs_alpha"),
            _ => ("vs_main", "fs_main"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stage_belongs_to_exactly_one_shader() {
        for stage in DrawStage::ALL {
            let owners: Vec<ShaderKind> = ShaderKind::ALL
                .into_iter()
                .filter(|k| k.stages().contains(&stage))
                .collect();
            assert_eq!(owners, vec![stage.shader()], "{stage:?}");
        }
    }

    #[test]
    fn entry_points_exist_in_the_source() {
        for stage in DrawStage::ALL {
            let source = stage.shader().embedded_source();
            let (vs, fs) = stage.entry_points();
            assert!(source.contains(&format!("fn {vs}(")), "{stage:?} missing {vs}");
            assert!(source.contains(&format!("fn {fs}(")), "{stage:?} missing {fs}");
        }
    }

    #[test]
    fn sources_are_found_in_the_source_tree() {
        for kind in ShaderKind::ALL {
            let path = kind.source_path().expect("tests run from the crate directory");
            assert!(path.ends_with(kind.file_name()));
        }
    }
}
