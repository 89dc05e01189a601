//! # Pipeline States per Draw Stage
//!
//! Each stage of the frame needs its own blend / cull / depth combination.
//! They are collected in one table so the combinations can be checked
//! without a GPU, and the pipelines in [`deferred`](super::deferred) are
//! built from it.
//!
//! ```text
//! stage             blend      cull    depth target  compare  write
//! ───────────────── ────────── ─────── ───────────── ──────── ─────
//! Geometry          opaque     back    scene         <        yes
//! PointLight        additive   front   light         ≤        no
//! DirectionalLight  additive   none    light         ≤        no
//! Combine           opaque     none    scene         always   no
//! Skybox            opaque     front   scene         ≤        no
//! Particles         additive   none    scene         <        no
//! Overlay           alpha      none    scene         always   no
//! ```

use super::targets::DEPTH_FORMAT;

/// One pipeline-producing stage of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawStage {
    Geometry,
    PointLight,
    DirectionalLight,
    Combine,
    Skybox,
    Particles,
    Overlay,
}

/// Which depth buffer a stage attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthTarget {
    /// Written by geometry; tested by combine, skybox and particles.
    Scene,
    /// Separate buffer the lighting volumes test against.
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    pub target: DepthTarget,
    pub compare: wgpu::CompareFunction,
    pub write: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineState {
    pub blend: Option<wgpu::BlendState>,
    pub cull_mode: Option<wgpu::Face>,
    pub depth: Option<DepthState>,
}

/// Source and destination summed with weight one.
pub const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

impl DrawStage {
    pub const ALL: [DrawStage; 7] = [
        DrawStage::Geometry,
        DrawStage::PointLight,
        DrawStage::DirectionalLight,
        DrawStage::Combine,
        DrawStage::Skybox,
        DrawStage::Particles,
        DrawStage::Overlay,
    ];

    pub fn state(self) -> PipelineState {
        use wgpu::CompareFunction as Cmp;

        let depth = |target, compare, write| {
            Some(DepthState {
                target,
                compare,
                write,
            })
        };

        match self {
            DrawStage::Geometry => PipelineState {
                blend: None,
                cull_mode: Some(wgpu::Face::Back),
                depth: depth(DepthTarget::Scene, Cmp::Less, true),
            },
            DrawStage::PointLight => PipelineState {
                blend: Some(ADDITIVE),
                cull_mode: Some(wgpu::Face::Front),
                depth: depth(DepthTarget::Light, Cmp::LessEqual, false),
            },
            DrawStage::DirectionalLight => PipelineState {
                blend: Some(ADDITIVE),
                cull_mode: None,
                depth: depth(DepthTarget::Light, Cmp::LessEqual, false),
            },
            DrawStage::Combine => PipelineState {
                blend: None,
                cull_mode: None,
                depth: depth(DepthTarget::Scene, Cmp::Always, false),
            },
            DrawStage::Skybox => PipelineState {
                blend: None,
                cull_mode: Some(wgpu::Face::Front),
                depth: depth(DepthTarget::Scene, Cmp::LessEqual, false),
            },
            DrawStage::Particles => PipelineState {
                blend: Some(ADDITIVE),
                cull_mode: None,
                depth: depth(DepthTarget::Scene, Cmp::Less, false),
            },
            // Shares the back-buffer pass with combine, so it must accept
            // the scene depth attachment even though it ignores it.
            DrawStage::Overlay => PipelineState {
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                cull_mode: None,
                depth: depth(DepthTarget::Scene, Cmp::Always, false),
            },
        }
    }
}

impl PipelineState {
    pub fn primitive(&self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: self.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        }
    }

    pub fn depth_stencil(&self) -> Option<wgpu::DepthStencilState> {
        self.depth.map(|d| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: d.write,
            depth_compare: d.compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        })
    }

    pub fn color_target(&self, format: wgpu::TextureFormat) -> Option<wgpu::ColorTargetState> {
        Some(wgpu::ColorTargetState {
            format,
            blend: self.blend,
            write_mask: wgpu::ColorWrites::ALL,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::CompareFunction as Cmp;

    #[test]
    fn geometry_writes_depth_with_back_face_culling() {
        let s = DrawStage::Geometry.state();
        assert_eq!(s.cull_mode, Some(wgpu::Face::Back));
        assert_eq!(s.blend, None);
        let d = s.depth.expect("geometry needs depth");
        assert_eq!((d.target, d.compare, d.write), (DepthTarget::Scene, Cmp::Less, true));
    }

    #[test]
    fn light_stages_accumulate_against_light_depth() {
        for stage in [DrawStage::PointLight, DrawStage::DirectionalLight] {
            let s = stage.state();
            assert_eq!(s.blend, Some(ADDITIVE), "{stage:?}");
            let d = s.depth.expect("lighting tests depth");
            assert_eq!(d.target, DepthTarget::Light, "{stage:?}");
            assert_eq!(d.compare, Cmp::LessEqual);
            assert!(!d.write);
        }
        assert_eq!(DrawStage::PointLight.state().cull_mode, Some(wgpu::Face::Front));
    }

    #[test]
    fn skybox_is_front_culled_and_drawn_at_far_plane() {
        let s = DrawStage::Skybox.state();
        assert_eq!(s.cull_mode, Some(wgpu::Face::Front));
        let d = s.depth.expect("skybox tests scene depth");
        assert_eq!((d.target, d.compare, d.write), (DepthTarget::Scene, Cmp::LessEqual, false));
    }

    #[test]
    fn particles_are_additive_depth_tested_without_writes() {
        let s = DrawStage::Particles.state();
        assert_eq!(s.blend, Some(ADDITIVE));
        assert_eq!(s.cull_mode, None);
        let d = s.depth.expect("particles test scene depth");
        assert_eq!((d.target, d.compare, d.write), (DepthTarget::Scene, Cmp::Less, false));
    }

    #[test]
    fn combine_ignores_depth() {
        let d = DrawStage::Combine.state().depth.expect("combine attaches scene depth");
        assert_eq!((d.compare, d.write), (Cmp::Always, false));
    }

    #[test]
    fn only_geometry_writes_depth() {
        for stage in DrawStage::ALL {
            let writes = stage.state().depth.is_some_and(|d| d.write);
            assert_eq!(writes, stage == DrawStage::Geometry, "{stage:?}");
        }
    }

    #[test]
    fn overlay_ignores_depth() {
        let s = DrawStage::Overlay.state();
        let d = s.depth.expect("overlay shares the scene depth attachment");
        assert_eq!((d.compare, d.write), (Cmp::Always, false));
        assert_eq!(s.blend, Some(wgpu::BlendState::ALPHA_BLENDING));
    }

    #[test]
    fn back_buffer_stages_share_one_depth_target() {
        for stage in [DrawStage::Combine, DrawStage::Skybox, DrawStage::Particles, DrawStage::Overlay] {
            let d = stage.state().depth.expect("back-buffer stages attach depth");
            assert_eq!(d.target, DepthTarget::Scene, "{stage:?}");
        }
    }
}
