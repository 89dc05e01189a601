//! # Frame — Pass Ordering
//!
//! The deferred frame is a fixed sequence of passes. Which optional passes
//! run depends only on what the scene contains, so the sequence is computed
//! up front by [`plan`] and then replayed against a [`FrameBackend`]:
//!
//! ```text
//! Clear ─► Geometry ─► Reset ─► [Lighting ─► Reset] ─► Combine ─► Skybox
//!                                                         │
//!            Present ◄─ [Overlay] ◄─ [Particles] ◄────────┘
//! ```
//!
//! `Reset` ends the current render pass. In wgpu attachments and bind groups
//! only live as long as their `RenderPass`, so closing it is what frees the
//! geometry targets to be bound as textures by the next pass.
//!
//! Bracketed passes are skipped, with their reset, when they have nothing to
//! draw. Skybox always runs after Combine (it fills the pixels Combine left
//! at the far plane) and before Particles (which blend over the sky).
//!
//! The production backend is the wgpu
//! [`DeferredRenderer`](super::deferred::DeferredRenderer); tests use a
//! recording backend.

use std::fmt;

/// One step of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Clear,
    Geometry,
    ResetBindings,
    Lighting,
    Combine,
    Skybox,
    Particles,
    Overlay,
    Present,
}

impl Pass {
    pub fn name(self) -> &'static str {
        match self {
            Pass::Clear => "clear",
            Pass::Geometry => "geometry",
            Pass::ResetBindings => "reset",
            Pass::Lighting => "lighting",
            Pass::Combine => "combine",
            Pass::Skybox => "skybox",
            Pass::Particles => "particles",
            Pass::Overlay => "overlay",
            Pass::Present => "present",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the scene holds this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameContents {
    pub entities: usize,
    pub lights: usize,
    pub living_particles: usize,
    pub icons: usize,
    pub overlay_enabled: bool,
}

/// Executes individual passes. Returns the number of draw calls issued.
pub trait FrameBackend {
    fn run_pass(&mut self, pass: Pass) -> u32;
}

/// Result of one frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameStats {
    /// Passes in execution order with their draw calls.
    pub passes: Vec<(Pass, u32)>,
    pub living_particles: usize,
    pub lights: usize,
}

impl FrameStats {
    /// Draw calls issued by `pass` (summed if it ran more than once).
    pub fn draw_calls(&self, pass: Pass) -> u32 {
        self.passes.iter().filter(|(p, _)| *p == pass).map(|(_, n)| n).sum()
    }

    pub fn total_draw_calls(&self) -> u32 {
        self.passes.iter().map(|(_, n)| n).sum()
    }

    pub fn ran(&self, pass: Pass) -> bool {
        self.passes.iter().any(|(p, _)| *p == pass)
    }
}

/// The pass sequence for a frame with the given contents.
pub fn plan(contents: &FrameContents) -> Vec<Pass> {
    let mut passes = vec![Pass::Clear, Pass::Geometry, Pass::ResetBindings];
    if contents.lights > 0 {
        passes.extend([Pass::Lighting, Pass::ResetBindings]);
    }
    passes.extend([Pass::Combine, Pass::Skybox]);
    if contents.living_particles > 0 {
        passes.push(Pass::Particles);
    }
    if contents.overlay_enabled && contents.icons > 0 {
        passes.push(Pass::Overlay);
    }
    passes.push(Pass::Present);
    passes
}

/// Run one frame against `backend`.
pub fn run_frame(backend: &mut impl FrameBackend, contents: &FrameContents) -> FrameStats {
    let passes = plan(contents)
        .into_iter()
        .map(|pass| (pass, backend.run_pass(pass)))
        .collect();
    FrameStats {
        passes,
        living_particles: contents.living_particles,
        lights: contents.lights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the passes it is asked to run and pretends each drew
    /// `draws` times.
    #[derive(Default)]
    struct Recorder {
        log: Vec<Pass>,
        draws: u32,
    }

    impl FrameBackend for Recorder {
        fn run_pass(&mut self, pass: Pass) -> u32 {
            self.log.push(pass);
            match pass {
                Pass::Clear | Pass::ResetBindings | Pass::Present => 0,
                _ => self.draws,
            }
        }
    }

    fn full() -> FrameContents {
        FrameContents {
            entities: 4,
            lights: 3,
            living_particles: 120,
            icons: 2,
            overlay_enabled: true,
        }
    }

    fn position(passes: &[Pass], pass: Pass) -> usize {
        passes
            .iter()
            .position(|p| *p == pass)
            .unwrap_or_else(|| panic!("{pass} missing from {passes:?}"))
    }

    #[test]
    fn full_frame_runs_every_pass_in_order() {
        let mut backend = Recorder::default();
        run_frame(&mut backend, &full());
        assert_eq!(
            backend.log,
            vec![
                Pass::Clear,
                Pass::Geometry,
                Pass::ResetBindings,
                Pass::Lighting,
                Pass::ResetBindings,
                Pass::Combine,
                Pass::Skybox,
                Pass::Particles,
                Pass::Overlay,
                Pass::Present,
            ]
        );
    }

    #[test]
    fn skybox_between_combine_and_particles_for_every_content_mix() {
        for lights in [0, 2] {
            for living_particles in [0, 50] {
                for icons in [0, 1] {
                    let contents = FrameContents {
                        lights,
                        living_particles,
                        icons,
                        overlay_enabled: true,
                        ..full()
                    };
                    let passes = plan(&contents);
                    let sky = position(&passes, Pass::Skybox);
                    assert!(position(&passes, Pass::Combine) < sky, "{contents:?}");
                    if living_particles > 0 {
                        assert!(sky < position(&passes, Pass::Particles), "{contents:?}");
                    }
                    assert_eq!(passes.first(), Some(&Pass::Clear));
                    assert_eq!(passes.last(), Some(&Pass::Present));
                }
            }
        }
    }

    #[test]
    fn no_lights_skips_lighting_and_its_reset() {
        let passes = plan(&FrameContents {
            lights: 0,
            ..full()
        });
        assert!(!passes.contains(&Pass::Lighting));
        let resets = passes.iter().filter(|p| **p == Pass::ResetBindings).count();
        assert_eq!(resets, 1, "only the geometry reset remains");
    }

    #[test]
    fn reset_separates_writers_from_readers() {
        let passes = plan(&full());
        let geometry = position(&passes, Pass::Geometry);
        let lighting = position(&passes, Pass::Lighting);
        assert_eq!(passes[geometry + 1], Pass::ResetBindings);
        assert_eq!(passes[lighting + 1], Pass::ResetBindings);
    }

    #[test]
    fn empty_emitters_skip_particles() {
        let passes = plan(&FrameContents {
            living_particles: 0,
            ..full()
        });
        assert!(!passes.contains(&Pass::Particles));
        assert!(passes.contains(&Pass::Skybox));
    }

    #[test]
    fn overlay_needs_icons_and_the_switch() {
        let off = plan(&FrameContents {
            overlay_enabled: false,
            ..full()
        });
        assert!(!off.contains(&Pass::Overlay));
        let empty = plan(&FrameContents {
            icons: 0,
            ..full()
        });
        assert!(!empty.contains(&Pass::Overlay));
    }

    #[test]
    fn empty_scene_still_clears_combines_and_presents() {
        let passes = plan(&FrameContents::default());
        assert_eq!(
            passes,
            vec![
                Pass::Clear,
                Pass::Geometry,
                Pass::ResetBindings,
                Pass::Combine,
                Pass::Skybox,
                Pass::Present,
            ]
        );
    }

    #[test]
    fn stats_sum_draw_calls_per_pass() {
        let mut backend = Recorder {
            draws: 2,
            ..Default::default()
        };
        let stats = run_frame(&mut backend, &full());
        assert_eq!(stats.draw_calls(Pass::Lighting), 2);
        assert_eq!(stats.draw_calls(Pass::ResetBindings), 0);
        // geometry, lighting, combine, skybox, particles, overlay
        assert_eq!(stats.total_draw_calls(), 12);
        assert_eq!(stats.living_particles, 120);
        assert!(stats.ran(Pass::Overlay));
    }
}
