//! # Scene — What Gets Simulated and Drawn
//!
//! Built once from [`SceneConfig`](crate::config::SceneConfig) and owned by
//! the app. Entities are plain structs in a `Vec`; there are no components
//! or hierarchy.
//!
//! Per frame [`Scene::update`] advances, in order: the camera, entity spin,
//! light orbits (and their icons), then every emitter.
//!
//! Turning config paths into GPU handles goes through [`SceneAssets`], so a
//! scene can be built in tests without a device.

use glam::Vec3;

use crate::camera::Camera;
use crate::config::{KilnConfig, Orbit, DEFAULT_MATERIAL};
use crate::icons::IconBatch;
use crate::input::CameraInput;
use crate::light::Light;
use crate::material::{Material, MaterialDesc};
use crate::math::Transform;
use crate::particles::Emitter;
use crate::render::frame::FrameContents;
use crate::render::mesh::{MeshHandle, MeshSource};
use crate::render::texture::TextureHandle;

/// Resolves config references to loaded resources.
pub trait SceneAssets {
    fn mesh(&mut self, source: &MeshSource) -> MeshHandle;
    fn material(&mut self, desc: &MaterialDesc) -> Material;
    /// Load an sRGB image, or return `fallback` when `path` is `None` or
    /// fails to load.
    fn texture(&mut self, path: Option<&str>, fallback: TextureHandle) -> TextureHandle;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub transform: Transform,
    pub mesh: MeshHandle,
    /// Index into [`Scene::materials`].
    pub material: usize,
    base_rotation: Vec3,
    spin: Vec3,
}

impl Entity {
    pub fn new(transform: Transform, mesh: MeshHandle, material: usize) -> Self {
        Self {
            transform,
            mesh,
            material,
            base_rotation: transform.rotation,
            spin: Vec3::ZERO,
        }
    }

    pub fn with_spin(mut self, spin: Vec3) -> Self {
        self.spin = spin;
        self
    }

    fn animate(&mut self, elapsed: f32) {
        if self.spin != Vec3::ZERO {
            self.transform.rotation = self.base_rotation + self.spin * elapsed;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLight {
    pub light: Light,
    pub orbit: Option<Orbit>,
    /// Slot in the icon batch, if the light has one.
    pub icon: Option<usize>,
}

pub struct Scene {
    pub camera: Camera,
    pub materials: Vec<Material>,
    pub entities: Vec<Entity>,
    pub lights: Vec<SceneLight>,
    pub emitters: Vec<Emitter>,
    pub icons: IconBatch,
    elapsed: f32,
}

impl Scene {
    pub fn build(config: &KilnConfig, aspect: f32, assets: &mut impl SceneAssets) -> Self {
        let scene = &config.scene;

        // Sorted by name, so the default material's index is stable.
        let names: Vec<&String> = scene.materials.keys().collect();
        let mut materials: Vec<Material> = scene.materials.values().map(|desc| assets.material(desc)).collect();
        let fallback = match names.iter().position(|n| *n == DEFAULT_MATERIAL) {
            Some(i) => i,
            None => {
                materials.push(assets.material(&MaterialDesc::default()));
                materials.len() - 1
            }
        };

        let entities = scene
            .entities
            .iter()
            .map(|desc| {
                let material = names.iter().position(|n| **n == desc.material).unwrap_or_else(|| {
                    log::warn!("Unknown material '{}', using '{DEFAULT_MATERIAL}'", desc.material);
                    fallback
                });
                Entity::new(desc.transform, assets.mesh(&desc.mesh), material).with_spin(desc.spin)
            })
            .collect();

        let icon_texture = assets.texture(config.render.icon_texture.as_deref(), TextureHandle::PARTICLE);
        let mut icons = IconBatch::new(config.render.icon_capacity, icon_texture);

        let mut lights = Vec::with_capacity(scene.point_lights.len() + scene.directional_lights.len());
        for desc in &scene.point_lights {
            let mut light = desc.light;
            if let Some(orbit) = desc.orbit {
                light.position = orbit.position(0.0);
            }
            let icon = icons.register_light(light.position, light.diffuse);
            if icon.is_none() {
                log::warn!("Icon batch full ({}), point light drawn without icon", icons.capacity());
            }
            lights.push(SceneLight {
                light: Light::Point(light),
                orbit: desc.orbit,
                icon,
            });
        }
        lights.extend(scene.directional_lights.iter().map(|l| SceneLight {
            light: Light::Directional(*l),
            orbit: None,
            icon: None,
        }));

        let emitters = scene
            .emitters
            .iter()
            .map(|cfg| {
                let mut emitter = Emitter::new(cfg.clone());
                emitter.set_texture(assets.texture(cfg.texture.as_deref(), TextureHandle::PARTICLE));
                emitter
            })
            .collect();

        log::info!(
            "Scene ready: {} entities, {} lights, {} emitters, {} materials",
            scene.entities.len(),
            lights.len(),
            scene.emitters.len(),
            materials.len()
        );

        Self {
            camera: Camera::new(config.camera.clone(), aspect),
            materials,
            entities,
            lights,
            emitters,
            icons,
            elapsed: 0.0,
        }
    }

    /// Advance one frame. Negative or non-finite `dt` counts as zero.
    pub fn update(&mut self, dt: f32, input: &CameraInput) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;

        self.camera.update(dt, input);

        for entity in &mut self.entities {
            entity.animate(self.elapsed);
        }

        for scene_light in &mut self.lights {
            let (Some(orbit), Light::Point(point)) = (scene_light.orbit, &mut scene_light.light) else {
                continue;
            };
            point.position = orbit.position(self.elapsed);
            if let Some(icon) = scene_light.icon {
                self.icons.set_position(icon, point.position);
            }
        }

        for emitter in &mut self.emitters {
            emitter.update(dt);
        }
    }

    /// Restart every emitter's emission window.
    pub fn reset_emitters(&mut self) {
        for emitter in &mut self.emitters {
            emitter.reset();
        }
        log::info!("Emitters reset");
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn living_particles(&self) -> usize {
        self.emitters.iter().map(Emitter::living).sum()
    }

    pub fn contents(&self, overlay_enabled: bool) -> FrameContents {
        FrameContents {
            entities: self.entities.len(),
            lights: self.lights.len(),
            living_particles: self.living_particles(),
            icons: self.icons.len(),
            overlay_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointLightDesc;
    use crate::light::PointLight;

    /// Hands out sequential handles and records what was asked for.
    #[derive(Default)]
    struct FakeAssets {
        meshes: Vec<MeshSource>,
        materials: Vec<MaterialDesc>,
        textures: Vec<Option<String>>,
    }

    impl SceneAssets for FakeAssets {
        fn mesh(&mut self, source: &MeshSource) -> MeshHandle {
            self.meshes.push(source.clone());
            source.builtin().unwrap_or(MeshHandle::CUBE)
        }

        fn material(&mut self, desc: &MaterialDesc) -> Material {
            self.materials.push(desc.clone());
            Material {
                albedo: TextureHandle::CHECKER,
                normal: TextureHandle::FLAT_NORMAL,
                tint: desc.tint,
                uv_scale: desc.uv_scale,
            }
        }

        fn texture(&mut self, path: Option<&str>, fallback: TextureHandle) -> TextureHandle {
            self.textures.push(path.map(str::to_string));
            fallback
        }
    }

    fn demo() -> (Scene, FakeAssets) {
        let mut assets = FakeAssets::default();
        let scene = Scene::build(&KilnConfig::default(), 16.0 / 9.0, &mut assets);
        (scene, assets)
    }

    #[test]
    fn demo_builds_every_configured_object() {
        let (scene, assets) = demo();
        assert_eq!(scene.entities.len(), 4);
        assert_eq!(scene.lights.len(), 3);
        assert_eq!(scene.emitters.len(), 1);
        assert_eq!(scene.icons.len(), 2, "one icon per point light");
        assert_eq!(assets.meshes.len(), 4);
        assert_eq!(assets.materials.len(), 2);
        assert_eq!(scene.entities[2].mesh, MeshHandle::SPHERE);
    }

    #[test]
    fn entities_resolve_material_names() {
        let (scene, _) = demo();
        let floor = &scene.materials[scene.entities[0].material];
        assert_eq!(floor.uv_scale.x, 25.0);
        let stone = &scene.materials[scene.entities[1].material];
        assert_eq!(stone.uv_scale.x, 1.0);
    }

    #[test]
    fn unknown_material_falls_back_to_default() {
        let mut config = KilnConfig::default();
        config.scene.entities[1].material = "missing".into();
        let scene = Scene::build(&config, 1.0, &mut FakeAssets::default());
        assert_eq!(scene.entities[1].material, scene.entities[2].material);
    }

    #[test]
    fn missing_default_material_is_synthesized() {
        let mut config = KilnConfig::default();
        config.scene.materials.clear();
        let mut assets = FakeAssets::default();
        let scene = Scene::build(&config, 1.0, &mut assets);
        assert_eq!(scene.materials.len(), 1);
        assert!(scene.entities.iter().all(|e| e.material == 0));
    }

    #[test]
    fn spinning_entities_rotate_with_elapsed_time() {
        let (mut scene, _) = demo();
        for _ in 0..10 {
            scene.update(0.1, &CameraInput::default());
        }
        let yaw = scene.entities[1].transform.rotation.y;
        assert!((yaw - 0.5).abs() < 1e-5, "t/2 after one second, got {yaw}");
        assert_eq!(scene.entities[0].transform.rotation, Vec3::ZERO);
        assert_eq!(scene.entities[3].transform.rotation, Vec3::ZERO);
    }

    #[test]
    fn orbiting_light_drags_its_icon() {
        let (mut scene, _) = demo();
        scene.update(1.0, &CameraInput::default());
        let Light::Point(orbiting) = scene.lights[1].light else {
            panic!("second light is a point light");
        };
        let expected = Vec3::new(1.0f32.sin() * 5.0, 1.0, 1.0f32.cos() * 5.0);
        assert!((orbiting.position - expected).length() < 1e-5);
        let icon = scene.lights[1].icon.expect("point lights get icons");
        assert_eq!(scene.icons.icons()[icon].position, orbiting.position);

        let Light::Point(fixed) = scene.lights[0].light else {
            panic!("first light is a point light");
        };
        assert_eq!(fixed.position, Vec3::new(-1.0, 0.0, -1.0));
    }

    #[test]
    fn icon_overflow_keeps_the_light() {
        let mut config = KilnConfig::default();
        config.render.icon_capacity = 1;
        let scene = Scene::build(&config, 1.0, &mut FakeAssets::default());
        assert_eq!(scene.icons.len(), 1);
        assert!(scene.lights[1].icon.is_none());
        assert_eq!(scene.lights.len(), 3);
    }

    #[test]
    fn emitters_advance_with_the_scene() {
        let (mut scene, _) = demo();
        assert_eq!(scene.living_particles(), 0);
        scene.update(0.52, &CameraInput::default());
        // 20 bursts/s of 5: ten whole bursts fit in 0.52 s.
        assert_eq!(scene.living_particles(), 50);
        let contents = scene.contents(true);
        assert_eq!(contents.living_particles, 50);
        assert_eq!(contents.lights, 3);
        assert_eq!(contents.icons, 2);
    }

    #[test]
    fn reset_reopens_finished_emitters() {
        let mut config = KilnConfig::default();
        config.scene.emitters[0].emit_time = Some(0.1);
        let mut scene = Scene::build(&config, 1.0, &mut FakeAssets::default());
        scene.update(0.05, &CameraInput::default());
        assert_eq!(scene.living_particles(), 5);
        scene.update(0.1, &CameraInput::default());
        assert_eq!(scene.living_particles(), 5, "window closed");

        scene.reset_emitters();
        scene.update(0.05, &CameraInput::default());
        assert_eq!(scene.living_particles(), 10, "in-flight particles survive the reset");
    }

    #[test]
    fn bad_dt_does_not_move_time() {
        let (mut scene, _) = demo();
        scene.update(f32::NAN, &CameraInput::default());
        scene.update(-1.0, &CameraInput::default());
        assert_eq!(scene.elapsed(), 0.0);
        assert_eq!(scene.living_particles(), 0);
    }

    #[test]
    fn configured_point_light_without_orbit_stays_put() {
        let mut config = KilnConfig::default();
        config.scene.point_lights = vec![PointLightDesc {
            light: PointLight {
                position: Vec3::new(2.0, 3.0, 4.0),
                ..Default::default()
            },
            orbit: None,
        }];
        let mut scene = Scene::build(&config, 1.0, &mut FakeAssets::default());
        scene.update(3.0, &CameraInput::default());
        assert_eq!(scene.icons.icons()[0].position, Vec3::new(2.0, 3.0, 4.0));
    }
}
