//! # Config — The Scene File
//!
//! Everything the demo needs is described by one JSON document:
//!
//! ```text
//! KilnConfig
//!   ├─ window       title, size, vsync
//!   ├─ logging      filter, color
//!   ├─ camera       start position, fov, planes, speed, sensitivity
//!   ├─ render       skybox, icon overlay, shader hot reload
//!   ├─ diagnostics  UDP feed address and rate
//!   └─ scene        materials, entities, lights, emitters
//! ```
//!
//! Every section is `#[serde(default)]`, so a file only needs the fields it
//! changes and an empty `{}` is the full demo scene. Unknown material names
//! are not a parse error; [`KilnConfig::problems`] reports them and the scene
//! falls back to the default material.

use std::collections::BTreeMap;
use std::path::Path;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::camera::CameraConfig;
use crate::error::{KilnError, Result};
use crate::light::{DirectionalLight, PointLight};
use crate::logging::LoggingConfig;
use crate::material::MaterialDesc;
use crate::math::Transform;
use crate::particles::EmitterConfig;
use crate::render::mesh::MeshSource;
use crate::render::texture::SkyGradient;

/// Material used when an entity names one that doesn't exist.
pub const DEFAULT_MATERIAL: &str = "stone";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    pub window: WindowConfig,
    pub logging: LoggingConfig,
    pub camera: CameraConfig,
    pub render: RenderConfig,
    pub diagnostics: DiagnosticsConfig,
    pub scene: SceneConfig,
}

impl KilnConfig {
    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| KilnError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Parse config text. `origin` only labels errors.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| KilnError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, otherwise the built-in demo.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Values that parse but can't be used as written. Each is handled at
    /// setup with a fallback; the list is for logging.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.window.width == 0 || self.window.height == 0 {
            problems.push(format!(
                "window size {}x{} is empty",
                self.window.width, self.window.height
            ));
        }

        for (i, entity) in self.scene.entities.iter().enumerate() {
            if !self.scene.materials.contains_key(&entity.material) {
                problems.push(format!(
                    "entity {i} uses unknown material '{}', falling back to '{DEFAULT_MATERIAL}'",
                    entity.material
                ));
            }
        }

        for (i, emitter) in self.scene.emitters.iter().enumerate() {
            if emitter.bursts_per_second <= 0.0 {
                problems.push(format!("emitter {i} has a non-positive burst rate and will not emit"));
            }
            if emitter.max_particles == 0 {
                problems.push(format!("emitter {i} has no capacity"));
            }
            if let Some(window) = emitter.emit_time
                && window < 0.0
            {
                problems.push(format!("emitter {i} has a negative emit_time ({window}) and will not emit"));
            }
        }

        for (i, light) in self.scene.point_lights.iter().enumerate() {
            if light.light.range <= 0.0 {
                problems.push(format!("point light {i} has a non-positive range and lights nothing"));
            }
        }

        problems
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "kiln".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Draw light icons on top of the frame.
    pub show_icons: bool,
    pub icon_capacity: usize,
    /// Icon image. Missing → soft procedural dot.
    pub icon_texture: Option<String>,
    /// Watch the WGSL sources on disk and rebuild pipelines when they change.
    pub hot_reload_shaders: bool,
    pub skybox: SkyboxConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_icons: true,
            icon_capacity: 32,
            icon_texture: None,
            hot_reload_shaders: true,
            skybox: SkyboxConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyboxConfig {
    /// Face images in +X, -X, +Y, -Y, +Z, -Z order. Missing → gradient.
    pub faces: Option<[String; 6]>,
    /// Edge length of each generated gradient face.
    pub size: u32,
    pub gradient: SkyGradient,
}

impl Default for SkyboxConfig {
    fn default() -> Self {
        Self {
            faces: None,
            size: 64,
            gradient: SkyGradient::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub address: String,
    /// Snapshots per second.
    pub rate_hz: f32,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "127.0.0.1:9100".to_string(),
            rate_hz: 10.0,
        }
    }
}

/// One drawable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityDesc {
    pub mesh: MeshSource,
    pub material: String,
    pub transform: Transform,
    /// Radians per second added to each Euler angle, measured from the
    /// configured rotation.
    pub spin: Vec3,
}

impl Default for EntityDesc {
    fn default() -> Self {
        Self {
            mesh: MeshSource::Cube,
            material: DEFAULT_MATERIAL.to_string(),
            transform: Transform::IDENTITY,
            spin: Vec3::ZERO,
        }
    }
}

/// Circular path in the XZ plane around the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Orbit {
    pub radius: f32,
    pub height: f32,
    /// Radians per second.
    pub speed: f32,
}

impl Default for Orbit {
    fn default() -> Self {
        Self {
            radius: 5.0,
            height: 1.0,
            speed: 1.0,
        }
    }
}

impl Orbit {
    /// Position after `elapsed` seconds.
    pub fn position(&self, elapsed: f32) -> Vec3 {
        let angle = elapsed * self.speed;
        Vec3::new(angle.sin() * self.radius, self.height, angle.cos() * self.radius)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLightDesc {
    #[serde(flatten)]
    pub light: PointLight,
    /// When set, the configured position is replaced by the orbit.
    pub orbit: Option<Orbit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub materials: BTreeMap<String, MaterialDesc>,
    pub entities: Vec<EntityDesc>,
    pub point_lights: Vec<PointLightDesc>,
    pub directional_lights: Vec<DirectionalLight>,
    pub emitters: Vec<EmitterConfig>,
}

impl Default for SceneConfig {
    /// Floor slab, two spinning shapes, a far cube, two point lights (one
    /// orbiting), a directional light and the fountain emitter.
    fn default() -> Self {
        let stone = MaterialDesc {
            albedo: Some("builtin:checker".to_string()),
            normal_map: None,
            tint: Vec4::new(0.75, 0.72, 0.68, 1.0),
            uv_scale: Vec2::ONE,
        };
        let floor = MaterialDesc {
            uv_scale: Vec2::new(25.0, 25.0),
            ..stone.clone()
        };

        let entity = |mesh, material: &str, transform, spin| EntityDesc {
            mesh,
            material: material.to_string(),
            transform,
            spin,
        };
        let half_turn = Vec3::new(0.0, 0.5, 0.0);

        Self {
            materials: BTreeMap::from([(DEFAULT_MATERIAL.to_string(), stone), ("floor".to_string(), floor)]),
            entities: vec![
                entity(
                    MeshSource::Cube,
                    "floor",
                    Transform::from_xyz(0.0, -1.0, 0.0).with_scale(Vec3::new(25.0, 1.0, 25.0)),
                    Vec3::ZERO,
                ),
                entity(MeshSource::Cube, DEFAULT_MATERIAL, Transform::IDENTITY, half_turn),
                entity(MeshSource::Sphere, DEFAULT_MATERIAL, Transform::from_xyz(-3.0, 0.0, 0.0), half_turn),
                entity(MeshSource::Cube, DEFAULT_MATERIAL, Transform::from_xyz(0.0, 0.0, 10.0), Vec3::ZERO),
            ],
            point_lights: vec![
                PointLightDesc {
                    light: PointLight {
                        ambient: Vec3::splat(0.1),
                        diffuse: Vec3::new(0.4, 0.4, 1.0),
                        position: Vec3::new(-1.0, 0.0, -1.0),
                        range: 10.0,
                    },
                    orbit: None,
                },
                PointLightDesc {
                    light: PointLight {
                        ambient: Vec3::splat(0.1),
                        diffuse: Vec3::new(1.0, 0.2, 0.2),
                        position: Vec3::new(0.0, 1.0, 5.0),
                        range: 7.0,
                    },
                    orbit: Some(Orbit::default()),
                },
            ],
            directional_lights: vec![DirectionalLight {
                ambient: Vec3::splat(0.1),
                diffuse: Vec3::new(0.5, 0.8, 0.9),
                direction: Vec3::new(1.0, -1.0, 1.0),
            }],
            emitters: vec![EmitterConfig::default()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> KilnConfig {
        KilnConfig::from_json(text, Path::new("test.json")).expect("valid config")
    }

    #[test]
    fn empty_document_is_the_demo() {
        let config = parse("{}");
        assert_eq!(config, KilnConfig::default());
        assert_eq!(config.scene.entities.len(), 4);
        assert_eq!(config.scene.point_lights.len(), 2);
        assert_eq!(config.scene.directional_lights.len(), 1);
        assert_eq!(config.scene.emitters.len(), 1);
        assert!(config.problems().is_empty(), "{:?}", config.problems());
    }

    #[test]
    fn demo_scene_matches_the_layout() {
        let scene = SceneConfig::default();
        let floor = &scene.entities[0];
        assert_eq!(floor.transform.position, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(floor.transform.scale, Vec3::new(25.0, 1.0, 25.0));
        assert_eq!(scene.materials["floor"].uv_scale, Vec2::splat(25.0));

        let spinning: Vec<usize> = scene
            .entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.spin != Vec3::ZERO)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(spinning, vec![1, 2]);
        assert_eq!(scene.entities[2].mesh, MeshSource::Sphere);

        assert_eq!(scene.point_lights[0].light.range, 10.0);
        assert_eq!(scene.point_lights[1].light.range, 7.0);
        assert!(scene.point_lights[1].orbit.is_some());
        assert_eq!(scene.emitters[0].max_particles, 1000);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse(r#"{ "window": { "width": 640 }, "camera": { "move_speed": 4.0 } }"#);
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.window.title, "kiln");
        assert_eq!(config.camera.move_speed, 4.0);
        assert_eq!(config.camera.near, CameraConfig::default().near);
        assert_eq!(config.scene, SceneConfig::default());
    }

    #[test]
    fn scene_lists_replace_the_demo_lists() {
        let config = parse(
            r#"{
                "scene": {
                    "entities": [
                        { "mesh": "torus", "transform": { "position": [0.0, 2.0, 0.0] } },
                        { "mesh": { "gltf": "assets/helix.glb" }, "material": "floor" }
                    ],
                    "point_lights": [
                        { "diffuse": [1.0, 1.0, 0.0], "range": 3.0, "orbit": { "radius": 2.0 } }
                    ],
                    "emitters": []
                }
            }"#,
        );
        let scene = &config.scene;
        assert_eq!(scene.entities.len(), 2);
        assert_eq!(scene.entities[0].mesh, MeshSource::Torus);
        assert_eq!(scene.entities[0].material, DEFAULT_MATERIAL);
        assert_eq!(scene.entities[0].transform.scale, Vec3::ONE);
        assert_eq!(scene.entities[1].mesh, MeshSource::Gltf("assets/helix.glb".into()));

        let light = &scene.point_lights[0];
        assert_eq!(light.light.diffuse, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(light.light.range, 3.0);
        assert_eq!(light.light.ambient, Vec3::ZERO);
        let orbit = light.orbit.expect("orbit parsed");
        assert_eq!(orbit.radius, 2.0);
        assert_eq!(orbit.height, Orbit::default().height);

        assert!(scene.emitters.is_empty());
        assert_eq!(scene.materials, SceneConfig::default().materials);
    }

    #[test]
    fn orbit_starts_on_positive_z() {
        let orbit = Orbit {
            radius: 5.0,
            height: 1.0,
            speed: 1.0,
        };
        assert!((orbit.position(0.0) - Vec3::new(0.0, 1.0, 5.0)).length() < 1e-6);
        let quarter = orbit.position(std::f32::consts::FRAC_PI_2);
        assert!((quarter - Vec3::new(5.0, 1.0, 0.0)).length() < 1e-5, "got {quarter:?}");
    }

    #[test]
    fn problems_name_the_bad_values() {
        let mut config = KilnConfig::default();
        config.scene.entities[3].material = "marble".into();
        config.scene.emitters[0].bursts_per_second = 0.0;
        config.scene.point_lights[0].light.range = -1.0;
        let problems = config.problems();
        assert_eq!(problems.len(), 3, "{problems:?}");
        assert!(problems[0].contains("marble"));
        assert!(problems[1].contains("burst rate"));
        assert!(problems[2].contains("point light 0"));
    }

    #[test]
    fn negative_emit_time_is_reported() {
        let mut config = KilnConfig::default();
        config.scene.emitters[0].emit_time = Some(-2.0);
        let problems = config.problems();
        assert_eq!(problems.len(), 1, "{problems:?}");
        assert!(problems[0].contains("emitter 0") && problems[0].contains("emit_time"));
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let err = KilnConfig::from_json("{ not json", Path::new("broken.json")).unwrap_err();
        assert!(matches!(err, KilnError::ConfigParse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = KilnConfig::load("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, KilnError::ConfigRead { .. }));
    }
}
