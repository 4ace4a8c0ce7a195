//! Builds the neon city once at mount: floor grid, digital rain, sign,
//! cube tower, gallery shapes, media planes and the beacon.

use glam::Vec3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::geometry::{self, Geometry};
use super::{Entity, Material, Motion, RainField, Scene, Transform};
use crate::config::SceneConfig;

/// Rain drops start at least this far above the floor.
const RAIN_START_CLEARANCE: f32 = 20.0;

/// Deterministic scene construction. The same seed always yields the same
/// cube sizes and drop positions.
pub struct SceneBuilder<'a> {
    config: &'a SceneConfig,
    seed: u64,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(config: &'a SceneConfig, seed: u64) -> Self {
        Self { config, seed }
    }

    pub fn build(&self) -> Scene {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut scene = Scene::new();
        self.add_grid(&mut scene);
        self.add_rain(&mut scene, &mut rng);
        self.add_sign(&mut scene);
        self.add_tower(&mut scene, &mut rng);
        self.add_gallery(&mut scene);
        self.add_media_tower(&mut scene);
        self.add_beacon(&mut scene);
        log::debug!("Scene built: {} entities (seed {})", scene.len(), self.seed);
        scene
    }

    fn tint(&self, opacity: f32) -> Material {
        Material {
            opacity,
            ..Material::opaque()
        }
    }

    fn add_grid(&self, scene: &mut Scene) {
        let c = self.config;
        let grid = geometry::grid(c.grid_size, c.grid_divisions, c.palette.cyan, c.palette.pink);
        scene.insert(Entity::new("grid", grid).with_material(self.tint(c.grid_opacity)));
    }

    fn add_rain(&self, scene: &mut Scene, rng: &mut ChaCha8Rng) {
        let c = self.config;
        let positions = (0..c.rain_count)
            .map(|_| {
                Vec3::new(
                    (rng.random::<f32>() - 0.5) * c.rain_spread,
                    c.rain_floor + RAIN_START_CLEARANCE + rng.random::<f32>() * (c.rain_ceiling - c.rain_floor),
                    (rng.random::<f32>() - 0.5) * c.rain_spread,
                )
            })
            .collect();
        let material = Material {
            tint: Vec3::ONE,
            opacity: c.rain_opacity,
            point_size: c.particle_size,
        };
        let field = RainField {
            floor: c.rain_floor,
            ceiling: c.rain_ceiling,
            spin: 0.02,
        };
        scene.insert(
            Entity::new("rain", Geometry::points(positions, c.palette.white))
                .with_material(material)
                .with_motion(Motion::Rain(field)),
        );
    }

    fn add_sign(&self, scene: &mut Scene) {
        let sign = Geometry::lines(geometry::box_wireframe(20.0, 6.0, 0.5), self.config.palette.white);
        scene.insert(Entity::new("sign", sign).with_transform(Transform::at(Vec3::new(0.0, 50.0, 0.0))));
    }

    fn add_tower(&self, scene: &mut Scene, rng: &mut ChaCha8Rng) {
        let palette = &self.config.palette;
        for i in 0..self.config.tower_cubes {
            let size = 3.0 + rng.random::<f32>() * 4.0;
            let color = if i % 2 == 1 { palette.cyan } else { palette.pink };
            let f = i as f32;
            let position = Vec3::new(
                20.0 + (f * 0.3).sin() * 3.0,
                f * 1.5,
                -60.0 + (f * 0.2).cos() * 3.0,
            );
            scene.insert(
                Entity::new("tower-cube", Geometry::lines(geometry::box_edges(size, size, size), color))
                    .with_transform(Transform::at(position))
                    .with_motion(Motion::TowerDrift { index: i }),
            );
        }
    }

    fn add_gallery(&self, scene: &mut Scene) {
        let palette = &self.config.palette;
        let ico = Geometry::lines(geometry::icosahedron_edges(6.0), palette.white);
        scene.insert(
            Entity::new("gallery-ico", ico)
                .with_transform(Transform::at(Vec3::new(-20.0, 10.0, -30.0)))
                .with_motion(Motion::GalleryTumble { index: 0 }),
        );
        let knot = Geometry::lines(geometry::torus_knot_wireframe(4.0, 1.2, 120, 16), palette.cyan);
        scene.insert(
            Entity::new("gallery-knot", knot)
                .with_transform(Transform::at(Vec3::new(-28.0, 8.0, -20.0)))
                .with_motion(Motion::GalleryTumble { index: 1 }),
        );
    }

    fn add_media_tower(&self, scene: &mut Scene) {
        let palette = &self.config.palette;
        for i in 0..self.config.media_planes {
            let f = i as f32;
            let plane = geometry::plane_wireframe(8.0 + f.sin() * 2.0, 4.0 + f.cos() * 1.2);
            let color = if i % 2 == 1 { palette.cyan } else { palette.pink };
            let transform = Transform {
                position: Vec3::new((f * 0.5).sin() * 4.0, f * 1.5 + 8.0, 20.0 + (f * 0.5).cos() * 4.0),
                rotation: Vec3::new(0.0, f * 0.3, 0.0),
                ..Default::default()
            };
            scene.insert(
                Entity::new("media-plane", Geometry::lines(plane, color))
                    .with_transform(transform)
                    .with_material(self.tint(0.9))
                    .with_motion(Motion::MediaGlitch { index: i }),
            );
        }
    }

    fn add_beacon(&self, scene: &mut Scene) {
        let beacon = Geometry::lines(geometry::sphere_wireframe(2.0, 16, 16), self.config.palette.cyan);
        scene.insert(
            Entity::new("beacon", beacon)
                .with_transform(Transform::at(Vec3::new(0.0, 2.0, 0.0)))
                .with_motion(Motion::Pulse),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Topology;

    fn build(seed: u64) -> Scene {
        SceneBuilder::new(&SceneConfig::default(), seed).build()
    }

    #[test]
    fn builds_every_entity_once() {
        let scene = build(7);
        let count = |label: &str| scene.iter().filter(|(_, e)| e.label == label).count();
        assert_eq!(count("grid"), 1);
        assert_eq!(count("rain"), 1);
        assert_eq!(count("sign"), 1);
        assert_eq!(count("tower-cube"), 40);
        assert_eq!(count("gallery-ico"), 1);
        assert_eq!(count("gallery-knot"), 1);
        assert_eq!(count("media-plane"), 12);
        assert_eq!(count("beacon"), 1);
        assert_eq!(scene.len(), 58);
    }

    #[test]
    fn same_seed_same_scene() {
        assert_eq!(build(42), build(42));
        assert_ne!(build(42), build(43));
    }

    #[test]
    fn rain_starts_above_the_floor() {
        let scene = build(3);
        let rain = scene.get(scene.find("rain").unwrap()).unwrap();
        assert_eq!(rain.geometry.topology, Topology::Points);
        assert_eq!(rain.geometry.vertex_count(), 3000);
        assert!(rain
            .geometry
            .positions
            .iter()
            .all(|p| p.y >= 20.0 && p.y <= 220.0 && p.x.abs() <= 200.0 && p.z.abs() <= 200.0));
    }

    #[test]
    fn tower_cube_sizes_stay_in_range() {
        let scene = build(11);
        for (_, cube) in scene.iter().filter(|(_, e)| e.label == "tower-cube") {
            let (lo, hi) = cube.geometry.bounds().unwrap();
            let edge = hi.x - lo.x;
            assert!((3.0..=7.0).contains(&edge), "cube edge {edge}");
        }
    }
}
