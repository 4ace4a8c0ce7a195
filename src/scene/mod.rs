//! Scene arena: every entity lives in one `Vec`, addressed by a stable
//! [`EntityId`]. The builder only inserts; the frame loop is the only writer
//! afterwards.

mod builder;
pub mod geometry;

pub use builder::SceneBuilder;
pub use geometry::{Geometry, Topology};

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Stable index of an entity inside a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position, XYZ Euler rotation (radians) and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

/// Unlit material. Vertex colors are multiplied by `tint`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub tint: Vec3,
    pub opacity: f32,
    /// World-space point size; only used by point topologies.
    pub point_size: f32,
}

impl Material {
    pub fn opaque() -> Self {
        Self {
            tint: Vec3::ONE,
            opacity: 1.0,
            point_size: 1.0,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// The falling particle field. Drop `i` falls at `0.5 + (i % 5) * 0.2`
/// units per second and wraps to `ceiling` once it drops below `floor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainField {
    pub floor: f32,
    pub ceiling: f32,
    /// Spin of the whole field around +Y, radians per second.
    pub spin: f32,
}

impl RainField {
    pub fn fall_rate(index: usize) -> f32 {
        0.5 + (index % 5) as f32 * 0.2
    }
}

/// Per-frame animation an entity takes part in. Indices are the entity's
/// position inside its cluster and seed its phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    Static,
    Rain(RainField),
    /// Tower cubes: spin about Y and drift sideways.
    TowerDrift { index: u32 },
    /// Gallery shapes: tumble about X and Y.
    GalleryTumble { index: u32 },
    /// Media planes: spin about Z and flicker.
    MediaGlitch { index: u32 },
    /// Beacon: uniform scale pulse.
    Pulse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub label: &'static str,
    pub geometry: Geometry,
    pub transform: Transform,
    pub material: Material,
    pub motion: Motion,
}

impl Entity {
    pub fn new(label: &'static str, geometry: Geometry) -> Self {
        Self {
            label,
            geometry,
            transform: Transform::default(),
            material: Material::opaque(),
            motion: Motion::Static,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    entities: Vec<Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(entity);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i as u32), e))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut Entity)> {
        self.entities
            .iter_mut()
            .enumerate()
            .map(|(i, e)| (EntityId(i as u32), e))
    }

    /// First entity carrying `label`.
    pub fn find(&self, label: &str) -> Option<EntityId> {
        self.iter().find(|(_, e)| e.label == label).map(|(id, _)| id)
    }

    /// Drops every entity. Ids handed out earlier become dangling.
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_insertion_indices() {
        let mut scene = Scene::new();
        let a = scene.insert(Entity::new("a", Geometry::lines(vec![], Vec3::ONE)));
        let b = scene.insert(Entity::new("b", Geometry::lines(vec![], Vec3::ONE)));
        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(scene.get(b).map(|e| e.label), Some("b"));
        assert_eq!(scene.find("a"), Some(a));
        if let Some(entity) = scene.get_mut(a) {
            entity.transform.position = Vec3::Y;
        }
        assert_eq!(scene.get(a).map(|e| e.transform.position), Some(Vec3::Y));
        assert_eq!(scene.get(b).map(|e| e.transform.position), Some(Vec3::ZERO));
        scene.clear();
        assert!(scene.get(a).is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn identity_transform_is_identity_matrix() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
        let moved = Transform::at(Vec3::new(1.0, 2.0, 3.0)).matrix();
        assert_eq!(moved.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn fall_rates_cycle_every_five_drops() {
        assert_eq!(RainField::fall_rate(0), 0.5);
        assert!((RainField::fall_rate(4) - 1.3).abs() < 1e-6);
        assert_eq!(RainField::fall_rate(5), RainField::fall_rate(0));
    }
}
