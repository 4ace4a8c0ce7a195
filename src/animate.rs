//! Procedural animation step shared by every entity in the scene.
//!
//! Incremental rates are quoted per reference frame (1/60 s) and scaled by
//! the real tick delta. Oscillations read the loop's own elapsed clock,
//! never wall-clock time, so a remounted stage starts from phase zero.

use crate::scene::{Motion, RainField, Scene};

/// Rate the per-frame constants are expressed against.
pub const REFERENCE_FPS: f32 = 60.0;

/// Timing handed to one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous tick, already clamped.
    pub delta: f32,
    /// Seconds since the loop started.
    pub elapsed: f32,
}

/// Advances every animated entity in place.
pub fn advance(scene: &mut Scene, time: FrameTime) {
    let frames = time.delta * REFERENCE_FPS;
    for (_, entity) in scene.iter_mut() {
        match entity.motion {
            Motion::Static => {}
            Motion::Rain(field) => {
                entity.transform.rotation.y += time.delta * field.spin;
                fall(&mut entity.geometry.positions, field, time.delta);
                entity.geometry.touch();
            }
            Motion::TowerDrift { index } => {
                let i = index as f32;
                entity.transform.rotation.y += (0.005 + i * 0.0005) * frames;
                entity.transform.position.x += (time.elapsed + i).sin() * 0.002 * frames;
            }
            Motion::GalleryTumble { index } => {
                let i = index as f32;
                entity.transform.rotation.x += (0.002 + i * 0.0003) * frames;
                entity.transform.rotation.y += (0.003 + i * 0.0002) * frames;
            }
            Motion::MediaGlitch { index } => {
                let i = index as f32;
                entity.transform.rotation.z += (0.01 + i * 0.001) * frames;
                entity.material.opacity = 0.6 + (time.elapsed * 10.0 + i).sin() * 0.3;
            }
            Motion::Pulse => {
                entity.transform.scale = glam::Vec3::splat(beacon_scale(time.elapsed));
            }
        }
    }
}

/// Drops every particle by its own rate. A drop that crosses the floor is
/// put back at the ceiling within the same step.
pub fn fall(positions: &mut [glam::Vec3], field: RainField, delta: f32) {
    for (i, p) in positions.iter_mut().enumerate() {
        p.y -= delta * RainField::fall_rate(i);
        if p.y < field.floor {
            p.y = field.ceiling;
        }
    }
}

pub fn beacon_scale(elapsed: f32) -> f32 {
    1.0 + (elapsed * 4.0).sin() * 0.2 + 0.2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene::SceneBuilder;
    use glam::Vec3;

    const FIELD: RainField = RainField {
        floor: 0.0,
        ceiling: 200.0,
        spin: 0.02,
    };

    #[test]
    fn drops_fall_then_wrap_to_ceiling() {
        let mut drops = vec![Vec3::new(0.0, 1.0, 0.0)];
        let mut heights = Vec::new();
        for _ in 0..4 {
            fall(&mut drops, FIELD, 0.3);
            heights.push(drops[0].y);
        }
        assert!(heights.windows(2).all(|w| w[1] < w[0]));
        let mut y = 0.1;
        let mut drop = vec![Vec3::new(0.0, y, 0.0)];
        for _ in 0..10 {
            fall(&mut drop, FIELD, 0.1);
            assert!(drop[0].y >= FIELD.floor, "observed below floor: {}", drop[0].y);
            y = drop[0].y;
        }
        assert!(y > 190.0);
    }

    #[test]
    fn faster_lanes_fall_faster() {
        let mut drops = vec![Vec3::new(0.0, 100.0, 0.0); 5];
        fall(&mut drops, FIELD, 1.0);
        assert!(drops.windows(2).all(|w| w[1].y < w[0].y));
        assert!((drops[0].y - 99.5).abs() < 1e-4);
    }

    #[test]
    fn zero_delta_keeps_incremental_state() {
        let mut scene = SceneBuilder::new(&SceneConfig::default(), 1).build();
        let before = scene.clone();
        advance(&mut scene, FrameTime { delta: 0.0, elapsed: 0.0 });
        for ((_, a), (_, b)) in before.iter().zip(scene.iter()) {
            assert_eq!(a.transform.rotation, b.transform.rotation, "{}", a.label);
            assert_eq!(a.transform.position, b.transform.position, "{}", a.label);
            assert_eq!(a.geometry.positions, b.geometry.positions, "{}", a.label);
        }
    }

    #[test]
    fn pulse_and_glitch_follow_elapsed_time() {
        let mut scene = SceneBuilder::new(&SceneConfig::default(), 1).build();
        let elapsed = 0.75;
        advance(&mut scene, FrameTime { delta: 1.0 / 60.0, elapsed });
        let beacon = scene.get(scene.find("beacon").unwrap()).unwrap();
        assert_eq!(beacon.transform.scale, Vec3::splat(beacon_scale(elapsed)));
        let plane = scene.get(scene.find("media-plane").unwrap()).unwrap();
        assert!((plane.material.opacity - (0.6 + (elapsed * 10.0).sin() * 0.3)).abs() < 1e-6);
        assert!((0.3..=0.9).contains(&plane.material.opacity));
    }

    #[test]
    fn one_reference_frame_applies_one_step_of_spin() {
        let mut scene = SceneBuilder::new(&SceneConfig::default(), 1).build();
        let id = scene.find("tower-cube").unwrap();
        advance(&mut scene, FrameTime { delta: 1.0 / REFERENCE_FPS, elapsed: 0.0 });
        let cube = scene.get(id).unwrap();
        assert!((cube.transform.rotation.y - 0.005).abs() < 1e-6);
    }

    #[test]
    fn rain_touches_its_geometry_each_tick() {
        let mut scene = SceneBuilder::new(&SceneConfig::default(), 1).build();
        let id = scene.find("rain").unwrap();
        advance(&mut scene, FrameTime { delta: 0.016, elapsed: 0.016 });
        advance(&mut scene, FrameTime { delta: 0.016, elapsed: 0.032 });
        assert_eq!(scene.get(id).unwrap().geometry.revision(), 2);
    }
}
