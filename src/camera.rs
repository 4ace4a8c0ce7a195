//! Perspective flight camera.

use glam::{Mat4, Vec3};

/// Perspective camera that trails the scripted path.
#[derive(Clone, Debug, PartialEq)]
pub struct FlightCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl FlightCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            fov_y: fov_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    /// Updates the aspect ratio. Zero-height viewports are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Moves a fixed fraction of the way toward `goal`.
    ///
    /// The factor is applied once per tick regardless of frame duration, so
    /// the settle time depends on the display refresh rate.
    pub fn approach(&mut self, goal: Vec3, factor: f32) {
        self.position = self.position.lerp(goal, factor);
    }

    /// Points the camera straight at `target`, no damping.
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn view(&self) -> Mat4 {
        let mut forward = self.target - self.position;
        if forward.length_squared() < 1e-12 {
            forward = Vec3::NEG_Z;
        }
        // Straight down (the opening shot) degenerates with +Y up.
        let up = if forward.normalize().cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::NEG_Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.position + forward, up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approach_is_a_fixed_fraction_per_tick() {
        let mut camera = FlightCamera::new(60.0, 1.0, 0.1, 1000.0);
        camera.approach(Vec3::new(10.0, 0.0, 0.0), 0.1);
        assert!((camera.position.x - 1.0).abs() < 1e-6);
        camera.approach(Vec3::new(10.0, 0.0, 0.0), 0.1);
        assert!((camera.position.x - 1.9).abs() < 1e-5);
    }

    #[test]
    fn viewport_sets_aspect_and_ignores_zero_height() {
        let mut camera = FlightCamera::new(60.0, 1.0, 0.1, 1000.0);
        camera.set_viewport(1920, 1080);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        camera.set_viewport(800, 0);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let mut camera = FlightCamera::new(60.0, 16.0 / 9.0, 0.1, 1000.0);
        camera.position = Vec3::new(10.0, 30.0, -40.0);
        camera.look_at(Vec3::new(22.0, 35.0, -60.0));
        let clip = camera.view_projection() * Vec3::new(22.0, 35.0, -60.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4, "{ndc:?}");
    }

    #[test]
    fn looking_straight_down_stays_finite() {
        let mut camera = FlightCamera::new(60.0, 1.0, 0.1, 1000.0);
        camera.position = Vec3::new(0.0, 120.0, 0.0);
        camera.look_at(Vec3::ZERO);
        assert!(camera.view().is_finite());
    }
}
