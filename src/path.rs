//! Scroll-driven camera path: a pair of open Catmull-Rom curves (camera
//! position and look-at target) evaluated at a normalized progress `t`.
//!
//! The parametrization is uniform: with `n` control points, segment `k`
//! covers `[k / (n - 1), (k + 1) / (n - 1)]`. The curve passes through every
//! waypoint, so `t = 0` and `t = 1` land exactly on the first and last one.

use glam::Vec3;

/// Tension used by the product path.
pub const DEFAULT_TENSION: f32 = 0.5;

/// Errors raised while constructing a [`CameraPath`] or [`CatmullRom`] curve.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    /// A curve needs at least two control points.
    #[error("curve needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),

    /// Position and look-at sequences must pair up one to one.
    #[error("waypoint lists differ in length: {positions} positions, {look_at} look-at targets")]
    MismatchedLengths { positions: usize, look_at: usize },
}

/// Open (non-looping) Catmull-Rom spline through a fixed set of points.
#[derive(Clone, Debug, PartialEq)]
pub struct CatmullRom {
    points: Vec<Vec3>,
    tension: f32,
}

impl CatmullRom {
    pub fn new(points: Vec<Vec3>, tension: f32) -> Result<Self, PathError> {
        if points.len() < 2 {
            return Err(PathError::TooFewWaypoints(points.len()));
        }
        Ok(Self { points, tension })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Point on the curve at `t`, clamped into `[0, 1]`.
    pub fn point_at(&self, t: f32) -> Vec3 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.points.len() - 1;
        let p = last as f32 * t;
        let mut segment = p.floor() as usize;
        let mut weight = p - segment as f32;
        if segment >= last {
            segment = last - 1;
            weight = 1.0;
        }

        let p1 = self.points[segment];
        let p2 = self.points[segment + 1];
        // Missing neighbours at the open ends are mirrored.
        let p0 = if segment > 0 {
            self.points[segment - 1]
        } else {
            p1 * 2.0 - p2
        };
        let p3 = if segment + 2 <= last {
            self.points[segment + 2]
        } else {
            p2 * 2.0 - p1
        };

        let m1 = (p2 - p0) * self.tension;
        let m2 = (p3 - p1) * self.tension;
        hermite(p1, p2, m1, m2, weight)
    }
}

/// Cubic Hermite segment from `a` to `b` with end tangents `ta`, `tb`.
fn hermite(a: Vec3, b: Vec3, ta: Vec3, tb: Vec3, w: f32) -> Vec3 {
    let c2 = a * -3.0 + b * 3.0 - ta * 2.0 - tb;
    let c3 = a * 2.0 - b * 2.0 + ta + tb;
    a + ta * w + c2 * (w * w) + c3 * (w * w * w)
}

/// Where the camera should be, and what it should look at, for a progress value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSample {
    pub position: Vec3,
    pub look_at: Vec3,
}

/// The two curves that script the flight. Immutable after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraPath {
    position: CatmullRom,
    look_at: CatmullRom,
}

impl CameraPath {
    pub fn new(positions: Vec<Vec3>, look_at: Vec<Vec3>, tension: f32) -> Result<Self, PathError> {
        if positions.len() != look_at.len() {
            return Err(PathError::MismatchedLengths {
                positions: positions.len(),
                look_at: look_at.len(),
            });
        }
        Ok(Self {
            position: CatmullRom::new(positions, tension)?,
            look_at: CatmullRom::new(look_at, tension)?,
        })
    }

    pub fn waypoint_count(&self) -> usize {
        self.position.points().len()
    }

    pub fn sample(&self, t: f32) -> PathSample {
        PathSample {
            position: self.position.point_at(t),
            look_at: self.look_at.point_at(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_path() -> CameraPath {
        let positions = vec![
            Vec3::new(0.0, 120.0, 0.0),
            Vec3::new(10.0, 30.0, -40.0),
            Vec3::new(-25.0, 12.0, -25.0),
            Vec3::new(0.0, 10.0, 25.0),
            Vec3::new(0.0, 80.0, 80.0),
        ];
        let look_at = vec![
            Vec3::ZERO,
            Vec3::new(22.0, 35.0, -60.0),
            Vec3::new(-20.0, 10.0, -25.0),
            Vec3::new(0.0, 15.0, 25.0),
            Vec3::ZERO,
        ];
        CameraPath::new(positions, look_at, DEFAULT_TENSION).unwrap()
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn endpoints_hit_first_and_last_waypoints() {
        let path = product_path();
        let start = path.sample(0.0);
        let end = path.sample(1.0);
        assert!(close(start.position, Vec3::new(0.0, 120.0, 0.0)), "{start:?}");
        assert!(close(start.look_at, Vec3::ZERO), "{start:?}");
        assert!(close(end.position, Vec3::new(0.0, 80.0, 80.0)), "{end:?}");
        assert!(close(end.look_at, Vec3::ZERO), "{end:?}");
    }

    #[test]
    fn interior_waypoints_sit_on_even_splits() {
        let path = product_path();
        assert_eq!(path.waypoint_count(), 5);
        assert!(close(path.sample(0.25).position, Vec3::new(10.0, 30.0, -40.0)));
        assert!(close(path.sample(0.5).look_at, Vec3::new(-20.0, 10.0, -25.0)));
        assert!(close(path.sample(0.75).position, Vec3::new(0.0, 10.0, 25.0)));
    }

    #[test]
    fn sampling_is_pure() {
        let path = product_path();
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            assert_eq!(path.sample(t), path.sample(t));
        }
    }

    #[test]
    fn out_of_range_progress_is_clamped() {
        let path = product_path();
        assert_eq!(path.sample(-0.5), path.sample(0.0));
        assert_eq!(path.sample(3.0), path.sample(1.0));
        assert_eq!(path.sample(f32::NAN), path.sample(0.0));
    }

    #[test]
    fn two_point_curve_is_a_straight_line() {
        let curve = CatmullRom::new(vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)], 0.5).unwrap();
        let mid = curve.point_at(0.5);
        assert!(close(mid, Vec3::new(5.0, 0.0, 0.0)), "{mid:?}");
    }

    #[test]
    fn construction_rejects_bad_waypoints() {
        assert_eq!(
            CatmullRom::new(vec![Vec3::ONE], 0.5),
            Err(PathError::TooFewWaypoints(1))
        );
        assert_eq!(
            CameraPath::new(vec![Vec3::ZERO, Vec3::ONE], vec![Vec3::ZERO], 0.5),
            Err(PathError::MismatchedLengths {
                positions: 2,
                look_at: 1
            })
        );
    }
}
