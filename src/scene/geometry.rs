//! Line and point geometry for the wireframe look.
//!
//! Every line generator returns segment pairs: vertices `2k` and `2k + 1`
//! form segment `k`.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Lines,
    Points,
}

/// Vertex data plus a revision counter bumped on every in-place mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub topology: Topology,
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    revision: u64,
}

impl Geometry {
    pub fn lines(positions: Vec<Vec3>, color: Vec3) -> Self {
        let colors = vec![color; positions.len()];
        Self::with_colors(Topology::Lines, positions, colors)
    }

    pub fn points(positions: Vec<Vec3>, color: Vec3) -> Self {
        let colors = vec![color; positions.len()];
        Self::with_colors(Topology::Points, positions, colors)
    }

    pub fn with_colors(topology: Topology, positions: Vec<Vec3>, colors: Vec<Vec3>) -> Self {
        debug_assert_eq!(positions.len(), colors.len());
        Self {
            topology,
            positions,
            colors,
            revision: 0,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Marks the positions as changed so the renderer re-uploads them.
    pub fn touch(&mut self) {
        self.revision += 1;
    }

    /// Axis-aligned bounds, or `None` for empty geometry.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }
}

/// Floor grid on the XZ plane. The center lines get `center`, the rest `line`.
pub fn grid(size: f32, divisions: u32, center: Vec3, line: Vec3) -> Geometry {
    let half = size / 2.0;
    let step = size / divisions as f32;
    let middle = divisions / 2;
    let mut positions = Vec::with_capacity((divisions as usize + 1) * 4);
    let mut colors = Vec::with_capacity(positions.capacity());
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        positions.extend([
            Vec3::new(-half, 0.0, k),
            Vec3::new(half, 0.0, k),
            Vec3::new(k, 0.0, -half),
            Vec3::new(k, 0.0, half),
        ]);
        let color = if i == middle { center } else { line };
        colors.extend([color; 4]);
    }
    Geometry::with_colors(Topology::Lines, positions, colors)
}

fn box_corners(w: f32, h: f32, d: f32) -> [Vec3; 8] {
    let (x, y, z) = (w / 2.0, h / 2.0, d / 2.0);
    [
        Vec3::new(-x, -y, -z),
        Vec3::new(x, -y, -z),
        Vec3::new(x, y, -z),
        Vec3::new(-x, y, -z),
        Vec3::new(-x, -y, z),
        Vec3::new(x, -y, z),
        Vec3::new(x, y, z),
        Vec3::new(-x, y, z),
    ]
}

const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 2), (2, 3), (3, 0),
    (4, 5), (5, 6), (6, 7), (7, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

const BOX_FACE_DIAGONALS: [(usize, usize); 6] = [
    (0, 2), (4, 6), (0, 5), (3, 6), (0, 7), (1, 6),
];

fn segments(corners: &[Vec3], pairs: &[(usize, usize)]) -> Vec<Vec3> {
    pairs
        .iter()
        .flat_map(|&(a, b)| [corners[a], corners[b]])
        .collect()
}

/// The 12 outline edges of a box centered on the origin.
pub fn box_edges(w: f32, h: f32, d: f32) -> Vec<Vec3> {
    segments(&box_corners(w, h, d), &BOX_EDGES)
}

/// Triangulated wireframe of a box: outline edges plus one diagonal per face.
pub fn box_wireframe(w: f32, h: f32, d: f32) -> Vec<Vec3> {
    let corners = box_corners(w, h, d);
    let mut out = segments(&corners, &BOX_EDGES);
    out.extend(segments(&corners, &BOX_FACE_DIAGONALS));
    out
}

/// The 30 edges of an icosahedron with circumradius `radius`.
pub fn icosahedron_edges(radius: f32) -> Vec<Vec3> {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let raw = [
        Vec3::new(-1.0, phi, 0.0),
        Vec3::new(1.0, phi, 0.0),
        Vec3::new(-1.0, -phi, 0.0),
        Vec3::new(1.0, -phi, 0.0),
        Vec3::new(0.0, -1.0, phi),
        Vec3::new(0.0, 1.0, phi),
        Vec3::new(0.0, -1.0, -phi),
        Vec3::new(0.0, 1.0, -phi),
        Vec3::new(phi, 0.0, -1.0),
        Vec3::new(phi, 0.0, 1.0),
        Vec3::new(-phi, 0.0, -1.0),
        Vec3::new(-phi, 0.0, 1.0),
    ];
    let mut out = Vec::with_capacity(60);
    for a in 0..raw.len() {
        for b in a + 1..raw.len() {
            // Neighbouring vertices of this layout are exactly 2 apart.
            if (raw[a].distance(raw[b]) - 2.0).abs() < 1e-3 {
                out.push(raw[a].normalize() * radius);
                out.push(raw[b].normalize() * radius);
            }
        }
    }
    out
}

fn knot_point(u: f32, p: f32, q: f32, radius: f32) -> Vec3 {
    let qu_over_p = q / p * u;
    let cs = qu_over_p.cos();
    Vec3::new(
        radius * (2.0 + cs) * 0.5 * u.cos(),
        radius * (2.0 + cs) * 0.5 * u.sin(),
        radius * qu_over_p.sin() * 0.5,
    )
}

/// Wireframe of a (2, 3) torus knot tube: rings plus longitudinal lines.
pub fn torus_knot_wireframe(radius: f32, tube: f32, tubular: u32, radial: u32) -> Vec<Vec3> {
    let (p, q) = (2.0, 3.0);
    let cols = radial as usize + 1;
    let mut grid = Vec::with_capacity((tubular as usize + 1) * cols);
    for i in 0..=tubular {
        let u = i as f32 / tubular as f32 * p * TAU;
        let p1 = knot_point(u, p, q, radius);
        let p2 = knot_point(u + 0.01, p, q, radius);
        let tangent = p2 - p1;
        let normal = p2 + p1;
        let binormal = tangent.cross(normal).normalize();
        let normal = binormal.cross(tangent).normalize();
        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();
            grid.push(p1 + normal * cx + binormal * cy);
        }
    }

    let mut out = Vec::with_capacity(tubular as usize * radial as usize * 4);
    for i in 0..tubular as usize {
        for j in 0..radial as usize {
            let here = grid[i * cols + j];
            out.extend([here, grid[i * cols + j + 1]]);
            out.extend([here, grid[(i + 1) * cols + j]]);
        }
    }
    out
}

/// Wireframe of a `w` x `h` plane in XY: outline plus its diagonal.
pub fn plane_wireframe(w: f32, h: f32) -> Vec<Vec3> {
    let (x, y) = (w / 2.0, h / 2.0);
    let corners = [
        Vec3::new(-x, -y, 0.0),
        Vec3::new(x, -y, 0.0),
        Vec3::new(x, y, 0.0),
        Vec3::new(-x, y, 0.0),
    ];
    segments(&corners, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)])
}

/// Latitude/longitude wireframe of a sphere.
pub fn sphere_wireframe(radius: f32, width_segments: u32, height_segments: u32) -> Vec<Vec3> {
    let point = |ix: u32, iy: u32| {
        let u = ix as f32 / width_segments as f32 * TAU;
        let v = iy as f32 / height_segments as f32 * PI;
        Vec3::new(
            -radius * u.cos() * v.sin(),
            radius * v.cos(),
            radius * u.sin() * v.sin(),
        )
    };
    let mut out = Vec::new();
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            // Rings collapse at the poles; skip the zero-length segments.
            if iy > 0 {
                out.extend([point(ix, iy), point(ix + 1, iy)]);
            }
            out.extend([point(ix, iy), point(ix, iy + 1)]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_two_lines_per_division_and_colored_center() {
        let cyan = Vec3::new(0.0, 1.0, 1.0);
        let pink = Vec3::new(1.0, 0.0, 1.0);
        let g = grid(1000.0, 200, cyan, pink);
        assert_eq!(g.vertex_count(), 201 * 4);
        assert_eq!(g.colors.iter().filter(|c| **c == cyan).count(), 4);
        let (lo, hi) = g.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-500.0, 0.0, -500.0));
        assert_eq!(hi, Vec3::new(500.0, 0.0, 500.0));
    }

    #[test]
    fn polyhedra_have_expected_edge_counts() {
        assert_eq!(box_edges(1.0, 1.0, 1.0).len(), 24);
        assert_eq!(box_wireframe(20.0, 6.0, 0.5).len(), 36);
        let ico = icosahedron_edges(6.0);
        assert_eq!(ico.len(), 60);
        assert!(ico.iter().all(|p| (p.length() - 6.0).abs() < 1e-4));
        assert_eq!(plane_wireframe(8.0, 4.0).len(), 10);
    }

    #[test]
    fn knot_stays_within_its_tube_envelope() {
        let knot = torus_knot_wireframe(4.0, 1.2, 120, 16);
        assert_eq!(knot.len(), 120 * 16 * 4);
        // Knot centerline never leaves radius * 1.5 from the axis.
        assert!(knot.iter().all(|p| p.length() <= 4.0 * 1.5 + 1.2 + 1e-3));
        assert!(knot.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn sphere_vertices_lie_on_the_sphere() {
        let sphere = sphere_wireframe(2.0, 16, 16);
        assert!(!sphere.is_empty());
        assert!(sphere.iter().all(|p| (p.length() - 2.0).abs() < 1e-4));
        assert_eq!(sphere.len() % 2, 0);
    }

    #[test]
    fn touch_bumps_revision() {
        let mut g = Geometry::points(vec![Vec3::ZERO], Vec3::ONE);
        assert_eq!(g.revision(), 0);
        g.touch();
        g.touch();
        assert_eq!(g.revision(), 2);
        assert_eq!(g.topology, Topology::Points);
    }
}
