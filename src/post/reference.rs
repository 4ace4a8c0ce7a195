//! CPU evaluation of the post passes on an RGBA float image.
//!
//! Same formulas as the GLSL in the browser backend, sampled with bilinear
//! filtering and clamp-to-edge addressing. Used for host-side checks of
//! bloom, streak and distortion behavior.

use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};

use super::{bloom_kernel_radius, gaussian_weights, streak_taps, FrameSize, PostPipeline, BLOOM_SMOOTH_WIDTH};
use crate::config::{BloomConfig, DistortionConfig, StreakConfig};

/// Row-major RGBA image, row 0 at `v = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    size: FrameSize,
    pixels: Vec<Vec4>,
}

impl Image {
    pub fn filled(size: FrameSize, color: Vec4) -> Self {
        Self {
            size,
            pixels: vec![color; size.pixel_count()],
        }
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn get(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[(y * self.size.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Vec4) {
        let w = self.size.width;
        self.pixels[(y * w + x) as usize] = color;
    }

    fn from_fn(size: FrameSize, mut f: impl FnMut(Vec2) -> Vec4) -> Self {
        let mut pixels = Vec::with_capacity(size.pixel_count());
        for y in 0..size.height {
            for x in 0..size.width {
                let uv = Vec2::new(
                    (x as f32 + 0.5) / size.width as f32,
                    (y as f32 + 0.5) / size.height as f32,
                );
                pixels.push(f(uv));
            }
        }
        Self { size, pixels }
    }

    /// Bilinear sample with clamp-to-edge addressing.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let (w, h) = (self.size.width as f32, self.size.height as f32);
        let px = (uv.x * w - 0.5).clamp(0.0, w - 1.0);
        let py = (uv.y * h - 0.5).clamp(0.0, h - 1.0);
        let (x0, y0) = (px.floor() as u32, py.floor() as u32);
        let x1 = (x0 + 1).min(self.size.width - 1);
        let y1 = (y0 + 1).min(self.size.height - 1);
        let (fx, fy) = (px - x0 as f32, py - y0 as f32);
        let top = self.get(x0, y0).lerp(self.get(x1, y0), fx);
        let bottom = self.get(x0, y1).lerp(self.get(x1, y1), fx);
        top.lerp(bottom, fy)
    }

    fn resampled(&self, size: FrameSize) -> Self {
        Self::from_fn(size, |uv| self.sample(uv))
    }

    fn blurred(&self, radius: usize, axis: Vec2) -> Self {
        let weights = gaussian_weights(radius);
        let texel = Vec2::new(1.0 / self.size.width as f32, 1.0 / self.size.height as f32) * axis;
        Self::from_fn(self.size, |uv| {
            let mut sum = self.sample(uv) * weights[0];
            for (i, w) in weights.iter().enumerate().skip(1) {
                let offset = texel * i as f32;
                sum += (self.sample(uv + offset) + self.sample(uv - offset)) * *w;
            }
            sum
        })
    }
}

fn luminance(rgb: Vec3) -> f32 {
    rgb.dot(Vec3::new(0.299, 0.587, 0.114))
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Bright-pass, blurred mip chain, additive composite.
pub fn bloom(input: &Image, config: &BloomConfig) -> Image {
    let bright = Image::from_fn(input.size, |uv| {
        let color = input.sample(uv);
        let alpha = smoothstep(config.threshold, config.threshold + BLOOM_SMOOTH_WIDTH, luminance(color.xyz()));
        color * alpha
    });

    let weights = super::bloom_level_weights(config);
    let mut source = bright;
    let mut mips = Vec::with_capacity(weights.len());
    let mut size = input.size;
    for level in 0..weights.len() {
        size = size.halved();
        let radius = bloom_kernel_radius(level);
        let down = source.resampled(size);
        let blurred = down.blurred(radius, Vec2::X).blurred(radius, Vec2::Y);
        mips.push(blurred.clone());
        source = blurred;
    }

    Image::from_fn(input.size, |uv| {
        let base = input.sample(uv);
        let glow = mips
            .iter()
            .zip(&weights)
            .fold(Vec3::ZERO, |acc, (mip, w)| acc + mip.sample(uv).xyz() * *w);
        (base.xyz() + glow * config.strength).extend(base.w)
    })
}

/// Directional streak: taps along `direction`, mixed in by `intensity`.
/// Alpha passes through.
pub fn streak(input: &Image, config: &StreakConfig) -> Image {
    let taps = streak_taps(config);
    Image::from_fn(input.size, |uv| {
        let base = input.sample(uv);
        let streaked = taps.iter().fold(base.xyz(), |acc, (step, weight)| {
            acc + input.sample(uv + config.direction * *step * config.spacing).xyz() * *weight
        });
        base.xyz().lerp(streaked, config.intensity).extend(base.w)
    })
}

/// Radial remap `uv' = uv * (1 + amount * r^2)` in `[-1, 1]` space, clamped
/// back onto the image.
pub fn barrel(input: &Image, config: &DistortionConfig) -> Image {
    Image::from_fn(input.size, |uv| input.sample(distort_uv(uv, config.amount)))
}

pub fn distort_uv(uv: Vec2, amount: f32) -> Vec2 {
    let centered = uv * 2.0 - Vec2::ONE;
    let r2 = centered.dot(centered);
    let distorted = centered * (1.0 + amount * r2);
    ((distorted + Vec2::ONE) * 0.5).clamp(Vec2::ZERO, Vec2::ONE)
}

/// Runs bloom, streak and distortion over a rendered scene image.
pub fn apply(pipeline: &PostPipeline, scene: &Image) -> Image {
    let bloomed = bloom(scene, pipeline.bloom());
    let streaked = streak(&bloomed, pipeline.streak());
    barrel(&streaked, pipeline.distortion())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PostConfig;

    fn dot_image(size: FrameSize, x: u32, y: u32, color: Vec4) -> Image {
        let mut image = Image::filled(size, Vec4::new(0.0, 0.0, 0.0, 1.0));
        image.set(x, y, color);
        image
    }

    #[test]
    fn black_frame_stays_black() {
        let size = FrameSize::new(32, 16);
        let black = Image::filled(size, Vec4::new(0.0, 0.0, 0.0, 1.0));
        let pipeline = PostPipeline::new(PostConfig::default(), size);
        assert_eq!(apply(&pipeline, &black), black);
    }

    #[test]
    fn bloom_adds_glow_around_bright_pixels() {
        let size = FrameSize::new(32, 32);
        let image = dot_image(size, 16, 16, Vec4::new(4.0, 4.0, 4.0, 1.0));
        let out = bloom(&image, &BloomConfig::default());
        assert_eq!(out.size(), size);
        assert!(out.get(18, 16).x > 0.0);
        assert!(out.get(16, 16).x >= 4.0);
    }

    #[test]
    fn bloom_leaves_dim_frames_untouched() {
        let size = FrameSize::new(16, 16);
        let dim = Image::filled(size, Vec4::new(0.1, 0.1, 0.1, 1.0));
        let config = BloomConfig {
            threshold: 0.5,
            ..Default::default()
        };
        let out = bloom(&dim, &config);
        assert!((out.get(8, 8) - dim.get(8, 8)).length() < 1e-6);
    }

    #[test]
    fn streak_leaks_sideways_only() {
        let size = FrameSize::new(1000, 9);
        let image = dot_image(size, 500, 4, Vec4::ONE);
        let out = streak(&image, &StreakConfig::default());
        assert!(out.get(502, 4).x > 0.0, "horizontal neighbour should glow");
        assert_eq!(out.get(500, 6).x, 0.0, "vertical neighbour must stay dark");
    }

    #[test]
    fn zero_intensity_streak_is_identity() {
        let size = FrameSize::new(64, 8);
        let image = dot_image(size, 10, 3, Vec4::ONE);
        let config = StreakConfig {
            intensity: 0.0,
            ..Default::default()
        };
        assert_eq!(streak(&image, &config), image);
    }

    #[test]
    fn barrel_keeps_center_and_pushes_edges_outward() {
        assert_eq!(distort_uv(Vec2::splat(0.5), 0.06), Vec2::splat(0.5));
        let edge = distort_uv(Vec2::new(0.9, 0.5), 0.06);
        assert!(edge.x > 0.9 && edge.y == 0.5);
        assert_eq!(distort_uv(Vec2::new(1.0, 1.0), 0.5), Vec2::ONE);
        let size = FrameSize::new(9, 9);
        let image = dot_image(size, 4, 4, Vec4::ONE);
        assert_eq!(barrel(&image, &DistortionConfig::default()).get(4, 4), Vec4::ONE);
    }
}
