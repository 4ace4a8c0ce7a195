//! Post-processing chain: scene render, bloom, streak glow, barrel
//! distortion. The order is fixed; streak and distortion read the bloomed
//! image.
//!
//! [`PostPipeline`] owns the pass uniforms and the size of every pass
//! buffer. It resizes all of them in one call, so a frame can never see a
//! mix of old and new sizes. The GPU backend mirrors these sizes and the
//! formulas in [`reference`].

pub mod reference;

use crate::config::{BloomConfig, DistortionConfig, PostConfig, StreakConfig};

/// Width and height of a drawing buffer, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Device-pixel size of a CSS-pixel box.
    pub fn scaled(width: u32, height: u32, pixel_ratio: f64) -> Self {
        let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        Self {
            width: ((width as f64 * ratio).round() as u32).max(1),
            height: ((height as f64 * ratio).round() as u32).max(1),
        }
    }

    /// Next level down a mip chain, never below 1x1.
    pub fn halved(self) -> Self {
        Self {
            width: (self.width / 2).max(1),
            height: (self.height / 2).max(1),
        }
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Scene,
    Bloom,
    Streak,
    Distortion,
}

impl PassKind {
    /// Execution order.
    pub const ORDER: [PassKind; 4] = [
        PassKind::Scene,
        PassKind::Bloom,
        PassKind::Streak,
        PassKind::Distortion,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PassKind::Scene => "scene",
            PassKind::Bloom => "bloom",
            PassKind::Streak => "streak",
            PassKind::Distortion => "distortion",
        }
    }
}

/// One pass and the size of the image it produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pass {
    pub kind: PassKind,
    pub size: FrameSize,
}

/// Weights of the five bloom levels before the radius blend.
const BLOOM_FACTORS: [f32; 5] = [1.0, 0.8, 0.6, 0.4, 0.2];

/// Width of the smoothstep band above the bloom threshold.
pub const BLOOM_SMOOTH_WIDTH: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct PostPipeline {
    config: PostConfig,
    passes: [Pass; 4],
    bloom_mips: Vec<FrameSize>,
}

impl PostPipeline {
    pub fn new(config: PostConfig, size: FrameSize) -> Self {
        let mut pipeline = Self {
            passes: PassKind::ORDER.map(|kind| Pass { kind, size }),
            bloom_mips: Vec::new(),
            config,
        };
        pipeline.bloom_mips = mip_chain(size, pipeline.config.bloom.levels);
        pipeline
    }

    /// Resizes every pass buffer and the bloom mip chain together.
    /// Returns `false` when the size did not change.
    pub fn resize(&mut self, size: FrameSize) -> bool {
        if self.size() == size {
            return false;
        }
        for pass in &mut self.passes {
            pass.size = size;
        }
        self.bloom_mips = mip_chain(size, self.config.bloom.levels);
        for (level, mip) in self.bloom_mips.iter().enumerate() {
            log::trace!("Bloom mip {level}: {}x{}", mip.width, mip.height);
        }
        true
    }

    pub fn size(&self) -> FrameSize {
        self.passes[0].size
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn pass(&self, kind: PassKind) -> Pass {
        self.passes[kind as usize]
    }

    pub fn bloom_mips(&self) -> &[FrameSize] {
        &self.bloom_mips
    }

    pub fn config(&self) -> &PostConfig {
        &self.config
    }

    pub fn bloom(&self) -> &BloomConfig {
        &self.config.bloom
    }

    pub fn streak(&self) -> &StreakConfig {
        &self.config.streak
    }

    pub fn distortion(&self) -> &DistortionConfig {
        &self.config.distortion
    }

    /// Composite weight of each bloom level, `mix(f, 1.2 - f, radius)`.
    pub fn bloom_level_weights(&self) -> Vec<f32> {
        bloom_level_weights(&self.config.bloom)
    }
}

fn mip_chain(size: FrameSize, levels: u32) -> Vec<FrameSize> {
    let mut mips = Vec::with_capacity(levels as usize);
    let mut mip = size.halved();
    for _ in 0..levels {
        mips.push(mip);
        mip = mip.halved();
    }
    mips
}

pub fn bloom_level_weights(config: &BloomConfig) -> Vec<f32> {
    (0..config.levels as usize)
        .map(|level| {
            let factor = BLOOM_FACTORS
                .get(level)
                .copied()
                .unwrap_or(BLOOM_FACTORS[BLOOM_FACTORS.len() - 1]);
            factor + (1.2 - factor - factor) * config.radius
        })
        .collect()
}

/// Half-width of the Gaussian kernel used at a bloom level.
pub fn bloom_kernel_radius(level: usize) -> usize {
    3 + 2 * level
}

/// Normalized one-sided Gaussian weights `w[0..=radius]`, sigma = radius.
pub fn gaussian_weights(radius: usize) -> Vec<f32> {
    let sigma = radius.max(1) as f32;
    let raw: Vec<f32> = (0..=radius)
        .map(|x| (-0.5 * (x * x) as f32 / (sigma * sigma)).exp())
        .collect();
    let total = raw[0] + 2.0 * raw[1..].iter().sum::<f32>();
    raw.into_iter().map(|w| w / total).collect()
}

/// Streak taps as `(step, weight)` with `step` in `-taps..=taps`.
pub fn streak_taps(config: &StreakConfig) -> Vec<(f32, f32)> {
    let taps = config.taps.max(1) as i32;
    (-taps..=taps)
        .map(|i| {
            let f = i as f32;
            (f, 0.06 * (1.0 - f.abs() / taps as f32))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_run_in_fixed_order() {
        let pipeline = PostPipeline::new(PostConfig::default(), FrameSize::new(640, 480));
        let kinds: Vec<PassKind> = pipeline.passes().iter().map(|p| p.kind).collect();
        assert_eq!(kinds, PassKind::ORDER.to_vec());
        assert_eq!(pipeline.pass(PassKind::Streak).kind, PassKind::Streak);
    }

    #[test]
    fn resize_updates_every_pass_and_mip() {
        let mut pipeline = PostPipeline::new(PostConfig::default(), FrameSize::new(640, 480));
        assert!(pipeline.resize(FrameSize::new(1920, 1080)));
        assert!(pipeline
            .passes()
            .iter()
            .all(|p| p.size == FrameSize::new(1920, 1080)));
        let expected = [(960, 540), (480, 270), (240, 135), (120, 67), (60, 33)];
        let mips: Vec<(u32, u32)> = pipeline
            .bloom_mips()
            .iter()
            .map(|m| (m.width, m.height))
            .collect();
        assert_eq!(mips, expected);
        assert!(!pipeline.resize(FrameSize::new(1920, 1080)));
    }

    #[test]
    fn tiny_frames_keep_one_pixel_mips() {
        let pipeline = PostPipeline::new(PostConfig::default(), FrameSize::new(3, 1));
        assert!(pipeline
            .bloom_mips()
            .iter()
            .all(|m| m.width >= 1 && m.height >= 1));
    }

    #[test]
    fn scaled_size_applies_pixel_ratio() {
        assert_eq!(FrameSize::scaled(800, 600, 2.0), FrameSize::new(1600, 1200));
        assert_eq!(FrameSize::scaled(800, 600, f64::NAN), FrameSize::new(800, 600));
        assert_eq!(FrameSize::scaled(0, 0, 1.0), FrameSize::new(1, 1));
    }

    #[test]
    fn level_weights_blend_with_radius() {
        let sharp = bloom_level_weights(&BloomConfig {
            radius: 0.0,
            ..Default::default()
        });
        assert_eq!(sharp, BLOOM_FACTORS.to_vec());
        let wide = bloom_level_weights(&BloomConfig {
            radius: 1.0,
            ..Default::default()
        });
        assert!((wide[0] - 0.2).abs() < 1e-6 && (wide[4] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn gaussian_weights_sum_to_one() {
        for radius in [3, 5, 11] {
            let w = gaussian_weights(radius);
            let sum = w[0] + 2.0 * w[1..].iter().sum::<f32>();
            assert!((sum - 1.0).abs() < 1e-5, "radius {radius}: {sum}");
            assert!(w.windows(2).all(|p| p[1] < p[0]));
        }
    }

    #[test]
    fn streak_taps_taper_to_zero() {
        let taps = streak_taps(&StreakConfig::default());
        assert_eq!(taps.len(), 13);
        assert_eq!(taps[6], (0.0, 0.06));
        assert_eq!(taps[0].1, 0.0);
        assert_eq!(taps[12].1, 0.0);
    }
}
