//! Stage configuration with the product defaults and JSON loading.
//!
//! Every struct is `#[serde(default)]`, so a page only needs to spell out the
//! fields it overrides.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::sections::{default_markers, SectionMarker};

/// Deepest bloom mip chain the composite pass can read.
pub const MAX_BLOOM_LEVELS: u32 = 5;

/// Widest streak, in taps per side, the shader loop covers.
pub const MAX_STREAK_TAPS: u32 = 16;

/// Errors that can occur when parsing or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON block could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),

    /// The values parsed but describe an unusable stage.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StageConfig {
    /// Seed for the scene's procedural variation.
    pub seed: u64,
    pub scroll: ScrollConfig,
    pub camera: CameraConfig,
    pub path: PathConfig,
    /// Overlay markers, evaluated in order.
    pub sections: Vec<SectionMarker>,
    pub scene: SceneConfig,
    pub post: PostConfig,
    /// Upper bound, in seconds, on the animation delta of a single tick.
    pub max_frame_delta: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            scroll: ScrollConfig::default(),
            camera: CameraConfig::default(),
            path: PathConfig::default(),
            sections: default_markers(),
            scene: SceneConfig::default(),
            post: PostConfig::default(),
            max_frame_delta: 0.25,
        }
    }
}

impl StageConfig {
    /// Parses and validates a JSON config block.
    pub fn from_json(src: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(src).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if self.path.positions.len() < 2 || self.path.positions.len() != self.path.look_at.len() {
            return invalid(format!(
                "path needs matching waypoint lists of at least 2 points, got {} and {}",
                self.path.positions.len(),
                self.path.look_at.len()
            ));
        }
        if !(self.scroll.virtual_extent > 0.0) {
            return invalid(format!(
                "virtual scroll extent must be positive, got {}",
                self.scroll.virtual_extent
            ));
        }
        if !(self.camera.smoothing > 0.0 && self.camera.smoothing <= 1.0) {
            return invalid(format!(
                "camera smoothing must be in (0, 1], got {}",
                self.camera.smoothing
            ));
        }
        for marker in &self.sections {
            let (start, end) = (marker.start.value(), marker.end.value());
            if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) || start > end {
                return invalid(format!(
                    "section '{}' has bounds {start}..{end} outside [0, 1]",
                    marker.id
                ));
            }
        }
        if !(1..=MAX_BLOOM_LEVELS).contains(&self.post.bloom.levels) {
            return invalid(format!(
                "bloom levels must be in 1..={MAX_BLOOM_LEVELS}, got {}",
                self.post.bloom.levels
            ));
        }
        if !(1..=MAX_STREAK_TAPS).contains(&self.post.streak.taps) {
            return invalid(format!(
                "streak taps must be in 1..={MAX_STREAK_TAPS}, got {}",
                self.post.streak.taps
            ));
        }
        if !(self.max_frame_delta > 0.0) {
            return invalid(format!(
                "max frame delta must be positive, got {}",
                self.max_frame_delta
            ));
        }
        let scene = &self.scene;
        if !(scene.rain_floor < scene.rain_ceiling) {
            return invalid(format!(
                "rain floor {} must lie below the ceiling {}",
                scene.rain_floor, scene.rain_ceiling
            ));
        }
        if scene.grid_divisions == 0 {
            return invalid("grid needs at least one division".into());
        }
        Ok(())
    }
}

/// Scroll mapping settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrollConfig {
    /// Document height imposed while mounted, in CSS pixels.
    pub virtual_extent: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            virtual_extent: 6000.0,
        }
    }
}

/// Camera projection and follow settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Fraction of the remaining distance covered each tick.
    pub smoothing: f32,
    /// Cap on the device pixel ratio used for drawing buffers.
    pub max_pixel_ratio: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            smoothing: 0.1,
            max_pixel_ratio: 2.0,
        }
    }
}

/// Waypoints of the scripted flight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathConfig {
    pub positions: Vec<Vec3>,
    pub look_at: Vec<Vec3>,
    pub tension: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            positions: vec![
                Vec3::new(0.0, 120.0, 0.0),   // above the city looking down
                Vec3::new(10.0, 30.0, -40.0), // diving toward the tower
                Vec3::new(-25.0, 12.0, -25.0), // gallery canyon
                Vec3::new(0.0, 10.0, 25.0),   // inside the media tower
                Vec3::new(0.0, 80.0, 80.0),   // ascend and look back
            ],
            look_at: vec![
                Vec3::ZERO,
                Vec3::new(22.0, 35.0, -60.0),
                Vec3::new(-20.0, 10.0, -25.0),
                Vec3::new(0.0, 15.0, 25.0),
                Vec3::ZERO,
            ],
            tension: crate::path::DEFAULT_TENSION,
        }
    }
}

/// Colors used across the scene, as RGB in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Palette {
    pub background: Vec3,
    pub cyan: Vec3,
    pub pink: Vec3,
    pub white: Vec3,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: rgb(0x050a14),
            cyan: rgb(0x00f0ff),
            pink: rgb(0xf000ff),
            white: rgb(0xffffff),
        }
    }
}

/// Converts a packed `0xRRGGBB` color.
pub fn rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Structural parameters of the procedural scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub palette: Palette,
    pub grid_size: f32,
    pub grid_divisions: u32,
    pub grid_opacity: f32,
    pub rain_count: u32,
    /// Width and depth of the square the rain falls in.
    pub rain_spread: f32,
    /// Height below which a drop wraps back to the ceiling.
    pub rain_floor: f32,
    pub rain_ceiling: f32,
    pub rain_opacity: f32,
    /// World-space point size of a rain drop.
    pub particle_size: f32,
    pub tower_cubes: u32,
    pub media_planes: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            grid_size: 1000.0,
            grid_divisions: 200,
            grid_opacity: 0.25,
            rain_count: 3000,
            rain_spread: 400.0,
            rain_floor: 0.0,
            rain_ceiling: 200.0,
            rain_opacity: 0.6,
            particle_size: 0.05,
            tower_cubes: 40,
            media_planes: 12,
        }
    }
}

/// Post-processing uniforms.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostConfig {
    pub bloom: BloomConfig,
    pub streak: StreakConfig,
    pub distortion: DistortionConfig,
}

/// Bloom pass parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BloomConfig {
    pub strength: f32,
    /// Blend between sharp (0) and wide (1) glow across the mip chain.
    pub radius: f32,
    /// Luminance above which a pixel starts to glow.
    pub threshold: f32,
    /// Number of downsampled blur levels. Each halves the previous size.
    pub levels: u32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            strength: 1.6,
            radius: 0.4,
            threshold: 0.01,
            levels: 5,
        }
    }
}

/// Horizontal streak glow parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreakConfig {
    pub intensity: f32,
    pub direction: Vec2,
    /// Taps on each side of the center sample.
    pub taps: u32,
    /// UV distance between two taps.
    pub spacing: f32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            intensity: 0.25,
            direction: Vec2::X,
            taps: 6,
            spacing: 0.002,
        }
    }
}

/// Barrel distortion parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DistortionConfig {
    pub amount: f32,
}

impl Default for DistortionConfig {
    fn default() -> Self {
        Self { amount: 0.06 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StageConfig::default();
        config.validate().unwrap();
        assert_eq!(config.scroll.virtual_extent, 6000.0);
        assert_eq!(config.camera.smoothing, 0.1);
        assert_eq!(config.post.bloom.strength, 1.6);
        assert_eq!(config.sections.len(), 5);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = StageConfig::from_json(r#"{"seed": 99, "post": {"distortion": {"amount": 0.1}}}"#)
            .unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.post.distortion.amount, 0.1);
        assert_eq!(config.post.bloom, BloomConfig::default());
        assert_eq!(config.path, PathConfig::default());
    }

    #[test]
    fn rejects_malformed_and_invalid_blocks() {
        assert!(matches!(
            StageConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            StageConfig::from_json(r#"{"path": {"positions": [[0,0,0]], "look_at": [[0,0,0]]}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            StageConfig::from_json(r#"{"camera": {"smoothing": 0.0}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            StageConfig::from_json(
                r#"{"sections": [{"id": "x", "start": {"closed": 0.8}, "end": {"open": 0.2}}]}"#
            ),
            Err(ConfigError::Invalid(_))
        ));
        for block in [
            r#"{"max_frame_delta": -1.0}"#,
            r#"{"max_frame_delta": 0.0}"#,
            r#"{"scene": {"rain_floor": 50.0, "rain_ceiling": 10.0}}"#,
            r#"{"scene": {"grid_divisions": 0}}"#,
            r#"{"post": {"streak": {"taps": 0}}}"#,
            r#"{"post": {"streak": {"taps": 17}}}"#,
        ] {
            assert!(
                matches!(StageConfig::from_json(block), Err(ConfigError::Invalid(_))),
                "accepted {block}"
            );
        }
        StageConfig::from_json(r#"{"post": {"streak": {"taps": 16}}}"#).unwrap();
    }

    #[test]
    fn packed_colors_unpack_to_unit_rgb() {
        assert_eq!(rgb(0xffffff), Vec3::ONE);
        assert_eq!(rgb(0x00f0ff), Vec3::new(0.0, 240.0 / 255.0, 1.0));
    }
}
