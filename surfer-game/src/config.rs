use std::{fs, path::Path};

use glam::{vec3, Vec3};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Every tunable of a run. Missing fields in a config file fall back to these defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for obstacle placement; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub max_delta_time: f32,
    pub player: PlayerConfig,
    pub camera: CameraConfig,
    pub ground: GroundConfig,
    pub obstacles: ObstacleConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_delta_time: 0.03,
            player: PlayerConfig::default(),
            camera: CameraConfig::default(),
            ground: GroundConfig::default(),
            obstacles: ObstacleConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Start position; y is replaced so the character rests on the ground
    pub start_position: Vec3,
    /// Rotation about +Y at start, in degrees
    pub start_yaw_degrees: f32,
    pub initial_speed: f32,
    /// Forward acceleration, units per second squared
    pub speed_ramp: f32,
    pub strafe_speed: f32,
    /// Character x is kept within ±this
    pub lane_half_width: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_position: vec3(0.0, 0.0, 5.0),
            start_yaw_degrees: -90.0,
            initial_speed: 4.0,
            speed_ramp: 0.05,
            strafe_speed: 4.0,
            lane_half_width: 10.0,
            gravity: -10.0,
            jump_velocity: 6.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub start_position: Vec3,
    pub fov_degrees: f32,
    pub min_fov_degrees: f32,
    pub max_fov_degrees: f32,
    /// Degrees of field of view per scroll unit
    pub zoom_sensitivity: f32,
    /// The directional light is rotated 45 degrees about this axis
    pub light_axis: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_position: vec3(0.0, 3.0, 10.0),
            fov_degrees: 50.0,
            min_fov_degrees: 20.0,
            max_fov_degrees: 80.0,
            zoom_sensitivity: 2.0,
            light_axis: vec3(-1.0, -2.0, -1.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub tile_width: f32,
    pub tile_length: f32,
    pub tile_count: usize,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            tile_width: 60.0,
            tile_length: 50.0,
            tile_count: 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub initial_count: usize,
    pub initial_x_range: (f32, f32),
    pub initial_z_range: (f32, f32),
    pub batch_count: usize,
    pub spawn_distance: f32,
    /// How far ahead of the character a batch starts
    pub spawn_window: f32,
    /// Depth along z of a batch's spawn area
    pub spawn_depth: f32,
    pub height_range: (f32, f32),
    /// Footprint range for short obstacles (height <= 1)
    pub wide_length_range: (f32, f32),
    /// Footprint range for tall obstacles (height > 1)
    pub narrow_length_range: (f32, f32),
    pub max_attempts_per_obstacle: usize,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            initial_count: 5,
            initial_x_range: (-10.0, 10.0),
            initial_z_range: (-10.0, 0.0),
            batch_count: 5,
            spawn_distance: 20.0,
            spawn_window: 30.0,
            spawn_depth: 20.0,
            height_range: (0.5, 2.0),
            wide_length_range: (1.0, 2.0),
            narrow_length_range: (0.5, 1.0),
            max_attempts_per_obstacle: 100,
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let player = &self.player;
        let camera = &self.camera;
        let ground = &self.ground;
        let obstacles = &self.obstacles;

        check(self.max_delta_time > 0.0, "max_delta_time must be positive")?;
        check(player.gravity < 0.0, "player.gravity must be negative")?;
        check(player.jump_velocity > 0.0, "player.jump_velocity must be positive")?;
        check(player.initial_speed >= 0.0, "player.initial_speed must not be negative")?;
        check(player.lane_half_width > 0.0, "player.lane_half_width must be positive")?;
        check(
            camera.min_fov_degrees > 0.0
                && camera.min_fov_degrees <= camera.fov_degrees
                && camera.fov_degrees <= camera.max_fov_degrees
                && camera.max_fov_degrees < 180.0,
            "camera fov must satisfy 0 < min <= fov <= max < 180",
        )?;
        check(
            camera.light_axis.length_squared() > 0.0,
            "camera.light_axis must be non-zero",
        )?;
        check(ground.tile_count > 0, "ground.tile_count must be at least 1")?;
        check(
            ground.tile_width > 0.0 && ground.tile_length > 0.0,
            "ground tile size must be positive",
        )?;
        check(
            obstacles.spawn_distance > 0.0,
            "obstacles.spawn_distance must be positive",
        )?;
        check(
            obstacles.spawn_window.is_finite() && obstacles.spawn_window >= 0.0,
            "obstacles.spawn_window must not be negative",
        )?;
        check(
            obstacles.spawn_depth.is_finite() && obstacles.spawn_depth >= 0.0,
            "obstacles.spawn_depth must not be negative",
        )?;
        check(
            obstacles.max_attempts_per_obstacle > 0,
            "obstacles.max_attempts_per_obstacle must be at least 1",
        )?;
        check(
            obstacles.height_range.0 > 0.0,
            "obstacles.height_range must be positive",
        )?;
        for (name, (min, max)) in [
            ("initial_x_range", obstacles.initial_x_range),
            ("initial_z_range", obstacles.initial_z_range),
            ("height_range", obstacles.height_range),
            ("wide_length_range", obstacles.wide_length_range),
            ("narrow_length_range", obstacles.narrow_length_range),
        ] {
            if min > max {
                return Err(Error::Config(format!(
                    "obstacles.{name} has min {min} above max {max}"
                )));
            }
        }
        Ok(())
    }
}

fn check(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Config(message.to_string()))
    }
}
