use glam::{vec2, Vec2, Vec3Swizzles};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::ObstacleConfig,
    error::{Error, Result},
    gpu::GpuDevice,
    obstacle::{Obstacle, ObstacleId, ObstacleSet, ShapeKind},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub count: usize,
    pub x_range: (f32, f32),
    pub z_range: (f32, f32),
    pub height_range: (f32, f32),
    pub wide_length_range: (f32, f32),
    pub narrow_length_range: (f32, f32),
    pub max_attempts_per_obstacle: usize,
}

impl SpawnRequest {
    pub fn initial(config: &ObstacleConfig) -> Self {
        Self {
            count: config.initial_count,
            x_range: config.initial_x_range,
            z_range: config.initial_z_range,
            ..Self::batch(config, (0.0, 0.0), (0.0, 0.0))
        }
    }

    /// A batch across the lane, starting `spawn_window` ahead of `character_z`.
    pub fn ahead(config: &ObstacleConfig, lane_half_width: f32, character_z: f32) -> Self {
        let near = character_z - config.spawn_window;
        Self::batch(
            config,
            (-lane_half_width, lane_half_width),
            (near - config.spawn_depth, near),
        )
    }

    fn check_ranges(&self) -> Result<()> {
        for (name, (min, max)) in [
            ("x_range", self.x_range),
            ("z_range", self.z_range),
            ("height_range", self.height_range),
            ("wide_length_range", self.wide_length_range),
            ("narrow_length_range", self.narrow_length_range),
        ] {
            if !(min.is_finite() && max.is_finite() && min <= max) {
                return Err(Error::Config(format!(
                    "spawn {name} must be finite with min <= max, got ({min}, {max})"
                )));
            }
        }
        Ok(())
    }

    fn batch(config: &ObstacleConfig, x_range: (f32, f32), z_range: (f32, f32)) -> Self {
        Self {
            count: config.batch_count,
            x_range,
            z_range,
            height_range: config.height_range,
            wide_length_range: config.wide_length_range,
            narrow_length_range: config.narrow_length_range,
            max_attempts_per_obstacle: config.max_attempts_per_obstacle,
        }
    }
}

/// The ground-plane rectangle around an obstacle that no later obstacle may be centred
/// in: twice the obstacle's world half-extent on each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionZone {
    pub center: Vec2,
    pub radius: Vec2,
}

impl ExclusionZone {
    pub fn of(obstacle: &Obstacle) -> Self {
        Self {
            center: obstacle.transform().position.xz(),
            radius: obstacle.world_box().half_extent().xz(),
        }
    }

    /// Rejected only when the point is inside on both axes.
    pub fn rejects(&self, point: Vec2) -> bool {
        let d = (point - self.center).abs();
        d.x <= 2.0 * self.radius.x && d.y <= 2.0 * self.radius.y
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    position: Vec2,
    height: f32,
    length: f32,
    shape: ShapeKind,
}

pub struct PlacementEngine {
    rng: StdRng,
}

impl PlacementEngine {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Places `request.count` obstacles, each clear of every obstacle already in `set`.
    ///
    /// Gives up after `count * max_attempts_per_obstacle` draws. Obstacles accepted up to
    /// that point stay in the set and the error reports how many there were.
    pub fn spawn_batch(
        &mut self,
        request: &SpawnRequest,
        set: &mut ObstacleSet,
        gpu: &mut dyn GpuDevice,
    ) -> Result<Vec<ObstacleId>> {
        request.check_ranges()?;
        let mut zones: Vec<ExclusionZone> = set.iter().map(|(_, o)| ExclusionZone::of(o)).collect();
        let max_attempts = request.count.saturating_mul(request.max_attempts_per_obstacle);
        let mut placed = Vec::with_capacity(request.count);
        let mut attempts = 0;

        while placed.len() < request.count {
            if attempts >= max_attempts {
                return Err(Error::PlacementStarved {
                    requested: request.count,
                    placed: placed.len(),
                    attempts,
                });
            }
            attempts += 1;

            let candidate = self.sample(request);
            if zones.iter().any(|zone| zone.rejects(candidate.position)) {
                continue;
            }

            let obstacle = Obstacle::generate(
                candidate.shape,
                candidate.position.x,
                candidate.position.y,
                candidate.height,
                candidate.length,
                &mut self.rng,
                gpu,
            )?;
            zones.push(ExclusionZone::of(&obstacle));
            placed.push(set.insert(obstacle));
        }

        log::debug!(
            "Placed {} obstacles in {attempts} attempts, {} live",
            placed.len(),
            set.len()
        );
        Ok(placed)
    }

    fn sample(&mut self, request: &SpawnRequest) -> Candidate {
        let x = self.uniform(request.x_range);
        let z = self.uniform(request.z_range);
        let height = self.uniform(request.height_range);
        let length = if height <= 1.0 {
            self.uniform(request.wide_length_range)
        } else {
            self.uniform(request.narrow_length_range)
        };
        Candidate {
            position: vec2(x, z),
            height,
            length,
            shape: ShapeKind::random(&mut self.rng),
        }
    }

    fn uniform(&mut self, (min, max): (f32, f32)) -> f32 {
        self.rng.random_range(min..=max)
    }
}
