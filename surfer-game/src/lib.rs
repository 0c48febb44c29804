use crate::{
    bounding_box::BoundingBox,
    gpu::{DrawTarget, GpuDevice},
    ground::Ground,
    input::InputState,
    mesh::Mesh,
    obstacle::ObstacleSet,
    placement::{PlacementEngine, SpawnRequest},
    state::{GameState, Phase},
};

pub mod bounding_box;
pub mod config;
pub mod error;
pub mod gpu;
pub mod ground;
pub mod input;
pub mod mesh;
pub mod obstacle;
pub mod placement;
pub mod shapes;
pub mod state;
pub mod transform;

pub use config::GameConfig;
pub use error::{Error, Result};

pub struct Game {
    config: GameConfig,
    state: GameState,
    character: Mesh,
    ground: Ground,
    obstacles: ObstacleSet,
    placement: PlacementEngine,
}

impl Game {
    pub fn new(config: GameConfig, character: Mesh, gpu: &mut dyn GpuDevice) -> Result<Self> {
        config.validate()?;

        let state = GameState::new(&config, &character.bounding_box());
        let ground = Ground::new(&config.ground, config.camera.start_position.z, gpu)?;
        let mut game = Self {
            placement: PlacementEngine::new(config.seed),
            config,
            state,
            character,
            ground,
            obstacles: ObstacleSet::new(),
        };
        game.spawn(SpawnRequest::initial(&game.config.obstacles), gpu)?;
        log::info!("Game started with {} obstacles", game.obstacles.len());
        Ok(game)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn obstacles(&self) -> &ObstacleSet {
        &self.obstacles
    }

    pub fn ground(&self) -> &Ground {
        &self.ground
    }

    pub fn character(&self) -> &Mesh {
        &self.character
    }

    pub fn character_box(&self) -> BoundingBox {
        self.state
            .character
            .transform_box(&self.character.bounding_box())
    }

    pub fn update(
        &mut self,
        delta_time: f32,
        input: &InputState,
        gpu: &mut dyn GpuDevice,
    ) -> Result<()> {
        let delta_time = delta_time.clamp(0.0, self.config.max_delta_time);
        let edges = self.state.observe_input(input);
        self.state.zoom(input.scroll, &self.config);

        match self.state.phase {
            Phase::Running => {}
            Phase::Failed => {
                if edges.restart {
                    log::info!("Restart requested");
                    self.state.phase = Phase::Restarting;
                }
                return Ok(());
            }
            Phase::Restarting => return self.restart(gpu),
        }

        let player = &self.config.player;
        let travelled = self.state.advance(input, player, delta_time);
        if edges.jump {
            self.state.jump(player);
        }
        self.state.integrate_jump(player, delta_time);

        let character_box = self.character_box();
        if self
            .obstacles
            .iter()
            .any(|(_, obstacle)| obstacle.collides_with(&character_box))
        {
            self.state.fail();
            log::info!(
                "Collision at z {:.1}, press restart to play again",
                self.state.character.position.z
            );
            return Ok(());
        }

        let camera_z = self.state.camera.position.z;
        let passed = self
            .obstacles
            .retain(|obstacle| obstacle.transform().position.z < camera_z);
        if passed > 0 {
            log::debug!("Recycled {passed} obstacles behind the camera");
        }
        self.ground.recycle(camera_z);

        self.state.distance_since_spawn += travelled.max(0.0);
        if self.state.distance_since_spawn >= self.config.obstacles.spawn_distance {
            self.state.distance_since_spawn = 0.0;
            let request = SpawnRequest::ahead(
                &self.config.obstacles,
                self.config.player.lane_half_width,
                self.state.character.position.z,
            );
            self.spawn(request, gpu)?;
        }

        Ok(())
    }

    /// Discards the run and starts over from the initial layout.
    pub fn restart(&mut self, gpu: &mut dyn GpuDevice) -> Result<()> {
        let previous_input = self.state.previous_input();
        self.state = GameState::new(&self.config, &self.character.bounding_box());
        self.state.carry_input(previous_input);
        self.ground.reset();
        self.obstacles.clear();
        self.spawn(SpawnRequest::initial(&self.config.obstacles), gpu)?;
        log::info!("Restarted with {} obstacles", self.obstacles.len());
        Ok(())
    }

    pub fn draw(&self, target: &mut dyn DrawTarget, show_bounding_boxes: bool) {
        self.ground.draw(target, show_bounding_boxes);

        self.character.draw(target, &self.state.character);
        if show_bounding_boxes {
            self.character
                .draw_debug_box(target, &self.state.character);
        }

        for (_, obstacle) in self.obstacles.iter() {
            obstacle.draw(target, show_bounding_boxes);
        }
    }

    fn spawn(&mut self, request: SpawnRequest, gpu: &mut dyn GpuDevice) -> Result<()> {
        match self
            .placement
            .spawn_batch(&request, &mut self.obstacles, gpu)
        {
            Ok(_) => Ok(()),
            Err(err @ Error::PlacementStarved { .. }) => {
                log::warn!("{err}; skipping the rest of the batch");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;
    use crate::{gpu::HeadlessDevice, shapes};

    fn game(gpu: &mut HeadlessDevice) -> Game {
        let config = GameConfig {
            seed: Some(5),
            ..Default::default()
        };
        let character = Mesh::new(shapes::cube(), gpu).unwrap();
        Game::new(config, character, gpu).unwrap()
    }

    #[test]
    fn new_game_places_the_initial_batch() {
        let mut gpu = HeadlessDevice::new();
        let game = game(&mut gpu);
        assert_eq!(game.obstacles().len(), 5);
        assert_eq!(game.ground().tiles().len(), 3);
        assert_eq!(game.state().phase, Phase::Running);

        for (_, obstacle) in game.obstacles().iter() {
            let p = obstacle.transform().position;
            assert!((-10.0..=10.0).contains(&p.x));
            assert!((-10.0..=0.0).contains(&p.z));
        }
        let character = game.character_box();
        assert!(character.min.y.abs() < 1e-5);
        assert!((character.center() - vec3(0.0, 0.5, 5.0)).length() < 1e-5);
    }

    #[test]
    fn delta_time_is_clamped() {
        let mut gpu = HeadlessDevice::new();
        let mut game = game(&mut gpu);
        let z = game.state().camera.position.z;
        game.update(10.0, &InputState::default(), &mut gpu).unwrap();
        let moved = z - game.state().camera.position.z;
        assert!(moved > 0.0 && moved < 0.2, "moved {moved}");
    }

    #[test]
    fn negative_spawn_depth_is_rejected_up_front() {
        let mut gpu = HeadlessDevice::new();
        let mut config = GameConfig::default();
        config.obstacles.spawn_depth = -20.0;
        let character = Mesh::new(shapes::cube(), &mut gpu).unwrap();
        assert!(matches!(
            Game::new(config, character, &mut gpu),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn zero_depth_spawn_band_keeps_running() {
        let mut gpu = HeadlessDevice::new();
        let mut config = GameConfig {
            seed: Some(8),
            ..Default::default()
        };
        config.obstacles.spawn_depth = 0.0;
        config.obstacles.spawn_distance = 0.5;
        let character = Mesh::new(shapes::cube(), &mut gpu).unwrap();
        let mut game = Game::new(config, character, &mut gpu).unwrap();

        for _ in 0..100 {
            game.update(0.05, &InputState::default(), &mut gpu).unwrap();
        }
    }
}
