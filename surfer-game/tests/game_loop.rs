use glam::vec3;
use surfer_game::{
    gpu::{DrawRecorder, HeadlessDevice},
    input::InputState,
    mesh::Mesh,
    shapes,
    state::Phase,
    Game, GameConfig,
};

const STEP: f32 = 0.03;

fn config() -> GameConfig {
    let mut config = GameConfig {
        seed: Some(17),
        ..Default::default()
    };
    config.obstacles.initial_count = 0;
    config.obstacles.spawn_distance = 1000.0;
    config
}

fn start(config: GameConfig, gpu: &mut HeadlessDevice) -> Game {
    let character = Mesh::new(shapes::cube(), gpu).unwrap();
    Game::new(config, character, gpu).unwrap()
}

fn idle() -> InputState {
    InputState::default()
}

#[test]
fn collision_fails_and_restart_resets() {
    let mut gpu = HeadlessDevice::new();
    let mut config = config();
    config.obstacles.initial_count = 1;
    config.obstacles.initial_x_range = (0.0, 0.0);
    config.obstacles.initial_z_range = (2.0, 2.0);
    let mut game = start(config, &mut gpu);
    assert_eq!(game.obstacles().len(), 1);

    let mut ticks = 0;
    while game.state().phase == Phase::Running {
        game.update(STEP, &idle(), &mut gpu).unwrap();
        ticks += 1;
        assert!(ticks < 500, "never hit the obstacle");
    }
    assert_eq!(game.state().phase, Phase::Failed);
    assert_eq!(game.state().speed, 0.0);
    assert_eq!(game.state().vertical_velocity, 0.0);

    let frozen = game.state().character;
    game.update(STEP, &idle(), &mut gpu).unwrap();
    assert_eq!(game.state().character, frozen);

    let restart = InputState {
        restart: true,
        ..Default::default()
    };
    game.update(STEP, &restart, &mut gpu).unwrap();
    assert_eq!(game.state().phase, Phase::Restarting);

    game.update(STEP, &restart, &mut gpu).unwrap();
    let state = game.state();
    assert_eq!(state.phase, Phase::Running);
    assert_eq!(state.camera.position, vec3(0.0, 3.0, 10.0));
    assert_eq!(state.speed, 4.0);
    assert_eq!(state.distance_since_spawn, 0.0);
    assert_eq!(state.character.position.z, 5.0);
    assert_eq!(game.obstacles().len(), 1);
    assert_eq!(game.ground().tiles().next().unwrap().position.z, 10.0);

    // Holding restart while running does nothing.
    game.update(STEP, &restart, &mut gpu).unwrap();
    assert_eq!(game.state().phase, Phase::Running);
}

#[test]
fn restart_only_listens_while_failed() {
    let mut gpu = HeadlessDevice::new();
    let mut game = start(config(), &mut gpu);
    let restart = InputState {
        restart: true,
        ..Default::default()
    };
    game.update(STEP, &restart, &mut gpu).unwrap();
    assert_eq!(game.state().phase, Phase::Running);
    assert!(game.state().camera.position.z < 10.0);
}

#[test]
fn held_jump_triggers_once() {
    let mut gpu = HeadlessDevice::new();
    let mut game = start(config(), &mut gpu);
    let jump = InputState {
        jump: true,
        ..Default::default()
    };

    let mut takeoffs = 0;
    let mut was_airborne = false;
    for _ in 0..200 {
        game.update(STEP, &jump, &mut gpu).unwrap();
        let airborne = game.state().airborne;
        if airborne && !was_airborne {
            takeoffs += 1;
        }
        was_airborne = airborne;
    }
    assert_eq!(takeoffs, 1);
    assert!(!game.state().airborne);
    assert_eq!(
        game.state().character.position.y,
        game.state().ground_height
    );

    game.update(STEP, &idle(), &mut gpu).unwrap();
    game.update(STEP, &jump, &mut gpu).unwrap();
    assert!(game.state().airborne);
}

#[test]
fn passed_obstacles_are_recycled() {
    let mut gpu = HeadlessDevice::new();
    let mut config = config();
    config.obstacles.initial_count = 1;
    config.obstacles.initial_x_range = (9.0, 9.0);
    config.obstacles.initial_z_range = (0.0, 0.0);
    let mut game = start(config, &mut gpu);
    let (id, _) = game.obstacles().iter().next().unwrap();
    assert_eq!(gpu.live_buffers(), 12);

    while game.state().camera.position.z > -0.5 {
        game.update(STEP, &idle(), &mut gpu).unwrap();
        assert_eq!(game.state().phase, Phase::Running);
    }
    assert!(!game.obstacles().contains(id));
    assert!(game.obstacles().is_empty());
    assert_eq!(gpu.live_buffers(), 8);
}

#[test]
fn batches_spawn_ahead_at_distance_intervals() {
    let mut gpu = HeadlessDevice::new();
    let mut config = config();
    config.obstacles.spawn_distance = 20.0;
    let spawn_window = config.obstacles.spawn_window;
    let spawn_depth = config.obstacles.spawn_depth;
    let mut game = start(config, &mut gpu);

    let start_z = game.state().character.position.z;
    while game.obstacles().is_empty() {
        game.update(STEP, &idle(), &mut gpu).unwrap();
        assert!(start_z - game.state().character.position.z < 21.0);
    }
    assert!(start_z - game.state().character.position.z >= 20.0 - 1e-3);
    assert_eq!(game.obstacles().len(), 5);
    assert_eq!(game.state().distance_since_spawn, 0.0);

    let character_z = game.state().character.position.z;
    for (_, obstacle) in game.obstacles().iter() {
        let p = obstacle.transform().position;
        assert!(p.z <= character_z - spawn_window + 1e-3);
        assert!(p.z >= character_z - spawn_window - spawn_depth - 1e-3);
        assert!(p.x.abs() <= 10.0);
    }
}

#[test]
fn ground_ring_follows_the_camera() {
    let mut gpu = HeadlessDevice::new();
    let mut game = start(config(), &mut gpu);
    let length = game.ground().tile_length();

    for _ in 0..3000 {
        game.update(STEP, &idle(), &mut gpu).unwrap();
    }
    let camera_z = game.state().camera.position.z;
    assert!(camera_z < -300.0);

    let tiles: Vec<f32> = game.ground().tiles().map(|t| t.position.z).collect();
    assert_eq!(tiles.len(), 3);
    for pair in tiles.windows(2) {
        assert_eq!(pair[0] - pair[1], length);
    }
    assert!(tiles[0] - length / 2.0 <= camera_z);
    assert!(tiles[0] + length / 2.0 >= camera_z);
}

#[test]
fn draw_covers_every_drawable() {
    let mut gpu = HeadlessDevice::new();
    let mut config = config();
    config.obstacles.initial_count = 3;
    let game = start(config, &mut gpu);
    let drawables = 3 + 1 + game.obstacles().len();

    let mut recorder = DrawRecorder::default();
    game.draw(&mut recorder, false);
    assert_eq!(recorder.draws.len(), drawables);

    let mut recorder = DrawRecorder::default();
    game.draw(&mut recorder, true);
    assert_eq!(recorder.draws.len(), 2 * drawables);
}

#[test]
fn dropping_the_game_releases_everything() {
    let mut gpu = HeadlessDevice::new();
    let mut config = config();
    config.obstacles.initial_count = 4;
    let game = start(config, &mut gpu);
    let live = gpu.live_buffers();
    assert_eq!(live, 4 * (2 + game.obstacles().len()));

    drop(game);
    assert_eq!(gpu.live_buffers(), 0);
    assert_eq!(gpu.released_buffers(), live);
}

#[test]
fn scroll_zooms_in_every_phase() {
    let mut gpu = HeadlessDevice::new();
    let mut game = start(config(), &mut gpu);
    let scroll = InputState {
        scroll: 5.0,
        ..Default::default()
    };
    game.update(STEP, &scroll, &mut gpu).unwrap();
    assert_eq!(game.state().fov_degrees, 40.0);
}
