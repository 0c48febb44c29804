use glam::{vec3, Quat};

use crate::{
    bounding_box::BoundingBox,
    config::{GameConfig, PlayerConfig},
    input::{Edges, InputState},
    transform::Transform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Failed,
    Restarting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub character: Transform,
    pub camera: Transform,
    pub light: Transform,
    pub speed: f32,
    pub vertical_velocity: f32,
    pub airborne: bool,
    /// Character y while standing on the ground
    pub ground_height: f32,
    pub distance_since_spawn: f32,
    pub phase: Phase,
    pub fov_degrees: f32,
    previous_input: InputState,
}

impl GameState {
    pub fn new(config: &GameConfig, character_bounds: &BoundingBox) -> Self {
        let player = &config.player;
        let camera = &config.camera;

        let rotation = Quat::from_rotation_y(player.start_yaw_degrees.to_radians());
        let resting = Transform {
            rotation,
            ..Default::default()
        }
        .transform_box(character_bounds);
        let ground_height = -resting.min.y;

        let character = Transform {
            position: vec3(
                player.start_position.x,
                ground_height,
                player.start_position.z,
            ),
            rotation,
            ..Default::default()
        };
        let camera_transform = Transform::from_position(camera.start_position);
        let light = Transform {
            position: camera.start_position,
            rotation: Quat::from_axis_angle(
                camera.light_axis.normalize(),
                45f32.to_radians(),
            ),
            ..Default::default()
        };

        Self {
            character,
            camera: camera_transform,
            light,
            speed: player.initial_speed,
            vertical_velocity: 0.0,
            airborne: false,
            ground_height,
            distance_since_spawn: 0.0,
            phase: Phase::Running,
            fov_degrees: camera.fov_degrees,
            previous_input: InputState::default(),
        }
    }

    /// Records this frame's input levels and returns the buttons newly pressed.
    pub fn observe_input(&mut self, input: &InputState) -> Edges {
        let edges = input.edges_since(&self.previous_input);
        self.previous_input = *input;
        self.previous_input.end_frame();
        edges
    }

    pub fn previous_input(&self) -> InputState {
        self.previous_input
    }

    /// Keeps edge detection continuous across a restart.
    pub fn carry_input(&mut self, previous: InputState) {
        self.previous_input = previous;
    }

    /// Moves character, camera and light forward and strafes the character.
    /// Returns the forward distance covered.
    pub fn advance(&mut self, input: &InputState, player: &PlayerConfig, delta_time: f32) -> f32 {
        self.speed += player.speed_ramp * delta_time;

        let front = self.camera.front();
        let distance = self.speed * delta_time * (1.0 + input.throttle());
        self.character.position += front * distance;
        self.camera.position += front * distance;
        self.light.position += front * distance;

        let right = self.camera.right();
        self.character.position += right * (input.strafe() * player.strafe_speed * delta_time);
        self.character.position.x = self
            .character
            .position
            .x
            .clamp(-player.lane_half_width, player.lane_half_width);

        distance
    }

    pub fn jump(&mut self, player: &PlayerConfig) -> bool {
        if self.airborne {
            return false;
        }
        self.vertical_velocity = player.jump_velocity;
        self.airborne = true;
        true
    }

    pub fn integrate_jump(&mut self, player: &PlayerConfig, delta_time: f32) {
        if !self.airborne {
            return;
        }

        self.character.position.y += self.vertical_velocity * delta_time;
        self.vertical_velocity += player.gravity * delta_time;
        if self.character.position.y <= self.ground_height {
            self.character.position.y = self.ground_height;
            self.vertical_velocity = 0.0;
            self.airborne = false;
        }
    }

    pub fn fail(&mut self) {
        self.speed = 0.0;
        self.vertical_velocity = 0.0;
        self.phase = Phase::Failed;
    }

    pub fn zoom(&mut self, scroll: f32, config: &GameConfig) {
        let camera = &config.camera;
        self.fov_degrees = (self.fov_degrees - scroll * camera.zoom_sensitivity)
            .clamp(camera.min_fov_degrees, camera.max_fov_degrees);
    }
}
