use glam::{Mat4, Vec3};

use surfer_game::state::GameState;

#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct CameraUniform {
    view_projection: [[f32; 4]; 4],
    light_direction: [f32; 4],
    eye: [f32; 4],
}

pub struct Camera {
    eye: Vec3,
    dir: Vec3,
    up: Vec3,
    light_direction: Vec3,
    pub aspect: f32,
    fovy: f32,
    znear: f32,
    zfar: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        Self {
            eye: Vec3::ZERO,
            dir: Vec3::NEG_Z,
            up: Vec3::Y,
            light_direction: Vec3::NEG_Y,
            aspect,
            fovy: 50.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }

    pub fn update(&mut self, state: &GameState) {
        self.eye = state.camera.position;
        self.dir = state.camera.front();
        self.up = state.camera.up();
        self.light_direction = state.light.front();
        self.fovy = state.fov_degrees;
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        let view = Mat4::look_to_rh(self.eye, self.dir, self.up);
        let proj = Mat4::perspective_rh(self.fovy.to_radians(), self.aspect, self.znear, self.zfar);

        proj * view
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_projection: self.build_view_projection_matrix().to_cols_array_2d(),
            light_direction: self.light_direction.extend(0.0).to_array(),
            eye: self.eye.extend(1.0).to_array(),
        }
    }
}
