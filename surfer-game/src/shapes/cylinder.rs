use std::f32::consts::TAU;

use glam::{vec2, vec3, Vec3};

use super::push_ring_sides;
use crate::mesh::{MeshData, Vertex};

/// Open cylinder of the given radius and height; side wall only.
pub fn cylinder(radius: f32, height: f32, sectors: u32) -> MeshData {
    frustum(radius, radius, height, sectors)
}

/// Open truncated cone; side wall only.
pub fn frustum(bottom_radius: f32, top_radius: f32, height: f32, sectors: u32) -> MeshData {
    let sectors = sectors.max(3);
    let half = height * 0.5;

    let mut data = MeshData::default();
    for i in 0..=sectors {
        let t = i as f32 / sectors as f32;
        let (sin, cos) = (t * TAU).sin_cos();
        let bottom = vec3(bottom_radius * cos, -half, bottom_radius * sin);
        let top = vec3(top_radius * cos, half, top_radius * sin);
        let tangent = vec3(-sin, 0.0, cos);
        let normal = (top - bottom).cross(tangent).normalize_or(Vec3::new(cos, 0.0, sin));

        data.vertices
            .push(Vertex::new(bottom, normal, vec2(t, 0.0)));
        data.vertices.push(Vertex::new(top, normal, vec2(t, 1.0)));
    }
    push_ring_sides(&mut data, 0, sectors);
    data
}
