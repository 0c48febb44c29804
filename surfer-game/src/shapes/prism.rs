use std::f32::consts::TAU;

use glam::{vec2, vec3, Vec3};

use super::push_ring_sides;
use crate::mesh::{MeshData, Vertex};

/// Closed regular prism with `sides` flat faces and both caps.
pub fn prism(radius: f32, height: f32, sides: u32) -> MeshData {
    let sides = sides.max(3);
    let half = height * 0.5;
    let corner = |i: u32| {
        let (sin, cos) = (i as f32 / sides as f32 * TAU).sin_cos();
        vec3(radius * cos, 0.0, radius * sin)
    };

    let mut data = MeshData::default();

    for i in 0..sides {
        let (a, b) = (corner(i), corner(i + 1));
        let normal = ((a + b) * 0.5).normalize_or(Vec3::X);
        let base = data.vertices.len() as u32;
        for (x, p) in [(0.0, a), (1.0, b)] {
            data.vertices.push(Vertex::new(
                p - Vec3::Y * half,
                normal,
                vec2(x, 0.0),
            ));
            data.vertices
                .push(Vertex::new(p + Vec3::Y * half, normal, vec2(x, 1.0)));
        }
        push_ring_sides(&mut data, base, 1);
    }

    for (y, normal) in [(half, Vec3::Y), (-half, Vec3::NEG_Y)] {
        let center = data.vertices.len() as u32;
        data.vertices
            .push(Vertex::new(vec3(0.0, y, 0.0), normal, vec2(0.5, 0.5)));
        for i in 0..sides {
            let p = corner(i);
            let uv = vec2(p.x / radius, p.z / radius) * 0.5 + 0.5;
            data.vertices
                .push(Vertex::new(p + Vec3::Y * y, normal, uv));
        }

        for i in 0..sides {
            let current = center + 1 + i;
            let next = center + 1 + (i + 1) % sides;
            if y > 0.0 {
                data.indices.extend([center, next, current]);
            } else {
                data.indices.extend([center, current, next]);
            }
        }
    }

    data
}
