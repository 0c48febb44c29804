use std::f32::consts::{PI, TAU};

use glam::{vec2, vec3, Vec3};

use crate::mesh::{MeshData, Vertex};

/// UV sphere. Rows run from the north pole (stack 0) to the south pole.
pub fn sphere(radius: f32, sectors: u32, stacks: u32) -> MeshData {
    let sectors = sectors.max(3);
    let stacks = stacks.max(2);
    let mut data = MeshData::default();

    // Each pole gets one vertex per cell, centred on the cell's u.
    let push_pole = |data: &mut MeshData, normal: Vec3, v: f32| {
        for j in 0..sectors {
            let u = (j as f32 + 0.5) / sectors as f32;
            data.vertices
                .push(Vertex::new(normal * radius, normal, vec2(u, v)));
        }
    };

    push_pole(&mut data, Vec3::Y, 0.0);
    for i in 1..stacks {
        let v = i as f32 / stacks as f32;
        let (ring, y) = (v * PI).sin_cos();
        for j in 0..=sectors {
            let u = j as f32 / sectors as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let normal = vec3(ring * cos, y, ring * sin);
            data.vertices
                .push(Vertex::new(normal * radius, normal, vec2(u, v)));
        }
    }
    push_pole(&mut data, Vec3::NEG_Y, 1.0);

    let row = sectors + 1;
    let ring_start = |i: u32| sectors + (i - 1) * row;
    let south = ring_start(stacks);
    for j in 0..sectors {
        let top = ring_start(1) + j;
        data.indices.extend([top, j, top + 1]);

        let bottom = ring_start(stacks - 1) + j;
        data.indices.extend([bottom, bottom + 1, south + j]);
    }
    for i in 1..stacks - 1 {
        for j in 0..sectors {
            let first = ring_start(i) + j;
            let second = first + row;
            data.indices
                .extend([first, first + 1, second, second, first + 1, second + 1]);
        }
    }
    data
}
