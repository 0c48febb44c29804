// Generators return shape-local geometry centred on the origin, height along +Y, wound
// counter-clockwise seen from outside. Seam columns are emitted twice, at u = 0 and u = 1,
// since the texture coordinates differ. Poles are not duplicated beyond what their
// triangles use.

mod cube;
mod cylinder;
mod plane;
mod prism;
mod sphere;

use glam::{vec2, Vec3};

use crate::mesh::{MeshData, Vertex};

pub use cube::cube;
pub use cylinder::{cylinder, frustum};
pub use plane::plane;
pub use prism::prism;
pub use sphere::sphere;

/// Appends a quad spanning `center ± u ± v`; `u × v` must point along `normal`.
fn push_quad(data: &mut MeshData, center: Vec3, u: Vec3, v: Vec3, normal: Vec3) {
    let base = data.vertices.len() as u32;
    let corners = [
        (center - u - v, vec2(0.0, 0.0)),
        (center + u - v, vec2(1.0, 0.0)),
        (center + u + v, vec2(1.0, 1.0)),
        (center - u + v, vec2(0.0, 1.0)),
    ];
    data.vertices.extend(
        corners
            .into_iter()
            .map(|(position, tex_coord)| Vertex::new(position, normal, tex_coord)),
    );
    data.indices
        .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
}

/// Side wall between paired `(bottom, top)` vertices laid out as `2i, 2i + 1`.
fn push_ring_sides(data: &mut MeshData, base: u32, segments: u32) {
    for i in 0..segments {
        let bottom = base + 2 * i;
        let top = bottom + 1;
        let next_bottom = bottom + 2;
        let next_top = bottom + 3;
        data.indices
            .extend([bottom, top, next_bottom, top, next_top, next_bottom]);
    }
}
