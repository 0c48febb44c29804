use glam::Vec3;

use super::push_quad;
use crate::mesh::MeshData;

/// `width` × `length` rectangle in the y = 0 plane facing +Y.
pub fn plane(width: f32, length: f32) -> MeshData {
    let mut data = MeshData::default();
    push_quad(
        &mut data,
        Vec3::ZERO,
        Vec3::X * (width * 0.5),
        Vec3::NEG_Z * (length * 0.5),
        Vec3::Y,
    );
    data
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;
    use crate::shapes::test_support::assert_indices_in_range;

    #[test]
    fn plane_faces_up() {
        let data = plane(20.0, 50.0);
        assert_eq!(data.vertex_count(), 4);
        assert_eq!(data.triangle_count(), 2);
        assert_indices_in_range(&data);

        for triangle in data.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|k| data.vertices[triangle[k] as usize].position);
            assert!((b - a).cross(c - a).y > 0.0);
        }

        let bounds = data.bounding_box().unwrap();
        assert_eq!(bounds.min, vec3(-10.0, 0.0, -25.0));
        assert_eq!(bounds.max, vec3(10.0, 0.0, 25.0));
    }
}
