use glam::Vec3;

use super::push_quad;
use crate::mesh::MeshData;

/// Unit cube spanning -0.5..0.5 with four unshared vertices per face.
pub fn cube() -> MeshData {
    // (normal, u, v) with u × v = normal
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut data = MeshData::default();
    for (normal, u, v) in faces {
        push_quad(&mut data, normal * 0.5, u * 0.5, v * 0.5, normal);
    }
    data
}
