use glam::{vec3, Vec3};
use rand::Rng;

use crate::{
    bounding_box::BoundingBox,
    error::Result,
    gpu::{DrawTarget, GpuDevice},
    mesh::{Mesh, MeshData},
    shapes,
    transform::Transform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Cube,
    Sphere,
    Cylinder,
    Pillar,
    Prism,
    Frustum,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Cube,
        ShapeKind::Sphere,
        ShapeKind::Cylinder,
        ShapeKind::Pillar,
        ShapeKind::Prism,
        ShapeKind::Frustum,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn geometry<R: Rng + ?Sized>(self, rng: &mut R) -> MeshData {
        match self {
            ShapeKind::Cube => shapes::cube(),
            ShapeKind::Sphere => shapes::sphere(0.5, 24, 16),
            ShapeKind::Cylinder => shapes::cylinder(0.5, 1.0, 24),
            ShapeKind::Pillar => shapes::cylinder(0.25, 1.0, 12),
            ShapeKind::Prism => shapes::prism(0.5, 1.0, rng.random_range(3..=6)),
            ShapeKind::Frustum => shapes::frustum(0.5, 0.25, 1.0, 24),
        }
    }

    pub fn scale(self, height: f32, length: f32) -> Vec3 {
        match self {
            ShapeKind::Sphere => Vec3::splat(height),
            _ => vec3(length, height, length),
        }
    }
}

/// A placed obstacle. Spheres also carry their world radius for the analytic test.
pub struct Obstacle {
    mesh: Mesh,
    transform: Transform,
    shape: ShapeKind,
    radius: Option<f32>,
}

impl Obstacle {
    /// Places `mesh` at `(x, z)` with its lowest point resting on y = 0.
    pub fn new(mesh: Mesh, shape: ShapeKind, x: f32, z: f32, height: f32, length: f32) -> Self {
        let mut transform = Transform {
            position: vec3(x, 0.0, z),
            scale: shape.scale(height, length),
            ..Default::default()
        };
        let world = transform.transform_box(&mesh.bounding_box());
        transform.position.y -= world.min.y;

        let radius = (shape == ShapeKind::Sphere).then_some(0.5 * height);
        Self {
            mesh,
            transform,
            shape,
            radius,
        }
    }

    pub fn generate<R: Rng + ?Sized>(
        shape: ShapeKind,
        x: f32,
        z: f32,
        height: f32,
        length: f32,
        rng: &mut R,
        gpu: &mut dyn GpuDevice,
    ) -> Result<Self> {
        let mesh = Mesh::new(shape.geometry(rng), gpu)?;
        Ok(Self::new(mesh, shape, x, z, height, length))
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn radius(&self) -> Option<f32> {
        self.radius
    }

    pub fn world_box(&self) -> BoundingBox {
        self.transform.transform_box(&self.mesh.bounding_box())
    }

    pub fn collides_with(&self, character: &BoundingBox) -> bool {
        match self.radius {
            Some(radius) => character.intersects_sphere(self.transform.position, radius),
            None => self.world_box().intersects(character),
        }
    }

    pub fn draw(&self, target: &mut dyn DrawTarget, show_bounding_box: bool) {
        self.mesh.draw(target, &self.transform);
        if show_bounding_box {
            self.mesh.draw_debug_box(target, &self.transform);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObstacleId {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    obstacle: Option<Obstacle>,
}

/// Unordered obstacle storage. Removing an obstacle invalidates its id; the slot is
/// reused with a bumped generation.
#[derive(Default)]
pub struct ObstacleSet {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, obstacle: Obstacle) -> ObstacleId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.obstacle = Some(obstacle);
            return ObstacleId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            obstacle: Some(obstacle),
        });
        ObstacleId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.obstacle.as_ref())
    }

    pub fn contains(&self, id: ObstacleId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: ObstacleId) -> Option<Obstacle> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let obstacle = slot.obstacle.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(obstacle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObstacleId, &Obstacle)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.obstacle.as_ref().map(|obstacle| {
                (
                    ObstacleId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    obstacle,
                )
            })
        })
    }

    /// Drops every obstacle for which `keep` returns false and returns how many went.
    pub fn retain(&mut self, mut keep: impl FnMut(&Obstacle) -> bool) -> usize {
        let doomed: Vec<ObstacleId> = self
            .iter()
            .filter(|(_, obstacle)| !keep(obstacle))
            .map(|(id, _)| id)
            .collect();
        for &id in &doomed {
            self.remove(id);
        }
        doomed.len()
    }

    pub fn clear(&mut self) {
        let ids: Vec<ObstacleId> = self.iter().map(|(id, _)| id).collect();
        for id in ids {
            self.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::gpu::HeadlessDevice;

    fn obstacle(gpu: &mut HeadlessDevice, shape: ShapeKind, x: f32, z: f32) -> Obstacle {
        let mut rng = StdRng::seed_from_u64(7);
        Obstacle::generate(shape, x, z, 2.0, 1.0, &mut rng, gpu).unwrap()
    }

    #[test]
    fn obstacles_rest_on_the_ground() {
        let mut gpu = HeadlessDevice::new();
        for shape in ShapeKind::ALL {
            let obstacle = obstacle(&mut gpu, shape, 3.0, -4.0);
            let world = obstacle.world_box();
            assert!(world.min.y.abs() < 1e-5, "{shape:?} floats at {}", world.min.y);
            assert_eq!(obstacle.transform().position.x, 3.0);
            assert_eq!(obstacle.transform().position.z, -4.0);
        }
    }

    #[test]
    fn sphere_uses_uniform_scale_and_radius() {
        let mut gpu = HeadlessDevice::new();
        let sphere = obstacle(&mut gpu, ShapeKind::Sphere, 0.0, 0.0);
        assert_eq!(sphere.transform().scale, Vec3::splat(2.0));
        assert_eq!(sphere.radius(), Some(1.0));
        assert!((sphere.transform().position.y - 1.0).abs() < 1e-5);

        let cube = obstacle(&mut gpu, ShapeKind::Cube, 0.0, 0.0);
        assert_eq!(cube.transform().scale, vec3(1.0, 2.0, 1.0));
        assert_eq!(cube.radius(), None);
    }

    #[test]
    fn collision_uses_sphere_or_box() {
        let mut gpu = HeadlessDevice::new();
        let sphere = obstacle(&mut gpu, ShapeKind::Sphere, 0.0, 0.0);
        // Touches the sphere's bounding box corner region but not the sphere.
        let corner = BoundingBox::new(vec3(0.8, 1.8, 0.8), vec3(1.5, 2.5, 1.5));
        assert!(!sphere.collides_with(&corner));

        let cube = obstacle(&mut gpu, ShapeKind::Cube, 0.0, 0.0);
        assert!(!cube.collides_with(&corner));
        let overlapping = BoundingBox::new(vec3(0.4, 1.0, 0.4), vec3(1.0, 1.5, 1.0));
        assert!(cube.collides_with(&overlapping));
        assert!(sphere.collides_with(&overlapping));
    }

    #[test]
    fn removed_ids_go_stale() {
        let mut gpu = HeadlessDevice::new();
        let mut set = ObstacleSet::new();
        let a = set.insert(obstacle(&mut gpu, ShapeKind::Cube, 0.0, 0.0));
        let b = set.insert(obstacle(&mut gpu, ShapeKind::Prism, 5.0, 0.0));
        assert_eq!(set.len(), 2);

        assert!(set.remove(a).is_some());
        assert!(!set.contains(a));
        assert!(set.remove(a).is_none());

        let c = set.insert(obstacle(&mut gpu, ShapeKind::Pillar, 9.0, 0.0));
        assert_ne!(a, c);
        assert!(set.get(a).is_none());
        assert_eq!(set.get(c).unwrap().shape(), ShapeKind::Pillar);
        assert!(set.contains(b));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn retain_and_clear_release_meshes() {
        let mut gpu = HeadlessDevice::new();
        let mut set = ObstacleSet::new();
        for z in [-3.0, 2.0, 4.0] {
            set.insert(obstacle(&mut gpu, ShapeKind::Cube, 0.0, z));
        }
        assert_eq!(gpu.live_buffers(), 12);

        let removed = set.retain(|o| o.transform().position.z < 1.0);
        assert_eq!(removed, 2);
        assert_eq!(set.len(), 1);
        assert_eq!(gpu.live_buffers(), 4);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(gpu.live_buffers(), 0);
    }
}
