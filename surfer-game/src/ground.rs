use std::{collections::VecDeque, rc::Rc};

use glam::vec3;

use crate::{
    config::GroundConfig,
    error::Result,
    gpu::{DrawTarget, GpuDevice},
    mesh::Mesh,
    shapes,
    transform::Transform,
};

/// A ring of ground tiles sharing one mesh. The front tile is the one nearest the
/// camera; each following tile lies one tile length further along -Z.
pub struct Ground {
    mesh: Rc<Mesh>,
    tiles: VecDeque<Transform>,
    tile_length: f32,
    tile_count: usize,
    origin_z: f32,
}

impl Ground {
    /// Lays out the ring with its first tile centred on `origin_z`.
    pub fn new(config: &GroundConfig, origin_z: f32, gpu: &mut dyn GpuDevice) -> Result<Self> {
        let mesh = Mesh::new(shapes::plane(config.tile_width, config.tile_length), gpu)?;
        Ok(Self::with_mesh(Rc::new(mesh), config, origin_z))
    }

    pub fn with_mesh(mesh: Rc<Mesh>, config: &GroundConfig, origin_z: f32) -> Self {
        let mut ground = Self {
            mesh,
            tiles: VecDeque::with_capacity(config.tile_count),
            tile_length: config.tile_length,
            tile_count: config.tile_count,
            origin_z,
        };
        ground.reset();
        ground
    }

    pub fn reset(&mut self) {
        self.tiles.clear();
        for i in 0..self.tile_count {
            let z = self.origin_z - i as f32 * self.tile_length;
            self.tiles
                .push_back(Transform::from_position(vec3(0.0, 0.0, z)));
        }
    }

    /// Moves every tile that is entirely behind `camera_z` to the far end of the ring.
    /// Returns the number of tiles moved.
    pub fn recycle(&mut self, camera_z: f32) -> usize {
        let mut recycled = 0;
        while let Some(front) = self.tiles.front() {
            if front.position.z - self.tile_length * 0.5 <= camera_z {
                break;
            }
            let Some(mut tile) = self.tiles.pop_front() else {
                break;
            };
            let back_z = self.tiles.back().map_or(tile.position.z, |t| t.position.z);
            tile.position.z = back_z - self.tile_length;
            self.tiles.push_back(tile);
            recycled += 1;
        }
        if recycled > 0 {
            log::debug!("Recycled {recycled} ground tiles at camera z {camera_z}");
        }
        recycled
    }

    pub fn tiles(&self) -> impl ExactSizeIterator<Item = &Transform> + '_ {
        self.tiles.iter()
    }

    pub fn tile_length(&self) -> f32 {
        self.tile_length
    }

    pub fn mesh(&self) -> &Rc<Mesh> {
        &self.mesh
    }

    pub fn draw(&self, target: &mut dyn DrawTarget, show_bounding_boxes: bool) {
        for tile in &self.tiles {
            self.mesh.draw(target, tile);
            if show_bounding_boxes {
                self.mesh.draw_debug_box(target, tile);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{DrawRecorder, HeadlessDevice};

    fn ground(gpu: &mut HeadlessDevice) -> Ground {
        let config = GroundConfig {
            tile_width: 10.0,
            tile_length: 10.0,
            tile_count: 3,
        };
        Ground::new(&config, 0.0, gpu).unwrap()
    }

    fn assert_contiguous(ground: &Ground) {
        let z: Vec<f32> = ground.tiles().map(|t| t.position.z).collect();
        assert_eq!(z.len(), 3);
        for pair in z.windows(2) {
            assert_eq!(pair[0] - pair[1], ground.tile_length());
        }
    }

    #[test]
    fn tiles_stay_contiguous_through_recycling() {
        let mut gpu = HeadlessDevice::new();
        let mut ground = ground(&mut gpu);
        assert_contiguous(&ground);

        let mut camera_z = 0.0;
        let mut total = 0;
        for _ in 0..500 {
            camera_z -= 0.7;
            total += ground.recycle(camera_z);
            assert_contiguous(&ground);
            let front = ground.tiles().next().unwrap();
            assert!(front.position.z - 5.0 <= camera_z);
        }
        assert!(total > 30);
    }

    #[test]
    fn large_steps_recycle_several_tiles() {
        let mut gpu = HeadlessDevice::new();
        let mut ground = ground(&mut gpu);
        assert_eq!(ground.recycle(-4.0), 0);
        assert_eq!(ground.recycle(-24.0), 2);
        assert_eq!(ground.tiles().next().unwrap().position.z, -20.0);
        assert_contiguous(&ground);

        ground.reset();
        assert_eq!(ground.tiles().next().unwrap().position.z, 0.0);
    }

    #[test]
    fn tiles_share_one_mesh() {
        let mut gpu = HeadlessDevice::new();
        let ground = ground(&mut gpu);
        assert_eq!(gpu.live_buffers(), 4);

        let mut recorder = DrawRecorder::default();
        ground.draw(&mut recorder, false);
        assert_eq!(recorder.draws.len(), 3);
        assert!(recorder
            .draws
            .iter()
            .all(|d| d.vertex_buffer == recorder.draws[0].vertex_buffer));
    }
}
