use std::collections::HashMap;

use wgpu::util::DeviceExt;

use surfer_game::{
    gpu::{BufferHandle, BufferId, BufferRegistry, BufferUsage, GpuDevice},
    Result,
};

/// Backs the game's buffer handles with real wgpu buffers.
pub struct WgpuDevice {
    device: wgpu::Device,
    registry: BufferRegistry,
    buffers: HashMap<BufferId, wgpu::Buffer>,
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device) -> Self {
        Self {
            device,
            registry: BufferRegistry::new(),
            buffers: HashMap::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(&id)
    }

    /// Destroys the buffers of every handle dropped since the last call.
    pub fn collect_garbage(&mut self) {
        let mut released = 0;
        for id in self.registry.released() {
            if let Some(buffer) = self.buffers.remove(&id) {
                buffer.destroy();
                released += 1;
            }
        }
        if released > 0 {
            log::debug!("Released {released} GPU buffers, {} live", self.buffers.len());
        }
    }
}

impl GpuDevice for WgpuDevice {
    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        contents: &[u8],
    ) -> Result<BufferHandle> {
        self.collect_garbage();
        let handle = self.registry.allocate()?;

        let usage = match usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });

        self.buffers.insert(handle.id(), buffer);
        Ok(handle)
    }
}
