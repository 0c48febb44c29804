use std::{
    collections::BTreeMap,
    fmt,
    num::NonZeroU32,
    sync::mpsc::{self, Receiver, Sender},
};

use glam::Mat4;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(NonZeroU32);

impl BufferId {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

/// Exclusive ownership of one GPU buffer. Not cloneable; dropping it queues the id for
/// release, and the device frees the buffer on its next `collect_garbage`.
pub struct BufferHandle {
    id: BufferId,
    releases: Sender<BufferId>,
}

impl BufferHandle {
    pub fn id(&self) -> BufferId {
        self.id
    }
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BufferHandle").field(&self.id.get()).finish()
    }
}

impl Drop for BufferHandle {
    fn drop(&mut self) {
        // The device may already be gone at shutdown, in which case so is the buffer.
        let _ = self.releases.send(self.id);
    }
}

pub struct BufferRegistry {
    next_id: u32,
    sender: Sender<BufferId>,
    receiver: Receiver<BufferId>,
}

impl BufferRegistry {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            next_id: 1,
            sender,
            receiver,
        }
    }

    pub fn allocate(&mut self) -> Result<BufferHandle> {
        let id = NonZeroU32::new(self.next_id)
            .ok_or_else(|| Error::Gpu("buffer ids exhausted".to_string()))?;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(BufferHandle {
            id: BufferId(id),
            releases: self.sender.clone(),
        })
    }

    pub fn released(&self) -> impl Iterator<Item = BufferId> + '_ {
        self.receiver.try_iter()
    }
}

impl Default for BufferRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub trait GpuDevice {
    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        contents: &[u8],
    ) -> Result<BufferHandle>;
}

pub struct DrawCall<'a> {
    pub vertex_buffer: &'a BufferHandle,
    pub index_buffer: &'a BufferHandle,
    pub index_count: u32,
    pub topology: Topology,
    pub model: Mat4,
}

pub trait DrawTarget {
    fn draw_indexed(&mut self, call: DrawCall<'_>);
}

#[derive(Debug, Clone, Copy)]
struct HeadlessBuffer {
    usage: BufferUsage,
    size: usize,
}

/// A device that keeps buffer bookkeeping in memory only.
#[derive(Default)]
pub struct HeadlessDevice {
    registry: BufferRegistry,
    buffers: BTreeMap<BufferId, HeadlessBuffer>,
    released: usize,
    fail_after: Option<usize>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every allocation after the first `allocations` fail.
    pub fn fail_after(allocations: usize) -> Self {
        Self {
            fail_after: Some(allocations),
            ..Default::default()
        }
    }

    pub fn collect_garbage(&mut self) {
        for id in self.registry.released() {
            if self.buffers.remove(&id).is_some() {
                self.released += 1;
            }
        }
    }

    pub fn live_buffers(&mut self) -> usize {
        self.collect_garbage();
        self.buffers.len()
    }

    pub fn released_buffers(&mut self) -> usize {
        self.collect_garbage();
        self.released
    }

    pub fn buffer_size(&self, id: BufferId) -> Option<usize> {
        self.buffers.get(&id).map(|b| b.size)
    }

    pub fn buffer_usage(&self, id: BufferId) -> Option<BufferUsage> {
        self.buffers.get(&id).map(|b| b.usage)
    }
}

impl GpuDevice for HeadlessDevice {
    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        contents: &[u8],
    ) -> Result<BufferHandle> {
        self.collect_garbage();
        if let Some(remaining) = self.fail_after.as_mut() {
            if *remaining == 0 {
                return Err(Error::Gpu(format!("out of memory allocating {label}")));
            }
            *remaining -= 1;
        }

        let handle = self.registry.allocate()?;
        self.buffers.insert(
            handle.id(),
            HeadlessBuffer {
                usage,
                size: contents.len(),
            },
        );
        Ok(handle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedDraw {
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
    pub index_count: u32,
    pub topology: Topology,
    pub model: Mat4,
}

#[derive(Debug, Default)]
pub struct DrawRecorder {
    pub draws: Vec<RecordedDraw>,
}

impl DrawTarget for DrawRecorder {
    fn draw_indexed(&mut self, call: DrawCall<'_>) {
        self.draws.push(RecordedDraw {
            vertex_buffer: call.vertex_buffer.id(),
            index_buffer: call.index_buffer.id(),
            index_count: call.index_count,
            topology: call.topology,
            model: call.model,
        });
    }
}
