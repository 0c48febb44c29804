use std::{
    collections::HashMap,
    fs::File,
    hash::{Hash, Hasher},
    io::{self, BufWriter, Write},
    path::Path,
};

use glam::{vec2, vec3, Vec2, Vec3};

use crate::{
    bounding_box::BoundingBox,
    error::{Attribute, Error, Result},
    gpu::{BufferHandle, BufferUsage, DrawCall, DrawTarget, GpuDevice, Topology},
    transform::Transform,
};

// Edges between the corners of BoundingBox::corners.
const DEBUG_BOX_INDICES: [u32; 24] = [
    0, 1, 0, 2, 0, 4, 3, 1, 3, 2, 3, 7, 5, 4, 5, 1, 5, 7, 6, 4, 6, 7, 6, 2,
];

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coord: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

// Bitwise, so that -0.0 and 0.0 stay distinct and the relation is a true equivalence.
impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        bytemuck::bytes_of(self).hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCorner {
    pub position: usize,
    pub normal: Option<usize>,
    pub tex_coord: Option<usize>,
}

impl FaceCorner {
    pub fn new(position: usize, normal: Option<usize>, tex_coord: Option<usize>) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeshSource {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub faces: Vec<Vec<FaceCorner>>,
}

impl MeshSource {
    /// Reads a Wavefront OBJ file, merging all of its objects into one source.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                single_index: false,
                triangulate: false,
                ignore_points: true,
                ignore_lines: true,
                ..Default::default()
            },
        )?;

        let mut source = Self::default();
        for model in models {
            let mesh = model.mesh;
            let position_base = source.positions.len();
            let normal_base = source.normals.len();
            let tex_coord_base = source.tex_coords.len();

            source.positions.extend(
                mesh.positions
                    .chunks_exact(3)
                    .map(|p| vec3(p[0], p[1], p[2])),
            );
            source
                .normals
                .extend(mesh.normals.chunks_exact(3).map(|n| vec3(n[0], n[1], n[2])));
            source
                .tex_coords
                .extend(mesh.texcoords.chunks_exact(2).map(|t| vec2(t[0], t[1])));

            let arities: Vec<usize> = if mesh.face_arities.is_empty() {
                vec![3; mesh.indices.len() / 3]
            } else {
                mesh.face_arities.iter().map(|&a| a as usize).collect()
            };

            let mut start = 0;
            for arity in arities {
                let face = (start..start + arity)
                    .map(|i| FaceCorner {
                        position: position_base + mesh.indices[i] as usize,
                        normal: mesh.normal_indices.get(i).map(|&n| normal_base + n as usize),
                        tex_coord: mesh
                            .texcoord_indices
                            .get(i)
                            .map(|&t| tex_coord_base + t as usize),
                    })
                    .collect();
                source.faces.push(face);
                start += arity;
            }
        }

        log::debug!(
            "Loaded {} faces from {}",
            source.faces.len(),
            path.display()
        );
        Ok(source)
    }

    fn vertex(&self, face: usize, corner: &FaceCorner) -> Result<Vertex> {
        let position = lookup(&self.positions, face, Attribute::Position, corner.position)?;
        let normal = corner
            .normal
            .map(|i| lookup(&self.normals, face, Attribute::Normal, i))
            .transpose()?
            .unwrap_or(Vec3::ZERO);
        let tex_coord = corner
            .tex_coord
            .map(|i| lookup(&self.tex_coords, face, Attribute::TexCoord, i))
            .transpose()?
            .unwrap_or(Vec2::ZERO);
        Ok(Vertex::new(position, normal, tex_coord))
    }
}

fn lookup<T: Copy>(values: &[T], face: usize, attribute: Attribute, index: usize) -> Result<T> {
    values.get(index).copied().ok_or(Error::IndexOutOfRange {
        face,
        attribute,
        index,
        len: values.len(),
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Assembles triangles from face records; polygons are fan-triangulated.
    pub fn from_source(source: &MeshSource) -> Result<Self> {
        let mut builder = Deduplicator::default();
        for (face_index, face) in source.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(Error::DegenerateFace {
                    face: face_index,
                    corners: face.len(),
                });
            }

            let corners = face
                .iter()
                .map(|corner| source.vertex(face_index, corner))
                .collect::<Result<Vec<_>>>()?;
            for i in 1..corners.len() - 1 {
                builder.push(corners[0]);
                builder.push(corners[i]);
                builder.push(corners[i + 1]);
            }
        }
        Ok(builder.finish())
    }

    /// Validates pre-built arrays and merges duplicate vertices. Vertices that no index
    /// refers to are dropped.
    pub fn from_arrays(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(Error::IndexCount(indices.len()));
        }
        if let Some(position) = indices.iter().position(|&i| i as usize >= vertices.len()) {
            return Err(Error::IndexOutOfRange {
                face: position / 3,
                attribute: Attribute::Position,
                index: indices[position] as usize,
                len: vertices.len(),
            });
        }

        let mut builder = Deduplicator::default();
        for &i in &indices {
            builder.push(vertices[i as usize]);
        }
        Ok(builder.finish())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter().map(|v| v.position))
    }

    /// Writes `v`/`vn`/`vt` lists (each deduplicated, in first-use order) and one `f` per
    /// triangle with 1-based `position/texcoord/normal` references.
    pub fn write_obj<W: Write>(&self, mut out: W) -> io::Result<()> {
        let mut positions = HashMap::new();
        let mut normals = HashMap::new();
        let mut tex_coords = HashMap::new();

        for v in &self.vertices {
            let key = bits3(v.position);
            if !positions.contains_key(&key) {
                positions.insert(key, positions.len() + 1);
                writeln!(out, "v {} {} {}", v.position.x, v.position.y, v.position.z)?;
            }
            let key = bits3(v.normal);
            if !normals.contains_key(&key) {
                normals.insert(key, normals.len() + 1);
                writeln!(out, "vn {} {} {}", v.normal.x, v.normal.y, v.normal.z)?;
            }
            let key = bits2(v.tex_coord);
            if !tex_coords.contains_key(&key) {
                tex_coords.insert(key, tex_coords.len() + 1);
                writeln!(out, "vt {} {}", v.tex_coord.x, v.tex_coord.y)?;
            }
        }

        for triangle in self.indices.chunks_exact(3) {
            write!(out, "f")?;
            for &i in triangle {
                let v = &self.vertices[i as usize];
                let p = positions[&bits3(v.position)];
                let t = tex_coords[&bits2(v.tex_coord)];
                let n = normals[&bits3(v.normal)];
                write!(out, " {p}/{t}/{n}")?;
            }
            writeln!(out)?;
        }
        out.flush()
    }
}

fn bits3(v: Vec3) -> [u32; 3] {
    bytemuck::cast(v)
}

fn bits2(v: Vec2) -> [u32; 2] {
    bytemuck::cast(v)
}

#[derive(Default)]
struct Deduplicator {
    lookup: HashMap<Vertex, u32>,
    data: MeshData,
}

impl Deduplicator {
    fn push(&mut self, vertex: Vertex) {
        let vertices = &mut self.data.vertices;
        let index = *self.lookup.entry(vertex).or_insert_with(|| {
            vertices.push(vertex);
            (vertices.len() - 1) as u32
        });
        self.data.indices.push(index);
    }

    fn finish(self) -> MeshData {
        self.data
    }
}

struct MeshResources {
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    box_vertex_buffer: BufferHandle,
    box_index_buffer: BufferHandle,
}

impl MeshResources {
    fn upload(data: &MeshData, bounds: &BoundingBox, gpu: &mut dyn GpuDevice) -> Result<Self> {
        let vertex_buffer = gpu.create_buffer(
            "Mesh Vertex Buffer",
            BufferUsage::Vertex,
            bytemuck::cast_slice(&data.vertices),
        )?;
        let index_buffer = gpu.create_buffer(
            "Mesh Index Buffer",
            BufferUsage::Index,
            bytemuck::cast_slice(&data.indices),
        )?;
        let box_vertex_buffer = gpu.create_buffer(
            "Debug Box Vertex Buffer",
            BufferUsage::Vertex,
            bytemuck::cast_slice(&bounds.corners()),
        )?;
        let box_index_buffer = gpu.create_buffer(
            "Debug Box Index Buffer",
            BufferUsage::Index,
            bytemuck::cast_slice(&DEBUG_BOX_INDICES),
        )?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            box_vertex_buffer,
            box_index_buffer,
        })
    }
}

/// Geometry plus the GPU resources it exclusively owns.
///
/// The resources are released when the mesh is dropped or [`Mesh::cleanup`] is called,
/// whichever comes first. A released mesh keeps its geometry but no longer draws.
pub struct Mesh {
    data: MeshData,
    bounding_box: BoundingBox,
    resources: Option<MeshResources>,
}

impl Mesh {
    pub fn new(data: MeshData, gpu: &mut dyn GpuDevice) -> Result<Self> {
        let data = MeshData::from_arrays(data.vertices, data.indices)?;
        let bounding_box = data.bounding_box().ok_or(Error::EmptyMesh)?;
        let resources = MeshResources::upload(&data, &bounding_box, gpu)?;
        Ok(Self {
            data,
            bounding_box,
            resources: Some(resources),
        })
    }

    pub fn from_source(source: &MeshSource, gpu: &mut dyn GpuDevice) -> Result<Self> {
        Self::new(MeshData::from_source(source)?, gpu)
    }

    pub fn from_arrays(
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        gpu: &mut dyn GpuDevice,
    ) -> Result<Self> {
        Self::new(MeshData { vertices, indices }, gpu)
    }

    pub fn load_obj(path: impl AsRef<Path>, gpu: &mut dyn GpuDevice) -> Result<Self> {
        Self::from_source(&MeshSource::load_obj(path)?, gpu)
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn vertex_count(&self) -> usize {
        self.data.vertex_count()
    }

    pub fn face_count(&self) -> usize {
        self.data.triangle_count()
    }

    pub fn is_released(&self) -> bool {
        self.resources.is_none()
    }

    pub fn cleanup(&mut self) {
        self.resources = None;
    }

    pub fn draw(&self, target: &mut dyn DrawTarget, transform: &Transform) {
        let Some(resources) = &self.resources else {
            return;
        };
        target.draw_indexed(DrawCall {
            vertex_buffer: &resources.vertex_buffer,
            index_buffer: &resources.index_buffer,
            index_count: self.data.indices.len() as u32,
            topology: Topology::Triangles,
            model: transform.local_matrix(),
        });
    }

    pub fn draw_debug_box(&self, target: &mut dyn DrawTarget, transform: &Transform) {
        let Some(resources) = &self.resources else {
            return;
        };
        target.draw_indexed(DrawCall {
            vertex_buffer: &resources.box_vertex_buffer,
            index_buffer: &resources.box_index_buffer,
            index_count: DEBUG_BOX_INDICES.len() as u32,
            topology: Topology::Lines,
            model: transform.local_matrix(),
        });
    }

    pub fn export_obj(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.data.write_obj(BufWriter::new(file))?;
        log::info!(
            "Exported {} triangles to {}",
            self.face_count(),
            path.as_ref().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::gpu::{DrawRecorder, HeadlessDevice};

    use super::*;

    fn quad_source() -> MeshSource {
        MeshSource {
            positions: vec![
                vec3(0.0, 0.0, 0.0),
                vec3(1.0, 0.0, 0.0),
                vec3(1.0, 1.0, 0.0),
                vec3(0.0, 1.0, 0.0),
            ],
            normals: vec![Vec3::Z],
            tex_coords: vec![vec2(0.0, 0.0), vec2(1.0, 1.0)],
            faces: vec![
                vec![
                    FaceCorner::new(0, Some(0), Some(0)),
                    FaceCorner::new(1, Some(0), Some(1)),
                    FaceCorner::new(2, Some(0), Some(1)),
                ],
                vec![
                    FaceCorner::new(2, Some(0), Some(1)),
                    FaceCorner::new(3, Some(0), Some(0)),
                    FaceCorner::new(0, Some(0), Some(0)),
                ],
            ],
        }
    }

    #[test]
    fn shared_corners_are_stored_once() {
        let source = quad_source();
        let data = MeshData::from_source(&source).unwrap();

        let distinct: HashSet<Vertex> = source
            .faces
            .iter()
            .enumerate()
            .flat_map(|(f, face)| face.iter().map(move |c| (f, *c)))
            .map(|(f, c)| source.vertex(f, &c).unwrap())
            .collect();
        assert_eq!(data.vertex_count(), distinct.len());
        assert_eq!(data.vertex_count(), 4);
        assert_eq!(data.triangle_count(), 2);

        let records = source.faces.iter().enumerate().flat_map(|(f, face)| {
            face.iter().map(move |c| (f, *c))
        });
        for ((f, corner), &index) in records.zip(&data.indices) {
            assert_eq!(data.vertices[index as usize], source.vertex(f, &corner).unwrap());
        }
    }

    #[test]
    fn quads_are_fan_triangulated() {
        let mut source = quad_source();
        source.faces = vec![vec![
            FaceCorner::new(0, None, None),
            FaceCorner::new(1, None, None),
            FaceCorner::new(2, None, None),
            FaceCorner::new(3, None, None),
        ]];
        let data = MeshData::from_source(&source).unwrap();
        assert_eq!(data.triangle_count(), 2);
        assert_eq!(data.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(data.vertices.iter().all(|v| v.normal == Vec3::ZERO));
    }

    #[test]
    fn missing_attribute_index_is_an_error() {
        let mut source = quad_source();
        source.faces[1][0].normal = Some(7);
        match MeshData::from_source(&source) {
            Err(Error::IndexOutOfRange {
                face,
                attribute,
                index,
                len,
            }) => {
                assert_eq!(face, 1);
                assert_eq!(attribute, Attribute::Normal);
                assert_eq!(index, 7);
                assert_eq!(len, 1);
            }
            other => panic!("expected an index error, got {other:?}"),
        }

        source.faces = vec![vec![FaceCorner::new(0, None, None); 2]];
        assert!(matches!(
            MeshData::from_source(&source),
            Err(Error::DegenerateFace { face: 0, corners: 2 })
        ));
    }

    #[test]
    fn arrays_are_validated_and_deduplicated() {
        let v = Vertex::new(Vec3::ZERO, Vec3::Y, Vec2::ZERO);
        let w = Vertex::new(Vec3::X, Vec3::Y, Vec2::ZERO);
        let u = Vertex::new(Vec3::Z, Vec3::Y, Vec2::ZERO);

        let data = MeshData::from_arrays(vec![v, w, u, v], vec![0, 1, 2, 3, 2, 1]).unwrap();
        assert_eq!(data.vertex_count(), 3);
        assert_eq!(data.indices, vec![0, 1, 2, 0, 2, 1]);

        assert!(matches!(
            MeshData::from_arrays(vec![v], vec![0, 0]),
            Err(Error::IndexCount(2))
        ));
        assert!(matches!(
            MeshData::from_arrays(vec![v], vec![0, 0, 1]),
            Err(Error::IndexOutOfRange { index: 1, .. })
        ));
    }

    #[test]
    fn construction_drops_unused_and_repeated_vertices() {
        let v = Vertex::new(Vec3::ZERO, Vec3::Y, Vec2::ZERO);
        let w = Vertex::new(Vec3::X, Vec3::Y, Vec2::ZERO);
        let u = Vertex::new(Vec3::Z, Vec3::Y, Vec2::ZERO);
        let stray = Vertex::new(vec3(5.0, 5.0, 5.0), Vec3::Y, Vec2::ZERO);
        let data = MeshData {
            vertices: vec![v, w, stray, u, v],
            indices: vec![0, 1, 3, 4, 3, 1],
        };

        let mut gpu = HeadlessDevice::new();
        let mesh = Mesh::new(data, &mut gpu).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.data().indices, vec![0, 1, 2, 0, 2, 1]);
        assert_eq!(mesh.bounding_box().max, vec3(1.0, 0.0, 1.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triangles.obj");
        mesh.export_obj(&path).unwrap();
        let loaded = Mesh::load_obj(&path, &mut gpu).unwrap();
        assert_eq!(loaded.data(), mesh.data());
        assert_eq!(loaded.bounding_box(), mesh.bounding_box());
    }

    #[test]
    fn bounding_box_covers_all_vertices() {
        let data = MeshData::from_source(&quad_source()).unwrap();
        let bounds = data.bounding_box().unwrap();
        assert!(bounds.min.cmple(bounds.max).all());
        assert!(data
            .vertices
            .iter()
            .all(|v| bounds.contains_point(v.position)));
        assert_eq!(bounds.max, vec3(1.0, 1.0, 0.0));
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let mut gpu = HeadlessDevice::new();
        assert!(matches!(
            Mesh::new(MeshData::default(), &mut gpu),
            Err(Error::EmptyMesh)
        ));
        assert_eq!(gpu.live_buffers(), 0);
    }

    #[test]
    fn cleanup_is_idempotent() {
        let mut gpu = HeadlessDevice::new();
        let mut mesh = Mesh::from_source(&quad_source(), &mut gpu).unwrap();
        assert_eq!(gpu.live_buffers(), 4);

        mesh.cleanup();
        assert!(mesh.is_released());
        assert_eq!(gpu.live_buffers(), 0);
        mesh.cleanup();
        drop(mesh);
        assert_eq!(gpu.released_buffers(), 4);
    }

    #[test]
    fn moved_mesh_keeps_its_resources() {
        let mut gpu = HeadlessDevice::new();
        let mesh = Mesh::from_source(&quad_source(), &mut gpu).unwrap();
        let meshes = vec![mesh];
        assert_eq!(gpu.live_buffers(), 4);
        assert!(!meshes[0].is_released());
        drop(meshes);
        assert_eq!(gpu.live_buffers(), 0);
        assert_eq!(gpu.released_buffers(), 4);
    }

    #[test]
    fn failed_upload_releases_partial_resources() {
        let mut gpu = HeadlessDevice::fail_after(2);
        let result = Mesh::from_source(&quad_source(), &mut gpu);
        assert!(matches!(result, Err(Error::Gpu(_))));
        assert_eq!(gpu.live_buffers(), 0);
        assert_eq!(gpu.released_buffers(), 2);
    }

    #[test]
    fn draws_triangles_and_debug_box() {
        let mut gpu = HeadlessDevice::new();
        let mut mesh = Mesh::from_source(&quad_source(), &mut gpu).unwrap();
        let transform = Transform::from_position(vec3(0.0, 0.0, -3.0));
        let mut recorder = DrawRecorder::default();

        mesh.draw(&mut recorder, &transform);
        mesh.draw_debug_box(&mut recorder, &transform);
        assert_eq!(recorder.draws.len(), 2);
        assert_eq!(recorder.draws[0].index_count, 6);
        assert_eq!(recorder.draws[0].topology, Topology::Triangles);
        assert_eq!(recorder.draws[1].index_count, 24);
        assert_eq!(recorder.draws[1].topology, Topology::Lines);
        assert_eq!(recorder.draws[0].model, transform.local_matrix());

        mesh.cleanup();
        mesh.draw(&mut recorder, &transform);
        assert_eq!(recorder.draws.len(), 2);
    }

    #[test]
    fn obj_text_has_one_directive_per_line() {
        let data = MeshData::from_source(&quad_source()).unwrap();
        let mut out = Vec::new();
        data.write_obj(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let count = |prefix: &str| text.lines().filter(|l| l.starts_with(prefix)).count();
        assert_eq!(count("v "), 4);
        assert_eq!(count("vn "), 1);
        assert_eq!(count("vt "), 2);
        assert_eq!(count("f "), 2);
        assert!(text.lines().any(|l| l == "f 1/1/1 2/2/1 3/2/1"));
    }
}
