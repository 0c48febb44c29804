use glam::{vec3, Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing every point, or `None` when there are no points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |bounds, p| Self {
            min: bounds.min.min(p),
            max: bounds.max.max(p),
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extent(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The eight corners; bit 0 selects max x, bit 1 max y, bit 2 max z.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            vec3(lo.x, lo.y, lo.z),
            vec3(hi.x, lo.y, lo.z),
            vec3(lo.x, hi.y, lo.z),
            vec3(hi.x, hi.y, lo.z),
            vec3(lo.x, lo.y, hi.z),
            vec3(hi.x, lo.y, hi.z),
            vec3(lo.x, hi.y, hi.z),
            vec3(hi.x, hi.y, hi.z),
        ]
    }

    /// Maps all eight corners through `matrix` and re-fits an axis-aligned box.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = self.corners().map(|c| matrix.transform_point3(c));
        let mut bounds = Self::new(corners[0], corners[0]);
        for c in &corners[1..] {
            bounds.min = bounds.min.min(*c);
            bounds.max = bounds.max.max(*c);
        }
        bounds
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Closed-interval overlap test: touching faces count as intersecting.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        let intersects_x = self.min.x <= other.max.x && self.max.x >= other.min.x;
        let intersects_y = self.min.y <= other.max.y && self.max.y >= other.min.y;
        let intersects_z = self.min.z <= other.max.z && self.max.z >= other.min.z;
        intersects_x && intersects_y && intersects_z
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance(center) < radius
    }
}
