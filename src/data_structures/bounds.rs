//! Axis-aligned bounding boxes and the wireframe helper that visualises them.

use cgmath::{EuclideanSpace, Matrix4, Point3, Transform, Vector3};

use crate::data_structures::model::LoadedAsset;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut aabb = Aabb {
            min: first,
            max: first,
        };
        points.for_each(|point| aabb.expand(point));
        Some(aabb)
    }

    pub fn expand(&mut self, point: Point3<f32>) {
        self.min = Point3::new(
            self.min.x.min(point.x),
            self.min.y.min(point.y),
            self.min.z.min(point.z),
        );
        self.max = Point3::new(
            self.max.x.max(point.x),
            self.max.y.max(point.y),
            self.max.z.max(point.z),
        );
    }

    pub fn center(&self) -> Point3<f32> {
        self.min.midpoint(self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// The eight corners; bit 0 selects x, bit 1 y, bit 2 z.
    pub fn corners(&self) -> [Point3<f32>; 8] {
        let pick = |bit: usize, i: usize, lo: f32, hi: f32| if i & bit == 0 { lo } else { hi };
        std::array::from_fn(|i| {
            Point3::new(
                pick(1, i, self.min.x, self.max.x),
                pick(2, i, self.min.y, self.max.y),
                pick(4, i, self.min.z, self.max.z),
            )
        })
    }

    /// The twelve edges as pairs of corners, ready for a line list.
    pub fn edges(&self) -> [(Point3<f32>, Point3<f32>); 12] {
        let c = self.corners();
        [
            (c[0], c[1]),
            (c[2], c[3]),
            (c[4], c[5]),
            (c[6], c[7]),
            (c[0], c[2]),
            (c[1], c[3]),
            (c[4], c[6]),
            (c[5], c[7]),
            (c[0], c[4]),
            (c[1], c[5]),
            (c[2], c[6]),
            (c[3], c[7]),
        ]
    }

    /// Bounds of all mesh vertices of `asset` in its rest pose, relative to the asset root.
    pub fn of_asset(asset: &LoadedAsset) -> Option<Self> {
        let mut worlds: Vec<Matrix4<f32>> = vec![Matrix4::from_scale(1.0); asset.nodes.len()];
        let mut points = Vec::new();
        asset.walk(|idx, parent| {
            let node = &asset.nodes[idx];
            let local = node.rest.to_matrix();
            worlds[idx] = match parent {
                Some(parent) => worlds[parent] * local,
                None => local,
            };
            if let Some(mesh) = node.mesh.and_then(|mesh| asset.meshes.get(mesh)) {
                mesh.primitives
                    .iter()
                    .flat_map(|primitive| primitive.vertices.iter())
                    .for_each(|vertex| {
                        points.push(worlds[idx].transform_point(vertex.position.into()))
                    });
            }
        });
        Self::from_points(points)
    }
}

/// A wireframe box drawn on top of the scene, used to show where an asset sits as authored.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundsHelper {
    pub aabb: Aabb,
    pub colour: [f32; 3],
}
