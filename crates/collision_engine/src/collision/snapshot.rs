//! Shared-nothing snapshots of collidable scene content.
//!
//! The collision system never touches live scene objects. Callers flatten
//! whatever they consider collidable into these plain-data snapshots and
//! ship them over [`UpdatePayload`](super::protocol::UpdatePayload); the
//! resolution side keeps its own copies, so no locks are needed even when
//! queries run on a background thread.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Stable identifier for a collidable mesh, assigned by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u64);

/// Stable identifier for a vertex/index buffer set, assigned by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(pub u64);

/// Flattened vertex and index data for one geometry.
///
/// `positions` holds `x, y, z` triples in model space. Every index must
/// reference a position triple, and every sub-mesh range of a
/// [`MeshSnapshot`] using this geometry must stay inside these buffers;
/// the triangle iteration indexes the slices directly.
#[derive(Debug, Clone)]
pub struct GeometrySnapshot {
    /// Identifier meshes use to reference this geometry
    pub id: GeometryId,

    /// Model-space vertex positions, three floats per vertex
    pub positions: Vec<f32>,

    /// Triangle list indices into `positions`
    pub indices: Vec<u32>,
}

impl GeometrySnapshot {
    /// Bundles position and index buffers under an id.
    pub fn new(id: GeometryId, positions: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            id,
            positions,
            indices,
        }
    }

    /// Number of vertices in the position buffer
    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }
}

/// One drawable range of a mesh, with its own world-space bounds.
///
/// Meshes with several sub-meshes get a bounds test per sub-mesh before
/// triangles are visited; a single-sub-mesh mesh relies on the mesh-level
/// bounds alone.
#[derive(Debug, Clone)]
pub struct SubMeshSnapshot {
    /// First vertex of the range
    pub vertices_start: u32,

    /// Number of vertices in the range
    pub vertices_count: u32,

    /// First index of the range
    pub index_start: u32,

    /// Number of indices in the range, a multiple of three
    pub index_count: u32,

    /// Whether the range carries a material and is collided two-sided
    pub has_material: bool,

    /// World-space bounding sphere center of the range
    pub sphere_center: Vec3,

    /// World-space bounding sphere radius of the range
    pub sphere_radius: f32,

    /// World-space axis-aligned bounds, minimum corner
    pub box_minimum: Vec3,

    /// World-space axis-aligned bounds, maximum corner
    pub box_maximum: Vec3,
}

impl SubMeshSnapshot {
    /// Builds a sub-mesh over the given ranges, deriving world bounds from
    /// the transformed vertices of the range.
    pub fn from_range(
        geometry: &GeometrySnapshot,
        world_matrix: &Mat4,
        vertices_start: u32,
        vertices_count: u32,
        index_start: u32,
        index_count: u32,
        has_material: bool,
    ) -> Self {
        let (box_minimum, box_maximum) = world_bounds(
            &geometry.positions,
            vertices_start as usize,
            vertices_count as usize,
            world_matrix,
        );
        let sphere_center = (box_minimum + box_maximum) * 0.5;
        let sphere_radius = (box_maximum - sphere_center).magnitude();

        Self {
            vertices_start,
            vertices_count,
            index_start,
            index_count,
            has_material,
            sphere_center,
            sphere_radius,
            box_minimum,
            box_maximum,
        }
    }
}

/// Everything the resolution side needs to know about one collidable mesh.
#[derive(Debug, Clone)]
pub struct MeshSnapshot {
    /// Caller-assigned identifier, also the cache key
    pub id: MeshId,

    /// Whether this mesh participates in collision at all
    pub check_collisions: bool,

    /// World-space bounding sphere center
    pub sphere_center: Vec3,

    /// World-space bounding sphere radius
    pub sphere_radius: f32,

    /// World-space axis-aligned bounds, minimum corner
    pub box_minimum: Vec3,

    /// World-space axis-aligned bounds, maximum corner
    pub box_maximum: Vec3,

    /// Model-to-world matrix, column-major
    pub world_matrix: [f32; 16],

    /// Geometry holding this mesh's buffers
    pub geometry_id: GeometryId,

    /// Ranges of the geometry this mesh draws
    pub sub_meshes: Vec<SubMeshSnapshot>,
}

impl MeshSnapshot {
    /// Builds a collidable snapshot with a single sub-mesh covering the
    /// whole geometry, deriving world bounds from the transformed vertices.
    pub fn from_geometry(id: MeshId, geometry: &GeometrySnapshot, world_matrix: &Mat4) -> Self {
        let sub_mesh = SubMeshSnapshot::from_range(
            geometry,
            world_matrix,
            0,
            geometry.vertex_count(),
            0,
            geometry.indices.len() as u32,
            false,
        );

        let mut matrix = [0.0; 16];
        matrix.copy_from_slice(world_matrix.as_slice());

        Self {
            id,
            check_collisions: true,
            sphere_center: sub_mesh.sphere_center,
            sphere_radius: sub_mesh.sphere_radius,
            box_minimum: sub_mesh.box_minimum,
            box_maximum: sub_mesh.box_maximum,
            world_matrix: matrix,
            geometry_id: geometry.id,
            sub_meshes: vec![sub_mesh],
        }
    }
}

fn world_bounds(
    positions: &[f32],
    vertices_start: usize,
    vertices_count: usize,
    world_matrix: &Mat4,
) -> (Vec3, Vec3) {
    if vertices_count == 0 {
        return (Vec3::zeros(), Vec3::zeros());
    }

    let mut minimum = Vec3::repeat(f32::MAX);
    let mut maximum = Vec3::repeat(f32::MIN);
    for vertex in vertices_start..vertices_start + vertices_count {
        let local = Point3::new(
            positions[vertex * 3],
            positions[vertex * 3 + 1],
            positions[vertex * 3 + 2],
        );
        let world = world_matrix.transform_point(&local).coords;
        minimum = minimum.inf(&world);
        maximum = maximum.sup(&world);
    }
    (minimum, maximum)
}
