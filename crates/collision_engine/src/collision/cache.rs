//! Snapshot store owned by the resolution side.

use std::collections::HashMap;

use super::snapshot::{GeometryId, GeometrySnapshot, MeshId, MeshSnapshot};

/// Id-keyed store of the mesh and geometry snapshots queries run against.
///
/// Adding a snapshot under an existing id replaces the previous one, so
/// repeated scene updates degrade to cheap overwrites. Iteration order over
/// the stored meshes is unspecified and must not affect query outcomes.
#[derive(Debug, Default)]
pub struct CollisionCache {
    meshes: HashMap<MeshId, MeshSnapshot>,
    geometries: HashMap<GeometryId, GeometrySnapshot>,
}

impl CollisionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a mesh snapshot
    pub fn add_mesh(&mut self, mesh: MeshSnapshot) {
        self.meshes.insert(mesh.id, mesh);
    }

    /// Insert or replace a geometry snapshot
    pub fn add_geometry(&mut self, geometry: GeometrySnapshot) {
        self.geometries.insert(geometry.id, geometry);
    }

    /// Look up a mesh by id
    pub fn get_mesh(&self, id: MeshId) -> Option<&MeshSnapshot> {
        self.meshes.get(&id)
    }

    /// Look up a geometry by id
    pub fn get_geometry(&self, id: GeometryId) -> Option<&GeometrySnapshot> {
        self.geometries.get(&id)
    }

    /// All cached meshes, in unspecified order
    pub fn meshes(&self) -> &HashMap<MeshId, MeshSnapshot> {
        &self.meshes
    }

    /// All cached geometries, in unspecified order
    pub fn geometries(&self) -> &HashMap<GeometryId, GeometrySnapshot> {
        &self.geometries
    }
}
