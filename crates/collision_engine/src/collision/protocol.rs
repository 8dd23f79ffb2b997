//! Message types exchanged between callers and the resolution side.
//!
//! The same three-task protocol drives both execution modes: INIT
//! allocates the snapshot cache, UPDATE upserts snapshots into it, and
//! COLLIDE resolves one query. Replies echo the caller's correlation id
//! so several queries can be in flight at once.

use std::collections::HashMap;

use crate::foundation::math::Vec3;

use super::snapshot::{GeometryId, GeometrySnapshot, MeshId, MeshSnapshot};

/// One collision query, in world space.
#[derive(Debug, Clone)]
pub struct CollisionRequest {
    /// Caller-chosen id echoed back on the reply
    pub collision_id: u64,

    /// Ellipsoid semi-axes, strictly positive per component
    pub radius: Vec3,

    /// Ellipsoid center at the start of the motion
    pub position: Vec3,

    /// Intended displacement for this step
    pub velocity: Vec3,

    /// Upper bound on resolution iterations
    pub maximum_retry: u32,

    /// Mesh to ignore, typically the mover's own
    pub excluded_mesh_id: Option<MeshId>,
}

/// Resolution of one collision query, in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionReply {
    /// Correlation id of the request this answers
    pub collision_id: u64,

    /// Mesh owning the nearest hit triangle, if anything was hit
    pub collided_mesh_id: Option<MeshId>,

    /// Where the ellipsoid ends up after collide-and-slide
    pub new_position: Vec3,
}

/// Batch of snapshots for an UPDATE task.
///
/// Entries are keyed by id and upsert into the cache; snapshots absent
/// from the payload are left untouched.
#[derive(Debug, Default)]
pub struct UpdatePayload {
    /// Geometries to insert or replace
    pub geometries: HashMap<GeometryId, GeometrySnapshot>,

    /// Meshes to insert or replace
    pub meshes: HashMap<MeshId, MeshSnapshot>,
}

impl UpdatePayload {
    /// Create an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a geometry snapshot, replacing any queued one with the same id
    pub fn add_geometry(&mut self, geometry: GeometrySnapshot) {
        self.geometries.insert(geometry.id, geometry);
    }

    /// Queue a mesh snapshot, replacing any queued one with the same id
    pub fn add_mesh(&mut self, mesh: MeshSnapshot) {
        self.meshes.insert(mesh.id, mesh);
    }
}

/// A task submitted to the resolution side.
#[derive(Debug)]
pub enum CollisionTask {
    /// Allocate a fresh, empty snapshot cache
    Init,

    /// Upsert snapshots into the cache
    Update(UpdatePayload),

    /// Resolve one query against the current cache
    Collide(CollisionRequest),
}

/// A message sent back after each processed task.
#[derive(Debug)]
pub enum TaskReply {
    /// Acknowledges an INIT task
    InitAck(Result<(), CollisionError>),

    /// Acknowledges an UPDATE task
    UpdateAck(Result<(), CollisionError>),

    /// Outcome of one COLLIDE request
    CollideReply(Result<CollisionReply, CollisionError>),
}

/// Errors surfaced by the collision protocol.
#[derive(thiserror::Error, Debug)]
pub enum CollisionError {
    /// A task that needs the cache arrived before INIT
    #[error("collision cache not initialized: {operation} requires a prior init")]
    NotInitialized {
        /// Task that arrived too early
        operation: &'static str,
    },

    /// The background resolution thread is gone
    #[error("collision worker disconnected")]
    WorkerDisconnected,
}
