//! Task execution core shared by every coordinator.
//!
//! The detector owns the snapshot cache and interprets the three-task
//! protocol. Both the inline and the background-thread coordinators drive
//! this same type, which is what keeps their observable behavior
//! identical.

use log::{debug, info, trace};

use super::cache::CollisionCache;
use super::protocol::{
    CollisionError, CollisionReply, CollisionRequest, CollisionTask, TaskReply, UpdatePayload,
};
use super::worker::CollideWorker;
use super::COLLISIONS_EPSILON;

/// Executes collision protocol tasks against an owned snapshot cache.
pub struct CollisionDetector {
    cache: Option<CollisionCache>,
    collisions_epsilon: f32,
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionDetector {
    /// Creates a detector with the engine's default contact offset.
    pub fn new() -> Self {
        Self::with_epsilon(COLLISIONS_EPSILON)
    }

    /// Creates a detector with a custom contact offset.
    pub fn with_epsilon(collisions_epsilon: f32) -> Self {
        Self {
            cache: None,
            collisions_epsilon,
        }
    }

    /// INIT: allocate a fresh cache, discarding any previous content.
    pub fn on_init(&mut self) {
        self.cache = Some(CollisionCache::new());
        info!("collision cache initialized");
    }

    /// UPDATE: upsert the payload's snapshots into the cache.
    ///
    /// Fails if INIT has not run yet.
    pub fn on_update(&mut self, payload: UpdatePayload) -> Result<(), CollisionError> {
        let cache = self
            .cache
            .as_mut()
            .ok_or(CollisionError::NotInitialized { operation: "update" })?;

        let geometry_count = payload.geometries.len();
        let mesh_count = payload.meshes.len();
        for geometry in payload.geometries.into_values() {
            cache.add_geometry(geometry);
        }
        for mesh in payload.meshes.into_values() {
            cache.add_mesh(mesh);
        }
        debug!("collision cache updated: {geometry_count} geometries, {mesh_count} meshes");
        Ok(())
    }

    /// COLLIDE: resolve one world-space query against the cache.
    ///
    /// Fails if INIT has not run yet. The request is mapped into ellipsoid
    /// space by dividing through the radius, resolved there, and the final
    /// position mapped back before it is returned.
    pub fn on_collide(&self, request: &CollisionRequest) -> Result<CollisionReply, CollisionError> {
        let cache = self
            .cache
            .as_ref()
            .ok_or(CollisionError::NotInitialized { operation: "collide" })?;

        let scaled_position = request.position.component_div(&request.radius);
        let scaled_velocity = request.velocity.component_div(&request.radius);

        let mut worker = CollideWorker::new(cache, request.radius, self.collisions_epsilon);
        let finish = worker.collide_with_world(
            scaled_position,
            scaled_velocity,
            request.maximum_retry,
            request.excluded_mesh_id,
        );

        let reply = CollisionReply {
            collision_id: request.collision_id,
            collided_mesh_id: worker.collider().collided_mesh(),
            new_position: finish.component_mul(&request.radius),
        };
        trace!(
            "collision {} resolved: hit={:?} position={:?}",
            reply.collision_id,
            reply.collided_mesh_id,
            reply.new_position
        );
        Ok(reply)
    }

    /// Executes one protocol task and produces the matching reply message.
    pub fn process(&mut self, task: CollisionTask) -> TaskReply {
        match task {
            CollisionTask::Init => {
                self.on_init();
                TaskReply::InitAck(Ok(()))
            }
            CollisionTask::Update(payload) => TaskReply::UpdateAck(self.on_update(payload)),
            CollisionTask::Collide(request) => TaskReply::CollideReply(self.on_collide(&request)),
        }
    }
}
