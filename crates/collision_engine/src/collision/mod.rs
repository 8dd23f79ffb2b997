//! Swept-ellipsoid collision detection and collide-and-slide response.
//!
//! The moving body is an ellipsoid described by per-axis radii. Every
//! query is resolved in a space scaled by the inverse radii, where the
//! ellipsoid becomes a unit sphere and the classic swept-sphere tests
//! against triangle faces, vertices and edges apply directly. The
//! response slides the remaining motion along the contact plane and
//! retries, so characters glide along walls instead of stopping dead.
//!
//! Scene data enters as plain snapshots ([`snapshot`]) held in a
//! [`cache::CollisionCache`], which keeps the resolver free of any
//! scene-graph or renderer types and lets it run on its own thread. The
//! [`coordinator`] module offers that choice: the same detector behind
//! an inline or a background-thread front end.

pub mod cache;
pub mod collider;
pub mod coordinator;
pub mod detector;
pub mod protocol;
pub mod snapshot;
pub mod worker;

pub use cache::CollisionCache;
pub use collider::Collider;
pub use coordinator::{
    coordinator_from_config, ChannelCoordinator, CollisionCoordinator, InlineCoordinator,
};
pub use detector::CollisionDetector;
pub use protocol::{
    CollisionError, CollisionReply, CollisionRequest, CollisionTask, TaskReply, UpdatePayload,
};
pub use snapshot::{GeometryId, GeometrySnapshot, MeshId, MeshSnapshot, SubMeshSnapshot};
pub use worker::CollideWorker;

/// Default contact offset in unit-sphere space.
///
/// Resolved positions are pushed this far off the contact plane, and a
/// response shorter than ten times this value ends the retry loop.
pub const COLLISIONS_EPSILON: f32 = 0.001;
