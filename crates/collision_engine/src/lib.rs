//! # Collision Engine
//!
//! Continuous collision detection for ellipsoid characters moving through
//! triangle meshes, with a collide-and-slide response.
//!
//! ## Features
//!
//! - **Swept-Ellipsoid Queries**: Continuous detection in unit-sphere space,
//!   so fast bodies never tunnel through thin geometry
//! - **Collide-and-Slide Response**: Remaining motion slides along the
//!   contact plane and retries, up to a caller-set budget
//! - **Snapshot Scene Cache**: Geometry and transforms arrive as plain data,
//!   decoupled from any scene graph or renderer
//! - **Inline or Worker Execution**: The same detector runs on the caller's
//!   thread or behind a channel on a background thread
//! - **Broad-Phase Culling**: Bounding-sphere and axis-aligned box rejection
//!   per mesh and per sub-mesh before any triangle test
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use collision_engine::prelude::*;
//!
//! fn main() -> Result<(), CollisionError> {
//!     // One triangle of static ground, addressed by stable ids
//!     let geometry = GeometrySnapshot::new(
//!         GeometryId(1),
//!         vec![-5.0, 0.0, -5.0, 5.0, 0.0, -5.0, 0.0, 0.0, 5.0],
//!         vec![0, 1, 2],
//!     );
//!     let mesh = MeshSnapshot::from_geometry(MeshId(1), &geometry, &Mat4::identity());
//!
//!     let mut payload = UpdatePayload::new();
//!     payload.add_geometry(geometry);
//!     payload.add_mesh(mesh);
//!
//!     let mut coordinator = InlineCoordinator::new();
//!     coordinator.init()?;
//!     coordinator.update(payload)?;
//!
//!     coordinator.collide(CollisionRequest {
//!         collision_id: 1,
//!         radius: Vec3::new(0.5, 1.0, 0.5),
//!         position: Vec3::new(0.0, 3.0, 0.0),
//!         velocity: Vec3::new(0.0, -9.8, 0.0),
//!         maximum_retry: 3,
//!         excluded_mesh_id: None,
//!     })?;
//!
//!     for reply in coordinator.poll_replies()? {
//!         println!("body {} settled at {:?}", reply.collision_id, reply.new_position);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod collision;
pub mod config;
pub mod foundation;

pub use collision::{CollisionError, COLLISIONS_EPSILON};

/// Common imports for collision engine users
pub mod prelude {
    pub use crate::{
        collision::{
            cache::CollisionCache,
            collider::Collider,
            coordinator::{
                coordinator_from_config, ChannelCoordinator, CollisionCoordinator,
                InlineCoordinator,
            },
            detector::CollisionDetector,
            protocol::{
                CollisionReply, CollisionRequest, CollisionTask, TaskReply, UpdatePayload,
            },
            snapshot::{GeometryId, GeometrySnapshot, MeshId, MeshSnapshot, SubMeshSnapshot},
            worker::CollideWorker,
            CollisionError, COLLISIONS_EPSILON,
        },
        config::{CollisionConfig, Config, ConfigError},
        foundation::{
            math::{Mat4, Plane, Vec3},
            time::{Stopwatch, Timer},
        },
    };
}
