//! Shared scene setup and character state for the demos.

use collision_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const GROUND_GEOMETRY: GeometryId = GeometryId(1);
pub const GROUND_MESH: MeshId = MeshId(1);
pub const CUBE_GEOMETRY: GeometryId = GeometryId(2);

/// Flat 20x20 ground quad at y = 0, collidable from above.
fn ground_geometry() -> GeometrySnapshot {
    GeometrySnapshot::new(
        GROUND_GEOMETRY,
        vec![
            -10.0, 0.0, -10.0, //
            10.0, 0.0, -10.0, //
            10.0, 0.0, 10.0, //
            -10.0, 0.0, 10.0,
        ],
        vec![0, 1, 2, 0, 2, 3],
    )
}

/// Unit cube centered on the origin, all six faces collidable from outside.
fn unit_cube_geometry() -> GeometrySnapshot {
    GeometrySnapshot::new(
        CUBE_GEOMETRY,
        vec![
            -0.5, -0.5, -0.5, // 0
            0.5, -0.5, -0.5, // 1
            0.5, 0.5, -0.5, // 2
            -0.5, 0.5, -0.5, // 3
            -0.5, -0.5, 0.5, // 4
            0.5, -0.5, 0.5, // 5
            0.5, 0.5, 0.5, // 6
            -0.5, 0.5, 0.5, // 7
        ],
        vec![
            4, 6, 5, 4, 7, 6, // front
            0, 1, 2, 0, 2, 3, // back
            1, 6, 2, 1, 5, 6, // right
            0, 3, 7, 0, 7, 4, // left
            3, 2, 6, 3, 6, 7, // top
            4, 5, 1, 4, 1, 0, // bottom
        ],
    )
}

/// Builds the demo scene: the ground plus `obstacle_count` unit cubes
/// resting on it at seeded random positions.
pub fn build_scene(obstacle_count: usize, seed: u64) -> UpdatePayload {
    let mut payload = UpdatePayload::new();

    let ground = ground_geometry();
    payload.add_mesh(MeshSnapshot::from_geometry(
        GROUND_MESH,
        &ground,
        &Mat4::identity(),
    ));
    payload.add_geometry(ground);

    let cube = unit_cube_geometry();
    let mut rng = StdRng::seed_from_u64(seed);
    for index in 0..obstacle_count {
        let x = rng.gen_range(-8.0..8.0_f32);
        let z = rng.gen_range(-8.0..8.0_f32);
        let transform = Mat4::new_translation(&Vec3::new(x, 0.5, z));
        payload.add_mesh(MeshSnapshot::from_geometry(
            MeshId(100 + index as u64),
            &cube,
            &transform,
        ));
    }
    payload.add_geometry(cube);

    payload
}

/// A walking character driven by collide-and-slide replies.
pub struct Character {
    pub position: Vec3,
    pub velocity: Vec3,
    pub ellipsoid: Vec3,
}

impl Character {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::zeros(),
            ellipsoid: Vec3::new(0.5, 0.9, 0.5),
        }
    }

    /// Applies a resolved position, ignoring sub-epsilon corrections.
    ///
    /// `requested` is the displacement the query asked for; a vertical
    /// travel well short of the requested fall means the character landed,
    /// so the accumulated fall speed is cleared.
    pub fn apply_reply(&mut self, reply: &CollisionReply, requested: Vec3) {
        let correction = reply.new_position - self.position;
        if correction.magnitude() > COLLISIONS_EPSILON {
            self.position = reply.new_position;
        }
        if requested.y < 0.0 && correction.y > requested.y * 0.5 {
            self.velocity.y = 0.0;
        }
    }
}
