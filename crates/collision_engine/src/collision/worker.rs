//! The collide-and-slide resolution loop.
//!
//! A [`CollideWorker`] borrows the snapshot cache for the duration of one
//! query and repeatedly applies the swept-sphere narrow phase: find the
//! nearest hit across every cached mesh, move up to it, redirect the
//! remaining motion along the contact plane, and try again with the
//! remainder, up to the caller's retry budget.

use std::collections::HashMap;

use log::warn;

use crate::foundation::math::{Mat4, Plane, Point3, Vec3};

use super::cache::CollisionCache;
use super::collider::Collider;
use super::snapshot::{GeometrySnapshot, MeshId, MeshSnapshot, SubMeshSnapshot};

/// Transformed vertices and plane slots for one sub-mesh.
///
/// Valid for a single query: the ellipsoid transform is fixed once the
/// radius is known, so retry iterations reuse the same data.
struct SubMeshScratch {
    vertices: Vec<Vec3>,
    planes: Vec<Option<Plane>>,
}

impl SubMeshScratch {
    fn build(sub_mesh: &SubMeshSnapshot, geometry: &GeometrySnapshot, transform: &Mat4) -> Self {
        let start = sub_mesh.vertices_start as usize;
        let count = sub_mesh.vertices_count as usize;

        let mut vertices = Vec::with_capacity(count);
        for vertex in start..start + count {
            let local = Point3::new(
                geometry.positions[vertex * 3],
                geometry.positions[vertex * 3 + 1],
                geometry.positions[vertex * 3 + 2],
            );
            vertices.push(transform.transform_point(&local).coords);
        }

        Self {
            vertices,
            planes: vec![None; sub_mesh.index_count as usize / 3],
        }
    }
}

/// Resolves one query against a cache of mesh snapshots.
pub struct CollideWorker<'a> {
    collider: Collider,
    cache: &'a CollisionCache,
    collisions_epsilon: f32,
    scratch: HashMap<(MeshId, usize), SubMeshScratch>,
}

impl<'a> CollideWorker<'a> {
    /// Creates a worker for one query with the given ellipsoid radius.
    pub fn new(cache: &'a CollisionCache, radius: Vec3, collisions_epsilon: f32) -> Self {
        Self {
            collider: Collider::new(radius),
            cache,
            collisions_epsilon,
            scratch: HashMap::new(),
        }
    }

    /// Runs collide-and-slide from `position` along `velocity`, both in
    /// ellipsoid space, and returns the final ellipsoid-space position.
    ///
    /// Performs at most `maximum_retry` resolution iterations; whatever
    /// position has been reached by then is returned. A query against an
    /// empty or entirely missed cache returns exactly
    /// `position + velocity`.
    pub fn collide_with_world(
        &mut self,
        position: Vec3,
        velocity: Vec3,
        maximum_retry: u32,
        excluded_mesh_id: Option<MeshId>,
    ) -> Vec3 {
        let close_distance = self.collisions_epsilon * 10.0;
        let mut position = position;
        let mut velocity = velocity;

        loop {
            if self.collider.retry() >= maximum_retry {
                return position;
            }

            self.collider.initialize(position, velocity, close_distance);

            let cache = self.cache;
            for (&id, mesh) in cache.meshes() {
                if excluded_mesh_id == Some(id) {
                    continue;
                }
                if mesh.check_collisions {
                    self.check_collision(mesh);
                }
            }

            if !self.collider.collision_found() {
                return position + velocity;
            }

            if velocity != Vec3::zeros() {
                self.collider.get_response(&mut position, &mut velocity);
            }

            // Residual motion below the contact offset cannot make progress
            if velocity.magnitude() <= close_distance {
                return position;
            }

            self.collider.increment_retry();
        }
    }

    /// Collider state accumulated across the whole query
    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    fn check_collision(&mut self, mesh: &MeshSnapshot) {
        if !self.collider.can_do_collision(
            mesh.sphere_center,
            mesh.sphere_radius,
            mesh.box_minimum,
            mesh.box_maximum,
        ) {
            return;
        }

        // Vertices move into ellipsoid space in one matrix: the mesh's
        // world transform followed by the inverse-radius scaling
        let radius = self.collider.radius();
        let scaling = Mat4::new_nonuniform_scaling(&Vec3::new(
            1.0 / radius.x,
            1.0 / radius.y,
            1.0 / radius.z,
        ));
        let transform = scaling * Mat4::from_column_slice(&mesh.world_matrix);

        self.process_sub_meshes(mesh, &transform);
    }

    fn process_sub_meshes(&mut self, mesh: &MeshSnapshot, transform: &Mat4) {
        let cache = self.cache;
        let geometry = match cache.get_geometry(mesh.geometry_id) {
            Some(geometry) => geometry,
            None => {
                warn!(
                    "mesh {:?} references geometry {:?} missing from the cache, skipping",
                    mesh.id, mesh.geometry_id
                );
                return;
            }
        };

        let sub_mesh_count = mesh.sub_meshes.len();
        for (index, sub_mesh) in mesh.sub_meshes.iter().enumerate() {
            // With several ranges, prune by per-range bounds first
            if sub_mesh_count > 1
                && !self.collider.can_do_collision(
                    sub_mesh.sphere_center,
                    sub_mesh.sphere_radius,
                    sub_mesh.box_minimum,
                    sub_mesh.box_maximum,
                )
            {
                continue;
            }

            self.collide_sub_mesh(mesh.id, index, sub_mesh, geometry, transform);
        }
    }

    fn collide_sub_mesh(
        &mut self,
        mesh_id: MeshId,
        sub_mesh_index: usize,
        sub_mesh: &SubMeshSnapshot,
        geometry: &GeometrySnapshot,
        transform: &Mat4,
    ) {
        let scratch = self
            .scratch
            .entry((mesh_id, sub_mesh_index))
            .or_insert_with(|| SubMeshScratch::build(sub_mesh, geometry, transform));

        self.collider.collide(
            &mut scratch.planes,
            &scratch.vertices,
            &geometry.indices,
            sub_mesh.index_start as usize,
            (sub_mesh.index_start + sub_mesh.index_count) as usize,
            sub_mesh.vertices_start,
            sub_mesh.has_material,
            mesh_id,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::snapshot::GeometryId;
    use crate::collision::COLLISIONS_EPSILON;
    use approx::assert_relative_eq;

    fn ground_geometry() -> GeometrySnapshot {
        GeometrySnapshot::new(
            GeometryId(1),
            vec![
                -5.0, 0.0, -5.0, //
                5.0, 0.0, -5.0, //
                5.0, 0.0, 5.0, //
                -5.0, 0.0, 5.0,
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    fn ground_cache() -> CollisionCache {
        let mut cache = CollisionCache::new();
        let geometry = ground_geometry();
        cache.add_mesh(MeshSnapshot::from_geometry(
            MeshId(1),
            &geometry,
            &Mat4::identity(),
        ));
        cache.add_geometry(geometry);
        cache
    }

    #[test]
    fn empty_cache_passes_motion_through_exactly() {
        let cache = CollisionCache::new();
        let mut worker = CollideWorker::new(&cache, Vec3::new(1.0, 1.0, 1.0), COLLISIONS_EPSILON);

        let position = Vec3::new(0.125, 2.5, -3.75);
        let velocity = Vec3::new(0.1, -0.2, 0.3);
        let finish = worker.collide_with_world(position, velocity, 3, None);

        assert_eq!(finish, position + velocity);
        assert_eq!(worker.collider().collided_mesh(), None);
    }

    #[test]
    fn rests_on_the_ground_instead_of_sinking() {
        let cache = ground_cache();
        let mut worker =
            CollideWorker::new(&cache, Vec3::new(0.5, 1.0, 0.5), COLLISIONS_EPSILON);

        let finish =
            worker.collide_with_world(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -2.0, 0.0), 5, None);

        assert!(finish.y >= 1.0);
        assert_relative_eq!(finish, Vec3::new(0.0, 1.01, 0.0), epsilon = 1e-5);
        assert_eq!(worker.collider().collided_mesh(), Some(MeshId(1)));
        assert!(worker.collider().retry() <= 5);
    }

    #[test]
    fn zero_retry_budget_returns_the_start() {
        let cache = ground_cache();
        let mut worker = CollideWorker::new(&cache, Vec3::new(1.0, 1.0, 1.0), COLLISIONS_EPSILON);

        let position = Vec3::new(0.0, 2.0, 0.0);
        let finish = worker.collide_with_world(position, Vec3::new(0.0, -4.0, 0.0), 0, None);

        assert_eq!(finish, position);
    }

    #[test]
    fn excluded_mesh_is_invisible_to_the_query() {
        let cache = ground_cache();
        let mut worker = CollideWorker::new(&cache, Vec3::new(1.0, 1.0, 1.0), COLLISIONS_EPSILON);

        let finish = worker.collide_with_world(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -2.0, 0.0),
            5,
            Some(MeshId(1)),
        );

        assert_eq!(finish, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(worker.collider().collided_mesh(), None);
    }

    #[test]
    fn disabled_meshes_are_skipped() {
        let mut cache = CollisionCache::new();
        let geometry = ground_geometry();
        let mut mesh = MeshSnapshot::from_geometry(MeshId(1), &geometry, &Mat4::identity());
        mesh.check_collisions = false;
        cache.add_mesh(mesh);
        cache.add_geometry(geometry);

        let mut worker = CollideWorker::new(&cache, Vec3::new(1.0, 1.0, 1.0), COLLISIONS_EPSILON);
        let finish =
            worker.collide_with_world(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -2.0, 0.0), 5, None);

        assert_eq!(finish, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn missing_geometry_counts_as_no_collision() {
        let mut cache = CollisionCache::new();
        let geometry = ground_geometry();
        let mut mesh = MeshSnapshot::from_geometry(MeshId(1), &geometry, &Mat4::identity());
        mesh.geometry_id = GeometryId(99);
        cache.add_mesh(mesh);

        let mut worker = CollideWorker::new(&cache, Vec3::new(1.0, 1.0, 1.0), COLLISIONS_EPSILON);
        let finish =
            worker.collide_with_world(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -2.0, 0.0), 5, None);

        assert_eq!(finish, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(worker.collider().collided_mesh(), None);
    }

    #[test]
    fn sub_mesh_pruning_does_not_change_the_outcome() {
        // One geometry holding two distant quads: near at the origin,
        // far at x = 100
        let positions = vec![
            -2.0, 0.0, -2.0, //
            2.0, 0.0, -2.0, //
            2.0, 0.0, 2.0, //
            -2.0, 0.0, 2.0, //
            98.0, 0.0, -2.0, //
            102.0, 0.0, -2.0, //
            102.0, 0.0, 2.0, //
            98.0, 0.0, 2.0,
        ];
        let indices = vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7];
        let geometry = GeometrySnapshot::new(GeometryId(1), positions, indices);
        let identity = Mat4::identity();

        let near = SubMeshSnapshot::from_range(&geometry, &identity, 0, 4, 0, 6, false);
        let far = SubMeshSnapshot::from_range(&geometry, &identity, 4, 4, 6, 6, false);
        let split_mesh = MeshSnapshot {
            id: MeshId(1),
            check_collisions: true,
            sphere_center: Vec3::new(50.0, 0.0, 0.0),
            sphere_radius: 52.1,
            box_minimum: near.box_minimum.inf(&far.box_minimum),
            box_maximum: near.box_maximum.sup(&far.box_maximum),
            world_matrix: {
                let mut matrix = [0.0; 16];
                matrix.copy_from_slice(identity.as_slice());
                matrix
            },
            geometry_id: GeometryId(1),
            sub_meshes: vec![near, far],
        };

        let mut split_cache = CollisionCache::new();
        split_cache.add_mesh(split_mesh);
        split_cache.add_geometry(geometry.clone());

        let mut whole_cache = CollisionCache::new();
        whole_cache.add_mesh(MeshSnapshot::from_geometry(MeshId(1), &geometry, &identity));
        whole_cache.add_geometry(geometry);

        let position = Vec3::new(0.0, 2.0, 0.0);
        let velocity = Vec3::new(0.0, -2.0, 0.0);

        let mut split_worker =
            CollideWorker::new(&split_cache, Vec3::new(1.0, 1.0, 1.0), COLLISIONS_EPSILON);
        let split = split_worker.collide_with_world(position, velocity, 3, None);

        let mut whole_worker =
            CollideWorker::new(&whole_cache, Vec3::new(1.0, 1.0, 1.0), COLLISIONS_EPSILON);
        let whole = whole_worker.collide_with_world(position, velocity, 3, None);

        assert_eq!(split, whole);
        assert_eq!(
            split_worker.collider().collided_mesh(),
            whole_worker.collider().collided_mesh()
        );
    }

    #[test]
    fn wedge_resolution_stays_within_the_retry_budget() {
        // Two 45-degree walls forming a V, collidable sides facing inward
        let positions = vec![
            -4.0, 4.0, -4.0, //
            0.0, 0.0, -4.0, //
            0.0, 0.0, 4.0, //
            -4.0, 4.0, 4.0, //
            0.0, 0.0, -4.0, //
            4.0, 4.0, -4.0, //
            4.0, 4.0, 4.0, //
            0.0, 0.0, 4.0,
        ];
        let indices = vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7];
        let geometry = GeometrySnapshot::new(GeometryId(1), positions, indices);

        let mut cache = CollisionCache::new();
        cache.add_mesh(MeshSnapshot::from_geometry(
            MeshId(1),
            &geometry,
            &Mat4::identity(),
        ));
        cache.add_geometry(geometry);

        let mut worker = CollideWorker::new(&cache, Vec3::new(1.0, 1.0, 1.0), COLLISIONS_EPSILON);
        let finish = worker.collide_with_world(
            Vec3::new(0.5, 3.0, 0.0),
            Vec3::new(0.0, -4.0, 0.0),
            4,
            None,
        );

        assert!(worker.collider().retry() <= 4);
        assert!(finish.x.is_finite() && finish.y.is_finite() && finish.z.is_finite());
        // Still above the groove, not pushed through it
        assert!(finish.y > 0.0);
    }
}
