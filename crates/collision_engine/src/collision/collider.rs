//! Swept-sphere-versus-triangle intersection and slide response
//!
//! Implements the classic ellipsoid collision scheme: the moving ellipsoid
//! is a unit sphere in a space scaled by its inverse radii, triangles are
//! tested against the sphere's swept path, and the response redirects the
//! remaining motion along the contact plane.
//!
//! See: "Improved Collision detection and Response" by Kasper Fauerby

use crate::foundation::math::{Plane, Vec3};

use super::snapshot::MeshId;

/// Solves `a*t^2 + b*t + c = 0` and returns the smallest root strictly
/// inside `(0, max_r)`, if any.
///
/// Degenerate coefficients (for example `a == 0`) produce infinities or
/// NaNs whose range checks fail, so they fall through to `None` without
/// special casing.
fn lowest_root(a: f32, b: f32, c: f32, max_r: f32) -> Option<f32> {
    let determinant = b * b - 4.0 * a * c;

    // Complex roots: no intersection
    if determinant < 0.0 {
        return None;
    }

    let sqrt_d = determinant.sqrt();
    let mut r1 = (-b - sqrt_d) / (2.0 * a);
    let mut r2 = (-b + sqrt_d) / (2.0 * a);
    if r1 > r2 {
        std::mem::swap(&mut r1, &mut r2);
    }

    if r1 > 0.0 && r1 < max_r {
        return Some(r1);
    }
    if r2 > 0.0 && r2 < max_r {
        return Some(r2);
    }
    None
}

/// Conservative overlap test between an axis-aligned box and a sphere.
fn intersect_box_aa_sphere(box_minimum: Vec3, box_maximum: Vec3, center: Vec3, radius: f32) -> bool {
    if box_minimum.x > center.x + radius {
        return false;
    }
    if center.x - radius > box_maximum.x {
        return false;
    }
    if box_minimum.y > center.y + radius {
        return false;
    }
    if center.y - radius > box_maximum.y {
        return false;
    }
    if box_minimum.z > center.z + radius {
        return false;
    }
    if center.z - radius > box_maximum.z {
        return false;
    }
    true
}

/// Point-in-triangle test using the sign of cross products against the
/// triangle normal. Points exactly on an edge count as inside.
fn check_point_in_triangle(point: Vec3, pa: Vec3, pb: Vec3, pc: Vec3, n: Vec3) -> bool {
    let e0 = pa - point;
    let e1 = pb - point;

    let d = e0.cross(&e1).dot(&n);
    if d < 0.0 {
        return false;
    }

    let e2 = pc - point;
    let d = e1.cross(&e2).dot(&n);
    if d < 0.0 {
        return false;
    }

    let d = e2.cross(&e0).dot(&n);
    d >= 0.0
}

/// Per-query swept-sphere state.
///
/// A collider is created fresh for each query with the ellipsoid radius,
/// then re-initialized once per retry iteration with the current position
/// and remaining velocity, both in ellipsoid space. It accumulates the
/// nearest hit across every triangle it is fed.
pub struct Collider {
    radius: Vec3,
    retry: u32,

    // Ellipsoid-space state for the current iteration
    base_point: Vec3,
    velocity: Vec3,
    normalized_velocity: Vec3,
    epsilon: f32,

    // World-space mirror used by the broad phase
    base_point_world: Vec3,
    velocity_world_length: f32,

    // Nearest hit so far
    collision_found: bool,
    nearest_distance: f32,
    intersection_point: Vec3,
    collided_mesh: Option<MeshId>,
}

impl Collider {
    /// Creates a collider for an ellipsoid with the given semi-axes.
    ///
    /// Radius components must be strictly positive; the caller owns that
    /// contract.
    pub fn new(radius: Vec3) -> Self {
        debug_assert!(
            radius.x > 0.0 && radius.y > 0.0 && radius.z > 0.0,
            "ellipsoid radius components must be strictly positive"
        );
        Self {
            radius,
            retry: 0,
            base_point: Vec3::zeros(),
            velocity: Vec3::zeros(),
            normalized_velocity: Vec3::zeros(),
            epsilon: 0.0,
            base_point_world: Vec3::zeros(),
            velocity_world_length: 0.0,
            collision_found: false,
            nearest_distance: f32::MAX,
            intersection_point: Vec3::zeros(),
            collided_mesh: None,
        }
    }

    /// Begins one resolution iteration from `source` moving by `dir`, both
    /// in ellipsoid space. `epsilon` is the push-out distance applied by
    /// the slide response.
    pub fn initialize(&mut self, source: Vec3, dir: Vec3, epsilon: f32) {
        self.velocity = dir;
        self.normalized_velocity = dir.try_normalize(0.0).unwrap_or_else(Vec3::zeros);
        self.base_point = source;
        self.base_point_world = source.component_mul(&self.radius);
        self.velocity_world_length = dir.component_mul(&self.radius).magnitude();
        self.epsilon = epsilon;
        self.collision_found = false;
    }

    /// Broad phase: can the swept ellipsoid possibly reach these bounds?
    ///
    /// Takes world-space bounds. Never rejects a pair the narrow phase
    /// would report, only skips provably unreachable ones.
    pub fn can_do_collision(
        &self,
        sphere_center: Vec3,
        sphere_radius: f32,
        box_minimum: Vec3,
        box_maximum: Vec3,
    ) -> bool {
        let distance = (self.base_point_world - sphere_center).magnitude();
        let max_radius = self.radius.x.max(self.radius.y).max(self.radius.z);

        if distance > self.velocity_world_length + max_radius + sphere_radius {
            return false;
        }
        if !intersect_box_aa_sphere(
            box_minimum,
            box_maximum,
            self.base_point_world,
            self.velocity_world_length + max_radius,
        ) {
            return false;
        }
        true
    }

    /// Tests one triangle range of `host_mesh` against the swept sphere.
    ///
    /// `world_vertices` holds ellipsoid-space vertex positions,
    /// `vertex_offset` rebases the indices to that slice. Triangles are
    /// fed to the narrow phase with reversed winding, matching buffers
    /// whose front faces wind clockwise; ranges without a material are
    /// then culled when they face away from the motion.
    pub fn collide(
        &mut self,
        plane_cache: &mut [Option<Plane>],
        world_vertices: &[Vec3],
        indices: &[u32],
        index_start: usize,
        index_end: usize,
        vertex_offset: u32,
        has_material: bool,
        host_mesh: MeshId,
    ) {
        for i in (index_start..index_end).step_by(3) {
            let p1 = world_vertices[(indices[i] - vertex_offset) as usize];
            let p2 = world_vertices[(indices[i + 1] - vertex_offset) as usize];
            let p3 = world_vertices[(indices[i + 2] - vertex_offset) as usize];

            self.test_triangle(
                (i - index_start) / 3,
                plane_cache,
                p3,
                p2,
                p1,
                has_material,
                host_mesh,
            );
        }
    }

    /// Narrow phase for a single triangle, in ellipsoid space.
    ///
    /// Tests the face interior first, then the three vertices and three
    /// edges via the swept-sphere quadratics. A hit only replaces the
    /// current best when strictly closer, so the first-tested triangle
    /// wins exact ties.
    pub fn test_triangle(
        &mut self,
        face_index: usize,
        plane_cache: &mut [Option<Plane>],
        p1: Vec3,
        p2: Vec3,
        p3: Vec3,
        has_material: bool,
        host_mesh: MeshId,
    ) {
        let triangle_plane =
            *plane_cache[face_index].get_or_insert_with(|| Plane::from_points(p1, p2, p3));

        // Ranges without a material are one-sided
        if !has_material && !triangle_plane.is_front_facing_to(self.normalized_velocity, 0.0) {
            return;
        }

        let signed_dist_to_plane = triangle_plane.signed_distance_to(self.base_point);
        let normal_dot_velocity = triangle_plane.normal.dot(&self.velocity);

        // Interval of sphere-plane contact along the motion
        let mut embedded_in_plane = false;
        let mut t0;
        if normal_dot_velocity == 0.0 {
            // Moving parallel to the plane: either always or never at
            // contact distance
            if signed_dist_to_plane.abs() >= 1.0 {
                return;
            }
            embedded_in_plane = true;
            t0 = 0.0;
        } else {
            t0 = (-1.0 - signed_dist_to_plane) / normal_dot_velocity;
            let mut t1 = (1.0 - signed_dist_to_plane) / normal_dot_velocity;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            if t0 > 1.0 || t1 < 0.0 {
                return;
            }
            t0 = t0.clamp(0.0, 1.0);
        }

        let mut collision_point = Vec3::zeros();
        let mut found = false;
        let mut t = 1.0_f32;

        if !embedded_in_plane {
            // Face contact at the earliest plane touch
            let plane_intersection =
                self.base_point - triangle_plane.normal + self.velocity * t0;
            if check_point_in_triangle(plane_intersection, p1, p2, p3, triangle_plane.normal) {
                found = true;
                t = t0;
                collision_point = plane_intersection;
            }
        }

        if !found {
            // Sweep against the corners and edges; each accepted root
            // shrinks the search window for the next test
            let velocity_squared_length = self.velocity.magnitude_squared();
            let a = velocity_squared_length;

            for point in [p1, p2, p3] {
                let base_to_point = self.base_point - point;
                let b = 2.0 * self.velocity.dot(&base_to_point);
                let c = base_to_point.magnitude_squared() - 1.0;
                if let Some(root) = lowest_root(a, b, c, t) {
                    t = root;
                    found = true;
                    collision_point = point;
                }
            }

            for (pa, pb) in [(p1, p2), (p2, p3), (p3, p1)] {
                let edge = pb - pa;
                let base_to_vertex = pa - self.base_point;
                let edge_squared_length = edge.magnitude_squared();
                let edge_dot_velocity = edge.dot(&self.velocity);
                let edge_dot_base_to_vertex = edge.dot(&base_to_vertex);

                let a = edge_squared_length * (-velocity_squared_length)
                    + edge_dot_velocity * edge_dot_velocity;
                let b = edge_squared_length * (2.0 * self.velocity.dot(&base_to_vertex))
                    - 2.0 * edge_dot_velocity * edge_dot_base_to_vertex;
                let c = edge_squared_length * (1.0 - base_to_vertex.magnitude_squared())
                    + edge_dot_base_to_vertex * edge_dot_base_to_vertex;

                if let Some(root) = lowest_root(a, b, c, t) {
                    // Contact must land within the segment
                    let f = (edge_dot_velocity * root - edge_dot_base_to_vertex)
                        / edge_squared_length;
                    if (0.0..=1.0).contains(&f) {
                        t = root;
                        found = true;
                        collision_point = pa + edge * f;
                    }
                }
            }
        }

        if found {
            let dist_to_collision = t * self.velocity.magnitude();

            // Strictly closer only: the first hit keeps exact ties
            if !self.collision_found || dist_to_collision < self.nearest_distance {
                self.intersection_point = collision_point;
                self.nearest_distance = dist_to_collision;
                self.collision_found = true;
                self.collided_mesh = Some(host_mesh);
            }
        }
    }

    /// Slide response for the nearest hit of the current iteration.
    ///
    /// Moves `position` up to the contact (plus a small push-out along the
    /// slide plane normal) and replaces `velocity` with the remainder of
    /// the motion projected onto the slide plane.
    pub fn get_response(&mut self, position: &mut Vec3, velocity: &mut Vec3) {
        let destination_point = *position + *velocity;

        // Travel only as far as the nearest contact
        let scale = self.nearest_distance / velocity.magnitude();
        *velocity *= scale;
        *position = self.base_point + *velocity;

        let mut slide_plane_normal = (*position - self.intersection_point)
            .try_normalize(0.0)
            .unwrap_or_else(Vec3::zeros);
        let displacement = slide_plane_normal * self.epsilon;
        *position += displacement;
        self.intersection_point += displacement;

        // Project the intended destination onto the slide plane
        slide_plane_normal *= slide_plane_normal.dot(&(destination_point - self.intersection_point));
        let destination_point = destination_point - slide_plane_normal;

        *velocity = destination_point - self.intersection_point;
    }

    /// Ellipsoid semi-axes this collider was created with
    pub fn radius(&self) -> Vec3 {
        self.radius
    }

    /// Whether any triangle has hit so far in this iteration
    pub fn collision_found(&self) -> bool {
        self.collision_found
    }

    /// Ellipsoid-space travel distance to the nearest hit
    pub fn nearest_distance(&self) -> f32 {
        self.nearest_distance
    }

    /// Ellipsoid-space contact point of the nearest hit
    pub fn intersection_point(&self) -> Vec3 {
        self.intersection_point
    }

    /// Mesh owning the nearest triangle hit across the whole query
    pub fn collided_mesh(&self) -> Option<MeshId> {
        self.collided_mesh
    }

    /// Resolution iterations consumed so far
    pub fn retry(&self) -> u32 {
        self.retry
    }

    /// Counts one consumed resolution iteration
    pub fn increment_retry(&mut self) {
        self.retry += 1;
    }
}
