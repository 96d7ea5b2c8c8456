//! Geometric primitives and intersection predicates.
//!
//! Everything here is single precision: level geometry comes in as `f32`
//! and navigation never needs more range than a single level.

use glam::{Vec2, Vec3};

/// Determinant threshold below which a segment is treated as parallel.
const PARALLEL_EPSILON: f32 = 1e-9;

/// Fraction of a segment's length treated as "at its endpoint".
const ENDPOINT_EPSILON: f32 = 1e-5;

// =============================================================================
// Aabb
// =============================================================================

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
	/// Minimum corner (inclusive).
	pub min: Vec3,
	/// Maximum corner (inclusive).
	pub max: Vec3,
}

impl Aabb {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: Vec3, max: Vec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Create a new AABB from center and half-extents.
	pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
		Self {
			min: center - half_extents,
			max: center + half_extents,
		}
	}

	/// Smallest box containing every point, `None` for an empty iterator.
	pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
		let mut points = points.into_iter();
		let first = points.next()?;
		let mut aabb = Self::new(first, first);
		for point in points {
			aabb.encapsulate(point);
		}
		Some(aabb)
	}

	/// Grow the box so it contains `point`.
	#[inline]
	pub fn encapsulate(&mut self, point: Vec3) {
		self.min = self.min.min(point);
		self.max = self.max.max(point);
	}

	/// Cube sharing this box's center whose half-extent is the largest
	/// half-size of this box.
	pub fn bounding_cube(&self) -> Self {
		let half = self.size().max_element() * 0.5;
		Self::from_center_half_extents(self.center(), Vec3::splat(half))
	}

	/// Check if this AABB overlaps with another.
	///
	/// Two AABBs overlap if they share any interior or boundary points.
	#[inline]
	pub fn overlaps(&self, other: &Aabb) -> bool {
		self.min.x <= other.max.x
			&& self.max.x >= other.min.x
			&& self.min.y <= other.max.y
			&& self.max.y >= other.min.y
			&& self.min.z <= other.max.z
			&& self.max.z >= other.min.z
	}

	/// Check if this AABB contains a point.
	#[inline]
	pub fn contains_point(&self, point: Vec3) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	/// Sphere vs box, touching counts.
	#[inline]
	pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
		let closest = sphere.center.clamp(self.min, self.max);
		closest.distance_squared(sphere.center) <= sphere.radius * sphere.radius
	}

	/// Get the size of the AABB (max - min).
	#[inline]
	pub fn size(&self) -> Vec3 {
		self.max - self.min
	}

	/// Get the center of the AABB.
	#[inline]
	pub fn center(&self) -> Vec3 {
		(self.min + self.max) * 0.5
	}
}

// =============================================================================
// Sphere / Triangle
// =============================================================================

/// Bounding sphere of a mobile object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
	pub center: Vec3,
	pub radius: f32,
}

impl Sphere {
	pub fn new(center: Vec3, radius: f32) -> Self {
		Self { center, radius }
	}
}

/// Triangle in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
	pub vertices: [Vec3; 3],
}

impl Triangle {
	pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
		Self { vertices: [a, b, c] }
	}

	/// Average of the three vertices.
	#[inline]
	pub fn centroid(&self) -> Vec3 {
		(self.vertices[0] + self.vertices[1] + self.vertices[2]) / 3.0
	}

	/// Unnormalized face normal (counter-clockwise winding).
	#[inline]
	pub fn face_normal(&self) -> Vec3 {
		(self.vertices[1] - self.vertices[0]).cross(self.vertices[2] - self.vertices[0])
	}

	#[inline]
	pub fn area(&self) -> f32 {
		self.face_normal().length() * 0.5
	}

	/// True when one of the vertices lies within `epsilon` of `point`.
	#[inline]
	pub fn has_vertex(&self, point: Vec3, epsilon: f32) -> bool {
		self.vertices.iter().any(|v| approx_eq(*v, point, epsilon))
	}

	/// The three edges, in winding order.
	pub fn edges(&self) -> [Segment; 3] {
		let [a, b, c] = self.vertices;
		[Segment::new(a, b), Segment::new(b, c), Segment::new(c, a)]
	}
}

/// Component-wise comparison within `epsilon`.
#[inline]
pub fn approx_eq(a: Vec3, b: Vec3, epsilon: f32) -> bool {
	a.abs_diff_eq(b, epsilon)
}

// =============================================================================
// Segment
// =============================================================================

/// Finite line segment from `start` to `end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
	pub start: Vec3,
	pub end: Vec3,
}

impl Segment {
	pub fn new(start: Vec3, end: Vec3) -> Self {
		Self { start, end }
	}

	#[inline]
	pub fn direction(&self) -> Vec3 {
		self.end - self.start
	}

	#[inline]
	pub fn length(&self) -> f32 {
		self.direction().length()
	}

	/// Segment vs triangle (Möller–Trumbore restricted to `t` in `[0, 1]`).
	///
	/// Hits on triangle edges and vertices count. Degenerate triangles never hit.
	pub fn intersects_triangle(&self, triangle: &Triangle) -> bool {
		let [a, b, c] = triangle.vertices;
		let dir = self.direction();
		let edge1 = b - a;
		let edge2 = c - a;

		let h = dir.cross(edge2);
		let det = edge1.dot(h);
		if det.abs() <= PARALLEL_EPSILON {
			return false;
		}

		let inv_det = 1.0 / det;
		let s = self.start - a;
		let u = inv_det * s.dot(h);
		if !(0.0..=1.0).contains(&u) {
			return false;
		}

		let q = s.cross(edge1);
		let v = inv_det * dir.dot(q);
		if v < 0.0 || u + v > 1.0 {
			return false;
		}

		let t = inv_det * edge2.dot(q);
		(0.0..=1.0).contains(&t)
	}

	/// Segment vs box slab test.
	pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
		let dir = self.direction();
		let mut t_min = 0.0_f32;
		let mut t_max = 1.0_f32;

		for axis in 0..3 {
			let origin = self.start[axis];
			let d = dir[axis];
			let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

			if d.abs() <= PARALLEL_EPSILON {
				if origin < lo || origin > hi {
					return false;
				}
				continue;
			}

			let inv = 1.0 / d;
			let mut t0 = (lo - origin) * inv;
			let mut t1 = (hi - origin) * inv;
			if t0 > t1 {
				std::mem::swap(&mut t0, &mut t1);
			}
			t_min = t_min.max(t0);
			t_max = t_max.min(t1);
			if t_min > t_max {
				return false;
			}
		}

		true
	}

	/// Intersection of the XZ (ground plane) projections.
	///
	/// Parallel or collinear segments never intersect; touching endpoints do.
	pub fn intersects_xz(&self, other: &Segment) -> bool {
		self.xz_crossing(other).is_some()
	}

	/// Like [`Segment::intersects_xz`], except that contact at this segment's
	/// own start or end is ignored. A sight line from a point lying on an edge
	/// is not blocked by that edge.
	pub fn crosses_xz(&self, other: &Segment) -> bool {
		self
			.xz_crossing(other)
			.is_some_and(|t| t > ENDPOINT_EPSILON && t < 1.0 - ENDPOINT_EPSILON)
	}

	/// Parameter along `self` where the ground projections meet.
	fn xz_crossing(&self, other: &Segment) -> Option<f32> {
		let p = ground(self.start);
		let r = ground(self.end) - p;
		let q = ground(other.start);
		let s = ground(other.end) - q;

		let denom = r.perp_dot(s);
		if denom.abs() <= PARALLEL_EPSILON {
			return None;
		}

		let qp = q - p;
		let t = qp.perp_dot(s) / denom;
		let u = qp.perp_dot(r) / denom;
		((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some(t)
	}
}

/// Project onto the ground plane.
#[inline]
pub fn ground(point: Vec3) -> Vec2 {
	Vec2::new(point.x, point.z)
}
