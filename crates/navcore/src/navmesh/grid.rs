//! Flat grid floors.
//!
//! Procedural triangle soup for test levels, benches and the simulation
//! driver. Each cell is a quad split along its `(x0, z1)-(x1, z0)` diagonal,
//! wound so face normals point up.

use glam::Vec3;

use super::node::GeometryTriangle;

/// Full `columns x rows` grid of square cells starting at `origin`.
pub fn grid_floor(columns: usize, rows: usize, cell_size: f32, origin: Vec3) -> Vec<GeometryTriangle> {
  grid_floor_with(columns, rows, cell_size, origin, |_, _| false)
}

/// Grid of square cells, skipping every `(column, row)` where `blocked` is true.
pub fn grid_floor_with(
  columns: usize,
  rows: usize,
  cell_size: f32,
  origin: Vec3,
  blocked: impl Fn(usize, usize) -> bool,
) -> Vec<GeometryTriangle> {
  let mut triangles = Vec::with_capacity(columns * rows * 2);

  for row in 0..rows {
    for column in 0..columns {
      if blocked(column, row) {
        continue;
      }
      let x0 = origin.x + column as f32 * cell_size;
      let z0 = origin.z + row as f32 * cell_size;
      let x1 = x0 + cell_size;
      let z1 = z0 + cell_size;

      let p00 = Vec3::new(x0, origin.y, z0);
      let p10 = Vec3::new(x1, origin.y, z0);
      let p01 = Vec3::new(x0, origin.y, z1);
      let p11 = Vec3::new(x1, origin.y, z1);

      triangles.push(GeometryTriangle::new([p00, p01, p10], [Vec3::Y; 3]));
      triangles.push(GeometryTriangle::new([p10, p01, p11], [Vec3::Y; 3]));
    }
  }

  triangles
}

/// World-space center of a grid cell.
pub fn cell_center(column: usize, row: usize, cell_size: f32, origin: Vec3) -> Vec3 {
  origin + Vec3::new((column as f32 + 0.5) * cell_size, 0.0, (row as f32 + 0.5) * cell_size)
}
