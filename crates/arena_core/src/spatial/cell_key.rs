//! Grid cell coordinates and their integer keys
//!
//! Cells are keyed by a single `u64` built from a signed Cantor pairing:
//! each signed coordinate is zigzag-mapped to a natural number, then the pair
//! is Cantor-paired. The mapping is a bijection, so a key always decodes back
//! to exactly one cell.

use crate::foundation::math::Vec2;
use crate::physics::collision::Aabb;
use std::fmt;

/// Integer coordinate of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CellCoord {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl CellCoord {
    /// Largest absolute coordinate; keeps every key inside `u64`
    pub const MAX_ABS: i32 = (1 << 30) - 1;

    /// Creates a coordinate, clamping both axes into `-MAX_ABS..=MAX_ABS`
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x: x.clamp(-Self::MAX_ABS, Self::MAX_ABS),
            y: y.clamp(-Self::MAX_ABS, Self::MAX_ABS),
        }
    }

    /// Cell containing `point` for square cells of edge `cell_size`
    pub fn containing(point: Vec2, cell_size: f32) -> Self {
        Self::new(
            axis_index(point.x, cell_size),
            axis_index(point.y, cell_size),
        )
    }

    /// World-space area covered by this cell
    pub fn bounds(&self, cell_size: f32) -> Aabb {
        let min = Vec2::new(self.x as f32 * cell_size, self.y as f32 * cell_size);
        Aabb::new(min, min + Vec2::new(cell_size, cell_size))
    }

    /// Center of the cell in world space
    pub fn center(&self, cell_size: f32) -> Vec2 {
        self.bounds(cell_size).center()
    }

    /// Key of this cell
    pub fn key(self) -> CellKey {
        CellKey::encode(self)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

fn axis_index(value: f32, cell_size: f32) -> i32 {
    // `as` saturates on overflow and maps NaN to 0
    (value / cell_size).floor() as i32
}

/// Packed cell identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey(u64);

impl CellKey {
    /// Signed Cantor pairing of `coord`
    pub fn encode(coord: CellCoord) -> Self {
        let coord = CellCoord::new(coord.x, coord.y);
        let a = zigzag(coord.x);
        let b = zigzag(coord.y);
        let sum = a + b;
        Self(sum * (sum + 1) / 2 + b)
    }

    /// Inverse of [`encode`](Self::encode)
    ///
    /// Raw keys that `encode` never produces pair coordinates beyond
    /// [`CellCoord::MAX_ABS`]; those are clamped into range like any other
    /// out-of-range coordinate.
    pub fn decode(self) -> CellCoord {
        let z = u128::from(self.0);
        // Largest w with w(w+1)/2 <= z; the float estimate is off by at most one
        let mut w = ((2 * z) as f64).sqrt() as u128;
        while w * (w + 1) / 2 > z {
            w -= 1;
        }
        while (w + 1) * (w + 2) / 2 <= z {
            w += 1;
        }
        let b = z - w * (w + 1) / 2;
        let a = w - b;
        CellCoord::new(unzigzag(a as u64), unzigzag(b as u64))
    }

    /// Raw integer value
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Rebuilds a key from a raw value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<CellCoord> for CellKey {
    fn from(coord: CellCoord) -> Self {
        Self::encode(coord)
    }
}

impl From<CellKey> for CellCoord {
    fn from(key: CellKey) -> Self {
        key.decode()
    }
}

fn zigzag(n: i32) -> u64 {
    let n = i64::from(n);
    if n >= 0 {
        (2 * n) as u64
    } else {
        (-2 * n - 1) as u64
    }
}

fn unzigzag(z: u64) -> i32 {
    // Halves of a decoded Cantor pair stay below 2^33, so `i64` is exact
    let z = z as i64;
    let n = if z % 2 == 0 { z / 2 } else { -(z + 1) / 2 };
    let limit = i64::from(CellCoord::MAX_ABS);
    n.clamp(-limit, limit) as i32
}
