//! Uniform grid spatial hash
//!
//! The world is cut into square cells of a fixed size. The grid maps each
//! occupied cell to the ids registered there; each object keeps its own
//! [`CellMembership`] (the keys it currently occupies), so membership can be
//! updated incrementally without scanning the grid.
//!
//! # Invariant
//!
//! After [`ChunkGrid::update_membership`] an object is listed in exactly the
//! cells its shape overlaps, and its membership holds exactly those keys.

use super::cell_key::{CellCoord, CellKey};
use crate::core::config::GridConfig;
use crate::foundation::math::Vec2;
use crate::physics::collision::{Aabb, Collidable};
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Row span widening, as a fraction of the cell size
const ROW_MARGIN: f32 = 0.01;

/// Chunk grid errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Cell size must be finite and positive
    #[error("Invalid cell size: {0}")]
    InvalidCellSize(f32),
}

/// Cells an object currently occupies
///
/// Owned by the tracked object, read and written by the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellMembership {
    cells: BTreeSet<CellKey>,
}

impl CellMembership {
    /// Empty membership (unregistered)
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupied cell keys in key order
    pub fn cells(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.cells.iter().copied()
    }

    /// Whether the object occupies `key`
    pub fn contains(&self, key: CellKey) -> bool {
        self.cells.contains(&key)
    }

    /// Number of occupied cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Occupies no cell
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Inclusive rectangle of cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// Lowest column and row
    pub min: CellCoord,
    /// Highest column and row
    pub max: CellCoord,
}

impl CellRange {
    /// Number of cells in the range
    pub fn cell_count(&self) -> u64 {
        let width = (i64::from(self.max.x) - i64::from(self.min.x) + 1) as u64;
        let height = (i64::from(self.max.y) - i64::from(self.min.y) + 1) as u64;
        width * height
    }

    /// Whether `coord` lies inside the range
    pub fn contains(&self, coord: CellCoord) -> bool {
        (self.min.x..=self.max.x).contains(&coord.x) && (self.min.y..=self.max.y).contains(&coord.y)
    }

    /// Every coordinate, row by row
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| CellCoord { x, y }))
    }
}

/// Cells gained and lost by one membership update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MembershipChange {
    /// Newly occupied cells
    pub added: usize,
    /// Cells no longer occupied
    pub removed: usize,
}

impl MembershipChange {
    /// Nothing changed
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Uniform grid of square cells keyed by [`CellKey`]
#[derive(Debug, Clone)]
pub struct ChunkGrid<K> {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<K>>,
}

impl<K> ChunkGrid<K>
where
    K: Copy + Eq + Hash + Ord,
{
    /// Creates an empty grid with square cells of edge `cell_size`
    pub fn new(cell_size: f32) -> Result<Self, GridError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            log::warn!("Rejecting chunk grid cell size {cell_size}");
            return Err(GridError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            cells: HashMap::new(),
        })
    }

    /// Creates an empty grid from configuration
    pub fn from_config(config: &GridConfig) -> Result<Self, GridError> {
        Self::new(config.cell_size)
    }

    /// Cell edge length
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cells covering `bounds`, `None` when the bounds are not usable
    pub fn cell_range(&self, bounds: &Aabb) -> Option<CellRange> {
        if !bounds.is_valid() {
            return None;
        }
        Some(CellRange {
            min: CellCoord::containing(bounds.min, self.cell_size),
            max: CellCoord::containing(bounds.max, self.cell_size),
        })
    }

    /// World-space area of the cell with key `key`
    pub fn cell_bounds(&self, key: CellKey) -> Aabb {
        key.decode().bounds(self.cell_size)
    }

    /// Registers `id` in every cell `shape` overlaps
    ///
    /// Equivalent to an update from an empty membership.
    pub fn register(
        &mut self,
        id: K,
        shape: &dyn Collidable,
        membership: &mut CellMembership,
    ) -> MembershipChange {
        self.update_membership(id, shape, membership)
    }

    /// Brings `membership` and the grid in line with the current shape
    ///
    /// Cells the shape left are dropped first, then every candidate cell under
    /// the current bounds that the shape overlaps and that is not yet held is
    /// added. Candidates are narrowed row by row to the shape's horizontal
    /// extent in that row, so a long diagonal shape costs roughly the cells it
    /// covers rather than its whole bounding box.
    pub fn update_membership(
        &mut self,
        id: K,
        shape: &dyn Collidable,
        membership: &mut CellMembership,
    ) -> MembershipChange {
        let mut change = MembershipChange::default();
        let cell_size = self.cell_size;

        membership.cells.retain(|&key| {
            let keep = shape.overlaps_area(&key.decode().bounds(cell_size));
            if !keep {
                remove_from_cell(&mut self.cells, key, id);
                change.removed += 1;
            }
            keep
        });

        if let Some(range) = self.cell_range(&shape.bounds()) {
            let view = shape.view();
            let margin = cell_size * ROW_MARGIN;
            for y in range.min.y..=range.max.y {
                // Only the columns the shape reaches inside this row
                let row_min = y as f32 * cell_size;
                let Some((left, right)) =
                    view.span_in_band(row_min - margin, row_min + cell_size + margin)
                else {
                    continue;
                };
                let first = CellCoord::containing(Vec2::new(left - margin, row_min), cell_size).x;
                let last = CellCoord::containing(Vec2::new(right + margin, row_min), cell_size).x;
                for x in first.max(range.min.x)..=last.min(range.max.x) {
                    let coord = CellCoord::new(x, y);
                    let key = coord.key();
                    if membership.cells.contains(&key)
                        || !shape.overlaps_area(&coord.bounds(cell_size))
                    {
                        continue;
                    }
                    self.cells.entry(key).or_default().push(id);
                    membership.cells.insert(key);
                    change.added += 1;
                }
            }
        }

        if !change.is_empty() {
            log::trace!(
                "Cell membership changed: +{} -{} ({} held)",
                change.added,
                change.removed,
                membership.len()
            );
        }
        change
    }

    /// Removes `id` from every cell in `membership` and clears it
    ///
    /// An empty membership (unknown or already removed object) is a no-op.
    pub fn unregister(&mut self, id: K, membership: &mut CellMembership) {
        for key in std::mem::take(&mut membership.cells) {
            remove_from_cell(&mut self.cells, key, id);
        }
    }

    /// Ids registered in the cell `key`
    pub fn objects_in_cell(&self, key: CellKey) -> &[K] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct ids registered in any cell under `bounds`, sorted by id
    ///
    /// Bounds that cover no cell (invalid or non-finite) give an empty list.
    pub fn candidates(&self, bounds: &Aabb) -> Vec<K> {
        let Some(range) = self.cell_range(bounds) else {
            return Vec::new();
        };

        let mut found = Vec::new();
        if range.cell_count() > self.cells.len() as u64 {
            // Probe is larger than the occupied area; walk occupied cells instead
            for (key, ids) in &self.cells {
                if range.contains(key.decode()) {
                    found.extend_from_slice(ids);
                }
            }
        } else {
            for coord in range.iter() {
                if let Some(ids) = self.cells.get(&coord.key()) {
                    found.extend_from_slice(ids);
                }
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Number of cells holding at least one object
    pub fn occupied_cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether no object is registered anywhere
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Drops every registration
    ///
    /// Object memberships are not touched; callers clear their own.
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

fn remove_from_cell<K: Copy + Eq>(cells: &mut HashMap<CellKey, Vec<K>>, key: CellKey, id: K) {
    if let Some(ids) = cells.get_mut(&key) {
        if let Some(index) = ids.iter().position(|&other| other == id) {
            ids.swap_remove(index);
        }
        if ids.is_empty() {
            cells.remove(&key);
        }
    }
}
