//! A* path search over a lazily discovered lattice
//!
//! The lattice is anchored at the start position with a spacing of
//! `step_size` and is never materialized: nodes are created when first reached
//! by 8-directional expansion. Traversability of every step is decided by
//! sweeping the caller's probe from one node to the next and asking the
//! [`SpatialQuery`] whether anything blocks it.
//!
//! # Ordering
//!
//! - `g`: accumulated step cost (axis `step`, diagonal `sqrt(2) * step`)
//! - `h`: straight-line distance to the goal snapped onto the lattice
//! - open nodes pop by smallest `f = g + h`, ties by smaller `h`
//!
//! Each node carries a `queued` flag. An improved node that is still queued
//! has its heap entry rewritten in place; only a node that already left the
//! queue is pushed again.

use crate::core::config::NavigationConfig;
use crate::foundation::collections::MinHeap;
use crate::foundation::math::{constants::SQRT_2, utils, Vec2, LENGTH_EPSILON};
use crate::foundation::time::Stopwatch;
use crate::physics::collision::SweptShape;
use crate::spatial::{CellCoord, SpatialQuery};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// The eight lattice neighbours, axis-aligned first
const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

/// Path search configuration errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum NavigationError {
    /// Step size must be finite and positive
    #[error("Invalid step size: {0}")]
    InvalidStepSize(f32),

    /// Arrival tolerance must be finite and non-negative
    #[error("Invalid arrival tolerance: {0}")]
    InvalidTolerance(f32),

    /// The node budget must allow at least one expansion
    #[error("Node budget must be at least 1")]
    ZeroNodeBudget,
}

/// How a search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A node within arrival tolerance of the goal was reached
    Reached,
    /// Every reachable node was expanded without arriving
    Exhausted,
    /// The expansion budget ran out first
    BudgetExceeded,
    /// Start or goal was not a finite position
    InvalidInput,
}

/// A discovered lattice node, owned by one search run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathNode {
    /// Lattice coordinate relative to the start
    pub cell: CellCoord,
    /// Cost so far
    pub g: f32,
    /// Straight-line estimate to the goal
    pub h: f32,
    /// Currently waiting in the open set
    pub queued: bool,
    /// Index of the predecessor in the run's node arena
    pub parent: Option<usize>,
}

impl PathNode {
    /// Estimated total cost through this node
    pub fn f(&self) -> f32 {
        self.g + self.h
    }
}

/// Search result: waypoints from start to goal
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    waypoints: Vec<Vec2>,
    outcome: SearchOutcome,
    expanded: usize,
}

impl Path {
    fn unreachable(outcome: SearchOutcome, expanded: usize) -> Self {
        Self {
            waypoints: Vec::new(),
            outcome,
            expanded,
        }
    }

    /// Waypoints in travel order; empty when there is no path
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// No path was found
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Number of waypoints
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Last waypoint
    pub fn goal(&self) -> Option<Vec2> {
        self.waypoints.last().copied()
    }

    /// Polyline length through every waypoint
    pub fn length(&self) -> f32 {
        self.waypoints.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// How the search ended
    pub const fn outcome(&self) -> SearchOutcome {
        self.outcome
    }

    /// Nodes expanded by the search
    pub const fn expanded(&self) -> usize {
        self.expanded
    }
}

/// Open-set entry: snapshot of `(f, h)` plus the node index
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f32,
    h: f32,
    node: usize,
}

type OpenSet = MinHeap<OpenEntry, fn(&OpenEntry, &OpenEntry) -> Ordering>;

fn open_order(a: &OpenEntry, b: &OpenEntry) -> Ordering {
    a.f.total_cmp(&b.f)
        .then_with(|| a.h.total_cmp(&b.h))
        .then_with(|| a.node.cmp(&b.node))
}

/// A* search parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PathSearch {
    step_size: f32,
    arrival_tolerance: f32,
    max_expanded_nodes: usize,
}

impl PathSearch {
    /// Creates a search with the given lattice spacing, arrival tolerance and
    /// expansion budget
    pub fn new(
        step_size: f32,
        arrival_tolerance: f32,
        max_expanded_nodes: usize,
    ) -> Result<Self, NavigationError> {
        if !(step_size.is_finite() && step_size > 0.0) {
            log::warn!("Rejecting path search step size {step_size}");
            return Err(NavigationError::InvalidStepSize(step_size));
        }
        if !(arrival_tolerance.is_finite() && arrival_tolerance >= 0.0) {
            log::warn!("Rejecting path search arrival tolerance {arrival_tolerance}");
            return Err(NavigationError::InvalidTolerance(arrival_tolerance));
        }
        if max_expanded_nodes == 0 {
            log::warn!("Rejecting empty path search node budget");
            return Err(NavigationError::ZeroNodeBudget);
        }
        Ok(Self {
            step_size,
            arrival_tolerance,
            max_expanded_nodes,
        })
    }

    /// Creates a search from configuration
    pub fn from_config(config: &NavigationConfig) -> Result<Self, NavigationError> {
        Self::new(
            config.step_size,
            config.arrival_tolerance,
            config.max_expanded_nodes,
        )
    }

    /// Lattice spacing
    pub const fn step_size(&self) -> f32 {
        self.step_size
    }

    /// Arrival tolerance
    pub const fn arrival_tolerance(&self) -> f32 {
        self.arrival_tolerance
    }

    /// Expansion budget
    pub const fn max_expanded_nodes(&self) -> usize {
        self.max_expanded_nodes
    }

    /// Finds waypoints from `start` to `goal` that `probe` can sweep along
    /// without touching an obstacle
    ///
    /// Runs to success, exhaustion or budget in one call. The probe is
    /// re-parameterized for every test and left at an unspecified pose.
    pub fn find_path<Q>(&self, world: &Q, probe: &mut SweptShape, start: Vec2, goal: Vec2) -> Path
    where
        Q: SpatialQuery + ?Sized,
    {
        if !utils::is_finite(start) || !utils::is_finite(goal) {
            log::warn!("Path search with non-finite endpoints {start:?} -> {goal:?}");
            return Path::unreachable(SearchOutcome::InvalidInput, 0);
        }

        let stopwatch = Stopwatch::start_new();
        let mut run = SearchRun::new(self, world, probe, start, goal);
        let path = run.execute();

        log::debug!(
            "Path search {start:?} -> {goal:?}: {:?}, {} waypoints, {} expanded, {} discovered, {} restricted in {:.3} ms",
            path.outcome,
            path.len(),
            path.expanded,
            run.nodes.len(),
            run.restricted.len(),
            stopwatch.elapsed_millis()
        );
        path
    }
}

/// State of one search; owns the node arena
struct SearchRun<'a, Q: ?Sized> {
    search: &'a PathSearch,
    world: &'a Q,
    probe: &'a mut SweptShape,
    start: Vec2,
    goal: Vec2,
    goal_cell: CellCoord,
    nodes: Vec<PathNode>,
    index: HashMap<CellCoord, usize>,
    restricted: HashSet<CellCoord>,
}

impl<'a, Q> SearchRun<'a, Q>
where
    Q: SpatialQuery + ?Sized,
{
    fn new(
        search: &'a PathSearch,
        world: &'a Q,
        probe: &'a mut SweptShape,
        start: Vec2,
        goal: Vec2,
    ) -> Self {
        let offset = (goal - start) / search.step_size;
        let goal_cell = CellCoord::new(offset.x.round() as i32, offset.y.round() as i32);
        Self {
            search,
            world,
            probe,
            start,
            goal,
            goal_cell,
            nodes: Vec::new(),
            index: HashMap::new(),
            restricted: HashSet::new(),
        }
    }

    fn position(&self, cell: CellCoord) -> Vec2 {
        self.start + Vec2::new(cell.x as f32, cell.y as f32) * self.search.step_size
    }

    fn heuristic(&self, cell: CellCoord) -> f32 {
        (self.position(self.goal_cell) - self.position(cell)).norm()
    }

    fn is_blocked(&mut self, from: Vec2, to: Vec2) -> bool {
        let rotation = utils::angle_of(to - from).unwrap_or(0.0);
        self.probe.sweep_between(from, to, rotation);
        self.world.restriction_query(&*self.probe)
    }

    fn add_node(&mut self, cell: CellCoord, g: f32, parent: Option<usize>) -> usize {
        let node = self.nodes.len();
        self.nodes.push(PathNode {
            cell,
            g,
            h: self.heuristic(cell),
            queued: true,
            parent,
        });
        self.index.insert(cell, node);
        node
    }

    fn execute(&mut self) -> Path {
        let mut open: OpenSet = MinHeap::new(open_order);
        let origin = CellCoord::default();
        let first = self.add_node(origin, 0.0, None);
        open.push(self.entry(first));

        let mut expanded = 0;
        while let Some(OpenEntry { node: current, .. }) = open.pop() {
            self.nodes[current].queued = false;
            let PathNode { cell, g, h, .. } = self.nodes[current];

            if cell == self.goal_cell || h <= self.search.arrival_tolerance {
                return Path {
                    waypoints: self.extract_waypoints(current),
                    outcome: SearchOutcome::Reached,
                    expanded,
                };
            }
            if expanded >= self.search.max_expanded_nodes {
                return Path::unreachable(SearchOutcome::BudgetExceeded, expanded);
            }
            expanded += 1;

            let from = self.position(cell);
            for (dx, dy) in NEIGHBORS {
                let neighbor = CellCoord::new(cell.x + dx, cell.y + dy);
                if self.restricted.contains(&neighbor) {
                    continue;
                }
                let to = self.position(neighbor);
                if self.is_blocked(from, to) {
                    self.restricted.insert(neighbor);
                    continue;
                }

                let step = if dx != 0 && dy != 0 { SQRT_2 } else { 1.0 };
                let tentative = g + step * self.search.step_size;
                match self.index.get(&neighbor).copied() {
                    None => {
                        let node = self.add_node(neighbor, tentative, Some(current));
                        open.push(self.entry(node));
                    }
                    Some(node) if tentative + LENGTH_EPSILON < self.nodes[node].g => {
                        self.relax(&mut open, node, tentative, current);
                    }
                    Some(_) => {}
                }
            }
        }

        Path::unreachable(SearchOutcome::Exhausted, expanded)
    }

    /// Lowers the cost of a discovered node, now reached through `parent`
    ///
    /// A node still in the heap has its entry rewritten in place; one that
    /// already left it is pushed again. The heuristic is consistent, so an
    /// expanded node only improves by float noise on the lattice, but the
    /// re-push keeps the search correct regardless.
    fn relax(&mut self, open: &mut OpenSet, node: usize, g: f32, parent: usize) {
        self.nodes[node].g = g;
        self.nodes[node].parent = Some(parent);
        let entry = self.entry(node);
        if self.nodes[node].queued {
            open.adjust(|queued| queued.node == node, |queued| *queued = entry);
        } else {
            self.nodes[node].queued = true;
            open.push(entry);
        }
    }

    fn entry(&self, node: usize) -> OpenEntry {
        let PathNode { g, h, .. } = self.nodes[node];
        OpenEntry { f: g + h, h, node }
    }

    /// Walks parents back from `reached`, keeping only the turns
    ///
    /// A node is kept when sweeping from the node's parent straight to the
    /// last kept waypoint would be blocked. Legs are swept in travel
    /// direction, as during the search, so asymmetric probes see the same
    /// footprint the mover will.
    fn extract_waypoints(&mut self, reached: usize) -> Vec<Vec2> {
        let mut chain = Vec::new();
        let reached_position = self.position(self.nodes[reached].cell);
        if self.nodes[reached].cell == self.goal_cell
            && (self.goal - reached_position).norm() > LENGTH_EPSILON
            && !self.is_blocked(reached_position, self.goal)
        {
            chain.push(self.goal);
        }
        let mut cursor = Some(reached);
        while let Some(node) = cursor {
            chain.push(self.position(self.nodes[node].cell));
            cursor = self.nodes[node].parent;
        }

        let mut waypoints = Vec::with_capacity(chain.len());
        let mut anchor = chain[0];
        waypoints.push(anchor);
        for pair in chain.windows(2) {
            let (node, parent) = (pair[0], pair[1]);
            if self.is_blocked(parent, anchor) {
                waypoints.push(node);
                anchor = node;
            }
        }
        if let Some(&start) = chain.last() {
            if chain.len() > 1 {
                waypoints.push(start);
            }
        }
        waypoints.reverse();
        waypoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::{CollisionShape, Shape};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    fn probe(radius: f32) -> SweptShape {
        SweptShape::new(CollisionShape::circle(radius).unwrap())
    }

    fn search(step: f32, tolerance: f32) -> PathSearch {
        PathSearch::new(step, tolerance, 4096).unwrap()
    }

    /// Every leg of the path is clear for the probe
    fn assert_path_clear(walls: &[Shape], path: &Path, radius: f32) {
        let mut legs = probe(radius);
        for leg in path.waypoints().windows(2) {
            legs.sweep_between(leg[0], leg[1], 0.0);
            assert!(!walls.restriction_query(&legs), "leg {leg:?} is blocked");
        }
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert_eq!(PathSearch::new(0.0, 0.5, 10), Err(NavigationError::InvalidStepSize(0.0)));
        assert!(matches!(
            PathSearch::new(1.0, -1.0, 10),
            Err(NavigationError::InvalidTolerance(_))
        ));
        assert_eq!(PathSearch::new(1.0, 0.5, 0), Err(NavigationError::ZeroNodeBudget));
        assert!(PathSearch::from_config(&NavigationConfig::default()).is_ok());
    }

    #[test]
    fn test_straight_line_without_obstacles() {
        let walls: Vec<Shape> = Vec::new();
        let path = search(1.0, 0.0).find_path(
            walls.as_slice(),
            &mut probe(0.25),
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.0),
        );

        assert_eq!(path.outcome(), SearchOutcome::Reached);
        assert_eq!(path.waypoints(), &[Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0)]);
    }

    #[test]
    fn test_open_field_path_is_a_single_optimal_segment() {
        let walls: Vec<Shape> = Vec::new();
        let start = Vec2::new(1.0, -2.0);
        let goal = Vec2::new(8.3, 4.6);
        let path = search(1.0, 0.5).find_path(walls.as_slice(), &mut probe(0.25), start, goal);

        assert_eq!(path.len(), 2);
        assert_relative_eq!(path.waypoints()[0], start, epsilon = EPSILON);
        assert_relative_eq!(path.waypoints()[1], goal, epsilon = EPSILON);
        assert_relative_eq!(path.length(), (goal - start).norm(), epsilon = EPSILON);
    }

    #[test]
    fn test_start_at_goal() {
        let walls: Vec<Shape> = Vec::new();
        let path = search(1.0, 0.0).find_path(
            walls.as_slice(),
            &mut probe(0.25),
            Vec2::new(2.0, 2.0),
            Vec2::new(2.0, 2.0),
        );
        assert_eq!(path.waypoints(), &[Vec2::new(2.0, 2.0)]);
        assert_eq!(path.expanded(), 0);
    }

    #[test]
    fn test_detours_around_a_wall() {
        let walls = vec![Shape::rectangle(Vec2::new(5.0, 0.0), 1.0, 8.0).unwrap()];
        let start = Vec2::new(0.0, 0.0);
        let goal = Vec2::new(10.0, 0.0);
        let path = search(1.0, 0.0).find_path(walls.as_slice(), &mut probe(0.3), start, goal);

        assert_eq!(path.outcome(), SearchOutcome::Reached);
        assert!(path.len() >= 3, "expected a turn, got {:?}", path.waypoints());
        assert_eq!(path.waypoints().first(), Some(&start));
        assert_relative_eq!(path.goal().unwrap(), goal, epsilon = EPSILON);
        assert!(path.length() > (goal - start).norm());
        assert_path_clear(&walls, &path, 0.3);
    }

    #[test]
    fn test_enclosed_goal_has_no_path() {
        // Unbroken ring of walls around the goal at (10, 0)
        let center = Vec2::new(10.0, 0.0);
        let walls = vec![
            Shape::rectangle(center + Vec2::new(0.0, 3.0), 7.0, 1.0).unwrap(),
            Shape::rectangle(center + Vec2::new(0.0, -3.0), 7.0, 1.0).unwrap(),
            Shape::rectangle(center + Vec2::new(3.0, 0.0), 1.0, 7.0).unwrap(),
            Shape::rectangle(center + Vec2::new(-3.0, 0.0), 1.0, 7.0).unwrap(),
        ];
        let path = PathSearch::new(1.0, 0.0, 600).unwrap().find_path(
            walls.as_slice(),
            &mut probe(0.3),
            Vec2::zeros(),
            center,
        );

        assert!(path.is_empty());
        assert_eq!(path.outcome(), SearchOutcome::BudgetExceeded);
    }

    #[test]
    fn test_sealed_start_exhausts_open_set() {
        let walls = vec![Shape::circle(Vec2::zeros(), 0.5).unwrap()];
        // The probe starts inside an obstacle, so every step is blocked
        let path = search(1.0, 0.0).find_path(
            walls.as_slice(),
            &mut probe(0.3),
            Vec2::zeros(),
            Vec2::new(4.0, 0.0),
        );
        assert!(path.is_empty());
        assert_eq!(path.outcome(), SearchOutcome::Exhausted);
        assert_eq!(path.expanded(), 1);
    }

    #[test]
    fn test_non_finite_endpoints() {
        let walls: Vec<Shape> = Vec::new();
        let path = search(1.0, 0.0).find_path(
            walls.as_slice(),
            &mut probe(0.3),
            Vec2::new(f32::NAN, 0.0),
            Vec2::zeros(),
        );
        assert_eq!(path.outcome(), SearchOutcome::InvalidInput);
        assert!(path.is_empty());
    }

    #[test]
    fn test_blocked_goal_cell_arrives_within_tolerance() {
        // The goal sits inside a post, so its lattice node is never enterable
        let goal = Vec2::new(5.6, 0.0);
        let walls = vec![Shape::circle(goal, 0.3).unwrap()];
        let path = search(1.0, 1.0).find_path(walls.as_slice(), &mut probe(0.2), Vec2::zeros(), goal);

        assert_eq!(path.outcome(), SearchOutcome::Reached);
        let last = path.goal().unwrap();
        assert!((last - Vec2::new(6.0, 0.0)).norm() <= 1.0 + EPSILON);
        assert!(!walls.as_slice().restriction_query(&Shape::circle(last, 0.2).unwrap()));
    }

    fn arrowhead() -> SweptShape {
        SweptShape::new(
            CollisionShape::polygon(vec![
                Vec2::new(1.5, 0.0),
                Vec2::new(-0.2, 0.2),
                Vec2::new(-0.2, -0.2),
            ])
            .unwrap(),
        )
    }

    fn leg_blocked(walls: &[Shape], probe: &mut SweptShape, from: Vec2, to: Vec2) -> bool {
        probe.sweep_between(from, to, utils::angle_of(to - from).unwrap_or(0.0));
        walls.restriction_query(&*probe)
    }

    #[test]
    fn test_simplified_legs_are_swept_in_travel_direction() {
        // The arrowhead reaches 1.5 ahead of its pose; a post just past the
        // goal on the straight line only blocks the forward-facing sweep
        let start = Vec2::zeros();
        let goal = Vec2::new(4.0, 1.0);
        let post = goal + (goal - start).normalize() * 1.4;
        let walls = vec![Shape::circle(post, 0.1).unwrap()];
        let mut legs = arrowhead();
        assert!(leg_blocked(&walls, &mut legs, start, goal));

        let path = search(1.0, 0.0).find_path(walls.as_slice(), &mut arrowhead(), start, goal);

        assert_eq!(path.outcome(), SearchOutcome::Reached);
        assert!(path.len() >= 3, "expected a turn, got {:?}", path.waypoints());
        assert_eq!(path.waypoints().first(), Some(&start));
        assert_relative_eq!(path.goal().unwrap(), goal, epsilon = EPSILON);
        for leg in path.waypoints().windows(2) {
            assert!(!leg_blocked(&walls, &mut legs, leg[0], leg[1]), "leg {leg:?} is blocked");
        }
    }

    #[test]
    fn test_relax_rewrites_queued_entry_in_place() {
        let walls: Vec<Shape> = Vec::new();
        let search = search(1.0, 0.0);
        let mut body = probe(0.25);
        let mut run = SearchRun::new(&search, walls.as_slice(), &mut body, Vec2::zeros(), Vec2::new(5.0, 0.0));
        let mut open: OpenSet = MinHeap::new(open_order);
        let origin = run.add_node(CellCoord::default(), 0.0, None);
        let node = run.add_node(CellCoord::new(1, 0), 3.0, Some(origin));
        open.push(run.entry(node));

        run.relax(&mut open, node, 1.0, origin);

        assert_eq!(open.len(), 1);
        let entry = open.pop().unwrap();
        assert_eq!(entry.node, node);
        assert_relative_eq!(entry.f, 5.0, epsilon = EPSILON);
        assert_relative_eq!(run.nodes[node].g, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_relax_requeues_expanded_node() {
        let walls: Vec<Shape> = Vec::new();
        let search = search(1.0, 0.0);
        let mut body = probe(0.25);
        let mut run = SearchRun::new(&search, walls.as_slice(), &mut body, Vec2::zeros(), Vec2::new(5.0, 0.0));
        let mut open: OpenSet = MinHeap::new(open_order);
        let origin = run.add_node(CellCoord::default(), 0.0, None);
        let other = run.add_node(CellCoord::new(0, 1), 1.0, Some(origin));
        let node = run.add_node(CellCoord::new(1, 0), 3.0, Some(other));
        // Already popped and expanded
        run.nodes[node].queued = false;

        run.relax(&mut open, node, 1.0, origin);

        assert!(run.nodes[node].queued);
        assert_eq!(run.nodes[node].parent, Some(origin));
        assert_eq!(open.len(), 1);
        let entry = open.pop().unwrap();
        assert_eq!(entry.node, node);
        assert_relative_eq!(entry.f, 5.0, epsilon = EPSILON);
    }
}
