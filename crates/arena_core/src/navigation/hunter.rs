//! Hunting agent steering
//!
//! A [`Hunter`] chases a moving target. It caches one path and only searches
//! again when the target has drifted too far from the cached goal, and never
//! more often than the configured interval. Between searches it follows the
//! cached waypoints.

use super::astar::{Path, PathSearch};
use crate::core::config::HuntConfig;
use crate::foundation::math::{utils, Vec2};
use crate::foundation::time::Cooldown;
use crate::physics::collision::{CollisionShape, SweptShape};
use crate::spatial::SpatialQuery;

/// Per-tick output of a hunter
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Steering {
    /// Unit vector toward the next waypoint; `None` when idle or arrived
    pub move_direction: Option<Vec2>,
    /// Unit vector toward the target; `None` when standing on it
    pub face_direction: Option<Vec2>,
}

/// Path-following agent with a throttled recompute policy
#[derive(Debug, Clone)]
pub struct Hunter {
    config: HuntConfig,
    search: PathSearch,
    probe: SweptShape,
    path: Option<Path>,
    next_waypoint: usize,
    cooldown: Cooldown,
    searches: u64,
}

impl Hunter {
    /// Creates a hunter whose body is `body` (used as the sweep probe)
    pub fn new(body: CollisionShape, search: PathSearch, config: HuntConfig) -> Self {
        Self {
            cooldown: Cooldown::new(config.recompute_interval),
            config,
            search,
            probe: SweptShape::new(body),
            path: None,
            next_waypoint: 0,
            searches: 0,
        }
    }

    /// Advances timers, recomputes the path when stale and allowed, and
    /// returns where to move and face
    pub fn update<Q>(&mut self, world: &Q, position: Vec2, target: Vec2, delta_time: f32) -> Steering
    where
        Q: SpatialQuery + ?Sized,
    {
        self.cooldown.tick(delta_time);
        if self.cooldown.is_ready() && self.needs_recompute(target) {
            self.recompute(world, position, target);
        }
        self.advance_waypoints(position);

        Steering {
            move_direction: self
                .next_waypoint()
                .and_then(|waypoint| utils::try_normalize(waypoint - position)),
            face_direction: utils::try_normalize(target - position),
        }
    }

    /// Whether the cached path no longer serves `target`
    ///
    /// True with no path at all, after a failed search, or once the target is
    /// more than `recompute_distance` away from the cached goal.
    pub fn needs_recompute(&self, target: Vec2) -> bool {
        match self.path.as_ref().and_then(Path::goal) {
            Some(goal) => (goal - target).norm() > self.config.recompute_distance,
            None => true,
        }
    }

    /// Runs a new search now, ignoring the throttle
    pub fn recompute<Q>(&mut self, world: &Q, position: Vec2, target: Vec2)
    where
        Q: SpatialQuery + ?Sized,
    {
        let path = self.search.find_path(world, &mut self.probe, position, target);
        self.searches += 1;
        if path.is_empty() {
            log::debug!("Hunter at {position:?} found no path to {target:?}; idling");
        }
        // Waypoint 0 is where the search started
        self.next_waypoint = 1;
        self.path = Some(path);
        self.cooldown.reset();
    }

    /// Drops the cached path; the next update searches again once allowed
    pub fn clear_path(&mut self) {
        self.path = None;
        self.next_waypoint = 0;
    }

    /// Cached path
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Waypoint currently steered toward
    pub fn next_waypoint(&self) -> Option<Vec2> {
        self.path
            .as_ref()
            .and_then(|path| path.waypoints().get(self.next_waypoint).copied())
    }

    /// Number of searches run so far
    pub const fn searches(&self) -> u64 {
        self.searches
    }

    /// Active configuration
    pub const fn config(&self) -> &HuntConfig {
        &self.config
    }

    fn advance_waypoints(&mut self, position: Vec2) {
        let Some(path) = self.path.as_ref() else {
            return;
        };
        let waypoints = path.waypoints();
        while self.next_waypoint < waypoints.len()
            && (waypoints[self.next_waypoint] - position).norm() <= self.config.waypoint_radius
        {
            self.next_waypoint += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::Shape;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    fn hunter(config: HuntConfig) -> Hunter {
        Hunter::new(
            CollisionShape::circle(0.3).unwrap(),
            PathSearch::new(1.0, 0.5, 2048).unwrap(),
            config,
        )
    }

    #[test]
    fn test_moves_straight_at_visible_target() {
        let walls: Vec<Shape> = Vec::new();
        let mut hunter = hunter(HuntConfig::default());

        let steering = hunter.update(walls.as_slice(), Vec2::zeros(), Vec2::new(6.0, 0.0), 0.016);

        assert_eq!(hunter.searches(), 1);
        assert_relative_eq!(steering.move_direction.unwrap(), Vec2::new(1.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(steering.face_direction.unwrap(), Vec2::new(1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_small_drift_keeps_cached_path() {
        let walls: Vec<Shape> = Vec::new();
        let mut hunter = hunter(HuntConfig {
            recompute_distance: 2.0,
            recompute_interval: 0.0,
            ..HuntConfig::default()
        });

        hunter.update(walls.as_slice(), Vec2::zeros(), Vec2::new(6.0, 0.0), 0.1);
        hunter.update(walls.as_slice(), Vec2::zeros(), Vec2::new(6.0, 1.5), 0.1);
        assert_eq!(hunter.searches(), 1);

        hunter.update(walls.as_slice(), Vec2::zeros(), Vec2::new(6.0, 2.5), 0.1);
        assert_eq!(hunter.searches(), 2);
    }

    #[test]
    fn test_recompute_is_throttled() {
        let walls: Vec<Shape> = Vec::new();
        let mut hunter = hunter(HuntConfig {
            recompute_distance: 0.5,
            recompute_interval: 1.0,
            ..HuntConfig::default()
        });

        // Target jumps every tick; searches are limited to one per second
        for tick in 0..20 {
            let target = Vec2::new(6.0, tick as f32);
            hunter.update(walls.as_slice(), Vec2::zeros(), target, 0.25);
        }
        // Ready at t = 0, then at 1.0, 2.0, 3.0, 4.0 (ticked up to 5.0)
        assert_eq!(hunter.searches(), 5);
    }

    #[test]
    fn test_advances_through_waypoints_and_stops_on_arrival() {
        let walls = vec![Shape::rectangle(Vec2::new(4.0, 0.0), 1.0, 6.0).unwrap()];
        let mut hunter = hunter(HuntConfig::default());
        let target = Vec2::new(8.0, 0.0);

        let first = hunter.update(walls.as_slice(), Vec2::zeros(), target, 0.016);
        let path = hunter.path().unwrap().clone();
        assert!(path.len() >= 3);
        // The first leg heads for the corner, not straight through the wall
        assert!(first.move_direction.unwrap().y.abs() > 0.1);

        // Stand on each waypoint in turn
        for &waypoint in &path.waypoints()[1..] {
            hunter.update(walls.as_slice(), waypoint, target, 0.016);
        }
        let arrived = hunter.update(walls.as_slice(), target, target, 0.016);
        assert_eq!(arrived.move_direction, None);
        assert_eq!(arrived.face_direction, None);
        assert_eq!(hunter.searches(), 1);
    }

    #[test]
    fn test_unreachable_target_idles_but_faces_it() {
        let walls = vec![Shape::circle(Vec2::zeros(), 0.5).unwrap()];
        let mut hunter = hunter(HuntConfig::default());

        let steering = hunter.update(walls.as_slice(), Vec2::zeros(), Vec2::new(5.0, 0.0), 0.016);

        assert!(hunter.path().unwrap().is_empty());
        assert_eq!(steering.move_direction, None);
        assert!(steering.face_direction.is_some());
        assert!(hunter.needs_recompute(Vec2::new(5.0, 0.0)));
    }
}
