//! Host-side endpoint planning for dash paths.

use glam::Vec3;

use crate::Aabb;

/// Static geometry that blocks clipped dashes.
pub trait ObstacleQuery {
    /// Distance to the first obstacle along `direction` (unit length) from
    /// `origin`, within `max_distance`.
    fn first_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32>;
}

impl ObstacleQuery for [Aabb] {
    fn first_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        self.iter()
            .filter_map(|aabb| aabb.ray_hit(origin, direction, max_distance))
            .min_by(f32::total_cmp)
    }
}

impl ObstacleQuery for Vec<Aabb> {
    fn first_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        self.as_slice().first_hit(origin, direction, max_distance)
    }
}

/// How a path treats obstacles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathMode {
    /// Stop `skin` short of the first obstacle.
    Clipped { skin: f32 },
    /// Pass through everything.
    Piercing,
}

/// Endpoints of a dash.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedPath {
    pub start: Vec3,
    pub end: Vec3,
    /// An obstacle shortened the path.
    pub blocked: bool,
}

impl PlannedPath {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Plans a straight dash of up to `distance` along `direction`.
///
/// A zero direction yields a zero-length path at `start`.
pub fn plan_path(
    start: Vec3,
    direction: Vec3,
    distance: f32,
    mode: PathMode,
    obstacles: &dyn ObstacleQuery,
) -> PlannedPath {
    let dir = direction.normalize_or_zero();
    let distance = distance.max(0.0);
    if dir == Vec3::ZERO || distance == 0.0 {
        return PlannedPath {
            start,
            end: start,
            blocked: false,
        };
    }
    match mode {
        PathMode::Piercing => PlannedPath {
            start,
            end: start + dir * distance,
            blocked: false,
        },
        PathMode::Clipped { skin } => match obstacles.first_hit(start, dir, distance) {
            Some(hit) => PlannedPath {
                start,
                end: start + dir * (hit - skin).max(0.0),
                blocked: true,
            },
            None => PlannedPath {
                start,
                end: start + dir * distance,
                blocked: false,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_at_x(x: f32) -> Vec<Aabb> {
        vec![Aabb::new(
            Vec3::new(x, -1.0, -5.0),
            Vec3::new(x + 1.0, 3.0, 5.0),
        )]
    }

    #[test]
    fn test_clipped_path_stops_before_wall() {
        let path = plan_path(
            Vec3::ZERO,
            Vec3::X,
            10.0,
            PathMode::Clipped { skin: 0.25 },
            &wall_at_x(4.0),
        );
        assert!(path.blocked);
        assert!((path.end.x - 3.75).abs() < 1e-5);
    }

    #[test]
    fn test_piercing_path_ignores_wall() {
        let path = plan_path(
            Vec3::ZERO,
            Vec3::new(2.0, 0.0, 0.0),
            10.0,
            PathMode::Piercing,
            &wall_at_x(4.0),
        );
        assert!(!path.blocked);
        assert_eq!(path.end, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_clear_path_full_length() {
        let path = plan_path(
            Vec3::ZERO,
            Vec3::Z,
            6.0,
            PathMode::Clipped { skin: 0.25 },
            &wall_at_x(4.0),
        );
        assert!(!path.blocked);
        assert!((path.length() - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_nearest_obstacle_wins() {
        let mut walls = wall_at_x(8.0);
        walls.extend(wall_at_x(3.0));
        let path = plan_path(Vec3::ZERO, Vec3::X, 20.0, PathMode::Clipped { skin: 0.0 }, &walls);
        assert!((path.end.x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_direction_stays_put() {
        let start = Vec3::new(1.0, 0.0, 1.0);
        let path = plan_path(start, Vec3::ZERO, 5.0, PathMode::Piercing, &Vec::<Aabb>::new());
        assert_eq!(path.end, start);
    }
}
