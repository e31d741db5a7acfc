//! Attract-mode camera tour over the arena.

use crate::utils::lerp_vec3;
use macroquad::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraWaypoint {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Seconds spent travelling from this waypoint to the next one
    pub duration: f32,
}

/// Camera position and target for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

/// Loops through a fixed list of waypoints, interpolating linearly between
/// consecutive ones.
#[derive(Debug, Clone)]
pub struct Marquee {
    waypoints: Vec<CameraWaypoint>,
    current: usize,
    elapsed: f32,
}

impl Marquee {
    pub fn new(waypoints: Vec<CameraWaypoint>) -> Self {
        Marquee {
            waypoints,
            current: 0,
            elapsed: 0.0,
        }
    }

    /// Default sweep around an arena of the given half extent
    pub fn tour(half_extent: f32) -> Self {
        let h = half_extent;
        let waypoint = |position: Vec3, look_at: Vec3, duration: f32| CameraWaypoint {
            position,
            look_at,
            duration,
        };
        Marquee::new(vec![
            waypoint(Vec3::new(0.0, h * 0.6, -h * 1.2), Vec3::ZERO, 6.0),
            waypoint(Vec3::new(h * 1.1, h * 0.3, 0.0), Vec3::new(0.0, 5.0, 0.0), 6.0),
            waypoint(Vec3::new(h * 0.3, 15.0, h * 0.3), Vec3::new(-h * 0.3, 0.0, -h * 0.3), 5.0),
            waypoint(Vec3::new(-h, h * 0.4, h), Vec3::ZERO, 6.0),
            waypoint(Vec3::new(0.0, h * 1.5, 1.0), Vec3::ZERO, 4.0),
        ])
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn update(&mut self, dt: f32) {
        if self.waypoints.len() < 2 {
            return;
        }
        self.elapsed += dt.max(0.0);
        // A long frame may skip several legs
        for _ in 0..self.waypoints.len() {
            let duration = self.waypoints[self.current].duration;
            if self.elapsed < duration {
                break;
            }
            self.elapsed -= duration.max(0.0);
            self.current = (self.current + 1) % self.waypoints.len();
        }
    }

    pub fn pose(&self) -> Option<CameraPose> {
        let from = self.waypoints.get(self.current)?;
        let to = &self.waypoints[(self.current + 1) % self.waypoints.len()];
        let alpha = if from.duration > 0.0 {
            (self.elapsed / from.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Some(CameraPose {
            position: lerp_vec3(from.position, to.position, alpha),
            look_at: lerp_vec3(from.look_at, to.look_at, alpha),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn two_stop() -> Marquee {
        Marquee::new(vec![
            CameraWaypoint {
                position: Vec3::ZERO,
                look_at: Vec3::new(0.0, 0.0, 10.0),
                duration: 2.0,
            },
            CameraWaypoint {
                position: Vec3::new(10.0, 0.0, 0.0),
                look_at: Vec3::new(10.0, 0.0, 10.0),
                duration: 1.0,
            },
        ])
    }

    #[test]
    fn test_interpolates_between_waypoints() {
        let mut marquee = two_stop();
        marquee.update(1.0);
        let pose = marquee.pose().expect("pose");
        assert_approx_eq!(pose.position.x, 5.0);
        assert_approx_eq!(pose.look_at.x, 5.0);
        assert_approx_eq!(pose.look_at.z, 10.0);
    }

    #[test]
    fn test_loops_back_to_start() {
        let mut marquee = two_stop();
        marquee.update(2.5);
        assert_eq!(marquee.current_index(), 1);
        // Halfway along the return leg
        assert_approx_eq!(marquee.pose().expect("pose").position.x, 5.0);
        marquee.update(0.5);
        assert_eq!(marquee.current_index(), 0);
        assert_approx_eq!(marquee.pose().expect("pose").position.x, 0.0);
    }

    #[test]
    fn test_empty_and_single_tours() {
        let mut empty = Marquee::new(Vec::new());
        empty.update(1.0);
        assert!(empty.pose().is_none());

        let mut single = Marquee::new(vec![CameraWaypoint {
            position: Vec3::ONE,
            look_at: Vec3::ZERO,
            duration: 1.0,
        }]);
        single.update(5.0);
        assert_eq!(single.pose().map(|p| p.position), Some(Vec3::ONE));
    }

    #[test]
    fn test_tour_advances_through_waypoints() {
        let mut marquee = Marquee::tour(250.0);
        assert_eq!(marquee.current_index(), 0);
        marquee.update(7.0);
        assert_eq!(marquee.current_index(), 1);
    }
}
