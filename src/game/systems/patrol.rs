//! Monster patrol routes.
//!
//! Every peer walks the same looping route at the same speed, so monsters
//! stay in step without streaming positions.

use serde::{Deserialize, Serialize};

use crate::game::types::Vec3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolRoute {
    points: Vec<Vec3>,
    next: usize,
}

impl PatrolRoute {
    /// `None` for an empty route.
    pub fn new(points: Vec<Vec3>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let next = 1 % points.len();
        Some(Self { points, next })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn start(&self) -> Vec3 {
        self.points[0]
    }

    pub fn next_point(&self) -> Vec3 {
        self.points[self.next]
    }

    /// Walk `position` toward the next waypoint by `speed * dt`, moving on to
    /// the following one (wrapping) once within `reached`.
    pub fn step(&mut self, position: Vec3, speed: f32, dt: f32, reached: f32) -> Vec3 {
        let target = self.points[self.next];
        let distance = position.distance(target);
        let moved = if distance <= f32::EPSILON {
            target
        } else {
            let step = (speed * dt).min(distance);
            position + (target - position).normalized() * step
        };
        if moved.distance(target) <= reached {
            self.next = (self.next + 1) % self.points.len();
        }
        moved
    }
}
