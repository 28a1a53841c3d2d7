//! Static 2D environment and translation-shiftable collision shapes

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::common::Point2D;

/// Static obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Obstacle {
    Circle { center: Point2D, radius: f64 },
    /// Axis-aligned box given by its center and full side lengths
    Box { center: Point2D, size: Point2D },
}

impl Obstacle {
    pub fn circle(x: f64, y: f64, radius: f64) -> Self {
        Obstacle::Circle {
            center: Point2D::new(x, y),
            radius,
        }
    }

    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Obstacle::Box {
            center: Point2D::new(x, y),
            size: Point2D::new(width, height),
        }
    }

    /// Signed distance from `p` to the obstacle boundary (negative inside)
    pub fn signed_distance(&self, p: &Point2D) -> f64 {
        match self {
            Obstacle::Circle { center, radius } => center.distance(p) - radius,
            Obstacle::Box { center, size } => {
                let dx = (p.x - center.x).abs() - size.x / 2.0;
                let dy = (p.y - center.y).abs() - size.y / 2.0;
                let outside = (dx.max(0.0).powi(2) + dy.max(0.0).powi(2)).sqrt();
                let inside = dx.max(dy).min(0.0);
                outside + inside
            }
        }
    }
}

/// Workspace bounds plus obstacles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub min: Point2D,
    pub max: Point2D,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl Environment {
    pub fn new(min: Vector2<f64>, max: Vector2<f64>, obstacles: Vec<Obstacle>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
            obstacles,
        }
    }

    pub fn empty(min: Vector2<f64>, max: Vector2<f64>) -> Self {
        Self::new(min, max, Vec::new())
    }

    pub fn contains(&self, p: &Point2D) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Clearance of a disk centered at `p` (negative means penetration)
    pub fn clearance(&self, p: &Point2D, radius: f64) -> f64 {
        self.obstacles
            .iter()
            .map(|o| o.signed_distance(p) - radius)
            .fold(f64::INFINITY, f64::min)
    }
}

/// Disk of the robot footprint at one primitive state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    pub center: Point2D,
    pub radius: f64,
}

/// Footprint swept by a canonical primitive.
///
/// Valid for robots whose primitive alignment is a pure translation: the
/// shape of an aligned primitive is this shape shifted by the offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionShape {
    pub disks: Vec<Disk>,
}

impl CollisionShape {
    pub fn new(disks: Vec<Disk>) -> Self {
        Self { disks }
    }

    /// True if the shape moved by `shift` overlaps any obstacle
    pub fn collides(&self, shift: &Vector2<f64>, env: &Environment) -> bool {
        self.disks
            .iter()
            .any(|d| env.clearance(&d.center.shifted(shift), d.radius) < 0.0)
    }
}
