use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A simple 2D vector struct, used both for positions and velocities.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Positions are plain vectors; the alias keeps entity fields readable.
pub type Point2D = Vec2;

impl Vec2 {
    /// Creates a new Vec2.
    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn zero() -> Self {
        Vec2 { x: 0.0, y: 0.0 }
    }

    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns a unit vector in the same direction.
    /// Returns a zero vector if the original vector's length is zero.
    pub fn normalize_or_zero(&self) -> Self {
        let len_sq = self.length_squared();
        if len_sq > 1e-12 {
            let inv_len = 1.0 / len_sq.sqrt();
            Vec2 { x: self.x * inv_len, y: self.y * inv_len }
        } else {
            Vec2::zero()
        }
    }

    pub fn distance_squared(&self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Vec2) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn scale(&self, scalar: f32) -> Self {
        Vec2 { x: self.x * scalar, y: self.y * scalar }
    }

    /// Bearing (radians) from this point towards `target`.
    pub fn bearing_to(&self, target: Vec2) -> f32 {
        vec_to_angle(target - *self)
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self { x: self.x * scalar, y: self.y * scalar }
    }
}

/// Size of the display surface the engines simulate inside.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Bounds { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Both dimensions finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Converts an angle (in radians) to a unit vector.
pub fn angle_to_vec(angle_rad: f32) -> Vec2 {
    Vec2::new(angle_rad.cos(), angle_rad.sin())
}

/// Converts a vector to an angle (in radians).
/// Uses atan2 for quadrant correctness.
pub fn vec_to_angle(vec: Vec2) -> f32 {
    vec.y.atan2(vec.x)
}

/// Point at `radius` from `center` along `angle_rad`.
pub fn polar(center: Vec2, angle_rad: f32, radius: f32) -> Vec2 {
    center + angle_to_vec(angle_rad).scale(radius)
}
