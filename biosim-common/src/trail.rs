use crate::vecmath::Point2D;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Bounded, chronologically ordered history of recent positions.
///
/// Pushing past `capacity` evicts the oldest entry, so the buffer always holds
/// the most recent `capacity` positions, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailBuffer {
    capacity: usize,
    points: VecDeque<Point2D>,
}

impl TrailBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        TrailBuffer {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends `point`, dropping the oldest entries beyond capacity.
    pub fn push(&mut self, point: Point2D) {
        if self.capacity == 0 {
            return;
        }
        while self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Point2D> + ExactSizeIterator {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<Point2D> {
        self.points.back().copied()
    }

    /// Up to `count` of the newest points, newest first. Renderers fade the
    /// streak along this order.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &Point2D> {
        self.points.iter().rev().take(count)
    }
}
