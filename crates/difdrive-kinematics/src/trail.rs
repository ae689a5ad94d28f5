//! Bounded position history used to draw trails behind the vehicle and its
//! wheels.

use alloc::collections::VecDeque;

use crate::Point2;

/// Default number of positions retained by a trail.
pub const DEFAULT_TRAIL_CAPACITY: usize = 100;

/// A bounded history of past positions, most recent first.
///
/// Once `capacity` points are stored, recording a new one discards the
/// oldest. A trail with capacity `0` is disabled and never stores anything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trail {
    points: VecDeque<Point2>,
    capacity: usize,
}

impl Trail {
    /// Create an empty trail holding at most `capacity` points.
    pub fn new(capacity: usize) -> Self {
        Trail {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Whether this trail records anything at all.
    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Maximum number of retained points.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a point as the most recent entry.
    pub fn record(&mut self, point: Point2) {
        if !self.is_enabled() {
            return;
        }
        self.points.push_front(point);
        self.points.truncate(self.capacity);
    }

    /// Retained points, most recent first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Point2> + '_ {
        self.points.iter()
    }

    /// The most recently recorded point.
    pub fn latest(&self) -> Option<&Point2> {
        self.points.front()
    }

    /// Number of retained points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no point is retained.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Drop every retained point.
    pub fn clear(&mut self) {
        self.points.clear();
    }
}
