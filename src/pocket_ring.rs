// src/pocket_ring.rs
//
// Physical pocket layout of a double-zero wheel. Adjacency comes from the
// position in this sequence, never from the numeric label. Label 37 is the
// "00" slot.

use crate::errors::RingError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const POCKET_COUNT: usize = 38;

/// Wheel order, clockwise from the single zero.
pub const WHEEL_ORDER: [u8; POCKET_COUNT] = [
    0, 28, 9, 26, 30, 11, 7, 20, 32, 17, 5, 22, 34, 15, 3, 24, 36, 13, 1, 37, 27, 10, 25, 29, 12,
    8, 19, 31, 18, 6, 21, 33, 16, 4, 23, 35, 14, 2,
];

/// Label used for the double-zero slot.
pub const DOUBLE_ZERO: u8 = 37;

/// A pocket label that is known to exist on the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Pocket(u8);

impl Pocket {
    pub fn new(label: u8) -> Result<Self, RingError> {
        PocketRing::index_of(label).map(|_| Pocket(label))
    }

    pub fn label(self) -> u8 {
        self.0
    }

    /// Position of this pocket in wheel order.
    pub fn index(self) -> usize {
        // Pocket is only constructible for labels on the ring.
        WHEEL_ORDER
            .iter()
            .position(|&l| l == self.0)
            .unwrap_or_default()
    }
}

impl TryFrom<u8> for Pocket {
    type Error = RingError;

    fn try_from(label: u8) -> Result<Self, Self::Error> {
        Pocket::new(label)
    }
}

impl From<Pocket> for u8 {
    fn from(p: Pocket) -> u8 {
        p.0
    }
}

impl fmt::Display for Pocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == DOUBLE_ZERO {
            write!(f, "00")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Circular arithmetic over the physical pocket sequence.
pub struct PocketRing;

impl PocketRing {
    pub fn index_of(label: u8) -> Result<usize, RingError> {
        WHEEL_ORDER
            .iter()
            .position(|&l| l == label)
            .ok_or(RingError::NotFound(label))
    }

    /// Pocket at `index` in wheel order; the index wraps around the ring.
    pub fn label_at(index: usize) -> Pocket {
        Pocket(WHEEL_ORDER[index % POCKET_COUNT])
    }

    /// Minimum of clockwise and counter-clockwise separation, 0..=19.
    pub fn circular_distance(a: Pocket, b: Pocket) -> u8 {
        let diff = a.index().abs_diff(b.index());
        diff.min(POCKET_COUNT - diff) as u8
    }

    /// Label-based variant for callers holding raw labels.
    pub fn circular_distance_labels(a: u8, b: u8) -> Result<u8, RingError> {
        Ok(Self::circular_distance(Pocket::new(a)?, Pocket::new(b)?))
    }

    pub fn pockets() -> impl Iterator<Item = Pocket> {
        WHEEL_ORDER.iter().map(|&l| Pocket(l))
    }
}
