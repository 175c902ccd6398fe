//! Operation statistics.

use std::fmt;
use std::ops::{Add, AddAssign};

/// Outcome of a batch operation.
///
/// Every operation keeps `present + downloaded + missing == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Stats {
    /// Tiles in the resolved set
    pub total: u64,
    /// Tiles found (or derived, copied, deleted) without downloading
    pub present: u64,
    /// Tiles fetched from the upstream server
    pub downloaded: u64,
    /// Tiles neither present nor obtained
    pub missing: u64,
}

impl Stats {
    pub fn new(total: u64, present: u64, downloaded: u64, missing: u64) -> Self {
        Self {
            total,
            present,
            downloaded,
            missing,
        }
    }

    pub fn as_tuple(&self) -> (u64, u64, u64, u64) {
        (self.total, self.present, self.downloaded, self.missing)
    }

    /// Whether the counters add up.
    pub fn is_consistent(&self) -> bool {
        self.present + self.downloaded + self.missing == self.total
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(self, other: Stats) -> Stats {
        Stats {
            total: self.total + other.total,
            present: self.present + other.present,
            downloaded: self.downloaded + other.downloaded,
            missing: self.missing + other.missing,
        }
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, other: Stats) {
        *self = *self + other;
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.total, self.present, self.downloaded, self.missing
        )
    }
}

/// Content of a tile set at one zoom level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoomStat {
    pub zoom: u8,
    /// Tiles in the resolved set
    pub tiles: u64,
    /// Tiles of the set held by the store
    pub present: u64,
    /// Stored size of the present tiles, in bytes
    pub bytes: u64,
}
