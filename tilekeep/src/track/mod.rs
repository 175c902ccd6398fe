//! GPS track model
//!
//! A [`Track`] is an ordered list of segments, each an ordered list of
//! points. Readers turn files into tracks through the [`TrackReader`] trait so
//! that footprint computation never depends on a file format.

mod gpx;

pub use self::gpx::GpxTrackReader;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::coord::TilePoint;

/// Errors reading a track file.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Failed to read track file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse track file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Track file {0} contains no points")]
    Empty(PathBuf),
}

/// An ordered sequence of track segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    segments: Vec<Vec<TilePoint>>,
}

impl Track {
    /// Builds a track, dropping empty segments.
    pub fn new(segments: Vec<Vec<TilePoint>>) -> Self {
        Self {
            segments: segments.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    /// Convenience constructor from `(lat, lon)` pairs.
    pub fn from_lat_lon(segments: &[&[(f64, f64)]]) -> Self {
        Self::new(
            segments
                .iter()
                .map(|seg| seg.iter().map(|&(lat, lon)| TilePoint::new(lat, lon)).collect())
                .collect(),
        )
    }

    pub fn segments(&self) -> &[Vec<TilePoint>] {
        &self.segments
    }

    /// All points of all segments, in order.
    pub fn points(&self) -> impl Iterator<Item = TilePoint> + '_ {
        self.segments.iter().flatten().copied()
    }

    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Reads a track from a file.
pub trait TrackReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Track, TrackError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_segments_dropped() {
        let track = Track::new(vec![vec![], vec![TilePoint::new(1.0, 2.0)], vec![]]);
        assert_eq!(track.segments().len(), 1);
        assert_eq!(track.point_count(), 1);
    }

    #[test]
    fn test_points_preserve_order() {
        let track = Track::from_lat_lon(&[&[(1.0, 1.0), (2.0, 2.0)], &[(3.0, 3.0)]]);
        let lats: Vec<f64> = track.points().map(|p| p.lat).collect();
        assert_eq!(lats, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(Track::default().is_empty());
    }
}
