//! Footprint computation
//!
//! Turns a geographic request (track, contour, tile rectangle or project)
//! into the exact set of tiles it covers at each requested zoom level.
//!
//! Computation is pure: nothing here touches a store or the network. The
//! [`FootprintRequest::Records`] request depends on store content and is
//! resolved by the operations layer instead.

pub mod buffer;
pub mod project;

pub use project::{load_project, parse_project, ProjectError};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::coord::{tiles_per_axis, CoordError, TileCoord};
use crate::track::Track;
use crate::zoom::ZoomSpec;

/// Errors computing a footprint.
#[derive(Debug, Error)]
pub enum FootprintError {
    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error("Track contains no points")]
    EmptyTrack,

    #[error("Invalid tile range '{0}': expected xmin,ymin,xmax,ymax")]
    InvalidRange(String),

    #[error("Records footprint depends on store content and cannot be computed here")]
    NeedsStore,
}

/// An explicit rectangle of tile indices, applied at each target zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub xmin: u32,
    pub ymin: u32,
    pub xmax: u32,
    pub ymax: u32,
}

impl TileRange {
    pub fn new(xmin: u32, ymin: u32, xmax: u32, ymax: u32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Tiles of the rectangle at `zoom`.
    ///
    /// Fails with `InvalidCoord` when a corner is outside the zoom's grid or
    /// the rectangle is reversed.
    pub fn tiles(&self, zoom: u8) -> Result<impl Iterator<Item = TileCoord>, CoordError> {
        TileCoord::new(zoom, self.xmin, self.ymin)?;
        TileCoord::new(zoom, self.xmax, self.ymax)?;
        if self.xmin > self.xmax || self.ymin > self.ymax {
            return Err(CoordError::InvalidCoord {
                zoom,
                x: self.xmin.max(self.xmax),
                y: self.ymin.max(self.ymax),
            });
        }
        let (ymin, ymax) = (self.ymin, self.ymax);
        Ok((self.xmin..=self.xmax)
            .flat_map(move |x| (ymin..=ymax).map(move |y| TileCoord { zoom, x, y })))
    }

    /// The whole grid of a zoom level.
    pub fn world(zoom: u8) -> Self {
        let max = tiles_per_axis(zoom) - 1;
        Self::new(0, 0, max, max)
    }
}

impl FromStr for TileRange {
    type Err = FootprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<u32> = s
            .split(',')
            .map(|v| v.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|_| FootprintError::InvalidRange(s.to_string()))?;
        match values.as_slice() {
            &[xmin, ymin, xmax, ymax] => Ok(Self::new(xmin, ymin, xmax, ymax)),
            _ => Err(FootprintError::InvalidRange(s.to_string())),
        }
    }
}

impl fmt::Display for TileRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

/// One line of a project: a request with its own zoom spec.
#[derive(Debug, Clone)]
pub struct ProjectEntry {
    pub request: FootprintRequest,
    pub zoom: ZoomSpec,
}

/// What area a tile request covers.
#[derive(Debug, Clone)]
pub enum FootprintRequest {
    /// Tiles along each segment of the track
    Track(Track),
    /// All segments joined into a single closed ring, with its interior
    Contour(Track),
    /// Each segment as its own closed ring, with its interior
    Contours(Track),
    /// Explicit tile rectangle
    TileRange(TileRange),
    /// Tiles already present in the store
    Records,
    /// Union of entries, each with its own zoom spec
    Project(Vec<ProjectEntry>),
}

impl FootprintRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Track(_) => "track",
            Self::Contour(_) => "contour",
            Self::Contours(_) => "contours",
            Self::TileRange(_) => "tiles",
            Self::Records => "records",
            Self::Project(_) => "project",
        }
    }
}

/// Footprint of a request at a single zoom level.
pub fn footprint_at(
    request: &FootprintRequest,
    zoom: u8,
) -> Result<BTreeSet<TileCoord>, FootprintError> {
    let mut tiles = BTreeSet::new();
    match request {
        FootprintRequest::Track(track) => {
            ensure_points(track)?;
            for segment in track.segments() {
                buffer::buffer_polyline(segment, zoom, buffer::TRACK_RADIUS, &mut tiles);
            }
        }
        FootprintRequest::Contour(track) => {
            ensure_points(track)?;
            let ring: Vec<_> = track.points().collect();
            buffer::buffer_ring(&ring, zoom, buffer::TRACK_RADIUS, &mut tiles);
        }
        FootprintRequest::Contours(track) => {
            ensure_points(track)?;
            for segment in track.segments() {
                buffer::buffer_ring(segment, zoom, buffer::CONTOURS_RADIUS, &mut tiles);
            }
        }
        FootprintRequest::TileRange(range) => {
            tiles.extend(range.tiles(zoom)?);
        }
        FootprintRequest::Records => return Err(FootprintError::NeedsStore),
        FootprintRequest::Project(entries) => {
            for entry in entries {
                if entry.zoom.target_set().contains(&zoom) {
                    tiles.extend(footprint_at(&entry.request, zoom)?);
                }
            }
        }
    }
    Ok(tiles)
}

/// Footprint of a request over every target zoom of `zoom`.
///
/// Project requests ignore `zoom` and use each entry's own spec.
pub fn compute_footprint(
    request: &FootprintRequest,
    zoom: &ZoomSpec,
) -> Result<BTreeSet<TileCoord>, FootprintError> {
    let mut tiles = BTreeSet::new();
    match request {
        FootprintRequest::Project(entries) => {
            for entry in entries {
                tiles.extend(compute_footprint(&entry.request, &entry.zoom)?);
            }
        }
        _ => {
            for z in zoom.targets() {
                tiles.extend(footprint_at(request, z)?);
            }
        }
    }
    Ok(tiles)
}

fn ensure_points(track: &Track) -> Result<(), FootprintError> {
    if track.is_empty() {
        return Err(FootprintError::EmptyTrack);
    }
    Ok(())
}
