//! Coordinate type definitions

use std::fmt;

use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Supported zoom levels
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 20;

/// Number of tiles along one axis at the given zoom level.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32 << zoom
}

/// Tile coordinates in the slippy-map (Web Mercator) scheme.
///
/// Ordering is by `(zoom, x, y)`, which gives deterministic iteration over
/// tile sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Zoom level (0-20)
    pub zoom: u8,
    /// X coordinate (east-west), 0 at west
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
}

impl TileCoord {
    /// Creates a tile coordinate, validating it against its zoom level.
    pub fn new(zoom: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let tile = Self { zoom, x, y };
        if !tile.is_valid() {
            return Err(CoordError::InvalidCoord { zoom, x, y });
        }
        Ok(tile)
    }

    /// Returns true when `x` and `y` are inside `[0, 2^zoom)`.
    #[inline]
    pub fn is_valid(&self) -> bool {
        if self.zoom > MAX_ZOOM {
            return false;
        }
        let n = tiles_per_axis(self.zoom);
        self.x < n && self.y < n
    }

    /// Returns the ancestor of this tile at a coarser (or equal) zoom level.
    pub fn ancestor(&self, zoom: u8) -> Result<TileCoord, CoordError> {
        if zoom > self.zoom {
            return Err(CoordError::ZoomOrder {
                from: self.zoom,
                to: zoom,
            });
        }
        let shift = self.zoom - zoom;
        Ok(TileCoord {
            zoom,
            x: self.x >> shift,
            y: self.y >> shift,
        })
    }

    /// Enumerates all `4^(target_zoom - zoom)` descendants at `target_zoom`.
    ///
    /// Descendants are returned in `(x, y)` order. A `target_zoom` equal to the
    /// tile's own zoom yields the tile itself.
    pub fn children(&self, target_zoom: u8) -> Result<Vec<TileCoord>, CoordError> {
        if target_zoom < self.zoom {
            return Err(CoordError::ZoomOrder {
                from: self.zoom,
                to: target_zoom,
            });
        }
        if target_zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(target_zoom));
        }

        let shift = target_zoom - self.zoom;
        let side = 1u32 << shift;
        let x0 = self.x << shift;
        let y0 = self.y << shift;

        let mut children = Vec::with_capacity((side as usize) * (side as usize));
        for x in x0..x0 + side {
            for y in y0..y0 + side {
                children.push(TileCoord {
                    zoom: target_zoom,
                    x,
                    y,
                });
            }
        }
        Ok(children)
    }

    /// Offset of this tile inside its ancestor at `zoom`, in descendant units.
    ///
    /// Returns `(dx, dy, side)` where `side = 2^(self.zoom - zoom)`.
    pub fn offset_in_ancestor(&self, zoom: u8) -> Result<(u32, u32, u32), CoordError> {
        let ancestor = self.ancestor(zoom)?;
        let shift = self.zoom - zoom;
        Ok((
            self.x - (ancestor.x << shift),
            self.y - (ancestor.y << shift),
            1u32 << shift,
        ))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A geographic point in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePoint {
    pub lat: f64,
    pub lon: f64,
}

impl TilePoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Geographic extent of a tile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl TileBounds {
    /// Returns true when the point lies inside the bounds (edges included).
    pub fn contains(&self, point: TilePoint) -> bool {
        point.lat <= self.north
            && point.lat >= self.south
            && point.lon >= self.west
            && point.lon <= self.east
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Tile x/y outside `[0, 2^zoom)`
    #[error("Invalid tile coordinate {zoom}/{x}/{y} (x and y must be below 2^{zoom})")]
    InvalidCoord { zoom: u8, x: u32, y: u32 },

    /// Zoom level is outside the supported range
    #[error("Invalid zoom level: {0} (must be between 0 and 20)")]
    InvalidZoom(u8),

    /// A quad-tree walk in the wrong direction
    #[error("Cannot move from zoom {from} to zoom {to}")]
    ZoomOrder { from: u8, to: u8 },

    /// Longitude/latitude is not a finite number
    #[error("Invalid point: ({lat}, {lon})")]
    InvalidPoint { lat: f64, lon: f64 },
}
