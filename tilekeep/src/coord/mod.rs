//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator slippy-map tile coordinates, plus the quad-tree helpers
//! used by zoom subdivision.

mod types;

pub use types::{
    tiles_per_axis, CoordError, TileBounds, TileCoord, TilePoint, MAX_LAT, MAX_LON, MAX_ZOOM,
    MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Projects a geographic point into fractional tile space at `zoom`.
///
/// The integer part of each component is the tile index, the fractional part
/// the position inside the tile. Latitude is clamped to the Web Mercator range.
#[inline]
pub fn point_to_tile_space(point: TilePoint, zoom: u8) -> (f64, f64) {
    let n = tiles_per_axis(zoom) as f64;
    let lat = point.lat.clamp(MIN_LAT, MAX_LAT);

    let x = (point.lon + 180.0) / 360.0 * n;
    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

    (x, y)
}

/// Converts a geographic point to the tile containing it.
///
/// Indices are floored and clamped into `[0, 2^zoom - 1]`, so points on the
/// antimeridian or the Mercator limits map to the edge tiles.
#[inline]
pub fn point_to_tile(point: TilePoint, zoom: u8) -> Result<TileCoord, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    if !point.lat.is_finite() || !point.lon.is_finite() {
        return Err(CoordError::InvalidPoint {
            lat: point.lat,
            lon: point.lon,
        });
    }

    let (x, y) = point_to_tile_space(point, zoom);
    let max = (tiles_per_axis(zoom) - 1) as f64;

    Ok(TileCoord {
        zoom,
        x: x.floor().clamp(0.0, max) as u32,
        y: y.floor().clamp(0.0, max) as u32,
    })
}

/// Latitude of the horizontal tile edge `y` (may be fractional) at `zoom`.
#[inline]
fn tile_y_to_lat(y: f64, zoom: u8) -> f64 {
    let n = tiles_per_axis(zoom) as f64;
    (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees()
}

/// Longitude of the vertical tile edge `x` (may be fractional) at `zoom`.
#[inline]
fn tile_x_to_lon(x: f64, zoom: u8) -> f64 {
    let n = tiles_per_axis(zoom) as f64;
    x / n * 360.0 - 180.0
}

/// Geographic bounds of a tile; the exact inverse of [`point_to_tile`].
pub fn tile_bounds(tile: &TileCoord) -> TileBounds {
    TileBounds {
        north: tile_y_to_lat(tile.y as f64, tile.zoom),
        south: tile_y_to_lat(tile.y as f64 + 1.0, tile.zoom),
        west: tile_x_to_lon(tile.x as f64, tile.zoom),
        east: tile_x_to_lon(tile.x as f64 + 1.0, tile.zoom),
    }
}

/// Enumerates the descendants of `tile` at `target_zoom`.
///
/// Free-function form of [`TileCoord::children`].
pub fn children_of(tile: &TileCoord, target_zoom: u8) -> Result<Vec<TileCoord>, CoordError> {
    tile.children(target_zoom)
}

/// Iterates every tile of a zoom level, in `(x, y)` order.
pub fn tiles_at(zoom: u8) -> impl Iterator<Item = TileCoord> {
    let n = tiles_per_axis(zoom);
    (0..n).flat_map(move |x| (0..n).map(move |y| TileCoord { zoom, x, y }))
}
