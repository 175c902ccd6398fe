//! Polyline buffering in tile space
//!
//! Polylines are projected into fractional tile coordinates at the target
//! zoom, sampled every [`SAMPLE_STEP`] tiles at most, and every tile within a
//! radius of a sample is selected. Closed rings additionally select the tiles
//! whose centre lies inside the ring.
//!
//! The constants are calibrated against reference tile counts for tracks on
//! Easter Island at zooms 10 to 16 (see `tests/footprint_reference.rs`).

use std::collections::BTreeSet;

use crate::coord::{point_to_tile_space, tiles_per_axis, TileCoord, TilePoint};

/// Maximum distance between consecutive samples, in tiles.
pub const SAMPLE_STEP: f64 = 0.72;

/// Buffer radius along track and contour paths, in tiles.
pub const TRACK_RADIUS: f64 = 0.5;

/// Buffer radius along each segment of a contours request, in tiles.
pub const CONTOURS_RADIUS: f64 = 0.4925;

/// Buffer radius along the edge that closes a ring, in tiles.
pub const CLOSING_RADIUS: f64 = 0.436;

type Vec2 = (f64, f64);

fn project(points: &[TilePoint], zoom: u8) -> Vec<Vec2> {
    points.iter().map(|&p| point_to_tile_space(p, zoom)).collect()
}

/// Samples a projected polyline so that no two consecutive samples are more
/// than `step` apart. Vertices are always kept.
fn sample(points: &[Vec2], step: f64) -> Vec<Vec2> {
    let mut out = Vec::new();
    for pair in points.windows(2) {
        let (p, q) = (pair[0], pair[1]);
        let len = (q.0 - p.0).hypot(q.1 - p.1);
        let steps = ((len / step).ceil() as usize).max(1);
        for j in 0..steps {
            let t = j as f64 / steps as f64;
            out.push((p.0 + (q.0 - p.0) * t, p.1 + (q.1 - p.1) * t));
        }
    }
    if let Some(&last) = points.last() {
        out.push(last);
    }
    out
}

/// Adds the tiles whose square lies within `radius` of `(x, y)`.
fn add_disc(tiles: &mut BTreeSet<TileCoord>, zoom: u8, (x, y): Vec2, radius: f64) {
    let n = tiles_per_axis(zoom) as i64;
    let (x0, x1) = ((x - radius).floor() as i64, (x + radius).floor() as i64);
    let (y0, y1) = ((y - radius).floor() as i64, (y + radius).floor() as i64);

    for tx in x0.max(0)..=x1.min(n - 1) {
        for ty in y0.max(0)..=y1.min(n - 1) {
            let cx = x.clamp(tx as f64, tx as f64 + 1.0);
            let cy = y.clamp(ty as f64, ty as f64 + 1.0);
            if (cx - x).hypot(cy - y) <= radius {
                tiles.insert(TileCoord {
                    zoom,
                    x: tx as u32,
                    y: ty as u32,
                });
            }
        }
    }
}

/// Even-odd point-in-polygon test. `ring` is implicitly closed.
fn inside(ring: &[Vec2], (x, y): Vec2) -> bool {
    let mut crossing = false;
    for (i, &(x1, y1)) in ring.iter().enumerate() {
        let (x2, y2) = ring[(i + 1) % ring.len()];
        if (y1 > y) != (y2 > y) && x < x1 + (y - y1) * (x2 - x1) / (y2 - y1) {
            crossing = !crossing;
        }
    }
    crossing
}

fn buffer_path(path: &[Vec2], zoom: u8, radius: f64, tiles: &mut BTreeSet<TileCoord>) {
    for s in sample(path, SAMPLE_STEP) {
        add_disc(tiles, zoom, s, radius);
    }
}

/// Tiles within `radius` of an open polyline.
pub fn buffer_polyline(
    points: &[TilePoint],
    zoom: u8,
    radius: f64,
    tiles: &mut BTreeSet<TileCoord>,
) {
    buffer_path(&project(points, zoom), zoom, radius, tiles);
}

/// Tiles along and inside a closed ring.
///
/// The ring's own edges are buffered by `radius`, the closing edge from the
/// last point back to the first by [`CLOSING_RADIUS`].
pub fn buffer_ring(
    points: &[TilePoint],
    zoom: u8,
    radius: f64,
    tiles: &mut BTreeSet<TileCoord>,
) {
    let projected = project(points, zoom);
    let (Some(&first), Some(&last)) = (projected.first(), projected.last()) else {
        return;
    };

    buffer_path(&projected, zoom, radius, tiles);
    buffer_path(&[last, first], zoom, CLOSING_RADIUS, tiles);

    let n = tiles_per_axis(zoom) as i64;
    let (min_x, max_x) = bounds(projected.iter().map(|p| p.0));
    let (min_y, max_y) = bounds(projected.iter().map(|p| p.1));
    for tx in (min_x as i64).max(0)..=(max_x as i64).min(n - 1) {
        for ty in (min_y as i64).max(0)..=(max_y as i64).min(n - 1) {
            if inside(&projected, (tx as f64 + 0.5, ty as f64 + 0.5)) {
                tiles.insert(TileCoord {
                    zoom,
                    x: tx as u32,
                    y: ty as u32,
                });
            }
        }
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_respects_step() {
        let samples = sample(&[(0.0, 0.0), (3.0, 0.0)], SAMPLE_STEP);
        // ceil(3 / 0.72) = 5 sub-steps plus the final vertex
        assert_eq!(samples.len(), 6);
        for pair in samples.windows(2) {
            assert!(pair[1].0 - pair[0].0 <= SAMPLE_STEP);
        }
        assert_eq!(samples.last(), Some(&(3.0, 0.0)));
    }

    #[test]
    fn test_single_point_sample() {
        assert_eq!(sample(&[(1.5, 2.5)], SAMPLE_STEP), vec![(1.5, 2.5)]);
    }

    #[test]
    fn test_disc_at_tile_centre_excludes_diagonals() {
        let mut tiles = BTreeSet::new();
        add_disc(&mut tiles, 4, (5.5, 5.5), TRACK_RADIUS);
        assert!(tiles.contains(&TileCoord { zoom: 4, x: 5, y: 5 }));
        assert!(!tiles.contains(&TileCoord { zoom: 4, x: 6, y: 6 }));
        assert!(!tiles.contains(&TileCoord { zoom: 4, x: 4, y: 4 }));
    }

    #[test]
    fn test_disc_at_corner_touches_four_tiles() {
        let mut tiles = BTreeSet::new();
        add_disc(&mut tiles, 4, (5.0, 5.0), TRACK_RADIUS);
        assert_eq!(tiles.len(), 4);
    }

    #[test]
    fn test_disc_clipped_at_grid_edge() {
        let mut tiles = BTreeSet::new();
        add_disc(&mut tiles, 1, (0.0, 0.0), TRACK_RADIUS);
        assert_eq!(tiles.len(), 1, "Tiles outside the grid must not be selected");
    }

    #[test]
    fn test_inside_even_odd() {
        let square = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        assert!(inside(&square, (2.0, 2.0)));
        assert!(!inside(&square, (5.0, 2.0)));
    }

    #[test]
    fn test_ring_selects_interior() {
        // A ring much larger than a tile at zoom 8 around (0, 0)
        let ring = [
            TilePoint::new(5.0, -5.0),
            TilePoint::new(5.0, 5.0),
            TilePoint::new(-5.0, 5.0),
            TilePoint::new(-5.0, -5.0),
        ];
        let mut outline = BTreeSet::new();
        buffer_polyline(&ring, 8, TRACK_RADIUS, &mut outline);
        let mut filled = BTreeSet::new();
        buffer_ring(&ring, 8, TRACK_RADIUS, &mut filled);
        assert!(filled.len() > outline.len());
        let centre = crate::coord::point_to_tile(TilePoint::new(0.0, 0.0), 8).unwrap();
        assert!(filled.contains(&centre));
        assert!(!outline.contains(&centre));
    }
}
