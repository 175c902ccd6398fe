//! GPX track reader

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;

use super::{Track, TrackError, TrackReader};
use crate::coord::TilePoint;

/// Reads GPX 1.0 / 1.1 files.
///
/// Every `<trkseg>` becomes one segment, in document order. Routes follow the
/// tracks, one segment per `<rte>`. Waypoints are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpxTrackReader;

impl GpxTrackReader {
    pub fn new() -> Self {
        Self
    }

    /// Parses GPX content from any reader; `path` is only used for errors.
    pub fn read_from<R: Read>(&self, reader: R, path: &Path) -> Result<Track, TrackError> {
        let doc = ::gpx::read(reader).map_err(|e| TrackError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let to_point = |wpt: &::gpx::Waypoint| {
            let p = wpt.point();
            TilePoint::new(p.y(), p.x())
        };

        let mut segments: Vec<Vec<TilePoint>> = doc
            .tracks
            .iter()
            .flat_map(|trk| trk.segments.iter())
            .map(|seg| seg.points.iter().map(to_point).collect())
            .collect();
        segments.extend(
            doc.routes
                .iter()
                .map(|rte| rte.points.iter().map(to_point).collect()),
        );

        let track = Track::new(segments);
        if track.is_empty() {
            return Err(TrackError::Empty(path.to_path_buf()));
        }

        debug!(
            path = %path.display(),
            segments = track.segments().len(),
            points = track.point_count(),
            "Read GPX track"
        );
        Ok(track)
    }
}

impl TrackReader for GpxTrackReader {
    fn read(&self, path: &Path) -> Result<Track, TrackError> {
        let file = File::open(path).map_err(|source| TrackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.read_from(BufReader::new(file), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TRACKS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><trkseg>
    <trkpt lat="-27.1401181" lon="-109.4351578"></trkpt>
    <trkpt lat="-27.1813558" lon="-109.4633102"></trkpt>
  </trkseg></trk>
  <trk><trkseg>
    <trkpt lat="-27.0863335" lon="-109.2755127"></trkpt>
  </trkseg></trk>
</gpx>"#;

    #[test]
    fn test_reads_segments_in_order() {
        let track = GpxTrackReader::new()
            .read_from(TWO_TRACKS.as_bytes(), Path::new("test.gpx"))
            .unwrap();
        assert_eq!(track.segments().len(), 2);
        assert_eq!(track.segments()[0].len(), 2);
        let first = track.segments()[0][0];
        assert!((first.lat + 27.1401181).abs() < 1e-9);
        assert!((first.lon + 109.4351578).abs() < 1e-9);
    }

    #[test]
    fn test_empty_gpx_is_error() {
        let empty = r#"<?xml version="1.0"?><gpx version="1.1" creator="t" xmlns="http://www.topografix.com/GPX/1/1"></gpx>"#;
        let result = GpxTrackReader::new().read_from(empty.as_bytes(), Path::new("e.gpx"));
        assert!(matches!(result, Err(TrackError::Empty(_))));
    }

    #[test]
    fn test_malformed_gpx_is_parse_error() {
        let result = GpxTrackReader::new().read_from("not xml".as_bytes(), Path::new("bad.gpx"));
        assert!(matches!(result, Err(TrackError::Parse { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = GpxTrackReader::new().read(Path::new("/nonexistent/track.gpx"));
        assert!(matches!(result, Err(TrackError::Io { .. })));
    }
}
