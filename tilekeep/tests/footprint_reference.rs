//! Footprint reference counts over Easter Island tracks.
//!
//! The counts pin down the sampling step and buffer radius of the
//! track footprints, so any change to either shows up here first.
//!
//! Run with: `cargo test --test footprint_reference`

mod common;

use std::sync::Arc;

use tilekeep::footprint::{footprint_at, load_project, FootprintRequest};
use tilekeep::operations::{Operations, Stats, TileRequest};
use tilekeep::store::StoreVariant;
use tilekeep::track::{GpxTrackReader, TrackReader};
use tilekeep::zoom::ZoomSpec;

use common::*;

fn counts(request: &FootprintRequest, zooms: std::ops::RangeInclusive<u8>) -> Vec<usize> {
    zooms
        .map(|z| footprint_at(request, z).unwrap().len())
        .collect()
}

#[test]
fn test_gpx1_track_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.gpx");
    write_gpx(&path, &[GPX1]);
    let track = GpxTrackReader::new().read(&path).unwrap();

    assert_eq!(
        counts(&FootprintRequest::Track(track.clone()), 10..=14),
        vec![4, 9, 11, 23, 41]
    );
    assert_eq!(
        counts(&FootprintRequest::Contour(track), 10..=14),
        vec![4, 9, 12, 25, 57]
    );
}

#[test]
fn test_gpx2_contours_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test2.gpx");
    write_gpx(&path, &[GPX2_SEGMENT_1, GPX2_SEGMENT_2]);
    let track = GpxTrackReader::new().read(&path).unwrap();
    assert_eq!(track.segments().len(), 2);

    assert_eq!(
        counts(&FootprintRequest::Contours(track), 10..=16),
        vec![4, 10, 12, 20, 35, 82, 225]
    );
}

#[test]
fn test_gpx2_contour_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test2.gpx");
    write_gpx(&path, &[GPX2_SEGMENT_1, GPX2_SEGMENT_2]);
    let track = GpxTrackReader::new().read(&path).unwrap();

    assert_eq!(
        counts(&FootprintRequest::Contour(track), 10..=16),
        vec![4, 10, 12, 22, 51, 128, 384]
    );
}

#[test]
fn test_contour_covers_track() {
    let track = gpx1_track();
    for zoom in 10..=14 {
        let line = footprint_at(&FootprintRequest::Track(track.clone()), zoom).unwrap();
        let area = footprint_at(&FootprintRequest::Contour(track.clone()), zoom).unwrap();
        assert!(line.is_subset(&area), "Zoom {}", zoom);
    }
}

#[test]
fn test_project_file_count() {
    let dir = tempfile::tempdir().unwrap();
    write_gpx(&dir.path().join("test.gpx"), &[GPX1]);
    let project = dir.path().join("project.txt");
    std::fs::write(
        &project,
        "# Easter Island\n-track test.gpx -zoom 10-11\n-contour test.gpx -zoom 12\n",
    )
    .unwrap();

    let entries = load_project(&project, &GpxTrackReader::new()).unwrap();
    assert_eq!(entries.len(), 2);

    let store = new_store(dir.path(), StoreVariant::Native, "project");
    let ops = Operations::new(Arc::new(OfflineServer));
    let request = TileRequest::new(FootprintRequest::Project(entries), ZoomSpec::single(10));

    assert_eq!(ops.count(store.as_ref(), &request).unwrap(), Stats::new(25, 0, 0, 25));
}
