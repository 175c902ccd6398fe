//! Integration tests for batch operations across store layouts.
//!
//! Every test downloads from an in-process PNG server, so no network
//! access is needed.
//!
//! Run with: `cargo test --test store_operations`

mod common;

use std::sync::Arc;

use tilekeep::footprint::{FootprintRequest, TileRange};
use tilekeep::operations::{Operations, Stats, TileRequest};
use tilekeep::store::{open_store, StoreVariant, TileEncoding, TileStore};
use tilekeep::zoom::ZoomSpec;

use common::*;

// ============================================================================
// Helper Functions
// ============================================================================

fn track_request(zoom: &str) -> TileRequest {
    TileRequest::new(FootprintRequest::Track(gpx1_track()), zoom.parse().unwrap())
}

fn online() -> (Arc<PngServer>, Operations) {
    let server = Arc::new(PngServer::default());
    let ops = Operations::new(server.clone()).with_batch_size(4);
    (server, ops)
}

fn all_tiles(store: &dyn TileStore) -> Vec<tilekeep::coord::TileCoord> {
    let zooms: Vec<u8> = (0..=20).collect();
    store.list_tiles(&zooms).unwrap()
}

fn assert_same_content(a: &dyn TileStore, b: &dyn TileStore) {
    let tiles = all_tiles(a);
    assert_eq!(tiles, all_tiles(b));
    for tile in tiles {
        let left = a.get(&tile).unwrap().unwrap();
        let right = b.get(&tile).unwrap().unwrap();
        assert_eq!(left.data, right.data, "Tile {}", tile);
    }
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn test_insert_then_count() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path(), StoreVariant::Native, "cache");
    let (server, ops) = online();
    let request = track_request("10");

    assert_eq!(ops.insert(store.as_ref(), &request).unwrap(), Stats::new(4, 0, 4, 0));
    assert_eq!(ops.count(store.as_ref(), &request).unwrap(), Stats::new(4, 4, 0, 0));
    assert_eq!(server.requests(), 4);

    // A second insert finds everything in place
    assert_eq!(ops.insert(store.as_ref(), &request).unwrap(), Stats::new(4, 4, 0, 0));
    assert_eq!(server.requests(), 4);
}

#[test]
fn test_subdivision_counts() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path(), StoreVariant::Native, "cache");
    let (_, ops) = online();
    let inserted = ops.insert(store.as_ref(), &track_request("10-12")).unwrap();
    assert_eq!(inserted, Stats::new(24, 0, 24, 0));

    let expected = [
        ("11/10", (16, 9, 0, 7)),
        ("12/10", (64, 11, 0, 53)),
        ("12/11", (36, 11, 0, 25)),
        ("12/12", (11, 11, 0, 0)),
    ];
    for (zoom, tuple) in expected {
        let stats = ops.count(store.as_ref(), &track_request(zoom)).unwrap();
        assert_eq!(stats.as_tuple(), tuple, "Zoom {}", zoom);
        assert!(stats.is_consistent());
    }
}

#[test]
fn test_subdivision_insert_works_offline() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path(), StoreVariant::PlainFolder, "cache");
    let (_, ops) = online();
    ops.insert(store.as_ref(), &track_request("10")).unwrap();

    let offline = Operations::new(Arc::new(OfflineServer));
    let stats = offline.insert(store.as_ref(), &track_request("12/10")).unwrap();
    assert_eq!(stats.as_tuple(), (64, 11, 0, 53));
    assert_eq!(store.count_tiles(&[12]).unwrap(), 11);
}

#[test]
fn test_export_import_round_trip_all_variants() {
    let request = track_request("10-11");
    for from in StoreVariant::ALL {
        for to in StoreVariant::ALL {
            let dir = tempfile::tempdir().unwrap();
            let source = new_store(dir.path(), from, "source");
            let (_, ops) = online();
            ops.insert(source.as_ref(), &request).unwrap();

            let dest = new_store(dir.path(), to, "dest");
            let exported = ops.export(source.as_ref(), dest.as_ref(), &request).unwrap();
            assert_eq!(exported, Stats::new(13, 13, 0, 0), "{} -> {}", from, to);
            assert_same_content(source.as_ref(), dest.as_ref());

            let back = new_store(dir.path(), from, "back");
            let imported = ops.import(back.as_ref(), dest.as_ref(), &request).unwrap();
            assert_eq!(imported, Stats::new(13, 13, 0, 0), "{} <- {}", from, to);
            assert_same_content(source.as_ref(), back.as_ref());
        }
    }
}

#[test]
fn test_export_converts_between_encodings() {
    let request = track_request("10-11");
    let sources = [
        (StoreVariant::Maverick, TileEncoding::Server),
        (StoreVariant::Native, TileEncoding::Png),
        (StoreVariant::PlainFolder, TileEncoding::Jpeg),
        (StoreVariant::RowFolder, TileEncoding::Server),
    ];
    let targets = [TileEncoding::Png, TileEncoding::Jpeg, TileEncoding::Server];

    for (i, (from, from_encoding)) in sources.into_iter().enumerate() {
        for (j, to_encoding) in targets.into_iter().enumerate() {
            let to = StoreVariant::ALL[(i + j) % StoreVariant::ALL.len()];
            let label = format!("{} {} -> {} {}", from, from_encoding, to, to_encoding);

            let dir = tempfile::tempdir().unwrap();
            let source = new_store_with(dir.path(), from, "source", from_encoding);
            let (_, ops) = online();
            ops.insert(source.as_ref(), &request).unwrap();

            let dest = new_store_with(dir.path(), to, "dest", to_encoding);
            let exported = ops.export(source.as_ref(), dest.as_ref(), &request).unwrap();
            assert_eq!(exported, Stats::new(13, 13, 0, 0), "{}", label);

            let tiles = all_tiles(source.as_ref());
            assert_eq!(tiles, all_tiles(dest.as_ref()), "{}", label);
            for tile in tiles {
                let original = source.get(&tile).unwrap().unwrap();
                let copied = dest.get(&tile).unwrap().unwrap();
                if to_encoding.is_concrete() {
                    assert_eq!(
                        TileEncoding::detect(&copied.data),
                        Some(to_encoding),
                        "{} at {}",
                        label,
                        tile
                    );
                } else {
                    assert_eq!(copied.data, original.data, "{} at {}", label, tile);
                }
            }

            let back = new_store_with(dir.path(), from, "back", from_encoding);
            let imported = ops.import(back.as_ref(), dest.as_ref(), &request).unwrap();
            assert_eq!(imported, Stats::new(13, 13, 0, 0), "{}", label);
            if from_encoding.is_concrete() {
                for tile in all_tiles(back.as_ref()) {
                    let record = back.get(&tile).unwrap().unwrap();
                    assert_eq!(TileEncoding::detect(&record.data), Some(from_encoding));
                }
            }
        }
    }
}

#[test]
fn test_server_tiles_exported_as_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let source = new_store_with(
        dir.path(),
        StoreVariant::Maverick,
        "rmaps",
        TileEncoding::Server,
    );
    let dest = new_store_with(
        dir.path(),
        StoreVariant::PlainFolder,
        "jpg",
        TileEncoding::Jpeg,
    );
    let (_, ops) = online();
    let request = track_request("10");
    ops.insert(source.as_ref(), &request).unwrap();

    let tile = all_tiles(source.as_ref())[0];
    let raw = source.get(&tile).unwrap().unwrap();
    assert_eq!(TileEncoding::detect(&raw.data), Some(TileEncoding::Png));

    ops.export(source.as_ref(), dest.as_ref(), &request).unwrap();
    let copied = dest.get(&tile).unwrap().unwrap();
    assert_eq!(TileEncoding::detect(&copied.data), Some(TileEncoding::Jpeg));
}

#[test]
fn test_records_over_every_zoom() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path(), StoreVariant::Native, "cache");
    let (_, ops) = online();
    ops.insert(store.as_ref(), &track_request("10-11")).unwrap();
    let contour = TileRequest::new(
        FootprintRequest::Contour(gpx1_track()),
        ZoomSpec::single(12),
    );
    ops.insert(store.as_ref(), &contour).unwrap();

    let records = TileRequest::new(FootprintRequest::Records, ZoomSpec::all_levels());
    assert_eq!(ops.count(store.as_ref(), &records).unwrap(), Stats::new(25, 25, 0, 0));
}

#[test]
fn test_delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path(), StoreVariant::Maverick, "cache");
    let (_, ops) = online();
    let request = track_request("11");
    ops.insert(store.as_ref(), &request).unwrap();

    assert_eq!(ops.delete(store.as_ref(), &request).unwrap(), Stats::new(9, 9, 0, 0));
    assert_eq!(ops.delete(store.as_ref(), &request).unwrap(), Stats::new(9, 0, 0, 9));
    assert!(all_tiles(store.as_ref()).is_empty());
}

#[test]
fn test_variants_hold_identical_tile_sets() {
    let dir = tempfile::tempdir().unwrap();
    let request = track_request("10-12");
    let stores: Vec<Box<dyn TileStore>> = StoreVariant::ALL
        .iter()
        .map(|&variant| new_store(dir.path(), variant, "same"))
        .collect();

    let (_, ops) = online();
    for store in &stores {
        assert_eq!(ops.insert(store.as_ref(), &request).unwrap(), Stats::new(24, 0, 24, 0));
    }
    for store in &stores[1..] {
        assert_same_content(stores[0].as_ref(), store.as_ref());
        assert_eq!(
            ops.count(store.as_ref(), &request).unwrap(),
            ops.count(stores[0].as_ref(), &request).unwrap()
        );
    }
}

#[test]
fn test_world_range_matches_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path(), StoreVariant::RowFolder, "cache");
    let (_, ops) = online();
    ops.insert(store.as_ref(), &track_request("1-8")).unwrap();

    for zoom in 1..=8u8 {
        let spec = ZoomSpec::single(zoom);
        let world = TileRequest::new(
            FootprintRequest::TileRange(TileRange::world(zoom)),
            spec.clone(),
        );
        let records = TileRequest::new(FootprintRequest::Records, spec);

        let world = ops.count(store.as_ref(), &world).unwrap();
        let records = ops.count(store.as_ref(), &records).unwrap();
        assert_eq!(world.present, records.present, "Zoom {}", zoom);
        assert_eq!(world.downloaded, records.downloaded);
        assert_eq!(records.total, records.present);
    }
}

#[test]
fn test_inside_range_keeps_cached_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path(), StoreVariant::Native, "cache");
    let (_, ops) = online();
    ops.insert(store.as_ref(), &track_request("14")).unwrap();

    let request = TileRequest::new(
        FootprintRequest::TileRange(TileRange::new(3210, 9471, 3221, 9479)),
        ZoomSpec::single(14),
    );
    let all = ops.count(store.as_ref(), &request).unwrap();
    let inside = ops.count(store.as_ref(), &request.clone().inside(true)).unwrap();

    assert_eq!(all.total, 12 * 9);
    assert!(inside.total > 0);
    assert_eq!(inside.total, inside.present);
    assert_eq!(inside.present, all.present);
}

#[test]
fn test_store_reopens_from_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    for variant in StoreVariant::ALL {
        let store = new_store(dir.path(), variant, "reopen");
        let (_, ops) = online();
        ops.insert(store.as_ref(), &track_request("10")).unwrap();
        store.close().unwrap();

        let reopened = open_store(&store_location(dir.path(), variant, "reopen")).unwrap();
        assert_eq!(reopened.handle().variant, variant);
        assert_eq!(reopened.count_tiles(&[10]).unwrap(), 4, "{}", variant);
    }
}
