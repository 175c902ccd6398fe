//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use tilekeep::provider::{FetchError, HttpClient};
use tilekeep::store::{describe, open_store, StoreHandle, StoreVariant, TileEncoding, TileStore};
use tilekeep::track::Track;

pub const URL_TEMPLATE: &str = "http://tiles.test/{zoom}/{x}/{y}.png";

/// Easter Island reference track.
pub const GPX1: &[(f64, f64)] = &[
    (-27.0572913, -109.3805695),
    (-27.1801341, -109.4464874),
    (-27.1068114, -109.2312241),
];

/// Two closed-ish loops on opposite sides of the island.
pub const GPX2_SEGMENT_1: &[(f64, f64)] = &[
    (-27.1401181, -109.4351578),
    (-27.1813558, -109.4633102),
    (-27.2067017, -109.4258881),
    (-27.1740257, -109.3949890),
];
pub const GPX2_SEGMENT_2: &[(f64, f64)] = &[
    (-27.0863335, -109.2755127),
    (-27.0887788, -109.2284775),
    (-27.1260632, -109.2350006),
    (-27.1275910, -109.2689896),
];

pub fn gpx1_track() -> Track {
    Track::from_lat_lon(&[GPX1])
}

/// Writes a GPX file with one track per segment.
pub fn write_gpx(path: &Path, segments: &[&[(f64, f64)]]) {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="tilekeep-tests" xmlns="http://www.topografix.com/GPX/1/1">
"#,
    );
    for segment in segments {
        xml.push_str("  <trk><trkseg>\n");
        for (lat, lon) in segment.iter() {
            xml.push_str(&format!("    <trkpt lat=\"{}\" lon=\"{}\"></trkpt>\n", lat, lon));
        }
        xml.push_str("  </trkseg></trk>\n");
    }
    xml.push_str("</gpx>\n");
    std::fs::write(path, xml).unwrap();
}

/// Small PNG whose colour depends on `seed`.
pub fn png(seed: u8) -> Vec<u8> {
    let image = RgbImage::from_fn(8, 8, |x, y| Rgb([seed, x as u8 * 16, y as u8 * 16]));
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

/// Tile server stand-in answering every URL with a PNG derived from it.
#[derive(Default)]
pub struct PngServer {
    requests: AtomicUsize,
}

impl PngServer {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl HttpClient for PngServer {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let seed = url.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
        Ok(png(seed))
    }
}

/// Tile server stand-in that is always unreachable.
pub struct OfflineServer;

impl HttpClient for OfflineServer {
    fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Http("connection refused".to_string()))
    }
}

pub fn store_location(dir: &Path, variant: StoreVariant, name: &str) -> PathBuf {
    dir.join(format!("{}-{}", name, variant))
}

/// Describes and opens an empty PNG store.
pub fn new_store(dir: &Path, variant: StoreVariant, name: &str) -> Box<dyn TileStore> {
    new_store_with(dir, variant, name, TileEncoding::Png)
}

/// Describes and opens an empty store with the given tile encoding.
pub fn new_store_with(
    dir: &Path,
    variant: StoreVariant,
    name: &str,
    encoding: TileEncoding,
) -> Box<dyn TileStore> {
    let handle = StoreHandle::new(
        variant,
        store_location(dir, variant, name),
        URL_TEMPLATE,
        encoding,
    );
    describe(&handle).unwrap();
    open_store(&handle.location).unwrap()
}
