//! Tile set resolution
//!
//! Resolves a [`TileRequest`] against a store into one [`TilePlan`] per
//! target zoom. Footprints themselves are pure; this is where store content
//! comes in, for `Records` requests, the `inside` restriction and the
//! present-ancestor set of a zoom subdivision.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::OperationError;
use crate::coord::TileCoord;
use crate::footprint::{footprint_at, FootprintRequest};
use crate::store::TileStore;
use crate::zoom::ZoomSpec;

/// A footprint request with its zoom spec.
#[derive(Debug, Clone)]
pub struct TileRequest {
    pub footprint: FootprintRequest,
    pub zoom: ZoomSpec,
    /// Keep only tiles already present in the active store
    pub inside: bool,
}

impl TileRequest {
    pub fn new(footprint: FootprintRequest, zoom: ZoomSpec) -> Self {
        Self {
            footprint,
            zoom,
            inside: false,
        }
    }

    pub fn inside(mut self, inside: bool) -> Self {
        self.inside = inside;
        self
    }

    /// Every zoom level the request touches, sources included.
    pub fn zoom_levels(&self) -> BTreeSet<u8> {
        let specs: Vec<&ZoomSpec> = match &self.footprint {
            FootprintRequest::Project(entries) => entries.iter().map(|e| &e.zoom).collect(),
            _ => vec![&self.zoom],
        };
        specs
            .into_iter()
            .flat_map(|spec| spec.targets().chain(spec.source()))
            .collect()
    }
}

/// Work for one target zoom.
///
/// `tiles` is the full set accounted for in `Stats::total`; `required` is the
/// subset an operation acts on. They are equal unless the zoom is produced by
/// subdivision, in which case `tiles` is the full expansion of the present
/// source tiles and `required` its intersection with the target footprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePlan {
    pub zoom: u8,
    pub source: Option<u8>,
    pub tiles: BTreeSet<TileCoord>,
    pub required: BTreeSet<TileCoord>,
}

impl TilePlan {
    pub fn is_subdivision(&self) -> bool {
        self.source.is_some()
    }

    /// Tiles of the set that are not required.
    pub fn surplus(&self) -> usize {
        self.tiles.len() - self.required.len()
    }
}

/// Resolves `request` into one plan per target zoom.
///
/// `tiles_from` is the store tiles come from: it answers `Records` requests
/// and source-tile presence. `active` is the store the `inside` restriction
/// refers to. Project entries sharing a target zoom are merged, so a tile is
/// counted once however many entries name it. They must agree on the source
/// zoom of that target.
pub(crate) fn plan(
    tiles_from: &dyn TileStore,
    active: &dyn TileStore,
    request: &TileRequest,
) -> Result<Vec<TilePlan>, OperationError> {
    let mut plans: BTreeMap<u8, TilePlan> = BTreeMap::new();

    let entries: Vec<(&FootprintRequest, &ZoomSpec)> = match &request.footprint {
        FootprintRequest::Project(entries) => {
            entries.iter().map(|e| (&e.request, &e.zoom)).collect()
        }
        other => vec![(other, &request.zoom)],
    };

    for (footprint, zoom) in entries {
        for target in zoom.targets() {
            let source = zoom.subdivision_source(target);
            let mut p = plan_zoom(tiles_from, footprint, target, source)?;
            if request.inside {
                p.tiles = retain_present(active, p.tiles)?;
                p.required = retain_present(active, p.required)?;
            }

            match plans.get_mut(&target) {
                Some(merged) if merged.source != source => {
                    return Err(OperationError::MixedSources { zoom: target });
                }
                Some(merged) => {
                    merged.tiles.extend(p.tiles);
                    merged.required.extend(p.required);
                }
                None => {
                    plans.insert(target, p);
                }
            }
        }
    }

    for p in plans.values() {
        debug!(
            zoom = p.zoom,
            source = ?p.source,
            tiles = p.tiles.len(),
            required = p.required.len(),
            "Resolved tile plan"
        );
    }
    Ok(plans.into_values().collect())
}

fn plan_zoom(
    store: &dyn TileStore,
    footprint: &FootprintRequest,
    target: u8,
    source: Option<u8>,
) -> Result<TilePlan, OperationError> {
    let wanted = footprint_in(store, footprint, target)?;

    let Some(source) = source else {
        return Ok(TilePlan {
            zoom: target,
            source: None,
            tiles: wanted.clone(),
            required: wanted,
        });
    };

    let parents = retain_present(store, footprint_in(store, footprint, source)?)?;
    let mut tiles = BTreeSet::new();
    for parent in &parents {
        tiles.extend(parent.children(target)?);
    }
    let required = tiles.intersection(&wanted).copied().collect();

    Ok(TilePlan {
        zoom: target,
        source: Some(source),
        tiles,
        required,
    })
}

/// Footprint at one zoom, answering `Records` from the store.
fn footprint_in(
    store: &dyn TileStore,
    footprint: &FootprintRequest,
    zoom: u8,
) -> Result<BTreeSet<TileCoord>, OperationError> {
    match footprint {
        FootprintRequest::Records => Ok(store.list_tiles(&[zoom])?.into_iter().collect()),
        other => Ok(footprint_at(other, zoom)?),
    }
}

fn retain_present(
    store: &dyn TileStore,
    tiles: BTreeSet<TileCoord>,
) -> Result<BTreeSet<TileCoord>, OperationError> {
    let mut kept = BTreeSet::new();
    for tile in tiles {
        if store.exists(&tile)? {
            kept.insert(tile);
        }
    }
    Ok(kept)
}
