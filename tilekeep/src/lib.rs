//! tilekeep - incremental slippy-map tile cache for offline GPS maps
//!
//! The library computes which tiles cover a GPX track, a tile rectangle or a
//! whole project, and moves those tiles between tile servers and local tile
//! stores:
//!
//! - [`footprint`] turns a request into the set of tiles it covers
//! - [`store`] persists tiles in four on-disk layouts behind one trait
//! - [`operations`] counts, downloads, copies and deletes tile sets
//! - [`derive`] builds fine tiles from cached coarser ones
//! - [`server`] serves a store over HTTP, filling misses on demand

pub mod config;
pub mod coord;
pub mod derive;
pub mod footprint;
pub mod logging;
pub mod operations;
pub mod provider;
pub mod server;
pub mod store;
pub mod track;
pub mod zoom;
