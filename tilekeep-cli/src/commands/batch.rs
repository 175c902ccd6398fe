//! Batch commands: count, insert, delete, export, import and stat.
//!
//! All but stat print their statistics as `(total, present, downloaded,
//! missing)`; stat prints a per-zoom table.

use std::path::{Path, PathBuf};

use tilekeep::operations::{Stats, ZoomStat};
use tilekeep::store::{describe, sidecar_path, StoreHandle};
use tracing::info;

use super::common::{open, CliContext};
use super::tileset::TilesetArgs;
use crate::error::CliError;

/// Which batch operation to run on a single store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Count,
    Insert,
    Delete,
}

/// Run count, insert or delete.
pub fn run(
    context: &CliContext,
    action: StoreAction,
    database: &Path,
    tileset: &TilesetArgs,
) -> Result<(), CliError> {
    let request = tileset.to_request()?;
    let store = open(database)?;
    let ops = context.operations()?;

    let stats = match action {
        StoreAction::Count => ops.count(store.as_ref(), &request),
        StoreAction::Insert => ops.insert(store.as_ref(), &request),
        StoreAction::Delete => ops.delete(store.as_ref(), &request),
    };
    store.close()?;
    report(stats?);
    Ok(())
}

/// Copy tiles from `database` into `dest`, creating `dest` like `database`
/// when it has not been described yet.
pub fn run_export(
    context: &CliContext,
    database: &Path,
    dest: &Path,
    tileset: &TilesetArgs,
) -> Result<(), CliError> {
    let request = tileset.to_request()?;
    let source = open(database)?;

    if !sidecar_path(dest).exists() {
        let handle = StoreHandle {
            location: PathBuf::from(dest),
            ..source.handle().clone()
        };
        info!(dest = %dest.display(), variant = %handle.variant, "Creating export store");
        describe(&handle)?;
    }
    let dest = open(dest)?;

    let stats = context
        .operations()?
        .export(source.as_ref(), dest.as_ref(), &request);
    source.close()?;
    dest.close()?;
    report(stats?);
    Ok(())
}

/// Copy tiles from `source` into `database`, overwriting.
pub fn run_import(
    context: &CliContext,
    database: &Path,
    source: &Path,
    tileset: &TilesetArgs,
) -> Result<(), CliError> {
    let request = tileset.to_request()?;
    let dest = open(database)?;
    let source = open(source)?;

    let stats = context
        .operations()?
        .import(dest.as_ref(), source.as_ref(), &request);
    source.close()?;
    dest.close()?;
    report(stats?);
    Ok(())
}

/// Print per-zoom tile counts and stored sizes.
pub fn run_stat(
    context: &CliContext,
    database: &Path,
    tileset: &TilesetArgs,
) -> Result<(), CliError> {
    let request = tileset.to_request()?;
    let store = open(database)?;
    let report = context.operations()?.stat(store.as_ref(), &request);
    store.close()?;
    print!("{}", stat_table(&report?));
    Ok(())
}

fn report(stats: Stats) {
    println!("{}", stats);
}

fn stat_table(report: &[ZoomStat]) -> String {
    let mut out = format!("{:>5} {:>10} {:>10} {:>12}\n", "zoom", "tiles", "present", "bytes");
    let mut total = ZoomStat::default();
    for row in report {
        out.push_str(&format!(
            "{:>5} {:>10} {:>10} {:>12}\n",
            row.zoom, row.tiles, row.present, row.bytes
        ));
        total.tiles += row.tiles;
        total.present += row.present;
        total.bytes += row.bytes;
    }
    out.push_str(&format!(
        "{:>5} {:>10} {:>10} {:>12}\n",
        "total", total.tiles, total.present, total.bytes
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_table_has_total_row() {
        let table = stat_table(&[
            ZoomStat {
                zoom: 10,
                tiles: 4,
                present: 4,
                bytes: 400,
            },
            ZoomStat {
                zoom: 11,
                tiles: 9,
                present: 2,
                bytes: 250,
            },
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1].split_whitespace().collect::<Vec<_>>(),
            vec!["10", "4", "4", "400"]
        );
        assert_eq!(
            lines[3].split_whitespace().collect::<Vec<_>>(),
            vec!["total", "13", "6", "650"]
        );
    }

    #[test]
    fn test_stat_table_empty() {
        let table = stat_table(&[]);
        assert!(table.lines().last().unwrap().starts_with("total"));
    }
}
