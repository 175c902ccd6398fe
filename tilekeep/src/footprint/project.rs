//! Project files
//!
//! A project combines several requests, each with its own zoom spec, one
//! directive per line:
//!
//! ```text
//! # Easter Island
//! -track test.gpx -zoom 10-11
//! -contour test.gpx -zoom 12
//! -tiles 3210,9471,3221,9479 -zoom 14
//! ```
//!
//! Relative track paths are resolved against the project file's directory.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{FootprintError, FootprintRequest, ProjectEntry, TileRange};
use crate::track::{TrackError, TrackReader};
use crate::zoom::{ZoomError, ZoomSpec};

/// Errors loading a project file.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Failed to read project file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Project line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("Project line {line}: {source}")]
    Zoom {
        line: usize,
        #[source]
        source: ZoomError,
    },

    #[error("Project line {line}: {source}")]
    Range {
        line: usize,
        #[source]
        source: FootprintError,
    },

    #[error("Project line {line}: {source}")]
    Track {
        line: usize,
        #[source]
        source: TrackError,
    },
}

/// Parses project text into entries.
pub fn parse_project(
    text: &str,
    base_dir: &Path,
    reader: &dyn TrackReader,
) -> Result<Vec<ProjectEntry>, ProjectError> {
    let mut entries = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        let syntax = |reason: &str| ProjectError::Syntax {
            line,
            reason: reason.to_string(),
        };

        let mut kind: Option<(&str, &str)> = None;
        let mut zoom: Option<&str> = None;
        let mut words = content.split_whitespace();
        while let Some(word) = words.next() {
            let value = words
                .next()
                .ok_or_else(|| syntax(&format!("missing value after {}", word)))?;
            match word {
                "-zoom" => zoom = Some(value),
                "-track" | "-contour" | "-contours" | "-tiles" => {
                    if kind.is_some() {
                        return Err(syntax("more than one tile set on the line"));
                    }
                    kind = Some((word, value));
                }
                "-project" => return Err(syntax("nested projects are not supported")),
                other => return Err(syntax(&format!("unknown option {}", other))),
            }
        }

        let (kind, value) = kind.ok_or_else(|| syntax("no tile set on the line"))?;
        let zoom: ZoomSpec = zoom
            .ok_or_else(|| syntax("missing -zoom"))?
            .parse()
            .map_err(|source| ProjectError::Zoom { line, source })?;

        let request = match kind {
            "-tiles" => FootprintRequest::TileRange(
                value
                    .parse::<TileRange>()
                    .map_err(|source| ProjectError::Range { line, source })?,
            ),
            _ => {
                let path = base_dir.join(value);
                let track = reader
                    .read(&path)
                    .map_err(|source| ProjectError::Track { line, source })?;
                match kind {
                    "-track" => FootprintRequest::Track(track),
                    "-contour" => FootprintRequest::Contour(track),
                    _ => FootprintRequest::Contours(track),
                }
            }
        };

        entries.push(ProjectEntry { request, zoom });
    }

    Ok(entries)
}

/// Reads and parses a project file.
pub fn load_project(
    path: &Path,
    reader: &dyn TrackReader,
) -> Result<Vec<ProjectEntry>, ProjectError> {
    let text = fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_project(&text, base_dir, reader)
}
