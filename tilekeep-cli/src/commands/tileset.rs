//! Tile set selection shared by the batch commands.

use std::path::PathBuf;

use clap::{ArgGroup, Args};
use tilekeep::footprint::{load_project, FootprintRequest, TileRange};
use tilekeep::operations::TileRequest;
use tilekeep::track::{GpxTrackReader, TrackReader};
use tilekeep::zoom::ZoomSpec;

use crate::error::CliError;

/// Exactly one tile set plus its zoom levels.
#[derive(Debug, Clone, Args)]
#[command(group(
    ArgGroup::new("tileset")
        .required(true)
        .args(["track", "contour", "contours", "tiles", "records", "project"])
))]
pub struct TilesetArgs {
    /// Tiles along a GPX track
    #[arg(long, value_name = "GPX")]
    pub track: Option<PathBuf>,

    /// Tiles along and inside the track, closed into one contour
    #[arg(long, value_name = "GPX")]
    pub contour: Option<PathBuf>,

    /// Tiles along and inside each track segment, closed separately
    #[arg(long, value_name = "GPX")]
    pub contours: Option<PathBuf>,

    /// Tile rectangle at every zoom level
    #[arg(long, value_name = "XMIN,YMIN,XMAX,YMAX")]
    pub tiles: Option<TileRange>,

    /// Tiles already stored in the database
    #[arg(long)]
    pub records: bool,

    /// Project file listing tile sets with their own zoom levels
    #[arg(long, value_name = "FILE")]
    pub project: Option<PathBuf>,

    /// Zoom levels: 12, 10-12, 10,12 or 14/12 to derive 14 from 12
    /// (default for --records: every level)
    #[arg(
        long,
        value_name = "SPEC",
        required_unless_present_any = ["project", "records"]
    )]
    pub zoom: Option<ZoomSpec>,

    /// Keep only tiles already present in the database
    #[arg(long)]
    pub inside: bool,
}

impl TilesetArgs {
    /// Reads any track or project file and builds the request.
    pub fn to_request(&self) -> Result<TileRequest, CliError> {
        let reader = GpxTrackReader::new();

        let footprint = if let Some(path) = &self.track {
            FootprintRequest::Track(reader.read(path)?)
        } else if let Some(path) = &self.contour {
            FootprintRequest::Contour(reader.read(path)?)
        } else if let Some(path) = &self.contours {
            FootprintRequest::Contours(reader.read(path)?)
        } else if let Some(range) = self.tiles {
            FootprintRequest::TileRange(range)
        } else if let Some(path) = &self.project {
            FootprintRequest::Project(load_project(path, &reader)?)
        } else if self.records {
            FootprintRequest::Records
        } else {
            return Err(CliError::Usage("No tile set given".to_string()));
        };

        // Project entries carry their own zoom levels
        let zoom = match (&self.zoom, &footprint) {
            (Some(zoom), _) => zoom.clone(),
            (None, FootprintRequest::Project(_)) => ZoomSpec::single(0),
            (None, FootprintRequest::Records) => ZoomSpec::all_levels(),
            (None, _) => return Err(CliError::Usage("--zoom is required".to_string())),
        };

        Ok(TileRequest::new(footprint, zoom).inside(self.inside))
    }
}
