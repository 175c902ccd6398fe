//! Tile URL templates with `{zoom}`, `{x}` and `{y}` placeholders.

use std::fmt;

use super::FetchError;
use crate::coord::TileCoord;

/// A validated tile URL template.
///
/// `{z}` is accepted as an alias of `{zoom}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self, FetchError> {
        let invalid = |reason: &str| FetchError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };
        if !template.contains("{zoom}") && !template.contains("{z}") {
            return Err(invalid("missing {zoom} placeholder"));
        }
        if !template.contains("{x}") {
            return Err(invalid("missing {x} placeholder"));
        }
        if !template.contains("{y}") {
            return Err(invalid("missing {y} placeholder"));
        }
        Ok(Self {
            template: template.to_string(),
        })
    }

    /// URL of one tile.
    pub fn url(&self, coord: &TileCoord) -> String {
        let zoom = coord.zoom.to_string();
        self.template
            .replace("{zoom}", &zoom)
            .replace("{z}", &zoom)
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.template)
    }
}
