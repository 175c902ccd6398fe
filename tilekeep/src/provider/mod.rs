//! Upstream tile provider
//!
//! Tiles missing from a store are downloaded from the server named by the
//! store's URL template:
//!
//! ```ignore
//! use tilekeep::provider::{ReqwestClient, TileFetcher, UrlTemplate};
//!
//! let client = Arc::new(ReqwestClient::new()?);
//! let template = UrlTemplate::parse("https://tile.openstreetmap.org/{zoom}/{x}/{y}.png")?;
//! let fetcher = TileFetcher::new(client, template);
//! let bytes = fetcher.fetch(&coord)?;
//! ```

mod http;
mod template;

pub use http::{HttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use template::UrlTemplate;

#[cfg(test)]
pub use http::tests::MockHttpClient;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::coord::TileCoord;

/// Errors downloading a tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport failure or non-success status
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with an error status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// URL template is missing a placeholder
    #[error("Invalid URL template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Server returned no data
    #[error("Empty response from {0}")]
    Empty(String),
}

/// Downloads tiles through an [`HttpClient`] using a [`UrlTemplate`].
#[derive(Clone)]
pub struct TileFetcher {
    client: Arc<dyn HttpClient>,
    template: UrlTemplate,
}

impl TileFetcher {
    pub fn new(client: Arc<dyn HttpClient>, template: UrlTemplate) -> Self {
        Self { client, template }
    }

    pub fn template(&self) -> &UrlTemplate {
        &self.template
    }

    /// Downloads one tile.
    pub fn fetch(&self, coord: &TileCoord) -> Result<Vec<u8>, FetchError> {
        let url = self.template.url(coord);
        debug!(tile = %coord, url = %url, "Fetching tile");
        let data = self.client.get(&url)?;
        if data.is_empty() {
            return Err(FetchError::Empty(url));
        }
        Ok(data)
    }
}

impl std::fmt::Debug for TileFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileFetcher")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}
