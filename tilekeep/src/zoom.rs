//! Zoom specifications
//!
//! A zoom spec names the target zoom levels of a request and, optionally, a
//! coarser source zoom from which targets are derived by subdivision:
//!
//! ```text
//! 12            single level
//! 10-11         inclusive range
//! 10,11,12      list
//! 12/10         level 12 derived from level 10
//! 10-12,14/9    mixed list with a source
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::coord::{MAX_ZOOM, MIN_ZOOM};

/// Error parsing a zoom specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoomError {
    #[error("Empty zoom specification")]
    Empty,

    #[error("Invalid zoom specification '{spec}': {reason}")]
    Invalid { spec: String, reason: String },

    #[error("Zoom {zoom} out of range (maximum is {max})")]
    OutOfRange { zoom: u32, max: u8 },

    #[error("Reversed zoom range {start}-{end}")]
    ReversedRange { start: u8, end: u8 },

    #[error("Source zoom {source_zoom} is finer than target zoom {target}")]
    SourceAboveTarget { source_zoom: u8, target: u8 },
}

/// Parsed zoom specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoomSpec {
    targets: BTreeSet<u8>,
    source: Option<u8>,
}

/// One list item: `N` or `A-B`.
fn item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // (\d+)         - zoom, or start of range
        // (?:-(\d+))?   - optional end of range
        Regex::new(r"^(\d+)(?:-(\d+))?$").unwrap()
    })
}

fn parse_level(spec: &str, digits: &str) -> Result<u8, ZoomError> {
    let value: u32 = digits.parse().map_err(|_| ZoomError::Invalid {
        spec: spec.to_string(),
        reason: format!("'{}' is not a zoom level", digits),
    })?;
    if value > MAX_ZOOM as u32 {
        return Err(ZoomError::OutOfRange {
            zoom: value,
            max: MAX_ZOOM,
        });
    }
    Ok(value as u8)
}

impl ZoomSpec {
    /// Spec for a single target zoom without subdivision.
    pub fn single(zoom: u8) -> Self {
        Self {
            targets: BTreeSet::from([zoom]),
            source: None,
        }
    }

    /// Every zoom level the tile grid supports, without subdivision.
    pub fn all_levels() -> Self {
        Self {
            targets: (MIN_ZOOM..=MAX_ZOOM).collect(),
            source: None,
        }
    }

    /// Builds a spec from explicit parts, enforcing the same rules as parsing.
    pub fn new(
        targets: impl IntoIterator<Item = u8>,
        source: Option<u8>,
    ) -> Result<Self, ZoomError> {
        let targets: BTreeSet<u8> = targets.into_iter().collect();
        let Some(&min) = targets.iter().next() else {
            return Err(ZoomError::Empty);
        };
        if let Some(&max) = targets.iter().next_back() {
            if max > MAX_ZOOM {
                return Err(ZoomError::OutOfRange {
                    zoom: max as u32,
                    max: MAX_ZOOM,
                });
            }
        }
        if let Some(source_zoom) = source {
            if source_zoom > min {
                return Err(ZoomError::SourceAboveTarget {
                    source_zoom,
                    target: min,
                });
            }
        }
        Ok(Self { targets, source })
    }

    /// Target zoom levels in ascending order.
    pub fn targets(&self) -> impl Iterator<Item = u8> + '_ {
        self.targets.iter().copied()
    }

    pub fn target_set(&self) -> &BTreeSet<u8> {
        &self.targets
    }

    pub fn source(&self) -> Option<u8> {
        self.source
    }

    /// Source zoom used for `target`, or `None` when the target is produced
    /// directly (no source, or source equal to the target).
    pub fn subdivision_source(&self, target: u8) -> Option<u8> {
        self.source.filter(|&s| s < target)
    }

    pub fn is_subdivision(&self, target: u8) -> bool {
        self.subdivision_source(target).is_some()
    }
}

impl FromStr for ZoomSpec {
    type Err = ZoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        if spec.is_empty() {
            return Err(ZoomError::Empty);
        }

        let (list, source) = match spec.split_once('/') {
            Some((list, source)) => (list, Some(parse_level(spec, source.trim())?)),
            None => (spec, None),
        };

        let mut targets = BTreeSet::new();
        for item in list.split(',') {
            let item = item.trim();
            let caps = item_pattern()
                .captures(item)
                .ok_or_else(|| ZoomError::Invalid {
                    spec: spec.to_string(),
                    reason: format!("'{}' is neither a zoom nor a range", item),
                })?;

            let start = parse_level(spec, &caps[1])?;
            let end = match caps.get(2) {
                Some(m) => parse_level(spec, m.as_str())?,
                None => start,
            };
            if start > end {
                return Err(ZoomError::ReversedRange { start, end });
            }
            targets.extend(start..=end);
        }

        ZoomSpec::new(targets, source)
    }
}

impl fmt::Display for ZoomSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let levels: Vec<String> = self.targets.iter().map(|z| z.to_string()).collect();
        write!(f, "{}", levels.join(","))?;
        if let Some(source) = self.source {
            write!(f, "/{}", source)?;
        }
        Ok(())
    }
}
