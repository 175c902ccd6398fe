//! Store metadata sidecar
//!
//! Every store has a `<location>.properties` file next to it recording the
//! backend variant, the tile encoding and the upstream URL template:
//!
//! ```text
//! db_format=native
//! tile_format=png
//! url=https://tile.openstreetmap.org/{zoom}/{x}/{y}.png
//! ```

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;

use super::encoding::TileEncoding;
use super::StoreError;

const KEY_DB_FORMAT: &str = "db_format";
const KEY_TILE_FORMAT: &str = "tile_format";
const KEY_URL: &str = "url";

/// Backend layout of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreVariant {
    /// SQLite file with a `(zoom, x, y)` keyed table
    Native,
    /// Directory tree `zoom/y/x.ext`
    RowFolder,
    /// Directory tree `zoom/x/y.ext`
    PlainFolder,
    /// SQLite file in the RMaps / Maverick "sqlitedb" schema
    Maverick,
}

impl StoreVariant {
    pub const ALL: [StoreVariant; 4] = [
        StoreVariant::Native,
        StoreVariant::RowFolder,
        StoreVariant::PlainFolder,
        StoreVariant::Maverick,
    ];

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::RowFolder | Self::PlainFolder)
    }
}

impl fmt::Display for StoreVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Native => "native",
            Self::RowFolder => "rowfolder",
            Self::PlainFolder => "folder",
            Self::Maverick => "maverick",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for StoreVariant {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "kahelo" => Ok(Self::Native),
            "rowfolder" | "row-folder" => Ok(Self::RowFolder),
            "folder" | "plainfolder" | "plain-folder" => Ok(Self::PlainFolder),
            "maverick" | "rmaps" => Ok(Self::Maverick),
            other => Err(StoreError::UnknownVariant(other.to_string())),
        }
    }
}

/// Everything needed to open a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHandle {
    pub variant: StoreVariant,
    pub location: PathBuf,
    pub url_template: String,
    pub encoding: TileEncoding,
}

impl StoreHandle {
    pub fn new(
        variant: StoreVariant,
        location: impl Into<PathBuf>,
        url_template: impl Into<String>,
        encoding: TileEncoding,
    ) -> Self {
        Self {
            variant,
            location: location.into(),
            url_template: url_template.into(),
            encoding,
        }
    }

    /// Path of the sidecar file.
    pub fn sidecar_path(&self) -> PathBuf {
        sidecar_path(&self.location)
    }

    /// File extension used by folder stores.
    ///
    /// Server-encoded stores take the extension of the URL template, falling
    /// back to `png`.
    pub fn file_extension(&self) -> String {
        if let Some(ext) = self.encoding.extension() {
            return ext.to_string();
        }
        template_extension(&self.url_template).unwrap_or_else(|| "png".to_string())
    }

    /// Writes the sidecar, replacing any previous one.
    pub fn save(&self) -> Result<(), StoreError> {
        let mut ini = Ini::new();
        ini.with_section(None::<String>)
            .set(KEY_DB_FORMAT, self.variant.to_string())
            .set(KEY_TILE_FORMAT, self.encoding.to_string())
            .set(KEY_URL, self.url_template.clone());

        let path = self.sidecar_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        ini.write_to_file(&path)?;
        Ok(())
    }

    /// Reads the sidecar of the store at `location`.
    pub fn load(location: &Path) -> Result<Self, StoreError> {
        let path = sidecar_path(location);
        if !path.is_file() {
            return Err(StoreError::Metadata {
                path,
                reason: "store is not described".to_string(),
            });
        }

        let ini = Ini::load_from_file(&path).map_err(|e| StoreError::Metadata {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let props = ini.general_section();
        let get = |key: &str| {
            props.get(key).ok_or_else(|| StoreError::Metadata {
                path: path.clone(),
                reason: format!("missing key '{}'", key),
            })
        };

        let variant = get(KEY_DB_FORMAT)?.parse()?;
        let encoding = get(KEY_TILE_FORMAT)?
            .parse()
            .map_err(|e: super::encoding::EncodingError| StoreError::Metadata {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        let url_template = props.get(KEY_URL).unwrap_or_default().to_string();

        Ok(Self {
            variant,
            location: location.to_path_buf(),
            url_template,
            encoding,
        })
    }
}

/// `<location>.properties`
pub fn sidecar_path(location: &Path) -> PathBuf {
    let mut name = OsString::from(location.as_os_str());
    name.push(".properties");
    PathBuf::from(name)
}

/// Extension of the last path component of a URL template, if any.
fn template_extension(template: &str) -> Option<String> {
    let path = template.split(['?', '#']).next()?;
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    let valid = !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_names() {
        for variant in StoreVariant::ALL {
            assert_eq!(variant.to_string().parse::<StoreVariant>().unwrap(), variant);
        }
        assert_eq!("kahelo".parse::<StoreVariant>().unwrap(), StoreVariant::Native);
        assert_eq!("rmaps".parse::<StoreVariant>().unwrap(), StoreVariant::Maverick);
        assert!("mbtiles".parse::<StoreVariant>().is_err());
    }

    #[test]
    fn test_sidecar_path_appends_suffix() {
        assert_eq!(
            sidecar_path(Path::new("/tmp/test.db")),
            PathBuf::from("/tmp/test.db.properties")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let handle = StoreHandle::new(
            StoreVariant::RowFolder,
            dir.path().join("tiles"),
            "http://localhost/{zoom}/{x}/{y}.jpg",
            TileEncoding::Server,
        );
        handle.save().unwrap();

        let loaded = StoreHandle::load(&handle.location).unwrap();
        assert_eq!(loaded, handle);
    }

    #[test]
    fn test_load_missing_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let result = StoreHandle::load(&dir.path().join("nothing.db"));
        assert!(matches!(result, Err(StoreError::Metadata { .. })));
    }

    #[test]
    fn test_load_corrupt_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("bad.db");
        std::fs::write(sidecar_path(&location), "db_format=floppy\ntile_format=png\n").unwrap();
        assert!(StoreHandle::load(&location).is_err());

        std::fs::write(sidecar_path(&location), "tile_format=png\n").unwrap();
        assert!(matches!(
            StoreHandle::load(&location),
            Err(StoreError::Metadata { .. })
        ));
    }

    #[test]
    fn test_file_extension() {
        let mut handle = StoreHandle::new(
            StoreVariant::PlainFolder,
            "x",
            "http://host/{zoom}/{x}/{y}.JPG?key=1",
            TileEncoding::Server,
        );
        assert_eq!(handle.file_extension(), "jpg");

        handle.url_template = "http://host/{zoom}/{x}/{y}".to_string();
        assert_eq!(handle.file_extension(), "png");

        handle.encoding = TileEncoding::Jpeg;
        assert_eq!(handle.file_extension(), "jpg");
    }
}
