//! Describe command - create a store or change its metadata.

use std::path::Path;

use tilekeep::provider::UrlTemplate;
use tilekeep::store::{describe, sidecar_path, StoreHandle, StoreVariant, TileEncoding};

use crate::error::CliError;

/// Arguments for the describe command.
pub struct DescribeArgs<'a> {
    pub database: &'a Path,
    pub variant: Option<StoreVariant>,
    pub encoding: Option<TileEncoding>,
    pub url: Option<String>,
}

/// Run the describe command.
///
/// Without options an existing store is only displayed. Options override the
/// current metadata; a new store defaults to a native PNG database.
pub fn run(args: DescribeArgs<'_>) -> Result<(), CliError> {
    let exists = sidecar_path(args.database).exists();

    if exists && args.variant.is_none() && args.encoding.is_none() && args.url.is_none() {
        print_handle(&StoreHandle::load(args.database)?);
        return Ok(());
    }

    let mut handle = if exists {
        StoreHandle::load(args.database)?
    } else {
        StoreHandle::new(StoreVariant::Native, args.database, "", TileEncoding::Png)
    };

    if let Some(variant) = args.variant {
        if exists && variant != handle.variant {
            return Err(CliError::Usage(format!(
                "{} is a {} store; export it to change the layout",
                args.database.display(),
                handle.variant
            )));
        }
        handle.variant = variant;
    }
    if let Some(encoding) = args.encoding {
        handle.encoding = encoding;
    }
    if let Some(url) = args.url {
        if !url.is_empty() {
            UrlTemplate::parse(&url).map_err(|e| CliError::Usage(e.to_string()))?;
        }
        handle.url_template = url;
    }

    describe(&handle)?;
    print_handle(&handle);
    Ok(())
}

fn print_handle(handle: &StoreHandle) {
    println!("Store:       {}", handle.location.display());
    println!("Layout:      {}", handle.variant);
    println!("Tile format: {}", handle.encoding);
    if handle.url_template.is_empty() {
        println!("URL:         (not set)");
    } else {
        println!("URL:         {}", handle.url_template);
    }
}
