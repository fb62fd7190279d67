//! Drop catalog loading
//!
//! The catalog is a JSON array of drops. A configured file wins; otherwise
//! the catalog compiled into the binary is used. Any failure here is fatal
//! to sessions (the service renders an error state instead of a survey).

use dvt_common::Drop;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

const BUNDLED_CATALOG: &str = include_str!("../data/drops.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Drop at position {0} has a blank id")]
    BlankId(usize),

    #[error("Duplicate drop id: {0}")]
    DuplicateId(String),
}

/// Load the catalog from `path`, or the bundled catalog when `None`
pub fn load_catalog(path: Option<&Path>) -> Result<Vec<Drop>, CatalogError> {
    let result = match path {
        Some(path) => {
            info!("Loading drops from {}", path.display());
            std::fs::read_to_string(path)
                .map_err(|source| CatalogError::Read {
                    path: path.display().to_string(),
                    source,
                })
                .and_then(|json| parse_catalog(&json))
        }
        None => {
            info!("Loading bundled drops");
            parse_catalog(BUNDLED_CATALOG)
        }
    };

    match &result {
        Ok(drops) => info!("Successfully loaded drops: {}", drops.len()),
        Err(e) => error!("Error loading drops: {}", e),
    }
    result
}

/// Parse and check a catalog document
pub fn parse_catalog(json: &str) -> Result<Vec<Drop>, CatalogError> {
    let drops: Vec<Drop> = serde_json::from_str(json)?;

    let mut seen = HashSet::with_capacity(drops.len());
    for (position, drop) in drops.iter().enumerate() {
        if drop.id.trim().is_empty() {
            return Err(CatalogError::BlankId(position));
        }
        if !seen.insert(drop.id.as_str()) {
            return Err(CatalogError::DuplicateId(drop.id.clone()));
        }
    }

    Ok(drops)
}
