use std::fs;
use std::path::Path;

use glance_zip::Archive;
use log::trace;

use crate::package::{IngestError, SourceItem};

/// Expands a compressed container into the flat item sequence the ingestion
/// classifier consumes.
///
/// Directory placeholders carry no bytes and are skipped; file entries keep
/// their full in-container path, so nested structure survives expansion.
/// Items come out in archive entry order, which is what makes the index's
/// duplicate tie break deterministic for containers too. A corrupt or
/// unsupported archive aborts the whole gesture; no partial package is made.
pub fn expand_container(bytes: Vec<u8>) -> Result<Vec<SourceItem>, IngestError> {
    let mut archive = Archive::from_bytes(bytes)?;

    let mut items = Vec::with_capacity(archive.len());
    for position in 0..archive.len() {
        if archive.entries()[position].is_dir() {
            continue;
        }
        let relative_path = archive.entries()[position].name().to_owned();
        let bytes = archive.read(position)?;
        trace!("Expanded {} ({} bytes)", relative_path, bytes.len());
        items.push(SourceItem::nested(relative_path, bytes));
    }
    Ok(items)
}

/// Reads the container from disk first; the expansion itself happens on the
/// in-memory bytes.
pub fn expand_container_file(path: &Path) -> Result<Vec<SourceItem>, IngestError> {
    expand_container(fs::read(path)?)
}
