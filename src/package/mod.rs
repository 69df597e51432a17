use thiserror::Error;

use crate::package::index::ResourceIndex;
use crate::package::registry::ResourceHandle;

pub mod classifier;
pub mod controller;
pub mod index;
pub mod ingest;
pub mod registry;
pub mod resolver;

/// One user-supplied file, as it arrived at the ingestion boundary.
#[derive(Debug, Clone)]
pub struct SourceItem {
    /// Bare file name, without any directory part.
    pub name: String,
    /// Slash-separated path relative to the upload root. Present for folder
    /// uploads and container entries; absent for a flat single-file
    /// selection, where the name doubles as the path.
    pub relative_path: Option<String>,
    pub bytes: Vec<u8>,
}

impl SourceItem {
    pub fn flat(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            relative_path: None,
            bytes,
        }
    }

    pub fn nested(relative_path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let relative_path = relative_path.into();
        Self {
            name: basename(&relative_path).to_owned(),
            relative_path: Some(relative_path),
            bytes,
        }
    }

    /// The path the item is indexed under.
    pub fn effective_path(&self) -> &str {
        self.relative_path.as_deref().unwrap_or(&self.name)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Portion of a slash-separated path after the last `/`.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(position) => &path[position + 1..],
        None => path,
    }
}

/// The product of one successful ingestion gesture. Exactly one package is
/// active at a time; all of its handles are revoked when it is replaced.
#[derive(Debug)]
pub enum ModelPackage {
    /// A single self-contained binary asset.
    Single { handle: ResourceHandle, name: String },
    /// A descriptor plus the side files it references by relative path.
    Composite {
        root_handle: ResourceHandle,
        root_name: String,
        index: ResourceIndex,
        /// Every handle created for this package, in ingestion order. An
        /// item that lost all of its index keys to an earlier duplicate
        /// still owns one, and teardown has to reach it.
        handles: Vec<ResourceHandle>,
    },
}

impl ModelPackage {
    pub fn root_name(&self) -> &str {
        match self {
            ModelPackage::Single { name, .. } => name,
            ModelPackage::Composite { root_name, .. } => root_name,
        }
    }

    pub fn root_handle(&self) -> ResourceHandle {
        match self {
            ModelPackage::Single { handle, .. } => *handle,
            ModelPackage::Composite { root_handle, .. } => *root_handle,
        }
    }

    /// The reference index; `None` for single-binary packages, which have no
    /// side files to resolve.
    pub fn index(&self) -> Option<&ResourceIndex> {
        match self {
            ModelPackage::Single { .. } => None,
            ModelPackage::Composite { index, .. } => Some(index),
        }
    }

    pub fn handles(&self) -> &[ResourceHandle] {
        match self {
            ModelPackage::Single { handle, .. } => std::slice::from_ref(handle),
            ModelPackage::Composite { handles, .. } => handles,
        }
    }
}

/// Failure modes of the ingestion boundary. All of them leave the previously
/// active package untouched, and the gesture can be retried with new input.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Corrupt or unsupported container; no partial package is created.
    #[error("could not read the container archive: {0}")]
    UnreadableContainer(#[from] glance_zip::ArchiveError),

    /// The input holds neither a descriptor nor a binary-package. A warning
    /// at the ingestion surface, not a fault of the process.
    #[error("no .gltf or .glb found in the input files")]
    NoRecognizedPackage,

    /// A newer ingestion gesture started while this one was in flight; its
    /// result was discarded instead of clobbering the newer package.
    #[error("the ingestion was superseded by a newer gesture")]
    Superseded,

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::basename;

    #[test]
    fn basename_takes_the_last_segment() {
        assert_eq!(basename("textures/diffuse.png"), "diffuse.png");
        assert_eq!(basename("a/b/c.bin"), "c.bin");
        assert_eq!(basename("scene.gltf"), "scene.gltf");
        assert_eq!(basename(""), "");
    }
}
