use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::io::common::loader::RawResourceSource;

/// Opaque, copyable reference to one registered byte buffer. Cheap to pass
/// around; the backing memory is retained until the handle is revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(u64);

/// The bytes behind a handle, plus what the classifier knows about them.
#[derive(Debug)]
pub struct Resource {
    pub name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Resource {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Issues and revokes handles. The only mutable shared state in the whole
/// ingestion pipeline; creates and revokes are sequenced by the package
/// controller, resolver reads never touch it.
pub struct ResourceRegistry {
    next_id: AtomicU64,
    resources: DashMap<ResourceHandle, Arc<Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            resources: DashMap::new(),
        }
    }

    /// Stores the buffer and hands out a fresh handle. Ids are never reused,
    /// so a revoked handle stays dead.
    pub fn register(&self, name: &str, content_type: &'static str, bytes: Vec<u8>) -> ResourceHandle {
        let handle = ResourceHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.resources.insert(
            handle,
            Arc::new(Resource {
                name: name.to_owned(),
                content_type,
                bytes,
            }),
        );
        handle
    }

    pub fn get(&self, handle: ResourceHandle) -> Option<Arc<Resource>> {
        self.resources.get(&handle).map(|entry| entry.value().clone())
    }

    /// Returns whether the handle was still live, so teardown can observe
    /// exactly-once revocation.
    pub fn revoke(&self, handle: ResourceHandle) -> bool {
        self.resources.remove(&handle).is_some()
    }

    pub fn live_handles(&self) -> usize {
        self.resources.len()
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RawResourceSource for ResourceRegistry {
    fn load_raw(&self, handle: ResourceHandle) -> Option<Arc<Resource>> {
        self.get(handle)
    }
}
