use std::collections::HashMap;

use percent_encoding::percent_decode_str;

use crate::package::basename;
use crate::package::classifier;
use crate::package::registry::{ResourceHandle, ResourceRegistry};
use crate::package::SourceItem;

/// Maps every normalized spelling of an item's path to its resource handle.
///
/// Keys are unique. The first item to claim a key keeps it for the package's
/// lifetime; later writers for the same key are silently ignored. Duplicate
/// basenames across subfolders are therefore a deterministic, order-dependent
/// tie break rather than an error; the loser stays reachable under its
/// fuller path keys.
#[derive(Debug, Default)]
pub struct ResourceIndex {
    /// Insertion order; the resolver's suffix scan iterates this.
    entries: Vec<(String, ResourceHandle)>,
    lookup: HashMap<String, usize>,
}

impl ResourceIndex {
    /// Registers every item and indexes it under all derived key spellings.
    ///
    /// Also returns the handle created for each item, in item order. An item
    /// whose every key was already claimed by an earlier duplicate does not
    /// appear in the index at all, but its handle still exists and the
    /// package has to revoke it on teardown.
    pub fn build(registry: &ResourceRegistry, items: Vec<SourceItem>) -> (ResourceIndex, Vec<ResourceHandle>) {
        let mut index = ResourceIndex::default();
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            let SourceItem {
                name,
                relative_path,
                bytes,
            } = item;
            let path = relative_path.unwrap_or_else(|| name.clone());
            let content_type = classifier::classify(&name).content_type;
            let handle = registry.register(&name, content_type, bytes);

            for key in derive_keys(&path) {
                index.insert_if_absent(key, handle);
            }
            handles.push(handle);
        }

        (index, handles)
    }

    pub(crate) fn insert_if_absent(&mut self, key: String, handle: ResourceHandle) {
        if self.lookup.contains_key(&key) {
            return;
        }
        self.lookup.insert(key.clone(), self.entries.len());
        self.entries.push((key, handle));
    }

    pub fn get(&self, key: &str) -> Option<ResourceHandle> {
        self.lookup.get(key).map(|&position| self.entries[position].1)
    }

    /// Keys in insertion order; the resolver's tie break depends on it.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ResourceHandle)> {
        self.entries.iter().map(|(key, handle)| (key.as_str(), *handle))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All key spellings a descriptor reference might use for `path`: the path
/// itself, its basename, `./`-prefixed and lowercased variants, and the
/// percent-decoded forms when decoding succeeds (a path that fails to decode
/// just skips those keys instead of aborting the item).
fn derive_keys(path: &str) -> Vec<String> {
    let lower = path.to_lowercase();
    let base = basename(path);

    let mut keys = vec![
        path.to_owned(),
        lower.clone(),
        base.to_owned(),
        base.to_lowercase(),
        format!("./{path}"),
        format!("./{lower}"),
    ];

    if let Ok(decoded) = percent_decode_str(path).decode_utf8() {
        let decoded_lower = decoded.to_lowercase();
        keys.push(decoded.to_string());
        keys.push(decoded_lower.clone());
        keys.push(format!("./{decoded}"));
        keys.push(format!("./{decoded_lower}"));
    }

    keys
}
