use percent_encoding::percent_decode_str;

use crate::io::common::loader::ResourceResolver;
use crate::package::basename;
use crate::package::index::ResourceIndex;
use crate::package::registry::ResourceHandle;

/// Outcome of a resolution attempt. `Passthrough` hands the reference back
/// unchanged; the fetch failure that follows is the parser's to surface, not
/// ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    Resource(ResourceHandle),
    Passthrough(&'a str),
}

impl Resolved<'_> {
    pub fn handle(&self) -> Option<ResourceHandle> {
        match self {
            Resolved::Resource(handle) => Some(*handle),
            Resolved::Passthrough(_) => None,
        }
    }
}

/// Resolves one side-file reference, as written in the descriptor, against
/// the index. Read-only and never failing: the parser may call this
/// concurrently for every reference it discovers during one load.
///
/// The fallback chain runs in strict order and returns on the first hit:
/// exact, lowercased, `./`-prefixed, percent-decoded, basename, and finally
/// a linear suffix scan over all keys.
pub fn resolve<'a>(index: &ResourceIndex, reference: &'a str) -> Resolved<'a> {
    let normalized = strip_leading(reference);

    if let Some(handle) = index.get(normalized) {
        return Resolved::Resource(handle);
    }
    let lower = normalized.to_lowercase();
    if let Some(handle) = index.get(&lower) {
        return Resolved::Resource(handle);
    }
    if let Some(handle) = index.get(&format!("./{normalized}")) {
        return Resolved::Resource(handle);
    }

    // A reference that fails to decode just skips this step.
    if let Ok(decoded) = percent_decode_str(normalized).decode_utf8() {
        if let Some(handle) = index.get(&decoded) {
            return Resolved::Resource(handle);
        }
        if let Some(handle) = index.get(&decoded.to_lowercase()) {
            return Resolved::Resource(handle);
        }
    }

    let base = basename(normalized);
    if let Some(handle) = index.get(base) {
        return Resolved::Resource(handle);
    }
    if let Some(handle) = index.get(&base.to_lowercase()) {
        return Resolved::Resource(handle);
    }

    // Last resort: scan every key for one that ends in the reference.
    // Packages are tens to low hundreds of side files, so a full scan beats
    // maintaining an inverted suffix index; insertion order breaks ties.
    let suffix = format!("/{normalized}");
    let suffix_lower = format!("/{lower}");
    let suffix_base = format!("/{base}");
    let suffix_base_lower = suffix_base.to_lowercase();
    for (key, handle) in index.iter() {
        let key_lower = key.to_lowercase();
        if key.ends_with(&suffix)
            || key_lower.ends_with(&suffix_lower)
            || key.ends_with(&suffix_base)
            || key_lower.ends_with(&suffix_base_lower)
        {
            return Resolved::Resource(handle);
        }
    }

    Resolved::Passthrough(reference)
}

/// Strips a single leading `./` or `/`.
fn strip_leading(reference: &str) -> &str {
    if let Some(stripped) = reference.strip_prefix("./") {
        stripped
    } else if let Some(stripped) = reference.strip_prefix('/') {
        stripped
    } else {
        reference
    }
}

impl ResourceResolver for ResourceIndex {
    fn resolve<'a>(&self, reference: &'a str) -> Resolved<'a> {
        resolve(self, reference)
    }
}
