use std::sync::Arc;

use crate::package::registry::{Resource, ResourceHandle};
use crate::package::resolver::Resolved;

/// Lookup capability injected into the descriptor parser's dependency set.
/// The parser calls it directly and synchronously, once per side-file
/// reference it encounters while decoding the root descriptor.
pub trait ResourceResolver {
    fn resolve<'a>(&self, reference: &'a str) -> Resolved<'a>;
}

/// Byte access for collaborators that only hold a handle.
pub trait RawResourceSource {
    /// Clones nothing but the Arc; the backing buffer stays in the registry.
    fn load_raw(&self, handle: ResourceHandle) -> Option<Arc<Resource>>;
}
