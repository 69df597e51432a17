//! Maps file names to asset kinds and content-type labels.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// The structured file declaring the scene graph (`.gltf`).
    Descriptor,
    /// A single self-contained binary asset (`.glb`).
    BinaryPackage,
    /// A geometry/animation buffer referenced by a descriptor (`.bin`).
    Buffer,
    Texture,
    /// A compressed container bundling a package (`.zip`).
    Archive,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
pub struct Classified {
    pub kind: AssetKind,
    pub content_type: &'static str,
}

/// Pure lookup on the lowercased extension. Never fails: unknown extensions
/// degrade to a generic content type.
pub fn classify(name: &str) -> Classified {
    let extension = match name.rfind('.') {
        Some(position) => name[position + 1..].to_ascii_lowercase(),
        None => String::new(),
    };

    let (kind, content_type) = match extension.as_str() {
        "gltf" => (AssetKind::Descriptor, "model/gltf+json"),
        "glb" => (AssetKind::BinaryPackage, "model/gltf-binary"),
        "bin" => (AssetKind::Buffer, "application/octet-stream"),
        "png" => (AssetKind::Texture, "image/png"),
        "jpg" | "jpeg" => (AssetKind::Texture, "image/jpeg"),
        "webp" => (AssetKind::Texture, "image/webp"),
        "ktx2" => (AssetKind::Texture, "image/ktx2"),
        "zip" => (AssetKind::Archive, "application/zip"),
        _ => (AssetKind::Unknown, "application/octet-stream"),
    };

    Classified { kind, content_type }
}
