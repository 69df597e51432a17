use log::debug;

use crate::package::classifier::{self, AssetKind};
use crate::package::index::ResourceIndex;
use crate::package::registry::ResourceRegistry;
use crate::package::{IngestError, ModelPackage, SourceItem};

/// Decides what kind of package a set of candidate files represents and
/// builds it.
///
/// Precedence: a forced single-binary selection first, then descriptor-wins,
/// then the binary fallback. A drop containing both a .glb and a .gltf
/// therefore loads the descriptor unless the caller forced single-binary
/// mode. That is deliberate policy, not an accident of ordering.
pub fn classify_inputs(
    registry: &ResourceRegistry,
    mut items: Vec<SourceItem>,
    force_single: bool,
) -> Result<ModelPackage, IngestError> {
    if force_single {
        if let Some(position) = position_of(&items, AssetKind::BinaryPackage) {
            return Ok(single_package(registry, items.swap_remove(position)));
        }
        // A forced selection without a .glb falls through to the regular
        // classification instead of failing outright.
        debug!("Forced single-binary gesture carried no .glb, reclassifying");
    }

    if position_of(&items, AssetKind::Descriptor).is_some() {
        return Ok(composite_package(registry, items));
    }

    if let Some(position) = position_of(&items, AssetKind::BinaryPackage) {
        return Ok(single_package(registry, items.swap_remove(position)));
    }

    Err(IngestError::NoRecognizedPackage)
}

fn position_of(items: &[SourceItem], kind: AssetKind) -> Option<usize> {
    items.iter().position(|item| classifier::classify(&item.name).kind == kind)
}

/// Only the selected item gets a handle; the rest of the input is dropped.
fn single_package(registry: &ResourceRegistry, item: SourceItem) -> ModelPackage {
    let SourceItem { name, bytes, .. } = item;
    let content_type = classifier::classify(&name).content_type;
    let handle = registry.register(&name, content_type, bytes);
    debug!("Built single-binary package around {}", name);
    ModelPackage::Single { handle, name }
}

fn composite_package(registry: &ResourceRegistry, items: Vec<SourceItem>) -> ModelPackage {
    let root_position =
        position_of(&items, AssetKind::Descriptor).expect("caller verified a descriptor is present");
    let root_name = items[root_position].name.clone();
    let root_relative = items[root_position].relative_path.clone();

    let (index, handles) = ResourceIndex::build(registry, items);

    // The descriptor must resolve to itself. Its keys can have been claimed
    // by an earlier item with the same spelling, so the handle created for
    // the descriptor itself is the fallback of last resort.
    let root_handle = index
        .get(&root_name)
        .or_else(|| index.get(&root_name.to_lowercase()))
        .or_else(|| root_relative.as_deref().and_then(|path| index.get(path)))
        .or_else(|| root_relative.as_deref().and_then(|path| index.get(&path.to_lowercase())))
        .unwrap_or(handles[root_position]);

    debug!(
        "Built composite package rooted at {} ({} files, {} keys)",
        root_name,
        handles.len(),
        index.len()
    );
    ModelPackage::Composite {
        root_handle,
        root_name,
        index,
        handles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_drop() -> Vec<SourceItem> {
        vec![
            SourceItem::flat("model.glb", b"glb".to_vec()),
            SourceItem::flat("model.gltf", b"gltf".to_vec()),
            SourceItem::flat("model.bin", b"bin".to_vec()),
        ]
    }

    #[test]
    fn descriptor_wins_over_the_binary_in_a_mixed_drop() {
        let registry = ResourceRegistry::new();
        let package = classify_inputs(&registry, mixed_drop(), false).unwrap();

        let ModelPackage::Composite {
            root_name,
            root_handle,
            index,
            ..
        } = package
        else {
            panic!("expected a composite package");
        };
        assert_eq!(root_name, "model.gltf");
        assert_eq!(index.get("model.gltf"), Some(root_handle));
    }

    #[test]
    fn forcing_single_mode_selects_the_binary_instead() {
        let registry = ResourceRegistry::new();
        let package = classify_inputs(&registry, mixed_drop(), true).unwrap();

        let ModelPackage::Single { name, .. } = package else {
            panic!("expected a single-binary package");
        };
        assert_eq!(name, "model.glb");
        // Only the selected binary was registered.
        assert_eq!(registry.live_handles(), 1);
    }

    #[test]
    fn a_lone_binary_package_is_accepted() {
        let registry = ResourceRegistry::new();
        let items = vec![SourceItem::flat("scene.glb", b"glb".to_vec())];
        let package = classify_inputs(&registry, items, false).unwrap();
        assert!(matches!(package, ModelPackage::Single { .. }));
    }

    #[test]
    fn a_forced_gesture_without_a_binary_reclassifies() {
        let registry = ResourceRegistry::new();
        let items = vec![
            SourceItem::flat("model.gltf", b"gltf".to_vec()),
            SourceItem::flat("model.bin", b"bin".to_vec()),
        ];
        let package = classify_inputs(&registry, items, true).unwrap();
        assert!(matches!(package, ModelPackage::Composite { .. }));
    }

    #[test]
    fn side_files_alone_are_not_a_package() {
        let registry = ResourceRegistry::new();
        let items = vec![SourceItem::flat("texture.png", b"png".to_vec())];
        let result = classify_inputs(&registry, items, false);

        assert!(matches!(result, Err(IngestError::NoRecognizedPackage)));
        // No partial package: nothing was registered.
        assert_eq!(registry.live_handles(), 0);
    }

    #[test]
    fn empty_input_is_not_a_package() {
        let registry = ResourceRegistry::new();
        assert!(matches!(
            classify_inputs(&registry, Vec::new(), false),
            Err(IngestError::NoRecognizedPackage)
        ));
    }

    #[test]
    fn the_descriptor_resolves_to_itself() {
        let registry = ResourceRegistry::new();
        let items = vec![
            SourceItem::nested("Pack/Scene.gltf", b"gltf".to_vec()),
            SourceItem::nested("Pack/scene.bin", b"bin".to_vec()),
        ];
        let package = classify_inputs(&registry, items, false).unwrap();

        let ModelPackage::Composite {
            root_handle, index, ..
        } = package
        else {
            panic!("expected a composite package");
        };
        assert_eq!(index.get("Scene.gltf"), Some(root_handle));
        assert_eq!(index.get("Pack/Scene.gltf"), Some(root_handle));
    }

    #[test]
    fn the_first_descriptor_becomes_the_root() {
        let registry = ResourceRegistry::new();
        let items = vec![
            SourceItem::nested("a/first.gltf", b"one".to_vec()),
            SourceItem::nested("b/second.gltf", b"two".to_vec()),
        ];
        let package = classify_inputs(&registry, items, false).unwrap();
        assert_eq!(package.root_name(), "first.gltf");
    }
}
