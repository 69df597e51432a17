use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use itertools::Itertools;
use log::trace;

use crate::package::registry::ResourceRegistry;
use crate::package::{IngestError, ModelPackage};

/// Proof that an ingestion gesture was started. Only the newest ticket may
/// activate its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestTicket(u64);

/// Owns the single active package.
///
/// Swapping is the only mutation path: a gesture builds its package
/// completely, then `activate` atomically swaps it in and tears the previous
/// one down. Two packages never both hold live handles past that transition,
/// and resolver reads (through [`Self::active`]) never take a lock.
///
/// Overlapping gestures are serialized by ticket: each gesture takes one
/// before doing any expansion or traversal, and a ticket that is no longer
/// the newest cannot activate: the stale gesture's package is revoked on
/// the spot instead of clobbering the newer one.
pub struct PackageController {
    registry: Arc<ResourceRegistry>,
    active: ArcSwapOption<ModelPackage>,
    gesture: AtomicU64,
    /// Sequences activation and teardown against each other.
    swap_lock: Mutex<()>,
}

impl PackageController {
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self {
            registry,
            active: ArcSwapOption::from(None),
            gesture: AtomicU64::new(0),
            swap_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// Call once per user gesture, before any suspending work starts.
    pub fn begin_gesture(&self) -> IngestTicket {
        IngestTicket(self.gesture.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn active(&self) -> Option<Arc<ModelPackage>> {
        self.active.load_full()
    }

    /// Installs a fully built package and tears down its predecessor.
    pub fn activate(&self, ticket: IngestTicket, package: ModelPackage) -> Result<Arc<ModelPackage>, IngestError> {
        let _guard = self.swap_lock.lock().expect("swap lock poisoned");

        if ticket.0 != self.gesture.load(Ordering::SeqCst) {
            // Lost the race against a newer gesture; nothing of this package
            // may survive, or its handles would leak unreachable.
            self.revoke_all(&package);
            return Err(IngestError::Superseded);
        }

        let package = Arc::new(package);
        let previous = self.active.swap(Some(package.clone()));
        if let Some(previous) = previous {
            self.revoke_all(&previous);
        }
        Ok(package)
    }

    /// Clears the active package without a replacement gesture.
    pub fn reset(&self) {
        let _guard = self.swap_lock.lock().expect("swap lock poisoned");
        if let Some(previous) = self.active.swap(None) {
            self.revoke_all(&previous);
        }
    }

    fn revoke_all(&self, package: &ModelPackage) {
        // Many index keys share a handle; dedup so each one is revoked
        // exactly once.
        let mut revoked = 0usize;
        for handle in package.handles().iter().unique() {
            if self.registry.revoke(*handle) {
                revoked += 1;
            }
        }
        trace!("Revoked {} handle(s) of package {}", revoked, package.root_name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::ingest::classify_inputs;
    use crate::package::SourceItem;

    fn folder_items(prefix: &str) -> Vec<SourceItem> {
        vec![
            SourceItem::nested(format!("{prefix}/scene.gltf"), b"gltf".to_vec()),
            SourceItem::nested(format!("{prefix}/scene.bin"), b"bin".to_vec()),
            SourceItem::nested(format!("{prefix}/tex/diffuse.png"), b"png".to_vec()),
        ]
    }

    fn controller() -> PackageController {
        PackageController::new(Arc::new(ResourceRegistry::new()))
    }

    #[test]
    fn activation_replaces_the_previous_package_and_revokes_it_once() {
        let controller = controller();
        let registry = controller.registry().clone();

        let first_ticket = controller.begin_gesture();
        let first = classify_inputs(&registry, folder_items("one"), false).unwrap();
        let first = controller.activate(first_ticket, first).unwrap();
        let first_handles = first.handles().to_vec();
        assert_eq!(registry.live_handles(), 3);

        let second_ticket = controller.begin_gesture();
        let second = classify_inputs(&registry, folder_items("two"), false).unwrap();
        controller.activate(second_ticket, second).unwrap();

        // Every old handle is gone, and a second revoke would be a no-op,
        // so they were torn down exactly once.
        for handle in first_handles {
            assert!(registry.get(handle).is_none());
            assert!(!registry.revoke(handle));
        }
        assert_eq!(registry.live_handles(), 3);
        assert_eq!(controller.active().unwrap().root_name(), "scene.gltf");
    }

    #[test]
    fn a_stale_ticket_cannot_clobber_a_newer_package() {
        let controller = controller();
        let registry = controller.registry().clone();

        // Two gestures start; the second finishes first.
        let slow_ticket = controller.begin_gesture();
        let fast_ticket = controller.begin_gesture();

        let fast = classify_inputs(&registry, folder_items("fast"), false).unwrap();
        let fast = controller.activate(fast_ticket, fast).unwrap();

        let slow = classify_inputs(&registry, folder_items("slow"), false).unwrap();
        let result = controller.activate(slow_ticket, slow);

        assert!(matches!(result, Err(IngestError::Superseded)));
        // The fast package stayed active and the stale one did not leak.
        assert!(Arc::ptr_eq(&controller.active().unwrap(), &fast));
        assert_eq!(registry.live_handles(), fast.handles().len());
    }

    #[test]
    fn reset_leaves_no_live_handles() {
        let controller = controller();
        let registry = controller.registry().clone();

        let ticket = controller.begin_gesture();
        let package = classify_inputs(&registry, folder_items("pack"), false).unwrap();
        controller.activate(ticket, package).unwrap();
        assert_eq!(registry.live_handles(), 3);

        controller.reset();
        assert!(controller.active().is_none());
        assert_eq!(registry.live_handles(), 0);

        // Resetting an empty controller is a no-op.
        controller.reset();
        assert_eq!(registry.live_handles(), 0);
    }

    #[test]
    fn duplicate_items_do_not_leak_on_teardown() {
        let controller = controller();
        let registry = controller.registry().clone();

        let ticket = controller.begin_gesture();
        let items = vec![
            SourceItem::nested("m/scene.gltf", b"one".to_vec()),
            SourceItem::nested("m/scene.gltf", b"two".to_vec()),
        ];
        let package = classify_inputs(&registry, items, false).unwrap();
        controller.activate(ticket, package).unwrap();
        assert_eq!(registry.live_handles(), 2);

        controller.reset();
        assert_eq!(registry.live_handles(), 0);
    }

    #[test]
    fn concurrent_gestures_leave_exactly_one_package() {
        let controller = Arc::new(controller());
        let registry = controller.registry().clone();

        let threads: Vec<_> = (0..4)
            .map(|generation| {
                let controller = controller.clone();
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let ticket = controller.begin_gesture();
                    let items = folder_items(&format!("gen{generation}"));
                    let package = classify_inputs(&registry, items, false).unwrap();
                    // Either we won the slot or our handles were revoked.
                    let _ = controller.activate(ticket, package);
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let active = controller.active().expect("one gesture must have won");
        assert_eq!(registry.live_handles(), active.handles().len());
    }
}
