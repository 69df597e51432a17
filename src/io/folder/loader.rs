use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use itertools::Itertools;
use log::trace;

use crate::package::{IngestError, SourceItem};

/// Flattens a directory tree into the same item shape a container expansion
/// produces: every file carries a slash-separated path relative to (and
/// including) the dropped folder itself.
///
/// Plain worklist algorithm: pop a directory, expand it into children, queue
/// the subdirectories. The item set is only returned once the worklist is
/// empty, so a subtree is always completely enumerated before classification
/// sees it, independent of any concurrency primitive. Siblings are sorted by
/// name so ingestion order (and with it the duplicate-key tie break) does
/// not depend on readdir order.
pub fn collect_folder(root: &Path) -> Result<Vec<SourceItem>, IngestError> {
    let root_prefix = match root.file_name() {
        Some(name) => format!("{}/", name.to_string_lossy()),
        None => String::new(),
    };

    let mut worklist = VecDeque::from([(root.to_path_buf(), root_prefix)]);
    let mut items = Vec::new();

    while let Some((directory, prefix)) = worklist.pop_front() {
        let children = fs::read_dir(&directory)?
            .filter_map(|entry| entry.ok())
            .sorted_by_key(|entry| entry.file_name())
            .collect_vec();

        for child in children {
            let name = child.file_name().to_string_lossy().into_owned();
            let path = child.path();
            if path.is_dir() {
                worklist.push_back((path, format!("{prefix}{name}/")));
            } else {
                let bytes = fs::read(&path)?;
                trace!("Collected {}{} ({} bytes)", prefix, name, bytes.len());
                items.push(SourceItem::nested(format!("{prefix}{name}"), bytes));
            }
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fixture_tree() -> Result<(tempfile::TempDir, std::path::PathBuf), anyhow::Error> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().join("MyModel");
        fs::create_dir_all(root.join("textures"))?;
        fs::write(root.join("scene.gltf"), b"gltf")?;
        fs::write(root.join("scene.bin"), b"bin")?;
        fs::write(root.join("textures").join("diffuse.png"), b"png")?;
        Ok((tmp, root))
    }

    #[test]
    fn flattens_the_tree_with_the_folder_name_prefix() -> Result<(), anyhow::Error> {
        let (_tmp, root) = fixture_tree()?;
        let items = collect_folder(&root)?;

        let paths: Vec<&str> = items.iter().map(|item| item.effective_path()).collect();
        assert_eq!(
            paths,
            vec!["MyModel/scene.bin", "MyModel/scene.gltf", "MyModel/textures/diffuse.png"]
        );
        assert_eq!(items[1].name, "scene.gltf");
        assert_eq!(items[1].bytes, b"gltf");
        Ok(())
    }

    #[test]
    fn subtrees_are_fully_enumerated_before_returning() -> Result<(), anyhow::Error> {
        let (_tmp, root) = fixture_tree()?;
        fs::create_dir_all(root.join("textures/detail"))?;
        fs::write(root.join("textures/detail/normal.png"), b"png")?;

        let items = collect_folder(&root)?;
        assert!(items
            .iter()
            .any(|item| item.effective_path() == "MyModel/textures/detail/normal.png"));
        assert_eq!(items.len(), 4);
        Ok(())
    }

    #[test]
    fn missing_directories_surface_as_io_errors() {
        let result = collect_folder(Path::new("/nonexistent/for/sure"));
        assert!(matches!(result, Err(IngestError::IOError(_))));
    }
}
