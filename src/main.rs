use std::fs;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use glance::io::folder::loader::collect_folder;
use glance::io::zip::loader::expand_container_file;
use glance::package::controller::PackageController;
use glance::package::ingest::classify_inputs;
use glance::package::registry::ResourceRegistry;
use glance::package::resolver::{resolve, Resolved};
use glance::package::{IngestError, ModelPackage, SourceItem};
use glance::settings::{CliArgs, InputGesture};

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    let registry = Arc::new(ResourceRegistry::new());
    let controller = PackageController::new(registry.clone());

    // One CLI invocation is one gesture, but the ticket discipline is the
    // same one an interactive frontend with overlapping drops relies on.
    let ticket = controller.begin_gesture();
    let (items, force_single) = match &args.input {
        InputGesture::Single { file } => {
            let name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .context("input path has no file name")?;
            let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
            (vec![SourceItem::flat(name, bytes)], true)
        }
        InputGesture::Folder { dir } => (collect_folder(dir)?, false),
        InputGesture::Archive { file } => (expand_container_file(file)?, false),
    };

    let package = match classify_inputs(&registry, items, force_single) {
        Ok(package) => controller.activate(ticket, package)?,
        Err(IngestError::NoRecognizedPackage) => {
            // Recoverable: the viewer stays in its pre-ingestion state.
            warn!("No .gltf or .glb found in the input, nothing to display");
            return Ok(());
        }
        Err(error) => return Err(error.into()),
    };

    report(&registry, &package);
    for probe in &args.probes {
        probe_reference(&registry, &package, probe);
    }

    // From here the package (and for composites, its resolver) is what the
    // external descriptor parser and the render loop consume.
    Ok(())
}

fn report(registry: &ResourceRegistry, package: &ModelPackage) {
    match package {
        ModelPackage::Single { name, handle } => {
            let size = registry.get(*handle).map(|resource| resource.size()).unwrap_or(0);
            info!("Activated single-binary package {} ({} bytes)", name, size);
        }
        ModelPackage::Composite {
            root_name,
            index,
            handles,
            ..
        } => {
            info!(
                "Activated composite package rooted at {} ({} files, {} index keys)",
                root_name,
                handles.len(),
                index.len()
            );
        }
    }
}

fn probe_reference(registry: &ResourceRegistry, package: &ModelPackage, reference: &str) {
    let Some(index) = package.index() else {
        warn!("{}: single-binary package, there is no index to resolve against", reference);
        return;
    };
    match resolve(index, reference) {
        Resolved::Resource(handle) => match registry.get(handle) {
            Some(resource) => info!(
                "{} -> {} ({}, {} bytes)",
                reference,
                resource.name,
                resource.content_type,
                resource.size()
            ),
            None => warn!("{}: resolved to an already revoked handle", reference),
        },
        Resolved::Passthrough(reference) => {
            warn!("{}: unresolved, the parser would fetch it as written", reference)
        }
    }
}
