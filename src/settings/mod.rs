use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "Glance")]
#[command(version)]
#[command(about = "An interactive glTF/GLB model package viewer")]
pub struct CliArgs {
    /// References to resolve against the activated package, spelled the way
    /// a descriptor would emit them. Results go to the log.
    #[arg(long = "probe", value_name = "REFERENCE")]
    pub probes: Vec<String>,

    #[command(subcommand)]
    pub input: InputGesture,
}

/// The three upload paths of the ingestion boundary.
#[derive(Subcommand, Debug)]
pub enum InputGesture {
    /// View a single file, explicitly selected as a self-contained binary package.
    Single {
        #[arg(env = "GLANCE_MODEL")]
        file: PathBuf,
    },
    /// View a model folder: a descriptor plus the side files it references.
    Folder {
        #[arg(env = "GLANCE_MODEL_DIR")]
        dir: PathBuf,
    },
    /// View a compressed container bundling a descriptor and its side files.
    Archive {
        #[arg(env = "GLANCE_ARCHIVE")]
        file: PathBuf,
    },
}
