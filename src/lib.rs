//! # treeshift
//!
//! Moves code between trees: reads changes from an origin, rewrites files
//! and commit metadata through a pipeline of reversible transformations,
//! and writes the result to a destination.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::path::Path;
//!
//! use treeshift::authoring::Authoring;
//! use treeshift::data::Change;
//! use treeshift::fs::{FileSystem, MemoryFileSystem};
//! use treeshift::transform::{MoveFiles, SquashNotes};
//! use treeshift::workflow::Workflow;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/work/lib/a.rs"), b"fn a() {}", 0o644)?;
//!
//! let workflow = Workflow::builder("export", Authoring::overwrite("Bot <bot@example.com>")?)
//!     .transformation(MoveFiles::new("lib", "src", None, false)?)
//!     .transformation(SquashNotes::default())
//!     .build()?;
//! let result = workflow.run_pass(
//!     &fs,
//!     Path::new("/work"),
//!     vec![Change::new("abc123", "Jane <jane@example.com>", "Add a")],
//!     false,
//! )?;
//! assert_eq!(result.files, ["src/a.rs"]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod authoring;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod folder;
pub mod fs;
pub mod glob;
pub mod transform;
pub mod vcs;
pub mod workflow;

pub use crate::cli::Cli;

/// The current version of treeshift.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
