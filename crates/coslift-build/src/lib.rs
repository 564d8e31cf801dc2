//! Source archive building for coslift.
//!
//! # Archive pipeline
//!
//! ```text
//! build_archive(source_dir, rules, output?)
//!   1. Resolve   ── canonicalize source_dir (fails before writing anything)
//!   2. Walk      ── walkdir, sorted by file name, symlinks not followed
//!   3. Exclude   ── ExcludeRules: plain names per segment, globs per base name / path
//!   4. Zip       ── deflate entries named by `/`-separated relative path
//! ```
//!
//! # Default exclusions
//!
//! [`DEFAULT_EXCLUDES`] covers version-control metadata, dependency and tool
//! caches, build output, editor/OS temp files, and compiled bytecode.
//! Callers replace the list entirely by passing their own [`ExcludeRules`].

pub mod archive;
pub mod exclude;

pub use archive::{ArchiveError, ArchiveSummary, build_archive, default_output_path};
pub use exclude::{DEFAULT_EXCLUDES, ExcludeError, ExcludeRules};
