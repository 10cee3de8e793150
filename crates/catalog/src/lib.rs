//! Media library catalog
//!
//! Walks the configured media roots, filters by allowed file extensions and
//! produces the ordered list of servable files. Purely sequential; the
//! download subsystem consumes its output and handles all concurrency.

mod scan;

pub use scan::{list_files, resolve_in_roots, FileEntry, MediaRoot};
