// src/store/mod.rs
// =============================================================================
// The link store: the one place bookmarks live.
//
// Submodules:
// - file: LinkStore, an in-memory set of links behind a read/write lock,
//   mirrored to links.json on every change
// - error: StoreError and the StoreResult alias
//
// Everything else (the API handlers, the health checker, the check command)
// holds an Arc<LinkStore> and goes through its methods. Nobody keeps their
// own copy of the links beyond the snapshot list() hands out.
// =============================================================================

mod error;
mod file;

pub use error::StoreError;
pub use file::LinkStore;
