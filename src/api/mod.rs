// src/api/mod.rs
// =============================================================================
// The JSON API in front of the link store.
//
// Routes:
//   GET    /api/health        liveness check
//   GET    /api/links         every link
//   POST   /api/links         add a link
//   GET    /api/links/{id}    one link
//   PUT    /api/links/{id}    replace a link
//   DELETE /api/links/{id}    remove a link (idempotent)
//   GET    /api/categories    the category tree
//
// Handlers talk to the shared Arc<LinkStore> directly; the store does its
// own locking.
// =============================================================================

mod handlers;

pub use handlers::{create_router, AppState};
