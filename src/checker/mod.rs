// src/checker/mod.rs
// =============================================================================
// This module checks whether a single link is still reachable.
//
// Submodules:
// - http: the Prober trait and HttpProber, which sends one HEAD request per
//   link and turns the outcome into a Health value
//
// The sweep (src/sweep/) decides *which* links to probe and *when*; this
// module only answers "is this URL alive right now?".
// =============================================================================

mod http;

pub use http::{HttpProber, Prober, ProberConfig};
