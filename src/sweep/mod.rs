// src/sweep/mod.rs
// =============================================================================
// This module keeps the health of every stored link up to date.
//
// Features:
// - One sweep probes every link, at most `concurrency` at a time
// - Each result is written back to the store as soon as it arrives
// - A background timer runs a sweep right away and then once per interval
// - start()/stop() are idempotent and safe to call from the shutdown path
//
// Submodules:
// - runner: run_sweep(), one full pass over the links
// - scheduler: HealthChecker, the idle/running state machine around the timer
// =============================================================================

mod runner;
mod scheduler;

pub use runner::{run_sweep, SweepSummary};
pub use scheduler::{CheckerConfig, HealthChecker};
