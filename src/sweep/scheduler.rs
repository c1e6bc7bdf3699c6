// src/sweep/scheduler.rs
// =============================================================================
// HealthChecker runs a sweep immediately and then once per interval, in a
// background task, until it is stopped.
//
// It is a two-state machine guarded by a mutex:
//
//   idle --start()--> running --stop()--> idle
//
// start() while running and stop() while idle do nothing.
//
// Stopping is cooperative. A sweep that is already underway finishes (every
// probe has its own timeout), the loop sees the stop signal and exits
// without starting another sweep.
//
// Rust concepts:
// - tokio::sync::watch: a one-value channel used as a stop flag
// - tokio::select!: wait for whichever happens first, the next tick or stop
// - JoinHandle: lets shutdown() wait for the last sweep to finish
// =============================================================================

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::runner::run_sweep;
use crate::checker::Prober;
use crate::store::LinkStore;

/// How often and how hard to sweep
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Time between the starts of two sweeps
    pub interval: Duration,
    /// Maximum probes in flight at once
    pub concurrency: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(48 * 60 * 60),
            concurrency: 10,
        }
    }
}

/// The background task while the checker is running
struct Running {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct HealthChecker {
    store: Arc<LinkStore>,
    prober: Arc<dyn Prober>,
    config: CheckerConfig,
    // None = idle
    state: Mutex<Option<Running>>,
    // handle of a loop that was told to stop but may still be finishing
    draining: Mutex<Option<JoinHandle<()>>>,
}

impl HealthChecker {
    pub fn new(store: Arc<LinkStore>, prober: Arc<dyn Prober>, config: CheckerConfig) -> Self {
        Self {
            store,
            prober,
            config,
            state: Mutex::new(None),
            draining: Mutex::new(None),
        }
    }

    /// Starts the sweep loop unless it is already running
    ///
    /// Must be called from inside a tokio runtime.
    pub fn start(&self) {
        let mut state = lock(&self.state);
        if state.is_some() {
            debug!("health checker already running");
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let previous = lock(&self.draining).take();
        let handle = tokio::spawn(sweep_loop(
            Arc::clone(&self.store),
            Arc::clone(&self.prober),
            self.config.clone(),
            stop_rx,
            previous,
        ));

        *state = Some(Running { stop_tx, handle });
        info!(
            interval_secs = self.config.interval.as_secs(),
            concurrency = self.config.concurrency,
            "health checker started"
        );
    }

    /// Asks the sweep loop to stop; does nothing if it isn't running
    ///
    /// Returns right away. Probes already dispatched are left to finish.
    pub fn stop(&self) {
        let Some(running) = lock(&self.state).take() else {
            return;
        };

        // the receiver is gone only if the task already ended
        let _ = running.stop_tx.send(true);
        *lock(&self.draining) = Some(running.handle);
        info!("health checker stopped");
    }

    /// Stops the loop and waits for an in-flight sweep to finish
    pub async fn shutdown(&self) {
        self.stop();
        let handle = lock(&self.draining).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "health checker task ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).is_some()
    }
}

// A poisoned lock only means another thread panicked while holding it; the
// Option inside is still meaningful, so keep going.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn sweep_loop(
    store: Arc<LinkStore>,
    prober: Arc<dyn Prober>,
    config: CheckerConfig,
    mut stop_rx: watch::Receiver<bool>,
    previous: Option<JoinHandle<()>>,
) {
    // A quick stop()/start() could leave the old loop mid-sweep. Let it
    // finish first so two sweeps never overlap.
    if let Some(previous) = previous {
        let _ = previous.await;
    }

    // interval() measures from start to start, so a slow sweep eats into
    // the wait before the next one
    let mut ticker = tokio::time::interval(config.interval);
    // after a long sweep, wait a full interval instead of firing a burst
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // Wait for whichever comes first: the next tick or a stop request.
        // `biased` checks the branches top to bottom, so a pending stop
        // wins over a tick that is also ready.
        tokio::select! {
            biased;
            // changed() also errors if the sender was dropped; either way
            // nobody wants more sweeps
            _ = stop_rx.changed() => break,
            // the first tick completes immediately
            _ = ticker.tick() => {
                run_sweep(&store, &prober, config.concurrency).await;
            }
        }

        // stop() may have been called while the sweep ran. Copy the flag
        // out so the borrow guard is released straight away.
        let stopped = *stop_rx.borrow();
        if stopped {
            break;
        }
    }

    debug!("health sweep loop exited");
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a std Mutex around the state when everything else is tokio?
//    - start() and stop() never await while holding it, so the plain lock
//      is enough and both can be called from sync code
//
// 2. Why watch instead of oneshot for the stop signal?
//    - The loop checks the flag in two places (select! and after a sweep);
//      watch keeps the latest value around to read as often as needed
//
// 3. What does MissedTickBehavior::Delay change?
//    - The default (Burst) fires all missed ticks back to back after a
//      slow sweep; Delay waits a full interval from the late tick instead
// -----------------------------------------------------------------------------
