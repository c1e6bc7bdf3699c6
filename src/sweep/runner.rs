// src/sweep/runner.rs
// =============================================================================
// One sweep: probe every link in the store and record the results.
//
// How it works:
// 1. Take a snapshot of the links with store.list()
// 2. Turn each link into a future that probes it and writes the result back
// 3. Run those futures with buffer_unordered(concurrency), so no more than
//    `concurrency` probes are ever in flight; the rest wait for a free slot
// 4. Return once every probe has finished and been written back
//
// A failed write-back (disk trouble, link deleted mid-sweep) is logged and
// counted; it never stops the other links from being checked.
// =============================================================================

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::checker::Prober;
use crate::models::Link;
use crate::store::{LinkStore, StoreError};

/// What happened during one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Links probed
    pub checked: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    /// Results that could not be written back
    pub write_failures: usize,
}

enum Outcome {
    Recorded { healthy: bool },
    WriteFailed,
}

/// Probes every stored link once, at most `concurrency` at a time
pub async fn run_sweep(
    store: &Arc<LinkStore>,
    prober: &Arc<dyn Prober>,
    concurrency: usize,
) -> SweepSummary {
    // Work from a snapshot: links added during the sweep wait for the next
    // one, and the store lock is not held while probes run
    let links = store.list().await;
    let started = Instant::now();
    info!(links = links.len(), concurrency, "health sweep started");

    // Step 1: one future per link
    // Nothing runs yet; futures are lazy until the stream polls them.
    // `async move` takes ownership of the link, while store and prober are
    // only borrowed, which is fine because we await everything below.
    let checks = links
        .into_iter()
        .map(|link| async move { check_link(store, prober.as_ref(), link).await });

    // Step 2: run them, at most `concurrency` at a time
    // Results arrive in completion order, not link order.
    // buffer_unordered(0) would never make progress
    let outcomes: Vec<Outcome> = stream::iter(checks)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    // Step 3: tally what happened
    let mut summary = SweepSummary::default();
    for outcome in outcomes {
        summary.checked += 1;
        match outcome {
            Outcome::Recorded { healthy: true } => summary.healthy += 1,
            Outcome::Recorded { healthy: false } => summary.unhealthy += 1,
            Outcome::WriteFailed => summary.write_failures += 1,
        }
    }

    info!(
        checked = summary.checked,
        healthy = summary.healthy,
        unhealthy = summary.unhealthy,
        write_failures = summary.write_failures,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "health sweep finished"
    );
    summary
}

async fn check_link(store: &LinkStore, prober: &dyn Prober, link: Link) -> Outcome {
    // A probe never fails: a dead link is a normal result, recorded as data
    let health = prober.probe(&link.url).await;
    let healthy = health.is_healthy();

    debug!(
        id = %link.id,
        url = %link.url,
        status = health.status.as_str(),
        status_code = ?health.status_code,
        error = ?health.error,
        "link probed"
    );

    // Write back only the health fields, so an edit made while the probe
    // was running is kept
    match store.record_health(&link.id, health, Utc::now()).await {
        Ok(_) => Outcome::Recorded { healthy },
        Err(StoreError::NotFound(_)) => {
            // deleted while we were probing it; nothing to record
            debug!(id = %link.id, "link removed during sweep");
            Outcome::WriteFailed
        }
        Err(e) => {
            warn!(id = %link.id, url = %link.url, error = %e, "failed to update link health status");
            Outcome::WriteFailed
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why buffer_unordered instead of spawning a task per link?
//    - It caps how many probes are in flight without a semaphore
//    - The futures borrow the store and prober instead of needing 'static
//      clones, because the stream is awaited right here
//
// 2. Why is a deleted link counted as a write failure?
//    - Its result had nowhere to go; the summary counts results that were
//      not recorded, whatever the reason
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Health, HealthStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Healthy for every URL, but records how many probes overlap
    #[derive(Default)]
    struct CountingProber {
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Prober for CountingProber {
        async fn probe(&self, _url: &str) -> Health {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Health::healthy(200)
        }
    }

    /// Answers from the URL itself: anything containing "bad" is a 404
    struct UrlProber;

    #[async_trait]
    impl Prober for UrlProber {
        async fn probe(&self, url: &str) -> Health {
            if url.contains("bad") {
                Health::bad_status(404)
            } else {
                Health::healthy(200)
            }
        }
    }

    async fn store_with(urls: &[&str]) -> (TempDir, Arc<LinkStore>) {
        let dir = TempDir::new().unwrap();
        let store = LinkStore::load(dir.path()).await.unwrap();
        for url in urls {
            store.add(Link::new(*url)).await.unwrap();
        }
        (dir, Arc::new(store))
    }

    #[tokio::test]
    async fn test_sweep_never_exceeds_concurrency() {
        let urls: Vec<String> = (0..40).map(|i| format!("https://{}.example", i)).collect();
        let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let (_dir, store) = store_with(&url_refs).await;

        let counting = Arc::new(CountingProber::default());
        let prober: Arc<dyn Prober> = counting.clone();

        let summary = run_sweep(&store, &prober, 5).await;

        assert_eq!(summary.checked, 40);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 40);
        let peak = counting.peak.load(Ordering::SeqCst);
        assert!(peak <= 5, "peak concurrency was {}", peak);
        assert!(peak > 1, "probes never overlapped");
    }

    #[tokio::test]
    async fn test_sweep_records_results() {
        let (_dir, store) = store_with(&["https://good.example", "https://bad.example"]).await;
        let prober: Arc<dyn Prober> = Arc::new(UrlProber);

        let summary = run_sweep(&store, &prober, 10).await;

        assert_eq!(
            summary,
            SweepSummary {
                checked: 2,
                healthy: 1,
                unhealthy: 1,
                write_failures: 0,
            }
        );

        for link in store.list().await {
            assert!(link.last_checked.is_some());
            if link.url.contains("bad") {
                assert_eq!(link.health, Health::bad_status(404));
            } else {
                assert_eq!(link.health.status, HealthStatus::Healthy);
            }
        }
    }

    #[tokio::test]
    async fn test_sweep_empty_store() {
        let (_dir, store) = store_with(&[]).await;
        let prober: Arc<dyn Prober> = Arc::new(UrlProber);

        let summary = run_sweep(&store, &prober, 10).await;
        assert_eq!(summary, SweepSummary::default());
    }

    /// Deletes the link it is probing before answering
    struct DeletingProber {
        store: Arc<LinkStore>,
    }

    #[async_trait]
    impl Prober for DeletingProber {
        async fn probe(&self, url: &str) -> Health {
            let link = self
                .store
                .list()
                .await
                .into_iter()
                .find(|l| l.url == url)
                .unwrap();
            self.store.delete(&link.id).await.unwrap();
            Health::healthy(200)
        }
    }

    #[tokio::test]
    async fn test_deleted_link_is_not_resurrected() {
        let (_dir, store) = store_with(&["https://a.example", "https://b.example"]).await;
        let prober: Arc<dyn Prober> = Arc::new(DeletingProber {
            store: store.clone(),
        });

        let summary = run_sweep(&store, &prober, 2).await;

        assert_eq!(summary.checked, 2);
        assert_eq!(summary.write_failures, 2);
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_keeps_edits_made_mid_sweep() {
        let (_dir, store) = store_with(&["https://a.example"]).await;

        /// Renames the link while its probe is in flight
        struct EditingProber {
            store: Arc<LinkStore>,
        }

        #[async_trait]
        impl Prober for EditingProber {
            async fn probe(&self, _url: &str) -> Health {
                let mut link = self.store.list().await.remove(0);
                let id = link.id.clone();
                link.name = "renamed".to_string();
                self.store.update(&id, link).await.unwrap();
                Health::healthy(200)
            }
        }

        let prober: Arc<dyn Prober> = Arc::new(EditingProber {
            store: store.clone(),
        });
        run_sweep(&store, &prober, 1).await;

        let link = store.list().await.remove(0);
        assert_eq!(link.name, "renamed");
        assert_eq!(link.health, Health::healthy(200));
    }
}
