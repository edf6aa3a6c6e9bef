//! Sliding-window admission control
//!
//! **[IE-ADM-010]** Per-client request admission with a sliding window:
//! each request's own timestamp, not a fixed bucket boundary, determines
//! when it expires from the count. An optional global window additionally
//! caps total throughput across all clients.
//!
//! Admission is a single atomic check-and-record operation. A request is
//! never admitted and later retracted: when a global cap is configured,
//! both windows are checked before either records the timestamp.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Admission decision for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Admitted; `remaining` requests left in the client's window
    Allowed { remaining: u32 },
    /// Denied; `reset_at` is the moment enough history expires to admit
    /// one more request
    Denied { reset_at: DateTime<Utc> },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

type WindowEntry = Arc<Mutex<Vec<DateTime<Utc>>>>;

/// Sliding-window rate limiter with per-client synchronization
///
/// The outer map is locked only to find or insert a client entry; all
/// timestamp mutation happens under the entry's own lock, so unrelated
/// clients never serialize on each other. Entries outlive individual
/// requests and are destroyed only by [`RateLimiter::sweep_idle`].
pub struct RateLimiter {
    per_client_limit: u32,
    global_limit: Option<u32>,
    window: Duration,
    clients: RwLock<HashMap<String, WindowEntry>>,
    /// Shared window counting every admitted request across clients
    global: Mutex<Vec<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(per_client_limit: u32, window_seconds: u64, global_limit: Option<u32>) -> Self {
        Self {
            per_client_limit,
            global_limit,
            window: Duration::seconds(window_seconds as i64),
            clients: RwLock::new(HashMap::new()),
            global: Mutex::new(Vec::new()),
        }
    }

    /// Admit or deny a request from `client_id` at instant `now`
    ///
    /// Prunes the client's stale timestamps eagerly, then checks the
    /// client window and (when configured) the global window before
    /// recording the admission in both.
    pub async fn admit(&self, client_id: &str, now: DateTime<Utc>) -> Admission {
        let entry = self.entry_for(client_id).await;
        let mut stamps = entry.lock().await;
        prune(&mut stamps, now, self.window);

        if stamps.len() as u32 >= self.per_client_limit {
            let reset_at = stamps[0] + self.window;
            tracing::debug!(
                client_id,
                count = stamps.len(),
                limit = self.per_client_limit,
                reset_at = %reset_at,
                "Request denied by client window"
            );
            return Admission::Denied { reset_at };
        }

        // Client has capacity; consult the shared window before committing
        if let Some(global_limit) = self.global_limit {
            let mut global = self.global.lock().await;
            prune(&mut global, now, self.window);

            if global.len() as u32 >= global_limit {
                let reset_at = global[0] + self.window;
                tracing::debug!(
                    client_id,
                    count = global.len(),
                    limit = global_limit,
                    reset_at = %reset_at,
                    "Request denied by global window"
                );
                return Admission::Denied { reset_at };
            }

            global.push(now);
        }

        stamps.push(now);
        let remaining = self.per_client_limit - stamps.len() as u32;
        Admission::Allowed { remaining }
    }

    /// Idle-eviction sweep: drop entries whose pruned window is empty
    ///
    /// Returns the number of evicted entries. This is the only path that
    /// destroys a client's window entry.
    pub async fn sweep_idle(&self, now: DateTime<Utc>) -> usize {
        let mut clients = self.clients.write().await;

        let mut stale = Vec::new();
        for (client_id, entry) in clients.iter() {
            let mut stamps = entry.lock().await;
            prune(&mut stamps, now, self.window);
            if stamps.is_empty() {
                stale.push(client_id.clone());
            }
        }

        for client_id in &stale {
            clients.remove(client_id);
        }

        if !stale.is_empty() {
            tracing::debug!(evicted = stale.len(), "Idle rate-limit entries evicted");
        }
        stale.len()
    }

    /// Number of tracked client entries (for diagnostics and tests)
    pub async fn tracked_clients(&self) -> usize {
        self.clients.read().await.len()
    }

    async fn entry_for(&self, client_id: &str) -> WindowEntry {
        {
            let clients = self.clients.read().await;
            if let Some(entry) = clients.get(client_id) {
                return Arc::clone(entry);
            }
        }

        let mut clients = self.clients.write().await;
        Arc::clone(
            clients
                .entry(client_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Vec::new()))),
        )
    }
}

/// Drop timestamps older than `now - window`
///
/// A timestamp exactly `window` old is expired: a request issued at the
/// denial's `reset_at` instant is admitted.
fn prune(stamps: &mut Vec<DateTime<Utc>>, now: DateTime<Utc>, window: Duration) {
    let cutoff = now - window;
    stamps.retain(|t| *t > cutoff);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[tokio::test]
    async fn test_window_admits_up_to_limit() {
        let limiter = RateLimiter::new(10, 60, None);

        for i in 0..10 {
            let admission = limiter.admit("client-a", at(i)).await;
            assert!(admission.is_allowed(), "request {} should be admitted", i);
        }
    }

    #[tokio::test]
    async fn test_over_limit_denied_with_exact_reset() {
        let limiter = RateLimiter::new(10, 60, None);

        for i in 0..10 {
            limiter.admit("client-a", at(i)).await;
        }

        // The 11th request inside the window is denied; reset_at is the
        // first request's timestamp plus the window duration.
        let admission = limiter.admit("client-a", at(30)).await;
        assert_eq!(
            admission,
            Admission::Denied {
                reset_at: at(0) + Duration::seconds(60)
            }
        );
    }

    #[tokio::test]
    async fn test_window_elapse_readmits() {
        let limiter = RateLimiter::new(2, 60, None);

        limiter.admit("client-a", at(0)).await;
        limiter.admit("client-a", at(1)).await;
        assert!(!limiter.admit("client-a", at(2)).await.is_allowed());

        // Simulated clock advance past the first timestamp's expiry
        let admission = limiter.admit("client-a", at(60)).await;
        assert!(admission.is_allowed());
    }

    #[tokio::test]
    async fn test_remaining_counts_down() {
        let limiter = RateLimiter::new(3, 60, None);

        assert_eq!(
            limiter.admit("client-a", at(0)).await,
            Admission::Allowed { remaining: 2 }
        );
        assert_eq!(
            limiter.admit("client-a", at(1)).await,
            Admission::Allowed { remaining: 1 }
        );
        assert_eq!(
            limiter.admit("client-a", at(2)).await,
            Admission::Allowed { remaining: 0 }
        );
    }

    #[tokio::test]
    async fn test_clients_do_not_share_windows() {
        let limiter = RateLimiter::new(1, 60, None);

        assert!(limiter.admit("client-a", at(0)).await.is_allowed());
        assert!(!limiter.admit("client-a", at(1)).await.is_allowed());
        assert!(limiter.admit("client-b", at(1)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_global_cap_spans_clients() {
        let limiter = RateLimiter::new(10, 60, Some(3));

        assert!(limiter.admit("client-a", at(0)).await.is_allowed());
        assert!(limiter.admit("client-b", at(1)).await.is_allowed());
        assert!(limiter.admit("client-c", at(2)).await.is_allowed());

        let admission = limiter.admit("client-d", at(3)).await;
        assert_eq!(
            admission,
            Admission::Denied {
                reset_at: at(0) + Duration::seconds(60)
            }
        );
    }

    #[tokio::test]
    async fn test_global_denial_does_not_consume_client_window() {
        let limiter = RateLimiter::new(1, 60, Some(1));

        assert!(limiter.admit("client-a", at(0)).await.is_allowed());
        assert!(!limiter.admit("client-b", at(1)).await.is_allowed());

        // The denied request must not have recorded a timestamp for
        // client-b: once the global window clears, client-b still has
        // its full per-client allowance.
        assert!(limiter.admit("client-b", at(61)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_sweep_idle_evicts_expired_entries() {
        let limiter = RateLimiter::new(5, 60, None);

        limiter.admit("client-a", at(0)).await;
        limiter.admit("client-b", at(50)).await;
        assert_eq!(limiter.tracked_clients().await, 2);

        let evicted = limiter.sweep_idle(at(70)).await;
        assert_eq!(evicted, 1);
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_admissions_never_exceed_limit() {
        let limiter = Arc::new(RateLimiter::new(5, 60, None));
        let now = at(0);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.admit("client-a", now).await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_allowed() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);
    }
}
