//! Label caches
//!
//! Group and company names change rarely, so they are fetched at most once
//! per TTL. Callers pass the current instant in, which keeps expiry
//! testable. A failed refresh serves whatever was cached before.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use deskpulse_analytics::{Labels, label_map};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::client::TicketingClient;
use crate::pagination::{fetch_companies, fetch_groups};

/// Default label TTL
pub const DEFAULT_LABEL_TTL: Duration = Duration::from_secs(3600);

/// A single cached value with a time-to-live
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    value: Option<T>,
    fetched_at: Option<Instant>,
    ttl: Duration,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            value: None,
            fetched_at: None,
            ttl,
        }
    }

    /// The cached value if it is younger than the TTL
    pub fn get_fresh(&self, now: Instant) -> Option<&T> {
        if self.is_fresh(now) {
            self.value.as_ref()
        } else {
            None
        }
    }

    /// The cached value regardless of age
    pub fn get_stale(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_fresh(&self, now: Instant) -> bool {
        self.fetched_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.ttl)
    }

    pub fn store(&mut self, value: T, now: Instant) {
        self.value = Some(value);
        self.fetched_at = Some(now);
    }

    pub fn invalidate(&mut self) {
        self.fetched_at = None;
    }
}

type LabelMap = HashMap<u64, String>;

/// Group and company label lookups backed by the helpdesk
pub struct LabelDirectory {
    client: Arc<TicketingClient>,
    groups: Mutex<TtlCache<LabelMap>>,
    companies: Mutex<TtlCache<LabelMap>>,
}

impl LabelDirectory {
    pub fn new(client: Arc<TicketingClient>, ttl: Duration) -> Self {
        Self {
            client,
            groups: Mutex::new(TtlCache::new(ttl)),
            companies: Mutex::new(TtlCache::new(ttl)),
        }
    }

    /// Current labels, refreshing whichever map is stale
    ///
    /// Never fails: a refresh error keeps the previous map (or an empty
    /// one), and missing ids fall back to synthesized labels.
    pub async fn labels(&self, now: Instant) -> Labels {
        let groups = self
            .refresh(&self.groups, "groups", now, || async {
                fetch_groups(&self.client).await.map(|g| label_map(&g))
            })
            .await;
        let companies = self
            .refresh(&self.companies, "companies", now, || async {
                fetch_companies(&self.client).await.map(|c| label_map(&c))
            })
            .await;

        Labels::new(groups, companies)
    }

    async fn refresh<F, Fut>(
        &self,
        cache: &Mutex<TtlCache<LabelMap>>,
        kind: &'static str,
        now: Instant,
        fetch: F,
    ) -> LabelMap
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = crate::error::Result<LabelMap>>,
    {
        if let Some(fresh) = cache.lock().get_fresh(now) {
            return fresh.clone();
        }

        match fetch().await {
            Ok(map) => {
                debug!(kind, count = map.len(), "label cache refreshed");
                cache.lock().store(map.clone(), now);
                map
            }
            Err(e) => {
                warn!(kind, error = %e, "label refresh failed, serving cached labels");
                cache.lock().get_stale().cloned().unwrap_or_default()
            }
        }
    }
}
