//! Expiring cache for service handles
//!
//! Handles to the spreadsheet and file store are expensive to establish (token
//! exchange, spreadsheet lookup) so they are reused across submissions for a
//! bounded window. Initialization is lazy and serialized; a failed init leaves
//! the slot empty so the next caller tries again.
//!
//! A handle may carry its own deadline (an access token that expires sooner
//! than the cache TTL). The earlier of the two bounds the handle.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// A handle that may stop working at a known instant
pub trait Expiring {
    /// Instant after which the handle must not be reused, if it has one
    fn expires_at(&self) -> Option<Instant> {
        None
    }
}

struct CachedHandle<T> {
    handle: T,
    acquired_at: Instant,
    /// `None` when neither the TTL nor the handle bound it
    deadline: Option<Instant>,
}

impl<T> CachedHandle<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.deadline.is_none_or(|deadline| now < deadline)
    }
}

/// Lazily initialized handle slot with a time-to-live
pub struct HandleCache<T> {
    name: &'static str,
    slot: Mutex<Option<CachedHandle<T>>>,
    ttl: Duration,
}

impl<T: Clone + Expiring> HandleCache<T> {
    /// Create an empty cache; `name` only appears in logs
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            slot: Mutex::new(None),
            ttl,
        }
    }

    /// Return the cached handle, or run `init` when none is cached or it expired
    pub async fn get_or_try_init<F, Fut, E>(&self, init: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh(Instant::now()) {
                return Ok(cached.handle.clone());
            }
            debug!(
                cache = self.name,
                age_secs = cached.acquired_at.elapsed().as_secs_f64(),
                "cached handle expired"
            );
        }

        *slot = None;
        let handle = init().await?;
        let acquired_at = Instant::now();
        let deadline = match (acquired_at.checked_add(self.ttl), handle.expires_at()) {
            (Some(ttl_end), Some(own)) => Some(ttl_end.min(own)),
            (ttl_end, own) => ttl_end.or(own),
        };
        debug!(cache = self.name, "acquired new handle");
        *slot = Some(CachedHandle {
            handle: handle.clone(),
            acquired_at,
            deadline,
        });
        Ok(handle)
    }

    /// Drop the cached handle so the next call reconnects
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        if slot.take().is_some() {
            debug!(cache = self.name, "cached handle invalidated");
        }
    }

    /// Whether a handle is cached and still within its deadline
    pub async fn is_fresh(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .is_some_and(|cached| cached.is_fresh(Instant::now()))
    }
}
