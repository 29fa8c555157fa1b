//! View staleness tracking and transient alerts.
//!
//! Instead of mirroring server state, the cache records which list views
//! have been invalidated by a push event. The embedding application checks
//! `is_stale` on render, refetches over HTTP, and calls `mark_fresh`.
//! Invalidation is idempotent, so over-invalidating is always safe.

use std::collections::{HashSet, VecDeque};

/// The customer's own repair requests.
pub const VIEW_USER: &str = "repairs:user";
/// The technician's assigned repair requests.
pub const VIEW_TECHNICIAN: &str = "repairs:technician";
/// Unclaimed repair requests available to technicians.
pub const VIEW_AVAILABLE: &str = "repairs:available";

/// Upper bound on queued alerts; older alerts are dropped first.
const MAX_ALERTS: usize = 64;

/// A transient, user-facing message raised by a push event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
}

/// Tracks per-view staleness flags and a bounded alert queue.
#[derive(Debug, Default)]
pub struct ViewCache {
    stale: HashSet<String>,
    alerts: VecDeque<Alert>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a view as needing a refetch. Idempotent.
    pub fn invalidate(&mut self, view: &str) {
        self.stale.insert(view.to_string());
    }

    /// Whether a view has been invalidated since it was last marked fresh.
    pub fn is_stale(&self, view: &str) -> bool {
        self.stale.contains(view)
    }

    /// Clear a view's staleness flag after a successful refetch.
    pub fn mark_fresh(&mut self, view: &str) {
        self.stale.remove(view);
    }

    /// Queue a transient alert, dropping the oldest when full.
    pub fn push_alert(&mut self, message: impl Into<String>) {
        if self.alerts.len() == MAX_ALERTS {
            self.alerts.pop_front();
        }
        self.alerts.push_back(Alert {
            message: message.into(),
        });
    }

    /// Take the oldest queued alert, if any.
    pub fn pop_alert(&mut self) -> Option<Alert> {
        self.alerts.pop_front()
    }

    /// Number of queued alerts.
    pub fn alert_count(&self) -> usize {
        self.alerts.len()
    }
}
