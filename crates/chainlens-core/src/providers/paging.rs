use std::time::Duration;

use tracing::warn;

use crate::types::{Listing, Truncation};

// ==============================================================================
// Offset Pagination
// ==============================================================================

/// Offset/limit pagination that stops on an empty or short page.
#[derive(Debug, Clone)]
pub struct OffsetPager {
    page_size: usize,
    offset: usize,
}

impl OffsetPager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            offset: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Record a page of `page_len` records. Returns `true` when another page
    /// should be requested.
    pub fn advance(&mut self, page_len: usize) -> bool {
        if page_len == 0 || page_len < self.page_size {
            return false;
        }
        self.offset += self.page_size;
        true
    }
}

// ==============================================================================
// Fixed Pacing
// ==============================================================================

/// A fixed pause taken before every outbound call to a provider with a strict
/// per-second limit. The pause is unconditional: it does not track when the
/// previous call happened.
#[derive(Debug, Clone, Copy)]
pub struct FixedPacing {
    interval: Duration,
}

impl FixedPacing {
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn pause(&self) {
        tokio::time::sleep(self.interval).await;
    }
}

// ==============================================================================
// Truncation
// ==============================================================================

/// Cut `items` down to `cap` records, recording the truncation and emitting a
/// warning when anything was dropped.
pub fn cap_listing<T>(mut items: Vec<T>, cap: usize, reason: &str) -> Listing<T> {
    if items.len() <= cap {
        return Listing::complete(items);
    }
    warn!(
        available = items.len(),
        cap, reason, "listing truncated, result is incomplete"
    );
    items.truncate(cap);
    Listing {
        items,
        truncation: Some(Truncation {
            cap,
            reason: reason.to_owned(),
        }),
    }
}

/// Apply a caller's `max_count` and the provider's hard `cap`. Stopping at
/// the caller's own limit is silent; only hitting `cap` records a truncation.
pub fn limit_listing<T>(
    mut items: Vec<T>,
    max_count: Option<usize>,
    cap: usize,
    reason: &str,
) -> Listing<T> {
    match max_count {
        Some(max) if max < cap => {
            items.truncate(max);
            Listing::complete(items)
        }
        _ => cap_listing(items, cap, reason),
    }
}

/// Mark `listing` truncated when a provider returned `returned` records and
/// that count reaches its hard `cap`: the provider may have withheld more.
pub fn flag_provider_cap<T>(listing: &mut Listing<T>, returned: usize, cap: usize, reason: &str) {
    if returned < cap || listing.truncation.is_some() {
        return;
    }
    warn!(returned, cap, reason, "provider cap reached, result may be incomplete");
    listing.truncation = Some(Truncation {
        cap,
        reason: reason.to_owned(),
    });
}
