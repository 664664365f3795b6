use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::config::BreadcrumbPolicyView;
use crate::model::EventBucket;

pub fn total_events(buckets: &VecDeque<EventBucket>) -> usize {
    buckets.iter().map(EventBucket::len).sum()
}

/// Drops whole buckets from the old end while they are past the retention
/// window and removing them keeps at least `min_events`. Stops at the first
/// bucket that must stay. Then applies the `max_events` ceiling.
/// Returns how many events were removed.
pub fn drop_old_events(
    buckets: &mut VecDeque<EventBucket>,
    now: DateTime<Utc>,
    policy: &BreadcrumbPolicyView,
) -> usize {
    let mut remaining = total_events(buckets);
    let mut dropped = 0;
    let retention = policy.retention();
    while let Some(oldest) = buckets.front() {
        if now - oldest.minute <= retention {
            break;
        }
        let after = remaining - oldest.len();
        if after < policy.min_events {
            break;
        }
        dropped += oldest.len();
        remaining = after;
        buckets.pop_front();
    }
    dropped + enforce_ceiling(buckets, policy.max_events)
}

/// Removes the oldest individual events until at most `max_events` remain.
pub fn enforce_ceiling(buckets: &mut VecDeque<EventBucket>, max_events: usize) -> usize {
    let mut excess = total_events(buckets).saturating_sub(max_events);
    let mut dropped = 0;
    while excess > 0 {
        let Some(oldest) = buckets.front_mut() else {
            break;
        };
        let take = excess.min(oldest.len());
        oldest.events.drain(..take);
        excess -= take;
        dropped += take;
        if oldest.is_empty() {
            buckets.pop_front();
        }
    }
    dropped
}
