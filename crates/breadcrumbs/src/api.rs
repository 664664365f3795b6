use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::BreadcrumbPolicyView;
use crate::drop_policy;
use crate::errors::{BreadcrumbErrorKind, BreadcrumbResult};
use crate::model::{format_elapsed, is_valid_event, truncate_to_minute, EventBucket};
use crate::observers::{BreadcrumbObserver, ObserverId, ObserverRegistry};

pub type SharedBreadcrumbLog = Arc<Mutex<BreadcrumbLog>>;

/// In-memory trail of short diagnostic events grouped into minute buckets.
///
/// Stale buckets are dropped lazily on read, but only while enough newer
/// events remain, so a quiet session still has context in its crash report.
/// Every observer must be removed before the log is dropped.
pub struct BreadcrumbLog {
    policy: BreadcrumbPolicyView,
    clock: Arc<dyn Clock>,
    start_time: DateTime<Utc>,
    buckets: VecDeque<EventBucket>,
    observers: ObserverRegistry,
}

impl BreadcrumbLog {
    pub fn new(policy: BreadcrumbPolicyView) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: BreadcrumbPolicyView, clock: Arc<dyn Clock>) -> Self {
        let start_time = clock.now();
        Self {
            policy,
            clock,
            start_time,
            buckets: VecDeque::new(),
            observers: ObserverRegistry::default(),
        }
    }

    pub fn shared(self) -> SharedBreadcrumbLog {
        Arc::new(Mutex::new(self))
    }

    pub fn policy(&self) -> &BreadcrumbPolicyView {
        &self.policy
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Logs `text`, prefixed with the time elapsed since the log was created.
    /// Text containing a line terminator is rejected and nothing changes.
    pub fn add_event(&mut self, text: &str) -> BreadcrumbResult<()> {
        if !is_valid_event(text) {
            return Err(BreadcrumbErrorKind::InvalidEvent(
                "breadcrumb events must not contain line terminators".into(),
            )
            .into());
        }

        let now = self.clock.now();
        let minute = truncate_to_minute(now);
        let event = format!("{} {}", format_elapsed(now - self.start_time), text);

        // a clock that stepped back still lands in the newest bucket
        match self.buckets.back_mut() {
            Some(bucket) if bucket.minute >= minute => bucket.events.push_back(event.clone()),
            _ => {
                let mut bucket = EventBucket::new(minute);
                bucket.events.push_back(event.clone());
                self.buckets.push_back(bucket);
            }
        }

        let dropped = drop_policy::enforce_ceiling(&mut self.buckets, self.policy.max_events);
        self.observers.emit_added(&event);
        if dropped > 0 {
            self.observers.emit_removed(dropped);
        }
        Ok(())
    }

    /// Number of events still considered relevant. May shrink as time passes
    /// even without new events.
    pub fn event_count(&mut self) -> usize {
        self.drop_old_events();
        drop_policy::total_events(&self.buckets)
    }

    /// Up to `limit` most recent events, oldest first. Zero means no limit.
    pub fn events(&mut self, limit: usize) -> Vec<String> {
        self.drop_old_events();
        let total = drop_policy::total_events(&self.buckets);
        let skip = if limit == 0 {
            0
        } else {
            total.saturating_sub(limit)
        };
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.events.iter())
            .skip(skip)
            .cloned()
            .collect()
    }

    /// Inserts already formatted events, typically restored from disk, ahead
    /// of everything logged so far.
    pub fn set_previous_events(&mut self, events: &[String]) {
        let mut bucket = EventBucket::new(truncate_to_minute(self.start_time));
        for event in events {
            if is_valid_event(event) {
                bucket.events.push_back(event.clone());
            } else {
                warn!("skipping restored breadcrumb containing a line terminator");
            }
        }
        if bucket.is_empty() {
            return;
        }
        debug!(count = bucket.len(), "restored previous breadcrumbs");
        self.buckets.push_front(bucket);
        let dropped = drop_policy::enforce_ceiling(&mut self.buckets, self.policy.max_events);
        if dropped > 0 {
            self.observers.emit_removed(dropped);
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn BreadcrumbObserver>) -> ObserverId {
        self.observers.register(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn drop_old_events(&mut self) {
        let dropped = drop_policy::drop_old_events(&mut self.buckets, self.clock.now(), &self.policy);
        if dropped > 0 {
            debug!(dropped, "dropped stale breadcrumbs");
            self.observers.emit_removed(dropped);
        }
    }
}

impl Drop for BreadcrumbLog {
    fn drop(&mut self) {
        debug_assert!(
            self.observers.is_empty() || std::thread::panicking(),
            "breadcrumb observers must be removed before the log is dropped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn log_with(policy: BreadcrumbPolicyView) -> (BreadcrumbLog, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        (BreadcrumbLog::with_clock(policy, clock.clone()), clock)
    }

    fn policy(retention_minutes: u32, min_events: usize) -> BreadcrumbPolicyView {
        BreadcrumbPolicyView {
            retention_minutes,
            min_events,
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct Recording {
        added: Mutex<Vec<String>>,
        removed: Mutex<usize>,
    }

    impl BreadcrumbObserver for Recording {
        fn event_added(&self, event: &str) {
            self.added.lock().push(event.to_string());
        }

        fn old_events_removed(&self, dropped: usize) {
            *self.removed.lock() += dropped;
        }
    }

    #[test]
    fn events_are_prefixed_with_elapsed_time() {
        let (mut log, clock) = log_with(policy(20, 20));
        log.add_event("first").unwrap();
        clock.advance(chrono::Duration::seconds(75));
        log.add_event("second").unwrap();

        assert_eq!(log.events(0), vec!["0:00:00 first", "0:01:15 second"]);
        assert_eq!(log.event_count(), 2);
    }

    #[test]
    fn same_minute_shares_a_bucket() {
        let (mut log, clock) = log_with(policy(20, 20));
        log.add_event("a").unwrap();
        clock.advance(chrono::Duration::seconds(30));
        log.add_event("b").unwrap();
        clock.advance(chrono::Duration::seconds(45));
        log.add_event("c").unwrap();
        assert_eq!(log.buckets.len(), 2);
        assert_eq!(log.buckets[0].len(), 2);
    }

    #[test]
    fn newline_is_rejected_without_mutation() {
        let (mut log, _clock) = log_with(policy(20, 20));
        let observer = Arc::new(Recording::default());
        let id = log.add_observer(observer.clone());

        let err = log.add_event("bad\nline").unwrap_err();
        assert!(matches!(err.kind(), BreadcrumbErrorKind::InvalidEvent(_)));
        assert_eq!(log.event_count(), 0);
        assert!(observer.added.lock().is_empty());

        log.remove_observer(id);
    }

    #[test]
    fn limit_returns_most_recent_oldest_first() {
        let (mut log, clock) = log_with(policy(20, 20));
        for idx in 0..5 {
            log.add_event(&format!("e{idx}")).unwrap();
            clock.advance(chrono::Duration::minutes(1));
        }
        let recent = log.events(2);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].ends_with("e3"));
        assert!(recent[1].ends_with("e4"));
        assert_eq!(log.events(50).len(), 5);
    }

    #[test]
    fn previous_events_sort_before_new_ones() {
        let (mut log, _clock) = log_with(policy(20, 20));
        log.set_previous_events(&["a".to_string(), "b".to_string()]);
        log.add_event("c").unwrap();
        assert_eq!(log.events(0), vec!["a", "b", "0:00:00 c"]);
    }

    #[test]
    fn previous_events_spliced_after_live_events_still_lead() {
        let (mut log, clock) = log_with(policy(20, 20));
        clock.advance(chrono::Duration::minutes(3));
        log.add_event("live").unwrap();
        log.set_previous_events(&["restored".to_string()]);
        assert_eq!(log.events(0), vec!["restored", "0:03:00 live"]);
    }

    #[test]
    fn floor_keeps_last_event_through_long_idle() {
        let (mut log, clock) = log_with(policy(30, 1));
        log.add_event("only").unwrap();
        clock.advance(chrono::Duration::hours(10));
        assert_eq!(log.event_count(), 1);
    }

    #[test]
    fn count_decreases_as_time_passes() {
        let (mut log, clock) = log_with(policy(30, 2));
        log.add_event("old-1").unwrap();
        log.add_event("old-2").unwrap();
        clock.advance(chrono::Duration::minutes(5));
        log.add_event("mid").unwrap();
        clock.advance(chrono::Duration::minutes(20));
        log.add_event("new-1").unwrap();
        log.add_event("new-2").unwrap();

        let observer = Arc::new(Recording::default());
        let id = log.add_observer(observer.clone());

        assert_eq!(log.event_count(), 5);
        clock.advance(chrono::Duration::minutes(10));
        assert_eq!(log.event_count(), 3);
        clock.advance(chrono::Duration::minutes(10));
        assert_eq!(log.event_count(), 2);
        clock.advance(chrono::Duration::hours(5));
        assert_eq!(log.event_count(), 2);
        assert_eq!(*observer.removed.lock(), 3);

        log.remove_observer(id);
    }

    #[test]
    fn ceiling_bounds_memory() {
        let (mut log, _clock) = log_with(BreadcrumbPolicyView {
            max_events: 3,
            min_events: 1,
            ..Default::default()
        });
        for idx in 0..10 {
            log.add_event(&format!("e{idx}")).unwrap();
        }
        let events = log.events(0);
        assert_eq!(events.len(), 3);
        assert!(events[0].ends_with("e7"));
    }

    #[test]
    fn observers_notified_in_registration_order() {
        let (mut log, _clock) = log_with(policy(20, 20));
        let order = Arc::new(Mutex::new(Vec::new()));

        struct Tagged(&'static str, Arc<Mutex<Vec<String>>>);
        impl BreadcrumbObserver for Tagged {
            fn event_added(&self, event: &str) {
                self.1.lock().push(format!("{}:{}", self.0, event));
            }
        }

        let first = log.add_observer(Arc::new(Tagged("first", order.clone())));
        let second = log.add_observer(Arc::new(Tagged("second", order.clone())));
        log.add_event("x").unwrap();
        assert_eq!(
            *order.lock(),
            vec!["first:0:00:00 x", "second:0:00:00 x"]
        );

        assert!(log.remove_observer(first));
        assert!(!log.remove_observer(first));
        log.add_event("y").unwrap();
        assert_eq!(order.lock().len(), 3);
        assert!(log.remove_observer(second));
        assert_eq!(log.observer_count(), 0);
    }

    #[test]
    fn clock_stepping_back_keeps_buckets_ascending() {
        let (mut log, clock) = log_with(policy(30, 1));
        clock.advance(chrono::Duration::minutes(5));
        log.add_event("ahead").unwrap();
        clock.set(start() + chrono::Duration::minutes(2));
        log.add_event("behind").unwrap();

        assert_eq!(log.buckets.len(), 1);
        assert_eq!(log.buckets[0].len(), 2);
        assert!(log
            .buckets
            .iter()
            .zip(log.buckets.iter().skip(1))
            .all(|(older, newer)| older.minute < newer.minute));

        clock.set(start() + chrono::Duration::minutes(10));
        log.add_event("later").unwrap();
        assert_eq!(log.buckets.len(), 2);
        assert!(log.buckets[0].minute < log.buckets[1].minute);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "breadcrumb observers must be removed")]
    fn dropping_log_with_observer_attached_asserts() {
        let (mut log, _clock) = log_with(policy(20, 20));
        log.add_observer(Arc::new(Recording::default()));
        drop(log);
    }

    #[test]
    fn dropping_log_after_observer_removed_is_fine() {
        let (mut log, _clock) = log_with(policy(20, 20));
        let observer = Arc::new(Recording::default());
        let id = log.add_observer(observer.clone());
        log.add_event("seen").unwrap();
        assert!(log.remove_observer(id));
        drop(log);
        assert_eq!(observer.added.lock().len(), 1);
    }
}
