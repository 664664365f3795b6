use std::collections::VecDeque;

use chrono::{DateTime, DurationRound, Utc};

/// Events logged within the same wall-clock minute, oldest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventBucket {
    pub minute: DateTime<Utc>,
    pub events: VecDeque<String>,
}

impl EventBucket {
    pub fn new(minute: DateTime<Utc>) -> Self {
        Self {
            minute,
            events: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

pub fn truncate_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(chrono::Duration::minutes(1)).unwrap_or(ts)
}

/// `H:MM:SS` of time elapsed since the log was created.
pub fn format_elapsed(elapsed: chrono::Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

pub fn is_valid_event(text: &str) -> bool {
    !text.contains(['\n', '\r'])
}
