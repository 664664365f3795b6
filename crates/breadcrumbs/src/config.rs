use serde::{Deserialize, Serialize};

use crate::errors::{BreadcrumbErrorKind, BreadcrumbResult};

/// Retention knobs for [`crate::BreadcrumbLog`] and its persistent store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreadcrumbPolicyView {
    /// Buckets older than this are eligible for removal.
    pub retention_minutes: u32,
    /// Aging never leaves fewer than this many events.
    pub min_events: usize,
    /// Hard ceiling on retained events; the oldest go first.
    pub max_events: usize,
    /// Lines kept in the on-disk store.
    pub persist_max_lines: usize,
}

impl Default for BreadcrumbPolicyView {
    fn default() -> Self {
        Self {
            retention_minutes: 20,
            min_events: 20,
            max_events: 500,
            persist_max_lines: 100,
        }
    }
}

impl BreadcrumbPolicyView {
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.retention_minutes))
    }

    pub fn validate(&self) -> BreadcrumbResult<()> {
        if self.max_events == 0 {
            return Err(BreadcrumbErrorKind::InvalidPolicy("max_events must be positive".into()).into());
        }
        if self.min_events > self.max_events {
            return Err(BreadcrumbErrorKind::InvalidPolicy(format!(
                "min_events ({}) exceeds max_events ({})",
                self.min_events, self.max_events
            ))
            .into());
        }
        Ok(())
    }
}
