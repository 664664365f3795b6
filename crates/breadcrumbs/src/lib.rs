//! Breadcrumb log: a short, time-bucketed trail of recent events kept for
//! crash diagnostics, with an optional on-disk mirror.

pub mod api;
pub mod clock;
pub mod config;
pub mod crash_report;
pub mod errors;
pub mod model;
pub mod observers;
pub mod persist;

mod drop_policy;

pub use api::{BreadcrumbLog, SharedBreadcrumbLog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::BreadcrumbPolicyView;
pub use crash_report::{render as render_crash_key, CRASH_KEY_MAX_BYTES};
pub use errors::{BreadcrumbError, BreadcrumbErrorKind, BreadcrumbResult};
pub use observers::{BreadcrumbObserver, ObserverId};
pub use persist::{load_previous_events, PersistentStore};
