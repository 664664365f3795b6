//! Turns navigation lifecycle events into breadcrumbs.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;
use webstate_breadcrumbs::SharedBreadcrumbLog;
use webstate_event_bus::{to_mpsc, EventBus};
use webstate_navigation_policy::{DecisionStage, NavigationEvent};

const BRIDGE_CAPACITY: usize = 64;

/// Subscribes to `bus` immediately and records every navigation event in
/// `log` from a spawned task. The task ends once the bus is dropped.
pub fn record_navigation_breadcrumbs(
    bus: Arc<dyn EventBus<NavigationEvent>>,
    log: SharedBreadcrumbLog,
) -> JoinHandle<usize> {
    let mut rx = to_mpsc(bus, BRIDGE_CAPACITY);
    tokio::spawn(async move {
        let mut recorded = 0usize;
        while let Some(event) = rx.recv().await {
            let line = breadcrumb_for(&event);
            match log.lock().add_event(&line) {
                Ok(()) => recorded += 1,
                Err(err) => warn!(?err, "failed to record navigation breadcrumb"),
            }
        }
        debug!(recorded, "navigation breadcrumb bridge stopped");
        recorded
    })
}

/// Single-line breadcrumb text for a navigation event.
pub fn breadcrumb_for(event: &NavigationEvent) -> String {
    match event {
        NavigationEvent::Started {
            session,
            id,
            transition,
            kind,
            ..
        } => {
            let label = if kind.bypasses_deciders() {
                "SameDocNav"
            } else {
                "StartNav"
            };
            format!("Session{session} {label}{id} {transition}")
        }
        NavigationEvent::Redirected { id, url, .. } => {
            format!("RedirectNav{id} {}", redact_url(url))
        }
        NavigationEvent::Finished { id, status, .. } => match status {
            Some(status) => format!("FinishNav{id} {status}"),
            None => format!("FinishNav{id}"),
        },
        NavigationEvent::Cancelled {
            id, stage, decider, ..
        } => {
            let stage = match stage {
                DecisionStage::Request => "request",
                DecisionStage::Redirect => "redirect",
                DecisionStage::Response => "response",
            };
            format!("CancelNav{id} by {decider} at {stage}")
        }
        NavigationEvent::SessionDestroyed { session } => format!("Session{session} Destroyed"),
    }
}

/// Drops query and fragment; they may carry personal data. Unparseable input
/// is cut at the first `?` or `#`.
fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webstate_core_types::{NavigationId, PageTransition, SessionId, TransitionCore};
    use webstate_navigation_policy::NavigationKind;

    #[test]
    fn start_line_names_session_and_transition() {
        let event = NavigationEvent::Started {
            session: SessionId("s1".into()),
            id: NavigationId(3),
            url: "https://example.com/?q=secret".into(),
            transition: PageTransition::new(TransitionCore::Typed),
            kind: NavigationKind::Regular,
        };
        assert_eq!(breadcrumb_for(&event), "Sessions1 StartNav3 typed");
    }

    #[test]
    fn redirect_line_drops_query() {
        let event = NavigationEvent::Redirected {
            session: SessionId("s1".into()),
            id: NavigationId(1),
            url: "https://example.com/login?token=abc#frag".into(),
        };
        assert_eq!(breadcrumb_for(&event), "RedirectNav1 https://example.com/login");
        assert_eq!(redact_url("not a url?x=1"), "not a url");
    }

    #[test]
    fn cancel_line_names_decider() {
        let event = NavigationEvent::Cancelled {
            session: SessionId("s1".into()),
            id: NavigationId(2),
            stage: DecisionStage::Response,
            decider: "url_blocklist".into(),
        };
        assert_eq!(breadcrumb_for(&event), "CancelNav2 by url_blocklist at response");
    }
}
