use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use webstate_core_types::{
    NavigationId, PageTransition, RequestDescriptor, RequestInfo, ResponseDescriptor, SessionId,
};
use webstate_event_bus::EventBus;

use crate::decider::NavigationPolicyDecider;
use crate::decision::{
    allow_navigation_action_policy, NavigationActionPolicy, PolicyDecision, ResponseReply,
};
use crate::errors::{PolicyError, PolicyResult};
use crate::events::{DecisionStage, NavigationEvent, NavigationKind, NavigationOutcome, NavigationPhase};
use crate::model::NavigationPolicyConfig;

/// Handle returned by [`WebStateSession::add_policy_decider`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeciderId(pub u64);

#[derive(Clone)]
struct RegisteredDecider {
    id: DeciderId,
    decider: Arc<dyn NavigationPolicyDecider>,
}

#[derive(Debug)]
struct NavigationRecord {
    phase: NavigationPhase,
    kind: NavigationKind,
    info: RequestInfo,
    url: Url,
}

enum ResponseVerdict {
    Allowed,
    Cancelled(String),
    Discarded,
}

struct TraversalGuard<'a>(&'a AtomicUsize);

impl Drop for TraversalGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Host for one browsing session's navigation lifecycle.
///
/// Deciders are consulted in registration order and the first `Cancel` wins.
/// Destroying the session discards pending response decisions: the waiting
/// call returns [`NavigationPhase::Discarded`] and late replies go nowhere.
pub struct WebStateSession {
    id: SessionId,
    config: NavigationPolicyConfig,
    bus: Arc<dyn EventBus<NavigationEvent>>,
    deciders: RwLock<Vec<RegisteredDecider>>,
    traversals: AtomicUsize,
    navigations: Mutex<HashMap<NavigationId, NavigationRecord>>,
    next_navigation: AtomicU64,
    next_decider: AtomicU64,
    shutdown: CancellationToken,
    destroyed: AtomicBool,
}

impl WebStateSession {
    pub fn new(
        id: SessionId,
        config: NavigationPolicyConfig,
        bus: Arc<dyn EventBus<NavigationEvent>>,
    ) -> Self {
        Self {
            id,
            config,
            bus,
            deciders: RwLock::new(Vec::new()),
            traversals: AtomicUsize::new(0),
            navigations: Mutex::new(HashMap::new()),
            next_navigation: AtomicU64::new(1),
            next_decider: AtomicU64::new(1),
            shutdown: CancellationToken::new(),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &NavigationPolicyConfig {
        &self.config
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn add_policy_decider(
        &self,
        decider: Arc<dyn NavigationPolicyDecider>,
    ) -> PolicyResult<DeciderId> {
        self.ensure_alive()?;
        let id = DeciderId(self.next_decider.fetch_add(1, Ordering::SeqCst));
        debug!(session = %self.id, decider = decider.name(), id = id.0, "policy decider attached");
        self.deciders.write().push(RegisteredDecider { id, decider });
        Ok(id)
    }

    /// Detaches a decider. Refused while deciders are being traversed.
    pub fn remove_policy_decider(&self, id: DeciderId) -> PolicyResult<()> {
        self.ensure_alive()?;
        if self.traversals.load(Ordering::SeqCst) > 0 {
            warn!(session = %self.id, id = id.0, "decider removal attempted during traversal");
            return Err(PolicyError::DeciderBusy);
        }
        let mut deciders = self.deciders.write();
        let position = deciders
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(PolicyError::UnknownDecider(id.0))?;
        deciders.remove(position);
        Ok(())
    }

    pub fn decider_count(&self) -> usize {
        self.deciders.read().len()
    }

    pub fn navigation_phase(&self, id: NavigationId) -> Option<NavigationPhase> {
        self.navigations.lock().get(&id).map(|record| record.phase)
    }

    /// Registers a navigation and runs request deciders.
    pub fn start_navigation(
        &self,
        request: RequestDescriptor,
        info: RequestInfo,
        kind: NavigationKind,
    ) -> PolicyResult<NavigationOutcome> {
        self.ensure_alive()?;
        let id = NavigationId(self.next_navigation.fetch_add(1, Ordering::SeqCst));
        self.navigations.lock().insert(
            id,
            NavigationRecord {
                phase: NavigationPhase::DecidingRequest,
                kind,
                info,
                url: request.url.clone(),
            },
        );

        if !kind.bypasses_deciders() {
            if let Some(decider) = self.run_request_deciders(&request, &info) {
                self.set_phase(id, NavigationPhase::Cancelled);
                self.publish(NavigationEvent::Cancelled {
                    session: self.id.clone(),
                    id,
                    stage: DecisionStage::Request,
                    decider: decider.clone(),
                });
                return Ok(self.outcome(id, NavigationPhase::Cancelled, Some(decider)));
            }
        }

        self.set_phase(id, NavigationPhase::RequestAllowed);
        self.publish(NavigationEvent::Started {
            session: self.id.clone(),
            id,
            url: request.url.to_string(),
            transition: info.transition,
            kind,
        });
        Ok(self.outcome(id, NavigationPhase::RequestAllowed, None))
    }

    /// Server redirect of an allowed navigation; request deciders run again
    /// for the new request.
    pub fn redirect_navigation(
        &self,
        id: NavigationId,
        request: RequestDescriptor,
    ) -> PolicyResult<NavigationOutcome> {
        self.ensure_alive()?;
        let (kind, info) = {
            let mut navigations = self.navigations.lock();
            let record = navigations
                .get_mut(&id)
                .ok_or(PolicyError::UnknownNavigation(id))?;
            if record.phase != NavigationPhase::RequestAllowed {
                return Err(PolicyError::InvalidTransition {
                    id,
                    action: "redirect",
                    phase: record.phase,
                });
            }
            record.phase = NavigationPhase::DecidingRequest;
            record.info.transition = record
                .info
                .transition
                .with_qualifier(PageTransition::SERVER_REDIRECT);
            (record.kind, record.info)
        };

        if !kind.bypasses_deciders() {
            if let Some(decider) = self.run_request_deciders(&request, &info) {
                self.set_phase(id, NavigationPhase::Cancelled);
                self.publish(NavigationEvent::Cancelled {
                    session: self.id.clone(),
                    id,
                    stage: DecisionStage::Redirect,
                    decider: decider.clone(),
                });
                return Ok(self.outcome(id, NavigationPhase::Cancelled, Some(decider)));
            }
        }

        if let Some(record) = self.navigations.lock().get_mut(&id) {
            record.url = request.url.clone();
            record.phase = NavigationPhase::RequestAllowed;
        }
        self.publish(NavigationEvent::Redirected {
            session: self.id.clone(),
            id,
            url: request.url.to_string(),
        });
        Ok(self.outcome(id, NavigationPhase::RequestAllowed, None))
    }

    /// Runs response deciders for an allowed navigation, waiting for each
    /// asynchronous answer in turn, and commits or cancels it.
    pub async fn receive_response(
        &self,
        id: NavigationId,
        response: ResponseDescriptor,
        for_main_frame: bool,
    ) -> PolicyResult<NavigationOutcome> {
        self.ensure_alive()?;
        let (kind, request_url) = {
            let mut navigations = self.navigations.lock();
            let record = navigations
                .get_mut(&id)
                .ok_or(PolicyError::UnknownNavigation(id))?;
            if record.phase != NavigationPhase::RequestAllowed {
                return Err(PolicyError::InvalidTransition {
                    id,
                    action: "receive a response",
                    phase: record.phase,
                });
            }
            record.phase = NavigationPhase::DecidingResponse;
            (record.kind, record.url.clone())
        };

        let verdict = if kind.bypasses_deciders() {
            ResponseVerdict::Allowed
        } else {
            self.run_response_deciders(&response, for_main_frame).await
        };

        match verdict {
            ResponseVerdict::Discarded => {
                debug!(session = %self.id, navigation = %id, url = %request_url, "response decision discarded");
                Ok(self.outcome(id, NavigationPhase::Discarded, None))
            }
            ResponseVerdict::Cancelled(decider) => {
                self.set_phase(id, NavigationPhase::Cancelled);
                self.publish(NavigationEvent::Cancelled {
                    session: self.id.clone(),
                    id,
                    stage: DecisionStage::Response,
                    decider: decider.clone(),
                });
                Ok(self.outcome(id, NavigationPhase::Cancelled, Some(decider)))
            }
            ResponseVerdict::Allowed => {
                self.set_phase(id, NavigationPhase::Committed);
                self.publish(NavigationEvent::Finished {
                    session: self.id.clone(),
                    id,
                    url: response.url.to_string(),
                    status: Some(response.status),
                });
                Ok(self.outcome(id, NavigationPhase::Committed, None))
            }
        }
    }

    /// Tears the session down. Idempotent.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.cancel();

        let deciders = std::mem::take(&mut *self.deciders.write());
        for entry in &deciders {
            if panic::catch_unwind(AssertUnwindSafe(|| entry.decider.session_destroyed())).is_err()
            {
                warn!(session = %self.id, decider = entry.decider.name(), "decider panicked during teardown");
            }
        }

        let pending = {
            let mut navigations = self.navigations.lock();
            let pending = navigations
                .values()
                .filter(|record| !record.phase.is_terminal())
                .count();
            navigations.clear();
            pending
        };
        info!(session = %self.id, deciders = deciders.len(), pending, "session destroyed");
        self.publish(NavigationEvent::SessionDestroyed {
            session: self.id.clone(),
        });
    }

    fn ensure_alive(&self) -> PolicyResult<()> {
        if self.is_destroyed() {
            Err(PolicyError::SessionDestroyed(self.id.to_string()))
        } else {
            Ok(())
        }
    }

    fn traverse(&self) -> (TraversalGuard<'_>, Vec<RegisteredDecider>) {
        self.traversals.fetch_add(1, Ordering::SeqCst);
        let guard = TraversalGuard(&self.traversals);
        let snapshot = self.deciders.read().clone();
        (guard, snapshot)
    }

    fn run_request_deciders(&self, request: &RequestDescriptor, info: &RequestInfo) -> Option<String> {
        let (_guard, deciders) = self.traverse();
        for entry in deciders {
            let decision = panic::catch_unwind(AssertUnwindSafe(|| {
                entry.decider.decide_request(request, info)
            }))
            .unwrap_or_else(|_| {
                warn!(session = %self.id, decider = entry.decider.name(), "request decider panicked; allowing");
                PolicyDecision::Allow
            });
            if decision.should_cancel_navigation() {
                info!(session = %self.id, decider = entry.decider.name(), url = %request.url, "request cancelled");
                return Some(entry.decider.name().to_string());
            }
        }
        None
    }

    async fn run_response_deciders(
        &self,
        response: &ResponseDescriptor,
        for_main_frame: bool,
    ) -> ResponseVerdict {
        let (_guard, deciders) = self.traverse();
        for entry in deciders {
            let (reply, rx) = ResponseReply::channel();
            if panic::catch_unwind(AssertUnwindSafe(|| {
                entry.decider.decide_response(response, for_main_frame, reply)
            }))
            .is_err()
            {
                warn!(session = %self.id, decider = entry.decider.name(), "response decider panicked; allowing");
                continue;
            }

            let decision = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return ResponseVerdict::Discarded,
                decision = self.await_reply(entry.decider.name(), rx) => decision,
            };
            if decision.should_cancel_navigation() {
                info!(session = %self.id, decider = entry.decider.name(), url = %response.url, "response cancelled");
                return ResponseVerdict::Cancelled(entry.decider.name().to_string());
            }
        }
        ResponseVerdict::Allowed
    }

    async fn await_reply(&self, decider: &str, rx: oneshot::Receiver<PolicyDecision>) -> PolicyDecision {
        let timeout_ms = self.config.response_timeout_ms;
        let received = if timeout_ms == 0 {
            Ok(rx.await)
        } else {
            tokio::time::timeout(Duration::from_millis(timeout_ms), rx).await
        };
        match received {
            Ok(Ok(decision)) => decision,
            Ok(Err(_)) => {
                debug!(session = %self.id, decider, "reply dropped without a decision; allowing");
                PolicyDecision::Allow
            }
            Err(_) => {
                warn!(session = %self.id, decider, timeout_ms, "response decision timed out; allowing");
                PolicyDecision::Allow
            }
        }
    }

    fn set_phase(&self, id: NavigationId, phase: NavigationPhase) {
        if let Some(record) = self.navigations.lock().get_mut(&id) {
            record.phase = phase;
        }
    }

    fn outcome(
        &self,
        id: NavigationId,
        phase: NavigationPhase,
        cancelled_by: Option<String>,
    ) -> NavigationOutcome {
        let action_policy = match phase {
            NavigationPhase::Cancelled | NavigationPhase::Discarded => NavigationActionPolicy::Cancel,
            _ => allow_navigation_action_policy(self.config.block_universal_links),
        };
        NavigationOutcome {
            id,
            phase,
            action_policy,
            cancelled_by,
        }
    }

    fn publish(&self, event: NavigationEvent) {
        if let Err(err) = self.bus.publish(event) {
            warn!(session = %self.id, "navigation event publish failed: {err}");
        }
    }
}

impl Drop for WebStateSession {
    fn drop(&mut self) {
        self.destroy();
    }
}
