use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;
use webstate_core_types::{RequestDescriptor, RequestInfo, ResponseDescriptor};

use crate::decider::NavigationPolicyDecider;
use crate::decision::{PolicyDecision, ResponseReply};

pub const CHANGE_PASSWORD_PATH: &str = "/.well-known/change-password";
pub const NOT_EXIST_PROBE_PATH: &str =
    "/.well-known/resource-that-should-not-exist-whose-status-code-should-not-be-200";

/// Fetches the status code of a URL without navigating to it.
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    async fn status(&self, url: &Url) -> Option<u16>;
}

/// Checks whether a site really supports `/.well-known/change-password`.
///
/// A site supports it when the change-password response is 2xx and a path
/// that must not exist answers 404. Otherwise the navigation is cancelled and
/// a load of the origin root is requested on the redirect channel.
///
/// Only the current main-frame navigation is tracked. Server redirects keep
/// the check alive, so sites that forward the well-known URL to their real
/// settings page are still verified against the origin that was asked for.
/// Any other main-frame request replaces it.
pub struct ChangePasswordDecider {
    probe: Arc<dyn ResourceProbe>,
    redirects: mpsc::UnboundedSender<Url>,
    pending: Mutex<Option<Url>>,
}

impl ChangePasswordDecider {
    pub fn new(probe: Arc<dyn ResourceProbe>, redirects: mpsc::UnboundedSender<Url>) -> Self {
        Self {
            probe,
            redirects,
            pending: Mutex::new(None),
        }
    }

    /// The change-password URL awaiting its response, if any.
    pub fn pending_check(&self) -> Option<Url> {
        self.pending.lock().clone()
    }

    fn is_change_password_url(url: &Url) -> bool {
        url.path() == CHANGE_PASSWORD_PATH
    }
}

impl NavigationPolicyDecider for ChangePasswordDecider {
    fn name(&self) -> &str {
        "well_known_change_password"
    }

    fn decide_request(&self, request: &RequestDescriptor, info: &RequestInfo) -> PolicyDecision {
        if !info.target_frame_is_main {
            return PolicyDecision::Allow;
        }
        let mut pending = self.pending.lock();
        if Self::is_change_password_url(&request.url) {
            *pending = Some(request.url.clone());
        } else if !info.transition.is_redirect() {
            *pending = None;
        } else if let Some(origin) = pending.as_ref() {
            debug!(from = %origin, to = %request.url, "change-password navigation redirected");
        }
        PolicyDecision::Allow
    }

    fn decide_response(
        &self,
        response: &ResponseDescriptor,
        for_main_frame: bool,
        reply: ResponseReply,
    ) {
        let checked = if for_main_frame {
            self.pending.lock().take()
        } else {
            None
        };
        let Some(url) = checked else {
            reply.allow();
            return;
        };

        let probe = Arc::clone(&self.probe);
        let redirects = self.redirects.clone();
        let response_ok = response.is_success();
        tokio::spawn(async move {
            let supported = if response_ok {
                match url.join(NOT_EXIST_PROBE_PATH) {
                    Ok(probe_url) => probe.status(&probe_url).await == Some(404),
                    Err(_) => false,
                }
            } else {
                false
            };

            if supported {
                debug!(url = %url, "change-password url supported");
                reply.allow();
                return;
            }

            let Ok(root) = url.join("/") else {
                reply.allow();
                return;
            };
            if reply.cancel() {
                info!(url = %url, redirect = %root, "change-password url unsupported; redirecting");
                let _ = redirects.send(root);
            }
        });
    }

    fn session_destroyed(&self) {
        self.pending.lock().take();
    }
}
