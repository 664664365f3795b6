use serde::{Deserialize, Serialize};
use webstate_core_types::{NavigationId, PageTransition, SessionId};

use crate::decision::NavigationActionPolicy;

/// How the navigation relates to the current document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    Regular,
    /// History traversal inside the current document; deciders are skipped.
    SameDocumentBackForward,
    /// `pushState`/`replaceState`; deciders are skipped.
    SameDocumentStateChange,
}

impl NavigationKind {
    pub fn bypasses_deciders(&self) -> bool {
        !matches!(self, NavigationKind::Regular)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPhase {
    Started,
    DecidingRequest,
    RequestAllowed,
    DecidingResponse,
    Committed,
    Cancelled,
    /// The session was destroyed while a decision was pending.
    Discarded,
}

impl NavigationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NavigationPhase::Committed | NavigationPhase::Cancelled | NavigationPhase::Discarded
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStage {
    Request,
    Redirect,
    Response,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationOutcome {
    pub id: NavigationId,
    pub phase: NavigationPhase,
    pub action_policy: NavigationActionPolicy,
    /// Name of the decider that cancelled, if any.
    pub cancelled_by: Option<String>,
}

impl NavigationOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.phase == NavigationPhase::Cancelled
    }
}

/// Lifecycle notifications published by a session on its event bus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationEvent {
    Started {
        session: SessionId,
        id: NavigationId,
        url: String,
        transition: PageTransition,
        kind: NavigationKind,
    },
    Redirected {
        session: SessionId,
        id: NavigationId,
        url: String,
    },
    Finished {
        session: SessionId,
        id: NavigationId,
        url: String,
        status: Option<u16>,
    },
    Cancelled {
        session: SessionId,
        id: NavigationId,
        stage: DecisionStage,
        decider: String,
    },
    SessionDestroyed {
        session: SessionId,
    },
}
