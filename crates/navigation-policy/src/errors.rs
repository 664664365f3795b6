use thiserror::Error;
use webstate_core_types::{CoreError, NavigationId};

use crate::events::NavigationPhase;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("session {0} has been destroyed")]
    SessionDestroyed(String),
    #[error("unknown navigation: {0}")]
    UnknownNavigation(NavigationId),
    #[error("navigation {id} cannot {action} while {phase:?}")]
    InvalidTransition {
        id: NavigationId,
        action: &'static str,
        phase: NavigationPhase,
    },
    #[error("policy deciders are being traversed")]
    DeciderBusy,
    #[error("unknown policy decider: {0}")]
    UnknownDecider(u64),
    #[error("invalid policy: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("unsupported policy path: {0}")]
    UnsupportedPath(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

pub type PolicyResult<T> = Result<T, PolicyError>;

impl From<PolicyError> for CoreError {
    fn from(value: PolicyError) -> Self {
        CoreError::new(value.to_string())
    }
}
