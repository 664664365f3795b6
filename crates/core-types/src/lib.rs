use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use url::Url;
use uuid::Uuid;

mod transition;

pub use transition::{PageTransition, TransitionCore};

/// Shared error type for the webstate crates.
#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("{message}")]
    Message { message: String },
}

impl CoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a navigation within one session. Allocated in increasing order.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NavigationId(pub u64);

impl fmt::Display for NavigationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request metadata handed to policy deciders. The host never inspects it.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestDescriptor {
    pub url: Url,
    pub method: String,
    pub headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: "GET".into(),
            headers: BTreeMap::new(),
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResponseDescriptor {
    pub url: Url,
    pub status: u16,
    pub mime_type: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl ResponseDescriptor {
    pub fn new(url: Url, status: u16) -> Self {
        Self {
            url,
            status,
            mime_type: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Additional information about a navigation request.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RequestInfo {
    pub transition: PageTransition,
    /// Whether the navigation targets the main frame.
    pub target_frame_is_main: bool,
    /// Whether there was a recent user interaction with the request frame.
    pub has_user_gesture: bool,
}

impl RequestInfo {
    pub fn new(transition: PageTransition, target_frame_is_main: bool, has_user_gesture: bool) -> Self {
        Self {
            transition,
            target_frame_is_main,
            has_user_gesture,
        }
    }

    pub fn main_frame(transition: PageTransition) -> Self {
        Self::new(transition, true, false)
    }
}
