//! Navigation policy deciders and the session host that consults them.

pub mod decider;
pub mod deciders;
pub mod decision;
pub mod defaults;
pub mod errors;
pub mod events;
pub mod loader;
pub mod model;
pub mod session;

pub use decider::NavigationPolicyDecider;
pub use decision::{
    allow_navigation_action_policy, NavigationActionPolicy, PolicyDecision, ResponseReply,
};
pub use defaults::default_config;
pub use errors::{PolicyError, PolicyResult};
pub use events::{
    DecisionStage, NavigationEvent, NavigationKind, NavigationOutcome, NavigationPhase,
};
pub use loader::{load_config, load_config_with_options, LoadOptions};
pub use model::{BlocklistPolicy, NavigationPolicyConfig, PolicySource};
pub use session::{DeciderId, WebStateSession};
