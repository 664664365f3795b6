use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::Args;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;
use webstate_core_types::{
    PageTransition, RequestDescriptor, RequestInfo, ResponseDescriptor, SessionId,
};
use webstate_event_bus::InMemoryBus;
use webstate_navigation_policy::deciders::{
    ChangePasswordDecider, ResourceProbe, UrlBlocklistDecider,
};
use webstate_navigation_policy::{
    load_config as load_policy, NavigationEvent, NavigationKind, NavigationPhase, WebStateSession,
};

use crate::bridge::record_navigation_breadcrumbs;
use crate::cli::breadcrumbs::StoredLog;
use crate::config::AppConfig;

const BUS_CAPACITY: usize = 64;

#[derive(Args, Clone, Debug)]
pub struct NavigateArgs {
    /// Destination URL
    pub url: String,

    /// Page transition, e.g. `typed` or `link|from_address_bar`
    #[arg(long, default_value = "link")]
    pub transition: String,

    /// Navigate a subframe instead of the main frame. Subframe transitions
    /// such as `auto_subframe` imply it.
    #[arg(long)]
    pub subframe: bool,

    /// Mark the navigation as user initiated
    #[arg(long)]
    pub gesture: bool,

    /// Status code of the simulated response
    #[arg(long, default_value_t = 200)]
    pub status: u16,

    /// Status the simulated server answers to resource probes
    #[arg(long)]
    pub probe_status: Option<u16>,
}

/// Answers every probe with a fixed status.
struct SimulatedProbe(Option<u16>);

#[async_trait]
impl ResourceProbe for SimulatedProbe {
    async fn status(&self, url: &Url) -> Option<u16> {
        debug!(url = %url, status = ?self.0, "simulated probe");
        self.0
    }
}

pub async fn cmd_navigate(args: NavigateArgs, config: &AppConfig) -> Result<()> {
    let url = Url::parse(&args.url).with_context(|| format!("Invalid URL: {}", args.url))?;
    let transition: PageTransition = args
        .transition
        .parse()
        .map_err(|err| anyhow!("Invalid transition '{}': {err}", args.transition))?;
    let policy =
        load_policy(config.policy_path.as_deref()).context("Failed to load navigation policy")?;

    let stored = StoredLog::open(config)?;
    let bus = InMemoryBus::<NavigationEvent>::new(BUS_CAPACITY);
    let bridge = record_navigation_breadcrumbs(bus.clone(), stored.log());
    debug!(subscribers = bus.subscriber_count(), "navigation bus ready");

    let change_password_enabled = policy.change_password.enabled;
    let session = WebStateSession::new(SessionId::new(), policy, bus);
    session.add_policy_decider(Arc::new(UrlBlocklistDecider::new(
        &session.config().blocklist,
    )))?;
    let (redirect_tx, mut redirect_rx) = mpsc::unbounded_channel();
    if change_password_enabled {
        session.add_policy_decider(Arc::new(ChangePasswordDecider::new(
            Arc::new(SimulatedProbe(args.probe_status)),
            redirect_tx,
        )))?;
    } else {
        drop(redirect_tx);
    }

    let main_frame = !args.subframe && transition.is_main_frame();
    let request_info = RequestInfo::new(transition, main_frame, args.gesture);
    let mut outcome = session.start_navigation(
        RequestDescriptor::get(url.clone()),
        request_info,
        NavigationKind::Regular,
    )?;
    if outcome.phase == NavigationPhase::RequestAllowed {
        outcome = session
            .receive_response(
                outcome.id,
                ResponseDescriptor::new(url.clone(), args.status),
                main_frame,
            )
            .await?;
    }
    info!(session = %session.id(), navigation = %outcome.id, phase = ?outcome.phase, "navigation finished");

    session.destroy();
    drop(session);
    let recorded = bridge.await.context("Breadcrumb bridge task failed")?;
    let redirect = redirect_rx.recv().await.map(|url| url.to_string());
    stored.persist()?;

    let payload = json!({
        "url": url.as_str(),
        "outcome": outcome,
        "redirect": redirect,
        "breadcrumbs_recorded": recorded,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
