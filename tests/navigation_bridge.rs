use std::sync::Arc;

use chrono::{TimeZone, Utc};
use webstate_breadcrumbs::{BreadcrumbLog, BreadcrumbPolicyView, ManualClock};
use webstate_cli::record_navigation_breadcrumbs;
use webstate_core_types::{
    PageTransition, RequestDescriptor, RequestInfo, ResponseDescriptor, SessionId, TransitionCore,
};
use webstate_event_bus::{EventBus, InMemoryBus};
use webstate_navigation_policy::deciders::UrlBlocklistDecider;
use webstate_navigation_policy::{
    default_config, NavigationEvent, NavigationKind, NavigationPhase, WebStateSession,
};

fn url(raw: &str) -> url::Url {
    url::Url::parse(raw).unwrap()
}

#[tokio::test]
async fn navigation_lifecycle_is_recorded_in_order() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ));
    let log = BreadcrumbLog::with_clock(BreadcrumbPolicyView::default(), clock.clone()).shared();
    let bus: Arc<dyn EventBus<NavigationEvent>> = InMemoryBus::<NavigationEvent>::new(32);
    let bridge = record_navigation_breadcrumbs(Arc::clone(&bus), Arc::clone(&log));

    let mut config = default_config();
    config.blocklist.hosts.push("tracker.example".into());
    let session = WebStateSession::new(SessionId("tab1".into()), config, Arc::clone(&bus));
    drop(bus);
    session
        .add_policy_decider(Arc::new(UrlBlocklistDecider::new(&session.config().blocklist)))
        .unwrap();

    let first = session
        .start_navigation(
            RequestDescriptor::get(url("https://news.example/")),
            RequestInfo::main_frame(PageTransition::new(TransitionCore::Typed)),
            NavigationKind::Regular,
        )
        .unwrap();
    session
        .redirect_navigation(
            first.id,
            RequestDescriptor::get(url("https://news.example/home?session=secret")),
        )
        .unwrap();
    let committed = session
        .receive_response(
            first.id,
            ResponseDescriptor::new(url("https://news.example/home"), 200),
            true,
        )
        .await
        .unwrap();
    assert_eq!(committed.phase, NavigationPhase::Committed);

    let blocked = session
        .start_navigation(
            RequestDescriptor::get(url("https://tracker.example/pixel")),
            RequestInfo::new(PageTransition::new(TransitionCore::AutoSubframe), false, false),
            NavigationKind::Regular,
        )
        .unwrap();
    assert!(blocked.is_cancelled());

    session
        .start_navigation(
            RequestDescriptor::get(url("https://news.example/home#top")),
            RequestInfo::main_frame(PageTransition::new(TransitionCore::Link)),
            NavigationKind::SameDocumentStateChange,
        )
        .unwrap();

    session.destroy();
    drop(session);
    let recorded = bridge.await.unwrap();
    assert_eq!(recorded, 6);

    let events = log.lock().events(0);
    assert_eq!(
        events,
        vec![
            "0:00:00 Sessiontab1 StartNav1 typed",
            "0:00:00 RedirectNav1 https://news.example/home",
            "0:00:00 FinishNav1 200",
            "0:00:00 CancelNav2 by url_blocklist at request",
            "0:00:00 Sessiontab1 SameDocNav3 link",
            "0:00:00 Sessiontab1 Destroyed",
        ]
    );
}

#[tokio::test]
async fn bridge_stops_when_bus_is_dropped() {
    let log = BreadcrumbLog::new(BreadcrumbPolicyView::default()).shared();
    let bus = InMemoryBus::<NavigationEvent>::new(4);
    let bridge = record_navigation_breadcrumbs(bus.clone(), Arc::clone(&log));
    assert_eq!(bus.subscriber_count(), 1);
    drop(bus);
    assert_eq!(bridge.await.unwrap(), 0);
    assert_eq!(log.lock().event_count(), 0);
}
