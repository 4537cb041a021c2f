use crate::common::{advance, engine, labels, users_fixture, users_source, ScriptedService};
use selectengine::engine::{PageRequest, SelectProps};
use selectengine::plugin::builtin::ScrollMetrics;
use selectengine::plugin::events::EngineAction;
use std::time::Duration;

fn paged_props(service: std::sync::Arc<selectengine::source::fixture::FixtureService>) -> SelectProps {
    SelectProps {
        is_scroll_fetching: true,
        page_req: PageRequest { limit: 2 },
        ..SelectProps::new(users_source(service))
    }
}

#[tokio::test(start_paused = true)]
async fn test_short_page_stops_loading_more() {
    let service = users_fixture(5);
    let (engine, _) = engine(paged_props(service.clone()));

    engine.refresh().await;
    assert_eq!(labels(&engine.state().fetch_options), vec!["user1", "user2"]);
    assert!(engine.state().can_trigger_load_more);

    assert!(engine.load_more().await);
    assert!(engine.load_more().await);
    let state = engine.state();
    assert_eq!(state.fetch_options.len(), 5);
    assert_eq!(state.skip, 4);
    assert!(!state.can_trigger_load_more);

    assert!(!engine.load_more().await);
    assert_eq!(service.call_count(), 3);

    let skips: Vec<_> = service
        .calls()
        .iter()
        .map(|(_, params)| params["skip"].as_u64())
        .collect();
    assert_eq!(skips, vec![Some(0), Some(2), Some(4)]);
}

#[tokio::test(start_paused = true)]
async fn test_scroll_near_bottom_loads_next_page_once() {
    let service = users_fixture(5);
    let (engine, events) = engine(paged_props(service.clone()));
    engine.refresh().await;
    engine.handle_visible_change(true);

    let bottom = ScrollMetrics::new(195.0, 100.0, 300.0);
    assert!(engine.popup_scroll_handler(bottom));
    assert!(engine.popup_scroll_handler(bottom));
    advance(400).await;

    assert_eq!(service.call_count(), 2);
    assert_eq!(events.count(EngineAction::LoadMore), 2);
    assert_eq!(
        labels(&engine.state().fetch_options),
        vec!["user1", "user2", "user3", "user4"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_scroll_far_from_bottom_is_ignored() {
    let service = users_fixture(5);
    let (engine, _) = engine(paged_props(service.clone()));
    engine.refresh().await;

    assert!(!engine.popup_scroll_handler(ScrollMetrics::new(0.0, 100.0, 300.0)));
    advance(400).await;
    assert_eq!(service.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_closing_dropdown_resets_paging() {
    let service = users_fixture(5);
    let (engine, _) = engine(paged_props(service));
    engine.refresh().await;
    engine.handle_visible_change(true);
    engine.load_more().await;
    assert_eq!(engine.state().fetch_options.len(), 4);

    engine.handle_visible_change(false);

    let state = engine.state();
    assert!(!state.visible);
    assert_eq!(state.skip, 0);
    assert!(state.can_trigger_load_more);
    assert_eq!(labels(&state.fetch_options), vec!["user1", "user2"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_page_is_requested_again() {
    let service = ScriptedService::new(vec![Some(Duration::ZERO), None, Some(Duration::ZERO)]);
    let (engine, events) = engine(SelectProps {
        is_scroll_fetching: true,
        page_req: PageRequest { limit: 1 },
        ..SelectProps::new(users_source(service.clone()))
    });

    engine.refresh().await;
    assert_eq!(labels(&engine.state().fetch_options), vec!["call1"]);

    assert!(engine.load_more().await);
    assert_eq!(events.count(EngineAction::SearchFailed), 1);
    let state = engine.state();
    assert_eq!(state.skip, 0);
    assert_eq!(labels(&state.fetch_options), vec!["call1"]);
    assert!(state.can_trigger_load_more);

    assert!(engine.load_more().await);
    let skips: Vec<_> = service
        .params()
        .iter()
        .map(|params| params["skip"].as_u64())
        .collect();
    assert_eq!(skips, vec![Some(0), Some(1), Some(1)]);
    let state = engine.state();
    assert_eq!(state.skip, 1);
    assert_eq!(labels(&state.fetch_options), vec!["call1", "call3"]);
}
