use crate::common::{advance, engine, labels, users_source, ScriptedService};
use selectengine::engine::{SearchReason, SelectProps};
use selectengine::plugin::events::EngineAction;
use serde_json::json;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_dependency_change_fetches_without_debounce() {
    let service = ScriptedService::new(vec![]);
    let props = SelectProps::new(users_source(service.clone())).with_dependency(json!(["p1"]));
    let (engine, events) = engine(props.clone());
    engine.mount();
    advance(10).await;
    let origin = tokio::time::Instant::now();

    engine.set_props(props.with_dependency(json!(["p2"])));
    advance(1).await;

    assert_eq!(service.calls(), 2);
    assert!(service.started_at()[1] - origin < Duration::from_millis(5));
    assert_eq!(events.count(EngineAction::Invalidated), 1);
    assert_eq!(labels(&engine.state().fetch_options), vec!["call2"]);
}

#[tokio::test(start_paused = true)]
async fn test_dependency_change_cancels_pending_search() {
    let service = ScriptedService::new(vec![]);
    let props = SelectProps::new(users_source(service.clone())).with_dependency(json!(["p1"]));
    let (engine, _) = engine(props.clone());
    engine.mount();
    advance(10).await;

    engine.on_search("late", SearchReason::Input);
    engine.set_props(props.with_dependency(json!(["p2"])));
    advance(1000).await;

    assert_eq!(service.calls(), 2);
    assert!(service.params().iter().all(|params| params.get("search").is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_dependency_cleared_to_invalid_triggers_nothing() {
    let service = ScriptedService::new(vec![]);
    let props = SelectProps::new(users_source(service.clone())).with_dependency(json!(["p1"]));
    let (engine, _) = engine(props.clone());
    engine.mount();
    advance(10).await;

    engine.set_props(SelectProps {
        dependency: None,
        ..props
    });
    advance(1000).await;

    assert_eq!(service.calls(), 1);
    assert_eq!(labels(&engine.state().fetch_options), vec!["call1"]);
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_from_old_dependency_is_dropped() {
    let service = ScriptedService::new(vec![
        Some(Duration::ZERO),
        Some(Duration::from_millis(400)),
        Some(Duration::from_millis(50)),
    ]);
    let props = SelectProps {
        is_debounced_fetch: false,
        ..SelectProps::new(users_source(service.clone())).with_dependency(json!(["p1"]))
    };
    let (engine, _) = engine(props.clone());
    engine.mount();
    advance(10).await;

    engine.on_search("slow", SearchReason::Input);
    advance(10).await;
    engine.set_props(props.with_dependency(json!(["p2"])));
    advance(600).await;

    assert_eq!(service.calls(), 3);
    assert_eq!(labels(&engine.state().fetch_options), vec!["call3"]);
}
