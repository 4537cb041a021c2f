use crate::common::{advance, engine, labels, users_fixture, users_source, ScriptedService};
use selectengine::engine::{SearchReason, SelectProps};
use selectengine::plugin::events::EngineAction;
use selectengine::source::descriptor::{DataSource, FunctionDescriptor};
use selectengine::source::option::SelectOption;
use serde_json::json;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_typing_burst_issues_one_call() {
    let service = ScriptedService::new(vec![]);
    let (engine, _) = engine(SelectProps::new(users_source(service.clone())));

    for text in ["a", "al", "ali"] {
        engine.on_search(text, SearchReason::Input);
        advance(100).await;
    }
    assert_eq!(service.calls(), 0);

    advance(300).await;
    assert_eq!(service.calls(), 1);
    assert_eq!(service.params()[0], json!({"search": "ali"}));
    assert_eq!(labels(&engine.state().fetch_options), vec!["call1"]);
}

#[tokio::test(start_paused = true)]
async fn test_only_latest_response_applies() {
    let service = ScriptedService::new(vec![
        Some(Duration::from_millis(300)),
        Some(Duration::from_millis(50)),
        Some(Duration::from_millis(100)),
    ]);
    let (engine, events) = engine(SelectProps {
        is_debounced_fetch: false,
        ..SelectProps::new(users_source(service.clone()))
    });

    for text in ["a", "b", "c"] {
        engine.on_search(text, SearchReason::Input);
        advance(10).await;
    }
    advance(500).await;

    assert_eq!(service.calls(), 3);
    assert_eq!(events.count(EngineAction::SearchApplied), 1);
    assert_eq!(events.count(EngineAction::SearchDiscarded), 2);
    let state = engine.state();
    assert_eq!(labels(&state.fetch_options), vec!["call3"]);
    assert!(!state.loading);
    assert!(!state.fetching);
}

#[tokio::test(start_paused = true)]
async fn test_blur_restores_baseline_and_drops_pending_search() {
    let service = users_fixture(5);
    let (engine, _) = engine(SelectProps::new(users_source(service.clone())));
    engine.refresh().await;

    engine.on_search("user2", SearchReason::Input);
    engine.on_search("", SearchReason::Blur);
    advance(500).await;

    let state = engine.state();
    assert_eq!(service.call_count(), 1);
    assert_eq!(state.fetch_options.len(), 5);
    assert_eq!(state.search_value, "");
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_keeps_options() {
    let service = ScriptedService::new(vec![Some(Duration::ZERO), None]);
    let (engine, events) = engine(SelectProps::new(users_source(service.clone())));
    engine.refresh().await;

    engine.search("x").await;

    let state = engine.state();
    assert_eq!(labels(&state.fetch_options), vec!["call1"]);
    assert!(!state.loading);
    assert_eq!(events.count(EngineAction::SearchFailed), 1);
}

#[tokio::test(start_paused = true)]
async fn test_remote_search_key_names_the_param() {
    let service = ScriptedService::new(vec![]);
    let (engine, _) = engine(SelectProps {
        remote_search_key: Some("name".to_string()),
        ..SelectProps::new(users_source(service.clone()))
    });

    engine.search("bo").await;
    assert_eq!(service.params()[0], json!({"name": "bo"}));
}

fn delayed_source(name: &'static str, latency: u64) -> DataSource {
    DataSource::Function(FunctionDescriptor::new(name, move |_| async move {
        tokio::time::sleep(Duration::from_millis(latency)).await;
        Ok(vec![SelectOption::new(name, 1)])
    }))
}

#[tokio::test(start_paused = true)]
async fn test_source_swap_drops_in_flight_result() {
    let (engine, _) = engine(SelectProps::new(delayed_source("fnA", 500)));
    engine.mount();
    advance(10).await;
    assert!(engine.state().fetching);

    engine.set_props(SelectProps::new(delayed_source("fnB", 50)));
    advance(1000).await;

    let state = engine.state();
    assert_eq!(labels(&state.fetch_options), vec!["fnB"]);
    assert_eq!(state.last_data_source_api.as_deref(), Some("fn:fnB"));
    assert!(!state.loading);
    assert!(!state.fetching);
}
