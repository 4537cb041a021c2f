use crate::common::{advance, engine, users_fixture, users_source, ScriptedService};
use selectengine::engine::{SearchReason, SelectProps};
use selectengine::plugin::builtin::ScrollMetrics;
use selectengine::source::option::{OptionValue, SelectValue};
use selectengine::state::EngineState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_in_flight_response_after_destroy_is_ignored() {
    let service = ScriptedService::new(vec![Some(Duration::from_millis(500))]);
    let changes = Arc::new(AtomicUsize::new(0));
    let option_changes = changes.clone();
    let (engine, _) = engine(
        SelectProps::new(users_source(service.clone()))
            .with_on_options_change(move |_| {
                option_changes.fetch_add(1, Ordering::SeqCst);
            }),
    );
    let notified = Arc::new(AtomicUsize::new(0));
    let listener_count = notified.clone();
    let _subscription = engine.subscribe(Arc::new(move |_: &EngineState| {
        listener_count.fetch_add(1, Ordering::SeqCst);
    }));

    engine.mount();
    advance(100).await;
    assert_eq!(service.calls(), 1);

    engine.destroy();
    let notified_at_destroy = notified.load(Ordering::SeqCst);
    advance(1000).await;

    assert_eq!(notified.load(Ordering::SeqCst), notified_at_destroy);
    assert_eq!(changes.load(Ordering::SeqCst), 0);
    assert!(engine.state().fetch_options.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_host_events_after_destroy_are_no_ops() {
    let service = users_fixture(3);
    let (engine, _) = engine(SelectProps::new(users_source(service.clone())));
    engine.destroy();

    engine.mount();
    engine.set_props(SelectProps::new(users_source(service.clone())));
    engine.on_search("user", SearchReason::Input);
    engine.handle_visible_change(true);
    engine.handle_change(Some(SelectValue::Single(OptionValue::Int(1))));
    engine.handle_clear(true);
    assert!(!engine.popup_scroll_handler(ScrollMetrics::new(100.0, 100.0, 200.0)));
    assert!(!engine.resolve_value());
    engine.search("user").await;
    engine.paste("1,2").await;
    advance(1000).await;

    assert_eq!(service.call_count(), 0);
    assert!(engine.view().final_options.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_destroy_twice_and_drop_are_safe() {
    let service = users_fixture(3);
    let (engine, _) = engine(SelectProps::new(users_source(service)));
    engine.refresh().await;

    engine.destroy();
    engine.destroy();
    assert!(engine.is_destroyed());
    drop(engine);
}
