use crate::common::{advance, engine, labels};
use selectengine::engine::{SelectMode, SelectProps};
use selectengine::source::descriptor::{DataSource, ServiceDescriptor};
use selectengine::source::fixture::FixtureService;
use selectengine::source::option::{OptionConfig, OptionValue, SelectValue};
use selectengine::state::EngineState;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn list_users(records: Vec<Value>) -> Arc<FixtureService> {
    Arc::new(FixtureService::new().with_method("listUsers", records))
}

fn descriptor(service: Arc<FixtureService>, payload: Value) -> DataSource {
    let payload = payload.as_object().cloned().unwrap_or_default();
    DataSource::Service(
        ServiceDescriptor::new(service, "listUsers")
            .with_payload(payload)
            .with_response_entity_key("data")
            .with_option_config(OptionConfig::new("id", "name")),
    )
}

#[tokio::test(start_paused = true)]
async fn test_list_users_maps_records_to_options() {
    let service = list_users(vec![json!({"id": 1, "name": "A"}), json!({"id": 2, "name": "B"})]);
    let (engine, _) = engine(SelectProps::new(descriptor(service, json!({}))));

    engine.refresh().await;

    let pairs: Vec<(String, OptionValue)> = engine
        .view()
        .final_options
        .into_iter()
        .map(|option| (option.label, option.value))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("A".to_string(), OptionValue::Int(1)),
            ("B".to_string(), OptionValue::Int(2)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_dependency_switch_never_mixes_stale_and_new_options() {
    let mut records: Vec<Value> = (1..=10)
        .map(|i| json!({"id": i, "name": format!("p1-{}", i), "parent": "p1"}))
        .collect();
    records.extend((11..=13).map(|i| json!({"id": i, "name": format!("p2-{}", i), "parent": "p2"})));
    let service = Arc::new(
        FixtureService::new()
            .with_method("listUsers", records)
            .with_latency(Duration::from_millis(50)),
    );

    let p1 = SelectProps::new(descriptor(service.clone(), json!({"parent": "p1"})))
        .with_dependency(json!(["p1"]));
    let (engine, _) = engine(p1);
    engine.mount();
    advance(100).await;
    assert_eq!(engine.state().fetch_options.len(), 10);

    let renders = Arc::new(Mutex::new(Vec::new()));
    let seen = renders.clone();
    let _subscription = engine.subscribe(Arc::new(move |state: &EngineState| {
        seen.lock().unwrap().push(labels(&state.fetch_options));
    }));

    let p2 = SelectProps::new(descriptor(service.clone(), json!({"parent": "p2"})))
        .with_dependency(json!(["p2"]));
    engine.set_props(p2);

    let state = engine.state();
    assert!(state.fetch_options.is_empty());
    assert!(state.loading);

    advance(100).await;
    assert_eq!(
        labels(&engine.state().fetch_options),
        vec!["p2-11", "p2-12", "p2-13"]
    );

    let renders = renders.lock().unwrap();
    assert!(!renders.is_empty());
    assert!(renders[0].is_empty());
    for render in renders.iter() {
        let stale = render.iter().any(|label| label.starts_with("p1-"));
        let fresh = render.iter().any(|label| label.starts_with("p2-"));
        assert!(!(stale && fresh), "mixed render: {:?}", render);
        assert!(!stale, "stale render after switch: {:?}", render);
    }
}

#[tokio::test(start_paused = true)]
async fn test_paste_selects_matching_options() {
    let service = list_users((1..=5).map(|i| json!({"id": i, "name": format!("user{}", i)})).collect());
    let selected = Arc::new(Mutex::new(None));
    let sink = selected.clone();
    let props = SelectProps {
        paste_value_key: Some("id".to_string()),
        mode: SelectMode::Multiple,
        ..SelectProps::new(descriptor(service.clone(), json!({})))
    }
    .with_on_change(move |value, _| {
        *sink.lock().unwrap() = value.cloned();
    });
    let (engine, _) = engine(props);

    let tokens = engine.paste("2, 4\n9").await;

    assert_eq!(tokens, vec!["2", "4", "9"]);
    assert_eq!(service.calls()[0].1, json!({"id": ["2", "4", "9"]}));
    assert_eq!(
        *selected.lock().unwrap(),
        Some(SelectValue::Multiple(vec![OptionValue::Int(2), OptionValue::Int(4)]))
    );
}

#[tokio::test(start_paused = true)]
async fn test_value_without_option_is_echoed() {
    let service = list_users(vec![json!({"id": 1, "name": "A"})]);
    let props = SelectProps::new(descriptor(service, json!({})))
        .with_value(SelectValue::Single(OptionValue::from("7")));
    let (engine, _) = engine(props);

    engine.refresh().await;
    let view = engine.view();

    assert_eq!(view.final_value, Some(SelectValue::Single(OptionValue::Int(7))));
    assert_eq!(labels(&view.final_options), vec!["A", "7"]);
}
