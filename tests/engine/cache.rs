use crate::common::{advance, engine_with_cache, labels, users_source, ScriptedService};
use selectengine::engine::SelectProps;
use selectengine::plugin::builtin::SharedCache;
use selectengine::plugin::events::EngineAction;
use std::sync::Arc;
use std::time::Duration;

fn shared_props(service: Arc<ScriptedService>) -> SelectProps {
    SelectProps {
        data_source_share: true,
        cache_key: Some("users".to_string()),
        cache_ttl: Duration::from_millis(1000),
        ..SelectProps::new(users_source(service))
    }
}

#[tokio::test(start_paused = true)]
async fn test_instances_share_one_fetch_within_ttl() {
    let service = ScriptedService::new(vec![]);
    let cache = SharedCache::new();
    let (first, _) = engine_with_cache(shared_props(service.clone()), cache.clone());
    let (second, events) = engine_with_cache(shared_props(service.clone()), cache.clone());

    first.refresh().await;
    advance(500).await;
    second.refresh().await;

    assert_eq!(service.calls(), 1);
    assert_eq!(events.count(EngineAction::CacheHit), 1);
    assert_eq!(labels(&second.state().fetch_options), vec!["call1"]);
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_ttl() {
    let service = ScriptedService::new(vec![]);
    let cache = SharedCache::new();
    let (first, _) = engine_with_cache(shared_props(service.clone()), cache.clone());
    first.refresh().await;
    assert!(cache.contains("users"));

    advance(1100).await;
    assert!(!cache.contains("users"));

    let (second, _) = engine_with_cache(shared_props(service.clone()), cache.clone());
    second.refresh().await;
    assert_eq!(service.calls(), 2);
    assert_eq!(labels(&second.state().fetch_options), vec!["call2"]);
}

#[tokio::test(start_paused = true)]
async fn test_hit_extends_lifetime() {
    let service = ScriptedService::new(vec![]);
    let cache = SharedCache::new();
    let (first, _) = engine_with_cache(shared_props(service.clone()), cache.clone());
    first.refresh().await;

    advance(800).await;
    let (second, _) = engine_with_cache(shared_props(service.clone()), cache.clone());
    second.refresh().await;

    advance(800).await;
    assert!(cache.contains("users"));
    advance(300).await;
    assert!(!cache.contains("users"));
    assert_eq!(service.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unshared_instances_fetch_independently() {
    let service = ScriptedService::new(vec![]);
    let cache = SharedCache::new();
    let props = SelectProps {
        data_source_share: false,
        ..shared_props(service.clone())
    };
    let (first, _) = engine_with_cache(props.clone(), cache.clone());
    let (second, _) = engine_with_cache(props, cache.clone());

    first.refresh().await;
    second.refresh().await;

    assert_eq!(service.calls(), 2);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_destroy_evicts_own_entry() {
    let service = ScriptedService::new(vec![]);
    let cache = SharedCache::new();
    let (first, _) = engine_with_cache(shared_props(service.clone()), cache.clone());
    first.refresh().await;
    assert!(cache.contains("users"));

    first.destroy();
    assert!(!cache.contains("users"));
}
