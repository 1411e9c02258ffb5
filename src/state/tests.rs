use super::{DispatchState, Forward, ParamKey};
use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::handler::{SharedHandler, TaskHandler};
use serde_json::json;

#[test]
fn test_forward_snapshots_previous_triad() {
    let mut state = DispatchState::new();
    state.action_name = Some("index".into());

    state.forward(Forward::default().action("x")).unwrap();

    assert_eq!(state.previous_action_name(), Some("index"));
    assert_eq!(state.action_name(), Some("x"));
    assert_eq!(state.handler_name(), None);
    assert_eq!(state.namespace_name(), None);
    assert!(!state.is_finished());
    assert!(state.was_forwarded());
}

#[test]
fn test_forward_keeps_omitted_fields() {
    let mut state = DispatchState::new();
    state.namespace_name = Some("App".into());
    state.handler_name = Some("posts".into());
    state.action_name = Some("index".into());
    state.params = json!([1, 2]);

    state
        .forward(Forward::default().task("users").params(json!({"id": 7})))
        .unwrap();

    assert_eq!(state.namespace_name(), Some("App"));
    assert_eq!(state.handler_name(), Some("users"));
    assert_eq!(state.action_name(), Some("index"));
    assert_eq!(state.params(), &json!({"id": 7}));
    assert_eq!(state.previous_handler_name(), Some("posts"));
    assert_eq!(state.previous_namespace_name(), Some("App"));
}

#[test]
fn test_forward_during_initialization_leaves_state_untouched() {
    let mut state = DispatchState::new();
    state.handler_name = Some("posts".into());
    state.action_name = Some("index".into());
    state.finished = true;
    state.is_initializing = true;

    let err = state
        .forward(Forward::default().action("other"))
        .unwrap_err();

    assert!(matches!(err, DispatchError::ForwardDuringInitialization));
    assert_eq!(state.action_name(), Some("index"));
    assert_eq!(state.previous_action_name(), None);
    assert!(state.is_finished());
    assert!(!state.was_forwarded());
}

#[test]
fn test_resolve_defaults_fills_only_unset_fields() {
    let config = DispatcherConfig {
        default_namespace: Some("App::Tasks".into()),
        ..DispatcherConfig::default()
    };
    let mut state = DispatchState::new();
    state.handler_name = Some("posts".into());
    state.action_name = Some(String::new());

    state.resolve_defaults(&config);

    assert_eq!(state.namespace_name(), Some("App::Tasks"));
    assert_eq!(state.handler_name(), Some("posts"));
    assert_eq!(state.action_name(), Some("main"));
}

#[test]
fn test_resolve_defaults_never_overwrites_set_namespace() {
    let config = DispatcherConfig {
        default_namespace: Some("Default".into()),
        ..DispatcherConfig::default()
    };
    let mut state = DispatchState::new();
    state.namespace_name = Some("Custom".into());

    state.resolve_defaults(&config);

    assert_eq!(state.namespace_name(), Some("Custom"));
}

#[test]
fn test_reset_keeps_target_and_tracker() {
    let mut state = DispatchState::new();
    let handler = SharedHandler::new(TaskHandler::new("posts"));
    state.handler_name = Some("posts".into());
    state.forward(Forward::default().action("list")).unwrap();
    state.returned_value = json!("ok");
    assert!(state.track_handler(&handler));

    state.reset_for_dispatch();

    assert!(!state.was_forwarded());
    assert_eq!(state.previous_action_name(), None);
    assert_eq!(state.returned_value(), &serde_json::Value::Null);
    assert_eq!(state.action_name(), Some("list"));
    assert!(state.is_tracked(&handler));
    assert!(!state.track_handler(&handler));
}

#[test]
fn test_param_lookup_by_index_and_name() {
    let mut state = DispatchState::new();
    state.params = json!([10, 20]);
    assert_eq!(state.param(&ParamKey::Index(1)), Some(&json!(20)));
    assert_eq!(state.param(&"0".into()), Some(&json!(10)));

    state.params = json!({"id": 5});
    assert_eq!(state.param(&"id".into()), Some(&json!(5)));
    assert_eq!(state.param(&ParamKey::Index(0)), None);
}

#[test]
fn test_set_param_promotes_positional_to_keyed() {
    let mut state = DispatchState::new();
    state.params = json!([10]);
    state.set_param(ParamKey::Index(1), json!(20));
    assert_eq!(state.params(), &json!([10, 20]));

    state.set_param("verbose".into(), json!(true));
    assert_eq!(state.params(), &json!({"0": 10, "1": 20, "verbose": true}));
}

#[test]
fn test_tracker_matches_clones_and_forgets_dropped_instances() {
    let mut state = DispatchState::new();
    let first = SharedHandler::new(TaskHandler::new("posts"));
    let same = SharedHandler::from_arc(std::sync::Arc::clone(first.as_arc()));

    assert!(state.track_handler(&first));
    assert!(!state.track_handler(&same));
    assert_eq!(state.tracked_handlers(), 1);

    drop(first);
    drop(same);
    assert_eq!(state.tracked_handlers(), 0);

    let fresh = SharedHandler::new(TaskHandler::new("posts"));
    assert!(state.track_handler(&fresh));
}
