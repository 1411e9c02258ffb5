//! Tests for forwarding and routing state accessors

use dispatchloop::{Dispatcher, Forward, ParamKey};
use serde_json::json;

#[test]
fn test_forward_snapshots_previous_target() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.set_action_name("index");

    dispatcher.forward(Forward::default().action("x")).unwrap();

    assert_eq!(dispatcher.previous_action_name(), Some("index"));
    assert_eq!(dispatcher.action_name(), Some("x"));
    assert_eq!(dispatcher.handler_name(), None);
    assert_eq!(dispatcher.namespace_name(), None);
    assert!(!dispatcher.is_finished());
    assert!(dispatcher.was_forwarded());
}

#[test]
fn test_forward_keeps_omitted_fields() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .set_namespace_name("App")
        .set_task_name("posts")
        .set_action_name("index")
        .set_params(json!([1]));

    dispatcher
        .forward(Forward::default().namespace("Admin").params(json!({ "id": 3 })))
        .unwrap();

    assert_eq!(dispatcher.namespace_name(), Some("Admin"));
    assert_eq!(dispatcher.previous_namespace_name(), Some("App"));
    assert_eq!(dispatcher.task_name(), Some("posts"));
    assert_eq!(dispatcher.previous_task_name(), Some("posts"));
    assert_eq!(dispatcher.action_name(), Some("index"));
    assert_eq!(dispatcher.get_param("id"), Some(&json!(3)));
}

#[test]
fn test_forward_parsed_from_map() {
    let fwd: Forward = serde_json::from_value(json!({
        "task": "users",
        "action": "show",
        "params": [5],
    }))
    .unwrap();

    let mut dispatcher = Dispatcher::new();
    dispatcher.forward(fwd).unwrap();

    assert_eq!(dispatcher.handler_name(), Some("users"));
    assert_eq!(dispatcher.action_name(), Some("show"));
    assert_eq!(dispatcher.get_param(0_usize), Some(&json!(5)));
}

#[test]
fn test_param_accessors() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.set_params(json!(["a", "b"]));

    assert_eq!(dispatcher.get_param(1_usize), Some(&json!("b")));
    assert_eq!(dispatcher.get_param("1"), Some(&json!("b")));
    assert!(!dispatcher.has_param(2_usize));
    assert_eq!(dispatcher.get_param_or("name", json!("anon")), json!("anon"));

    dispatcher.set_param("name", json!("bob"));
    assert_eq!(dispatcher.get_param("name"), Some(&json!("bob")));
    assert_eq!(dispatcher.get_param(ParamKey::Index(0)), Some(&json!("a")));
    assert!(dispatcher.params().is_object());
}

#[test]
fn test_option_accessors() {
    let mut dispatcher = Dispatcher::new();
    let mut options = serde_json::Map::new();
    options.insert("verbose".to_string(), json!(true));
    dispatcher.set_options(options);

    assert!(dispatcher.has_option("verbose"));
    assert_eq!(dispatcher.get_option("verbose"), Some(&json!(true)));
    assert!(!dispatcher.has_option("quiet"));
}
