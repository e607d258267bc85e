mod common;

use std::sync::Arc;

use docrest_api::store::MemoryStore;
use docrest_api::{build_app, AppConfig, ConfigError, ServiceDefinition};

fn install(yaml: &str) -> Result<axum::Router, ConfigError> {
    let definition = ServiceDefinition::from_yaml_str(yaml)?;
    build_app(&AppConfig::default(), definition, Arc::new(MemoryStore::new()))
}

#[test]
fn sample_definition_installs() {
    assert!(install(common::SERVICE_YAML).is_ok());
}

#[test]
fn limit_without_order_fails_before_serving() {
    let err = install(
        r#"
collections:
  users: { documentAttributes: [name] }
actions:
  - collection: users
    endpoint: /users/first
    request:
      type: GET
      query: { limit: 1, orderBy: name }
"#,
    )
    .err()
    .expect("installation must fail");

    assert!(matches!(err, ConfigError::LimitWithoutOrder(ref e) if e == "/users/first"));
}

#[test]
fn collection_without_attributes_fails_before_serving() {
    let err = install(
        r#"
collections:
  users: { documentAttributes: [name] }
  posts: {}
actions: []
"#,
    )
    .err()
    .expect("installation must fail");

    assert_eq!(err.to_string(), "You must provide documentAttributes for collection posts");
}

#[test]
fn unknown_verb_fails_before_serving() {
    let err = install(
        r#"
collections:
  users: { documentAttributes: [name] }
actions:
  - { collection: users, endpoint: /users, request: { type: OPTIONS } }
"#,
    )
    .err()
    .expect("installation must fail");

    assert_eq!(err.to_string(), "Unknown request type: OPTIONS");
}

#[test]
fn route_table_lists_templates() {
    let definition = ServiceDefinition::from_yaml_str(common::SERVICE_YAML).unwrap();
    let service = docrest_api::Service::with_store(definition, Arc::new(MemoryStore::new())).unwrap();
    let routes = service.routes(&AppConfig::default()).unwrap();

    let handlers: Vec<_> = routes.iter().map(|r| (r.verb.as_str(), r.endpoint.as_str(), r.handler.as_str())).collect();
    assert_eq!(handlers[0], ("GET", "/users", "collection-scan"));
    assert_eq!(handlers[1], ("GET", "/users/:id", "point-lookup"));
    assert_eq!(handlers[2], ("POST", "/users", "create"));
    assert_eq!(handlers[9], ("GET", "/scores/city/:city", "param-query"));
}
