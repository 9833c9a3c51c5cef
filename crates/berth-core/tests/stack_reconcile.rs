//! Tests for stack create/update reconciliation.

mod support;

use berth_core::config::DeployMode;
use berth_core::error::{DeployError, ResourceKind, Stage};
use berth_core::release::ReleaseTag;
use berth_core::stack::{ComposeEnvironment, StackOutcome, StackReconciler};
use mockito::{Matcher, Server};
use serde_json::json;

const COMPOSE: &str = "services:\n  web:\n    image: registry.example.com/web:${RELEASE_TAG}\n";

fn env() -> ComposeEnvironment {
    let tag = ReleaseTag::new("main", "cafebabe1234").unwrap();
    ComposeEnvironment::build(&tag, "", "web", &[("A".to_string(), "1".to_string())])
}

fn env_json() -> serde_json::Value {
    json!([
        {"name": "RELEASE_TAG", "value": "main-cafebabe"},
        {"name": "URL_PREFIX", "value": ""},
        {"name": "STACK_NAME", "value": "web"},
        {"name": "A", "value": "1"}
    ])
}

fn any_stack_update() -> Matcher {
    Matcher::Regex(r"^/api/stacks/\d+$".to_string())
}

#[tokio::test]
async fn existing_stack_is_updated_in_place() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/stacks")
        .match_header("authorization", support::bearer().as_str())
        .with_status(200)
        .with_body(r#"[{"Id": 3, "Name": "api"}, {"Id": 7, "Name": "web"}]"#)
        .create_async()
        .await;
    let update = server
        .mock("PUT", "/api/stacks/7")
        .match_query(Matcher::UrlEncoded("endpointId".into(), "1".into()))
        .match_header("authorization", support::bearer().as_str())
        .match_body(Matcher::Json(json!({
            "StackFileContent": COMPOSE,
            "Env": env_json(),
            "Prune": true,
            "PullImage": true
        })))
        .with_status(200)
        .with_body(r#"{"Id": 7, "Name": "web"}"#)
        .expect(1)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/stacks")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = support::authorized_client(&server);
    let outcome = StackReconciler::new(&client, 1, DeployMode::Standalone)
        .reconcile("web", COMPOSE, &env(), true)
        .await
        .unwrap();

    assert_eq!(outcome, StackOutcome::Updated { id: 7 });
    update.assert_async().await;
    create.assert_async().await;
}

#[tokio::test]
async fn missing_stack_is_created_standalone() {
    let mut server = Server::new_async().await;
    let swarm = server
        .mock("GET", "/api/endpoints/1/docker/swarm")
        .expect(0)
        .create_async()
        .await;
    let _mock = server
        .mock("GET", "/api/stacks")
        .with_status(200)
        .with_body(r#"[{"Id": 3, "Name": "api"}]"#)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/stacks")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("type".into(), "2".into()),
            Matcher::UrlEncoded("method".into(), "string".into()),
            Matcher::UrlEncoded("endpointId".into(), "1".into()),
        ]))
        .match_body(Matcher::Json(json!({
            "Name": "web",
            "StackFileContent": COMPOSE,
            "Env": env_json(),
            "Prune": true
        })))
        .with_status(200)
        .with_body(r#"{"Id": 12}"#)
        .expect(1)
        .create_async()
        .await;
    let update = server
        .mock("PUT", any_stack_update())
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = support::authorized_client(&server);
    let outcome = StackReconciler::new(&client, 1, DeployMode::Standalone)
        .reconcile("web", COMPOSE, &env(), false)
        .await
        .unwrap();

    assert_eq!(outcome, StackOutcome::Created { id: Some(12) });
    swarm.assert_async().await;
    create.assert_async().await;
    update.assert_async().await;
}

#[tokio::test]
async fn clustered_mode_scopes_listing_and_creation_to_swarm() {
    let mut server = Server::new_async().await;
    let swarm = server
        .mock("GET", "/api/endpoints/1/docker/swarm")
        .with_status(200)
        .with_body(r#"{"ID": "swarm-abc", "Spec": {}}"#)
        .expect(1)
        .create_async()
        .await;
    let list = server
        .mock("GET", "/api/stacks")
        .match_query(Matcher::UrlEncoded(
            "filters".into(),
            r#"{"SwarmID":"swarm-abc"}"#.into(),
        ))
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/stacks")
        .match_query(Matcher::UrlEncoded("type".into(), "1".into()))
        .match_body(Matcher::Json(json!({
            "Name": "web",
            "SwarmID": "swarm-abc",
            "StackFileContent": COMPOSE,
            "Env": env_json(),
            "Prune": true
        })))
        .with_status(201)
        .with_body(r#"{"Id": 4, "Name": "web"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = support::authorized_client(&server);
    let outcome = StackReconciler::new(&client, 1, DeployMode::Clustered)
        .reconcile("web", COMPOSE, &env(), false)
        .await
        .unwrap();

    assert_eq!(outcome, StackOutcome::Created { id: Some(4) });
    swarm.assert_async().await;
    list.assert_async().await;
    create.assert_async().await;
}

#[tokio::test]
async fn swarm_lookup_failure_stops_before_listing() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/endpoints/1/docker/swarm")
        .with_status(503)
        .with_body(r#"{"message":"This node is not a swarm manager."}"#)
        .create_async()
        .await;
    let list = server
        .mock("GET", "/api/stacks")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = support::authorized_client(&server);
    let err = StackReconciler::new(&client, 1, DeployMode::Clustered)
        .reconcile("web", COMPOSE, &env(), false)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::SwarmId));
    assert!(err.to_string().contains("not a swarm manager"));
    list.assert_async().await;
}

#[tokio::test]
async fn empty_swarm_id_is_not_found() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/endpoints/1/docker/swarm")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = support::authorized_client(&server);
    let err = StackReconciler::new(&client, 1, DeployMode::Clustered)
        .resolve_swarm_id()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::NotFound {
            kind: ResourceKind::Cluster,
            ..
        }
    ));
}

#[tokio::test]
async fn failed_update_is_remote_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/stacks")
        .with_status(200)
        .with_body(r#"[{"Id": 7, "Name": "web"}]"#)
        .create_async()
        .await;
    let _mock = server
        .mock("PUT", "/api/stacks/7")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"message":"failed to deploy"}"#)
        .create_async()
        .await;

    let client = support::authorized_client(&server);
    let err = StackReconciler::new(&client, 1, DeployMode::Standalone)
        .reconcile("web", COMPOSE, &env(), false)
        .await
        .unwrap_err();

    match err {
        DeployError::Remote {
            stage,
            status,
            body,
        } => {
            assert_eq!(stage, Stage::UpdateStack);
            assert_eq!(status, 500);
            assert!(body.contains("failed to deploy"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn failed_listing_creates_nothing() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/stacks")
        .with_status(403)
        .with_body("forbidden")
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/stacks")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = support::authorized_client(&server);
    let err = StackReconciler::new(&client, 1, DeployMode::Standalone)
        .reconcile("web", COMPOSE, &env(), false)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::ListStacks));
    create.assert_async().await;
}

#[tokio::test]
async fn accepted_creation_without_body_still_succeeds() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/stacks")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/stacks")
        .match_query(Matcher::Any)
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let client = support::authorized_client(&server);
    let outcome = StackReconciler::new(&client, 1, DeployMode::Standalone)
        .reconcile("web", COMPOSE, &env(), false)
        .await
        .unwrap();

    assert_eq!(outcome, StackOutcome::Created { id: None });
    assert_eq!(outcome.id(), None);
    create.assert_async().await;
}

#[tokio::test]
async fn accepted_update_ignores_response_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/stacks")
        .with_status(200)
        .with_body(r#"[{"Id": 7, "Name": "web"}]"#)
        .create_async()
        .await;
    let update = server
        .mock("PUT", "/api/stacks/7")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("stack updated")
        .expect(1)
        .create_async()
        .await;

    let client = support::authorized_client(&server);
    let outcome = StackReconciler::new(&client, 1, DeployMode::Standalone)
        .reconcile("web", COMPOSE, &env(), false)
        .await
        .unwrap();

    assert_eq!(outcome, StackOutcome::Updated { id: 7 });
    update.assert_async().await;
}
