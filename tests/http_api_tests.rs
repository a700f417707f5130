//! Handler-level tests of the REST API against the in-memory backend.

#![cfg(feature = "http-server")]

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use turbined::api::NewPipeline;
use turbined::db::repositories::LocalRepository;
use turbined::db::FullRepository;
use turbined::http::dto::{PopQuery, UpdatePipelineRequest};
use turbined::http::{handlers, AppState};
use turbined::services::{DatapointWriter, StreamHub, WriterPool};

fn make_state(repo: Arc<dyn FullRepository>) -> (AppState, WriterPool) {
    let stream = StreamHub::new();
    let (writer, pool) = DatapointWriter::spawn(repo.clone(), stream.clone(), 2);
    (AppState::new(repo, writer, stream), pool)
}

fn new_pipeline(name: &str) -> NewPipeline {
    NewPipeline {
        name: name.to_string(),
        description: "via handler".to_string(),
        active: true,
    }
}

#[tokio::test]
async fn create_then_get_roundtrip() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let (state, _pool) = make_state(repo);

    let (status, Json(created)) =
        handlers::create_pipeline(State(state.clone()), Json(new_pipeline("orders")))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let Json(fetched) = handlers::get_pipeline(
        State(state),
        Path(created.id.value().to_string()),
    )
    .await
    .unwrap();
    assert_eq!(fetched.name, "orders");
    assert!(fetched.active);
}

#[tokio::test]
async fn get_unknown_pipeline_maps_to_404() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let (state, _pool) = make_state(repo);

    let err = handlers::get_pipeline(State(state), Path("missing".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_with_empty_name_maps_to_400() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let (state, _pool) = make_state(repo);

    let err = handlers::create_pipeline(State(state), Json(new_pipeline("")))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_changes_name_and_description() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let (state, _pool) = make_state(repo);

    let (_, Json(created)) =
        handlers::create_pipeline(State(state.clone()), Json(new_pipeline("orders")))
            .await
            .unwrap();

    let Json(updated) = handlers::update_pipeline(
        State(state),
        Path(created.id.value().to_string()),
        Json(UpdatePipelineRequest {
            name: "renamed".to_string(),
            description: "edited".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.description, "edited");
}

#[tokio::test]
async fn delete_unknown_pipeline_maps_to_404() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let (state, _pool) = make_state(repo);

    let err = handlers::delete_pipeline(State(state), Path("missing".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn statistics_of_unknown_pipeline_maps_to_404() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let (state, _pool) = make_state(repo);

    let err = handlers::get_pipeline_statistics(State(state), Path("missing".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn push_is_accepted_and_applied_by_the_writer_pool() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let (state, pool) = make_state(repo.clone());

    let (status, Json(response)) = handlers::push_datapoint(
        State(state.clone()),
        Path("orders".to_string()),
        "payload-1".to_string(),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(response.message.contains("orders"));

    // Drop every writer handle so the pool drains deterministically.
    drop(state);
    pool.join().await;

    let (state, _pool) = make_state(repo);
    let Json(values) = handlers::pop_datapoints(
        State(state.clone()),
        Path("orders".to_string()),
        Query(PopQuery {
            consumer: "alpha".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(values, vec!["payload-1".to_string()]);

    // The implicit pipeline shows up with its consumer registered.
    let Json(pipeline) = handlers::get_pipeline(State(state), Path("orders".to_string()))
        .await
        .unwrap();
    assert_eq!(pipeline.description, "Dynamically generated pipeline");
    assert_eq!(pipeline.statistic.today, 1);
    assert_eq!(pipeline.consumers.len(), 1);
    assert_eq!(pipeline.consumers[0].unread_elements, 0);
}

#[tokio::test]
async fn health_reports_backend_connectivity() {
    let local = Arc::new(LocalRepository::new());
    let repo: Arc<dyn FullRepository> = local.clone();
    let (state, _pool) = make_state(repo);

    let Json(health) = handlers::health_check(State(state.clone())).await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.database, "connected");

    local.set_healthy(false);
    let Json(health) = handlers::health_check(State(state)).await.unwrap();
    assert_eq!(health.database, "disconnected");
}
