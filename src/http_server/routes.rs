//! Resource Routes
//!
//! Maps the `/api/v1` paths onto record handlers. Every collection gets
//! the same five routes; reviews are also reachable under a tour.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;

use crate::app::App;
use crate::collection::{Collection, Record};
use crate::handler::{AppError, AppResult, ListContext, RecordHandler, Reply};
use crate::query::QuerySpec;

pub const API_PREFIX: &str = "/api/v1";

type HandlerState<C> = Arc<RecordHandler<C>>;

/// All API routes of the application
pub fn api_routes(app: &App) -> Router {
    Router::new()
        .merge(resource_routes(&format!("{}/tours", API_PREFIX), app.tours.clone()))
        .merge(nested_routes(&format!("{}/tours/:id/reviews", API_PREFIX), app.reviews.clone()))
        .merge(resource_routes(&format!("{}/reviews", API_PREFIX), app.reviews.clone()))
        .merge(resource_routes(&format!("{}/users", API_PREFIX), app.users.clone()))
}

/// List/create at `base`, read/update/delete at `base/:id`
pub fn resource_routes<C: Collection>(base: &str, handler: HandlerState<C>) -> Router {
    Router::new()
        .route(base, get(list_handler::<C>).post(create_handler::<C>))
        .route(
            &format!("{}/:id", base),
            get(get_handler::<C>)
                .patch(update_handler::<C>)
                .delete(delete_handler::<C>),
        )
        .with_state(handler)
}

/// List/create under a parent; `path` must capture the parent as `:id`
pub fn nested_routes<C: Collection>(path: &str, handler: HandlerState<C>) -> Router {
    Router::new()
        .route(path, get(nested_list_handler::<C>).post(nested_create_handler::<C>))
        .with_state(handler)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    };
    (StatusCode::OK, Json(response))
}

pub async fn route_not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}

/// Render the router's own 405 and the body limit's 413 in the error
/// envelope. Runs outside the body limit layer.
pub async fn envelope_errors(State(body_limit): State<usize>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    match response.status() {
        StatusCode::METHOD_NOT_ALLOWED => {
            let allow = response.headers().get(header::ALLOW).cloned();
            let mut rendered = AppError::MethodNotAllowed { method, path }.into_response();
            if let Some(allow) = allow {
                rendered.headers_mut().insert(header::ALLOW, allow);
            }
            rendered
        }
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(body_limit).into_response(),
        _ => response,
    }
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> AppResult<Value> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidBody(rejection.body_text()))
}

async fn list_handler<C: Collection>(
    State(handler): State<HandlerState<C>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Reply<Vec<Record>>> {
    let ctx = ListContext::new(QuerySpec::from_pairs(pairs));
    handler.get_all(&ctx).await
}

async fn create_handler<C: Collection>(
    State(handler): State<HandlerState<C>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Reply<Record>> {
    handler.create_one(json_body(payload)?).await
}

async fn get_handler<C: Collection>(
    State(handler): State<HandlerState<C>>,
    Path(id): Path<String>,
) -> AppResult<Reply<Record>> {
    handler.get_one(&id).await
}

async fn update_handler<C: Collection>(
    State(handler): State<HandlerState<C>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Reply<Record>> {
    handler.update_one(&id, json_body(payload)?).await
}

async fn delete_handler<C: Collection>(
    State(handler): State<HandlerState<C>>,
    Path(id): Path<String>,
) -> AppResult<Reply<Record>> {
    handler.delete_one(&id).await
}

async fn nested_list_handler<C: Collection>(
    State(handler): State<HandlerState<C>>,
    Path(parent_id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Reply<Vec<Record>>> {
    let ctx = ListContext::nested(QuerySpec::from_pairs(pairs), parent_id);
    handler.get_all(&ctx).await
}

async fn nested_create_handler<C: Collection>(
    State(handler): State<HandlerState<C>>,
    Path(parent_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Reply<Record>> {
    handler.create_nested(&parent_id, json_body(payload)?).await
}
