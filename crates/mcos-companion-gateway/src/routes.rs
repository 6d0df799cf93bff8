//! HTTP surface of the companion: router, envelope middleware and handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::PathRejection, Path, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mcos_companion_core::{IconError, StoreItem, ICON_CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::error::{ApiError, JsonBody, ENDPOINT_NOT_FOUND};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LaunchRequest {
    #[serde(default)]
    pub app_id: Option<String>,
}

#[derive(Serialize)]
pub struct LaunchResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health).fallback(endpoint_not_found))
        .route("/desktop-icons", get(desktop_icons).fallback(endpoint_not_found))
        .route("/icons/:name", get(serve_icon).fallback(endpoint_not_found))
        .route("/store-items", get(store_items).fallback(endpoint_not_found))
        .route("/launch-app", post(launch_app).fallback(endpoint_not_found))
        .route("/chat", post(chat).fallback(endpoint_not_found))
        .fallback(endpoint_not_found)
        .with_state(state)
        .layer(middleware::from_fn(preflight))
        .layer(middleware::from_fn(log_request))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
}

/// OPTIONS on any path is a successful preflight; CORS headers are added by the outer layers.
async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(request).await
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

async fn endpoint_not_found() -> ApiError {
    ApiError::NotFound(ENDPOINT_NOT_FOUND.to_string())
}

async fn health() -> &'static str {
    "OK"
}

/// Catalog entries whose icon is currently in the icon directory, in catalog order.
async fn desktop_icons(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let icons = state
        .icons
        .desktop_icons(&state.catalog, &state.config.public_url())
        .await
        .map_err(|e| ApiError::internal("Unable to list desktop icons", &e, false))?;
    Ok(Json(icons).into_response())
}

/// Bare filenames only; anything else, including undecodable names, is a 404.
async fn serve_icon(
    State(state): State<Arc<AppState>>,
    name: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Ok(Path(name)) = name else {
        return Err(ApiError::NotFound("Icon not found".to_string()));
    };
    match state.icons.read_icon(&name).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, ICON_CONTENT_TYPE)], bytes).into_response()),
        Err(IconError::NotFound) => Err(ApiError::NotFound("Icon not found".to_string())),
        Err(e) => Err(ApiError::internal(
            "Unable to read icon",
            &e,
            state.config.expose_error_details,
        )),
    }
}

async fn store_items(State(state): State<Arc<AppState>>) -> Json<Vec<StoreItem>> {
    Json(state.store_items.clone())
}

/// Validate the id against the catalog, then spawn and detach. Never waits on the child.
async fn launch_app(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<LaunchRequest>,
) -> Result<Json<LaunchResponse>, ApiError> {
    let app_id = body.app_id.unwrap_or_default();
    let entry = state
        .catalog
        .get(&app_id)
        .ok_or_else(|| ApiError::Validation("Missing or invalid application id".to_string()))?;

    tracing::info!("Launching '{}': {}", entry.id, entry.launch_command);
    let pid = state
        .launcher
        .launch(&entry.launch_command)
        .map_err(|e| {
            ApiError::internal("Internal server error", &e, state.config.expose_error_details)
        })?;
    if let Some(pid) = pid {
        tracing::debug!("'{}' started as pid {}", entry.id, pid);
    }

    Ok(Json(LaunchResponse {
        status: "success",
        message: format!("Application '{}' launched", entry.id),
    }))
}

/// Single stateless round trip to the text generator.
async fn chat(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Some(generator) = state.chat.as_ref() else {
        return Err(ApiError::ServiceUnavailable(
            "Chat service is not configured".to_string(),
        ));
    };
    let message = body.message.unwrap_or_default();
    if message.trim().is_empty() {
        return Err(ApiError::Validation("Message must not be empty".to_string()));
    }

    let reply = generator.generate(&message).await.map_err(|e| {
        ApiError::internal("Chat service error", &e, state.config.expose_error_details)
    })?;
    Ok(Json(ChatResponse { reply }))
}
