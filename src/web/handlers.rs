//! HTTP handlers.

use std::any::Any;
use std::collections::HashMap;

use axum::extract::multipart::MultipartError;
use axum::extract::{Form, FromRequest, Multipart, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

use super::pages;
use super::AppState;
use crate::application::{ModelInfo, ScoreResponse};

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(pages::INDEX_HTML)
}

/// `POST /predict`
///
/// Accepts `application/x-www-form-urlencoded` and `multipart/form-data`
/// bodies. Always answers 200 with a JSON body; an undecodable body is
/// scored as an empty submission so the client sees which field is missing.
pub async fn predict(State(state): State<AppState>, request: Request) -> Json<ScoreResponse> {
    let fields = if is_multipart(request.headers()) {
        match Multipart::from_request(request, &state).await {
            Ok(multipart) => multipart_fields(multipart).await.unwrap_or_else(|e| {
                tracing::debug!("Rejected multipart body: {e}");
                HashMap::new()
            }),
            Err(rejection) => {
                tracing::debug!("Rejected multipart body: {}", rejection.body_text());
                HashMap::new()
            }
        }
    } else {
        match Form::<HashMap<String, String>>::from_request(request, &state).await {
            Ok(Form(fields)) => fields,
            Err(rejection) => {
                tracing::debug!("Rejected form body: {}", rejection.body_text());
                HashMap::new()
            }
        }
    };
    Json(state.scoring.score(&fields))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}

/// Collect the text parts of a multipart body. File parts are skipped.
async fn multipart_fields(
    mut multipart: Multipart,
) -> Result<HashMap<String, String>, MultipartError> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        fields.insert(name, field.text().await?);
    }
    Ok(fields)
}

/// `GET /api/info`
pub async fn api_info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.scoring.info())
}

/// Fallback for unknown routes.
pub async fn not_found() -> (StatusCode, Html<&'static str>) {
    (StatusCode::NOT_FOUND, Html(pages::NOT_FOUND_HTML))
}

/// Turns a handler panic into the HTML 500 page.
pub fn internal_error(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {detail}");

    (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::INTERNAL_ERROR_HTML)).into_response()
}
