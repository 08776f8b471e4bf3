use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use notary_service::{ArchiveEntry, ArchiveHistory, ArchiveStats, VerificationResult};
use notary_types::{Identifier, SubmissionReceipt};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::auth::Action;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": "notary-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SubmitParams {
    pub filename: Option<String>,
}

pub async fn submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SubmitParams>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<SubmissionReceipt>)> {
    let identity = state.authorize(&headers, Action::Submit).await?;
    let filename = params
        .filename
        .ok_or_else(|| ServerError::BadRequest("missing `filename` query parameter".into()))?;

    let entry = state
        .blocking(move |service, content| {
            let entry = service.submit(&body[..], &filename, &identity.name)?;
            // The notarization stands even if the bytes cannot be retained.
            if let Err(e) = content.put(&entry.fingerprint, &body) {
                warn!(identifier = %entry.identifier, error = %e, "content not retained");
            }
            Ok(entry)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(SubmissionReceipt::from(&entry))))
}

pub async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<Json<Vec<ArchiveEntry>>> {
    state.authorize(&headers, Action::Read).await?;
    let entries = state.blocking(|service, _| Ok(service.list_archives()?)).await?;
    Ok(Json(entries))
}

pub async fn lookup_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw): Path<String>,
) -> ServerResult<Json<VerificationResult>> {
    state.authorize(&headers, Action::Read).await?;
    let identifier = parse_identifier(raw)?;
    let result = state
        .blocking(move |service, _| Ok(service.verify_by_identifier(&identifier)?))
        .await?;
    Ok(Json(result))
}

pub async fn verify_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw): Path<String>,
    body: Bytes,
) -> ServerResult<Json<VerificationResult>> {
    let identity = state.authorize(&headers, Action::Verify).await?;
    let identifier = parse_identifier(raw)?;
    let result = state
        .blocking(move |service, _| {
            Ok(service.verify_with_content(&identifier, &body[..], &identity.name)?)
        })
        .await?;
    Ok(Json(result))
}

pub async fn history_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw): Path<String>,
) -> ServerResult<Json<ArchiveHistory>> {
    state.authorize(&headers, Action::Read).await?;
    let identifier = parse_identifier(raw)?;
    let history = state
        .blocking(move |service, _| {
            service
                .history(&identifier)?
                .ok_or_else(|| ServerError::NotFound(format!("no archive for {identifier}")))
        })
        .await?;
    Ok(Json(history))
}

/// Serve the retained bytes of an archived document.
pub async fn content_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw): Path<String>,
) -> ServerResult<Response> {
    state.authorize(&headers, Action::Download).await?;
    let identifier = parse_identifier(raw)?;
    let (entry, data) = state
        .blocking(move |service, content| {
            let entry = service
                .find_archive(&identifier)?
                .ok_or_else(|| ServerError::NotFound(format!("no archive for {identifier}")))?;
            let data = content.get(&entry.fingerprint)?.ok_or_else(|| {
                ServerError::NotFound(format!("content for {identifier} was not retained"))
            })?;
            Ok((entry, data))
        })
        .await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        attachment_name(&entry.filename)
    ))
    .map_err(|e| ServerError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}

pub async fn stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<Json<ArchiveStats>> {
    state.authorize(&headers, Action::Read).await?;
    let stats = state.blocking(|service, _| Ok(service.stats()?)).await?;
    Ok(Json(stats))
}

fn parse_identifier(raw: String) -> ServerResult<Identifier> {
    Identifier::new(raw).map_err(|e| ServerError::BadRequest(e.to_string()))
}

fn attachment_name(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect()
}
