//! `/api/clients` handlers. Every response is an envelope except the fault
//! raised by `delete` for an unknown id.

use axum::{
    extract::{
        rejection::JsonRejection,
        Path, Query, State,
    },
    http::StatusCode,
    response::Response,
    Json,
};
use models::errors::FieldErrors;
use service::{
    client::{ClientFields, ClientFilter},
    errors::ServiceError,
};
use tracing::info;

use crate::errors::{ApiError, Envelope};
use crate::routes::ServerState;

const LOADED_ALL: &str = "Loaded clients";
const LOADED: &str = "Client loaded";
const NOT_FOUND: &str = "Couldn't find client";
const SAVED: &str = "Saved client";
const NOT_SAVED: &str = "Client not saved";
const UPDATED: &str = "Updated client";
const NOT_UPDATED: &str = "Client not updated";
const REMOVED: &str = "Remove client with all his diet plans";

/// Ids that do not parse can never match a record.
fn parse_id(raw: &str) -> Option<i32> {
    raw.trim().parse().ok()
}

fn body_errors(rejection: JsonRejection) -> FieldErrors {
    FieldErrors::single("body", &rejection.body_text())
}

/// Filter values are cast, never rejected: an empty value matches nothing and
/// any spelling other than a false one means `true`.
#[utoipa::path(
    get, path = "/api/clients", tag = "clients",
    params(
        ("is_active" = Option<bool>, Query, description = "Get only active clients"),
        ("is_pending" = Option<bool>, Query, description = "Get only pending clients")
    ),
    responses(
        (status = 200, description = "Loaded clients", body = crate::openapi::ClientListEnvelopeDoc)
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Query(filter): Query<ClientFilter>,
) -> Result<Response, ApiError> {
    let clients = state.clients.list(filter).await?;
    Ok(Envelope::success(LOADED_ALL, clients).respond(StatusCode::OK))
}

#[utoipa::path(
    get, path = "/api/clients/{id}", tag = "clients",
    params(("id" = i32, Path, description = "Unique client id")),
    responses(
        (status = 200, description = "Client loaded", body = crate::openapi::ClientEnvelopeDoc),
        (status = 404, description = "Couldn't find client")
    )
)]
pub async fn get(
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let found = match parse_id(&raw_id) {
        Some(id) => state.clients.get(id).await?,
        None => None,
    };
    Ok(match found {
        Some(client) => Envelope::success(LOADED, client).respond(StatusCode::OK),
        None => Envelope::<()>::failure(NOT_FOUND, None).respond(StatusCode::NOT_FOUND),
    })
}

#[utoipa::path(
    post, path = "/api/clients", tag = "clients",
    request_body = crate::openapi::ClientFieldsDoc,
    responses(
        (status = 201, description = "Saved client", body = crate::openapi::ClientEnvelopeDoc),
        (status = 422, description = "Client not saved; data holds field errors")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    body: Result<Json<ClientFields>, JsonRejection>,
) -> Result<Response, ApiError> {
    let fields = match body {
        Ok(Json(fields)) => fields,
        Err(rejection) => {
            return Ok(Envelope::error(NOT_SAVED, Some(body_errors(rejection))).respond(StatusCode::UNPROCESSABLE_ENTITY));
        }
    };
    match state.clients.create(fields).await {
        Ok(client) => Ok(Envelope::success(SAVED, client).respond(StatusCode::CREATED)),
        Err(ServiceError::Validation(errors)) => {
            Ok(Envelope::error(NOT_SAVED, Some(errors)).respond(StatusCode::UNPROCESSABLE_ENTITY))
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    put, path = "/api/clients/{id}", tag = "clients",
    params(("id" = i32, Path, description = "Unique client id")),
    request_body = crate::openapi::ClientFieldsDoc,
    responses(
        (status = 200, description = "Updated client", body = crate::openapi::ClientEnvelopeDoc),
        (status = 404, description = "Client not updated; unknown id"),
        (status = 422, description = "Client not updated; data holds field errors")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
    body: Result<Json<ClientFields>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Some(id) = parse_id(&raw_id) else {
        return Ok(Envelope::<()>::error(NOT_UPDATED, None).respond(StatusCode::NOT_FOUND));
    };
    let fields = match body {
        Ok(Json(fields)) => fields,
        Err(rejection) => {
            return Ok(Envelope::error(NOT_UPDATED, Some(body_errors(rejection))).respond(StatusCode::UNPROCESSABLE_ENTITY));
        }
    };
    match state.clients.update(id, fields).await {
        Ok(client) => Ok(Envelope::success(UPDATED, client).respond(StatusCode::OK)),
        Err(ServiceError::NotFound(_)) => {
            Ok(Envelope::<()>::error(NOT_UPDATED, None).respond(StatusCode::NOT_FOUND))
        }
        Err(ServiceError::Validation(errors)) => {
            Ok(Envelope::error(NOT_UPDATED, Some(errors)).respond(StatusCode::UNPROCESSABLE_ENTITY))
        }
        Err(e) => Err(e.into()),
    }
}

/// Unknown ids are a fault here, unlike `get`: the lookup error propagates
/// as a plain 500.
#[utoipa::path(
    delete, path = "/api/clients/{id}", tag = "clients",
    params(("id" = i32, Path, description = "Unique client id")),
    responses(
        (status = 200, description = "Removed client with all diet plans", body = crate::openapi::ClientEnvelopeDoc),
        (status = 500, description = "Unknown id or store failure")
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)
        .ok_or_else(|| ApiError(format!("Couldn't find Client with 'id'={}", raw_id)))?;
    let client = state.clients.delete(id).await?;
    info!(client_id = client.id, "client removed with diet plans");
    Ok(Envelope::success(REMOVED, client).respond(StatusCode::OK))
}
