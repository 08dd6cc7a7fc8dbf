//! API Handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use techdesk_core::application::dto::*;
use techdesk_core::{DeskError, Period};

use crate::auth::AuthenticatedCaller;
use crate::error::{ApiError, ApiResult};
use crate::models::{HealthResponse, PeriodQuery};
use crate::AppState;

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        live_connections: state.registry.connection_count(),
    })
}

// Auth

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginCommand>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(command) = payload?;
    state
        .auth
        .login(command)
        .await?
        .map(Json)
        .ok_or(ApiError::Unauthorized("invalid credentials"))
}

// Tickets

pub async fn list_tickets(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TicketView>>> {
    let Query(query) = query?;
    let tickets = state.tickets.list_tickets(caller, query.parse()?).await?;
    Ok(Json(tickets))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    payload: Result<Json<CreateTicketCommand>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TicketView>)> {
    let Json(command) = payload?;
    let ticket = state.tickets.create_ticket(caller, command).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<TicketView>> {
    Ok(Json(state.tickets.get_ticket(caller, &id).await?))
}

/// Body is optional; an absent or empty body means no ETA
pub async fn accept_ticket(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<String>,
    payload: Option<Json<AcceptTicketCommand>>,
) -> ApiResult<Json<TicketView>> {
    let command = payload.map(|Json(c)| c).unwrap_or_default();
    Ok(Json(state.tickets.accept_ticket(caller, &id, command).await?))
}

pub async fn assign_ticket(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<String>,
    payload: Result<Json<AssignTicketCommand>, JsonRejection>,
) -> ApiResult<Json<TicketView>> {
    let Json(command) = payload?;
    Ok(Json(state.tickets.assign_ticket(caller, &id, command).await?))
}

pub async fn complete_ticket(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<String>,
    payload: Option<Json<CompleteTicketCommand>>,
) -> ApiResult<Json<TicketView>> {
    let command = payload.map(|Json(c)| c).unwrap_or_default();
    Ok(Json(state.tickets.complete_ticket(caller, &id, command).await?))
}

pub async fn export_report(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let period = query.parse()?.unwrap_or(Period::Day);
    let report = state.tickets.export_report(caller, period).await?;

    let disposition = format!("attachment; filename=\"{}\"", report.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, report.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.body,
    ))
}

// Users

pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.users.list_users(caller).await?))
}

pub async fn me(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> ApiResult<Json<UserSummary>> {
    Ok(Json(state.users.get_user(caller, &caller.user_id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    payload: Result<Json<CreateUserCommand>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    let Json(command) = payload?;
    let user = state.users.create_user(caller, command).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.users.delete_user(caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn fallback() -> ApiError {
    ApiError::Desk(DeskError::NotFound("no such route".into()))
}
