//! HTTP transport over the ledger service. Thin glue only: request parsing,
//! response shaping and status mapping live here, never business logic.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::application::{LedgerError, LedgerService};

pub const DEPOSIT_SUCCESSFUL: &str = "Deposit successful";
pub const WITHDRAW_SUCCESSFUL: &str = "Withdraw successful";

const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred.";

#[derive(Debug, Deserialize)]
pub struct AccountOperationRequest {
    pub account_id: String,
    pub amount: Decimal,
}

pub fn router(service: Arc<LedgerService>) -> Router {
    Router::new()
        .route("/api/accounts/deposit", post(deposit))
        .route("/api/accounts/withdraw", post(withdraw))
        .route("/api/accounts/:id/balance", get(get_balance))
        .route("/api/accounts/:id/statement", get(get_statement))
        .with_state(service)
}

/// Bind and serve the API until the process is stopped.
pub async fn serve(service: Arc<LedgerService>, addr: &str) -> Result<()> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn deposit(
    State(service): State<Arc<LedgerService>>,
    Json(body): Json<AccountOperationRequest>,
) -> Response {
    if let Err(resp) = validate_account_id(&body.account_id) {
        return resp;
    }
    match service.deposit(&body.account_id, body.amount).await {
        Ok(()) => (StatusCode::OK, DEPOSIT_SUCCESSFUL).into_response(),
        Err(err) => error_to_response(err),
    }
}

async fn withdraw(
    State(service): State<Arc<LedgerService>>,
    Json(body): Json<AccountOperationRequest>,
) -> Response {
    if let Err(resp) = validate_account_id(&body.account_id) {
        return resp;
    }
    match service.withdraw(&body.account_id, body.amount).await {
        Ok(()) => (StatusCode::OK, WITHDRAW_SUCCESSFUL).into_response(),
        Err(err) => error_to_response(err),
    }
}

async fn get_balance(
    State(service): State<Arc<LedgerService>>,
    Path(account_id): Path<String>,
) -> Response {
    match service.get_balance(&account_id).await {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(err) => error_to_response(err),
    }
}

async fn get_statement(
    State(service): State<Arc<LedgerService>>,
    Path(account_id): Path<String>,
) -> Response {
    match service.get_statement(&account_id).await {
        Ok(statement) => (StatusCode::OK, statement).into_response(),
        Err(err) => error_to_response(err),
    }
}

fn validate_account_id(account_id: &str) -> Result<(), Response> {
    if account_id.trim().is_empty() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "account_id must not be empty",
        ));
    }
    Ok(())
}

fn error_to_response(err: LedgerError) -> Response {
    match err {
        LedgerError::AccountNotFound => {
            json_error(StatusCode::NOT_FOUND, "account_not_found", err.to_string())
        }
        LedgerError::InvalidAmount(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_amount", err.to_string())
        }
        LedgerError::InsufficientBalance => json_error(
            StatusCode::BAD_REQUEST,
            "insufficient_balance",
            err.to_string(),
        ),
        LedgerError::Conflict => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        LedgerError::Storage(e) => {
            tracing::error!(error = ?e, "unexpected storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                INTERNAL_ERROR_MESSAGE,
            )
        }
    }
}

fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
