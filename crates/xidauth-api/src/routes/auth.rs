//! # Decision Routes
//!
//! | Method | Path          | Body                          | Response          |
//! |--------|---------------|-------------------------------|-------------------|
//! | POST   | `/v1/verify`  | `{server, name, password}`    | decision          |
//! | POST   | `/v1/isuser`  | `{server, name}`              | `{registered}`    |
//!
//! `name` is the chat-side (XMPP local part) name. Denials are ordinary
//! `200` responses carrying the decision; only backend failures and
//! unknown servers are HTTP errors.
//!
//! Oracle calls block on JSON-RPC, so each request runs the service on the
//! blocking pool.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use xidauth_core::Decision;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyRequest {
    pub server: String,
    pub name: String,
    pub password: String,
}

impl Validate for VerifyRequest {
    fn validate(&self) -> Result<(), String> {
        if self.server.is_empty() {
            return Err("server must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IsUserRequest {
    pub server: String,
    pub name: String,
}

impl Validate for IsUserRequest {
    fn validate(&self) -> Result<(), String> {
        if self.server.is_empty() {
            return Err("server must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IsUserResponse {
    pub registered: bool,
}

/// Build the decision router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/verify", post(verify))
        .route("/v1/isuser", post(is_user))
}

async fn verify(
    State(state): State<AppState>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<Decision>, AppError> {
    let req = extract_validated_json(body)?;
    let service = state.service.clone();
    let decision = tokio::task::spawn_blocking(move || {
        service.authenticate(&req.name, &req.server, &req.password)
    })
    .await??;
    Ok(Json(decision))
}

async fn is_user(
    State(state): State<AppState>,
    body: Result<Json<IsUserRequest>, JsonRejection>,
) -> Result<Json<IsUserResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let service = state.service.clone();
    let registered =
        tokio::task::spawn_blocking(move || service.is_user(&req.name, &req.server)).await??;
    Ok(Json(IsUserResponse { registered }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_rejects_unknown_fields() {
        let parsed: Result<VerifyRequest, _> = serde_json::from_value(serde_json::json!({
            "server": "chat.example",
            "name": "domob",
            "password": "x",
            "app": "other",
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_empty_server_invalid() {
        let req = IsUserRequest {
            server: String::new(),
            name: "domob".into(),
        };
        assert!(req.validate().is_err());

        let req = VerifyRequest {
            server: "chat.example".into(),
            name: String::new(),
            password: String::new(),
        };
        assert!(req.validate().is_ok());
    }
}
