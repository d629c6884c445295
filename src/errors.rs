// ABOUTME: Application-level error type and its HTTP response mapping
// ABOUTME: Covers configuration, key material, and token signing failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mock OIDC Server Project

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Internal failures that are not part of the OAuth wire protocol.
///
/// Protocol-level failures (bad grants, bad scopes, client auth) are
/// expressed as [`crate::oauth2::models::OAuth2Error`] instead; this type is
/// for the machinery underneath: configuration, key material, signing.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("key material error: {0}")]
    KeyMaterial(String),

    #[error("token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("randomness unavailable: {0}")]
    Random(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Internal failures never leak details beyond the error class; the
        // OAuth envelope shape is kept so clients parse one format.
        tracing::error!(error = %self, "internal error surfaced to client");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "server_error",
                "error_description": "internal error",
            })),
        )
            .into_response()
    }
}
