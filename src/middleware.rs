// ABOUTME: Request pipeline wrapping every handler with logging and chaos short-circuit
// ABOUTME: Records method, path, status, duration, client IP, and body size into the LogHub
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use http_body::Body as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::LogEntry;
use crate::resources::ServerResources;

/// Canned body for the forced-failure chaos mode
pub const CHAOS_500_BODY: &str = "Chaos: Simulated 500 Internal Server Error\n";

/// The one middleware every request passes through.
///
/// With `simulate_500` set the request never reaches its handler: the
/// pipeline answers 500 directly and still records a log entry. Otherwise
/// the wrapped handler runs (panics surface here as 500 responses from the
/// catch-panic layer underneath) and the measured outcome is appended to
/// the LogHub.
pub async fn request_pipeline(
    State(resources): State<Arc<ServerResources>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_owned(), ToString::to_string);
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let remote_ip = client_ip(&request);

    if resources.chaos.simulate_500() {
        resources.log_hub.append(LogEntry {
            time: Utc::now(),
            method,
            path,
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            duration: Duration::ZERO,
            remote_ip,
            user_agent,
            bytes: 0,
        });
        return (StatusCode::INTERNAL_SERVER_ERROR, CHAOS_500_BODY).into_response();
    }

    let time = Utc::now();
    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    let status = response.status().as_u16();
    let bytes = response.body().size_hint().exact().unwrap_or(0);
    debug!(%method, %path, status, duration_ms = duration.as_millis() as u64, "request");

    resources.log_hub.append(LogEntry {
        time,
        method,
        path,
        status,
        duration,
        remote_ip,
        user_agent,
        bytes,
    });
    response
}

/// Best-effort client address: first `X-Forwarded-For` element, then
/// `X-Real-IP`, then the socket peer.
fn client_ip(request: &Request) -> String {
    if let Some(forwarded) = header_str(request, "x-forwarded-for") {
        let first = forwarded.split(',').next().unwrap_or(forwarded).trim();
        if !first.is_empty() {
            return first.to_owned();
        }
    }
    if let Some(real_ip) = header_str(request, "x-real-ip") {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_owned();
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default()
}

fn header_str<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers().get(name)?.to_str().ok()
}
