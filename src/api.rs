//! HTTP endpoints for wheel creation, spinning, and monitoring.
//!
//! Handlers are thin wrappers over `build_wheel` / `spin_wheel` /
//! `build_security_report` so the integration tests can drive the same
//! logic without a socket.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::state::AppState;
use crate::types::{RawSegment, Segment, WheelMode};
use crate::wheel;

/// Upper bound on positional field indexes scanned out of a request;
/// far above any valid segment count.
const MAX_FIELD_INDEX: usize = 100;

/// A JSON `{ "error": … }` payload with a status code.
#[derive(Debug, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Wheel creation failed validation; carries the full ordered error list.
#[derive(Debug, Serialize, PartialEq)]
pub struct WheelRejection {
    pub errors: Vec<String>,
}

impl IntoResponse for WheelRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "success": false, "errors": self.errors })),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct WheelResponse {
    pub success: bool,
    pub mode: WheelMode,
    pub segments: Vec<Segment>,
}

/// Raw create-wheel input: `count`, `mode`, and positional
/// `text_{i}` / `color_{i}` fields, from either a form or a JSON body.
#[derive(Debug, Default)]
pub struct WheelRequest {
    pub count: Option<String>,
    pub mode: Option<String>,
    pub segments: Vec<RawSegment>,
}

impl WheelRequest {
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let last_index = fields
            .keys()
            .filter_map(|k| k.strip_prefix("text_").or_else(|| k.strip_prefix("color_")))
            .filter_map(|i| i.parse::<usize>().ok())
            .filter(|&i| i < MAX_FIELD_INDEX)
            .max();

        let segments = match last_index {
            Some(last) => (0..=last)
                .map(|i| RawSegment {
                    text: fields.get(&format!("text_{i}")).cloned().unwrap_or_default(),
                    color: fields
                        .get(&format!("color_{i}"))
                        .cloned()
                        .unwrap_or_default(),
                })
                .collect(),
            None => Vec::new(),
        };

        Self {
            count: fields.get("count").cloned(),
            mode: fields.get("mode").cloned(),
            segments,
        }
    }
}

/// Validate a raw request into a wheel response.
pub fn build_wheel(
    state: &AppState,
    request: WheelRequest,
) -> Result<WheelResponse, WheelRejection> {
    match state.validator.validate(
        request.count.as_deref(),
        request.mode.as_deref(),
        &request.segments,
    ) {
        Ok(wheel) => {
            tracing::info!(
                count = wheel.segments.len(),
                mode = %wheel.mode,
                "Wheel created"
            );
            Ok(WheelResponse {
                success: true,
                mode: wheel.mode,
                segments: wheel.segments,
            })
        }
        Err(errors) => Err(WheelRejection {
            errors: errors.iter().map(|e| e.to_string()).collect(),
        }),
    }
}

/// Flatten JSON scalars into the string form the validator consumes.
fn scalar_fields(body: &HashMap<String, Value>) -> HashMap<String, String> {
    body.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), text))
        })
        .collect()
}

/// POST /api/wheel (JSON body)
pub async fn create_wheel(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<HashMap<String, Value>>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(json) => json,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
    };
    match build_wheel(&state, WheelRequest::from_fields(&scalar_fields(&body))) {
        Ok(response) => Json(response).into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

/// POST /wheel (urlencoded form body)
pub async fn create_wheel_form(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    match build_wheel(&state, WheelRequest::from_fields(&fields)) {
        Ok(response) => Json(response).into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct SpinRequest {
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// Winner as echoed back to the client.
#[derive(Debug, Serialize)]
pub struct WinnerPayload {
    pub id: usize,
    pub text: String,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct SpinResponse {
    pub winner_index: usize,
    pub winner: WinnerPayload,
    pub success: bool,
}

/// Re-check the shape of a round-tripped segment list and draw a winner.
/// The list came from the client, so the length bounds are enforced
/// again here; text is not re-sanitized since the response is JSON.
pub fn spin_wheel(state: &AppState, request: SpinRequest) -> Result<SpinResponse, ApiError> {
    let segments = request.segments;
    if segments.is_empty() {
        return Err(ApiError::bad_request("No segments provided"));
    }

    let limits = state.config.limits;
    if segments.len() < limits.min_segments || segments.len() > limits.max_segments {
        return Err(ApiError::bad_request("Invalid number of segments"));
    }

    let outcome = wheel::spin(&segments).map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(SpinResponse {
        winner_index: outcome.winner_index,
        winner: WinnerPayload {
            id: outcome.winner.id,
            text: outcome.winner.text,
            color: outcome.winner.color,
        },
        success: true,
    })
}

/// POST /api/spin
pub async fn spin(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SpinRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
    };
    match spin_wheel(&state, request) {
        Ok(response) => {
            tracing::debug!(winner_index = response.winner_index, "Spin resolved");
            Json(response).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct SecurityReport {
    pub total_incidents: usize,
    pub recent_incidents: usize,
    pub incident_types: HashMap<&'static str, usize>,
    pub security_score: u32,
    pub timestamp: String,
}

pub fn build_security_report(state: &AppState) -> SecurityReport {
    let last_hour = state.incidents.count_since(chrono::Duration::hours(1));
    let security_score = 100u32.saturating_sub(((last_hour as u32).saturating_mul(5)).min(50));

    SecurityReport {
        total_incidents: state.incidents.total(),
        recent_incidents: state.incidents.count_since(chrono::Duration::hours(24)),
        incident_types: state.incidents.counts_by_kind_since(chrono::Duration::hours(24)),
        security_score,
        timestamp: Utc::now().to_rfc3339(),
    }
}

/// GET /api/security-report (admin)
pub async fn security_report(State(state): State<Arc<AppState>>) -> Json<SecurityReport> {
    Json(build_security_report(&state))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
