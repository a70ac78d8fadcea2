//! Simulated showcase endpoints: analytics, blockchain verification, and
//! collaboration.
//!
//! Nothing in this module is a real backend. The numbers are fabricated
//! from a salted hash of the request body (deterministic for identical
//! input, meaningless otherwise) and every response carries
//! `"simulated": true` so consumers cannot mistake them for real data.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use ulid::Ulid;

use crate::api::ApiError;
use crate::incidents::IncidentKind;
use crate::state::AppState;
use crate::wheel;

/// Reduce a salted hash of the payload into `0..m`.
fn pseudo_metric(data: &Value, salt: &str, m: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(data.to_string().as_bytes());
    let digest = hasher.finalize();
    let word = digest
        .iter()
        .take(8)
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    word % m
}

fn sha256_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}

fn fabricated_insights(data: &Value) -> Value {
    json!({
        "decision_efficiency": 70 + pseudo_metric(data, "efficiency", 31),
        "user_engagement": 55 + pseudo_metric(data, "engagement", 41),
        "fairness_score": 7.75 + pseudo_metric(data, "fairness", 30) as f64 / 20.0,
        "predicted_outcomes": {
            "next_decision_time_ms": 5000 + pseudo_metric(data, "decision_time", 3000),
            "user_satisfaction": 0.75 + pseudo_metric(data, "satisfaction", 21) as f64 / 100.0,
            "optimal_segments": 6 + pseudo_metric(data, "optimal", 4),
        },
        "optimization_opportunities": [
            {
                "area": "Decision Speed",
                "current_performance": "78%",
                "potential_improvement": "15%",
                "recommendation": "Implement predictive pre-loading",
            },
            {
                "area": "User Interface",
                "current_performance": "82%",
                "potential_improvement": "12%",
                "recommendation": "Optimize color contrast and spacing",
            },
        ],
    })
}

fn fabricated_recommendations(data: &Value) -> Vec<Value> {
    let metrics = data.get("metrics").cloned().unwrap_or(Value::Null);
    let mut recommendations = Vec::new();

    if metrics
        .get("decision_efficiency")
        .and_then(Value::as_f64)
        .unwrap_or(100.0)
        < 70.0
    {
        recommendations.push(json!({
            "type": "efficiency",
            "priority": "high",
            "title": "Optimize Decision Process",
            "description": "Reduce segment count or pre-fill common options",
            "expected_impact": "35% efficiency improvement",
        }));
    }

    if metrics
        .get("user_engagement")
        .and_then(Value::as_f64)
        .unwrap_or(100.0)
        < 60.0
    {
        recommendations.push(json!({
            "type": "engagement",
            "priority": "medium",
            "title": "Enhance User Experience",
            "description": "Add gamification and personalization",
            "expected_impact": "25% engagement boost",
        }));
    }

    recommendations
}

/// Full analytics payload for a request body.
pub fn analytics_report(data: &Value) -> Value {
    json!({
        "success": true,
        "simulated": true,
        "insights": fabricated_insights(data),
        "recommendations": fabricated_recommendations(data),
    })
}

/// POST /api/analytics
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(data) = match payload {
        Ok(json) => json,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
    };
    if data.is_null() {
        return ApiError::bad_request("No data provided").into_response();
    }

    let threats = wheel::detect_threats(&data.to_string());
    if !threats.is_empty() {
        state
            .incidents
            .record(IncidentKind::MaliciousAnalyticsData, threats.join(","));
        return ApiError::bad_request("Invalid data format").into_response();
    }

    Json(analytics_report(&data)).into_response()
}

/// Fabricated verification record for a transaction payload. The block
/// hash folds in the current timestamp, so only the transaction hash is
/// stable across calls.
pub fn verification_for(transaction: &Value) -> Value {
    let transaction_hash = sha256_hex(transaction.to_string().as_bytes());
    let timestamp = Utc::now().to_rfc3339();
    let block_hash = sha256_hex(format!("{transaction_hash}{timestamp}").as_bytes());

    json!({
        "verified": true,
        "simulated": true,
        "transaction_hash": transaction_hash,
        "block_hash": block_hash,
        "timestamp": timestamp,
        "confirmations": 6,
        "network": "spinwheel_demo_chain",
    })
}

/// POST /api/blockchain-verify
pub async fn blockchain_verify(payload: Result<Json<Value>, JsonRejection>) -> Response {
    let Json(data) = match payload {
        Ok(json) => json,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
    };
    let Some(transaction) = data.get("transaction") else {
        return ApiError::bad_request("Transaction data required").into_response();
    };

    Json(verification_for(transaction)).into_response()
}

fn join_session(data: &Value) -> Value {
    let now = Utc::now().to_rfc3339();
    let active_users: Vec<Value> = (1..=3)
        .map(|i| {
            json!({
                "id": Ulid::new().to_string(),
                "name": format!("User_{i}"),
                "joined": now,
            })
        })
        .collect();

    json!({
        "simulated": true,
        "session_id": data.get("session_id").cloned().unwrap_or(Value::Null),
        "user_id": Ulid::new().to_string(),
        "timestamp": now,
        "active_users": active_users,
        "consensus_state": {
            "current_consensus": 0.75,
            "required_consensus": 0.8,
            "votes": { "option_1": 3, "option_2": 1, "option_3": 2 },
        },
    })
}

fn vote_receipt() -> Value {
    json!({
        "success": true,
        "simulated": true,
        "vote_id": Ulid::new().to_string(),
        "updated_consensus": 0.82,
        "timestamp": Utc::now().to_rfc3339(),
    })
}

/// POST /api/collaboration
pub async fn collaboration(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(data) = match payload {
        Ok(json) => json,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
    };

    match data.get("action").and_then(Value::as_str) {
        Some("join_session") => Json(join_session(&data)).into_response(),
        Some("vote") => Json(vote_receipt()).into_response(),
        Some("chat") => {
            let message = data.get("message").and_then(Value::as_str).unwrap_or("");
            let sanitized = wheel::sanitize_text(message, &state.incidents);
            Json(json!({
                "success": true,
                "simulated": true,
                "message_id": Ulid::new().to_string(),
                "sanitized_message": sanitized,
                "timestamp": Utc::now().to_rfc3339(),
            }))
            .into_response()
        }
        _ => ApiError::bad_request("Invalid action").into_response(),
    }
}
