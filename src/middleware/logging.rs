//! Procedure logging layer.
//!
//! Wraps every procedure, including the authorization gate, so that
//! unauthorized attempts are logged too. Records a start event with the
//! procedure name, caller identity and redacted input, then an end event
//! with the outcome and duration. The response itself passes through
//! unchanged.

use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::context::AuthContext;

/// Input keys whose values are replaced before logging.
const SENSITIVE_KEYS: &[&str] = &["password", "token", "secret", "authorization"];

/// Upper bound on how much request body the input log will buffer.
/// Matches the default axum body limit so the log never rejects a body
/// the extractor would accept.
const INPUT_LOG_LIMIT: usize = 2 * 1024 * 1024;

/// Replaces the values of sensitive keys, recursively, with `[REDACTED]`.
pub fn redact_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                let lower = key.to_lowercase();
                if SENSITIVE_KEYS.iter().any(|s| lower.contains(s)) {
                    *entry = Value::String("[REDACTED]".into());
                } else {
                    redact_json(entry);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_json(item);
            }
        }
        _ => {}
    }
}

pub async fn procedure_log(req: Request, next: Next) -> AppResult<Response> {
    let method = req.method().clone();
    let procedure = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let user_id = req
        .extensions()
        .get::<AuthContext>()
        .and_then(|ctx| ctx.identity.as_ref())
        .map(|identity| identity.user_id);

    let req = log_sanitized_input(req, &procedure, user_id).await?;

    info!(%method, procedure = %procedure, user_id = ?user_id, "procedure started");
    let start = Instant::now();

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        warn!(
            %method,
            procedure = %procedure,
            user_id = ?user_id,
            %status,
            duration_ms,
            "procedure failed"
        );
    } else {
        info!(
            %method,
            procedure = %procedure,
            user_id = ?user_id,
            %status,
            duration_ms,
            "procedure completed"
        );
    }

    Ok(response)
}

/// Buffers a JSON request body, logs a redacted copy at debug level and
/// hands the request back with the body intact.
async fn log_sanitized_input(
    req: Request,
    procedure: &str,
    user_id: Option<Uuid>,
) -> AppResult<Request> {
    let is_json = req
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Ok(req);
    }

    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, INPUT_LOG_LIMIT)
        .await
        .map_err(|_| AppError::internal("failed to read request body"))?;

    if let Ok(mut value) = serde_json::from_slice::<Value>(&bytes) {
        redact_json(&mut value);
        debug!(procedure = %procedure, user_id = ?user_id, input = %value, "procedure input");
    }

    Ok(Request::from_parts(parts, Body::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_sensitive_keys_at_any_depth() {
        let mut value = json!({
            "email": "user@example.com",
            "password": "hunter22",
            "nested": { "refreshToken": "abc", "amount": 5 },
            "list": [{ "apiSecret": "xyz" }]
        });
        redact_json(&mut value);
        assert_eq!(value["email"], "user@example.com");
        assert_eq!(value["password"], "[REDACTED]");
        assert_eq!(value["nested"]["refreshToken"], "[REDACTED]");
        assert_eq!(value["nested"]["amount"], 5);
        assert_eq!(value["list"][0]["apiSecret"], "[REDACTED]");
    }

    #[test]
    fn leaves_scalars_alone() {
        let mut value = json!(42);
        redact_json(&mut value);
        assert_eq!(value, json!(42));
    }
}
