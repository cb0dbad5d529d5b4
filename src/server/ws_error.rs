/// Centralized helpers for WebSocket and HTTP error responses.
///
/// Every error frame carries a code, a message and an optional context so
/// clients can tell relay failures apart from game traffic.
use actix_web::{HttpResponse, http::StatusCode};
use serde_json::{Value, json};

/// Formats a WebSocket error message as a JSON string.
///
/// # Arguments
/// - `code`: Unique error code (e.g. "INVALID_ENVELOPE").
/// - `message`: Human-readable error message.
/// - `context`: Optional context (e.g. peer name, room id).
pub fn ws_error_message(code: &str, message: &str, context: Option<Value>) -> String {
    json!({
        "action": "Error",
        "data": {
            "code": code,
            "message": message,
            "context": context.unwrap_or(Value::Null),
        }
    })
    .to_string()
}

/// Returns an HTTP error response with a JSON body.
pub fn http_error_response(code: &str, message: &str, context: Option<Value>, status: StatusCode) -> HttpResponse {
    let body = json!({
        "error": {
            "code": code,
            "message": message,
            "context": context.unwrap_or(Value::Null),
        }
    });
    HttpResponse::build(status).content_type("application/json").body(body.to_string())
}
