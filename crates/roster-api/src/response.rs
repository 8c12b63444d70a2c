//! The API response envelope.

use axum::Json;
use serde::Serialize;

/// Standard response envelope: `code` 0 on success, non-zero on error.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    /// 0 for success, -1 for errors.
    pub code: i32,
    /// Human-readable outcome.
    pub message: String,
    /// Payload; omitted when there is none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Wraps a payload in a success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        code: 0,
        message: "success".to_string(),
        data: Some(data),
    })
}

/// A success envelope with no payload.
pub fn ok_empty() -> Json<Envelope<()>> {
    Json(Envelope {
        code: 0,
        message: "success".to_string(),
        data: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let Json(envelope) = ok(serde_json::json!({"id": 1}));
        let text = serde_json::to_string(&envelope).unwrap();
        assert!(text.contains("\"code\":0"));
        assert!(text.contains("\"message\":\"success\""));
        assert!(text.contains("\"data\""));
    }

    #[test]
    fn empty_envelope_omits_data() {
        let Json(envelope) = ok_empty();
        let text = serde_json::to_string(&envelope).unwrap();
        assert!(!text.contains("\"data\""));
    }
}
