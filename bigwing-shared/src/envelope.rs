use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Body shape shared by every endpoint: `{status, message?, entity?, error?}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ApiResponse<T> {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<T>,
    /// `{"statusCode": <http status>}` on failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub error: Option<Value>,
}

impl<T> ApiResponse<T> {
    pub fn ok(entity: T) -> Self {
        Self {
            status: true,
            message: None,
            entity: Some(entity),
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: Some(message.into()),
            entity: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            status: false,
            message: Some(message.into()),
            entity: None,
            error: Some(serde_json::json!({ "statusCode": status_code })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_skips_empty_fields() {
        let body = serde_json::to_value(ApiResponse::ok(true)).unwrap();
        assert_eq!(body, json!({ "status": true, "entity": true }));
    }

    #[test]
    fn test_failure_carries_status_code() {
        let body = serde_json::to_value(ApiResponse::failure("Booking already exists", 409)).unwrap();
        assert_eq!(
            body,
            json!({
                "status": false,
                "message": "Booking already exists",
                "error": { "statusCode": 409 }
            })
        );
    }
}
