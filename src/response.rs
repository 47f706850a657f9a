use serde::Serialize;

/// Uniform response envelope returned by every endpoint.
///
/// `error` carries a stable machine-readable code (e.g. `NOT_FOUND`);
/// human-readable text goes in `message`. Internal error detail is logged,
/// never serialized.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success with a message only, for operations that return no body.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error: Some(code.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_envelope_omits_unused_fields() {
        let body = serde_json::to_value(ApiResponse::data(serde_json::json!({"id": 1}))).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 1);
        assert!(body.get("message").is_none());
        assert!(body.get("error").is_none());
    }

    #[test]
    fn test_failure_envelope_carries_code_and_message() {
        let body =
            serde_json::to_value(ApiResponse::failure("Post not found", "NOT_FOUND")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Post not found");
        assert_eq!(body["error"], "NOT_FOUND");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_message_only_envelope() {
        let body = serde_json::to_value(ApiResponse::message_only("Post deleted successfully"))
            .unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Post deleted successfully");
        assert!(body.get("data").is_none());
    }
}
