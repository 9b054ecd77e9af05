use serde::Serialize;

/// JSON envelope shared by every endpoint.
///
/// Successful reads carry `result`, successful writes carry `message`,
/// failures carry `error`. `success` is always present.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            message: None,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            result: None,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn error(error: &str) -> Self {
        Self {
            success: false,
            result: None,
            message: None,
            error: Some(error.to_string()),
        }
    }
}
