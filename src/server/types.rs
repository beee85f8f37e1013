use serde::{Deserialize, Serialize};

/// Request for dimension extraction
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct DimensionsRequest {
    pub query: String,
}

/// Generic API response wrapper
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub status: String,
    pub request_id: String,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(request_id: String, data: T) -> Self {
        Self {
            status: "success".to_string(),
            request_id,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(request_id: String, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            request_id,
            data: None,
            message: Some(message.into()),
        }
    }
}
