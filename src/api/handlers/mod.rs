pub mod chat;
pub mod dashboard;
pub mod detail;
pub mod health;
pub mod metrics;
pub mod opportunities;
pub mod ws;

use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failed operation that still carries the state the UI should show.
    pub fn failed(data: T, error: String) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error),
        }
    }
}
