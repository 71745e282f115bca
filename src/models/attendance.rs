use serde::{Deserialize, Serialize};

/// POST /attendance/check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub user_id: String,
    /// Texto del QR, opaco para el cliente
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub checked_in_at: Option<String>,
}

impl CheckInResponse {
    /// Mensaje de error legible cuando el backend rechaza el código
    pub fn failure_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Check-in was rejected. Please try again.".to_string())
    }
}

/// GET /attendance/today/{user_id}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayAttendanceResponse {
    pub checked_in: bool,
    #[serde(default)]
    pub checked_in_at: Option<String>,
}
