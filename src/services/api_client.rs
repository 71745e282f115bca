// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP (Stateless)
// ============================================================================
// NO tiene lógica de negocio, solo hace requests HTTP
// ============================================================================

use futures::future::{FutureExt, LocalBoxFuture};
use gloo_net::http::Request;

use crate::config::CONFIG;
use crate::models::{CheckInRequest, CheckInResponse, TodayAttendanceResponse};

/// Operaciones de asistencia que consume la app (el backend es externo)
pub trait AttendanceApi {
    fn submit_check_in(&self, user_id: &str, code: &str) -> LocalBoxFuture<'static, Result<CheckInResponse, String>>;

    fn fetch_today(&self, user_id: &str) -> LocalBoxFuture<'static, Result<TodayAttendanceResponse, String>>;
}

/// Cliente API - SOLO comunicación HTTP (stateless)
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_base_url(&CONFIG.backend_url)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn check_in_url(&self) -> String {
        format!("{}/attendance/check-in", self.base_url)
    }

    pub fn today_url(&self, user_id: &str) -> String {
        format!("{}/attendance/today/{}", self.base_url, urlencoding::encode(user_id))
    }

    /// Registrar asistencia con el código escaneado
    pub async fn check_in(&self, user_id: &str, code: &str) -> Result<CheckInResponse, String> {
        let request = CheckInRequest {
            user_id: user_id.to_string(),
            code: code.to_string(),
        };

        log::info!("📝 [API] Enviando check-in para usuario: {}", user_id);

        let response = Request::post(&self.check_in_url())
            .json(&request)
            .map_err(|e| format!("Serialization error: {}", e))?
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        // El backend responde 4xx con cuerpo JSON {success:false, message}
        if !response.ok() {
            let status = response.status();
            return match response.json::<CheckInResponse>().await {
                Ok(body) => Ok(body),
                Err(_) => Err(format!("HTTP {}: {}", status, response.status_text())),
            };
        }

        response
            .json::<CheckInResponse>()
            .await
            .map_err(|e| format!("Parse error: {}", e))
    }

    /// ¿Ya registró asistencia hoy?
    pub async fn today(&self, user_id: &str) -> Result<TodayAttendanceResponse, String> {
        let response = Request::get(&self.today_url(user_id))
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        if response.status() == 404 {
            return Ok(TodayAttendanceResponse {
                checked_in: false,
                checked_in_at: None,
            });
        }

        if !response.ok() {
            let status = response.status();
            let error_text = response.text().await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!("HTTP error {}: {}", status, error_text));
        }

        response
            .json::<TodayAttendanceResponse>()
            .await
            .map_err(|e| format!("Parse error: {}", e))
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AttendanceApi for ApiClient {
    fn submit_check_in(&self, user_id: &str, code: &str) -> LocalBoxFuture<'static, Result<CheckInResponse, String>> {
        let client = self.clone();
        let (user_id, code) = (user_id.to_string(), code.to_string());
        async move { client.check_in(&user_id, &code).await }.boxed_local()
    }

    fn fetch_today(&self, user_id: &str) -> LocalBoxFuture<'static, Result<TodayAttendanceResponse, String>> {
        let client = self.clone();
        let user_id = user_id.to_string();
        async move { client.today(&user_id).await }.boxed_local()
    }
}
