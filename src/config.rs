// ============================================================================
// CONFIG - Configuración en tiempo de compilación (build.rs + .env)
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::scanner::{FacingMode, InversionMode, VideoConstraints};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend_url: String,
    pub environment: String,
    pub enable_logging: bool,
    pub scanner: ScannerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8080/api".to_string(),
            environment: "development".to_string(),
            enable_logging: true,
            scanner: ScannerConfig::default(),
        }
    }
}

/// Parámetros de la cámara pedidos al abrir el scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing_mode: FacingMode,
    /// Polaridad que prueba el decoder (por defecto solo imagen normal)
    pub inversion: InversionMode,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing_mode: FacingMode::Environment,
            inversion: InversionMode::DontInvert,
        }
    }
}

impl ScannerConfig {
    /// Constraints de vídeo (nunca audio)
    pub fn constraints(&self) -> VideoConstraints {
        VideoConstraints {
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
            facing_mode: self.facing_mode,
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno en tiempo de compilación
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend_url: option_env!("BACKEND_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.backend_url),
            environment: option_env!("ENVIRONMENT")
                .unwrap_or("development").to_string(),
            enable_logging: option_env!("ENABLE_LOGGING")
                .unwrap_or("true").parse().unwrap_or(true),
            scanner: ScannerConfig {
                ideal_width: option_env!("SCAN_IDEAL_WIDTH")
                    .unwrap_or("1280").parse().unwrap_or(1280),
                ideal_height: option_env!("SCAN_IDEAL_HEIGHT")
                    .unwrap_or("720").parse().unwrap_or(720),
                facing_mode: option_env!("SCAN_FACING_MODE")
                    .map(FacingMode::parse)
                    .unwrap_or(FacingMode::Environment),
                inversion: option_env!("SCAN_INVERSION_MODE")
                    .map(InversionMode::parse)
                    .unwrap_or_default(),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Nivel de log según entorno
    pub fn log_level(&self) -> log::Level {
        match (self.enable_logging, self.is_production()) {
            (false, _) => log::Level::Error,
            (true, true) => log::Level::Info,
            (true, false) => log::Level::Debug,
        }
    }
}

// Configuración global estática
lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}
