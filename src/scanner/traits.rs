// ============================================================================
// SCANNER TRAITS - Contratos de plataforma para el loop de escaneo
// ============================================================================
// El controller solo habla con estos traits: en el navegador los implementa
// `scanner::web` (web-sys), en tests `scanner::testing` (fakes en memoria).
// ============================================================================

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::models::{DecodedResult, Point};

/// Cámara preferida
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Cámara trasera
    Environment,
    /// Cámara frontal
    User,
}

impl FacingMode {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" | "front" => FacingMode::User,
            _ => FacingMode::Environment,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

/// Petición de stream: solo vídeo, sin audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing_mode: FacingMode,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing_mode: FacingMode::Environment,
        }
    }
}

/// Error al obtener la cámara. Es el único error del scanner: un frame sin
/// código no es un error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraAccessError {
    PermissionDenied,
    NotFound,
    DeviceBusy,
    InsecureContext,
    Unsupported,
    Other(String),
}

impl CameraAccessError {
    /// Traduce el `name` de un DOMException de getUserMedia
    pub fn from_dom_exception_name(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => CameraAccessError::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => CameraAccessError::NotFound,
            "NotReadableError" | "TrackStartError" | "AbortError" => CameraAccessError::DeviceBusy,
            "SecurityError" => CameraAccessError::InsecureContext,
            "TypeError" | "NotSupportedError" => CameraAccessError::Unsupported,
            _ => CameraAccessError::Other(format!("{}: {}", name, message)),
        }
    }

    /// Mensaje para mostrar al usuario
    pub fn user_message(&self) -> String {
        match self {
            CameraAccessError::PermissionDenied => "Camera permission is required to scan the attendance QR code.".to_string(),
            CameraAccessError::NotFound => "No camera was found on this device.".to_string(),
            CameraAccessError::DeviceBusy => "The camera is being used by another app. Close it and try again.".to_string(),
            CameraAccessError::InsecureContext => "The camera only works over HTTPS.".to_string(),
            CameraAccessError::Unsupported => "This browser does not support camera access.".to_string(),
            CameraAccessError::Other(msg) => format!("Could not open the camera ({}).", msg),
        }
    }
}

impl std::fmt::Display for CameraAccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraAccessError::PermissionDenied => write!(f, "Camera permission denied"),
            CameraAccessError::NotFound => write!(f, "No camera found"),
            CameraAccessError::DeviceBusy => write!(f, "Camera is busy"),
            CameraAccessError::InsecureContext => write!(f, "Camera requires a secure context"),
            CameraAccessError::Unsupported => write!(f, "Camera API not supported"),
            CameraAccessError::Other(msg) => write!(f, "Camera error: {}", msg),
        }
    }
}

impl std::error::Error for CameraAccessError {}

/// Stream de cámara adquirido (propiedad exclusiva de una sesión)
pub trait MediaStreamHandle {
    /// Tracks que siguen vivos
    fn live_track_count(&self) -> usize;

    /// Para todos los tracks (apaga el indicador de cámara)
    fn stop_all_tracks(&self);
}

/// Fuente de streams de cámara
pub trait CameraProvider {
    type Stream: MediaStreamHandle;

    fn acquire(&self, constraints: &VideoConstraints) -> LocalBoxFuture<'_, Result<Self::Stream, CameraAccessError>>;
}

/// Superficie de vídeo visible
pub trait VideoSurface {
    type Stream: MediaStreamHandle;

    fn attach(&mut self, stream: &Self::Stream) -> Result<(), CameraAccessError>;

    /// Resuelve cuando las dimensiones nativas están disponibles.
    /// El future no toma prestada la superficie.
    fn wait_for_metadata(&self) -> LocalBoxFuture<'static, Result<(), CameraAccessError>>;

    fn play(&mut self) -> Result<(), CameraAccessError>;

    fn pause(&mut self);

    fn detach(&mut self);

    /// true cuando hay un frame completo disponible
    fn has_enough_data(&self) -> bool;

    fn video_width(&self) -> u32;

    fn video_height(&self) -> u32;
}

/// Buffer de píxeles fuera de pantalla (canvas)
pub trait PixelBuffer {
    type Source;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn resize(&mut self, width: u32, height: u32);

    /// Copia el frame actual de la fuente al buffer
    fn draw_frame(&mut self, source: &Self::Source) -> Result<(), String>;

    /// Píxeles RGBA del buffer completo
    fn read_rgba(&self) -> Result<Vec<u8>, String>;

    /// Overlay de diagnóstico sobre el código detectado
    fn draw_quad(&mut self, quad: &[Point; 4], color: &str);
}

/// Handle de un callback programado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Programador ligado al repintado de la pantalla
pub trait FrameScheduler {
    fn request_frame(&mut self, callback: Box<dyn FnOnce()>) -> FrameHandle;

    fn cancel(&mut self, handle: FrameHandle);
}

/// Polaridad a probar al decodificar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InversionMode {
    /// Solo imagen normal (oscuro sobre claro)
    #[default]
    DontInvert,
    OnlyInvert,
    AttemptBoth,
    InvertFirst,
}

impl InversionMode {
    /// Valor de SCAN_INVERSION_MODE; cualquier otro valor = sin invertir
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "only_invert" => InversionMode::OnlyInvert,
            "attempt_both" | "both" => InversionMode::AttemptBoth,
            "invert_first" => InversionMode::InvertFirst,
            _ => InversionMode::DontInvert,
        }
    }

    /// Pasadas en orden: false = normal, true = invertida
    pub fn passes(&self) -> &'static [bool] {
        match self {
            InversionMode::DontInvert => &[false],
            InversionMode::OnlyInvert => &[true],
            InversionMode::AttemptBoth => &[false, true],
            InversionMode::InvertFirst => &[true, false],
        }
    }
}

pub trait QrDecoder {
    fn decode(&self, rgba: &[u8], width: u32, height: u32) -> Option<DecodedResult>;
}

/// Conjunto de implementaciones que usa un controller
pub trait ScanPlatform: 'static {
    type Stream: MediaStreamHandle + 'static;
    type Camera: CameraProvider<Stream = Self::Stream> + 'static;
    type Video: VideoSurface<Stream = Self::Stream> + 'static;
    type Buffer: PixelBuffer<Source = Self::Video> + 'static;
    type Scheduler: FrameScheduler + 'static;
    type Decoder: QrDecoder + 'static;
}
