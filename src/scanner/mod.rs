// ============================================================================
// SCANNER - Loop de escaneo QR con cámara (asistencia)
// ============================================================================
// Implementaciones por plataforma detrás de traits comunes:
// - controller: máquina de estados + loop por frame
// - decoder: rqrr (Rust puro)
// - web: web-sys (getUserMedia, video, canvas, requestAnimationFrame)
// ============================================================================

pub mod traits;
pub mod decoder;
pub mod controller;
pub mod web;

#[cfg(test)]
pub mod testing;

pub use traits::*;
pub use decoder::RqrrDecoder;
pub use controller::{ScanLoopController, ScanPhase, ScanStatus, SessionStats};
pub use web::WebPlatform;
