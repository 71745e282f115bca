/// Clave de localStorage donde la pantalla de login guarda el usuario
pub const USER_STORAGE_KEY: &str = "currentUser";

/// Duración de los avisos (check-in OK / error) antes de ocultarse
pub const NOTICE_TIMEOUT_MS: u32 = 4_000;

/// IDs del DOM del scanner
pub const SCANNER_MODAL_ID: &str = "scanner-modal";
pub const SCANNER_VIDEO_ID: &str = "scanner-video";
pub const SCANNER_CANVAS_ID: &str = "scanner-canvas";
pub const SCANNER_STATUS_ID: &str = "scanner-status";
pub const ATTENDANCE_NOTICE_ID: &str = "attendance-notice";
pub const SCAN_BUTTON_ID: &str = "scan-button";
