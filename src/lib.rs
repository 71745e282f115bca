// ============================================================================
// YOUTH ATTENDANCE APP - CHECK-IN POR QR (RUST PURO)
// ============================================================================
// - Scanner: cámara -> frames -> decode QR (rqrr), detrás de traits de plataforma
// - ViewModels: Estado + Lógica UI
// - Views: Funciones que construyen DOM (sin lógica)
// - Services: SOLO comunicación API
// - State: sesión del usuario y estado reactivo con Rc<RefCell>
// ============================================================================

mod app;
mod config;
mod dom;
mod models;
mod scanner;
mod services;
mod state;
mod utils;
mod viewmodels;
mod views;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;
use wasm_logger::Config;

use crate::app::App;
use crate::config::CONFIG;

// Instancia global de App (vive lo que vive la página)
thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    wasm_logger::init(Config::new(CONFIG.log_level()));
    log::info!(
        "🚀 Youth Attendance App ({}) - backend {}",
        CONFIG.environment,
        CONFIG.backend_url
    );

    let app = App::new()?;
    APP.with(|cell| {
        *cell.borrow_mut() = Some(app);
    });

    Ok(())
}

/// Cerrar el scanner desde JavaScript (p.ej. al navegar a otra pantalla)
#[wasm_bindgen]
pub fn stop_scanner() {
    APP.with(|cell| {
        if let Some(ref app) = *cell.borrow() {
            app.shutdown();
        } else {
            log::warn!("⚠️ [MAIN] App no está inicializada");
        }
    });
}
