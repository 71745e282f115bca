// ============================================================================
// SCANNER VIEW - Modal con cámara en vivo para escanear el QR de asistencia
// ============================================================================
// Solo construye el DOM. El App enlaza <video>/<canvas> con el
// ScanLoopController y los botones con el ViewModel.
// ============================================================================

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlCanvasElement, HtmlVideoElement};

use crate::dom::{append_child, set_text_content, set_visible, ElementBuilder};
use crate::scanner::ScanStatus;
use crate::utils::{SCANNER_CANVAS_ID, SCANNER_MODAL_ID, SCANNER_STATUS_ID, SCANNER_VIDEO_ID};

pub struct ScannerView {
    pub modal: Element,
    pub overlay: Element,
    pub close_button: Element,
    pub video: HtmlVideoElement,
    pub canvas: HtmlCanvasElement,
    pub status: Element,
}

/// Renderizar modal del scanner (oculto hasta que se abre)
pub fn render_scanner() -> Result<ScannerView, JsValue> {
    let modal = ElementBuilder::new("div")?
        .id(SCANNER_MODAL_ID)?
        .class("scanner-modal hidden")
        .build();

    // Click fuera del contenido = cerrar
    let overlay = ElementBuilder::new("div")?
        .class("scanner-overlay")
        .build();
    append_child(&modal, &overlay)?;

    let content = ElementBuilder::new("div")?
        .class("scanner-content")
        .build();

    let title = ElementBuilder::new("h2")?
        .text("Scan attendance QR")
        .build();
    let close_button = ElementBuilder::new("button")?
        .class("btn-close")
        .attr("type", "button")?
        .attr("aria-label", "Close scanner")?
        .text("✕")
        .build();
    let header = ElementBuilder::new("div")?
        .class("scanner-header")
        .child(title)?
        .child(close_button.clone())?
        .build();
    append_child(&content, &header)?;

    // playsinline + muted: iOS no abre el vídeo a pantalla completa
    let video = ElementBuilder::new("video")?
        .id(SCANNER_VIDEO_ID)?
        .class("scanner-video")
        .attr("playsinline", "true")?
        .attr("muted", "true")?
        .attr("autoplay", "true")?
        .build()
        .dyn_into::<HtmlVideoElement>()
        .map_err(|_| JsValue::from_str("<video> is not an HtmlVideoElement"))?;

    // Buffer de frames; también pinta el recuadro del código detectado
    let canvas = ElementBuilder::new("canvas")?
        .id(SCANNER_CANVAS_ID)?
        .class("scanner-canvas")
        .build()
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("<canvas> is not an HtmlCanvasElement"))?;

    let frame_guide = ElementBuilder::new("div")?
        .class("scanner-frame-guide")
        .build();

    let viewport = ElementBuilder::new("div")?
        .class("scanner-viewport")
        .child(video.clone().into())?
        .child(canvas.clone().into())?
        .child(frame_guide)?
        .build();
    append_child(&content, &viewport)?;

    let status = ElementBuilder::new("p")?
        .id(SCANNER_STATUS_ID)?
        .class("scanner-status")
        .attr("aria-live", "polite")?
        .build();
    append_child(&content, &status)?;

    append_child(&modal, &content)?;

    Ok(ScannerView {
        modal,
        overlay,
        close_button,
        video,
        canvas,
        status,
    })
}

/// Sincronizar el modal con el estado del ViewModel
pub fn update_scanner(view: &ScannerView, open: bool, status: ScanStatus) -> Result<(), JsValue> {
    set_visible(&view.modal, open)?;
    set_text_content(&view.status, status.message());
    Ok(())
}
