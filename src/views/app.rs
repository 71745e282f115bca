// ============================================================================
// APP VIEW - Tarjeta de asistencia + modal del scanner
// ============================================================================

use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::dom::{append_child, set_disabled, set_text_content, set_visible, ElementBuilder};
use crate::state::SessionProvider;
use crate::utils::{ATTENDANCE_NOTICE_ID, SCAN_BUTTON_ID};
use crate::viewmodels::AttendanceUi;
use crate::views::scanner::{render_scanner, update_scanner, ScannerView};

pub struct AppView {
    pub root: Element,
    pub greeting: Element,
    pub attendance_status: Element,
    pub scan_button: Element,
    pub logout_button: Element,
    pub notice: Element,
    pub login_notice: Element,
    pub card: Element,
    pub scanner: ScannerView,
}

pub fn render_app() -> Result<AppView, JsValue> {
    let root = ElementBuilder::new("main")?
        .class("attendance-app")
        .build();

    let header = ElementBuilder::new("header")?
        .class("app-header")
        .child(ElementBuilder::new("h1")?.text("Youth Attendance").build())?
        .build();
    append_child(&root, &header)?;

    // Sin usuario: la pantalla de login (externa) guarda el usuario en storage
    let login_notice = ElementBuilder::new("p")?
        .class("login-notice hidden")
        .text("Please log in to check in.")
        .build();
    append_child(&root, &login_notice)?;

    let greeting = ElementBuilder::new("h2")?
        .class("attendance-greeting")
        .build();
    let attendance_status = ElementBuilder::new("p")?
        .class("attendance-status")
        .build();
    let scan_button = ElementBuilder::new("button")?
        .id(SCAN_BUTTON_ID)?
        .class("btn-primary btn-scan")
        .attr("type", "button")?
        .text("📷 Scan QR to check in")
        .build();
    let logout_button = ElementBuilder::new("button")?
        .class("btn-link btn-logout")
        .attr("type", "button")?
        .text("Log out")
        .build();

    let card = ElementBuilder::new("section")?
        .class("attendance-card hidden")
        .child(greeting.clone())?
        .child(attendance_status.clone())?
        .child(scan_button.clone())?
        .child(logout_button.clone())?
        .build();
    append_child(&root, &card)?;

    let notice = ElementBuilder::new("div")?
        .id(ATTENDANCE_NOTICE_ID)?
        .class("notice hidden")
        .attr("role", "status")?
        .build();
    append_child(&root, &notice)?;

    let scanner = render_scanner()?;
    append_child(&root, &scanner.modal)?;

    Ok(AppView {
        root,
        greeting,
        attendance_status,
        scan_button,
        logout_button,
        notice,
        login_notice,
        card,
        scanner,
    })
}

/// Pintar el estado actual (se llama en cada cambio del ViewModel)
pub fn update_app(view: &AppView, ui: &AttendanceUi, session: &SessionProvider) -> Result<(), JsValue> {
    match session.current_user() {
        Some(user) => {
            set_visible(&view.login_notice, false)?;
            set_visible(&view.card, true)?;
            set_text_content(&view.greeting, &format!("Hi, {}", user.display_name()));

            let checked_in = session.checked_in_today();
            let status = if ui.submitting {
                "Submitting your check-in…"
            } else if checked_in {
                "✅ You are checked in for today."
            } else {
                "You have not checked in yet today."
            };
            set_text_content(&view.attendance_status, status);
            set_disabled(&view.scan_button, checked_in || ui.submitting || ui.scanner_open)?;
        }
        None => {
            set_visible(&view.login_notice, true)?;
            set_visible(&view.card, false)?;
        }
    }

    match &ui.notice {
        Some(notice) => {
            view.notice.set_class_name(notice.css_class());
            set_text_content(&view.notice, notice.message());
        }
        None => {
            view.notice.set_class_name("notice hidden");
            set_text_content(&view.notice, "");
        }
    }

    update_scanner(&view.scanner, ui.scanner_open, ui.scan_status)
}
