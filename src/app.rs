// ============================================================================
// APP - Aplicación principal: DOM + scanner web + ViewModel
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;

use crate::config::CONFIG;
use crate::dom::{append_child, document, get_element_by_id, on_click, on_document_event, on_window_event};
use crate::scanner::web::{AnimationFrameScheduler, WebCamera, WebPixelBuffer, WebVideoSurface};
use crate::scanner::{RqrrDecoder, ScanLoopController, WebPlatform};
use crate::services::ApiClient;
use crate::state::SessionProvider;
use crate::utils::NOTICE_TIMEOUT_MS;
use crate::viewmodels::{AttendanceViewModel, Notice, Spawner};
use crate::views::{render_app, update_app, AppView};

type WebAttendanceViewModel = AttendanceViewModel<WebPlatform, ApiClient>;

/// Aplicación principal
pub struct App {
    vm: Rc<WebAttendanceViewModel>,
    _view: Rc<AppView>,
}

impl App {
    pub fn new() -> Result<Self, JsValue> {
        let root = get_element_by_id("app")
            .ok_or_else(|| JsValue::from_str("No #app element found"))?;

        let session = SessionProvider::restore();

        let view = Rc::new(render_app()?);
        append_child(&root, &view.root)?;

        let controller: ScanLoopController<WebPlatform> = ScanLoopController::new(
            WebCamera,
            WebVideoSurface::new(view.scanner.video.clone()),
            WebPixelBuffer::new(view.scanner.canvas.clone())?,
            AnimationFrameScheduler::default(),
            RqrrDecoder::new(CONFIG.scanner.inversion),
            CONFIG.scanner.constraints(),
        );

        let spawner: Spawner = Rc::new(|fut: LocalBoxFuture<'static, ()>| wasm_bindgen_futures::spawn_local(fut));
        let vm = AttendanceViewModel::new(controller, session, ApiClient::new(), spawner);

        Self::bind_rendering(&vm, &view);
        Self::bind_events(&vm, &view)?;

        if let Err(e) = update_app(&view, &vm.ui().get(), vm.session()) {
            log::error!("❌ [APP] Error en el render inicial: {:?}", e);
        }

        if vm.session().is_logged_in() {
            let vm_today = Rc::clone(&vm);
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = vm_today.refresh_today().await {
                    log::warn!("⚠️ [APP] No se pudo consultar la asistencia de hoy: {}", e);
                }
            });
        }

        log::info!("✅ [APP] App inicializada");
        Ok(Self { vm, _view: view })
    }

    /// Re-pintar en cada cambio y ocultar avisos tras unos segundos
    fn bind_rendering(vm: &Rc<WebAttendanceViewModel>, view: &Rc<AppView>) {
        let weak = Rc::downgrade(vm);
        let view = Rc::clone(view);
        let last_notice: Rc<RefCell<Option<Notice>>> = Rc::new(RefCell::new(None));
        let notice_timer: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));

        vm.ui().subscribe(move || {
            let Some(vm) = weak.upgrade() else {
                return;
            };
            let ui = vm.ui().get();
            if let Err(e) = update_app(&view, &ui, vm.session()) {
                log::error!("❌ [APP] Error actualizando la vista: {:?}", e);
            }

            if *last_notice.borrow() == ui.notice {
                return;
            }
            *last_notice.borrow_mut() = ui.notice.clone();

            // Reemplazar el Timeout cancela el anterior
            let timer = ui.notice.as_ref().map(|_| {
                let weak = Rc::downgrade(&vm);
                Timeout::new(NOTICE_TIMEOUT_MS, move || {
                    if let Some(vm) = weak.upgrade() {
                        vm.dismiss_notice();
                    }
                })
            });
            *notice_timer.borrow_mut() = timer;
        });
    }

    fn bind_events(vm: &Rc<WebAttendanceViewModel>, view: &AppView) -> Result<(), JsValue> {
        {
            let weak = Rc::downgrade(vm);
            on_click(&view.scan_button, move |_| {
                if let Some(vm) = weak.upgrade() {
                    wasm_bindgen_futures::spawn_local(async move {
                        let _ = vm.begin_scan().await;
                    });
                }
            })?;
        }

        {
            let weak = Rc::downgrade(vm);
            on_click(&view.logout_button, move |_| {
                if let Some(vm) = weak.upgrade() {
                    vm.logout();
                }
            })?;
        }

        for target in [&view.scanner.close_button, &view.scanner.overlay] {
            let weak = Rc::downgrade(vm);
            on_click(target, move |_| {
                log::info!("❎ [APP] Scanner cerrado por el usuario");
                if let Some(vm) = weak.upgrade() {
                    vm.close_scanner();
                }
            })?;
        }

        // Salir de la página o pasar a segundo plano apaga la cámara
        {
            let weak = Rc::downgrade(vm);
            on_window_event("pagehide", move |_| {
                if let Some(vm) = weak.upgrade() {
                    vm.close_scanner();
                }
            })?;
        }
        {
            let weak = Rc::downgrade(vm);
            on_document_event("visibilitychange", move |_| {
                let hidden = document().map(|d| d.hidden()).unwrap_or(false);
                if !hidden {
                    return;
                }
                if let Some(vm) = weak.upgrade() {
                    if vm.scanner().is_active() {
                        log::info!("🙈 [APP] Página oculta, parando scanner");
                        vm.close_scanner();
                    }
                }
            })?;
        }

        Ok(())
    }

    pub fn shutdown(&self) {
        self.vm.close_scanner();
    }
}
