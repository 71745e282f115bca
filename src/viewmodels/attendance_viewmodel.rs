// ============================================================================
// ATTENDANCE VIEWMODEL - Escanear QR y registrar asistencia
// ============================================================================
// Dueño del ScanLoopController: abre/cierra el scanner, recibe el código y lo
// envía al backend. La vista solo lee `ui()` y llama a estos métodos.
// ============================================================================

use std::rc::{Rc, Weak};

use futures::future::{FutureExt, LocalBoxFuture};

use crate::models::User;
use crate::scanner::{ScanLoopController, ScanPlatform, ScanStatus};
use crate::services::AttendanceApi;
use crate::state::{ReactiveState, SessionProvider};

/// Lanza futures en el event loop (spawn_local en el navegador)
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

const NETWORK_ERROR_MESSAGE: &str = "Could not reach the server. Check your connection and scan again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(m) | Notice::Success(m) | Notice::Error(m) => m,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Notice::Info(_) => "notice notice-info",
            Notice::Success(_) => "notice notice-success",
            Notice::Error(_) => "notice notice-error",
        }
    }
}

/// Estado que pinta la vista
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttendanceUi {
    pub scanner_open: bool,
    pub scan_status: ScanStatus,
    pub submitting: bool,
    pub notice: Option<Notice>,
}

pub struct AttendanceViewModel<P: ScanPlatform, A: AttendanceApi> {
    scanner: ScanLoopController<P>,
    session: SessionProvider,
    api: A,
    ui: ReactiveState<AttendanceUi>,
    spawner: Spawner,
}

impl<P: ScanPlatform, A: AttendanceApi + 'static> AttendanceViewModel<P, A> {
    pub fn new(
        scanner: ScanLoopController<P>,
        session: SessionProvider,
        api: A,
        spawner: Spawner,
    ) -> Rc<Self> {
        let vm = Rc::new(Self {
            scanner,
            session,
            api,
            ui: ReactiveState::new(AttendanceUi::default()),
            spawner,
        });

        let weak: Weak<Self> = Rc::downgrade(&vm);
        vm.scanner.set_result_handler(move |code| {
            if let Some(vm) = weak.upgrade() {
                vm.on_code_decoded(code);
            }
        });

        let ui = vm.ui.clone();
        vm.scanner
            .set_status_listener(move |status| ui.update(|s| s.scan_status = status));

        vm
    }

    pub fn ui(&self) -> ReactiveState<AttendanceUi> {
        self.ui.clone()
    }

    pub fn session(&self) -> &SessionProvider {
        &self.session
    }

    pub fn scanner(&self) -> &ScanLoopController<P> {
        &self.scanner
    }

    /// Usuario que puede escanear ahora, o el motivo por el que no
    pub fn scan_eligibility(&self) -> Result<User, String> {
        let user = self
            .session
            .current_user()
            .ok_or_else(|| "Please log in to check in.".to_string())?;

        if self.session.checked_in_today() {
            return Err("You have already checked in today.".to_string());
        }
        if self.ui.get().submitting {
            return Err("Your last scan is still being submitted.".to_string());
        }
        Ok(user)
    }

    /// Abrir el scanner. Resuelve cuando la cámara está escaneando (o falló).
    pub async fn begin_scan(&self) -> Result<(), String> {
        let user = match self.scan_eligibility() {
            Ok(user) => user,
            Err(msg) => {
                log::info!("🚫 [ATTENDANCE] Escaneo rechazado: {}", msg);
                self.ui.update(|s| s.notice = Some(Notice::Info(msg.clone())));
                return Err(msg);
            }
        };

        log::info!("📷 [ATTENDANCE] Abriendo scanner para {}", user.id);
        self.ui.update(|s| {
            s.scanner_open = true;
            s.notice = None;
        });

        match self.scanner.start().await {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("❌ [ATTENDANCE] Cámara no disponible: {}", e);
                let msg = e.user_message();
                self.ui.update(|s| {
                    s.scanner_open = false;
                    s.notice = Some(Notice::Error(msg.clone()));
                });
                Err(msg)
            }
        }
    }

    /// Cerrar el scanner sin resultado (botón cerrar, cambio de página)
    pub fn close_scanner(&self) {
        self.scanner.stop();
        if self.ui.get().scanner_open {
            self.ui.update(|s| s.scanner_open = false);
        }
    }

    /// Cerrar sesión: apaga la cámara y borra el usuario guardado
    pub fn logout(&self) {
        log::info!("👋 [ATTENDANCE] Logout");
        self.scanner.stop();
        self.session.logout();
        self.ui.update(|s| *s = AttendanceUi::default());
    }

    fn on_code_decoded(self: Rc<Self>, code: String) {
        // El controller ya se paró solo; el stop es idempotente
        self.scanner.stop();
        let stats = self.scanner.session_stats();
        log::debug!(
            "📊 [ATTENDANCE] Código tras {} ticks / {} decodes",
            stats.ticks, stats.decode_attempts
        );
        self.ui.update(|s| {
            s.scanner_open = false;
            s.submitting = true;
        });

        let vm = Rc::clone(&self);
        (self.spawner)(
            async move {
                let _ = vm.submit_code(code).await;
            }
            .boxed_local(),
        );
    }

    /// Enviar el código escaneado al backend
    pub async fn submit_code(&self, code: String) -> Result<(), String> {
        let outcome = match self.session.current_user() {
            None => Err("Please log in to check in.".to_string()),
            Some(user) => match self.api.submit_check_in(&user.id, &code).await {
                Ok(response) if response.success => {
                    log::info!("✅ [ATTENDANCE] Asistencia registrada: {}", user.id);
                    self.session.mark_checked_in_today();
                    Ok(format!("Welcome, {}! You are checked in.", user.name))
                }
                Ok(response) => {
                    log::warn!("⚠️ [ATTENDANCE] Check-in rechazado: {:?}", response.message);
                    Err(response.failure_message())
                }
                Err(e) => {
                    log::error!("❌ [ATTENDANCE] Error enviando check-in: {}", e);
                    Err(NETWORK_ERROR_MESSAGE.to_string())
                }
            },
        };

        let notice = match &outcome {
            Ok(msg) => Notice::Success(msg.clone()),
            Err(msg) => Notice::Error(msg.clone()),
        };
        self.ui.update(|s| {
            s.submitting = false;
            s.notice = Some(notice);
        });

        outcome.map(|_| ())
    }

    /// Consultar al backend si el usuario ya registró hoy
    pub async fn refresh_today(&self) -> Result<bool, String> {
        let user = self
            .session
            .current_user()
            .ok_or_else(|| "No user logged in".to_string())?;

        let response = self.api.fetch_today(&user.id).await?;
        if response.checked_in {
            log::info!("📅 [ATTENDANCE] {} ya registró asistencia hoy", user.id);
            self.session.mark_checked_in_today();
            // Re-pintar la tarjeta
            self.ui.update(|_| {});
        }
        Ok(response.checked_in)
    }

    pub fn dismiss_notice(&self) {
        if self.ui.get().notice.is_some() {
            self.ui.update(|s| s.notice = None);
        }
    }
}
