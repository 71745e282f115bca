// ============================================================================
// SCAN LOOP CONTROLLER - Cámara -> frames -> decode QR -> callback
// ============================================================================
// IDLE --start()--> ACQUIRING --(metadata)--> SCANNING
// ACQUIRING --(error cámara)--> IDLE
// SCANNING --(decode OK)--> IDLE   (resultado entregado, sesión parada)
// SCANNING --stop()--> IDLE
//
// Un solo tick en vuelo: el siguiente se programa al final del anterior.
// Ningún borrow del estado se mantiene mientras se llama a callbacks externos,
// así stop()/start() pueden llamarse desde dentro de ellos.
// ============================================================================

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::future::{self, Either};

use crate::models::DecodedResult;
use crate::scanner::traits::*;

/// Color del overlay del código detectado
const QUAD_COLOR: &str = "#FF3B58";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Acquiring,
    Scanning,
}

/// Mensaje de estado visible para el usuario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStatus {
    #[default]
    Idle,
    Starting,
    Scanning,
    /// Sin código en el frame (o vídeo aún sin frame completo)
    CenterTheCode,
}

impl ScanStatus {
    pub fn message(&self) -> &'static str {
        match self {
            ScanStatus::Idle => "",
            ScanStatus::Starting => "Opening camera…",
            ScanStatus::Scanning => "Scanning…",
            ScanStatus::CenterTheCode => "Center the QR code inside the frame…",
        }
    }
}

/// Contadores de la sesión actual (para logs y diagnóstico)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub ticks: u64,
    pub decode_attempts: u64,
    pub reschedules: u64,
}

type ResultHandler = Rc<dyn Fn(String)>;
type StatusListener = Rc<dyn Fn(ScanStatus)>;

enum TickOutcome {
    Waiting,
    Missed,
    Decoded(DecodedResult),
}

struct Inner<P: ScanPlatform> {
    phase: ScanPhase,
    session_id: u64,
    stream: Option<P::Stream>,
    pending_frame: Option<FrameHandle>,
    /// Despierta a `start()` si se para mientras espera la metadata
    metadata_cancel: Option<oneshot::Sender<()>>,
    video: P::Video,
    buffer: P::Buffer,
    scheduler: P::Scheduler,
    decoder: P::Decoder,
    status: ScanStatus,
    stats: SessionStats,
    on_result: Option<ResultHandler>,
    on_status: Option<StatusListener>,
}

impl<P: ScanPlatform> Inner<P> {
    fn is_current(&self, session_id: u64, phase: ScanPhase) -> bool {
        self.session_id == session_id && self.phase == phase
    }

    /// Cambia el estado; devuelve el listener si hay que notificar
    fn set_status(&mut self, status: ScanStatus) -> Option<StatusListener> {
        if self.status == status {
            return None;
        }
        self.status = status;
        self.on_status.clone()
    }

    fn schedule_tick(&mut self, weak: Weak<RefCell<Inner<P>>>) {
        let session_id = self.session_id;
        let handle = self
            .scheduler
            .request_frame(Box::new(move || tick(&weak, session_id)));
        self.pending_frame = Some(handle);
    }

    fn reschedule(&mut self, weak: Weak<RefCell<Inner<P>>>) {
        self.stats.reschedules += 1;
        self.schedule_tick(weak);
    }

    /// Un frame: copiar, extraer píxeles, intentar decode
    fn sample(&mut self, weak: Weak<RefCell<Inner<P>>>) -> TickOutcome {
        let (width, height) = (self.video.video_width(), self.video.video_height());
        if !self.video.has_enough_data() || width == 0 || height == 0 {
            self.reschedule(weak);
            return TickOutcome::Waiting;
        }

        if self.buffer.width() != width || self.buffer.height() != height {
            log::debug!(
                "📐 [SCANNER] Buffer {}x{} -> {}x{}",
                self.buffer.width(), self.buffer.height(), width, height
            );
            self.buffer.resize(width, height);
        }

        let pixels = match self
            .buffer
            .draw_frame(&self.video)
            .and_then(|_| self.buffer.read_rgba())
        {
            Ok(pixels) => pixels,
            Err(e) => {
                log::warn!("⚠️ [SCANNER] No se pudo leer el frame: {}", e);
                self.reschedule(weak);
                return TickOutcome::Missed;
            }
        };

        self.stats.decode_attempts += 1;
        match self.decoder.decode(&pixels, width, height) {
            Some(result) => {
                self.buffer.draw_quad(&result.bounding_quad, QUAD_COLOR);
                TickOutcome::Decoded(result)
            }
            None => {
                self.reschedule(weak);
                TickOutcome::Missed
            }
        }
    }

    /// Único camino de liberación: cancela tick, suelta vídeo y para tracks
    fn teardown(&mut self) -> bool {
        if self.phase == ScanPhase::Idle && self.stream.is_none() && self.pending_frame.is_none() {
            return false;
        }

        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel(handle);
        }

        if let Some(cancel) = self.metadata_cancel.take() {
            let _ = cancel.send(());
        }

        self.video.pause();
        self.video.detach();

        if let Some(stream) = self.stream.take() {
            stream.stop_all_tracks();
        }

        log::info!(
            "🛑 [SCANNER] Sesión {} parada ({} ticks, {} decodes)",
            self.session_id, self.stats.ticks, self.stats.decode_attempts
        );

        self.phase = ScanPhase::Idle;
        true
    }
}

fn tick<P: ScanPlatform>(weak: &Weak<RefCell<Inner<P>>>, session_id: u64) {
    let Some(cell) = weak.upgrade() else {
        return;
    };

    let (outcome, listener, handler) = {
        let mut inner = cell.borrow_mut();

        // Un cancel puede cruzarse con un callback ya encolado
        if !inner.is_current(session_id, ScanPhase::Scanning) {
            log::debug!("⏭️ [SCANNER] Tick obsoleto de la sesión {} ignorado", session_id);
            return;
        }

        inner.pending_frame = None;
        inner.stats.ticks += 1;

        let outcome = inner.sample(weak.clone());
        let listener = match outcome {
            TickOutcome::Decoded(_) => None,
            TickOutcome::Waiting | TickOutcome::Missed => inner.set_status(ScanStatus::CenterTheCode),
        };
        (outcome, listener, inner.on_result.clone())
    };

    if let Some(listener) = listener {
        listener(ScanStatus::CenterTheCode);
    }

    if let TickOutcome::Decoded(result) = outcome {
        log::info!("✅ [SCANNER] Código QR detectado ({} caracteres)", result.text.len());
        shutdown(&cell);
        match handler {
            Some(handler) => handler(result.text),
            None => log::warn!("⚠️ [SCANNER] Código detectado sin handler registrado"),
        }
    }
}

fn shutdown<P: ScanPlatform>(cell: &Rc<RefCell<Inner<P>>>) {
    let listener = {
        let mut inner = cell.borrow_mut();
        if !inner.teardown() {
            return;
        }
        inner.set_status(ScanStatus::Idle)
    };

    if let Some(listener) = listener {
        listener(ScanStatus::Idle);
    }
}

fn notify<P: ScanPlatform>(cell: &Rc<RefCell<Inner<P>>>, status: ScanStatus) {
    let listener = cell.borrow_mut().set_status(status);
    if let Some(listener) = listener {
        listener(status);
    }
}

/// Controller del loop de escaneo. Una sesión activa como máximo.
pub struct ScanLoopController<P: ScanPlatform> {
    camera: P::Camera,
    constraints: VideoConstraints,
    inner: Rc<RefCell<Inner<P>>>,
}

impl<P: ScanPlatform> ScanLoopController<P> {
    pub fn new(
        camera: P::Camera,
        video: P::Video,
        buffer: P::Buffer,
        scheduler: P::Scheduler,
        decoder: P::Decoder,
        constraints: VideoConstraints,
    ) -> Self {
        Self {
            camera,
            constraints,
            inner: Rc::new(RefCell::new(Inner {
                phase: ScanPhase::Idle,
                session_id: 0,
                stream: None,
                pending_frame: None,
                metadata_cancel: None,
                video,
                buffer,
                scheduler,
                decoder,
                status: ScanStatus::Idle,
                stats: SessionStats::default(),
                on_result: None,
                on_status: None,
            })),
        }
    }

    /// Handler del texto decodificado (una vez por sesión)
    pub fn set_result_handler<F>(&self, handler: F)
    where
        F: Fn(String) + 'static,
    {
        self.inner.borrow_mut().on_result = Some(Rc::new(handler));
    }

    pub fn set_status_listener<F>(&self, listener: F)
    where
        F: Fn(ScanStatus) + 'static,
    {
        self.inner.borrow_mut().on_status = Some(Rc::new(listener));
    }

    pub fn phase(&self) -> ScanPhase {
        self.inner.borrow().phase
    }

    pub fn is_active(&self) -> bool {
        self.phase() != ScanPhase::Idle
    }

    pub fn status(&self) -> ScanStatus {
        self.inner.borrow().status
    }

    pub fn session_stats(&self) -> SessionStats {
        self.inner.borrow().stats
    }

    /// Abre la cámara y arranca el loop. No-op si ya hay sesión.
    ///
    /// Si falla, no queda ningún stream abierto y el estado vuelve a IDLE.
    /// Si se llama a `stop()` mientras se espera la cámara, el stream que
    /// llegue después se libera y `start` termina sin activar la sesión.
    pub async fn start(&self) -> Result<(), CameraAccessError> {
        let session_id = {
            let mut inner = self.inner.borrow_mut();
            if inner.phase != ScanPhase::Idle {
                log::info!("📷 [SCANNER] start() ignorado, sesión ya en {:?}", inner.phase);
                return Ok(());
            }
            inner.session_id += 1;
            inner.phase = ScanPhase::Acquiring;
            inner.stats = SessionStats::default();
            inner.session_id
        };
        notify(&self.inner, ScanStatus::Starting);

        log::info!(
            "📷 [SCANNER] Solicitando cámara {} ({}x{})",
            self.constraints.facing_mode.as_str(),
            self.constraints.ideal_width,
            self.constraints.ideal_height
        );

        let stream = match self.camera.acquire(&self.constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("❌ [SCANNER] Acceso a cámara fallido: {}", e);
                self.abort_start(session_id);
                return Err(e);
            }
        };

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let metadata = {
            let mut inner = self.inner.borrow_mut();
            if !inner.is_current(session_id, ScanPhase::Acquiring) {
                log::info!("🛑 [SCANNER] Parado durante la adquisición, liberando stream");
                stream.stop_all_tracks();
                return Ok(());
            }
            match inner.video.attach(&stream) {
                Ok(()) => {
                    // A partir de aquí stop() es quien libera el stream
                    inner.stream = Some(stream);
                    inner.metadata_cancel = Some(cancel_tx);
                    Ok(inner.video.wait_for_metadata())
                }
                Err(e) => {
                    stream.stop_all_tracks();
                    Err(e)
                }
            }
        };

        let metadata = match metadata {
            Ok(metadata) => metadata,
            Err(e) => {
                log::error!("❌ [SCANNER] No se pudo enlazar el stream al vídeo: {}", e);
                self.abort_start(session_id);
                return Err(e);
            }
        };

        // Sin srcObject el vídeo nunca emite loadedmetadata: stop() corta la espera
        match future::select(metadata, cancel_rx).await {
            Either::Left((Ok(()), _)) => {}
            Either::Left((Err(e), _)) => {
                log::error!("❌ [SCANNER] Metadata del vídeo no disponible: {}", e);
                self.abort_start(session_id);
                return Err(e);
            }
            Either::Right(_) => {
                log::info!("🛑 [SCANNER] Parado mientras se esperaba la metadata");
                return Ok(());
            }
        }

        let started = {
            let mut inner = self.inner.borrow_mut();
            if !inner.is_current(session_id, ScanPhase::Acquiring) {
                return Ok(());
            }
            inner.metadata_cancel = None;
            match inner.video.play() {
                Ok(()) => {
                    log::info!(
                        "✅ [SCANNER] Cámara lista {}x{}, escaneando",
                        inner.video.video_width(),
                        inner.video.video_height()
                    );
                    inner.phase = ScanPhase::Scanning;
                    inner.schedule_tick(Rc::downgrade(&self.inner));
                    Ok(())
                }
                Err(e) => Err(e),
            }
        };

        match started {
            Ok(()) => {
                notify(&self.inner, ScanStatus::Scanning);
                Ok(())
            }
            Err(e) => {
                log::error!("❌ [SCANNER] play() fallido: {}", e);
                self.abort_start(session_id);
                Err(e)
            }
        }
    }

    /// Para la sesión y libera la cámara. Idempotente.
    pub fn stop(&self) {
        shutdown(&self.inner);
    }

    fn abort_start(&self, session_id: u64) {
        let current = self.inner.borrow().is_current(session_id, ScanPhase::Acquiring);
        if current {
            shutdown(&self.inner);
        }
    }
}

impl<P: ScanPlatform> Drop for ScanLoopController<P> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.teardown();
        }
    }
}
