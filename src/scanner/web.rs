// ============================================================================
// SCANNER WEB - Implementación con web-sys (getUserMedia, <video>, <canvas>)
// ============================================================================

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, DomException, HtmlCanvasElement, HtmlMediaElement, HtmlVideoElement,
    MediaStream, MediaStreamConstraints, MediaStreamTrack, MediaStreamTrackState,
};

use crate::models::Point;
use crate::scanner::decoder::RqrrDecoder;
use crate::scanner::traits::*;

fn camera_error(err: JsValue) -> CameraAccessError {
    if let Some(dom) = err.dyn_ref::<DomException>() {
        return CameraAccessError::from_dom_exception_name(&dom.name(), &dom.message());
    }
    if let Some(js_err) = err.dyn_ref::<js_sys::Error>() {
        let name: String = js_err.name().into();
        let message: String = js_err.message().into();
        return CameraAccessError::from_dom_exception_name(&name, &message);
    }
    CameraAccessError::Other(format!("{:?}", err))
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), CameraAccessError> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(camera_error)
}

/// Stream de getUserMedia
pub struct WebMediaStream {
    stream: MediaStream,
}

impl WebMediaStream {
    fn tracks(&self) -> Vec<MediaStreamTrack> {
        self.stream
            .get_tracks()
            .iter()
            .filter_map(|t| t.dyn_into::<MediaStreamTrack>().ok())
            .collect()
    }
}

impl MediaStreamHandle for WebMediaStream {
    fn live_track_count(&self) -> usize {
        self.tracks()
            .iter()
            .filter(|t| t.ready_state() == MediaStreamTrackState::Live)
            .count()
    }

    fn stop_all_tracks(&self) {
        for track in self.tracks() {
            track.stop();
        }
        log::info!("📴 [SCANNER] Tracks de cámara parados");
    }
}

/// navigator.mediaDevices
#[derive(Default)]
pub struct WebCamera;

/// Valor de un campo de `video` en getUserMedia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintValue {
    Exact(&'static str),
    Ideal(u32),
}

/// Campos del objeto `video` pedido a getUserMedia
fn video_constraint_fields(constraints: &VideoConstraints) -> [(&'static str, ConstraintValue); 3] {
    [
        ("facingMode", ConstraintValue::Exact(constraints.facing_mode.as_str())),
        ("width", ConstraintValue::Ideal(constraints.ideal_width)),
        ("height", ConstraintValue::Ideal(constraints.ideal_height)),
    ]
}

impl WebCamera {
    fn build_constraints(constraints: &VideoConstraints) -> Result<MediaStreamConstraints, CameraAccessError> {
        let video = Object::new();
        for (key, value) in video_constraint_fields(constraints) {
            let js_value: JsValue = match value {
                ConstraintValue::Exact(text) => JsValue::from_str(text),
                ConstraintValue::Ideal(number) => {
                    let ideal = Object::new();
                    set(&ideal, "ideal", &JsValue::from_f64(number as f64))?;
                    ideal.into()
                }
            };
            set(&video, key, &js_value)?;
        }

        let request = MediaStreamConstraints::new();
        request.set_video(&video);
        request.set_audio(&JsValue::FALSE);
        Ok(request)
    }

    async fn request(constraints: VideoConstraints) -> Result<WebMediaStream, CameraAccessError> {
        let window = web_sys::window().ok_or(CameraAccessError::Unsupported)?;
        if !window.is_secure_context() {
            return Err(CameraAccessError::InsecureContext);
        }

        // Sin HTTPS (o en navegadores viejos) mediaDevices no existe
        let devices = window
            .navigator()
            .media_devices()
            .map_err(|_| CameraAccessError::Unsupported)?;
        if devices.is_undefined() {
            return Err(CameraAccessError::Unsupported);
        }

        let request = Self::build_constraints(&constraints)?;
        let promise = devices
            .get_user_media_with_constraints(&request)
            .map_err(camera_error)?;
        let value = JsFuture::from(promise).await.map_err(camera_error)?;
        let stream = value
            .dyn_into::<MediaStream>()
            .map_err(|_| CameraAccessError::Other("getUserMedia did not return a MediaStream".to_string()))?;

        Ok(WebMediaStream { stream })
    }
}

impl CameraProvider for WebCamera {
    type Stream = WebMediaStream;

    fn acquire(&self, constraints: &VideoConstraints) -> LocalBoxFuture<'_, Result<WebMediaStream, CameraAccessError>> {
        Self::request(*constraints).boxed_local()
    }
}

/// `<video>` visible
pub struct WebVideoSurface {
    video: HtmlVideoElement,
}

impl WebVideoSurface {
    pub fn new(video: HtmlVideoElement) -> Self {
        // iOS Safari abre el vídeo en pantalla completa sin playsinline
        let _ = video.set_attribute("playsinline", "true");
        video.set_muted(true);
        Self { video }
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.video
    }
}

impl VideoSurface for WebVideoSurface {
    type Stream = WebMediaStream;

    fn attach(&mut self, stream: &WebMediaStream) -> Result<(), CameraAccessError> {
        self.video.set_src_object(Some(&stream.stream));
        Ok(())
    }

    fn wait_for_metadata(&self) -> LocalBoxFuture<'static, Result<(), CameraAccessError>> {
        let video = self.video.clone();
        async move {
            if video.ready_state() >= HtmlMediaElement::HAVE_METADATA {
                return Ok(());
            }

            let promise = Promise::new(&mut |resolve, reject| {
                video.set_onloadedmetadata(Some(&resolve));
                video.set_onerror(Some(&reject));
            });
            let result = JsFuture::from(promise).await;

            video.set_onloadedmetadata(None);
            video.set_onerror(None);

            result
                .map(|_| ())
                .map_err(|_| CameraAccessError::Other("video metadata failed to load".to_string()))
        }
        .boxed_local()
    }

    fn play(&mut self) -> Result<(), CameraAccessError> {
        let promise = self.video.play().map_err(camera_error)?;
        // El rechazo de play() (autoplay) solo se registra: el loop sigue esperando frames
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::warn!("⚠️ [SCANNER] video.play() rechazado: {:?}", e);
            }
        });
        Ok(())
    }

    fn pause(&mut self) {
        if let Err(e) = self.video.pause() {
            log::warn!("⚠️ [SCANNER] video.pause() falló: {:?}", e);
        }
    }

    fn detach(&mut self) {
        self.video.set_onloadedmetadata(None);
        self.video.set_onerror(None);
        self.video.set_src_object(None);
    }

    fn has_enough_data(&self) -> bool {
        self.video.ready_state() == HtmlMediaElement::HAVE_ENOUGH_DATA
    }

    fn video_width(&self) -> u32 {
        self.video.video_width()
    }

    fn video_height(&self) -> u32 {
        self.video.video_height()
    }
}

/// `<canvas>` fuera de pantalla (o de overlay) con contexto 2D
pub struct WebPixelBuffer {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl WebPixelBuffer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        // Lecturas por frame: pedir un contexto optimizado para getImageData
        let options = Object::new();
        Reflect::set(&options, &JsValue::from_str("willReadFrequently"), &JsValue::TRUE)?;

        let context = canvas
            .get_context_with_context_options("2d", &options)?
            .ok_or_else(|| JsValue::from_str("2d context not available"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(Self { canvas, context })
    }
}

impl PixelBuffer for WebPixelBuffer {
    type Source = WebVideoSurface;

    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn draw_frame(&mut self, source: &WebVideoSurface) -> Result<(), String> {
        self.context
            .draw_image_with_html_video_element(source.element(), 0.0, 0.0)
            .map_err(|e| format!("drawImage: {:?}", e))
    }

    fn read_rgba(&self) -> Result<Vec<u8>, String> {
        let image = self
            .context
            .get_image_data(0.0, 0.0, self.width() as f64, self.height() as f64)
            .map_err(|e| format!("getImageData: {:?}", e))?;
        Ok(image.data().0)
    }

    fn draw_quad(&mut self, quad: &[Point; 4], color: &str) {
        let ctx = &self.context;
        ctx.begin_path();
        ctx.move_to(quad[0].x as f64, quad[0].y as f64);
        for point in quad.iter().skip(1) {
            ctx.line_to(point.x as f64, point.y as f64);
        }
        ctx.close_path();
        ctx.set_line_width(4.0);
        #[allow(deprecated)]
        ctx.set_stroke_style(&JsValue::from_str(color));
        ctx.stroke();
    }
}

/// Callbacks de frame vivos, por id de requestAnimationFrame.
/// `fired` lo marca el propio callback al terminar.
struct FrameRegistry<C> {
    frames: HashMap<i32, (Rc<Cell<bool>>, C)>,
}

impl<C> Default for FrameRegistry<C> {
    fn default() -> Self {
        Self { frames: HashMap::new() }
    }
}

impl<C> FrameRegistry<C> {
    /// Suelta los callbacks que ya se ejecutaron
    fn prune_fired(&mut self) {
        self.frames.retain(|_, (fired, _)| !fired.get());
    }

    fn insert(&mut self, id: i32, fired: Rc<Cell<bool>>, callback: C) {
        self.frames.insert(id, (fired, callback));
    }

    fn remove(&mut self, id: i32) -> Option<C> {
        self.frames.remove(&id).map(|(_, callback)| callback)
    }

    fn len(&self) -> usize {
        self.frames.len()
    }
}

/// requestAnimationFrame / cancelAnimationFrame.
/// Es dueño de los closures: `cancel` los suelta, los ya ejecutados se purgan
/// en la siguiente petición.
#[derive(Default)]
pub struct AnimationFrameScheduler {
    frames: FrameRegistry<Closure<dyn FnMut()>>,
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&mut self, callback: Box<dyn FnOnce()>) -> FrameHandle {
        // El frame en curso marca `fired` al terminar, así no se suelta a sí mismo
        self.frames.prune_fired();

        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let closure = Closure::once(move || {
            callback();
            flag.set(true);
        });

        let requested = web_sys::window()
            .and_then(|w| w.request_animation_frame(closure.as_ref().unchecked_ref()).ok());
        match requested {
            Some(id) => {
                self.frames.insert(id, fired, closure);
                log::trace!("🎞️ [SCANNER] {} callbacks de frame vivos", self.frames.len());
                FrameHandle(id)
            }
            None => {
                log::error!("❌ [SCANNER] requestAnimationFrame no disponible");
                FrameHandle(0)
            }
        }
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if let Some(closure) = self.frames.remove(handle.0) {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(handle.0);
            }
            drop(closure);
        }
    }
}

/// Plataforma del navegador
pub struct WebPlatform;

impl ScanPlatform for WebPlatform {
    type Stream = WebMediaStream;
    type Camera = WebCamera;
    type Video = WebVideoSurface;
    type Buffer = WebPixelBuffer;
    type Scheduler = AnimationFrameScheduler;
    type Decoder = RqrrDecoder;
}
