//! Fakes en memoria de la plataforma del scanner (solo tests).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::models::{DecodedResult, Point};
use crate::scanner::controller::{ScanLoopController, ScanStatus};
use crate::scanner::traits::*;

#[derive(Clone)]
pub struct FakeStream {
    live: Rc<Cell<usize>>,
}

impl FakeStream {
    fn new(tracks: usize) -> Self {
        Self { live: Rc::new(Cell::new(tracks)) }
    }
}

impl MediaStreamHandle for FakeStream {
    fn live_track_count(&self) -> usize {
        self.live.get()
    }

    fn stop_all_tracks(&self) {
        self.live.set(0);
    }
}

#[derive(Default)]
struct CameraState {
    requests: Cell<usize>,
    last_constraints: Cell<Option<VideoConstraints>>,
    failure: RefCell<Option<CameraAccessError>>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
    issued: RefCell<Vec<FakeStream>>,
}

#[derive(Clone, Default)]
pub struct FakeCamera {
    state: Rc<CameraState>,
}

impl FakeCamera {
    pub fn fail_with(&self, error: CameraAccessError) {
        *self.state.failure.borrow_mut() = Some(error);
    }

    pub fn succeed(&self) {
        *self.state.failure.borrow_mut() = None;
    }

    /// La próxima petición queda pendiente hasta que se envíe por el sender
    pub fn hold_next_request(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.state.gate.borrow_mut() = Some(rx);
        tx
    }

    pub fn requests(&self) -> usize {
        self.state.requests.get()
    }

    pub fn last_constraints(&self) -> Option<VideoConstraints> {
        self.state.last_constraints.get()
    }

    /// Streams entregados en total
    pub fn issued(&self) -> usize {
        self.state.issued.borrow().len()
    }

    /// Tracks vivos sumando todos los streams entregados
    pub fn live_tracks(&self) -> usize {
        self.state.issued.borrow().iter().map(|s| s.live_track_count()).sum()
    }
}

impl CameraProvider for FakeCamera {
    type Stream = FakeStream;

    fn acquire(&self, constraints: &VideoConstraints) -> LocalBoxFuture<'_, Result<FakeStream, CameraAccessError>> {
        self.state.requests.set(self.state.requests.get() + 1);
        self.state.last_constraints.set(Some(*constraints));
        let gate = self.state.gate.borrow_mut().take();
        let state = Rc::clone(&self.state);

        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if let Some(error) = state.failure.borrow().clone() {
                return Err(error);
            }
            let stream = FakeStream::new(1);
            state.issued.borrow_mut().push(stream.clone());
            Ok(stream)
        }
        .boxed_local()
    }
}

struct VideoState {
    width: Cell<u32>,
    height: Cell<u32>,
    enough_data: Cell<bool>,
    attached: Cell<bool>,
    playing: Cell<bool>,
    pauses: Cell<usize>,
    metadata_failure: RefCell<Option<CameraAccessError>>,
    metadata_stalled: Cell<bool>,
}

#[derive(Clone)]
pub struct FakeVideo {
    state: Rc<VideoState>,
}

impl FakeVideo {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Rc::new(VideoState {
                width: Cell::new(width),
                height: Cell::new(height),
                enough_data: Cell::new(true),
                attached: Cell::new(false),
                playing: Cell::new(false),
                pauses: Cell::new(0),
                metadata_failure: RefCell::new(None),
                metadata_stalled: Cell::new(false),
            }),
        }
    }

    pub fn set_resolution(&self, width: u32, height: u32) {
        self.state.width.set(width);
        self.state.height.set(height);
    }

    pub fn set_enough_data(&self, enough: bool) {
        self.state.enough_data.set(enough);
    }

    pub fn fail_metadata(&self, error: CameraAccessError) {
        *self.state.metadata_failure.borrow_mut() = Some(error);
    }

    /// La metadata no llega nunca (como un <video> sin srcObject)
    pub fn set_metadata_stalled(&self, stalled: bool) {
        self.state.metadata_stalled.set(stalled);
    }

    pub fn is_attached(&self) -> bool {
        self.state.attached.get()
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing.get()
    }

    pub fn pauses(&self) -> usize {
        self.state.pauses.get()
    }
}

impl VideoSurface for FakeVideo {
    type Stream = FakeStream;

    fn attach(&mut self, _stream: &FakeStream) -> Result<(), CameraAccessError> {
        self.state.attached.set(true);
        Ok(())
    }

    fn wait_for_metadata(&self) -> LocalBoxFuture<'static, Result<(), CameraAccessError>> {
        if self.state.metadata_stalled.get() {
            return future::pending().boxed_local();
        }
        let result = match self.state.metadata_failure.borrow().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        };
        future::ready(result).boxed_local()
    }

    fn play(&mut self) -> Result<(), CameraAccessError> {
        self.state.playing.set(true);
        Ok(())
    }

    fn pause(&mut self) {
        self.state.pauses.set(self.state.pauses.get() + 1);
        self.state.playing.set(false);
    }

    fn detach(&mut self) {
        self.state.attached.set(false);
    }

    fn has_enough_data(&self) -> bool {
        self.state.enough_data.get()
    }

    fn video_width(&self) -> u32 {
        self.state.width.get()
    }

    fn video_height(&self) -> u32 {
        self.state.height.get()
    }
}

#[derive(Default)]
struct BufferState {
    width: Cell<u32>,
    height: Cell<u32>,
    resizes: Cell<usize>,
    quads: RefCell<Vec<[Point; 4]>>,
}

#[derive(Clone, Default)]
pub struct FakeBuffer {
    state: Rc<BufferState>,
}

impl FakeBuffer {
    pub fn size(&self) -> (u32, u32) {
        (self.state.width.get(), self.state.height.get())
    }

    pub fn resizes(&self) -> usize {
        self.state.resizes.get()
    }

    pub fn quads(&self) -> usize {
        self.state.quads.borrow().len()
    }
}

impl PixelBuffer for FakeBuffer {
    type Source = FakeVideo;

    fn width(&self) -> u32 {
        self.state.width.get()
    }

    fn height(&self) -> u32 {
        self.state.height.get()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.state.width.set(width);
        self.state.height.set(height);
        self.state.resizes.set(self.state.resizes.get() + 1);
    }

    fn draw_frame(&mut self, _source: &FakeVideo) -> Result<(), String> {
        Ok(())
    }

    fn read_rgba(&self) -> Result<Vec<u8>, String> {
        Ok(vec![0; (self.width() * self.height() * 4) as usize])
    }

    fn draw_quad(&mut self, quad: &[Point; 4], _color: &str) {
        self.state.quads.borrow_mut().push(*quad);
    }
}

type Queued = (FrameHandle, Box<dyn FnOnce()>);

#[derive(Default)]
struct SchedulerState {
    next_id: Cell<i32>,
    requests: Cell<usize>,
    queue: RefCell<VecDeque<Queued>>,
    cancelled: RefCell<Vec<Queued>>,
}

/// Scheduler manual: los tests disparan cada "repintado" con `run_next`
#[derive(Clone, Default)]
pub struct FakeScheduler {
    state: Rc<SchedulerState>,
}

impl FakeScheduler {
    /// Ejecuta el siguiente callback pendiente
    pub fn run_next(&self) -> bool {
        let next = self.state.queue.borrow_mut().pop_front();
        match next {
            Some((_, callback)) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Simula callbacks cancelados que el navegador ya tenía encolados
    pub fn fire_cancelled(&self) -> usize {
        let stale: Vec<Queued> = self.state.cancelled.borrow_mut().drain(..).collect();
        let count = stale.len();
        for (_, callback) in stale {
            callback();
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.state.queue.borrow().len()
    }

    pub fn requests(&self) -> usize {
        self.state.requests.get()
    }
}

impl FrameScheduler for FakeScheduler {
    fn request_frame(&mut self, callback: Box<dyn FnOnce()>) -> FrameHandle {
        let id = self.state.next_id.get() + 1;
        self.state.next_id.set(id);
        self.state.requests.set(self.state.requests.get() + 1);
        self.state.queue.borrow_mut().push_back((FrameHandle(id), callback));
        FrameHandle(id)
    }

    fn cancel(&mut self, handle: FrameHandle) {
        let mut queue = self.state.queue.borrow_mut();
        if let Some(pos) = queue.iter().position(|(h, _)| *h == handle) {
            if let Some(entry) = queue.remove(pos) {
                self.state.cancelled.borrow_mut().push(entry);
            }
        }
    }
}

#[derive(Default)]
struct DecoderState {
    code: RefCell<Option<String>>,
    calls: RefCell<Vec<(u32, u32)>>,
}

#[derive(Clone, Default)]
pub struct FakeDecoder {
    state: Rc<DecoderState>,
}

impl FakeDecoder {
    /// A partir de ahora cada frame "contiene" este código
    pub fn show_code(&self, text: &str) {
        *self.state.code.borrow_mut() = Some(text.to_string());
    }

    pub fn hide_code(&self) {
        *self.state.code.borrow_mut() = None;
    }

    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.state.calls.borrow().clone()
    }
}

impl QrDecoder for FakeDecoder {
    fn decode(&self, rgba: &[u8], width: u32, height: u32) -> Option<DecodedResult> {
        assert_eq!(rgba.len(), (width * height * 4) as usize, "pixel buffer out of sync with frame size");
        self.state.calls.borrow_mut().push((width, height));
        let w = width as i32;
        let h = height as i32;
        self.state.code.borrow().clone().map(|text| DecodedResult {
            text,
            bounding_quad: [
                Point::new(w / 4, h / 4),
                Point::new(3 * w / 4, h / 4),
                Point::new(3 * w / 4, 3 * h / 4),
                Point::new(w / 4, 3 * h / 4),
            ],
        })
    }
}

pub struct FakePlatform;

impl ScanPlatform for FakePlatform {
    type Stream = FakeStream;
    type Camera = FakeCamera;
    type Video = FakeVideo;
    type Buffer = FakeBuffer;
    type Scheduler = FakeScheduler;
    type Decoder = FakeDecoder;
}

/// Handles de los fakes, para construir controllers e inspeccionarlos
#[derive(Clone)]
pub struct FakeParts {
    pub camera: FakeCamera,
    pub video: FakeVideo,
    pub buffer: FakeBuffer,
    pub scheduler: FakeScheduler,
    pub decoder: FakeDecoder,
}

impl FakeParts {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            camera: FakeCamera::default(),
            video: FakeVideo::new(width, height),
            buffer: FakeBuffer::default(),
            scheduler: FakeScheduler::default(),
            decoder: FakeDecoder::default(),
        }
    }

    pub fn controller(&self) -> ScanLoopController<FakePlatform> {
        ScanLoopController::new(
            self.camera.clone(),
            self.video.clone(),
            self.buffer.clone(),
            self.scheduler.clone(),
            self.decoder.clone(),
            VideoConstraints::default(),
        )
    }
}

/// Controller cableado a fakes, con handlers que registran resultados y estados
pub struct Rig {
    pub controller: Rc<ScanLoopController<FakePlatform>>,
    pub camera: FakeCamera,
    pub video: FakeVideo,
    pub buffer: FakeBuffer,
    pub scheduler: FakeScheduler,
    pub decoder: FakeDecoder,
    results: Rc<RefCell<Vec<String>>>,
    statuses: Rc<RefCell<Vec<ScanStatus>>>,
}

impl Rig {
    pub fn new(width: u32, height: u32) -> Self {
        let parts = FakeParts::new(width, height);
        let controller = Rc::new(parts.controller());

        let results = Rc::new(RefCell::new(Vec::new()));
        let statuses = Rc::new(RefCell::new(Vec::new()));
        {
            let results = Rc::clone(&results);
            controller.set_result_handler(move |text| results.borrow_mut().push(text));
        }
        {
            let statuses = Rc::clone(&statuses);
            controller.set_status_listener(move |status| statuses.borrow_mut().push(status));
        }

        let FakeParts { camera, video, buffer, scheduler, decoder } = parts;
        Self { controller, camera, video, buffer, scheduler, decoder, results, statuses }
    }

    pub fn results(&self) -> Vec<String> {
        self.results.borrow().clone()
    }

    pub fn statuses(&self) -> Vec<ScanStatus> {
        self.statuses.borrow().clone()
    }
}
