#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use ytnote_core::geometry::Rect;
use ytnote_core::PageSnapshot;
use ytnote_overlay::{
    ElementHandle, ElementKind, HostPage, LayoutChange, MarkerSpec, MediaPlayer, OverlayConfig,
    PageSession, PanelView, SessionHandle,
};
use ytnote_store::{AnnotationStore, MemoryBackend};

pub const BODY: ElementHandle = ElementHandle(1);
pub const PLAYER: ElementHandle = ElementHandle(2);
pub const PROGRESS_CONTAINER: ElementHandle = ElementHandle(3);
pub const RAIL: ElementHandle = ElementHandle(4);

/// First handle given to mounted elements.
const FIRST_DYNAMIC_HANDLE: u64 = 100;

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

// ---------------------------------------------------------------------------
// FakePlayer
// ---------------------------------------------------------------------------

pub struct FakePlayer {
    time: Mutex<f64>,
    duration: watch::Sender<Option<f64>>,
    seeks: Mutex<Vec<f64>>,
    playing: AtomicBool,
}

impl FakePlayer {
    pub fn new(duration: Option<f64>) -> Self {
        let (duration, _) = watch::channel(duration);
        Self {
            time: Mutex::new(0.0),
            duration,
            seeks: Mutex::new(Vec::new()),
            playing: AtomicBool::new(false),
        }
    }

    pub fn set_time(&self, seconds: f64) {
        *self.time.lock().unwrap() = seconds;
    }

    pub fn set_duration(&self, duration: Option<f64>) {
        self.duration.send_replace(duration);
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Outstanding metadata waits.
    pub fn metadata_watchers(&self) -> usize {
        self.duration.receiver_count()
    }
}

impl MediaPlayer for FakePlayer {
    fn current_time(&self) -> f64 {
        *self.time.lock().unwrap()
    }

    fn duration(&self) -> Option<f64> {
        *self.duration.borrow()
    }

    fn seek(&self, seconds: f64) {
        self.seeks.lock().unwrap().push(seconds);
        *self.time.lock().unwrap() = seconds;
    }

    fn play(&self) {
        self.playing.store(true, Ordering::SeqCst);
    }

    fn metadata(&self) -> watch::Receiver<Option<f64>> {
        self.duration.subscribe()
    }
}

// ---------------------------------------------------------------------------
// FakeHost
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MountedElement {
    pub kind: ElementKind,
    pub parent: ElementHandle,
    pub placed: Option<Rect>,
    pub markers: Vec<MarkerSpec>,
    pub panel: Option<PanelView>,
}

struct HostState {
    location: String,
    title: String,
    player_present: bool,
    rail_present: bool,
    video_present: bool,
    rail_width: f64,
    next_handle: u64,
    mounted: BTreeMap<ElementHandle, MountedElement>,
    opened: Vec<String>,
}

/// In-memory stand-in for a video watch page.
///
/// The player container sits at (0, 0, 640, 360). The rail lives in a
/// progress container at (10, 340), offset by 10px on both axes.
pub struct FakeHost {
    state: Mutex<HostState>,
    player: Arc<FakePlayer>,
    layout: broadcast::Sender<LayoutChange>,
    mutations: broadcast::Sender<()>,
}

impl FakeHost {
    pub fn new(location: impl Into<String>, duration: Option<f64>) -> Arc<Self> {
        let (layout, _) = broadcast::channel(16);
        let (mutations, _) = broadcast::channel(16);
        Arc::new(Self {
            state: Mutex::new(HostState {
                location: location.into(),
                title: "Rust in Production - YouTube".to_string(),
                player_present: true,
                rail_present: true,
                video_present: true,
                rail_width: 300.0,
                next_handle: FIRST_DYNAMIC_HANDLE,
                mounted: BTreeMap::new(),
                opened: Vec::new(),
            }),
            player: Arc::new(FakePlayer::new(duration)),
            layout,
            mutations,
        })
    }

    pub fn video(&self) -> &FakePlayer {
        &self.player
    }

    /// In-app navigation, announced through a document mutation.
    pub fn navigate(&self, url: impl Into<String>) {
        self.state.lock().unwrap().location = url.into();
        let _ = self.mutations.send(());
    }

    /// Navigation that produces no mutation notification.
    pub fn navigate_silently(&self, url: impl Into<String>) {
        self.state.lock().unwrap().location = url.into();
    }

    pub fn mutate(&self) {
        let _ = self.mutations.send(());
    }

    pub fn set_player_present(&self, present: bool) {
        self.state.lock().unwrap().player_present = present;
    }

    pub fn set_rail_present(&self, present: bool) {
        self.state.lock().unwrap().rail_present = present;
    }

    pub fn set_video_present(&self, present: bool) {
        self.state.lock().unwrap().video_present = present;
    }

    /// Resize the rail and announce a layout change.
    pub fn resize_rail(&self, width: f64) {
        self.state.lock().unwrap().rail_width = width;
        let _ = self.layout.send(LayoutChange);
    }

    pub fn layout_subscribers(&self) -> usize {
        self.layout.receiver_count()
    }

    pub fn mounted(&self, kind: ElementKind) -> Vec<MountedElement> {
        self.state
            .lock()
            .unwrap()
            .mounted
            .values()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    pub fn mounted_count(&self) -> usize {
        self.state.lock().unwrap().mounted.len()
    }

    /// Markers across every live layer.
    pub fn rendered_markers(&self) -> Vec<MarkerSpec> {
        self.mounted(ElementKind::MarkerLayer)
            .into_iter()
            .flat_map(|layer| layer.markers)
            .collect()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }
}

impl HostPage for FakeHost {
    type Player = FakePlayer;

    fn location(&self) -> String {
        self.state.lock().unwrap().location.clone()
    }

    fn title(&self) -> String {
        self.state.lock().unwrap().title.clone()
    }

    fn player(&self) -> Option<Arc<FakePlayer>> {
        let present = self.state.lock().unwrap().video_present;
        present.then(|| Arc::clone(&self.player))
    }

    fn query(&self, scope: Option<ElementHandle>, locator: &str) -> Option<ElementHandle> {
        let state = self.state.lock().unwrap();
        match (scope, locator) {
            (None, "#movie_player") if state.player_present => Some(PLAYER),
            (Some(PLAYER), ".ytp-progress-bar") if state.player_present && state.rail_present => {
                Some(RAIL)
            }
            _ => None,
        }
    }

    fn parent(&self, element: ElementHandle) -> Option<ElementHandle> {
        match element {
            RAIL => Some(PROGRESS_CONTAINER),
            PROGRESS_CONTAINER => Some(PLAYER),
            PLAYER => Some(BODY),
            other => self.state.lock().unwrap().mounted.get(&other).map(|e| e.parent),
        }
    }

    fn body(&self) -> ElementHandle {
        BODY
    }

    fn bounding_rect(&self, element: ElementHandle) -> Option<Rect> {
        let state = self.state.lock().unwrap();
        match element {
            BODY => Some(Rect::new(0.0, 0.0, 1280.0, 720.0)),
            PLAYER => Some(Rect::new(0.0, 0.0, 640.0, 360.0)),
            PROGRESS_CONTAINER => Some(Rect::new(10.0, 340.0, state.rail_width + 20.0, 20.0)),
            RAIL => Some(Rect::new(20.0, 350.0, state.rail_width, 5.0)),
            _ => None,
        }
    }

    fn layout_changes(&self) -> broadcast::Receiver<LayoutChange> {
        self.layout.subscribe()
    }

    fn mutations(&self) -> broadcast::Receiver<()> {
        self.mutations.subscribe()
    }

    fn mount(&self, parent: ElementHandle, kind: ElementKind) -> ElementHandle {
        let mut state = self.state.lock().unwrap();
        let handle = ElementHandle(state.next_handle);
        state.next_handle += 1;
        state.mounted.insert(
            handle,
            MountedElement {
                kind,
                parent,
                placed: None,
                markers: Vec::new(),
                panel: None,
            },
        );
        handle
    }

    fn place(&self, element: ElementHandle, rect: Rect) {
        if let Some(e) = self.state.lock().unwrap().mounted.get_mut(&element) {
            e.placed = Some(rect);
        }
    }

    fn render_markers(&self, layer: ElementHandle, markers: &[MarkerSpec]) {
        if let Some(e) = self.state.lock().unwrap().mounted.get_mut(&layer) {
            e.markers = markers.to_vec();
        }
    }

    fn render_panel(&self, panel: ElementHandle, view: &PanelView) {
        if let Some(e) = self.state.lock().unwrap().mounted.get_mut(&panel) {
            e.panel = Some(view.clone());
        }
    }

    fn remove(&self, element: ElementHandle) {
        self.state.lock().unwrap().mounted.remove(&element);
    }

    fn open_url(&self, url: &str) {
        self.state.lock().unwrap().opened.push(url.to_string());
    }
}

// ---------------------------------------------------------------------------
// Session helpers
// ---------------------------------------------------------------------------

pub struct TestSession {
    pub host: Arc<FakeHost>,
    pub store: Arc<AnnotationStore<MemoryBackend>>,
    pub handle: SessionHandle,
    pub task: JoinHandle<()>,
}

impl TestSession {
    pub async fn shutdown(self) -> Arc<FakeHost> {
        self.handle.shutdown();
        self.task.await.unwrap();
        self.host
    }
}

/// Timings short enough to keep paused-clock tests readable.
pub fn test_config() -> OverlayConfig {
    OverlayConfig {
        max_attach_attempts: 3,
        ..OverlayConfig::default()
    }
}

pub fn start_session(
    host: Arc<FakeHost>,
    store: Arc<AnnotationStore<MemoryBackend>>,
) -> TestSession {
    let (handle, task) = PageSession::spawn(Arc::clone(&host), Arc::clone(&store), test_config());
    TestSession {
        host,
        store,
        handle,
        task,
    }
}

/// Enough paused time for a navigation to be seen and attached.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(500)).await;
}

/// Let spawned tasks drain without crossing any timer deadline.
pub async fn yield_now() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn page_for(video_id: &str) -> PageSnapshot {
    PageSnapshot::new(format!("Video {video_id}"), watch_url(video_id))
}

pub async fn seed(store: &AnnotationStore<MemoryBackend>, video_id: &str, notes: &[(f64, &str)]) {
    for (time, text) in notes {
        store
            .add_note(video_id, *time, text, &page_for(video_id))
            .await
            .unwrap();
    }
}
