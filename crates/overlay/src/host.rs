//! Host page abstractions.
//!
//! The overlay never touches a real document. Everything it needs from the
//! page it is injected into goes through [`HostPage`], and everything it
//! needs from the video element goes through [`MediaPlayer`]. Elements are
//! addressed by opaque [`ElementHandle`]s allocated by the host.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use ytnote_core::geometry::Rect;

use crate::markers::MarkerSpec;
use crate::panel::PanelView;

/// Opaque reference to a host element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementHandle(pub u64);

/// Elements the overlay creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementKind {
    /// Absolutely positioned container holding the rail markers.
    MarkerLayer,
    /// Floating action button toggling the panel.
    Fab,
    /// The notes panel.
    Panel,
}

/// Something moved or resized: window resize, fullscreen toggle, reflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutChange;

/// The page's video element.
pub trait MediaPlayer: Send + Sync + 'static {
    /// Playback position in seconds.
    fn current_time(&self) -> f64;

    /// Media duration in seconds, `None` until metadata has loaded.
    fn duration(&self) -> Option<f64>;

    fn seek(&self, seconds: f64);

    fn play(&self);

    /// Watch the duration. The value becomes `Some` when metadata loads.
    fn metadata(&self) -> watch::Receiver<Option<f64>>;
}

/// The page the overlay lives in.
pub trait HostPage: Send + Sync + 'static {
    type Player: MediaPlayer;

    /// Current page URL.
    fn location(&self) -> String;

    fn title(&self) -> String;

    /// The active video element, if one exists.
    fn player(&self) -> Option<Arc<Self::Player>>;

    /// First element matching `locator`, searched under `scope` or the whole
    /// document.
    fn query(&self, scope: Option<ElementHandle>, locator: &str) -> Option<ElementHandle>;

    fn parent(&self, element: ElementHandle) -> Option<ElementHandle>;

    fn body(&self) -> ElementHandle;

    /// Viewport-relative bounding box, `None` for a detached element.
    fn bounding_rect(&self, element: ElementHandle) -> Option<Rect>;

    /// Layout change notifications.
    fn layout_changes(&self) -> broadcast::Receiver<LayoutChange>;

    /// Notified whenever the document mutates.
    fn mutations(&self) -> broadcast::Receiver<()>;

    /// Create an element of `kind` under `parent`.
    fn mount(&self, parent: ElementHandle, kind: ElementKind) -> ElementHandle;

    /// Position `element` at `rect`, relative to its parent.
    fn place(&self, element: ElementHandle, rect: Rect);

    /// Replace the markers shown in `layer`.
    fn render_markers(&self, layer: ElementHandle, markers: &[MarkerSpec]);

    /// Replace the contents of `panel`.
    fn render_panel(&self, panel: ElementHandle, view: &PanelView);

    fn remove(&self, element: ElementHandle);

    /// Navigate a new tab to `url`.
    fn open_url(&self, url: &str);
}
