//! The overlay built for one attached video.
//!
//! An [`OverlayInstance`] owns every element, subscription and timer created
//! for its video: the panel, the marker layer, the layout subscription, the
//! pending metadata wait and the panel tick. Dropping it removes the
//! elements and releases the rest, so nothing outlives the video it was
//! built for.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use ytnote_core::geometry::usable_duration;
use ytnote_core::types::VideoId;
use ytnote_core::VideoEntry;

use crate::config::OverlayConfig;
use crate::host::{HostPage, LayoutChange, MediaPlayer};
use crate::markers::{build_markers, locate_rail, MarkerLayer, MarkerSpec};
use crate::panel::Panel;

/// Something the overlay must react to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayEvent {
    /// The host layout changed; the layer must be re-aligned.
    Layout,
    /// Media duration became known.
    MetadataReady(f64),
    /// The panel time display is due.
    Tick,
    /// A subscription ended; nothing to do.
    Idle,
}

pub struct OverlayInstance<H: HostPage> {
    video_id: VideoId,
    host: Arc<H>,
    /// `None` once removed.
    panel: Option<Panel>,
    markers: Option<MarkerLayer>,
    layout: Option<broadcast::Receiver<LayoutChange>>,
    /// Armed while markers wait for the duration.
    metadata: Option<watch::Receiver<Option<f64>>>,
}

impl<H: HostPage> OverlayInstance<H> {
    /// Build the panel and, when the rail can be located, the marker layer.
    pub fn attach(host: Arc<H>, video_id: &str, config: &OverlayConfig) -> Self {
        let panel = Panel::mount(host.as_ref(), video_id, config.tick_interval);
        let (markers, layout) = match locate_rail(host.as_ref()) {
            Some(location) => (
                Some(MarkerLayer::mount(host.as_ref(), location)),
                Some(host.layout_changes()),
            ),
            None => {
                tracing::debug!(video_id, "No player container, markers disabled");
                (None, None)
            }
        };

        tracing::info!(video_id, markers = markers.is_some(), "Overlay attached");
        Self {
            video_id: video_id.to_string(),
            host,
            panel: Some(panel),
            markers,
            layout,
            metadata: None,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn panel(&self) -> Option<&Panel> {
        self.panel.as_ref()
    }

    pub fn markers(&self) -> &[MarkerSpec] {
        self.markers.as_ref().map_or(&[], |layer| layer.markers())
    }

    pub fn awaiting_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Replace everything shown with `entry`.
    pub fn render(&mut self, entry: Option<&VideoEntry>) {
        let host = self.host.as_ref();
        if let Some(panel) = self.panel.as_mut() {
            panel.set_entry(host, entry);
        }
        self.render_markers(entry);
    }

    fn render_markers(&mut self, entry: Option<&VideoEntry>) {
        let host = self.host.as_ref();
        let Some(layer) = self.markers.as_mut() else {
            return;
        };
        let Some(entry) = entry.filter(|e| !e.is_empty()) else {
            layer.clear(host);
            self.metadata = None;
            return;
        };
        let Some(player) = host.player() else {
            layer.clear(host);
            return;
        };

        layer.align(host);
        match build_markers(entry, player.duration(), layer.rail_width()) {
            Some(markers) => {
                layer.render(host, markers);
                self.metadata = None;
            }
            None => {
                // Stale markers must not survive while waiting.
                layer.clear(host);
                if self.metadata.is_none() {
                    tracing::debug!(
                        video_id = %self.video_id,
                        "Duration unknown, waiting for metadata"
                    );
                    self.metadata = Some(player.metadata());
                }
            }
        }
    }

    /// React to `event`. Returns `true` when the markers need a fresh
    /// snapshot of the entry to be rendered.
    pub fn handle(&mut self, event: OverlayEvent) -> bool {
        let host = self.host.as_ref();
        match event {
            OverlayEvent::Layout => {
                if let Some(layer) = self.markers.as_mut() {
                    layer.align(host);
                }
                false
            }
            OverlayEvent::MetadataReady(duration) => {
                tracing::debug!(video_id = %self.video_id, duration, "Metadata loaded");
                self.metadata = None;
                true
            }
            OverlayEvent::Tick => {
                if let (Some(panel), Some(player)) = (self.panel.as_mut(), host.player()) {
                    panel.show_time(host, player.current_time());
                }
                false
            }
            OverlayEvent::Idle => false,
        }
    }

    // -----------------------------------------------------------------------
    // Panel
    // -----------------------------------------------------------------------

    pub fn toggle_panel(&mut self) -> bool {
        let host = self.host.as_ref();
        self.panel.as_mut().is_some_and(|panel| panel.toggle(host))
    }

    /// Close the panel after a click elsewhere on the page.
    pub fn dismiss_panel(&mut self) -> bool {
        let host = self.host.as_ref();
        self.panel.as_mut().is_some_and(|panel| panel.close(host))
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        let host = self.host.as_ref();
        if let Some(panel) = self.panel.as_mut() {
            panel.set_hovered(host, hovered);
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Wait for the next layout change, metadata load or panel tick.
    pub async fn next_event(&mut self) -> OverlayEvent {
        tokio::select! {
            received = recv_layout(&mut self.layout) => match received {
                Ok(LayoutChange) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    OverlayEvent::Layout
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.layout = None;
                    OverlayEvent::Idle
                }
            },
            loaded = wait_metadata(&mut self.metadata) => match loaded {
                Some(duration) => OverlayEvent::MetadataReady(duration),
                None => {
                    self.metadata = None;
                    OverlayEvent::Idle
                }
            },
            _ = next_tick(self.panel.as_mut()) => OverlayEvent::Tick,
        }
    }
}

impl<H: HostPage> Drop for OverlayInstance<H> {
    fn drop(&mut self) {
        let host = self.host.as_ref();
        if let Some(layer) = self.markers.take() {
            layer.remove(host);
        }
        if let Some(panel) = self.panel.take() {
            panel.remove(host);
        }
        tracing::info!(video_id = %self.video_id, "Overlay detached");
    }
}

async fn recv_layout(
    layout: &mut Option<broadcast::Receiver<LayoutChange>>,
) -> Result<LayoutChange, broadcast::error::RecvError> {
    match layout.as_mut() {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Resolve with the duration once usable, `None` if the player went away.
async fn wait_metadata(metadata: &mut Option<watch::Receiver<Option<f64>>>) -> Option<f64> {
    let Some(rx) = metadata.as_mut() else {
        return std::future::pending().await;
    };
    let ready = rx.wait_for(|d| usable_duration(*d).is_some()).await.ok()?;
    *ready
}

async fn next_tick(panel: Option<&mut Panel>) {
    match panel {
        Some(panel) => panel.next_tick().await,
        None => std::future::pending().await,
    }
}
