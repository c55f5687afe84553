//! Rail markers.
//!
//! Finds the host progress rail, keeps a marker layer aligned on top of it,
//! and turns a [`VideoEntry`] into positioned [`MarkerSpec`]s. The rail's
//! box belongs to the host and changes size at will, so the layer is
//! re-placed on every layout change while the markers themselves are
//! expressed as percentages and survive resizes untouched.

use serde::Serialize;
use ytnote_core::geometry::{marker_offset, marker_percent, usable_duration, Rect};
use ytnote_core::time_format::format_time;
use ytnote_core::types::NoteId;
use ytnote_core::video_url::seek_url;
use ytnote_core::{Note, VideoEntry};

use crate::host::{ElementHandle, ElementKind, HostPage, MediaPlayer};

/// Player container locators, most specific first.
pub const PLAYER_LOCATORS: [&str; 2] = ["#movie_player", ".html5-video-player"];

/// Progress rail locators, searched inside the player container.
pub const RAIL_LOCATORS: [&str; 3] = [
    ".ytp-progress-bar",
    ".ytp-progress-holder",
    ".ytp-time-control",
];

// ---------------------------------------------------------------------------
// Rail lookup
// ---------------------------------------------------------------------------

/// Where the marker layer goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RailLocation {
    pub player: ElementHandle,
    /// The rail, or the player container when no rail was found.
    pub rail: ElementHandle,
    /// The element the layer is mounted in.
    pub parent: ElementHandle,
}

/// The host player container, if present.
pub fn player_container<H: HostPage>(host: &H) -> Option<ElementHandle> {
    PLAYER_LOCATORS
        .iter()
        .find_map(|locator| host.query(None, locator))
}

/// Locate the rail and the layer parent. `None` without a player container.
pub fn locate_rail<H: HostPage>(host: &H) -> Option<RailLocation> {
    let player = player_container(host)?;
    let rail = RAIL_LOCATORS
        .iter()
        .find_map(|locator| host.query(Some(player), locator))
        .unwrap_or(player);
    let parent = host.parent(rail).unwrap_or(if rail == player {
        host.body()
    } else {
        player
    });
    Some(RailLocation {
        player,
        rail,
        parent,
    })
}

/// The rail's box relative to the layer parent.
pub fn rail_rect<H: HostPage>(host: &H, location: &RailLocation) -> Option<Rect> {
    let rail = host.bounding_rect(location.rail)?;
    let parent = host.bounding_rect(location.parent)?;
    Some(rail.relative_to(&parent))
}

// ---------------------------------------------------------------------------
// Marker specs
// ---------------------------------------------------------------------------

/// One marker as the host should draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    pub note_id: NoteId,
    pub time: f64,
    /// Position along the rail in `[0, 100]`.
    pub left_percent: f64,
    /// Position in pixels for the rail width the marker was built against.
    pub left_px: f64,
    pub tooltip: String,
}

/// Hover text for a note's marker.
pub fn marker_tooltip(note: &Note) -> String {
    format!("{} — {}", format_time(note.time), note.text)
}

/// Markers for `entry`, ordered by time.
///
/// Returns `None` while `duration` is unknown; positions cannot be computed
/// yet.
pub fn build_markers(
    entry: &VideoEntry,
    duration: Option<f64>,
    rail_width: f64,
) -> Option<Vec<MarkerSpec>> {
    usable_duration(duration)?;
    let markers = entry
        .sorted_notes()
        .into_iter()
        .filter_map(|note| {
            Some(MarkerSpec {
                note_id: note.id.clone(),
                time: note.time,
                left_percent: marker_percent(note.time, duration)?,
                left_px: marker_offset(note.time, duration, rail_width)?,
                tooltip: marker_tooltip(note),
            })
        })
        .collect();
    Some(markers)
}

// ---------------------------------------------------------------------------
// Seeking
// ---------------------------------------------------------------------------

/// Jump to `time`: seek and play the active player, or open the entry URL
/// at that offset when there is none.
pub fn seek_or_open<H: HostPage>(host: &H, time: f64, entry_url: &str) {
    match host.player() {
        Some(player) => {
            player.seek(time);
            player.play();
        }
        None => {
            let url = if entry_url.is_empty() {
                host.location()
            } else {
                entry_url.to_string()
            };
            host.open_url(&seek_url(&url, time));
        }
    }
}

// ---------------------------------------------------------------------------
// MarkerLayer
// ---------------------------------------------------------------------------

/// The mounted marker layer.
#[derive(Debug)]
pub struct MarkerLayer {
    layer: ElementHandle,
    location: RailLocation,
    rect: Option<Rect>,
    markers: Vec<MarkerSpec>,
}

impl MarkerLayer {
    /// Mount an empty layer over the rail and align it.
    pub fn mount<H: HostPage>(host: &H, location: RailLocation) -> Self {
        let layer = host.mount(location.parent, ElementKind::MarkerLayer);
        let mut this = Self {
            layer,
            location,
            rect: None,
            markers: Vec::new(),
        };
        this.align(host);
        this
    }

    pub fn element(&self) -> ElementHandle {
        self.layer
    }

    pub fn markers(&self) -> &[MarkerSpec] {
        &self.markers
    }

    pub fn rail_width(&self) -> f64 {
        self.rect.map_or(0.0, |r| r.width)
    }

    /// Re-place the layer over the rail's current box.
    ///
    /// Marker percentages are kept; pixel offsets follow the new width.
    pub fn align<H: HostPage>(&mut self, host: &H) {
        let Some(rect) = rail_rect(host, &self.location) else {
            tracing::debug!("Rail not measurable, layer left in place");
            return;
        };
        if self.rect == Some(rect) {
            return;
        }
        host.place(self.layer, rect);
        self.rect = Some(rect);

        if !self.markers.is_empty() {
            for marker in &mut self.markers {
                marker.left_px = marker.left_percent / 100.0 * rect.width.max(0.0);
            }
            host.render_markers(self.layer, &self.markers);
        }
    }

    /// Replace every marker.
    pub fn render<H: HostPage>(&mut self, host: &H, markers: Vec<MarkerSpec>) {
        self.markers = markers;
        host.render_markers(self.layer, &self.markers);
    }

    /// Remove every marker, keeping the layer.
    pub fn clear<H: HostPage>(&mut self, host: &H) {
        if !self.markers.is_empty() {
            self.render(host, Vec::new());
        }
    }

    pub fn remove<H: HostPage>(self, host: &H) {
        host.remove(self.layer);
    }
}
