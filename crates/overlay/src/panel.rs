//! Notes panel and its floating toggle button.

use std::time::Duration;

use serde::Serialize;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use ytnote_core::time_format::format_time;
use ytnote_core::types::{NoteId, VideoId};
use ytnote_core::VideoEntry;

use crate::host::{ElementHandle, ElementKind, HostPage};

/// Display format for note creation times.
const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One row of the note list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteRow {
    pub note_id: NoteId,
    pub time: f64,
    pub time_label: String,
    pub text: String,
    pub created_label: String,
}

/// Everything the host needs to draw the panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub video_id: VideoId,
    pub open: bool,
    /// Current playback position, shown while the panel is hovered.
    pub time_label: Option<String>,
    /// Sorted by time. Empty means the empty state is shown.
    pub rows: Vec<NoteRow>,
}

/// Rows for `entry`, ordered by time.
pub fn note_rows(entry: Option<&VideoEntry>) -> Vec<NoteRow> {
    let Some(entry) = entry else {
        return Vec::new();
    };
    entry
        .sorted_notes()
        .into_iter()
        .map(|note| NoteRow {
            note_id: note.id.clone(),
            time: note.time,
            time_label: format_time(note.time),
            text: note.text.clone(),
            created_label: note.created_at.format(CREATED_FORMAT).to_string(),
        })
        .collect()
}

/// The mounted panel and button for one video.
#[derive(Debug)]
pub struct Panel {
    fab: ElementHandle,
    panel: ElementHandle,
    view: PanelView,
    hovered: bool,
    tick_interval: Duration,
    /// Running only while open and hovered.
    tick: Option<Interval>,
}

impl Panel {
    /// Mount the button and a closed panel under the document body.
    pub fn mount<H: HostPage>(host: &H, video_id: &str, tick_interval: Duration) -> Self {
        let body = host.body();
        let fab = host.mount(body, ElementKind::Fab);
        let panel = host.mount(body, ElementKind::Panel);
        let this = Self {
            fab,
            panel,
            view: PanelView {
                video_id: video_id.to_string(),
                open: false,
                time_label: None,
                rows: Vec::new(),
            },
            hovered: false,
            tick_interval,
            tick: None,
        };
        this.render(host);
        this
    }

    pub fn view(&self) -> &PanelView {
        &self.view
    }

    pub fn is_open(&self) -> bool {
        self.view.open
    }

    pub fn is_ticking(&self) -> bool {
        self.tick.is_some()
    }

    /// Open or close the panel. Returns the new open state.
    pub fn toggle<H: HostPage>(&mut self, host: &H) -> bool {
        self.view.open = !self.view.open;
        self.sync_tick();
        self.render(host);
        self.view.open
    }

    /// Close the panel if it is open. Returns whether it was open.
    pub fn close<H: HostPage>(&mut self, host: &H) -> bool {
        if !self.view.open {
            return false;
        }
        self.view.open = false;
        self.sync_tick();
        self.render(host);
        true
    }

    pub fn set_hovered<H: HostPage>(&mut self, host: &H, hovered: bool) {
        if self.hovered == hovered {
            return;
        }
        self.hovered = hovered;
        self.sync_tick();
        self.render(host);
    }

    /// Show fresh rows for `entry`.
    pub fn set_entry<H: HostPage>(&mut self, host: &H, entry: Option<&VideoEntry>) {
        self.view.rows = note_rows(entry);
        self.render(host);
    }

    /// Refresh the time display.
    pub fn show_time<H: HostPage>(&mut self, host: &H, seconds: f64) {
        let label = Some(format_time(seconds));
        if self.view.time_label != label {
            self.view.time_label = label;
            self.render(host);
        }
    }

    /// Wait for the next time-display tick. Pending forever while not ticking.
    pub async fn next_tick(&mut self) {
        match self.tick.as_mut() {
            Some(tick) => {
                tick.tick().await;
            }
            None => std::future::pending().await,
        }
    }

    fn sync_tick(&mut self) {
        let should_tick = self.view.open && self.hovered;
        match (should_tick, self.tick.is_some()) {
            (true, false) => {
                let mut tick = interval_at(Instant::now(), self.tick_interval);
                tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.tick = Some(tick);
            }
            (false, true) => {
                self.tick = None;
                self.view.time_label = None;
            }
            _ => {}
        }
    }

    fn render<H: HostPage>(&self, host: &H) {
        host.render_panel(self.panel, &self.view);
    }

    pub fn remove<H: HostPage>(self, host: &H) {
        host.remove(self.panel);
        host.remove(self.fab);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ytnote_core::{Note, PageSnapshot};

    #[test]
    fn rows_sorted_with_labels() {
        let entry = VideoEntry::new("abc", &PageSnapshot::default())
            .with_note_added(Note::new(3723.0, "late"))
            .unwrap()
            .with_note_added(Note::new(65.4, "intro"))
            .unwrap();

        let rows = note_rows(Some(&entry));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time_label, "1:05");
        assert_eq!(rows[0].text, "intro");
        assert_eq!(rows[1].time_label, "1:02:03");
        assert_eq!(rows[1].created_label.len(), "2026-01-01 00:00".len());
    }

    #[test]
    fn no_entry_is_empty_state() {
        assert!(note_rows(None).is_empty());
    }
}
