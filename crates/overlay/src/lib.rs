//! In-page runtime for timestamped video notes.
//!
//! A [`PageSession`] watches the host page for navigation between videos,
//! builds an [`OverlayInstance`] (panel plus rail markers) for the video on
//! screen, and keeps it in sync with the
//! [`AnnotationStore`](ytnote_store::AnnotationStore). The page itself is
//! reached only through the [`HostPage`] and [`MediaPlayer`] traits.

pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod markers;
pub mod overlay;
pub mod panel;
pub mod session;
pub mod watcher;

pub use config::OverlayConfig;
pub use error::SessionError;
pub use host::{ElementHandle, ElementKind, HostPage, LayoutChange, MediaPlayer};
pub use lifecycle::{Lifecycle, LifecycleAction, LifecycleState};
pub use markers::MarkerSpec;
pub use overlay::OverlayInstance;
pub use panel::{NoteRow, PanelView};
pub use session::{PageSession, SessionCommand, SessionHandle, SessionSnapshot};
pub use watcher::{LocationChange, LocationWatcher};
