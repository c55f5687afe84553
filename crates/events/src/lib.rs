//! Change notification plumbing for stored notes.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`EntryChange`]: the per-video change envelope.
//! - [`diff_maps`]: splits whole-mapping snapshots into per-video changes.

pub mod bus;
pub mod diff;

pub use bus::{EntryChange, EventBus};
pub use diff::diff_maps;
