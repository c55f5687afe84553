//! Persistence for timestamped video notes.
//!
//! - [`StorageBackend`]: async key/value storage with change broadcast,
//!   implemented by [`MemoryBackend`] and [`JsonFileBackend`].
//! - [`AnnotationStore`]: note CRUD, bulk operations and export/import on
//!   top of any backend.
//! - [`ChangeRelay`]: turns raw backend changes into per-video
//!   [`EntryChange`](ytnote_events::EntryChange)s.

pub mod annotation_store;
pub mod backend;
pub mod error;
pub mod file;
pub mod memory;
pub mod relay;

pub use annotation_store::{AnnotationStore, NOTES_KEY};
pub use backend::{Backend, StorageArea, StorageBackend, StorageChange, ValueChange};
pub use error::StoreError;
pub use file::JsonFileBackend;
pub use memory::MemoryBackend;
pub use relay::ChangeRelay;
