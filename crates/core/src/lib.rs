//! Domain model and pure logic for timestamped video notes.
//!
//! Nothing in this crate performs I/O: persistence lives in `ytnote-store`,
//! the in-page runtime in `ytnote-overlay`.

pub mod error;
pub mod geometry;
pub mod note;
pub mod search;
pub mod time_format;
pub mod transfer;
pub mod types;
pub mod video_url;

pub use error::CoreError;
pub use note::{Note, NotesMap, PageSnapshot, VideoEntry};
