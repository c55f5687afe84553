pub mod notes;
pub mod search;
pub mod transfer;
pub mod videos;
