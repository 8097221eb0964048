//! Track boundary storage.

mod store;

pub use store::{FileBoundaryStore, TrackBoundaryStore};
