//! Storage infrastructure - storage backend implementations

mod local;

pub use local::LocalStorage;
