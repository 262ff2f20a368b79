//! Storage domain - file placements and the backend capability

mod backend;
mod file_template;

pub use backend::StorageBackend;
pub use file_template::{FilePlacement, FileTemplate};
