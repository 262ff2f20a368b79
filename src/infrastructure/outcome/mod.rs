//! Outcome adapters

mod factory;
mod pdf;
mod text;
mod word;

pub use factory::DefaultOutcomeAdapterFactory;
pub use pdf::PdfOutcome;
pub use text::TextOutcome;
pub use word::{render_docx, WordOutcome};
