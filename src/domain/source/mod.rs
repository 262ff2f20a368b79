//! Source domain module
//!
//! Sources are the data inputs of a workflow. Each definition carries a step
//! number that orders it within the run and a type-specific configuration that
//! an adapter turns into records.

mod adapter;
mod entity;

pub use adapter::{CheckResult, SourceAdapter, SourceAdapterFactory, SourceData};
pub use entity::{
    LlmModel, LlmSettings, NewSource, Orientation, SheetSettings, Source, SourceSettings,
    SourceType, SqlQuery,
};

#[cfg(test)]
pub use adapter::mock::{MockSourceAdapter, MockSourceAdapterFactory};
