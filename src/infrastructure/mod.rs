//! Infrastructure layer - adapters, repositories and the run engine

pub mod llm;
pub mod logging;
pub mod outcome;
pub mod repository;
pub mod source;
pub mod storage;
pub mod template;
pub mod workflow;
