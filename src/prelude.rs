//! Prelude module for convenient imports.

pub use crate::engine::{
    config::EngineConfig,
    dispatch::{RegexDispatcher, ReplaceResponse, TestResponse, ValidateResponse},
    progress::ProgressEvent,
};
pub use crate::error::{EngineError, Result};
