//! Engine module containing all execution-related components.

pub mod algorithms;
pub mod config;
pub mod dispatch;
pub mod executor;
pub mod limits;
pub mod normalize;
pub mod progress;
pub mod templates;
