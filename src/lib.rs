//! # Regex Sandbox
//!
//! A bounded regex execution engine with thread isolation.
//!
//! This crate accepts untrusted pattern/flags/text triples and executes them
//! in isolation, so that attacker-influenced input (catastrophic
//! backtracking in particular) cannot hang the calling service. It enforces
//! strict operational boundaries:
//!
//! - **Hard deadlines**: every task is raced against a fixed wall-clock
//!   budget and abandoned when it elapses
//! - **Thread isolation**: each task runs on a fresh worker thread with its
//!   own fault domain and freshly compiled patterns
//! - **Size-capped output**: match rows, replacement previews, and input
//!   sizes are all bounded by fixed ceilings
//! - **Progress streaming**: long scans report progress events correlated
//!   by request id
//!
//! ## Example
//!
//! ```rust,ignore
//! use regex_sandbox_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let dispatcher = RegexDispatcher::new();
//!
//!     let result = dispatcher.test(r"\d+", "g", "a1 b22 c333").await?;
//!     assert_eq!(result.result.total_matches, 3);
//!
//!     let preview = dispatcher.replace(r"\s+", "g", "a  b   c", "_").await?;
//!     assert_eq!(preview.result.preview, "a_b_c");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Safety Model
//!
//! The engine makes no static claims about pattern safety; its guarantee is
//! purely operational:
//!
//! 1. **Deadline supervision**: the dispatcher never blocks on a scan, only
//!    on the executor's terminal signal
//! 2. **Unconditional settlement**: a timed-out worker is abandoned and its
//!    task rejected; the engine's backtrack ceiling bounds the abandoned
//!    thread's lifetime
//! 3. **No shared state**: tasks never share compiled patterns or cursors,
//!    so failures stay local to one request

pub mod engine;
pub mod error;
pub mod prelude;

// Re-export main types at crate root for convenience
pub use engine::algorithms::{Group, MatchContext, MatchRow, ReplaceResult, TestResult};
pub use engine::config::{EngineConfig, EngineConfigBuilder};
pub use engine::dispatch::{
    PatternCatalogResponse, RegexDispatcher, ReplaceResponse, TestResponse, ValidateResponse,
};
pub use engine::normalize::{FlagBits, ValidateResult};
pub use engine::progress::ProgressEvent;
pub use engine::templates::PatternTemplate;
pub use error::{EngineError, Result};
