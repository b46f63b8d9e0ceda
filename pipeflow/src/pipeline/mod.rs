//! Pipeline building and execution.
//!
//! This module provides:
//! - Pipeline configuration
//! - Pipeline builder with validation
//! - The sequential invoker and its output type

mod builder;
mod config;
mod invoker;
mod result;


pub use builder::{PipelineBuilder, pipe};
pub use config::{ArityPolicy, PipelineConfig};
pub use invoker::Pipeline;
pub use result::PipelineOutput;
