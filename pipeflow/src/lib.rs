//! # Pipeflow
//!
//! Composition of fallible, heterogeneously-typed functions into a single
//! callable pipeline.
//!
//! Pipeflow provides:
//!
//! - **Typed stages**: plain functions and closures of up to six arguments become stages
//! - **Positional forwarding**: each stage's outputs become the next stage's inputs
//! - **Short-circuiting**: the first failure a stage signals ends the call, unwrapped
//! - **Result coercion**: write a produced value into a caller-owned slot
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pipeflow::prelude::*;
//!
//! fn sum(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! fn show(n: i32) -> String {
//!     n.to_string()
//! }
//!
//! let pipeline = PipelineBuilder::new("math")
//!     .stage(sum)
//!     .stage(show)
//!     .build()?;
//!
//! let output = pipeline.call(args![5, 7])?;
//! assert_eq!(output.get::<String>(), Some("12".to_string()));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod coercion;
pub mod core;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coercion::{coerce_into, coerce_into_value, Coercer, Slot};
    pub use crate::core::{Failure, IntoOutputs, Single, StageOutput, StageOutputs, TypeInfo, Value};
    pub use crate::errors::{
        ArityError, CoercionError, ContractErrorInfo, PipeflowError, PipelineValidationError,
        TypeMismatchError,
    };
    pub use crate::observability::{LoggingTracingEmitter, NoOpTracingEmitter, TracingEmitter};
    pub use crate::pipeline::{
        pipe, ArityPolicy, Pipeline, PipelineBuilder, PipelineConfig, PipelineOutput,
    };
    pub use crate::stages::combinators::{filter, map, reduce, tap};
    pub use crate::stages::{BoxedStage, IntoStage, Stage, StageSignature};
    pub use crate::{args, call_with, pipe, stage_value};
}
