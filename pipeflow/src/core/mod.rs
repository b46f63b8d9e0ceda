//! Core domain model types for pipeflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Dynamically-typed values and their runtime type identity
//! - Stage outputs and the failure signal
//! - Return-type adapters for stage functions

mod output;
mod value;

pub use output::{Failure, IntoOutputs, Single, StageOutput, StageOutputs};
pub use value::{ArgumentPool, TypeInfo, Value};
