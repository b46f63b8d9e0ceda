//! Testing utilities for pipeflow pipelines.
//!
//! This module provides:
//! - Mock stages that fail on demand or record their invocations
//! - Assertions for pipeline results

mod assertions;
mod mocks;

pub use assertions::{
    assert_arity_error, assert_contract_code, assert_empty, assert_single, assert_stage_failure,
    assert_type_mismatch,
};
pub use mocks::{FailingStage, RecordedExecution, RecordingStage};
