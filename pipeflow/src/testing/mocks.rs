//! Mock stages for testing.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::core::{Failure, StageOutput, TypeInfo, Value};
use crate::errors::ArgumentTypeError;
use crate::stages::{BoxedStage, Stage, StageSignature};

/// A stage that always fails with the same payload.
///
/// Its inputs are dynamic, so it slots in after any producer.
#[derive(Debug)]
pub struct FailingStage {
    name: String,
    failure: Failure,
    signature: StageSignature,
    call_count: Mutex<usize>,
}

impl FailingStage {
    /// Creates a one-input failing stage.
    #[must_use]
    pub fn new(name: impl Into<String>, failure: Failure) -> Self {
        Self::with_arity(name, failure, 1)
    }

    /// Creates a failing stage that consumes `arity` inputs of any type.
    #[must_use]
    pub fn with_arity(name: impl Into<String>, failure: Failure, arity: usize) -> Self {
        Self {
            name: name.into(),
            failure,
            signature: StageSignature::new(vec![TypeInfo::of::<Value>(); arity], None),
            call_count: Mutex::new(0),
        }
    }

    /// Returns the failure this stage raises.
    #[must_use]
    pub fn failure(&self) -> &Failure {
        &self.failure
    }

    /// Returns the number of times the stage was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }
}

impl Stage for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &StageSignature {
        &self.signature
    }

    fn invoke(&self, _inputs: Vec<Value>) -> Result<Vec<StageOutput>, ArgumentTypeError> {
        *self.call_count.lock() += 1;
        Ok(vec![StageOutput::Signal(Some(self.failure.clone()))])
    }
}

/// A stage that wraps another and records every invocation.
#[derive(Debug)]
pub struct RecordingStage {
    inner: BoxedStage,
    executions: Mutex<Vec<RecordedExecution>>,
}

/// A recorded invocation.
#[derive(Debug, Clone)]
pub struct RecordedExecution {
    /// Runtime type names of the inputs, in order.
    pub input_types: Vec<&'static str>,
    /// Number of data values the stage produced.
    pub forwarded: usize,
    /// Whether the stage signalled failure.
    pub failed: bool,
}

impl RecordingStage {
    /// Wraps a stage.
    #[must_use]
    pub fn new(inner: BoxedStage) -> Arc<Self> {
        Arc::new(Self {
            inner,
            executions: Mutex::new(Vec::new()),
        })
    }

    /// Returns all recorded executions.
    #[must_use]
    pub fn executions(&self) -> Vec<RecordedExecution> {
        self.executions.lock().clone()
    }

    /// Returns the number of executions.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.executions.lock().len()
    }

    /// Clears recorded executions.
    pub fn clear(&self) {
        self.executions.lock().clear();
    }
}

impl Stage for RecordingStage {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn signature(&self) -> &StageSignature {
        self.inner.signature()
    }

    fn invoke(&self, inputs: Vec<Value>) -> Result<Vec<StageOutput>, ArgumentTypeError> {
        let input_types = inputs.iter().map(Value::type_name).collect();
        let outputs = self.inner.invoke(inputs)?;
        self.executions.lock().push(RecordedExecution {
            input_types,
            forwarded: outputs.iter().filter(|o| matches!(o, StageOutput::Data(_))).count(),
            failed: outputs.iter().any(StageOutput::is_failure),
        });
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::IntoStage;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failing_stage() {
        let stage = FailingStage::new("fail", Failure::msg("boom"));
        assert_eq!(stage.signature().arity(), 1);
        assert!(stage.signature().inputs()[0].is_dynamic());

        let outputs = stage.invoke(crate::args![1]).unwrap();
        assert_eq!(stage.call_count(), 1);
        assert!(outputs[0].is_failure());
    }

    #[test]
    fn test_recording_stage() {
        let stage = RecordingStage::new((|a: i32, b: i32| a + b).into_named_stage("sum"));
        assert_eq!(stage.name(), "sum");

        stage.invoke(crate::args![1, 2]).unwrap();
        let executions = stage.executions();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].input_types, vec!["i32", "i32"]);
        assert_eq!(executions[0].forwarded, 1);
        assert!(!executions[0].failed);

        stage.clear();
        assert_eq!(stage.execution_count(), 0);
    }

    #[test]
    fn test_recording_stage_skips_rejected_inputs() {
        let stage = RecordingStage::new((|a: i32| a).into_stage());

        assert!(stage.invoke(crate::args!["x".to_string()]).is_err());
        assert_eq!(stage.execution_count(), 0);
    }
}
