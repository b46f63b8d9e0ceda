//! Error types for pipeflow.
//!
//! Every failure a pipeline can report is a variant of [`PipeflowError`].
//! Construction problems surface from the builder, arity and type problems
//! from the invoker, and a stage's own failure is passed through untouched.

use crate::core::{Failure, TypeInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for pipeflow operations.
#[derive(Debug, Error)]
pub enum PipeflowError {
    /// The pipeline could not be constructed.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A stage could not be given enough inputs.
    #[error("{0}")]
    Arity(#[from] ArityError),

    /// A stage received an input of the wrong runtime type.
    #[error("{0}")]
    TypeMismatch(#[from] TypeMismatchError),

    /// A stage signalled failure. The payload is the stage's own error.
    #[error(transparent)]
    Stage(#[from] Failure),

    /// A produced value could not be written into a target.
    #[error("{0}")]
    Coercion(#[from] CoercionError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PipeflowError {
    /// Returns the stage failure carried by this error, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Stage(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns true if the error was produced by a stage rather than by the pipeline.
    #[must_use]
    pub fn is_stage_failure(&self) -> bool {
        matches!(self, Self::Stage(_))
    }

    /// Consumes the error and returns the stage failure, if any.
    pub fn into_failure(self) -> Result<Failure, Self> {
        match self {
            Self::Stage(failure) => Ok(failure),
            other => Err(other),
        }
    }
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "CONTRACT-PIPE-NOT_CALLABLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Creates a contract error info whose fix hint comes from [`ContractSuggestions`].
    #[must_use]
    pub fn suggested(code: impl Into<String>, summary: impl Into<String>) -> Self {
        let info = Self::new(code, summary);
        match ContractSuggestions::get(&info.code) {
            Some(hint) => info.with_fix_hint(hint),
            None => info,
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Error raised when a pipeline cannot be built.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// Position of the offending stage, when one is to blame.
    pub position: Option<usize>,
    /// Names of the stages involved.
    pub stages: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            stages: Vec::new(),
            error_info: None,
        }
    }

    /// Error for a stage candidate that cannot be invoked.
    #[must_use]
    pub fn not_callable(position: usize, found: &str) -> Self {
        Self::new(format!(
            "Stage at position {position} is not callable (found value of type {found})"
        ))
        .at_position(position)
        .with_error_info(
            ContractErrorInfo::suggested(
                "CONTRACT-PIPE-NOT_CALLABLE",
                format!("Candidate {position} is not a stage"),
            )
            .with_context_entry("found", found),
        )
    }

    /// Error for adjacent stages whose types cannot line up.
    #[must_use]
    pub fn incompatible_stages(
        position: usize,
        producer: &str,
        consumer: &str,
        input: usize,
        produced: TypeInfo,
        expected: TypeInfo,
    ) -> Self {
        Self::new(format!(
            "Stage '{consumer}' at position {position} expects {expected} as input {input}, \
             but stage '{producer}' produces {produced}"
        ))
        .at_position(position)
        .with_stages(vec![producer.to_string(), consumer.to_string()])
        .with_error_info(
            ContractErrorInfo::suggested(
                "CONTRACT-PIPE-TYPE_MISMATCH",
                format!("Input {input} of stage {position} has the wrong type"),
            )
            .with_context_entry("produced", produced.name())
            .with_context_entry("expected", expected.name()),
        )
    }

    /// Error for adjacent stages whose counts cannot line up under exact arity.
    #[must_use]
    pub fn arity_mismatch(
        position: usize,
        producer: &str,
        consumer: &str,
        produced: usize,
        expected: usize,
    ) -> Self {
        Self::new(format!(
            "Stage '{consumer}' at position {position} takes {expected} inputs, \
             but stage '{producer}' forwards {produced}"
        ))
        .at_position(position)
        .with_stages(vec![producer.to_string(), consumer.to_string()])
        .with_error_info(
            ContractErrorInfo::suggested(
                "CONTRACT-PIPE-ARITY",
                format!("Stage {position} cannot be fed exactly"),
            )
            .with_context_entry("produced", produced.to_string())
            .with_context_entry("expected", expected.to_string()),
        )
    }

    /// Sets the offending position.
    #[must_use]
    pub fn at_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the contract code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

/// Error raised when a stage cannot be given as many inputs as it declares.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Incorrect number of arguments for stage '{stage}' at position {position}: \
     expected {expected}, {available} available"
)]
pub struct ArityError {
    /// Position of the stage in the pipeline.
    pub position: usize,
    /// Name of the stage.
    pub stage: String,
    /// Declared input arity.
    pub expected: usize,
    /// Number of values that could be resolved.
    pub available: usize,
}

impl ArityError {
    /// Creates a new arity error.
    #[must_use]
    pub fn new(position: usize, stage: impl Into<String>, expected: usize, available: usize) -> Self {
        Self {
            position,
            stage: stage.into(),
            expected,
            available,
        }
    }
}

/// An input value that did not have the type a stage declared.
///
/// Produced by [`Stage::invoke`](crate::stages::Stage::invoke); the invoker
/// turns it into a [`TypeMismatchError`] naming the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("input {index} expected {expected}, found {}", .found.map_or("nothing", |t| t.name()))]
pub struct ArgumentTypeError {
    /// Input index within the stage.
    pub index: usize,
    /// Declared type.
    pub expected: TypeInfo,
    /// Runtime type of the supplied value, `None` if no value was supplied.
    pub found: Option<TypeInfo>,
}

/// Error raised at call time when a stage input has the wrong runtime type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Type mismatch for stage '{stage}' at position {position}: {source}")]
pub struct TypeMismatchError {
    /// Position of the stage in the pipeline.
    pub position: usize,
    /// Name of the stage.
    pub stage: String,
    /// The offending input.
    pub source: ArgumentTypeError,
}

impl TypeMismatchError {
    /// Creates a new type mismatch error.
    #[must_use]
    pub fn new(position: usize, stage: impl Into<String>, source: ArgumentTypeError) -> Self {
        Self {
            position,
            stage: stage.into(),
            source,
        }
    }
}

/// Errors raised while writing a value into a target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// The target cannot be written through.
    #[error("Coercion target must be a writable slot, found {found}")]
    NotWritable {
        /// Type of the value given as target.
        found: &'static str,
    },

    /// No conversion exists between the two types.
    #[error("Cannot convert value of type {from} to type {to}")]
    TypeMismatch {
        /// Source type name.
        from: &'static str,
        /// Target type name.
        to: &'static str,
    },

    /// The conversion exists but the value does not fit the target type.
    #[error("Value of type {from} is out of range for type {to}")]
    OutOfRange {
        /// Source type name.
        from: &'static str,
        /// Target type name.
        to: &'static str,
    },

    /// The conversion exists but rejected this particular value.
    #[error("Invalid conversion from {from} to {to}: {reason}")]
    Invalid {
        /// Source type name.
        from: &'static str,
        /// Target type name.
        to: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A single value was required but the pipeline produced another shape.
    #[error("Expected exactly one value, pipeline produced {len}")]
    NotSingle {
        /// Number of values produced.
        len: usize,
    },
}

impl CoercionError {
    /// Creates a type mismatch error between two types.
    #[must_use]
    pub fn type_mismatch(from: TypeInfo, to: TypeInfo) -> Self {
        Self::TypeMismatch {
            from: from.name(),
            to: to.name(),
        }
    }

    /// Creates an out-of-range error between two types.
    #[must_use]
    pub fn out_of_range<S: 'static, T: 'static>() -> Self {
        Self::OutOfRange {
            from: std::any::type_name::<S>(),
            to: std::any::type_name::<T>(),
        }
    }
}

/// Provides default suggestions for pipeflow contract error codes.
pub struct ContractSuggestions;

impl ContractSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            "CONTRACT-PIPE-NOT_CALLABLE" => Some(
                "Wrap functions with `IntoStage::into_stage` before erasing them. \
                 Only an `Arc<dyn Stage>` or a `Pipeline` can be erased into a pipeline.",
            ),
            "CONTRACT-PIPE-TYPE_MISMATCH" => Some(
                "Insert a converting stage or change the producing stage's return type. \
                 Outputs feed the next stage by position.",
            ),
            "CONTRACT-PIPE-ARITY" => Some(
                "Use the fallback arity policy or forward the missing values explicitly.",
            ),
            _ => None,
        }
    }
}
