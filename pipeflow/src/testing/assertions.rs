//! Test assertions for pipeline results.

use std::any::Any;
use std::fmt::Debug;

use crate::core::Failure;
use crate::errors::{ArityError, PipeflowError, PipelineValidationError, TypeMismatchError};
use crate::pipeline::PipelineOutput;

/// Asserts that the result is a single value equal to `expected`.
pub fn assert_single<T>(result: &Result<PipelineOutput, PipeflowError>, expected: &T)
where
    T: Any + PartialEq + Debug,
{
    match result {
        Ok(output) => {
            let actual = output.downcast_ref::<T>();
            assert_eq!(
                actual,
                Some(expected),
                "Expected a single {}, got {:?}",
                std::any::type_name::<T>(),
                output
            );
        }
        Err(e) => panic!("Expected success, got error: {e}"),
    }
}

/// Asserts that the result is an empty output.
pub fn assert_empty(result: &Result<PipelineOutput, PipeflowError>) {
    match result {
        Ok(output) => assert!(output.is_empty(), "Expected empty output, got {output:?}"),
        Err(e) => panic!("Expected success, got error: {e}"),
    }
}

/// Asserts that the result is exactly the given stage failure.
pub fn assert_stage_failure(result: &Result<PipelineOutput, PipeflowError>, expected: &Failure) {
    match result {
        Err(PipeflowError::Stage(actual)) => assert!(
            actual.ptr_eq(expected),
            "Expected failure '{expected}', got a different failure '{actual}'"
        ),
        other => panic!("Expected stage failure '{expected}', got {other:?}"),
    }
}

/// Asserts that the result is an arity error and returns it.
pub fn assert_arity_error(result: &Result<PipelineOutput, PipeflowError>) -> &ArityError {
    match result {
        Err(PipeflowError::Arity(e)) => e,
        other => panic!("Expected arity error, got {other:?}"),
    }
}

/// Asserts that the result is a call-time type mismatch and returns it.
pub fn assert_type_mismatch(result: &Result<PipelineOutput, PipeflowError>) -> &TypeMismatchError {
    match result {
        Err(PipeflowError::TypeMismatch(e)) => e,
        other => panic!("Expected type mismatch, got {other:?}"),
    }
}

/// Asserts that a build error carries the given contract code.
pub fn assert_contract_code(error: &PipelineValidationError, code: &str) {
    assert_eq!(
        error.code(),
        Some(code),
        "Expected contract code {code}, got error: {error}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ArgumentTypeError;
    use crate::core::TypeInfo;

    #[test]
    fn test_assert_single() {
        let result = Ok(PipelineOutput::materialize(crate::args![18]));
        assert_single(&result, &18_i32);
    }

    #[test]
    #[should_panic(expected = "Expected a single")]
    fn test_assert_single_fails_on_sequence() {
        let result = Ok(PipelineOutput::materialize(crate::args![1, 2]));
        assert_single(&result, &1_i32);
    }

    #[test]
    fn test_assert_empty() {
        assert_empty(&Ok(PipelineOutput::Empty));
    }

    #[test]
    fn test_assert_stage_failure() {
        let failure = Failure::msg("boom");
        let result = Err(PipeflowError::Stage(failure.clone()));
        assert_stage_failure(&result, &failure);
    }

    #[test]
    #[should_panic(expected = "different failure")]
    fn test_assert_stage_failure_requires_same_payload() {
        let result = Err(PipeflowError::Stage(Failure::msg("boom")));
        assert_stage_failure(&result, &Failure::msg("boom"));
    }

    #[test]
    fn test_assert_arity_error() {
        let result = Err(PipeflowError::Arity(ArityError::new(1, "sum", 2, 1)));
        assert_eq!(assert_arity_error(&result).expected, 2);
    }

    #[test]
    fn test_assert_type_mismatch() {
        let source = ArgumentTypeError {
            index: 0,
            expected: TypeInfo::of::<i32>(),
            found: Some(TypeInfo::of::<String>()),
        };
        let result = Err(PipeflowError::TypeMismatch(TypeMismatchError::new(0, "inc", source)));
        assert_eq!(assert_type_mismatch(&result).stage, "inc");
    }

    #[test]
    fn test_assert_contract_code() {
        let error = PipelineValidationError::not_callable(0, "i32");
        assert_contract_code(&error, "CONTRACT-PIPE-NOT_CALLABLE");
    }
}
