//! The value a pipeline call produces.

use crate::coercion::coerce_into;
use crate::core::Value;
use crate::errors::CoercionError;
use std::any::Any;

/// What survived the last stage of a pipeline.
#[derive(Debug, Clone, Default)]
pub enum PipelineOutput {
    /// No value survived.
    #[default]
    Empty,
    /// Exactly one value survived.
    Single(Value),
    /// Two or more values survived, in order.
    Sequence(Vec<Value>),
}

impl PipelineOutput {
    /// Collapses the final argument pool.
    #[must_use]
    pub fn materialize(mut values: Vec<Value>) -> Self {
        match values.len() {
            0 => Self::Empty,
            1 => values.pop().map_or(Self::Empty, Self::Single),
            _ => Self::Sequence(values),
        }
    }

    /// Returns true if nothing survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Sequence(values) => values.len(),
        }
    }

    /// Borrows all values in order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        match self {
            Self::Empty => &[],
            Self::Single(value) => std::slice::from_ref(value),
            Self::Sequence(values) => values,
        }
    }

    /// Consumes the output and returns all values in order.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Empty => Vec::new(),
            Self::Single(value) => vec![value],
            Self::Sequence(values) => values,
        }
    }

    /// Borrows the single value.
    #[must_use]
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            Self::Single(value) => Some(value),
            _ => None,
        }
    }

    /// Consumes the output and returns the single value.
    #[must_use]
    pub fn into_single(self) -> Option<Value> {
        match self {
            Self::Single(value) => Some(value),
            _ => None,
        }
    }

    /// Borrows the single value as a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_single().and_then(Value::downcast_ref::<T>)
    }

    /// Returns a clone of the single value as a `T`.
    #[must_use]
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.as_single().and_then(Value::get::<T>)
    }

    /// Writes the single value into `target` using the default coercion rules.
    pub fn coerce_into<T>(&self, target: &mut T) -> Result<(), CoercionError>
    where
        T: Any + Send + Sync + Clone,
    {
        let value = self
            .as_single()
            .ok_or(CoercionError::NotSingle { len: self.len() })?;
        coerce_into(value, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_materialize_empty() {
        let output = PipelineOutput::materialize(Vec::new());

        assert!(output.is_empty());
        assert_eq!(output.len(), 0);
        assert!(output.values().is_empty());
    }

    #[test]
    fn test_materialize_single_is_not_a_sequence() {
        let output = PipelineOutput::materialize(crate::args![18]);

        assert!(matches!(output, PipelineOutput::Single(_)));
        assert_eq!(output.get::<i32>(), Some(18));
        assert_eq!(output.downcast_ref::<i32>(), Some(&18));
    }

    #[test]
    fn test_materialize_many() {
        let output = PipelineOutput::materialize(crate::args![1, 2, 3]);

        assert!(matches!(output, PipelineOutput::Sequence(_)));
        assert_eq!(output.len(), 3);
        assert!(output.as_single().is_none());
        let values: Vec<i32> = output
            .into_values()
            .into_iter()
            .filter_map(|v| v.get::<i32>())
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_coerce_single() {
        let output = PipelineOutput::materialize(crate::args!["GO".to_string()]);
        let mut target = String::new();

        output.coerce_into(&mut target).unwrap();
        assert_eq!(target, "GO");
    }

    #[test]
    fn test_coerce_requires_single() {
        let output = PipelineOutput::materialize(crate::args![1, 2]);
        let mut target = 0_i32;

        assert_eq!(
            output.coerce_into(&mut target),
            Err(CoercionError::NotSingle { len: 2 })
        );
    }
}
