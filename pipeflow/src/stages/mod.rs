//! Stage trait and implementations.
//!
//! Stages are the units a pipeline is composed of. Plain Rust functions and
//! closures become stages through [`IntoStage`], which records their input
//! types once so the pipeline never has to inspect them per call.

pub mod combinators;

use crate::core::{IntoOutputs, StageOutput, TypeInfo, Value};
use crate::errors::ArgumentTypeError;
use std::any::Any;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

/// A shared, type-erased stage.
pub type BoxedStage = Arc<dyn Stage>;

/// The declared shape of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageSignature {
    inputs: Vec<TypeInfo>,
    outputs: Option<Vec<TypeInfo>>,
}

impl StageSignature {
    /// Creates a signature from its input types and, if known, its output types.
    #[must_use]
    pub fn new(inputs: Vec<TypeInfo>, outputs: Option<Vec<TypeInfo>>) -> Self {
        Self { inputs, outputs }
    }

    /// Number of inputs the stage consumes.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    /// Input types, in order.
    #[must_use]
    pub fn inputs(&self) -> &[TypeInfo] {
        &self.inputs
    }

    /// Forwarded output types, in order, if they are known statically.
    #[must_use]
    pub fn outputs(&self) -> Option<&[TypeInfo]> {
        self.outputs.as_deref()
    }
}

/// Trait for pipeline stages.
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Returns the declared input (and possibly output) types.
    fn signature(&self) -> &StageSignature;

    /// Invokes the stage.
    ///
    /// `inputs` holds exactly [`StageSignature::arity`] values. The returned
    /// outputs may contain a failure signal; an `Err` means an input had the
    /// wrong runtime type and the stage did not run.
    fn invoke(&self, inputs: Vec<Value>) -> Result<Vec<StageOutput>, ArgumentTypeError>;
}

/// A stage backed by a Rust function or closure.
pub struct FnStage<F, Args> {
    name: String,
    func: F,
    signature: StageSignature,
    _args: PhantomData<fn(Args)>,
}

impl<F, Args> FnStage<F, Args> {
    fn new(name: impl Into<String>, func: F, signature: StageSignature) -> Self {
        Self {
            name: name.into(),
            func,
            signature,
            _args: PhantomData,
        }
    }
}

impl<F, Args> Debug for FnStage<F, Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}

/// Conversion of functions and closures into stages.
///
/// Implemented for every `Fn(A, B, ..) -> R` with up to six arguments,
/// where each argument is `Clone + Send + Sync + 'static` and `R` implements
/// [`IntoOutputs`]. The `Args` parameter only disambiguates the impls.
pub trait IntoStage<Args>: Sized {
    /// Converts into a stage named after the function's type.
    fn into_stage(self) -> BoxedStage;

    /// Converts into a stage with an explicit name.
    fn into_named_stage(self, name: impl Into<String>) -> BoxedStage;
}

fn take_input<T>(
    inputs: &mut impl Iterator<Item = Value>,
    index: usize,
) -> Result<T, ArgumentTypeError>
where
    T: Any + Send + Sync + Clone,
{
    let expected = TypeInfo::of::<T>();
    let value = inputs.next().ok_or(ArgumentTypeError {
        index,
        expected,
        found: None,
    })?;
    value.take::<T>().map_err(|value| ArgumentTypeError {
        index,
        expected,
        found: Some(value.type_info()),
    })
}

macro_rules! impl_fn_stage {
    ($($arg:ident => $index:tt),*) => {
        impl<F, R, $($arg,)*> Stage for FnStage<F, ($($arg,)*)>
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: IntoOutputs,
            $($arg: Any + Send + Sync + Clone,)*
        {
            fn name(&self) -> &str {
                &self.name
            }

            fn signature(&self) -> &StageSignature {
                &self.signature
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, inputs: Vec<Value>) -> Result<Vec<StageOutput>, ArgumentTypeError> {
                let mut inputs = inputs.into_iter();
                $(let $arg = take_input::<$arg>(&mut inputs, $index)?;)*
                Ok((self.func)($($arg),*).into_outputs())
            }
        }

        impl<F, R, $($arg,)*> IntoStage<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: IntoOutputs,
            $($arg: Any + Send + Sync + Clone,)*
        {
            fn into_stage(self) -> BoxedStage {
                self.into_named_stage(std::any::type_name::<F>())
            }

            fn into_named_stage(self, name: impl Into<String>) -> BoxedStage {
                let signature = StageSignature::new(
                    vec![$(TypeInfo::of::<$arg>()),*],
                    R::output_types(),
                );
                Arc::new(FnStage::<F, ($($arg,)*)>::new(name, self, signature))
            }
        }
    };
}

impl_fn_stage!();
impl_fn_stage!(A => 0);
impl_fn_stage!(A => 0, B => 1);
impl_fn_stage!(A => 0, B => 1, C => 2);
impl_fn_stage!(A => 0, B => 1, C => 2, D => 3);
impl_fn_stage!(A => 0, B => 1, C => 2, D => 3, E => 4);
impl_fn_stage!(A => 0, B => 1, C => 2, D => 3, E => 4, G => 5);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Failure, Single};
    use pretty_assertions::assert_eq;

    fn sum(a: i32, b: i32) -> Result<i32, Failure> {
        Ok(a + b)
    }

    fn data(outputs: &[StageOutput]) -> Vec<Value> {
        outputs
            .iter()
            .filter_map(|output| match output {
                StageOutput::Data(value) => Some(value.clone()),
                StageOutput::Signal(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_fn_stage_signature() {
        let stage = sum.into_stage();

        assert_eq!(stage.signature().arity(), 2);
        assert_eq!(
            stage.signature().inputs(),
            &[TypeInfo::of::<i32>(), TypeInfo::of::<i32>()]
        );
        assert_eq!(stage.signature().outputs(), Some(&[TypeInfo::of::<i32>()][..]));
        assert!(stage.name().ends_with("sum"));
    }

    #[test]
    fn test_fn_stage_invoke() {
        let stage = sum.into_stage();
        let outputs = stage.invoke(crate::args![5, 7]).unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(data(&outputs)[0].get::<i32>(), Some(12));
        assert!(matches!(outputs[1], StageOutput::Signal(None)));
    }

    #[test]
    fn test_named_closure_stage() {
        let stage = (|s: String| Single(s.len())).into_named_stage("length");

        assert_eq!(stage.name(), "length");
        let outputs = stage.invoke(crate::args!["abc".to_string()]).unwrap();
        assert_eq!(data(&outputs)[0].get::<usize>(), Some(3));
    }

    #[test]
    fn test_zero_arity_stage() {
        let stage = (|| 42_u32).into_stage();

        assert_eq!(stage.signature().arity(), 0);
        let outputs = stage.invoke(Vec::new()).unwrap();
        assert_eq!(data(&outputs)[0].get::<u32>(), Some(42));
    }

    #[test]
    fn test_six_arity_stage() {
        let stage = (|a: u8, b: u8, c: u8, d: u8, e: u8, f: u8| a + b + c + d + e + f).into_stage();
        let outputs = stage.invoke(crate::args![1_u8, 2_u8, 3_u8, 4_u8, 5_u8, 6_u8]).unwrap();
        assert_eq!(data(&outputs)[0].get::<u8>(), Some(21));
    }

    #[test]
    fn test_wrong_input_type() {
        let stage = sum.into_stage();
        let err = stage.invoke(crate::args![5, "7".to_string()]).unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.expected, TypeInfo::of::<i32>());
        assert_eq!(err.found, Some(TypeInfo::of::<String>()));
    }

    #[test]
    fn test_missing_input() {
        let stage = sum.into_stage();
        let err = stage.invoke(crate::args![5]).unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.found, None);
    }

    #[test]
    fn test_dynamic_input_accepts_any_value() {
        let stage = (|value: Value| value.type_name().to_string()).into_stage();

        assert!(stage.signature().inputs()[0].is_dynamic());
        let outputs = stage.invoke(crate::args![1.5_f64]).unwrap();
        assert_eq!(data(&outputs)[0].get::<String>(), Some("f64".to_string()));
    }

    #[test]
    fn test_fn_stage_debug() {
        let stage = sum.into_named_stage("sum");
        assert!(format!("{stage:?}").contains("FnStage"));
    }
}
