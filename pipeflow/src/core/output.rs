//! Stage outputs and the failure signal.

use super::{TypeInfo, Value};
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

type DynError = dyn Error + Send + Sync + 'static;

/// The error payload a stage emits to abort the pipeline.
///
/// Cloning shares the payload, so the error the caller receives is the very
/// one the stage produced.
#[derive(Clone)]
pub struct Failure(Arc<DynError>);

impl Failure {
    /// Wraps any error-like value.
    ///
    /// A `Failure` passed in is returned as-is rather than nested.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<DynError>>,
    {
        let boxed: Box<DynError> = error.into();
        match boxed.downcast::<Self>() {
            Ok(failure) => *failure,
            Err(other) => Self(Arc::from(other)),
        }
    }

    /// Creates a failure from a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::new(message.to_string())
    }

    /// Borrows the underlying error.
    #[must_use]
    pub fn inner(&self) -> &DynError {
        &*self.0
    }

    /// Borrows the underlying error as a concrete type.
    #[must_use]
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Returns true if both failures share the same payload.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

/// One output of a stage invocation.
#[derive(Debug, Clone)]
pub enum StageOutput {
    /// Data forwarded to the next stage.
    Data(Value),
    /// The failure channel. `None` means the stage succeeded.
    Signal(Option<Failure>),
}

impl StageOutput {
    /// Creates a data output.
    pub fn data<T: Any + Send + Sync>(value: T) -> Self {
        Self::Data(Value::new(value))
    }

    /// Returns true for a signal carrying a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Signal(Some(_)))
    }
}

/// An explicit, dynamically-built list of stage outputs.
#[derive(Debug, Clone, Default)]
pub struct StageOutputs {
    outputs: Vec<StageOutput>,
}

impl StageOutputs {
    /// Creates an empty output list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an output list that only carries a failure.
    #[must_use]
    pub fn failed(failure: Failure) -> Self {
        Self {
            outputs: vec![StageOutput::Signal(Some(failure))],
        }
    }

    /// Appends a data output.
    #[must_use]
    pub fn push<T: Any + Send + Sync>(self, value: T) -> Self {
        self.push_value(Value::new(value))
    }

    /// Appends an already-wrapped value.
    #[must_use]
    pub fn push_value(mut self, value: Value) -> Self {
        self.outputs.push(StageOutput::Data(value));
        self
    }

    /// Appends the failure channel.
    #[must_use]
    pub fn with_signal(mut self, failure: Option<Failure>) -> Self {
        self.outputs.push(StageOutput::Signal(failure));
        self
    }

    /// Returns the number of outputs, signals included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns true if there are no outputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Return types a stage function may have.
///
/// * `Result<T, E>` forwards `T`'s outputs followed by the failure channel.
/// * Tuples forward each element in order.
/// * `()` forwards nothing.
/// * Primitives, `String`, `Vec<T>`, `Option<T>` and [`Single`] forward one value.
/// * [`Value`] is forwarded as-is and [`StageOutputs`] verbatim.
///
/// Other types can opt in with [`stage_value!`](crate::stage_value).
pub trait IntoOutputs {
    /// Converts the return value into stage outputs.
    fn into_outputs(self) -> Vec<StageOutput>;

    /// The data types forwarded, when known without running the stage.
    fn output_types() -> Option<Vec<TypeInfo>>;
}

/// Forwards any value as a single output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Single<T>(pub T);

impl<T: Any + Send + Sync> IntoOutputs for Single<T> {
    fn into_outputs(self) -> Vec<StageOutput> {
        vec![StageOutput::data(self.0)]
    }

    fn output_types() -> Option<Vec<TypeInfo>> {
        Some(vec![TypeInfo::of::<T>()])
    }
}

impl<T, E> IntoOutputs for Result<T, E>
where
    T: IntoOutputs,
    E: Into<Box<DynError>>,
{
    fn into_outputs(self) -> Vec<StageOutput> {
        match self {
            Ok(value) => {
                let mut outputs = value.into_outputs();
                outputs.push(StageOutput::Signal(None));
                outputs
            }
            Err(error) => vec![StageOutput::Signal(Some(Failure::new(error)))],
        }
    }

    fn output_types() -> Option<Vec<TypeInfo>> {
        T::output_types()
    }
}

impl IntoOutputs for () {
    fn into_outputs(self) -> Vec<StageOutput> {
        Vec::new()
    }

    fn output_types() -> Option<Vec<TypeInfo>> {
        Some(Vec::new())
    }
}

impl IntoOutputs for Value {
    fn into_outputs(self) -> Vec<StageOutput> {
        vec![StageOutput::Data(self)]
    }

    fn output_types() -> Option<Vec<TypeInfo>> {
        None
    }
}

impl IntoOutputs for StageOutputs {
    fn into_outputs(self) -> Vec<StageOutput> {
        self.outputs
    }

    fn output_types() -> Option<Vec<TypeInfo>> {
        None
    }
}

impl<T: Any + Send + Sync> IntoOutputs for Vec<T> {
    fn into_outputs(self) -> Vec<StageOutput> {
        vec![StageOutput::data(self)]
    }

    fn output_types() -> Option<Vec<TypeInfo>> {
        Some(vec![TypeInfo::of::<Self>()])
    }
}

impl<T: Any + Send + Sync> IntoOutputs for Option<T> {
    fn into_outputs(self) -> Vec<StageOutput> {
        vec![StageOutput::data(self)]
    }

    fn output_types() -> Option<Vec<TypeInfo>> {
        Some(vec![TypeInfo::of::<Self>()])
    }
}

/// Lets a type be returned directly from a stage as a single value.
///
/// ```rust,ignore
/// #[derive(Clone)]
/// struct Person { name: String }
/// pipeflow::stage_value!(Person);
/// ```
#[macro_export]
macro_rules! stage_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::core::IntoOutputs for $ty {
                fn into_outputs(self) -> ::std::vec::Vec<$crate::core::StageOutput> {
                    ::std::vec![$crate::core::StageOutput::data(self)]
                }

                fn output_types() -> ::std::option::Option<::std::vec::Vec<$crate::core::TypeInfo>> {
                    ::std::option::Option::Some(::std::vec![$crate::core::TypeInfo::of::<$ty>()])
                }
            }
        )+
    };
}

crate::stage_value!(
    String, &'static str, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
    usize, f32, f64,
);

macro_rules! impl_tuple_outputs {
    ($($name:ident),+) => {
        impl<$($name: Any + Send + Sync),+> IntoOutputs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_outputs(self) -> Vec<StageOutput> {
                let ($($name,)+) = self;
                vec![$(StageOutput::data($name)),+]
            }

            fn output_types() -> Option<Vec<TypeInfo>> {
                Some(vec![$(TypeInfo::of::<$name>()),+])
            }
        }
    };
}

impl_tuple_outputs!(A, B);
impl_tuple_outputs!(A, B, C);
impl_tuple_outputs!(A, B, C, D);
