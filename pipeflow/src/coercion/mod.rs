//! Converting produced values into caller-owned targets.
//!
//! A [`Coercer`] knows which type pairs are convertible. Identical types
//! always are; the default rules add numeric conversions and a few string
//! conversions. A string is never parsed into a number.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::unnecessary_cast
)]

mod slot;

pub use slot::Slot;

use crate::core::{TypeInfo, Value};
use crate::errors::CoercionError;
use slot::SlotHandle;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

type ConvertFn = Arc<dyn Fn(&Value) -> Result<Value, CoercionError> + Send + Sync>;

/// A set of conversion rules between types.
#[derive(Clone)]
pub struct Coercer {
    rules: HashMap<(TypeId, TypeId), ConvertFn>,
}

impl fmt::Debug for Coercer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coercer")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Default for Coercer {
    fn default() -> Self {
        let mut coercer = Self::empty();
        coercer.register_numeric_rules();
        coercer.register_text_rules();
        coercer
    }
}

macro_rules! numeric_rules {
    (@int $coercer:ident; $from:ty; [$($to:ty),*]) => {
        $(
            $coercer.register::<$from, $to>(|value: &$from| {
                <$to>::try_from(*value).map_err(|_| CoercionError::out_of_range::<$from, $to>())
            });
        )*
    };
    (@int_to_float $coercer:ident; $from:ty; [$($to:ty),*]) => {
        $( $coercer.register::<$from, $to>(|value: &$from| Ok(*value as $to)); )*
    };
    (@float_to_int $coercer:ident; $from:ty; [$($to:ty),*]) => {
        $(
            $coercer.register::<$from, $to>(|value: &$from| {
                let truncated = (*value as f64).trunc();
                let bits = <$to>::BITS as i32;
                let lower = <$to>::MIN as f64;
                let upper = if <$to>::MIN == 0 {
                    2_f64.powi(bits)
                } else {
                    2_f64.powi(bits - 1)
                };
                // `upper` is exclusive: MAX itself rounds up to it for wide targets.
                if truncated.is_finite() && truncated >= lower && truncated < upper {
                    Ok(truncated as $to)
                } else {
                    Err(CoercionError::out_of_range::<$from, $to>())
                }
            });
        )*
    };
    (@float $coercer:ident; $from:ty; [$($to:ty),*]) => {
        $(
            $coercer.register::<$from, $to>(|value: &$from| {
                let converted = *value as $to;
                if value.is_finite() && converted.is_infinite() {
                    Err(CoercionError::out_of_range::<$from, $to>())
                } else {
                    Ok(converted)
                }
            });
        )*
    };
    ($kind:ident $coercer:ident; [$($from:ty),*] => $to:tt) => {
        $( numeric_rules!(@$kind $coercer; $from; $to); )*
    };
}

impl Coercer {
    /// Creates a coercer that only accepts identical types.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Registers a conversion from `S` to `T`, replacing any existing rule.
    pub fn register<S, T>(
        &mut self,
        convert: impl Fn(&S) -> Result<T, CoercionError> + Send + Sync + 'static,
    ) -> &mut Self
    where
        S: Any + Send + Sync,
        T: Any + Send + Sync,
    {
        let rule: ConvertFn = Arc::new(move |value: &Value| {
            let source = value.downcast_ref::<S>().ok_or_else(|| {
                CoercionError::type_mismatch(value.type_info(), TypeInfo::of::<T>())
            })?;
            convert(source).map(Value::new)
        });
        self.rules.insert((TypeId::of::<S>(), TypeId::of::<T>()), rule);
        self
    }

    /// Returns true if a value of type `from` can be converted to `to`.
    #[must_use]
    pub fn can_convert(&self, from: TypeInfo, to: TypeInfo) -> bool {
        from == to || self.rules.contains_key(&(from.id(), to.id()))
    }

    /// Converts `value` to the type `to`.
    pub fn convert(&self, value: &Value, to: TypeInfo) -> Result<Value, CoercionError> {
        if value.type_info() == to {
            return Ok(value.clone());
        }
        let rule = self
            .rules
            .get(&(value.type_info().id(), to.id()))
            .ok_or_else(|| CoercionError::type_mismatch(value.type_info(), to))?;
        rule(value)
    }

    /// Converts `value` to a `T`.
    pub fn convert_to<T>(&self, value: &Value) -> Result<T, CoercionError>
    where
        T: Any + Send + Sync + Clone,
    {
        let target = TypeInfo::of::<T>();
        self.convert(value, target)?
            .take::<T>()
            .map_err(|found| CoercionError::type_mismatch(found.type_info(), target))
    }

    /// Converts `value` and writes it into `target`.
    ///
    /// `target` is left untouched on error.
    pub fn coerce_into<T>(&self, value: &Value, target: &mut T) -> Result<(), CoercionError>
    where
        T: Any + Send + Sync + Clone,
    {
        *target = self.convert_to::<T>(value)?;
        Ok(())
    }

    /// Converts `value` and writes it into the slot held by `target`.
    ///
    /// `target` must come from [`Slot::to_value`].
    pub fn coerce_into_value(&self, value: &Value, target: &Value) -> Result<(), CoercionError> {
        let handle = target
            .downcast_ref::<SlotHandle>()
            .ok_or(CoercionError::NotWritable {
                found: target.type_name(),
            })?;
        let to = handle.target_type();
        let converted = self.convert(value, to)?;
        handle
            .store(converted)
            .map_err(|found| CoercionError::type_mismatch(found.type_info(), to))
    }

    fn register_numeric_rules(&mut self) {
        let coercer = self;
        numeric_rules!(int coercer;
            [i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize]
            => [i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize]);
        numeric_rules!(int_to_float coercer;
            [i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize] => [f32, f64]);
        numeric_rules!(float_to_int coercer;
            [f32, f64] => [i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize]);
        numeric_rules!(float coercer; [f32, f64] => [f32, f64]);
    }

    fn register_text_rules(&mut self) {
        self.register::<&'static str, String>(|value| Ok((*value).to_string()));
        self.register::<char, String>(|value| Ok(value.to_string()));
        self.register::<Box<str>, String>(|value| Ok(value.to_string()));
        self.register::<String, Vec<u8>>(|value| Ok(value.clone().into_bytes()));
        self.register::<Vec<u8>, String>(|value| {
            String::from_utf8(value.clone()).map_err(|e| CoercionError::Invalid {
                from: std::any::type_name::<Vec<u8>>(),
                to: std::any::type_name::<String>(),
                reason: e.to_string(),
            })
        });
    }
}

fn default_coercer() -> &'static Coercer {
    static DEFAULT: OnceLock<Coercer> = OnceLock::new();
    DEFAULT.get_or_init(Coercer::default)
}

/// Converts `value` with the default rules and writes it into `target`.
pub fn coerce_into<T>(value: &Value, target: &mut T) -> Result<(), CoercionError>
where
    T: Any + Send + Sync + Clone,
{
    default_coercer().coerce_into(value, target)
}

/// Converts `value` with the default rules and writes it into the slot held by `target`.
pub fn coerce_into_value(value: &Value, target: &Value) -> Result<(), CoercionError> {
    default_coercer().coerce_into_value(value, target)
}
