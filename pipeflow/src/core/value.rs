//! Dynamically-typed values passed between stages.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Runtime identity of a Rust type, with its name for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// Returns the type info of `T`.
    #[must_use]
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the type id.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true if this is [`Value`] itself, which accepts any input.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.id == TypeId::of::<Value>()
    }

    /// Returns true if a value of type `other` can be handed to a parameter of this type.
    #[must_use]
    pub fn accepts(&self, other: Self) -> bool {
        self.is_dynamic() || *self == other
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A dynamically-typed value.
///
/// Cloning is cheap: the payload is shared. Extracting an owned `T` moves
/// the payload out when this is the last handle and clones it otherwise.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_info: TypeInfo,
}

impl Value {
    /// Wraps a value.
    ///
    /// Wrapping a `Value` returns it unchanged, so the payload is never
    /// itself a `Value`.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        if TypeId::of::<T>() == TypeId::of::<Self>() {
            let boxed: Box<dyn Any + Send + Sync> = Box::new(value);
            return match boxed.downcast::<Self>() {
                Ok(nested) => *nested,
                Err(other) => Self {
                    inner: Arc::from(other),
                    type_info: TypeInfo::of::<T>(),
                },
            };
        }
        Self {
            inner: Arc::new(value),
            type_info: TypeInfo::of::<T>(),
        }
    }

    /// Returns the runtime type of the payload.
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// Returns the type name of the payload.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_info.name()
    }

    /// Returns true if the payload is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrows the payload as a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns a clone of the payload as a `T`.
    #[must_use]
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Extracts the payload as an owned `T`, giving the value back on mismatch.
    ///
    /// Asking for [`Value`] itself always succeeds and returns this value.
    pub fn take<T: Any + Send + Sync + Clone>(self) -> Result<T, Self> {
        if let Some(this) = (&self as &dyn Any).downcast_ref::<T>() {
            return Ok(this.clone());
        }

        let type_info = self.type_info;
        match self.inner.downcast::<T>() {
            Ok(shared) => Ok(Arc::try_unwrap(shared).unwrap_or_else(|shared| (*shared).clone())),
            Err(inner) => Err(Self { inner, type_info }),
        }
    }

    /// Returns true if both values share the same payload.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>", self.type_info.name())
    }
}

/// The ordered values handed from one stage to the next.
pub type ArgumentPool = Vec<Value>;

/// Builds an argument list from plain Rust values.
///
/// ```rust,ignore
/// let output = pipeline.call(args![5, 7])?;
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        ::std::vec![$($crate::core::Value::new($arg)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_info_equality() {
        assert_eq!(TypeInfo::of::<i32>(), TypeInfo::of::<i32>());
        assert_ne!(TypeInfo::of::<i32>(), TypeInfo::of::<i64>());
        assert_eq!(TypeInfo::of::<i32>().name(), "i32");
        assert_eq!(TypeInfo::of::<i32>().to_string(), "i32");
    }

    #[test]
    fn test_dynamic_type_accepts_everything() {
        let dynamic = TypeInfo::of::<Value>();
        assert!(dynamic.is_dynamic());
        assert!(dynamic.accepts(TypeInfo::of::<String>()));
        assert!(!TypeInfo::of::<u8>().accepts(TypeInfo::of::<String>()));
    }

    #[test]
    fn test_value_downcast() {
        let value = Value::new(42_i32);

        assert!(value.is::<i32>());
        assert!(!value.is::<i64>());
        assert_eq!(value.downcast_ref::<i32>(), Some(&42));
        assert_eq!(value.get::<i32>(), Some(42));
        assert_eq!(value.type_name(), "i32");
    }

    #[test]
    fn test_take_moves_unique_payload() {
        let value = Value::new(String::from("hello"));
        assert_eq!(value.take::<String>().unwrap(), "hello");
    }

    #[test]
    fn test_take_clones_shared_payload() {
        let value = Value::new(vec![1, 2, 3]);
        let other = value.clone();

        assert!(value.ptr_eq(&other));
        assert_eq!(value.take::<Vec<i32>>().unwrap(), vec![1, 2, 3]);
        assert_eq!(other.get::<Vec<i32>>(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_take_mismatch_returns_value() {
        let value = Value::new("12".to_string());
        let back = value.take::<i32>().unwrap_err();

        assert_eq!(back.type_info(), TypeInfo::of::<String>());
        assert_eq!(back.get::<String>(), Some("12".to_string()));
    }

    #[test]
    fn test_take_as_value_is_identity() {
        let value = Value::new(7_u8);
        let same = value.clone().take::<Value>().unwrap();
        assert!(same.ptr_eq(&value));
    }

    #[test]
    fn test_wrapping_a_value_does_not_nest() {
        let value = Value::new(42_i32);
        let wrapped = Value::new(value.clone());

        assert!(wrapped.ptr_eq(&value));
        assert_eq!(wrapped.type_info(), TypeInfo::of::<i32>());
        assert_eq!(wrapped.get::<i32>(), Some(42));
    }

    #[test]
    fn test_args_macro_accepts_values() {
        let forwarded = Value::new("go".to_string());
        let args = crate::args![forwarded, 2_usize];

        assert_eq!(args[0].type_name(), "alloc::string::String");
        assert_eq!(args[0].get::<String>(), Some("go".to_string()));
        assert_eq!(args[1].get::<usize>(), Some(2));
    }

    #[test]
    fn test_args_macro() {
        let args: ArgumentPool = crate::args![5, "seven".to_string()];

        assert_eq!(args.len(), 2);
        assert_eq!(args[0].get::<i32>(), Some(5));
        assert_eq!(args[1].get::<String>(), Some("seven".to_string()));
        assert_eq!(format!("{:?}", args[0]), "Value<i32>");
    }
}
