//! Writable targets for dynamically-typed coercion.

use crate::core::{TypeInfo, Value};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A shared cell a coercion can write into.
///
/// Clones refer to the same cell.
pub struct Slot<T> {
    cell: Arc<RwLock<T>>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&*self.cell.read()).finish()
    }
}

impl<T> Slot<T> {
    /// Creates a slot holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            cell: Arc::new(RwLock::new(initial)),
        }
    }

    /// Replaces the current contents.
    pub fn set(&self, value: T) {
        *self.cell.write() = value;
    }

    /// Returns a copy of the current contents.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.read().clone()
    }
}

impl<T: Any + Send + Sync + Clone> Slot<T> {
    /// Wraps a handle to this slot in a [`Value`] usable as a coercion target.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::new(SlotHandle(Arc::new(self.clone())))
    }
}

/// Type-erased write access to a [`Slot`].
pub(crate) trait ErasedSlot: Send + Sync {
    fn target_type(&self) -> TypeInfo;

    /// Stores `value`, handing it back if it is not of the target type.
    fn store(&self, value: Value) -> Result<(), Value>;
}

impl<T: Any + Send + Sync + Clone> ErasedSlot for Slot<T> {
    fn target_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn store(&self, value: Value) -> Result<(), Value> {
        self.set(value.take::<T>()?);
        Ok(())
    }
}

/// The payload of a [`Value`] created by [`Slot::to_value`].
#[derive(Clone)]
pub(crate) struct SlotHandle(Arc<dyn ErasedSlot>);

impl SlotHandle {
    pub(crate) fn target_type(&self) -> TypeInfo {
        self.0.target_type()
    }

    pub(crate) fn store(&self, value: Value) -> Result<(), Value> {
        self.0.store(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slot_clones_share_cell() {
        let slot = Slot::new(1_i32);
        let other = slot.clone();

        other.set(5);
        assert_eq!(slot.get(), 5);
    }

    #[test]
    fn test_slot_value_round_trips_handle() {
        let slot: Slot<String> = Slot::default();
        let value = slot.to_value();
        let handle = value.downcast_ref::<SlotHandle>().unwrap();

        assert_eq!(handle.target_type(), TypeInfo::of::<String>());
        handle.store(Value::new("hi".to_string())).unwrap();
        assert_eq!(slot.get(), "hi");
    }

    #[test]
    fn test_slot_rejects_wrong_type() {
        let slot = Slot::new(0_u8);
        let handle = SlotHandle(Arc::new(slot.clone()));

        let back = handle.store(Value::new(3_i64)).unwrap_err();
        assert_eq!(back.get::<i64>(), Some(3));
        assert_eq!(slot.get(), 0);
    }

    #[test]
    fn test_slot_debug() {
        assert_eq!(format!("{:?}", Slot::new(3)), "Slot(3)");
    }
}
