use std::any::{Any, TypeId};
use std::sync::Arc;

/// A container for type-erased values that preserves type information
///
/// Cloning an `AnyValue` only bumps a reference count, so it can be copied
/// out from under a lock and downcast once the lock is gone.
#[derive(Clone)]
pub(crate) struct AnyValue {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) value: Arc<dyn Any + Send + Sync>,
}

impl AnyValue {
    /// Create a new AnyValue from a value of any type that implements Any, Send, and Sync
    pub(crate) fn new<T: 'static + Any + Send + Sync>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// Check if the contained value is of type T
    pub(crate) fn is_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Get a reference to the contained value if it is of type T
    pub(crate) fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if !self.is_type::<T>() {
            return None;
        }
        self.value.downcast_ref::<T>()
    }

    /// Clone the contained value out if it is of type T
    pub(crate) fn cloned<T: 'static + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }
}

impl std::fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
