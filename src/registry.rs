use crate::any_value::AnyValue;
use crate::container::Container;
use crate::lifetime::Lifetime;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A stored factory: the resolving container plus an argument tuple in, an instance out
///
/// `Args` is `()`, `(A,)` or `(A, B)` depending on how the factory was
/// registered. Resolution only succeeds when the caller asks for the exact
/// same argument tuple.
pub type Factory<T, Args> = Arc<dyn Fn(&Container, Args) -> T + Send + Sync>;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a single container, used as the key for scoped instances
///
/// Ids are process-wide and never reused, so a stale id can't alias a newer
/// container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u64);

impl ContainerId {
    pub(crate) fn next() -> Self {
        ContainerId(NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

struct Registration {
    lifetime: Lifetime,
    signature: &'static str,
    factory: AnyValue,
}

#[derive(Default)]
struct RegistryState {
    registrations: HashMap<TypeId, Registration>,
    shared: HashMap<TypeId, AnyValue>,
    scoped: HashMap<ContainerId, HashMap<TypeId, AnyValue>>,
}

/// The backing store shared by a container and every subcontainer spawned from it
///
/// Holds one registration (factory plus [`Lifetime`]) per type, the
/// store-wide cache for `Shared` instances, and a per-container cache for
/// `Scoped` instances. Nothing in here ever fails: a missing entry, or an
/// entry of a different type than the one asked for, is simply `None`.
///
/// Most code goes through [`Container`]; the accessors are public so the
/// caches can be inspected or seeded directly.
///
/// # Examples
///
/// ```
/// use sovran_container::{Container, Registry};
///
/// let container = Container::new();
/// let registry: &Registry = container.registry();
///
/// registry.set_shared_instance(String::from("seeded"));
/// assert_eq!(registry.shared_instance::<String>(), Some("seeded".to_string()));
///
/// registry.set_scoped_instance(container.id(), 7u8);
/// assert_eq!(registry.scoped_instance::<u8>(container.id()), Some(7));
/// ```
pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    /// Creates a new, empty registry
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Stores the factory and lifetime for `T`, replacing any previous registration
    ///
    /// Cached instances of `T` are left alone.
    pub fn register_factory<T, Args>(&self, factory: Factory<T, Args>, lifetime: Lifetime)
    where
        T: 'static,
        Args: 'static,
    {
        let registration = Registration {
            lifetime,
            signature: std::any::type_name::<Args>(),
            factory: AnyValue::new(factory),
        };
        let previous = self
            .state
            .write()
            .registrations
            .insert(TypeId::of::<T>(), registration);
        drop(previous);
    }

    /// Returns the lifetime `T` was registered with
    pub fn lifetime<T: 'static>(&self) -> Option<Lifetime> {
        let state = self.state.read();
        state
            .registrations
            .get(&TypeId::of::<T>())
            .map(|registration| registration.lifetime)
    }

    /// Returns the factory for `T` if it was registered with exactly `Args`
    pub fn factory<T, Args>(&self) -> Option<Factory<T, Args>>
    where
        T: 'static,
        Args: 'static,
    {
        let state = self.state.read();
        state
            .registrations
            .get(&TypeId::of::<T>())
            .and_then(|registration| registration.factory.cloned::<Factory<T, Args>>())
    }

    /// Returns the argument tuple the factory for `T` was registered with, e.g. `"(u32,)"`
    pub fn factory_signature<T: 'static>(&self) -> Option<&'static str> {
        let state = self.state.read();
        state
            .registrations
            .get(&TypeId::of::<T>())
            .map(|registration| registration.signature)
    }

    /// Returns true if a factory is registered for `T`
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.state
            .read()
            .registrations
            .contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered types
    pub fn len(&self) -> usize {
        self.state.read().registrations.len()
    }

    /// Returns true if nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.state.read().registrations.is_empty()
    }

    /// Stores the store-wide instance of `T`, replacing any previous one
    pub fn set_shared_instance<T>(&self, value: T)
    where
        T: Send + Sync + 'static,
    {
        let previous = self
            .state
            .write()
            .shared
            .insert(TypeId::of::<T>(), AnyValue::new(value));
        drop(previous);
    }

    /// Returns a clone of the store-wide instance of `T`
    ///
    /// `T::clone` runs after the store is unlocked.
    pub fn shared_instance<T: Clone + 'static>(&self) -> Option<T> {
        let stored = self.state.read().shared.get(&TypeId::of::<T>()).cloned();
        stored.and_then(|stored| stored.cloned::<T>())
    }

    /// Stores `value` as the store-wide instance of `T` unless one is already there
    ///
    /// Returns the instance that ended up in the store: `value` if the slot
    /// was empty, otherwise the existing instance. The check and the insert
    /// happen under one lock, so racing callers all get the same instance.
    pub fn shared_instance_or_insert<T>(&self, value: T) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut state = self.state.write();
        let (stored, rejected) = keep_first(state.shared.entry(TypeId::of::<T>()), value);
        drop(state);
        drop(rejected);
        stored.cloned::<T>()
    }

    /// Stores the instance of `T` belonging to container `id`, replacing any previous one
    pub fn set_scoped_instance<T>(&self, id: ContainerId, value: T)
    where
        T: Send + Sync + 'static,
    {
        let previous = self
            .state
            .write()
            .scoped
            .entry(id)
            .or_default()
            .insert(TypeId::of::<T>(), AnyValue::new(value));
        drop(previous);
    }

    /// Returns a clone of the instance of `T` belonging to container `id`
    ///
    /// `T::clone` runs after the store is unlocked.
    pub fn scoped_instance<T: Clone + 'static>(&self, id: ContainerId) -> Option<T> {
        let stored = self
            .state
            .read()
            .scoped
            .get(&id)
            .and_then(|instances| instances.get(&TypeId::of::<T>()))
            .cloned();
        stored.and_then(|stored| stored.cloned::<T>())
    }

    /// Stores `value` as container `id`'s instance of `T` unless one is already there
    ///
    /// Returns the instance that ended up in the store, like
    /// [`shared_instance_or_insert`](Registry::shared_instance_or_insert).
    pub fn scoped_instance_or_insert<T>(&self, id: ContainerId, value: T) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut state = self.state.write();
        let instances = state.scoped.entry(id).or_default();
        let (stored, rejected) = keep_first(instances.entry(TypeId::of::<T>()), value);
        drop(state);
        drop(rejected);
        stored.cloned::<T>()
    }

    /// Drops every scoped instance held for container `id`
    ///
    /// Returns how many instances were released. Instances are dropped after
    /// the store is unlocked, so their destructors may use the registry.
    pub fn release_scope(&self, id: ContainerId) -> usize {
        let released = self.state.write().scoped.remove(&id);
        released.map_or(0, |instances| instances.len())
    }
}

// The losing value is handed back so the caller can drop it outside the lock.
fn keep_first<T>(entry: Entry<'_, TypeId, AnyValue>, value: T) -> (AnyValue, Option<T>)
where
    T: Send + Sync + 'static,
{
    match entry {
        Entry::Occupied(existing) => (existing.get().clone(), Some(value)),
        Entry::Vacant(slot) => (slot.insert(AnyValue::new(value)).clone(), None),
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Registry")
            .field("registrations", &state.registrations.len())
            .field("shared", &state.shared.len())
            .field("scopes", &state.scoped.len())
            .finish()
    }
}
