use crate::error::ResolveError;
use crate::lifetime::Lifetime;
use crate::registry::{ContainerId, Factory, Registry};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

struct Node {
    id: ContainerId,
    registry: Arc<Registry>,
    parent: Weak<Node>,
}

impl Drop for Node {
    fn drop(&mut self) {
        let released = self.registry.release_scope(self.id);
        if released > 0 {
            trace!(container = %self.id, released, "released scoped instances");
        }
    }
}

/// A handle for registering factories and resolving instances by type
///
/// Every container has its own identity and a shared [`Registry`]. A root
/// container created with [`Container::new`] owns a fresh registry;
/// [`Container::spawn_subcontainer`] hands out a child that shares the
/// parent's registry but gets a new identity. Registrations are therefore
/// visible to the whole hierarchy, `Shared` instances are cached once for the
/// whole hierarchy, and `Scoped` instances are cached once per container.
///
/// Cloning a `Container` clones the handle, not the container: both clones
/// have the same [`id`](Container::id) and see the same scoped instances.
///
/// # Examples
///
/// ```
/// use sovran_container::{Container, Lifetime};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Session { db: Arc<Database> }
///
/// let root = Container::new();
/// root.register(Lifetime::Shared, |_| Arc::new(Database { url: "postgres://db".into() }));
/// root.register(Lifetime::Scoped, |c| Arc::new(Session {
///     db: c.resolve::<Arc<Database>>().expect("database registered"),
/// }));
///
/// let request = root.spawn_subcontainer();
/// let session = request.resolve::<Arc<Session>>().unwrap();
///
/// // Same database everywhere, but each container gets its own session
/// assert!(Arc::ptr_eq(&session.db, &root.resolve::<Arc<Database>>().unwrap()));
/// assert!(!Arc::ptr_eq(&session, &root.resolve::<Arc<Session>>().unwrap()));
/// assert!(Arc::ptr_eq(&session, &request.resolve::<Arc<Session>>().unwrap()));
/// ```
#[derive(Clone)]
pub struct Container {
    node: Arc<Node>,
}

impl Container {
    /// Creates a root container with its own, empty registry
    pub fn new() -> Self {
        Self {
            node: Arc::new(Node {
                id: ContainerId::next(),
                registry: Arc::new(Registry::new()),
                parent: Weak::new(),
            }),
        }
    }

    /// Creates a child that shares this container's registry under a new identity
    ///
    /// The child sees every registration made before or after it was spawned,
    /// and the same `Shared` instances. It keeps its own `Scoped` instances.
    /// Resolution never falls back to the parent.
    pub fn spawn_subcontainer(&self) -> Container {
        let child = Container {
            node: Arc::new(Node {
                id: ContainerId::next(),
                registry: Arc::clone(&self.node.registry),
                parent: Arc::downgrade(&self.node),
            }),
        };
        trace!(parent = %self.id(), child = %child.id(), "spawned subcontainer");
        child
    }

    /// This container's identity, the key for its scoped instances
    pub fn id(&self) -> ContainerId {
        self.node.id
    }

    /// The container this one was spawned from, if it is still alive
    pub fn parent(&self) -> Option<Container> {
        self.node.parent.upgrade().map(|node| Container { node })
    }

    /// The registry shared by this container's whole hierarchy
    pub fn registry(&self) -> &Registry {
        &self.node.registry
    }

    /// Returns true if a factory is registered for `T`
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.node.registry.is_registered::<T>()
    }

    /// Returns the lifetime `T` was registered with
    pub fn lifetime_of<T: 'static>(&self) -> Option<Lifetime> {
        self.node.registry.lifetime::<T>()
    }

    /// Registers a factory for `T` that takes only the resolving container
    ///
    /// Registering `T` again replaces both the factory and the lifetime.
    /// Instances already cached for `T` are kept.
    pub fn register<T, F>(&self, lifetime: Lifetime, factory: F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        let factory: Factory<T, ()> =
            Arc::new(move |container: &Container, ()| factory(container));
        self.store_factory(factory, lifetime);
    }

    /// Registers a `Shared` factory for `T`, the default lifetime
    ///
    /// Same as `register(Lifetime::default(), factory)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_container::{Container, Lifetime};
    /// use std::sync::Arc;
    ///
    /// struct Clock;
    ///
    /// let container = Container::new();
    /// container.register_shared(|_| Arc::new(Clock));
    ///
    /// assert_eq!(container.lifetime_of::<Arc<Clock>>(), Some(Lifetime::Shared));
    /// ```
    pub fn register_shared<T, F>(&self, factory: F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.register(Lifetime::default(), factory);
    }

    /// Registers a `Shared` factory for `T` that takes one argument
    pub fn register_shared_with_arg<T, A, F>(&self, factory: F)
    where
        T: Clone + Send + Sync + 'static,
        A: 'static,
        F: Fn(&Container, A) -> T + Send + Sync + 'static,
    {
        self.register_with_arg(Lifetime::default(), factory);
    }

    /// Registers a `Shared` factory for `T` that takes two arguments
    pub fn register_shared_with_args<T, A, B, F>(&self, factory: F)
    where
        T: Clone + Send + Sync + 'static,
        A: 'static,
        B: 'static,
        F: Fn(&Container, A, B) -> T + Send + Sync + 'static,
    {
        self.register_with_args(Lifetime::default(), factory);
    }

    /// Registers a factory for `T` that takes one argument at resolution time
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_container::{Container, Lifetime};
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct Greeting(String);
    ///
    /// let container = Container::new();
    /// container.register_with_arg(Lifetime::Transient, |_, name: &'static str| {
    ///     Greeting(format!("Hello, {}!", name))
    /// });
    ///
    /// assert_eq!(
    ///     container.resolve_with_arg::<Greeting, _>("World"),
    ///     Some(Greeting("Hello, World!".to_string()))
    /// );
    /// // Wrong argument list, nothing is built
    /// assert_eq!(container.resolve::<Greeting>(), None);
    /// ```
    pub fn register_with_arg<T, A, F>(&self, lifetime: Lifetime, factory: F)
    where
        T: Clone + Send + Sync + 'static,
        A: 'static,
        F: Fn(&Container, A) -> T + Send + Sync + 'static,
    {
        let factory: Factory<T, (A,)> =
            Arc::new(move |container: &Container, (a,): (A,)| factory(container, a));
        self.store_factory(factory, lifetime);
    }

    /// Registers a factory for `T` that takes two arguments at resolution time
    pub fn register_with_args<T, A, B, F>(&self, lifetime: Lifetime, factory: F)
    where
        T: Clone + Send + Sync + 'static,
        A: 'static,
        B: 'static,
        F: Fn(&Container, A, B) -> T + Send + Sync + 'static,
    {
        let factory: Factory<T, (A, B)> =
            Arc::new(move |container: &Container, (a, b): (A, B)| factory(container, a, b));
        self.store_factory(factory, lifetime);
    }

    /// Resolves `T` through a factory registered with [`register`](Container::register)
    ///
    /// Returns `None` if `T` isn't registered, or if nothing is cached and the
    /// factory was registered with a different argument list.
    pub fn resolve<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.try_resolve().ok()
    }

    /// Resolves `T` through a factory registered with [`register_with_arg`](Container::register_with_arg)
    pub fn resolve_with_arg<T, A>(&self, arg: A) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
        A: 'static,
    {
        self.try_resolve_with_arg(arg).ok()
    }

    /// Resolves `T` through a factory registered with [`register_with_args`](Container::register_with_args)
    pub fn resolve_with_args<T, A, B>(&self, arg1: A, arg2: B) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
        A: 'static,
        B: 'static,
    {
        self.try_resolve_with_args(arg1, arg2).ok()
    }

    /// Like [`resolve`](Container::resolve), but says why nothing was produced
    ///
    /// # Errors
    ///
    /// - Returns `ResolveError::NotRegistered` if no factory is registered for `T`
    /// - Returns `ResolveError::SignatureMismatch` if nothing is cached and the
    ///   factory takes arguments
    pub fn try_resolve<T>(&self) -> Result<T, ResolveError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.resolve_args::<T, ()>(())
    }

    /// Like [`resolve_with_arg`](Container::resolve_with_arg), but says why nothing was produced
    pub fn try_resolve_with_arg<T, A>(&self, arg: A) -> Result<T, ResolveError>
    where
        T: Clone + Send + Sync + 'static,
        A: 'static,
    {
        self.resolve_args::<T, (A,)>((arg,))
    }

    /// Like [`resolve_with_args`](Container::resolve_with_args), but says why nothing was produced
    pub fn try_resolve_with_args<T, A, B>(&self, arg1: A, arg2: B) -> Result<T, ResolveError>
    where
        T: Clone + Send + Sync + 'static,
        A: 'static,
        B: 'static,
    {
        self.resolve_args::<T, (A, B)>((arg1, arg2))
    }

    fn store_factory<T, Args>(&self, factory: Factory<T, Args>, lifetime: Lifetime)
    where
        T: 'static,
        Args: 'static,
    {
        debug!(
            type_name = std::any::type_name::<T>(),
            args = std::any::type_name::<Args>(),
            %lifetime,
            "registered factory"
        );
        self.node.registry.register_factory(factory, lifetime);
    }

    // The registry lock is released between steps; the factory runs unlocked
    // so it can resolve its own dependencies through `self`.
    fn resolve_args<T, Args>(&self, args: Args) -> Result<T, ResolveError>
    where
        T: Clone + Send + Sync + 'static,
        Args: 'static,
    {
        let type_name = std::any::type_name::<T>();
        let registry = &self.node.registry;

        let lifetime = registry
            .lifetime::<T>()
            .ok_or(ResolveError::NotRegistered { type_name })?;

        if let Some(value) = self.cached::<T>(lifetime) {
            trace!(container = %self.id(), type_name, %lifetime, "cache hit");
            return Ok(value);
        }

        let factory = match registry.factory::<T, Args>() {
            Some(factory) => factory,
            None => {
                let requested = std::any::type_name::<Args>();
                let registered = registry.factory_signature::<T>();
                debug!(type_name, requested, ?registered, "factory signature mismatch");
                return Err(ResolveError::SignatureMismatch {
                    type_name,
                    requested,
                    registered,
                });
            }
        };

        trace!(container = %self.id(), type_name, %lifetime, "invoking factory");
        let value = factory(self, args);
        Ok(self.cache(lifetime, value))
    }

    fn cached<T>(&self, lifetime: Lifetime) -> Option<T>
    where
        T: Clone + 'static,
    {
        match lifetime {
            Lifetime::Shared => self.node.registry.shared_instance::<T>(),
            Lifetime::Scoped => self.node.registry.scoped_instance::<T>(self.id()),
            Lifetime::Transient => None,
        }
    }

    // Returns the cached instance, which is another caller's if it got there first.
    fn cache<T>(&self, lifetime: Lifetime, value: T) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        let registry = &self.node.registry;
        match lifetime {
            Lifetime::Shared => registry
                .shared_instance_or_insert(value.clone())
                .unwrap_or(value),
            Lifetime::Scoped => registry
                .scoped_instance_or_insert(self.id(), value.clone())
                .unwrap_or(value),
            Lifetime::Transient => value,
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.node.id)
            .field("parent", &self.parent().map(|parent| parent.id()))
            .field("registry", &self.node.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Logger;

    #[derive(Debug)]
    struct RequestContext;

    #[derive(Debug)]
    struct IdGenerator;

    #[test]
    fn test_subcontainer_identity() {
        let root = Container::new();
        let child = root.spawn_subcontainer();
        let grandchild = child.spawn_subcontainer();

        assert_ne!(root.id(), child.id());
        assert_ne!(child.id(), grandchild.id());
        assert_eq!(root.clone().id(), root.id());

        assert!(root.parent().is_none());
        assert_eq!(child.parent().map(|p| p.id()), Some(root.id()));
        assert_eq!(grandchild.parent().map(|p| p.id()), Some(child.id()));
    }

    #[test]
    fn test_parent_link_is_weak() {
        let root = Container::new();
        root.register(Lifetime::Scoped, |_| Arc::new(RequestContext));

        let child = root.spawn_subcontainer();
        drop(root);

        assert!(child.parent().is_none());
        // Registry is still alive through the child
        assert!(child.resolve::<Arc<RequestContext>>().is_some());
    }

    #[test]
    fn test_shared_resolves_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let root = Container::new();
        let counter = Arc::clone(&calls);
        root.register(Lifetime::Shared, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(Logger)
        });

        let child = root.spawn_subcontainer();
        let a = root.resolve::<Arc<Logger>>().unwrap();
        let b = child.resolve::<Arc<Logger>>().unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scoped_per_container() {
        let root = Container::new();
        root.register(Lifetime::Scoped, |_| Arc::new(RequestContext));
        let child = root.spawn_subcontainer();

        let from_root = root.resolve::<Arc<RequestContext>>().unwrap();
        let from_child = child.resolve::<Arc<RequestContext>>().unwrap();

        assert!(!Arc::ptr_eq(&from_root, &from_child));
        assert!(Arc::ptr_eq(&from_root, &root.resolve::<Arc<RequestContext>>().unwrap()));
        assert_eq!(
            root.registry().shared_instance::<Arc<RequestContext>>().map(|_| ()),
            None
        );
    }

    #[test]
    fn test_transient_never_cached() {
        let container = Container::new();
        container.register(Lifetime::Transient, |_| Arc::new(IdGenerator));

        let a = container.resolve::<Arc<IdGenerator>>().unwrap();
        let b = container.resolve::<Arc<IdGenerator>>().unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(container.registry().shared_instance::<Arc<IdGenerator>>().is_none());
        assert!(container
            .registry()
            .scoped_instance::<Arc<IdGenerator>>(container.id())
            .is_none());
    }

    #[test]
    fn test_drop_releases_scope() {
        let root = Container::new();
        root.register(Lifetime::Scoped, |_| Arc::new(RequestContext));

        let child = root.spawn_subcontainer();
        let child_id = child.id();
        let held = child.resolve::<Arc<RequestContext>>().unwrap();
        root.resolve::<Arc<RequestContext>>().unwrap();

        // A clone of the handle keeps the container alive
        let handle = child.clone();
        drop(child);
        assert!(root
            .registry()
            .scoped_instance::<Arc<RequestContext>>(child_id)
            .is_some());

        drop(handle);
        assert!(root
            .registry()
            .scoped_instance::<Arc<RequestContext>>(child_id)
            .is_none());
        assert!(root
            .registry()
            .scoped_instance::<Arc<RequestContext>>(root.id())
            .is_some());
        assert_eq!(Arc::strong_count(&held), 1);
    }

    #[test]
    fn test_debug_output() {
        let root = Container::new();
        let child = root.spawn_subcontainer();
        let rendered = format!("{:?}", child);
        assert!(rendered.contains("Container"));
        assert!(rendered.contains("Registry"));
    }
}
