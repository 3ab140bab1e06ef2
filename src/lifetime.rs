use std::fmt;

/// Caching policy applied to the instances a factory produces
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
/// container.register(Lifetime::default(), |_| Arc::new(Clock));
///
/// assert_eq!(container.lifetime_of::<Arc<Clock>>(), Some(Lifetime::Shared));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// One instance per registry, seen by every container built on it
    #[default]
    Shared,
    /// One instance per container; subcontainers get their own
    Scoped,
    /// A new instance on every resolution, never cached
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Lifetime::Shared => write!(f, "shared"),
            Lifetime::Scoped => write!(f, "scoped"),
            Lifetime::Transient => write!(f, "transient"),
        }
    }
}
