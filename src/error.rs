use std::fmt;

/// Why a resolution produced no value
///
/// The plain `resolve` methods collapse every failure to `None`. The
/// `try_resolve` family returns this instead so callers can tell a missing
/// registration apart from a factory that was registered with a different
/// argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Nothing is registered for the requested type
    NotRegistered {
        /// Name of the requested type
        type_name: &'static str,
    },
    /// A factory is registered, but not with the requested arguments
    SignatureMismatch {
        /// Name of the requested type
        type_name: &'static str,
        /// Argument list the caller resolved with
        requested: &'static str,
        /// Argument list the factory was registered with, if any
        registered: Option<&'static str>,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResolveError::NotRegistered { type_name } => {
                write!(f, "No factory registered for {}", type_name)
            }
            ResolveError::SignatureMismatch {
                type_name,
                requested,
                registered: Some(registered),
            } => write!(
                f,
                "Factory for {} takes {}, but was resolved with {}",
                type_name, registered, requested
            ),
            ResolveError::SignatureMismatch {
                type_name,
                requested,
                registered: None,
            } => write!(
                f,
                "Factory for {} is missing, resolved with {}",
                type_name, requested
            ),
        }
    }
}

impl std::error::Error for ResolveError {}
