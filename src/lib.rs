//! # sovran-container
//!
//! A type-keyed dependency container with shared, scoped and transient lifetimes.
//!
//! `sovran-container` lets you register a factory for a type once, then ask any
//! container in a hierarchy for an instance of that type. The container decides
//! whether to hand back a cached instance or run the factory, based on the
//! [`Lifetime`] the type was registered with.
//!
//! ## Key Features
//!
//! - **Type is the key**: Registrations are keyed by `TypeId`, never by name strings
//! - **Three lifetimes**: `Shared` (one per hierarchy), `Scoped` (one per container)
//!   and `Transient` (new every time)
//! - **Subcontainers**: Children share their parent's registrations and shared
//!   instances but keep their own scoped instances
//! - **Factory arguments**: Factories can take zero, one or two extra arguments
//!   supplied at resolution time
//! - **No panics**: Every failure to resolve is `None`, with `try_resolve` to find out why
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_container::{Container, Lifetime};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str) -> String;
//! }
//!
//! struct PrefixLogger {
//!     prefix: String,
//! }
//!
//! impl Logger for PrefixLogger {
//!     fn log(&self, message: &str) -> String {
//!         format!("[{}] {}", self.prefix, message)
//!     }
//! }
//!
//! let container = Container::new();
//!
//! // Register against the abstract type
//! container.register::<Arc<dyn Logger>, _>(Lifetime::Shared, |_| {
//!     let logger: Arc<dyn Logger> = Arc::new(PrefixLogger { prefix: "app".to_string() });
//!     logger
//! });
//!
//! let logger = container.resolve::<Arc<dyn Logger>>().unwrap();
//! assert_eq!(logger.log("started"), "[app] started");
//!
//! // Shared: the same instance every time
//! let again = container.resolve::<Arc<dyn Logger>>().unwrap();
//! assert!(Arc::ptr_eq(&logger, &again));
//! ```
//!
//! ### Per-Request Scopes
//!
//! ```rust
//! use sovran_container::{Container, Lifetime};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! struct RequestContext {
//!     request_id: u64,
//! }
//!
//! let root = Container::new();
//! let next_id = Arc::new(AtomicU64::new(1));
//! root.register(Lifetime::Scoped, move |_| {
//!     Arc::new(RequestContext {
//!         request_id: next_id.fetch_add(1, Ordering::SeqCst),
//!     })
//! });
//!
//! let first = root.spawn_subcontainer();
//! let second = root.spawn_subcontainer();
//!
//! let a = first.resolve::<Arc<RequestContext>>().unwrap();
//! let b = second.resolve::<Arc<RequestContext>>().unwrap();
//! assert_ne!(a.request_id, b.request_id);
//!
//! // Within one container, the scoped instance is reused
//! assert!(Arc::ptr_eq(&a, &first.resolve::<Arc<RequestContext>>().unwrap()));
//! ```
//!
//! ### Factory Arguments and Nested Dependencies
//!
//! ```rust
//! use sovran_container::{Container, Lifetime};
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Config {
//!     base_url: String,
//! }
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Endpoint {
//!     url: String,
//! }
//!
//! let container = Container::new();
//! container.register(Lifetime::Shared, |_| Config {
//!     base_url: "https://api.example.com".to_string(),
//! });
//!
//! // Factories receive the resolving container and can pull their own dependencies
//! container.register_with_args(Lifetime::Transient, |c, path: String, version: u32| {
//!     let config = c.resolve::<Config>().unwrap_or(Config { base_url: String::new() });
//!     Endpoint { url: format!("{}/v{}/{}", config.base_url, version, path) }
//! });
//!
//! let endpoint = container
//!     .resolve_with_args::<Endpoint, _, _>("users".to_string(), 2u32)
//!     .unwrap();
//! assert_eq!(endpoint.url, "https://api.example.com/v2/users");
//! ```
//!
//! ### Error Handling
//!
//! ```rust
//! use sovran_container::{Container, Lifetime, ResolveError};
//!
//! #[derive(Clone)]
//! struct Port(u16);
//!
//! let container = Container::new();
//! container.register_with_arg(Lifetime::Transient, |_, port: u16| Port(port));
//!
//! match container.try_resolve::<Port>() {
//!     Ok(port) => println!("Port: {}", port.0),
//!     Err(ResolveError::NotRegistered { type_name }) => println!("{} not registered", type_name),
//!     Err(e @ ResolveError::SignatureMismatch { .. }) => println!("{}", e),
//! }
//!
//! // The plain API just says "not found"
//! assert!(container.resolve::<Port>().is_none());
//! assert_eq!(container.resolve_with_arg::<Port, _>(8080u16).map(|p| p.0), Some(8080));
//! ```

mod any_value;
mod container;
mod error;
mod lifetime;
mod registry;

pub use container::Container;
pub use error::ResolveError;
pub use lifetime::Lifetime;
pub use registry::{ContainerId, Factory, Registry};
