//! Reflective dependency injector
//!
//! Types are described to the injector through a [`Reflector`] (usually a
//! [`TypeRegistry`] of [`ClassDescriptor`]s). The injector then builds object
//! graphs recursively: it follows aliases, reuses shared instances, applies
//! per-type definitions, runs delegates and preparations, and detects cycles.
//!
//! ```
//! use elif_injector::{Arguments, ClassDescriptor, Constructor, Injector, Parameter, TypeRegistry};
//!
//! struct Tcp;
//! struct Mailer {
//!     transport: std::sync::Arc<Tcp>,
//! }
//!
//! let registry = TypeRegistry::new()
//!     .with_class(ClassDescriptor::interface("app::Transport"))
//!     .with_class(
//!         ClassDescriptor::class("app::Tcp")
//!             .implements("app::Transport")
//!             .without_constructor(|| Tcp),
//!     )
//!     .with_class(ClassDescriptor::class("app::Mailer").constructor(Constructor::public(
//!         vec![Parameter::typed("transport", "app::Transport")],
//!         |args: &Arguments| Ok(Mailer { transport: args.object::<Tcp>(0)? }),
//!     )));
//!
//! let mut injector = Injector::with_registry(registry);
//! injector.alias("app::Transport", "app::Tcp").unwrap();
//!
//! let mailer = injector.make("app::Mailer").unwrap();
//! assert!(mailer.downcast_ref::<Mailer>().is_some());
//! ```

pub mod config;
pub mod container;
pub mod errors;
pub mod reflection;

pub use config::InjectorConfig;
pub use container::{
    Argument, Arguments, BindingSummary, Call, Closure, Definition, Executable, Injectable,
    Injector, Invokable, Literal, Object, Receiver, TypeKey, Value,
};
pub use errors::{ErrorKind, InjectorError};
pub use reflection::{
    CachingReflector, ClassDescriptor, ClassKind, Constructor, FunctionDescriptor, Method,
    Parameter, Reflector, Signature, TypeRegistry, Visibility,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
