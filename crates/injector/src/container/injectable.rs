use std::sync::Arc;

use crate::container::injector::Injector;
use crate::container::value::Arguments;
use crate::errors::InjectorError;
use crate::reflection::{ClassDescriptor, Constructor, Parameter};

/// Trait for Rust types that describe their own constructor to the injector
///
/// Implementors declare a class name, constructor parameters and the
/// interfaces they satisfy. [`Injectable::descriptor`] turns that into a
/// [`ClassDescriptor`] ready for a [`crate::reflection::TypeRegistry`].
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Fully qualified class name, e.g. `"app::Mailer"`
    fn class_name() -> &'static str;

    /// Constructor parameters in declaration order
    fn parameters() -> Vec<Parameter> {
        Vec::new()
    }

    /// Interfaces this type implements
    fn interfaces() -> Vec<&'static str> {
        Vec::new()
    }

    /// Build an instance from resolved constructor arguments
    fn construct(args: &Arguments) -> Result<Self, InjectorError>;

    /// Describe this type with a public constructor
    fn descriptor() -> ClassDescriptor {
        Self::interfaces().into_iter().fold(
            ClassDescriptor::class(Self::class_name())
                .constructor(Constructor::public(Self::parameters(), Self::construct)),
            |descriptor, interface| descriptor.implements(interface),
        )
    }
}

impl Injector {
    /// Make `T` by its class name and downcast the result
    pub fn resolve<T: Injectable>(&self) -> Result<Arc<T>, InjectorError> {
        self.make(T::class_name())?.expect_type::<T>()
    }

    /// Like [`Injector::resolve`], returning `None` on any failure
    pub fn try_resolve<T: Injectable>(&self) -> Option<Arc<T>> {
        self.resolve::<T>().ok()
    }
}
