//! Container module

pub mod collection;
pub mod context;
pub mod provider;
pub mod strategy;

use std::any::Any;
use std::rc::Rc;

pub use collection::{Injectable, Resource, ServiceCollection, ServiceDescriptor};
pub use context::AppContext;
pub use provider::{ContainerKind, ContainerStats, ServiceProvider, ServiceProviderBuilder};
pub use strategy::Strategy;

/// Lifecycle of a registered service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLifetime {
    /// Pre-built value handed over at registration
    Instance,
    /// Built once during startup, shared by every resolution
    Singleton,
    /// Built fresh on every resolution
    Transient,
}

/// Type-erased service handle.
///
/// Always wraps an `Rc<T>` for the requested `T`, which may be unsized
/// (`dyn Trait`), so every resolution of a shared service hands out the same
/// allocation.
pub type ServiceInstance = Rc<dyn Any>;

pub fn wrap_instance<T: ?Sized + 'static>(service: Rc<T>) -> ServiceInstance {
    Rc::new(service)
}

pub fn downcast_instance<T: ?Sized + 'static>(instance: &ServiceInstance) -> Option<Rc<T>> {
    instance.downcast_ref::<Rc<T>>().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_unsized_round_trip_keeps_identity() {
        let greeter: Rc<dyn Greeter> = Rc::new(English);
        let instance = wrap_instance(greeter.clone());

        let first = downcast_instance::<dyn Greeter>(&instance).unwrap();
        let second = downcast_instance::<dyn Greeter>(&instance).unwrap();

        assert_eq!(first.greet(), "hello");
        assert!(Rc::ptr_eq(&first, &second));
        assert!(Rc::ptr_eq(&first, &greeter));
    }

    #[test]
    fn test_downcast_to_wrong_type_fails() {
        let instance = wrap_instance(Rc::new(42u32));
        assert!(downcast_instance::<String>(&instance).is_none());
    }
}
