//! Service registration
//!
//! Descriptors are appended in call order and never validated here; a type
//! without usable data or a missing resource only shows up once the
//! container initializes or resolves it.

use std::any::{type_name, TypeId};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::provider::ServiceProvider;
use super::strategy::{Constructor, ResourceConstructor, Strategy};
use super::{wrap_instance, ServiceLifetime};
use crate::infrastructure::injection::Dependent;

/// Types the container can build itself: default-constructed, then injected.
pub trait Injectable: Default + Dependent + 'static {}

impl<T: Default + Dependent + 'static> Injectable for T {}

/// Types that can be loaded from an external resource, then injected.
pub trait Resource: DeserializeOwned + Dependent + 'static {}

impl<T: DeserializeOwned + Dependent + 'static> Resource for T {}

/// One registration: the requested type and how to provide it.
#[derive(Debug)]
pub struct ServiceDescriptor {
    pub requested: TypeId,
    pub requested_name: &'static str,
    pub strategy: Strategy,
}

impl ServiceDescriptor {
    pub fn lifetime(&self) -> ServiceLifetime {
        self.strategy.lifetime()
    }
}

#[derive(Debug, Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registrations in the order they were added, duplicates included.
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    pub fn into_descriptors(self) -> Vec<ServiceDescriptor> {
        self.descriptors
    }

    /// Appends a prepared descriptor.
    pub fn add<R: ?Sized + 'static>(&mut self, strategy: Strategy) -> &mut Self {
        debug!(
            requested = type_name::<R>(),
            implementation = strategy.implementation(),
            lifetime = ?strategy.lifetime(),
            "Service registered"
        );
        self.descriptors.push(ServiceDescriptor {
            requested: TypeId::of::<R>(),
            requested_name: type_name::<R>(),
            strategy,
        });
        self
    }

    pub fn add_singleton<T: Injectable>(&mut self) -> &mut Self {
        self.add_singleton_as::<T, T, _>(|service| service)
    }

    /// Registers `I` under the requested type `R`; `cast` converts the built
    /// implementation, e.g. `|s| s as Rc<dyn Trait>`.
    pub fn add_singleton_as<R, I, C>(&mut self, cast: C) -> &mut Self
    where
        R: ?Sized + 'static,
        I: Injectable,
        C: Fn(Rc<I>) -> Rc<R> + 'static,
    {
        let strategy = Strategy::singleton(constructor::<R, I, C>(cast), type_name::<I>());
        self.add::<R>(strategy)
    }

    pub fn add_singleton_resource<T: Resource>(&mut self, path: impl Into<String>) -> &mut Self {
        self.add_singleton_resource_as::<T, T, _>(path, |resource| resource)
    }

    pub fn add_singleton_resource_as<R, I, C>(&mut self, path: impl Into<String>, cast: C) -> &mut Self
    where
        R: ?Sized + 'static,
        I: Resource,
        C: Fn(Rc<I>) -> Rc<R> + 'static,
    {
        let strategy = Strategy::singleton_resource(path, loader::<R, I, C>(cast), type_name::<I>());
        self.add::<R>(strategy)
    }

    pub fn add_transient<T: Injectable>(&mut self) -> &mut Self {
        self.add_transient_as::<T, T, _>(|service| service)
    }

    pub fn add_transient_as<R, I, C>(&mut self, cast: C) -> &mut Self
    where
        R: ?Sized + 'static,
        I: Injectable,
        C: Fn(Rc<I>) -> Rc<R> + 'static,
    {
        let strategy = Strategy::transient(constructor::<R, I, C>(cast), type_name::<I>());
        self.add::<R>(strategy)
    }

    pub fn add_transient_resource<T: Resource>(&mut self, path: impl Into<String>) -> &mut Self {
        self.add_transient_resource_as::<T, T, _>(path, |resource| resource)
    }

    pub fn add_transient_resource_as<R, I, C>(&mut self, path: impl Into<String>, cast: C) -> &mut Self
    where
        R: ?Sized + 'static,
        I: Resource,
        C: Fn(Rc<I>) -> Rc<R> + 'static,
    {
        let strategy = Strategy::transient_resource(path, loader::<R, I, C>(cast), type_name::<I>());
        self.add::<R>(strategy)
    }

    pub fn add_instance<T: 'static>(&mut self, instance: T) -> &mut Self {
        self.add_shared_instance::<T>(Rc::new(instance))
    }

    /// Registers an already shared value, e.g. an `Rc<dyn Trait>`.
    pub fn add_shared_instance<R: ?Sized + 'static>(&mut self, instance: Rc<R>) -> &mut Self {
        let strategy = Strategy::instance(wrap_instance(instance), type_name::<R>());
        self.add::<R>(strategy)
    }
}

fn constructor<R, I, C>(cast: C) -> Constructor
where
    R: ?Sized + 'static,
    I: Injectable,
    C: Fn(Rc<I>) -> Rc<R> + 'static,
{
    Rc::new(move |provider: &ServiceProvider| {
        let mut service = I::default();
        provider.inject_dependencies(&mut service)?;
        Ok(wrap_instance(cast(Rc::new(service))))
    })
}

fn loader<R, I, C>(cast: C) -> ResourceConstructor
where
    R: ?Sized + 'static,
    I: Resource,
    C: Fn(Rc<I>) -> Rc<R> + 'static,
{
    Rc::new(move |provider: &ServiceProvider, path: &str| {
        let Some(value) = provider.resources().load(path, type_name::<I>()) else {
            warn!(path, resource = type_name::<I>(), "Resource not found");
            return Ok(None);
        };
        let mut resource: I = match serde_json::from_value(value) {
            Ok(resource) => resource,
            Err(err) => {
                warn!(path, resource = type_name::<I>(), error = %err, "Resource is not usable");
                return Ok(None);
            }
        };
        provider.inject_dependencies(&mut resource)?;
        Ok(Some(wrap_instance(cast(Rc::new(resource)))))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Clock;

    impl Dependent for Clock {}

    #[derive(serde::Deserialize)]
    struct Names {
        #[allow(dead_code)]
        names: Vec<String>,
    }

    impl Dependent for Names {}

    #[test]
    fn test_descriptors_keep_order_and_duplicates() {
        let mut services = ServiceCollection::new();
        services
            .add_instance(1u32)
            .add_singleton::<Clock>()
            .add_transient::<Clock>()
            .add_instance(2u32);

        let lifetimes: Vec<_> = services.descriptors().iter().map(|d| d.lifetime()).collect();
        assert_eq!(
            lifetimes,
            vec![
                ServiceLifetime::Instance,
                ServiceLifetime::Singleton,
                ServiceLifetime::Transient,
                ServiceLifetime::Instance,
            ]
        );
        assert_eq!(services.descriptors()[0].requested, TypeId::of::<u32>());
        assert_eq!(services.descriptors()[3].requested, TypeId::of::<u32>());
    }

    #[test]
    fn test_resource_registration_records_path() {
        let mut services = ServiceCollection::new();
        services.add_singleton_resource::<Names>("Databases/Names");

        let descriptor = &services.descriptors()[0];
        assert_eq!(descriptor.strategy.resource_path(), Some("Databases/Names"));
        assert!(!descriptor.strategy.is_initialized());
    }
}
