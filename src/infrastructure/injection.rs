//! 依赖注入点
//!
//! Objects the container does not construct receive their services through
//! [`Dependent::inject`]. Each type fills only the injection points it
//! declares itself; types composed on top of another dependent type expose
//! that inner level through [`Dependent::base_mut`] so every level runs,
//! outermost first.

use std::any::TypeId;
use std::rc::Rc;

use tracing::trace;

use super::container::{downcast_instance, ServiceInstance};
use crate::errors::{missing_dependency, ContainerError};

/// Anything that can answer service lookups by type.
pub trait Resolver {
    /// Looks up `service`; `Ok(None)` means nothing is registered for it.
    fn resolve_erased(&self, service: TypeId) -> Result<Option<ServiceInstance>, ContainerError>;
}

/// An object carrying injection points.
pub trait Dependent {
    /// Fills the injection points declared directly on this type.
    ///
    /// Every parameter is pulled from `injector` before it is used, in
    /// declaration order; a required parameter that cannot be resolved
    /// returns early, leaving points that already ran untouched.
    fn inject(&mut self, _injector: &mut Injector<'_>) -> Result<(), ContainerError> {
        Ok(())
    }

    /// The next enclosed level that also carries injection points.
    fn base_mut(&mut self) -> Option<&mut dyn Dependent> {
        None
    }

    fn dependent_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Parameter source handed to one level of a dependent object.
pub struct Injector<'a> {
    resolver: &'a dyn Resolver,
    dependent: &'static str,
    resolved: usize,
}

impl<'a> Injector<'a> {
    pub fn new(resolver: &'a dyn Resolver, dependent: &'static str) -> Self {
        Self {
            resolver,
            dependent,
            resolved: 0,
        }
    }

    /// Resolves a parameter that must be present.
    pub fn required<T: ?Sized + 'static>(&mut self) -> Result<Rc<T>, ContainerError> {
        self.optional::<T>()?
            .ok_or_else(|| missing_dependency::<T>(self.dependent))
    }

    /// Resolves a parameter that may be absent.
    pub fn optional<T: ?Sized + 'static>(&mut self) -> Result<Option<Rc<T>>, ContainerError> {
        let Some(instance) = self.resolver.resolve_erased(TypeId::of::<T>())? else {
            trace!(dependent = self.dependent, parameter = std::any::type_name::<T>(), "Parameter unresolved");
            return Ok(None);
        };
        let service = downcast_instance::<T>(&instance).ok_or_else(|| ContainerError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            context: format!("injection into {}", self.dependent),
        })?;
        self.resolved += 1;
        Ok(Some(service))
    }

    pub fn dependent(&self) -> &'static str {
        self.dependent
    }

    pub fn resolved(&self) -> usize {
        self.resolved
    }
}

/// Runs every injection level of `target`, most-derived first.
/// Returns the number of levels visited.
pub fn inject_levels(resolver: &dyn Resolver, target: &mut dyn Dependent) -> Result<usize, ContainerError> {
    let mut levels = 0;
    let mut level = Some(target);
    while let Some(current) = level {
        let mut injector = Injector::new(resolver, current.dependent_name());
        current.inject(&mut injector)?;
        trace!(
            dependent = injector.dependent(),
            resolved = injector.resolved(),
            "Injected level"
        );
        levels += 1;
        level = current.base_mut();
    }
    Ok(levels)
}
