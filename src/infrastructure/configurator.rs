//! Startup contributors

use super::container::{ServiceCollection, ServiceProvider};
use super::injection::Dependent;

/// Contributes registrations while a container starts up.
pub trait Configurator {
    /// Called once with the container's fresh collection.
    fn configure_services(&mut self, services: &mut ServiceCollection);

    /// Called once, after every service is built and every live dependent
    /// object has been injected.
    fn on_services_initialized(&mut self, _services: &ServiceProvider) {}

    /// Configurators that carry injection points are injected together with
    /// the other live dependents.
    fn as_dependent_mut(&mut self) -> Option<&mut dyn Dependent> {
        None
    }
}

/// Plain registration closures act as configurators without a completion hook.
impl<F> Configurator for F
where
    F: FnMut(&mut ServiceCollection),
{
    fn configure_services(&mut self, services: &mut ServiceCollection) {
        self(services)
    }
}
