//! 依赖注入容器实现
//!
//! A container owns an arena of strategies and a `TypeId -> index` map. Both
//! are only written while the container starts up:
//!
//! 1. every configurator contributes to one fresh [`ServiceCollection`];
//! 2. each descriptor, in registration order, is stored (the last one per
//!    type answers lookups) and initialized, so a singleton registered later
//!    is still absent while an earlier one is being built;
//! 3. every live dependent object is injected;
//! 4. every configurator's completion hook runs.

use std::any::{type_name, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error, info};

use super::collection::ServiceCollection;
use super::strategy::Strategy;
use super::{downcast_instance, ServiceInstance, ServiceLifetime};
use crate::errors::ContainerError;
use crate::infrastructure::configurator::Configurator;
use crate::infrastructure::injection::{inject_levels, Dependent, Resolver};
use crate::infrastructure::instantiator::Instantiator;
use crate::infrastructure::resources::{MemoryResourceLoader, ResourceLoader};
use crate::scene::Scene;

/// Where a container sits in the resolution hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Application-lifetime root; at most one per [`AppContext`](super::AppContext).
    Project,
    /// Lives as long as its scene and falls back to the project container.
    Scene,
    /// Not attached to any context.
    Standalone,
}

/// 容器统计信息
#[derive(Debug, Clone, Default)]
pub struct ContainerStats {
    /// 服务注册数量
    pub registered_services: usize,
    /// 总解析次数
    pub total_resolutions: u64,
    /// 回退到父容器的次数
    pub parent_fallbacks: u64,
    /// 瞬态服务创建次数
    pub transient_creations: u64,
    /// 已注入的依赖对象数量
    pub injected_objects: u64,
}

impl ContainerStats {
    /// Share of resolutions answered by the parent container.
    pub fn fallback_rate(&self) -> f64 {
        if self.total_resolutions == 0 {
            0.0
        } else {
            self.parent_fallbacks as f64 / self.total_resolutions as f64
        }
    }

    pub fn performance_summary(&self) -> String {
        format!(
            "Container Performance: {} registered services, {} total resolutions, {:.1}% parent fallbacks, {} transient creations, {} injected objects",
            self.registered_services,
            self.total_resolutions,
            self.fallback_rate() * 100.0,
            self.transient_creations,
            self.injected_objects
        )
    }
}

#[derive(Default)]
struct InnerStats {
    total_resolutions: Cell<u64>,
    parent_fallbacks: Cell<u64>,
    transient_creations: Cell<u64>,
    injected_objects: Cell<u64>,
}

fn bump(counter: &Cell<u64>) {
    counter.set(counter.get() + 1);
}

pub struct ServiceProvider {
    id: uuid::Uuid,
    name: String,
    kind: ContainerKind,
    /// 策略存储（按注册顺序）
    strategies: RefCell<Vec<Strategy>>,
    /// 类型 -> 策略索引，后注册者覆盖
    index: RefCell<HashMap<TypeId, usize>>,
    parent: Option<Weak<ServiceProvider>>,
    resources: Rc<dyn ResourceLoader>,
    configurators: RefCell<Vec<Box<dyn Configurator>>>,
    stats: InnerStats,
}

impl ServiceProvider {
    pub fn builder(name: impl Into<String>) -> ServiceProviderBuilder {
        ServiceProviderBuilder::new(name)
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// The parent container, if one was attached and is still alive.
    pub fn parent(&self) -> Option<Rc<ServiceProvider>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn resources(&self) -> &dyn ResourceLoader {
        self.resources.as_ref()
    }

    /// Resolves `T`, falling back to the parent container when this one has
    /// nothing for it. `Ok(None)` means no container in the chain provides it.
    pub fn resolve<T: ?Sized + 'static>(&self) -> Result<Option<Rc<T>>, ContainerError> {
        let Some(instance) = self.resolve_erased(TypeId::of::<T>())? else {
            return Ok(None);
        };
        downcast_instance::<T>(&instance)
            .map(Some)
            .ok_or_else(|| ContainerError::TypeMismatch {
                expected: type_name::<T>(),
                context: format!("resolution from '{}'", self.name),
            })
    }

    /// Like [`ServiceProvider::resolve`], collapsing failures to `None`.
    pub fn get_service<T: ?Sized + 'static>(&self) -> Option<Rc<T>> {
        match self.resolve::<T>() {
            Ok(service) => service,
            Err(err) => {
                error!(container = %self.name, service = type_name::<T>(), error = %err, "Service resolution failed");
                None
            }
        }
    }

    /// Whether this container or one of its ancestors has a registration for `T`.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.index.borrow().contains_key(&TypeId::of::<T>())
            || self.parent().is_some_and(|parent| parent.contains::<T>())
    }

    /// Runs every injection level of `target`, most-derived first.
    pub fn inject_dependencies(&self, target: &mut dyn Dependent) -> Result<(), ContainerError> {
        let levels = inject_levels(self, target)?;
        bump(&self.stats.injected_objects);
        debug!(container = %self.name, dependent = target.dependent_name(), levels, "Dependencies injected");
        Ok(())
    }

    /// Implementations and lifetimes in registration order, overridden entries included.
    pub fn registered_services(&self) -> Vec<(&'static str, ServiceLifetime)> {
        self.strategies
            .borrow()
            .iter()
            .map(|strategy| (strategy.implementation(), strategy.lifetime()))
            .collect()
    }

    pub fn instantiator(self: &Rc<Self>) -> Instantiator {
        Instantiator::new(Rc::downgrade(self))
    }

    pub fn configurator_count(&self) -> usize {
        self.configurators.borrow().len()
    }

    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            registered_services: self.index.borrow().len(),
            total_resolutions: self.stats.total_resolutions.get(),
            parent_fallbacks: self.stats.parent_fallbacks.get(),
            transient_creations: self.stats.transient_creations.get(),
            injected_objects: self.stats.injected_objects.get(),
        }
    }

    fn resolve_local(&self, service: TypeId) -> Result<Option<ServiceInstance>, ContainerError> {
        let Some(index) = self.index.borrow().get(&service).copied() else {
            return Ok(None);
        };
        let strategies = self.strategies.borrow();
        let strategy = &strategies[index];
        if strategy.lifetime() == ServiceLifetime::Transient {
            bump(&self.stats.transient_creations);
        }
        strategy.get_instance(self)
    }

    fn initialize_services(&self, collection: ServiceCollection) -> Result<(), ContainerError> {
        for descriptor in collection.into_descriptors() {
            let position = {
                let mut strategies = self.strategies.borrow_mut();
                strategies.push(descriptor.strategy);
                strategies.len() - 1
            };
            if let Some(previous) = self.index.borrow_mut().insert(descriptor.requested, position) {
                debug!(container = %self.name, service = descriptor.requested_name, previous, "Registration overridden");
            }
            // 按注册顺序初始化
            let strategies = self.strategies.borrow();
            strategies[position].initialize(self)?;
            debug!(
                container = %self.name,
                service = descriptor.requested_name,
                implementation = strategies[position].implementation(),
                "Service initialized"
            );
        }
        Ok(())
    }

    fn inject_live_objects(
        &self,
        scene: Option<&mut Scene>,
        configurators: &mut [Box<dyn Configurator>],
    ) -> Result<usize, ContainerError> {
        let mut injected = 0;
        if let Some(scene) = scene {
            let nodes = scene.all_nodes();
            injected += scene.visit_dependents(&nodes, |dependent| self.inject_dependencies(dependent))?;
        }
        for configurator in configurators.iter_mut() {
            if let Some(dependent) = configurator.as_dependent_mut() {
                self.inject_dependencies(dependent)?;
                injected += 1;
            }
        }
        Ok(injected)
    }
}

impl Resolver for ServiceProvider {
    fn resolve_erased(&self, service: TypeId) -> Result<Option<ServiceInstance>, ContainerError> {
        bump(&self.stats.total_resolutions);
        if let Some(instance) = self.resolve_local(service)? {
            return Ok(Some(instance));
        }
        match self.parent() {
            Some(parent) => {
                bump(&self.stats.parent_fallbacks);
                parent.resolve_erased(service)
            }
            None => Ok(None),
        }
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("registered_services", &self.index.borrow().len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl Drop for ServiceProvider {
    fn drop(&mut self) {
        debug!(container = %self.name, kind = ?self.kind, "Container torn down");
    }
}

/// Collects what a container needs before its startup sequence runs.
pub struct ServiceProviderBuilder {
    name: String,
    kind: ContainerKind,
    parent: Option<Weak<ServiceProvider>>,
    resources: Rc<dyn ResourceLoader>,
    configurators: Vec<Box<dyn Configurator>>,
}

impl ServiceProviderBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ContainerKind::Standalone,
            parent: None,
            resources: Rc::new(MemoryResourceLoader::default()),
            configurators: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: ContainerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Falls back to `parent` for lookups this container cannot answer.
    pub fn parent(mut self, parent: &Rc<ServiceProvider>) -> Self {
        self.parent = Some(Rc::downgrade(parent));
        self
    }

    pub(crate) fn weak_parent(mut self, parent: Option<Weak<ServiceProvider>>) -> Self {
        self.parent = parent;
        self
    }

    pub fn resources(mut self, resources: Rc<dyn ResourceLoader>) -> Self {
        self.resources = resources;
        self
    }

    pub fn configurator(mut self, configurator: impl Configurator + 'static) -> Self {
        self.configurators.push(Box::new(configurator));
        self
    }

    pub fn boxed_configurator(mut self, configurator: Box<dyn Configurator>) -> Self {
        self.configurators.push(configurator);
        self
    }

    /// Runs the startup sequence, injecting every dependent component of
    /// `scene` (inactive ones included) once all services exist.
    pub fn build(self, scene: Option<&mut Scene>) -> Result<Rc<ServiceProvider>, ContainerError> {
        let provider = Rc::new(ServiceProvider {
            id: uuid::Uuid::new_v4(),
            name: self.name,
            kind: self.kind,
            strategies: RefCell::new(Vec::new()),
            index: RefCell::new(HashMap::new()),
            parent: self.parent,
            resources: self.resources,
            configurators: RefCell::new(Vec::new()),
            stats: InnerStats::default(),
        });
        let mut configurators = self.configurators;

        let mut collection = ServiceCollection::new();
        collection.add_instance(provider.instantiator());
        for configurator in configurators.iter_mut() {
            configurator.configure_services(&mut collection);
        }
        let descriptor_count = collection.len();

        provider.initialize_services(collection)?;
        let injected = provider.inject_live_objects(scene, &mut configurators)?;
        for configurator in configurators.iter_mut() {
            configurator.on_services_initialized(&provider);
        }
        *provider.configurators.borrow_mut() = configurators;

        info!(
            container = %provider.name,
            id = %provider.id,
            kind = ?provider.kind,
            descriptors = descriptor_count,
            injected,
            "Container initialized"
        );
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::injection::Injector;

    #[derive(Default)]
    struct Counter;

    impl Dependent for Counter {}

    #[derive(Default)]
    struct NeedsCounter {
        counter: Option<Rc<Counter>>,
    }

    impl Dependent for NeedsCounter {
        fn inject(&mut self, injector: &mut Injector<'_>) -> Result<(), ContainerError> {
            self.counter = Some(injector.required::<Counter>()?);
            Ok(())
        }
    }

    #[test]
    fn test_unregistered_service_is_absent() {
        let provider = ServiceProvider::builder("empty").build(None).unwrap();
        assert!(provider.resolve::<Counter>().unwrap().is_none());
        assert!(provider.get_service::<Counter>().is_none());
        assert!(!provider.contains::<Counter>());
    }

    #[test]
    fn test_instantiator_is_registered_for_itself() {
        let provider = ServiceProvider::builder("self").build(None).unwrap();
        assert!(provider.get_service::<Instantiator>().is_some());
        assert_eq!(provider.stats().registered_services, 1);
    }

    #[test]
    fn test_later_singleton_is_absent_during_earlier_construction() {
        let result = ServiceProvider::builder("order")
            .configurator(|services: &mut ServiceCollection| {
                services.add_singleton::<NeedsCounter>().add_singleton::<Counter>();
            })
            .build(None);

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ContainerError::MissingDependency { dependency, .. } if dependency.ends_with("Counter")
        ));
    }

    #[test]
    fn test_earlier_singleton_is_available_to_later_one() {
        let provider = ServiceProvider::builder("order")
            .configurator(|services: &mut ServiceCollection| {
                services.add_singleton::<Counter>().add_singleton::<NeedsCounter>();
            })
            .build(None)
            .unwrap();

        let counter = provider.resolve::<Counter>().unwrap().unwrap();
        let dependent = provider.resolve::<NeedsCounter>().unwrap().unwrap();
        assert!(Rc::ptr_eq(dependent.counter.as_ref().unwrap(), &counter));
    }

    #[test]
    fn test_stats_track_transients_and_fallbacks() {
        let root = ServiceProvider::builder("root")
            .configurator(|services: &mut ServiceCollection| {
                services.add_transient::<Counter>();
            })
            .build(None)
            .unwrap();
        let child = ServiceProvider::builder("child").parent(&root).build(None).unwrap();

        child.resolve::<Counter>().unwrap();
        child.resolve::<Counter>().unwrap();

        let stats = child.stats();
        assert_eq!(stats.total_resolutions, 2);
        assert_eq!(stats.parent_fallbacks, 2);
        assert_eq!(root.stats().transient_creations, 2);
        assert!(stats.performance_summary().contains("100.0% parent fallbacks"));
    }
}
