//! 服务提供策略
//!
//! One strategy per lifetime/source combination. A strategy produces a single
//! instance per `get_instance` call; `initialize` runs at most once and is
//! where singletons are built.

use std::cell::{Cell, OnceCell};
use std::fmt;
use std::rc::Rc;

use super::provider::ServiceProvider;
use super::{ServiceInstance, ServiceLifetime};
use crate::errors::ContainerError;

/// Builds and injects a new implementation instance.
pub type Constructor = Rc<dyn Fn(&ServiceProvider) -> Result<ServiceInstance, ContainerError>>;

/// Loads and injects the resource stored under a path; `None` when unusable.
pub type ResourceConstructor =
    Rc<dyn Fn(&ServiceProvider, &str) -> Result<Option<ServiceInstance>, ContainerError>>;

enum StrategyKind {
    Instance {
        instance: ServiceInstance,
    },
    SingletonConstructed {
        construct: Constructor,
        instance: OnceCell<ServiceInstance>,
    },
    TransientConstructed {
        construct: Constructor,
    },
    SingletonFromResource {
        path: String,
        load: ResourceConstructor,
        instance: OnceCell<Option<ServiceInstance>>,
    },
    TransientFromResource {
        path: String,
        load: ResourceConstructor,
    },
}

pub struct Strategy {
    kind: StrategyKind,
    implementation: &'static str,
    initialized: Cell<bool>,
}

impl Strategy {
    fn new(kind: StrategyKind, implementation: &'static str) -> Self {
        Self {
            kind,
            implementation,
            initialized: Cell::new(false),
        }
    }

    pub fn instance(instance: ServiceInstance, implementation: &'static str) -> Self {
        Self::new(StrategyKind::Instance { instance }, implementation)
    }

    pub fn singleton(construct: Constructor, implementation: &'static str) -> Self {
        Self::new(
            StrategyKind::SingletonConstructed {
                construct,
                instance: OnceCell::new(),
            },
            implementation,
        )
    }

    pub fn transient(construct: Constructor, implementation: &'static str) -> Self {
        Self::new(StrategyKind::TransientConstructed { construct }, implementation)
    }

    pub fn singleton_resource(
        path: impl Into<String>,
        load: ResourceConstructor,
        implementation: &'static str,
    ) -> Self {
        Self::new(
            StrategyKind::SingletonFromResource {
                path: path.into(),
                load,
                instance: OnceCell::new(),
            },
            implementation,
        )
    }

    pub fn transient_resource(
        path: impl Into<String>,
        load: ResourceConstructor,
        implementation: &'static str,
    ) -> Self {
        Self::new(
            StrategyKind::TransientFromResource {
                path: path.into(),
                load,
            },
            implementation,
        )
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        match self.kind {
            StrategyKind::Instance { .. } => ServiceLifetime::Instance,
            StrategyKind::SingletonConstructed { .. } | StrategyKind::SingletonFromResource { .. } => {
                ServiceLifetime::Singleton
            }
            StrategyKind::TransientConstructed { .. } | StrategyKind::TransientFromResource { .. } => {
                ServiceLifetime::Transient
            }
        }
    }

    pub fn implementation(&self) -> &'static str {
        self.implementation
    }

    pub fn resource_path(&self) -> Option<&str> {
        match &self.kind {
            StrategyKind::SingletonFromResource { path, .. }
            | StrategyKind::TransientFromResource { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// One-time setup. Singletons are built here; later calls do nothing.
    pub fn initialize(&self, provider: &ServiceProvider) -> Result<(), ContainerError> {
        if self.initialized.replace(true) {
            return Ok(());
        }
        match &self.kind {
            StrategyKind::SingletonConstructed { construct, instance } => {
                let built = construct(provider)?;
                let _ = instance.set(built);
            }
            StrategyKind::SingletonFromResource { path, load, instance } => {
                let loaded = load(provider, path.as_str())?;
                let _ = instance.set(loaded);
            }
            StrategyKind::Instance { .. }
            | StrategyKind::TransientConstructed { .. }
            | StrategyKind::TransientFromResource { .. } => {}
        }
        Ok(())
    }

    /// Produces one instance. Singletons that have not been initialized yet
    /// yield `None`.
    pub fn get_instance(&self, provider: &ServiceProvider) -> Result<Option<ServiceInstance>, ContainerError> {
        match &self.kind {
            StrategyKind::Instance { instance } => Ok(Some(instance.clone())),
            StrategyKind::SingletonConstructed { instance, .. } => Ok(instance.get().cloned()),
            StrategyKind::TransientConstructed { construct } => construct(provider).map(Some),
            StrategyKind::SingletonFromResource { instance, .. } => Ok(instance.get().cloned().flatten()),
            StrategyKind::TransientFromResource { path, load } => load(provider, path.as_str()),
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("lifetime", &self.lifetime())
            .field("implementation", &self.implementation)
            .field("resource_path", &self.resource_path())
            .field("initialized", &self.initialized.get())
            .finish()
    }
}
