pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod logging;
pub mod scene;

// Re-export commonly used items for convenience
pub use config::ContainerConfig;
pub use errors::{ConfigError, ContainerError};
pub use infrastructure::container::{Injectable, Resource};
pub use infrastructure::{
    AppContext, Configurator, ContainerKind, Dependent, Injector, Instantiator, ServiceCollection,
    ServiceLifetime, ServiceProvider,
};
pub use scene::{Component, ComponentRef, NodeId, Placement, Quat, Scene, Transform, Vec3};
