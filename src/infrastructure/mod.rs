//! 基础设施层
//!
//! 提供依赖注入运行时的具体实现，包括：
//! - 服务注册与容器
//! - 依赖注入
//! - 依赖对象实例化
//! - 资源加载

pub mod configurator;
pub mod container;
pub mod injection;
pub mod instantiator;
pub mod resources;

// 重新导出API
pub use configurator::Configurator;
pub use container::{
    AppContext, ContainerKind, ContainerStats, ServiceCollection, ServiceLifetime, ServiceProvider,
    ServiceProviderBuilder,
};
pub use injection::{Dependent, Injector, Resolver};
pub use instantiator::{Instantiator, Template};
pub use resources::{FileResourceLoader, MemoryResourceLoader, ResourceFormat, ResourceLoader};
