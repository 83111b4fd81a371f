//! Application-scoped container hierarchy.
//!
//! An [`AppContext`] is created once at the entry point and handed to
//! whatever builds containers. It remembers the project container weakly, so
//! dropping the project container frees the slot again.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{error, info};

use super::provider::{ContainerKind, ServiceProvider};
use crate::config::ContainerConfig;
use crate::errors::ContainerError;
use crate::infrastructure::configurator::Configurator;
use crate::infrastructure::resources::{FileResourceLoader, ResourceLoader};
use crate::scene::Scene;

pub struct AppContext {
    project: RefCell<Weak<ServiceProvider>>,
    resources: Rc<dyn ResourceLoader>,
}

impl AppContext {
    pub fn new(resources: Rc<dyn ResourceLoader>) -> Self {
        Self {
            project: RefCell::new(Weak::new()),
            resources,
        }
    }

    /// Uses files under the configured resource root.
    pub fn from_config(config: &ContainerConfig) -> Self {
        Self::new(Rc::new(FileResourceLoader::from_config(&config.resources)))
    }

    pub fn resources(&self) -> Rc<dyn ResourceLoader> {
        Rc::clone(&self.resources)
    }

    /// The live project container, if any.
    pub fn project(&self) -> Option<Rc<ServiceProvider>> {
        self.project.borrow().upgrade()
    }

    /// Builds the application-lifetime root container. Fails while another
    /// project container is still alive.
    pub fn create_project_container(
        &self,
        name: impl Into<String>,
        configurators: Vec<Box<dyn Configurator>>,
        scene: Option<&mut Scene>,
    ) -> Result<Rc<ServiceProvider>, ContainerError> {
        let name = name.into();
        if let Some(existing) = self.project() {
            error!(container = %name, existing = %existing.name(), "Project container already exists");
            return Err(ContainerError::DuplicateProjectContainer {
                existing: existing.name().to_string(),
            });
        }

        let mut builder = ServiceProvider::builder(name)
            .kind(ContainerKind::Project)
            .resources(self.resources());
        for configurator in configurators {
            builder = builder.boxed_configurator(configurator);
        }
        let provider = builder.build(scene)?;

        *self.project.borrow_mut() = Rc::downgrade(&provider);
        info!(container = %provider.name(), "Project container registered");
        Ok(provider)
    }

    /// Builds a container for one scene. Lookups it cannot answer go to the
    /// project container that is alive at this moment, if there is one.
    pub fn create_scene_container(
        &self,
        name: impl Into<String>,
        configurators: Vec<Box<dyn Configurator>>,
        scene: Option<&mut Scene>,
    ) -> Result<Rc<ServiceProvider>, ContainerError> {
        let parent = self.project().map(|project| Rc::downgrade(&project));
        let mut builder = ServiceProvider::builder(name)
            .kind(ContainerKind::Scene)
            .weak_parent(parent)
            .resources(self.resources());
        for configurator in configurators {
            builder = builder.boxed_configurator(configurator);
        }
        builder.build(scene)
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(Rc::new(crate::infrastructure::resources::MemoryResourceLoader::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_project_container_is_rejected() {
        let context = AppContext::default();
        let _project = context.create_project_container("project", Vec::new(), None).unwrap();

        let err = context
            .create_project_container("again", Vec::new(), None)
            .unwrap_err();
        assert!(matches!(err, ContainerError::DuplicateProjectContainer { existing } if existing == "project"));
    }

    #[test]
    fn test_project_slot_is_freed_on_drop() {
        let context = AppContext::default();
        let project = context.create_project_container("first", Vec::new(), None).unwrap();
        drop(project);

        assert!(context.project().is_none());
        assert!(context.create_project_container("second", Vec::new(), None).is_ok());
    }

    #[test]
    fn test_scene_container_falls_back_to_project() {
        let context = AppContext::default();
        let project = context.create_project_container("project", Vec::new(), None).unwrap();
        let scene = context.create_scene_container("level", Vec::new(), None).unwrap();

        assert_eq!(scene.kind(), ContainerKind::Scene);
        assert!(Rc::ptr_eq(&scene.parent().unwrap(), &project));
    }
}
