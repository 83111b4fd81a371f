//! 依赖对象实例化
//!
//! Cloning a template must not let the clone's activation hooks run before
//! its dependencies are in place. The template's owning node is switched off
//! first, so the duplicate is born inactive; the duplicate's dependents are
//! injected; then the template and finally the duplicate get the template's
//! previous `active_self` back. Restoring the duplicate is the first point at
//! which its `awake`/`on_enable` can run.

use std::rc::{Rc, Weak};

use tracing::debug;

use super::container::ServiceProvider;
use crate::errors::ContainerError;
use crate::scene::{Component, ComponentRef, NodeId, Placement, Quat, Scene, Vec3};

/// Something that can be cloned together with the node that owns it.
pub trait Template: Copy {
    /// The activatable node that gets duplicated.
    fn owner(self) -> NodeId;

    /// The equivalent handle inside a copy rooted at `clone_root`.
    fn relocate(self, clone_root: NodeId) -> Self;

    fn validate(self, scene: &Scene) -> Result<(), ContainerError>;
}

impl Template for NodeId {
    fn owner(self) -> NodeId {
        self
    }

    fn relocate(self, clone_root: NodeId) -> Self {
        clone_root
    }

    fn validate(self, scene: &Scene) -> Result<(), ContainerError> {
        scene.is_active_self(self).map(|_| ())
    }
}

impl Template for ComponentRef {
    fn owner(self) -> NodeId {
        self.node
    }

    fn relocate(self, clone_root: NodeId) -> Self {
        ComponentRef {
            node: clone_root,
            index: self.index,
        }
    }

    fn validate(self, scene: &Scene) -> Result<(), ContainerError> {
        if scene.contains_component(self) {
            Ok(())
        } else {
            Err(ContainerError::UnknownComponent(self))
        }
    }
}

impl ServiceProvider {
    /// Clones `original` with the given placement, injecting every dependent
    /// component of the copy before any of them can activate.
    pub fn instantiate_placed<T: Template>(
        &self,
        scene: &mut Scene,
        original: T,
        placement: Placement,
    ) -> Result<T, ContainerError> {
        original.validate(scene)?;
        let owner = original.owner();

        let was_active = scene.is_active_self(owner)?;
        scene.set_active(owner, false)?;

        let clone = match scene.duplicate(owner, placement) {
            Ok(clone) => clone,
            Err(err) => {
                scene.set_active(owner, was_active)?;
                return Err(err);
            }
        };

        let injected = scene
            .subtree(clone)
            .and_then(|nodes| scene.visit_dependents(&nodes, |dependent| self.inject_dependencies(dependent)));

        scene.set_active(owner, was_active)?;
        // 注入失败时副本保持未激活状态
        let injected = injected?;
        scene.set_active(clone, was_active)?;

        debug!(
            container = %self.name(),
            template = %owner,
            %clone,
            injected,
            "Dependent object instantiated"
        );
        Ok(original.relocate(clone))
    }

    pub fn instantiate<T: Template>(&self, scene: &mut Scene, original: T) -> Result<T, ContainerError> {
        self.instantiate_placed(scene, original, Placement::Original)
    }

    pub fn instantiate_with_parent<T: Template>(
        &self,
        scene: &mut Scene,
        original: T,
        parent: NodeId,
    ) -> Result<T, ContainerError> {
        self.instantiate_placed(scene, original, Placement::Parent(parent))
    }

    pub fn instantiate_in_space<T: Template>(
        &self,
        scene: &mut Scene,
        original: T,
        parent: NodeId,
        world_space: bool,
    ) -> Result<T, ContainerError> {
        self.instantiate_placed(scene, original, Placement::ParentInSpace { parent, world_space })
    }

    pub fn instantiate_at<T: Template>(
        &self,
        scene: &mut Scene,
        original: T,
        position: Vec3,
        rotation: Quat,
    ) -> Result<T, ContainerError> {
        self.instantiate_placed(scene, original, Placement::Pose { position, rotation })
    }

    pub fn instantiate_at_with_parent<T: Template>(
        &self,
        scene: &mut Scene,
        original: T,
        position: Vec3,
        rotation: Quat,
        parent: NodeId,
    ) -> Result<T, ContainerError> {
        self.instantiate_placed(
            scene,
            original,
            Placement::PoseWithParent {
                position,
                rotation,
                parent,
            },
        )
    }
}

/// Handle registered in every container so dependents can spawn objects
/// through the container that injected them.
#[derive(Clone)]
pub struct Instantiator {
    provider: Weak<ServiceProvider>,
}

impl Instantiator {
    pub fn new(provider: Weak<ServiceProvider>) -> Self {
        Self { provider }
    }

    fn provider(&self) -> Result<Rc<ServiceProvider>, ContainerError> {
        self.provider.upgrade().ok_or(ContainerError::ContainerDropped)
    }

    pub fn instantiate<T: Template>(&self, scene: &mut Scene, original: T) -> Result<T, ContainerError> {
        self.provider()?.instantiate(scene, original)
    }

    pub fn instantiate_with_parent<T: Template>(
        &self,
        scene: &mut Scene,
        original: T,
        parent: NodeId,
    ) -> Result<T, ContainerError> {
        self.provider()?.instantiate_with_parent(scene, original, parent)
    }

    pub fn instantiate_in_space<T: Template>(
        &self,
        scene: &mut Scene,
        original: T,
        parent: NodeId,
        world_space: bool,
    ) -> Result<T, ContainerError> {
        self.provider()?.instantiate_in_space(scene, original, parent, world_space)
    }

    pub fn instantiate_at<T: Template>(
        &self,
        scene: &mut Scene,
        original: T,
        position: Vec3,
        rotation: Quat,
    ) -> Result<T, ContainerError> {
        self.provider()?.instantiate_at(scene, original, position, rotation)
    }

    pub fn instantiate_at_with_parent<T: Template>(
        &self,
        scene: &mut Scene,
        original: T,
        position: Vec3,
        rotation: Quat,
        parent: NodeId,
    ) -> Result<T, ContainerError> {
        self.provider()?
            .instantiate_at_with_parent(scene, original, position, rotation, parent)
    }

    /// Attaches `component` to `node` as is; no injection takes place.
    pub fn add_component(
        &self,
        scene: &mut Scene,
        node: NodeId,
        component: Box<dyn Component>,
    ) -> Result<ComponentRef, ContainerError> {
        scene.add_component(node, component)
    }

    pub fn add_default_component<T: Component + Default>(
        &self,
        scene: &mut Scene,
        node: NodeId,
    ) -> Result<ComponentRef, ContainerError> {
        scene.add_default_component::<T>(node)
    }
}
