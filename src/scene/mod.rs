//! 场景对象图
//!
//! An arena of nodes forming a forest. Each node has its own `active_self`
//! flag; a node is active in the hierarchy only when it and every ancestor
//! are active. Components receive their activation hooks whenever that
//! effective state flips.

pub mod component;
pub mod transform;

use std::fmt;

use tracing::debug;

use crate::errors::ContainerError;
use crate::infrastructure::injection::Dependent;
pub use component::{Component, ComponentClone, ComponentRef};
use component::ComponentSlot;
pub use transform::{Placement, Quat, Transform, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Node {
    name: String,
    active_self: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: Transform,
    components: Vec<ComponentSlot>,
}

/// A scene-like unit owning a node forest.
pub struct Scene {
    name: String,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Creates an active, component-less node at the identity pose.
    pub fn create_node(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ContainerError> {
        if let Some(parent) = parent {
            self.node(parent)?;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            active_self: true,
            parent,
            children: Vec::new(),
            local: Transform::default(),
            components: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Attaches a component; it is activated immediately when the node is
    /// already active in the hierarchy.
    pub fn add_component(
        &mut self,
        node: NodeId,
        component: Box<dyn Component>,
    ) -> Result<ComponentRef, ContainerError> {
        let active = self.is_active_in_hierarchy(node)?;
        let target = self.node_mut(node)?;
        target.components.push(ComponentSlot::new(component));
        let index = target.components.len() - 1;
        if active {
            target.components[index].activate();
        }
        Ok(ComponentRef { node, index })
    }

    pub fn add_default_component<T>(&mut self, node: NodeId) -> Result<ComponentRef, ContainerError>
    where
        T: Component + Default,
    {
        self.add_component(node, Box::new(T::default()))
    }

    pub fn node_name(&self, node: NodeId) -> Result<&str, ContainerError> {
        Ok(&self.node(node)?.name)
    }

    pub fn parent(&self, node: NodeId) -> Result<Option<NodeId>, ContainerError> {
        Ok(self.node(node)?.parent)
    }

    pub fn children(&self, node: NodeId) -> Result<&[NodeId], ContainerError> {
        Ok(&self.node(node)?.children)
    }

    pub fn component_count(&self, node: NodeId) -> Result<usize, ContainerError> {
        Ok(self.node(node)?.components.len())
    }

    pub fn is_active_self(&self, node: NodeId) -> Result<bool, ContainerError> {
        Ok(self.node(node)?.active_self)
    }

    pub fn is_active_in_hierarchy(&self, node: NodeId) -> Result<bool, ContainerError> {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id)?;
            if !n.active_self {
                return Ok(false);
            }
            current = n.parent;
        }
        Ok(true)
    }

    /// Toggles `active_self` and delivers `awake`/`on_enable`/`on_disable` to
    /// every component whose effective activity changed.
    pub fn set_active(&mut self, node: NodeId, active: bool) -> Result<(), ContainerError> {
        if self.node(node)?.active_self == active {
            return Ok(());
        }
        let was_active = self.is_active_in_hierarchy(node)?;
        self.node_mut(node)?.active_self = active;
        let now_active = self.is_active_in_hierarchy(node)?;
        if was_active != now_active {
            debug!(scene = %self.name, %node, active = now_active, "Activity changed");
            self.propagate_activity(node, now_active);
        }
        Ok(())
    }

    fn propagate_activity(&mut self, root: NodeId, active: bool) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id.0];
            for slot in node.components.iter_mut() {
                if active {
                    slot.activate();
                } else {
                    slot.deactivate();
                }
            }
            let children = node.children.clone();
            // 子节点自身未激活时，其子树状态不变
            stack.extend(
                children
                    .into_iter()
                    .rev()
                    .filter(|child| self.nodes[child.0].active_self),
            );
        }
    }

    pub fn local_transform(&self, node: NodeId) -> Result<Transform, ContainerError> {
        Ok(self.node(node)?.local)
    }

    pub fn set_local_transform(
        &mut self,
        node: NodeId,
        transform: Transform,
    ) -> Result<(), ContainerError> {
        self.node_mut(node)?.local = transform;
        Ok(())
    }

    pub fn world_transform(&self, node: NodeId) -> Result<Transform, ContainerError> {
        let n = self.node(node)?;
        match n.parent {
            Some(parent) => Ok(self.world_transform(parent)?.compose(&n.local)),
            None => Ok(n.local),
        }
    }

    /// Pre-order listing of `root` and all of its descendants.
    pub fn subtree(&self, root: NodeId) -> Result<Vec<NodeId>, ContainerError> {
        self.node(root)?;
        let mut result = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            result.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        Ok(result)
    }

    /// Every node in the scene, root by root, in pre-order.
    pub fn all_nodes(&self) -> Vec<NodeId> {
        let mut result = Vec::with_capacity(self.nodes.len());
        for root in &self.roots {
            if let Ok(nodes) = self.subtree(*root) {
                result.extend(nodes);
            }
        }
        result
    }

    pub fn component<T: Component>(&self, handle: ComponentRef) -> Option<&T> {
        self.nodes
            .get(handle.node.0)?
            .components
            .get(handle.index)?
            .component
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn component_mut<T: Component>(&mut self, handle: ComponentRef) -> Option<&mut T> {
        self.nodes
            .get_mut(handle.node.0)?
            .components
            .get_mut(handle.index)?
            .component
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// First component of type `T` on `node`.
    pub fn find_component<T: Component>(&self, node: NodeId) -> Option<ComponentRef> {
        let n = self.nodes.get(node.0)?;
        n.components
            .iter()
            .position(|slot| slot.component.as_any().is::<T>())
            .map(|index| ComponentRef { node, index })
    }

    /// Every component of type `T` in the subtree under `root`, inactive nodes included.
    pub fn find_components_in_children<T: Component>(&self, root: NodeId) -> Vec<ComponentRef> {
        let Ok(nodes) = self.subtree(root) else {
            return Vec::new();
        };
        nodes
            .into_iter()
            .flat_map(|node| {
                self.nodes[node.0]
                    .components
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.component.as_any().is::<T>())
                    .map(move |(index, _)| ComponentRef { node, index })
            })
            .collect()
    }

    pub(crate) fn contains_component(&self, handle: ComponentRef) -> bool {
        self.nodes
            .get(handle.node.0)
            .is_some_and(|n| handle.index < n.components.len())
    }

    /// Calls `visit` for every dependent component on `nodes`, in order.
    /// Stops at the first error. Returns how many dependents were visited.
    pub fn visit_dependents<F>(&mut self, nodes: &[NodeId], mut visit: F) -> Result<usize, ContainerError>
    where
        F: FnMut(&mut dyn Dependent) -> Result<(), ContainerError>,
    {
        let mut visited = 0;
        for id in nodes {
            let node = self
                .nodes
                .get_mut(id.0)
                .ok_or(ContainerError::UnknownNode(*id))?;
            for slot in node.components.iter_mut() {
                if let Some(dependent) = slot.component.as_dependent_mut() {
                    visit(dependent)?;
                    visited += 1;
                }
            }
        }
        Ok(visited)
    }

    /// Deep-copies the subtree under `template`.
    ///
    /// Components are cloned with fresh lifecycle state and the copy's root
    /// keeps the template's `active_self`; hooks only run if the copy ends up
    /// active in the hierarchy.
    pub fn duplicate(&mut self, template: NodeId, placement: Placement) -> Result<NodeId, ContainerError> {
        let template_world = self.world_transform(template)?;
        let template_local = self.local_transform(template)?;
        let parent = placement.parent();
        let parent_world = match parent {
            Some(parent) => Some(self.world_transform(parent)?),
            None => None,
        };

        let local = match placement {
            Placement::Original => template_world,
            Placement::Parent(_) => template_local,
            Placement::ParentInSpace { world_space, .. } => match (world_space, parent_world) {
                (true, Some(parent_world)) => parent_world.relative(&template_world),
                _ => template_local,
            },
            Placement::Pose { position, rotation } => Transform::new(position, rotation),
            Placement::PoseWithParent { position, rotation, .. } => {
                let world = Transform::new(position, rotation);
                match parent_world {
                    Some(parent_world) => parent_world.relative(&world),
                    None => world,
                }
            }
        };

        let root = self.copy_node(template, parent)?;
        self.nodes[root.0].local = local;
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(root),
            None => self.roots.push(root),
        }

        if self.is_active_in_hierarchy(root)? {
            self.propagate_activity(root, true);
        }
        debug!(scene = %self.name, %template, clone = %root, "Duplicated subtree");
        Ok(root)
    }

    fn copy_node(&mut self, source: NodeId, parent: Option<NodeId>) -> Result<NodeId, ContainerError> {
        let original = self.node(source)?;
        let id = NodeId(self.nodes.len());
        let copy = Node {
            name: original.name.clone(),
            active_self: original.active_self,
            parent,
            children: Vec::new(),
            local: original.local,
            components: original.components.iter().map(ComponentSlot::duplicate).collect(),
        };
        let children = original.children.clone();
        self.nodes.push(copy);
        for child in children {
            let child_copy = self.copy_node(child, Some(id))?;
            self.nodes[id.0].children.push(child_copy);
        }
        Ok(id)
    }

    fn node(&self, id: NodeId) -> Result<&Node, ContainerError> {
        self.nodes.get(id.0).ok_or(ContainerError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, ContainerError> {
        self.nodes.get_mut(id.0).ok_or(ContainerError::UnknownNode(id))
    }
}
