//! Components: the behaviour-carrying parts attached to scene nodes.

use std::any::Any;
use std::fmt;

use super::NodeId;
use crate::infrastructure::injection::Dependent;

/// A part attached to a node.
///
/// Activation hooks follow the owning node's effective activity: `awake` runs
/// once, the first time the component becomes active, followed by
/// `on_enable`; `on_disable` runs whenever it stops being active.
pub trait Component: ComponentClone + Any {
    fn awake(&mut self) {}

    fn on_enable(&mut self) {}

    fn on_disable(&mut self) {}

    /// Components carrying injection points return themselves here.
    fn as_dependent_mut(&mut self) -> Option<&mut dyn Dependent> {
        None
    }
}

/// Object-safe cloning and downcasting for boxed components.
pub trait ComponentClone {
    fn clone_component(&self) -> Box<dyn Component>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component + Clone> ComponentClone for T {
    fn clone_component(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Handle to the `index`-th component of `node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    pub node: NodeId,
    pub index: usize,
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.node, self.index)
    }
}

pub(crate) struct ComponentSlot {
    pub(crate) component: Box<dyn Component>,
    awoken: bool,
    enabled: bool,
}

impl ComponentSlot {
    pub(crate) fn new(component: Box<dyn Component>) -> Self {
        Self {
            component,
            awoken: false,
            enabled: false,
        }
    }

    /// A fresh slot holding a copy of this component; lifecycle state is not copied.
    pub(crate) fn duplicate(&self) -> Self {
        Self::new(self.component.clone_component())
    }

    pub(crate) fn activate(&mut self) {
        if !self.awoken {
            self.awoken = true;
            self.component.awake();
        }
        if !self.enabled {
            self.enabled = true;
            self.component.on_enable();
        }
    }

    pub(crate) fn deactivate(&mut self) {
        if self.enabled {
            self.enabled = false;
            self.component.on_disable();
        }
    }
}
