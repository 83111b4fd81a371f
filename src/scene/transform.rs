//! Poses for scene nodes and the placement modes used when cloning them.

use std::ops::{Add, Mul, Sub};

use super::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    fn scale(self, factor: f32) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Component-wise comparison with a tolerance, for float noise after rotations.
    pub fn approx_eq(self, other: Vec3, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Unit quaternion rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Rotation of `angle` radians around the Y axis.
    pub fn from_rotation_y(angle: f32) -> Self {
        let half = angle * 0.5;
        Quat { x: 0.0, y: half.sin(), z: 0.0, w: half.cos() }
    }

    pub fn conjugate(self) -> Self {
        Quat { x: -self.x, y: -self.y, z: -self.z, w: self.w }
    }

    pub fn rotate(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v).scale(2.0);
        v + t.scale(self.w) + u.cross(t)
    }
}

impl Mul for Quat {
    type Output = Quat;

    fn mul(self, rhs: Quat) -> Quat {
        Quat {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Maps a pose expressed relative to `self` into the space `self` lives in.
    pub fn compose(&self, local: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation.rotate(local.position),
            rotation: self.rotation * local.rotation,
        }
    }

    /// Expresses `world` relative to `self`; the inverse of [`Transform::compose`].
    pub fn relative(&self, world: &Transform) -> Transform {
        let inverse = self.rotation.conjugate();
        Transform {
            position: inverse.rotate(world.position - self.position),
            rotation: inverse * world.rotation,
        }
    }
}

/// Where a clone lands when a template is duplicated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Scene root, keeping the template's world pose.
    Original,
    /// Under `parent`, keeping the template's local pose.
    Parent(NodeId),
    /// Under `parent`; `world_space` keeps the template's world pose instead
    /// of its local one.
    ParentInSpace { parent: NodeId, world_space: bool },
    /// Scene root at the given world pose.
    Pose { position: Vec3, rotation: Quat },
    /// Under `parent` at the given world pose.
    PoseWithParent {
        position: Vec3,
        rotation: Quat,
        parent: NodeId,
    },
}

impl Placement {
    pub fn parent(&self) -> Option<NodeId> {
        match *self {
            Placement::Original | Placement::Pose { .. } => None,
            Placement::Parent(parent)
            | Placement::ParentInSpace { parent, .. }
            | Placement::PoseWithParent { parent, .. } => Some(parent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rotate_quarter_turn_around_y() {
        let q = Quat::from_rotation_y(FRAC_PI_2);
        let rotated = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!(rotated.approx_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
    }

    #[test]
    fn test_relative_undoes_compose() {
        let parent = Transform::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.7));
        let local = Transform::new(Vec3::new(-4.0, 0.5, 2.0), Quat::from_rotation_y(-0.2));

        let world = parent.compose(&local);
        let back = parent.relative(&world);

        assert!(back.position.approx_eq(local.position, 1e-4));
        assert!((back.rotation.y - local.rotation.y).abs() < 1e-5);
        assert!((back.rotation.w - local.rotation.w).abs() < 1e-5);
    }
}
