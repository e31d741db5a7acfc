//! Render-side transform targets.
//!
//! The simulation never builds geometry; it only writes the logical transform
//! of each entity into a node it was handed at construction time. The renderer
//! reads the nodes back every frame.

use macroquad::color::Color;
use macroquad::math::{Quat, Vec3};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Transform {
            translation,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::from_translation(Vec3::ZERO)
    }
}

/// Shape hint for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeShape {
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Hull box with a turret whose yaw is relative to the hull.
    Tank { half_extents: Vec3, turret_yaw: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub transform: Transform,
    pub shape: NodeShape,
    pub color: Color,
}

/// Flat set of render nodes keyed by id.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, shape: NodeShape, color: Color, transform: Transform) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            SceneNode {
                transform,
                shape,
                color,
            },
        );
        id
    }

    /// Removes a node. Returns false if it was already gone.
    pub fn detach(&mut self, id: NodeId) -> bool {
        self.nodes.remove(&id).is_some()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn transform(&self, id: NodeId) -> Option<Transform> {
        self.nodes.get(&id).map(|node| node.transform)
    }

    /// Writes a transform into a node. Returns false if the node is detached.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.transform = transform;
                true
            }
            None => false,
        }
    }

    pub fn set_turret_yaw(&mut self, id: NodeId, yaw: f32) {
        if let Some(SceneNode {
            shape: NodeShape::Tank { turret_yaw, .. },
            ..
        }) = self.nodes.get_mut(&id)
        {
            *turret_yaw = yaw;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
