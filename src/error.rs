// Error types: stale physics handles, detached scene nodes, match setup failures

use crate::scene::NodeId;
use rapier3d::prelude::RigidBodyHandle;
use thiserror::Error;

/// Physics/scene binding errors. These are expected conditions: callers log
/// them and skip the affected entity.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum PhysicsError {
    #[error("Rigid body {0:?} no longer exists")]
    StaleBody(RigidBodyHandle),
    #[error("Scene node {0} is not attached")]
    MissingNode(NodeId),
}

/// Match setup errors
#[derive(Error, Debug, PartialEq, Clone)]
pub enum SetupError {
    #[error("Could not place {what} after {attempts} attempts")]
    PlacementExhausted { what: &'static str, attempts: u32 },
    #[error("Invalid arena configuration: {0}")]
    InvalidConfig(String),
}
