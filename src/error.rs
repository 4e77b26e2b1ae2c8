//! Error types for VyuhaCorridor.

use thiserror::Error;

use crate::core::types::Point3;

/// VyuhaCorridor error type.
///
/// Every failure aborts the whole update; there is no retry or partial
/// success. The result aggregate may still carry data for agents processed
/// before the failing one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VyuhaError {
    /// The seed box around a trajectory segment already violates the agent's
    /// obstacle clearance. The upstream path planner produced an invalid path.
    #[error("agent {agent}: obstacle invades the initial trajectory near {position}")]
    InfeasibleTrajectory {
        /// Owning agent index
        agent: usize,
        /// First waypoint of the offending segment
        position: Point3,
    },

    /// Two agents' trajectories carry different sample counts in a mode that
    /// compares them sample by sample.
    #[error("agents {first} and {second}: initial trajectories differ in length ({len_first} vs {len_second})")]
    LengthMismatch {
        /// Lower agent index of the pair
        first: usize,
        /// Higher agent index of the pair
        second: usize,
        /// Sample count of `first`
        len_first: usize,
        /// Sample count of `second`
        len_second: usize,
    },

    /// The breakpoint sequence cannot be paired one-to-one with an agent's
    /// trajectory samples.
    #[error("agent {agent}: {time_points} breakpoint times do not cover {samples} trajectory samples")]
    TimePointMismatch {
        /// Agent whose trajectory was being segmented
        agent: usize,
        /// Trajectory sample count
        samples: usize,
        /// Breakpoint count
        time_points: usize,
    },

    /// Two agents occupy the same point, so no separating direction exists.
    #[error("agents {first} and {second}: initial trajectories collide at t={time}")]
    AgentsCoincide {
        /// Lower agent index of the pair
        first: usize,
        /// Higher agent index of the pair
        second: usize,
        /// Breakpoint time at which the separation vanishes
        time: f64,
    },

    /// No direction sector separates the pair at a required step of the
    /// backward sector search; the discretization is too coarse for the agent
    /// spacing.
    #[error("agents {first} and {second}: no separating sector at sample {index} (missing link)")]
    MissingLink {
        /// Lower agent index of the pair
        first: usize,
        /// Higher agent index of the pair
        second: usize,
        /// Path sample index at which coverage vanishes
        index: usize,
    },

    /// The separating sector flips to its direct opposite with no bridging
    /// sector, which would imply one agent passing through the other.
    #[error("agents {first} and {second}: separating sector jumps through the agent at sample {index}")]
    SectorJump {
        /// Lower agent index of the pair
        first: usize,
        /// Higher agent index of the pair
        second: usize,
        /// Path sample index of the disallowed transition
        index: usize,
    },

    /// Invalid mission, parameter, or input shape.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for VyuhaError {
    fn from(e: toml::de::Error) -> Self {
        VyuhaError::Config(e.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, VyuhaError>;
