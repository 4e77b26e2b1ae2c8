//! # VyuhaCorridor
//!
//! Convex safety-region generation for quadrotor swarm trajectory planning.
//!
//! Given a team of agents, each following a fixed initial waypoint
//! trajectory, the crate computes the convex regions a downstream trajectory
//! optimizer uses as hard constraints:
//!
//! - **Safe Flight Corridors**: per agent, a time-partitioned sequence of
//!   axis-aligned obstacle-free boxes bounding where the agent may deviate
//!   from its nominal path.
//! - **Relative Safe Flight Corridors**: per agent pair, a time-partitioned
//!   sequence of separating directions keeping the agents apart, with
//!   vertical clearance discounted by a downwash factor.
//!
//! Obstacle distances come from an external oracle behind the
//! [`DistanceField`] trait; initial trajectories and the downstream optimizer
//! live outside this crate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   corridor/                         │  ← Planner
//! │   (box expansion, obstacle & relative corridors,    │
//! │    sector search, breakpoint finalization)          │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌──────────────────────────┬──────────────────────────┐
//! │      distance_field      │         config           │  ← Interfaces
//! │     (obstacle oracle)    │     (mission, params)    │
//! └──────────────────────────┴──────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      core/                          │  ← Foundation
//! │          (geometry, planning aggregate)             │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vyuha_corridor::{
//!     CorridorPlanner, Mission, NoObstacles, Param, PlanResult, Point3,
//! };
//!
//! let mission = Mission { agent_count: 1, agent_radius: vec![0.15], ..Mission::default() };
//! let planner = CorridorPlanner::new(NoObstacles, mission, Param::default())?;
//!
//! let mut result = PlanResult::from_trajectories(vec![vec![
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(2.0, 0.0, 1.0),
//! ]]);
//! planner.update_flat_box(false, &mut result)?;
//!
//! for entry in &result.sfc[0] {
//!     println!("box until t={}: {:?}", entry.end_time, entry.region);
//! }
//! ```
//!
//! # Modes
//!
//! [`CorridorPlanner::update`] treats the trajectory's time axis as physical
//! time and expects the caller to provide the breakpoint sequence;
//! [`CorridorPlanner::update_flat_box`] works on the sample indices of a
//! discrete path, derives the shared breakpoint sequence itself and scales it
//! by the configured time step.

#![warn(missing_docs)]

pub mod config;
pub mod core;
pub mod corridor;
pub mod distance_field;
pub mod error;

pub use crate::config::{Mission, Param, VyuhaConfig, WorldBounds};
pub use crate::core::plan::{PlanResult, RsfcEntry, SfcEntry};
pub use crate::core::types::{Box3, Face, Point3};
pub use crate::corridor::{CorridorPlanner, Sector};
pub use crate::distance_field::{DistanceField, NoObstacles, PointObstacles};
pub use crate::error::{Result, VyuhaError};
