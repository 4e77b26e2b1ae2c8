//! Safe-flight-corridor construction for quadrotor swarms.
//!
//! Given a fixed initial waypoint trajectory per agent, the planner produces
//! two families of convex safety regions for a downstream trajectory
//! optimizer:
//!
//! - **Safe Flight Corridors (SFC)**: per agent, an ordered sequence of
//!   axis-aligned obstacle-free boxes, each valid until its `end_time`. Boxes
//!   are seeded around consecutive waypoint pairs and greedily inflated face
//!   by face until every face is saturated by an obstacle or the world
//!   boundary.
//! - **Relative Safe Flight Corridors (RSFC)**: per agent pair, an ordered
//!   sequence of separating directions that keep the two agents' future
//!   positions apart, with vertical separation discounted by the downwash
//!   factor.
//!
//! Two modes are supported. [`CorridorPlanner::update`] treats the input
//! trajectory's time axis as physical time and requires a caller-populated
//! breakpoint sequence; [`CorridorPlanner::update_flat_box`] works in the
//! path-index domain of a discrete planner, derives the shared breakpoint
//! sequence itself and scales it by the configured time step.

mod expand;
mod obstacle;
mod relative;
mod sector;

pub use sector::Sector;

use std::time::Instant;

use crate::config::{Mission, Param};
use crate::core::plan::PlanResult;
use crate::core::types::Box3;
use crate::distance_field::DistanceField;
use crate::error::{Result, VyuhaError};

/// Convex safety-region generator for a quadrotor team.
///
/// Holds the obstacle oracle plus the mission and parameters; all planning
/// state lives in the caller's [`PlanResult`], so one planner can serve any
/// number of sequential updates.
pub struct CorridorPlanner<F: DistanceField> {
    distance_field: F,
    mission: Mission,
    param: Param,
    world: Box3,
}

impl<F: DistanceField> CorridorPlanner<F> {
    /// Create a planner, validating the mission and parameters.
    pub fn new(distance_field: F, mission: Mission, param: Param) -> Result<Self> {
        mission.validate()?;
        param.validate()?;
        let world = mission.world.to_box();
        Ok(Self {
            distance_field,
            mission,
            param,
            world,
        })
    }

    /// Continuous-time update.
    ///
    /// Requires `result.time_points` to be populated with one breakpoint per
    /// trajectory sample, ending at the makespan; SFC and RSFC end times are
    /// drawn from it directly. `verbose` dumps the intermediate containment
    /// tables at debug level.
    pub fn update(&self, verbose: bool, result: &mut PlanResult) -> Result<()> {
        self.check_shape(result)?;
        let makespan = match result.time_points.last() {
            Some(&t) => t,
            None => {
                return Err(VyuhaError::TimePointMismatch {
                    agent: 0,
                    samples: result.init_traj.first().map_or(0, Vec::len),
                    time_points: 0,
                })
            }
        };

        self.build_obstacle_corridors(verbose, result, makespan)?;
        self.build_relative_corridors(result)?;
        Ok(())
    }

    /// Discretized update in the path-index domain.
    ///
    /// Trajectories may differ in length; the makespan is the largest path
    /// index across agents. Breakpoints discovered while segmenting boxes and
    /// sectors are merged with `{0, makespan}`, deduplicated and scaled by
    /// the time step into `result.time_points`.
    pub fn update_flat_box(&self, verbose: bool, result: &mut PlanResult) -> Result<()> {
        self.check_shape(result)?;
        let makespan = result
            .init_traj
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(1)
            .saturating_sub(1);

        let mut breakpoints = Vec::new();
        self.build_flat_obstacle_corridors(verbose, result, makespan, &mut breakpoints)?;
        self.build_flat_relative_corridors(verbose, result, makespan, &mut breakpoints)?;
        self.finalize_time_points(result, makespan, breakpoints);
        Ok(())
    }

    /// Check that the aggregate matches the mission shape.
    fn check_shape(&self, result: &PlanResult) -> Result<()> {
        if result.init_traj.len() != self.mission.agent_count {
            return Err(VyuhaError::Config(format!(
                "mission declares {} agents but the result carries {} trajectories",
                self.mission.agent_count,
                result.init_traj.len()
            )));
        }
        for (qi, traj) in result.init_traj.iter().enumerate() {
            if traj.len() < 2 {
                return Err(VyuhaError::Config(format!(
                    "agent {qi}: trajectory needs at least 2 samples, got {}",
                    traj.len()
                )));
            }
        }
        Ok(())
    }

    /// Merge, order and scale the breakpoints discovered by the flat passes.
    fn finalize_time_points(
        &self,
        result: &mut PlanResult,
        makespan: usize,
        mut breakpoints: Vec<f64>,
    ) {
        let started = Instant::now();

        breakpoints.push(0.0);
        breakpoints.push(makespan as f64);
        breakpoints.sort_by(f64::total_cmp);
        breakpoints.dedup();

        result.time_points = breakpoints
            .iter()
            .map(|index| index * self.param.time_step)
            .collect();

        tracing::debug!(
            "segment times finalized: {} breakpoints, {:.3}ms",
            result.time_points.len(),
            started.elapsed().as_secs_f64() * 1e3
        );
    }
}
