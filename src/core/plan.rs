//! Caller-owned planning aggregate exchanged with the corridor planner.

use serde::{Deserialize, Serialize};

use super::types::{Box3, Point3};

/// One safe-flight-corridor segment: an obstacle-free box and the end of its
/// validity interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SfcEntry {
    /// Obstacle-free axis-aligned box the agent may occupy
    pub region: Box3,
    /// Time at which responsibility transfers to the next box
    pub end_time: f64,
}

/// One relative-corridor segment: a separating direction between two agents
/// and the end of its validity interval.
///
/// The normal is unit-length in the downwash-scaled metric: its vertical
/// component carries the inverse downwash factor so that vertical separation
/// is discounted relative to horizontal separation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsfcEntry {
    /// Separating direction pointing from the lower-indexed agent toward the
    /// higher-indexed one
    pub normal: Point3,
    /// Time at which responsibility transfers to the next normal
    pub end_time: f64,
}

/// Aggregate holding the planner's inputs and outputs for one planning run.
///
/// The caller populates `init_traj` (and, in continuous mode, `time_points`)
/// before calling the planner; the planner rewrites `sfc`, `rsfc` and, in
/// flat mode, `time_points`. When an update fails, entries for agents and
/// pairs processed before the failure remain populated; callers must treat
/// the whole aggregate as invalid in that case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// Per-agent initial waypoint trajectories
    pub init_traj: Vec<Vec<Point3>>,

    /// Shared breakpoint sequence, strictly increasing from 0 to the makespan.
    ///
    /// Input in continuous mode (one entry per trajectory sample); rebuilt
    /// from scratch by flat mode.
    pub time_points: Vec<f64>,

    /// Per-agent safe flight corridors, ordered by `end_time`
    pub sfc: Vec<Vec<SfcEntry>>,

    /// Per-pair relative corridors, indexed `[qi][qj]` with `qi < qj`; the
    /// mirror slots stay empty
    pub rsfc: Vec<Vec<Vec<RsfcEntry>>>,
}

impl PlanResult {
    /// Create an aggregate for the given initial trajectories.
    pub fn from_trajectories(init_traj: Vec<Vec<Point3>>) -> Self {
        Self {
            init_traj,
            ..Self::default()
        }
    }

    /// The relative corridor for the pair `(qi, qj)`, in either index order.
    pub fn pair(&self, qi: usize, qj: usize) -> &[RsfcEntry] {
        let (lo, hi) = if qi < qj { (qi, qj) } else { (qj, qi) };
        self.rsfc
            .get(lo)
            .and_then(|row| row.get(hi))
            .map_or(&[], Vec::as_slice)
    }
}
