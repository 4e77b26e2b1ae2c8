//! Relative corridor construction, discretized variant: greedy backward
//! search over six axis-aligned direction sectors.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::core::plan::{PlanResult, RsfcEntry};
use crate::core::types::Point3;
use crate::distance_field::DistanceField;
use crate::error::{Result, VyuhaError};

use super::CorridorPlanner;

/// One of six axis-aligned relative-direction classes.
///
/// A sector holds the discretized direction from one agent to another; its
/// [`normal`](Sector::normal) is the corresponding separating direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sector {
    /// Negative z (below)
    ZNeg,
    /// Negative y
    YNeg,
    /// Negative x
    XNeg,
    /// Positive x
    XPos,
    /// Positive y
    YPos,
    /// Positive z (above)
    ZPos,
}

impl Sector {
    /// Row order of the coverage table; ties in the sector search resolve to
    /// the earliest row.
    pub(crate) const ORDER: [Sector; 6] = [
        Sector::ZNeg,
        Sector::YNeg,
        Sector::XNeg,
        Sector::XPos,
        Sector::YPos,
        Sector::ZPos,
    ];

    /// The directly opposing sector.
    pub fn opposite(self) -> Sector {
        match self {
            Sector::ZNeg => Sector::ZPos,
            Sector::YNeg => Sector::YPos,
            Sector::XNeg => Sector::XPos,
            Sector::XPos => Sector::XNeg,
            Sector::YPos => Sector::YNeg,
            Sector::ZPos => Sector::ZNeg,
        }
    }

    /// Separating unit normal, with the vertical axis carrying the inverse
    /// downwash factor.
    pub fn normal(self, downwash: f64) -> Point3 {
        match self {
            Sector::XNeg => Point3::new(-1.0, 0.0, 0.0),
            Sector::XPos => Point3::new(1.0, 0.0, 0.0),
            Sector::YNeg => Point3::new(0.0, -1.0, 0.0),
            Sector::YPos => Point3::new(0.0, 1.0, 0.0),
            Sector::ZNeg => Point3::new(0.0, 0.0, -1.0 / downwash),
            Sector::ZPos => Point3::new(0.0, 0.0, 1.0 / downwash),
        }
    }

    /// Whether a per-axis relative sign pattern lies in this sector.
    fn matches(self, sign: [i32; 3]) -> bool {
        match self {
            Sector::XNeg => sign[0] < 0,
            Sector::XPos => sign[0] > 0,
            Sector::YNeg => sign[1] < 0,
            Sector::YPos => sign[1] > 0,
            Sector::ZNeg => sign[2] < 0,
            Sector::ZPos => sign[2] > 0,
        }
    }
}

/// Value and first row index of the column maximum.
fn column_max(runs: &[Vec<u32>; 6], col: usize) -> (usize, usize) {
    let mut best = 0u32;
    let mut row = 0usize;
    for (r, run) in runs.iter().enumerate() {
        if run[col] > best {
            best = run[col];
            row = r;
        }
    }
    (best as usize, row)
}

fn dump_runs(qi: usize, qj: usize, runs: &[Vec<u32>; 6]) {
    for (row, sector) in Sector::ORDER.iter().enumerate() {
        tracing::debug!("pair ({qi},{qj}) sector {sector:?} coverage {:?}", runs[row]);
    }
}

impl<F: DistanceField> CorridorPlanner<F> {
    /// Build flat-mode relative corridors for every ordered agent pair.
    ///
    /// The relative displacement at each path sample is discretized to a sign
    /// per axis; per sector a run-length row records how long the pair has
    /// stayed on that side. The search then walks backward from the final
    /// sample, at each step keeping the sector with the longest sustained
    /// coverage and handing over at the midpoint of the overlap window. An
    /// instantaneous crossing (no sustained coverage) is bridged by stepping
    /// back a single sample, which must not flip straight to the opposite
    /// sector unless a third sector covers the transition.
    pub(crate) fn build_flat_relative_corridors(
        &self,
        verbose: bool,
        result: &mut PlanResult,
        makespan: usize,
        breakpoints: &mut Vec<f64>,
    ) -> Result<()> {
        let started = Instant::now();
        let qn = self.mission.agent_count;

        result.rsfc = vec![vec![Vec::new(); qn]; qn];
        for qi in 0..qn {
            for qj in qi + 1..qn {
                let entries = self.search_pair(verbose, result, qi, qj, makespan, breakpoints)?;
                result.rsfc[qi][qj] = entries;
            }
        }

        tracing::debug!(
            "flat relative corridors: {} pairs, {:.3}ms",
            qn * qn.saturating_sub(1) / 2,
            started.elapsed().as_secs_f64() * 1e3
        );
        Ok(())
    }

    /// Run the backward sector search for one pair.
    fn search_pair(
        &self,
        verbose: bool,
        result: &PlanResult,
        qi: usize,
        qj: usize,
        makespan: usize,
        breakpoints: &mut Vec<f64>,
    ) -> Result<Vec<RsfcEntry>> {
        let (ti, tj) = (&result.init_traj[qi], &result.init_traj[qj]);
        let path_max = ti.len().max(tj.len());
        let downwash = self.param.downwash;
        let time_step = self.param.time_step;
        let eps = self.param.sample_epsilon;

        // 6 x path_max run-length coverage table; once a trajectory runs out
        // of samples its last one stands in.
        let mut runs: [Vec<u32>; 6] = Default::default();
        for run in runs.iter_mut() {
            run.resize(path_max, 0);
        }
        for iter in 0..path_max {
            let pi = ti[iter.min(ti.len() - 1)];
            let pj = tj[iter.min(tj.len() - 1)];
            let dx = ((pj.x - pi.x) / self.param.grid_xy_res).round();
            let dy = ((pj.y - pi.y) / self.param.grid_xy_res).round();
            let dz = ((pj.z - pi.z) / self.param.grid_z_res).round();
            let sign = [
                (dx > eps) as i32 - (dx < -eps) as i32,
                (dy > eps) as i32 - (dy < -eps) as i32,
                (dz > eps) as i32 - (dz < -eps) as i32,
            ];

            for (row, sector) in Sector::ORDER.iter().enumerate() {
                if sector.matches(sign) {
                    runs[row][iter] = if iter == 0 { 1 } else { runs[row][iter - 1] + 1 };
                }
            }
        }

        if verbose {
            dump_runs(qi, qj, &runs);
        }

        // Greedy minimum-jump sector path, searched backward from the end.
        let mut entries = Vec::new();
        let mut iter = path_max - 1;
        let (count_last, mut row_next) = column_max(&runs, iter);
        if count_last == 0 {
            tracing::error!("pair ({qi},{qj}): no separating sector at the final sample");
            return Err(VyuhaError::MissingLink {
                first: qi,
                second: qj,
                index: iter,
            });
        }
        entries.push(RsfcEntry {
            normal: Sector::ORDER[row_next].normal(downwash),
            end_time: makespan as f64 * time_step,
        });
        iter = iter + 1 - count_last;

        while iter > 1 {
            let (count_curr, mut row_curr) = column_max(&runs, iter);
            let consumed;
            let count;

            if count_curr <= 1 {
                // Instantaneous crossing: no sector holds for more than one
                // sample here, so step back one and vet the transition.
                iter -= 1;
                let row_opp = 5 - row_next;
                let (backed, backed_row) = column_max(&runs, iter);
                if backed == 0 {
                    tracing::error!(
                        "pair ({qi},{qj}): no separating sector at sample {iter} (missing link)"
                    );
                    dump_runs(qi, qj, &runs);
                    return Err(VyuhaError::MissingLink {
                        first: qi,
                        second: qj,
                        index: iter,
                    });
                }
                if backed_row == row_opp {
                    let bridged = (0..6).any(|r| r != row_opp && runs[r][iter] as usize == backed);
                    if !bridged {
                        tracing::error!(
                            "pair ({qi},{qj}): separating sector jumps through the agent at sample {iter}"
                        );
                        dump_runs(qi, qj, &runs);
                        return Err(VyuhaError::SectorJump {
                            first: qi,
                            second: qj,
                            index: iter,
                        });
                    }
                }
                row_curr = backed_row;
                consumed = backed;
                count = 0;
            } else {
                // Sustained coverage: scan forward across the overlap window
                // of the incoming and outgoing sectors.
                let mut c = 1;
                while iter + c < path_max && runs[row_curr][iter + c] > 0 {
                    c += 1;
                }
                consumed = count_curr;
                count = c;
            }

            let rel_index = if count == 0 {
                iter as f64 + 0.5
            } else {
                (iter as f64 + count as f64 / 2.0).floor()
            };
            entries.push(RsfcEntry {
                normal: Sector::ORDER[row_curr].normal(downwash),
                end_time: rel_index * time_step,
            });
            breakpoints.push(rel_index);

            row_next = row_curr;
            iter = iter + 1 - consumed;
        }

        entries.reverse();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::config::{Mission, Param, WorldBounds};
    use crate::core::plan::PlanResult;
    use crate::distance_field::NoObstacles;

    use super::*;

    #[test]
    fn test_sector_normals_unit_in_scaled_metric() {
        let downwash = 2.5;
        for sector in Sector::ORDER {
            let n = sector.normal(downwash);
            let scaled = (n.x * n.x + n.y * n.y + (n.z * downwash) * (n.z * downwash)).sqrt();
            assert_relative_eq!(scaled, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sector_opposites() {
        for (row, sector) in Sector::ORDER.iter().enumerate() {
            assert_eq!(Sector::ORDER[5 - row], sector.opposite());
        }
    }

    #[test]
    fn test_column_max_prefers_first_row_on_tie() {
        let mut runs: [Vec<u32>; 6] = Default::default();
        for run in runs.iter_mut() {
            run.resize(3, 0);
        }
        runs[2][1] = 2; // XNeg
        runs[4][1] = 2; // YPos

        let (value, row) = column_max(&runs, 1);
        assert_eq!(value, 2);
        assert_eq!(row, 2);
    }

    fn planner(agents: usize) -> CorridorPlanner<NoObstacles> {
        let mission = Mission {
            agent_count: agents,
            agent_radius: vec![0.15; agents],
            world: WorldBounds {
                x_min: -20.0,
                y_min: -20.0,
                z_min: -20.0,
                x_max: 20.0,
                y_max: 20.0,
                z_max: 20.0,
            },
        };
        CorridorPlanner::new(NoObstacles, mission, Param::default()).unwrap()
    }

    fn x_line(xs: &[f64]) -> Vec<Point3> {
        xs.iter().map(|&x| Point3::new(x, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_uniform_relative_direction_yields_single_entry() {
        let planner = planner(2);
        let result = PlanResult::from_trajectories(vec![
            x_line(&[0.0, 1.0, 2.0, 3.0, 4.0]),
            x_line(&[2.0, 3.0, 4.0, 5.0, 6.0]),
        ]);

        let mut breakpoints = Vec::new();
        let entries = planner
            .search_pair(false, &result, 0, 1, 4, &mut breakpoints)
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].normal, Sector::XPos.normal(2.0));
        assert_relative_eq!(entries[0].end_time, 4.0);
        assert!(breakpoints.is_empty());
    }

    #[test]
    fn test_crossing_without_coverage_is_a_missing_link() {
        let planner = planner(2);
        // relative x: +2, 0, -2 grid cells: the crossing sample supports no
        // sector at all
        let result = PlanResult::from_trajectories(vec![
            x_line(&[0.0, 0.0, 0.0]),
            x_line(&[2.0, 0.0, -2.0]),
        ]);

        let mut breakpoints = Vec::new();
        let err = planner
            .search_pair(false, &result, 0, 1, 2, &mut breakpoints)
            .unwrap_err();
        assert!(matches!(
            err,
            VyuhaError::MissingLink {
                first: 0,
                second: 1,
                index: 1,
            }
        ));
    }

    #[test]
    fn test_opposite_flip_without_bridge_is_rejected() {
        let planner = planner(2);
        // relative x stays positive for two samples then flips negative
        let result = PlanResult::from_trajectories(vec![
            x_line(&[0.0, 0.0, 0.0]),
            x_line(&[2.0, 2.0, -2.0]),
        ]);

        let mut breakpoints = Vec::new();
        let err = planner
            .search_pair(false, &result, 0, 1, 2, &mut breakpoints)
            .unwrap_err();
        assert!(matches!(
            err,
            VyuhaError::SectorJump {
                first: 0,
                second: 1,
                index: 1,
            }
        ));
    }

    #[test]
    fn test_opposite_flip_with_bridging_sector_is_allowed() {
        let planner = planner(2);
        // +x with +y alongside for two samples, then -x for two: the flip
        // lands on a crossing sample, and the y sector bridges it
        let result = PlanResult::from_trajectories(vec![
            vec![Point3::ZERO; 4],
            vec![
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(-2.0, 0.0, 0.0),
                Point3::new(-2.0, 0.0, 0.0),
            ],
        ]);

        let mut breakpoints = Vec::new();
        let entries = planner
            .search_pair(false, &result, 0, 1, 3, &mut breakpoints)
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].normal, Sector::XPos.normal(2.0));
        assert_relative_eq!(entries[0].end_time, 1.5);
        assert_eq!(entries[1].normal, Sector::XNeg.normal(2.0));
        assert_relative_eq!(entries[1].end_time, 3.0);
        assert_eq!(breakpoints, vec![1.5]);
    }
}
