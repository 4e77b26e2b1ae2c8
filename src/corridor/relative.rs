//! Relative corridor construction, continuous variant: per-pair separating
//! normals from the closest approach of the relative-position segment.

use std::time::Instant;

use crate::core::plan::{PlanResult, RsfcEntry};
use crate::core::types::segment_closest_to_origin;
use crate::distance_field::DistanceField;
use crate::error::{Result, VyuhaError};

use super::CorridorPlanner;

impl<F: DistanceField> CorridorPlanner<F> {
    /// Build relative corridors for every ordered agent pair.
    ///
    /// Between consecutive breakpoints the pair's relative position sweeps a
    /// straight segment (in the downwash-scaled frame); the point of that
    /// segment closest to the origin gives the tightest separating direction
    /// for the whole interval.
    pub(crate) fn build_relative_corridors(&self, result: &mut PlanResult) -> Result<()> {
        let started = Instant::now();
        let qn = self.mission.agent_count;
        let downwash = self.param.downwash;

        result.rsfc = vec![vec![Vec::new(); qn]; qn];
        for qi in 0..qn {
            for qj in qi + 1..qn {
                let (ti, tj) = (&result.init_traj[qi], &result.init_traj[qj]);
                if ti.len() != tj.len() {
                    tracing::error!(
                        "agents {qi} and {qj}: initial trajectory lengths must be equal"
                    );
                    return Err(VyuhaError::LengthMismatch {
                        first: qi,
                        second: qj,
                        len_first: ti.len(),
                        len_second: tj.len(),
                    });
                }
                if result.time_points.len() > ti.len() {
                    tracing::error!(
                        "agents {qi} and {qj}: breakpoint sequence outruns the trajectories"
                    );
                    return Err(VyuhaError::TimePointMismatch {
                        agent: qi,
                        samples: ti.len(),
                        time_points: result.time_points.len(),
                    });
                }

                let mut entries = Vec::with_capacity(result.time_points.len().saturating_sub(1));
                for k in 1..result.time_points.len() {
                    let mut a = tj[k - 1] - ti[k - 1];
                    let mut b = tj[k] - ti[k];
                    a.z /= downwash;
                    b.z /= downwash;

                    let mut normal = segment_closest_to_origin(a, b).normalized();
                    normal.z /= downwash;
                    if normal.norm() == 0.0 {
                        tracing::error!(
                            "agents {qi} and {qj}: initial trajectories collide with each other"
                        );
                        return Err(VyuhaError::AgentsCoincide {
                            first: qi,
                            second: qj,
                            time: result.time_points[k],
                        });
                    }

                    entries.push(RsfcEntry {
                        normal,
                        end_time: result.time_points[k],
                    });
                }
                result.rsfc[qi][qj] = entries;
            }
        }

        tracing::debug!(
            "relative corridors: {} pairs, {:.3}ms",
            qn * qn.saturating_sub(1) / 2,
            started.elapsed().as_secs_f64() * 1e3
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::config::{Mission, Param, WorldBounds};
    use crate::core::plan::PlanResult;
    use crate::core::types::Point3;
    use crate::distance_field::NoObstacles;
    use crate::error::VyuhaError;

    use super::*;

    fn planner(agents: usize, downwash: f64) -> CorridorPlanner<NoObstacles> {
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
        let param = Param {
            downwash,
            ..Param::default()
        };
        CorridorPlanner::new(NoObstacles, mission, param).unwrap()
    }

    #[test]
    fn test_lateral_pair_separates_along_y() {
        let planner = planner(2, 1.0);
        let mut result = PlanResult::from_trajectories(vec![
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)],
            vec![Point3::new(0.0, 5.0, 0.0), Point3::new(0.0, 5.0, 0.0)],
        ]);
        result.time_points = vec![0.0, 10.0];

        planner.build_relative_corridors(&mut result).unwrap();

        let entries = &result.rsfc[0][1];
        assert_eq!(entries.len(), 1);
        assert_relative_eq!(entries[0].normal.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(entries[0].normal.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(entries[0].normal.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(entries[0].end_time, 10.0);
    }

    #[test]
    fn test_vertical_pair_normal_carries_inverse_downwash() {
        let planner = planner(2, 2.0);
        let mut result = PlanResult::from_trajectories(vec![
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            vec![Point3::new(0.0, 0.0, 3.0), Point3::new(1.0, 0.0, 3.0)],
        ]);
        result.time_points = vec![0.0, 1.0];

        planner.build_relative_corridors(&mut result).unwrap();

        let n = result.rsfc[0][1][0].normal;
        assert_relative_eq!(n.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(n.y, 0.0, epsilon = 1e-12);
        // unit in the scaled frame, then z divided by the downwash factor
        assert_relative_eq!(n.z, 0.5, epsilon = 1e-12);
        // unit magnitude in the downwash-scaled metric
        let scaled = (n.x * n.x + n.y * n.y + (n.z * 2.0) * (n.z * 2.0)).sqrt();
        assert_relative_eq!(scaled, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_coincident_agents_are_rejected() {
        let planner = planner(2, 1.0);
        let traj = vec![Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 1.0, 1.0)];
        let mut result = PlanResult::from_trajectories(vec![traj.clone(), traj]);
        result.time_points = vec![0.0, 1.0];

        let err = planner.build_relative_corridors(&mut result).unwrap_err();
        assert!(matches!(err, VyuhaError::AgentsCoincide { first: 0, second: 1, .. }));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let planner = planner(2, 1.0);
        let mut result = PlanResult::from_trajectories(vec![
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            vec![
                Point3::new(0.0, 5.0, 0.0),
                Point3::new(0.0, 5.0, 0.0),
                Point3::new(0.0, 5.0, 0.0),
            ],
        ]);
        result.time_points = vec![0.0, 1.0];

        let err = planner.build_relative_corridors(&mut result).unwrap_err();
        assert!(matches!(
            err,
            VyuhaError::LengthMismatch {
                first: 0,
                second: 1,
                len_first: 2,
                len_second: 3,
            }
        ));
    }
}
