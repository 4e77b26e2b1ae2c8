//! Obstacle corridor construction: per-agent sequences of free boxes with
//! time validity.

use std::time::Instant;

use crate::core::plan::{PlanResult, SfcEntry};
use crate::core::types::{Box3, Point3};
use crate::distance_field::DistanceField;
use crate::error::{Result, VyuhaError};

use super::CorridorPlanner;

/// How seed boxes are derived from a waypoint pair.
#[derive(Clone, Copy, PartialEq, Eq)]
enum SeedMode {
    /// Snap both corners to the box lattice
    Snapped,
    /// Inflate the raw corners by half a grid step
    HalfStep,
}

impl<F: DistanceField> CorridorPlanner<F> {
    /// Build the continuous-time safe flight corridors for every agent.
    ///
    /// Box end times are read straight out of `result.time_points`, so each
    /// agent needs at least one breakpoint per trajectory sample.
    pub(crate) fn build_obstacle_corridors(
        &self,
        verbose: bool,
        result: &mut PlanResult,
        makespan: f64,
    ) -> Result<()> {
        let started = Instant::now();

        result.sfc = vec![Vec::new(); self.mission.agent_count];
        for qi in 0..self.mission.agent_count {
            let traj = &result.init_traj[qi];
            if result.time_points.len() < traj.len() {
                tracing::error!(
                    "agent {qi}: breakpoint sequence shorter than the trajectory"
                );
                return Err(VyuhaError::TimePointMismatch {
                    agent: qi,
                    samples: traj.len(),
                    time_points: result.time_points.len(),
                });
            }

            let boxes = self.trace_boxes(qi, traj, SeedMode::Snapped)?;
            let coverage = coverage_table(&boxes, traj, self.param.epsilon);
            if verbose {
                dump_coverage(qi, &coverage);
            }

            let end_times = assign_end_times(&coverage, &result.time_points, makespan);
            result.sfc[qi] = boxes
                .into_iter()
                .zip(end_times)
                .map(|(region, end_time)| SfcEntry { region, end_time })
                .collect();
        }

        tracing::debug!(
            "obstacle corridors: {} agents, {:.3}ms",
            self.mission.agent_count,
            started.elapsed().as_secs_f64() * 1e3
        );
        Ok(())
    }

    /// Build the flat-mode safe flight corridors for every agent.
    ///
    /// End times are path indices scaled by the time step; the overlap
    /// midpoints feeding them are also pushed into `breakpoints` for the
    /// shared sequence.
    pub(crate) fn build_flat_obstacle_corridors(
        &self,
        verbose: bool,
        result: &mut PlanResult,
        makespan: usize,
        breakpoints: &mut Vec<f64>,
    ) -> Result<()> {
        let started = Instant::now();

        result.sfc = vec![Vec::new(); self.mission.agent_count];
        for qi in 0..self.mission.agent_count {
            let traj = &result.init_traj[qi];
            let boxes = self.trace_boxes(qi, traj, SeedMode::HalfStep)?;
            let coverage = coverage_table(&boxes, traj, self.param.epsilon);
            if verbose {
                dump_coverage(qi, &coverage);
            }

            let end_times = assign_flat_end_times(
                &coverage,
                self.param.time_step,
                makespan,
                breakpoints,
            );
            result.sfc[qi] = boxes
                .into_iter()
                .zip(end_times)
                .map(|(region, end_time)| SfcEntry { region, end_time })
                .collect();
        }

        tracing::debug!(
            "flat obstacle corridors: {} agents, {:.3}ms",
            self.mission.agent_count,
            started.elapsed().as_secs_f64() * 1e3
        );
        Ok(())
    }

    /// Walk a trajectory and emit the minimal ordered box sequence covering
    /// it.
    ///
    /// A new box is seeded from each consecutive waypoint pair not already
    /// enclosed by the previous box, then inflated. A seed that violates the
    /// agent's clearance means the upstream path itself is infeasible.
    fn trace_boxes(&self, agent: usize, traj: &[Point3], mode: SeedMode) -> Result<Vec<Box3>> {
        let margin = self.mission.agent_radius[agent];
        let mut boxes: Vec<Box3> = Vec::new();
        let mut prev: Option<Box3> = None;

        for pair in traj.windows(2) {
            let (curr, next) = (pair[0], pair[1]);
            if prev.is_some_and(|p| p.contains(next, self.param.epsilon)) {
                continue;
            }

            let seed = match mode {
                SeedMode::Snapped => self.snapped_seed(curr, next),
                SeedMode::HalfStep => self.half_step_seed(curr, next),
            };
            if self.obstacle_in_box(&seed, margin) {
                tracing::error!(
                    "agent {agent}: obstacle invades the initial trajectory near {curr}"
                );
                return Err(VyuhaError::InfeasibleTrajectory {
                    agent,
                    position: curr,
                });
            }

            let mut region = seed;
            self.expand_box(&mut region, margin);
            boxes.push(region);
            prev = Some(region);
        }

        Ok(boxes)
    }

    /// Bounding box of the pair with both corners snapped to the box lattice.
    fn snapped_seed(&self, a: Point3, b: Point3) -> Box3 {
        let xy = self.param.box_xy_res;
        let z = self.param.box_z_res;
        let snap = |v: f64, res: f64| (v / res).round() * res;

        Box3::new(
            Point3::new(
                snap(a.x.min(b.x), xy),
                snap(a.y.min(b.y), xy),
                snap(a.z.min(b.z), z),
            ),
            Point3::new(
                snap(a.x.max(b.x), xy),
                snap(a.y.max(b.y), xy),
                snap(a.z.max(b.z), z),
            ),
        )
    }

    /// Bounding box of the pair inflated by half a grid step per axis.
    fn half_step_seed(&self, a: Point3, b: Point3) -> Box3 {
        let hx = self.param.box_xy_res / 2.0;
        let hz = self.param.box_z_res / 2.0;

        Box3::new(
            Point3::new(
                a.x.min(b.x) - hx,
                a.y.min(b.y) - hx,
                a.z.min(b.z) - hz,
            ),
            Point3::new(
                a.x.max(b.x) + hx,
                a.y.max(b.y) + hx,
                a.z.max(b.z) + hz,
            ),
        )
    }
}

/// Run-length containment table: `table[i][j]` counts how many consecutive
/// waypoints up to `j` lie inside box `i`, 0 when `j` itself is outside.
fn coverage_table(boxes: &[Box3], traj: &[Point3], eps: f64) -> Vec<Vec<u32>> {
    let mut table = vec![vec![0u32; traj.len()]; boxes.len()];
    for (row, region) in table.iter_mut().zip(boxes) {
        for (j, point) in traj.iter().enumerate() {
            if region.contains(*point, eps) {
                row[j] = if j == 0 { 1 } else { row[j - 1] + 1 };
            }
        }
    }
    table
}

fn dump_coverage(agent: usize, table: &[Vec<u32>]) {
    for (i, row) in table.iter().enumerate() {
        tracing::debug!("agent {agent} box {i} coverage {row:?}");
    }
}

/// Assign continuous-mode end times: walk waypoints with a box cursor, hand
/// each box over at the midpoint of its overlap window with the next box and
/// stamp the final box with the makespan.
///
/// The cursor backs up one box and one waypoint when the current box stops
/// covering the walk, which re-anchors the walk after skipped waypoints.
fn assign_end_times(table: &[Vec<u32>], time_points: &[f64], makespan: f64) -> Vec<f64> {
    let box_max = table.len();
    let path_max = table.first().map_or(0, Vec::len);
    let mut end_times: Vec<Option<f64>> = vec![None; box_max];
    if box_max == 0 {
        return Vec::new();
    }

    let mut bi: isize = 0;
    let mut pi: isize = 0;
    while (pi as usize) < path_max {
        if bi == box_max as isize - 1 {
            if table[bi as usize][pi as usize] > 0 {
                pi += 1;
                continue;
            }
            bi -= 1;
        }
        if bi < 0 {
            break;
        }
        let (b, p) = (bi as usize, pi as usize);

        if table[b][p] > 0 && table[b + 1][p] > 0 {
            let mut count = 1;
            while p + count < path_max && table[b][p + count] > 0 && table[b + 1][p + count] > 0 {
                count += 1;
            }
            end_times[b] = Some(time_points[p + count / 2]);
            pi += (count / 2) as isize;
            bi += 1;
        } else if table[b][p] == 0 {
            bi -= 1;
            pi -= 1;
        }
        pi += 1;
    }

    end_times[box_max - 1] = Some(makespan);
    end_times
        .into_iter()
        .map(|t| t.unwrap_or(makespan))
        .collect()
}

/// Assign flat-mode end times in the path-index domain.
///
/// Simpler than the continuous walk: boxes hand over at integer-halved
/// overlap midpoints, which are scaled by the time step and recorded as
/// shared breakpoints; the final box ends at the scaled makespan.
fn assign_flat_end_times(
    table: &[Vec<u32>],
    time_step: f64,
    makespan: usize,
    breakpoints: &mut Vec<f64>,
) -> Vec<f64> {
    let box_max = table.len();
    let path_max = table.first().map_or(0, Vec::len);
    let mut end_times: Vec<Option<f64>> = vec![None; box_max];
    if box_max == 0 {
        return Vec::new();
    }

    let mut bi = 0usize;
    let mut pi = 0usize;
    while pi < path_max {
        if bi >= box_max - 1 {
            break;
        }
        if table[bi][pi] > 0 && table[bi + 1][pi] > 0 {
            let mut count = 1;
            while pi + count < path_max
                && table[bi][pi + count] > 0
                && table[bi + 1][pi + count] > 0
            {
                count += 1;
            }
            let mid = pi + count / 2;
            end_times[bi] = Some(mid as f64 * time_step);
            breakpoints.push(mid as f64);

            pi += count / 2;
            bi += 1;
        }
        pi += 1;
    }

    let last = makespan as f64 * time_step;
    end_times[box_max - 1] = Some(last);
    end_times.into_iter().map(|t| t.unwrap_or(last)).collect()
}
