//! Greedy face-by-face box inflation against the obstacle field.

use std::collections::VecDeque;

use crate::core::types::{Box3, Face, Point3};
use crate::distance_field::DistanceField;

use super::CorridorPlanner;

impl<F: DistanceField> CorridorPlanner<F> {
    /// Whether any lattice sample inside `region` is closer than `margin` to
    /// an obstacle.
    ///
    /// Samples cover the box at the configured resolutions, faces included.
    /// Sample coordinates are nudged inward by the sampling tolerance, except
    /// the first sample along each axis: when the low face lies strictly
    /// inside the world it is taken just *outside* the face, so an obstacle
    /// flush against the face is still seen.
    pub(crate) fn obstacle_in_box(&self, region: &Box3, margin: f64) -> bool {
        let eps = self.param.sample_epsilon;

        let mut xi = region.min.x;
        let mut first_x = true;
        while xi < region.max.x + eps {
            let x = if first_x && region.min.x > self.world.min.x + eps {
                region.min.x - eps
            } else {
                xi + eps
            };

            let mut yi = region.min.y;
            let mut first_y = true;
            while yi < region.max.y + eps {
                let y = if first_y && region.min.y > self.world.min.y + eps {
                    region.min.y - eps
                } else {
                    yi + eps
                };

                let mut zi = region.min.z;
                let mut first_z = true;
                while zi < region.max.z + eps {
                    let z = if first_z && region.min.z > self.world.min.z + eps {
                        region.min.z - eps
                    } else {
                        zi + eps
                    };

                    let dist = self.distance_field.distance(Point3::new(x, y, z));
                    if dist < margin - eps {
                        return true;
                    }

                    first_z = false;
                    zi += self.param.box_z_res;
                }
                first_y = false;
                yi += self.param.box_xy_res;
            }
            first_x = false;
            xi += self.param.box_xy_res;
        }

        false
    }

    /// Grow `region` outward face by face until every face is blocked by an
    /// obstacle or the world boundary.
    ///
    /// Candidate faces cycle through a work queue. Each round pops the next
    /// face, moves it outward by one grid step and tests the delta slab swept
    /// by the move: if the slab is free of obstacles (within `margin`) and the
    /// grown box stays inside the world, the move commits and the face goes
    /// back in the queue; otherwise the face is saturated and dropped for
    /// good. Greedy and order-dependent, so the result is maximal per face
    /// but not globally volume-optimal; the fixed queue order keeps it
    /// deterministic.
    pub(crate) fn expand_box(&self, region: &mut Box3, margin: f64) {
        let mut faces: VecDeque<Face> = Face::ALL.into_iter().collect();

        while let Some(face) = faces.pop_front() {
            let step = if face.is_vertical() {
                self.param.box_z_res
            } else {
                self.param.box_xy_res
            };

            let mut grown = *region;
            let slab = match face {
                Face::XMin => {
                    grown.min.x -= step;
                    Box3::new(grown.min, Point3::new(region.min.x, grown.max.y, grown.max.z))
                }
                Face::YMin => {
                    grown.min.y -= step;
                    Box3::new(grown.min, Point3::new(grown.max.x, region.min.y, grown.max.z))
                }
                Face::ZMin => {
                    grown.min.z -= step;
                    Box3::new(grown.min, Point3::new(grown.max.x, grown.max.y, region.min.z))
                }
                Face::XMax => {
                    grown.max.x += step;
                    Box3::new(Point3::new(region.max.x, grown.min.y, grown.min.z), grown.max)
                }
                Face::YMax => {
                    grown.max.y += step;
                    Box3::new(Point3::new(grown.min.x, region.max.y, grown.min.z), grown.max)
                }
                Face::ZMax => {
                    grown.max.z += step;
                    Box3::new(Point3::new(grown.min.x, grown.min.y, region.max.z), grown.max)
                }
            };

            if !self.obstacle_in_box(&slab, margin) && grown.within(&self.world, self.param.epsilon)
            {
                *region = grown;
                faces.push_back(face);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::config::{Mission, Param, WorldBounds};
    use crate::core::types::{Box3, Point3};
    use crate::distance_field::{NoObstacles, PointObstacles};

    use super::*;

    fn small_world_mission() -> Mission {
        Mission {
            agent_count: 1,
            agent_radius: vec![0.15],
            world: WorldBounds {
                x_min: -1.0,
                y_min: -1.0,
                z_min: 0.0,
                x_max: 1.0,
                y_max: 1.0,
                z_max: 1.0,
            },
        }
    }

    #[test]
    fn test_expand_saturates_at_world_bounds() {
        let planner =
            CorridorPlanner::new(NoObstacles, small_world_mission(), Param::default()).unwrap();

        let mut region = Box3::from_corners(
            Point3::new(0.0, 0.0, 0.5),
            Point3::new(0.1, 0.1, 0.5),
        );
        planner.expand_box(&mut region, 0.15);

        assert_relative_eq!(region.min.x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(region.min.y, -1.0, epsilon = 1e-9);
        assert_relative_eq!(region.min.z, 0.0, epsilon = 1e-9);
        assert_relative_eq!(region.max.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(region.max.y, 1.0, epsilon = 1e-9);
        assert_relative_eq!(region.max.z, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_expand_stops_at_obstacle() {
        // wall of obstacle points at x = 0.5, z = 0.5
        let wall: Vec<Point3> = (0..=20)
            .map(|i| Point3::new(0.5, -1.0 + 0.1 * i as f64, 0.5))
            .collect();
        let planner = CorridorPlanner::new(
            PointObstacles::new(wall),
            small_world_mission(),
            Param::default(),
        )
        .unwrap();

        let mut region = Box3::from_corners(
            Point3::new(-0.1, 0.0, 0.5),
            Point3::new(0.0, 0.1, 0.5),
        );
        planner.expand_box(&mut region, 0.15);

        // the +x face cannot reach the wall: every lattice sample must keep
        // the 0.15 margin from the obstacle line
        assert!(region.max.x < 0.5 - 0.15 + 0.1 + 1e-6);
        assert_relative_eq!(region.min.x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(region.max.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_obstacle_in_box_sees_face_adjacent_obstacle() {
        let planner = CorridorPlanner::new(
            PointObstacles::new(vec![Point3::new(0.3, 0.3, 0.5)]),
            small_world_mission(),
            Param::default(),
        )
        .unwrap();

        let hit = Box3::from_corners(Point3::new(0.2, 0.2, 0.4), Point3::new(0.4, 0.4, 0.6));
        assert!(planner.obstacle_in_box(&hit, 0.15));

        let clear = Box3::from_corners(Point3::new(-0.8, -0.8, 0.2), Point3::new(-0.5, -0.5, 0.4));
        assert!(!planner.obstacle_in_box(&clear, 0.15));
    }

    #[test]
    fn test_obstacle_in_box_respects_margin() {
        let planner = CorridorPlanner::new(
            PointObstacles::new(vec![Point3::new(0.9, 0.0, 0.5)]),
            small_world_mission(),
            Param::default(),
        )
        .unwrap();

        let region = Box3::from_corners(Point3::new(-0.2, -0.2, 0.4), Point3::new(0.2, 0.2, 0.6));
        // nearest sample is ~0.7m away: fine with a small margin, fatal with
        // a large one
        assert!(!planner.obstacle_in_box(&region, 0.15));
        assert!(planner.obstacle_in_box(&region, 0.8));
    }
}
