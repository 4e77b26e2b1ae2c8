//! Mission and parameter configuration for corridor generation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::{Box3, Point3};
use crate::error::{Result, VyuhaError};

/// World bounding box as six flat extents, the shape used in mission files.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WorldBounds {
    /// Low x extent in meters (default: -5.0)
    #[serde(default = "default_world_min")]
    pub x_min: f64,
    /// Low y extent in meters (default: -5.0)
    #[serde(default = "default_world_min")]
    pub y_min: f64,
    /// Low z extent in meters (default: 0.0)
    #[serde(default = "default_world_z_min")]
    pub z_min: f64,
    /// High x extent in meters (default: 5.0)
    #[serde(default = "default_world_max")]
    pub x_max: f64,
    /// High y extent in meters (default: 5.0)
    #[serde(default = "default_world_max")]
    pub y_max: f64,
    /// High z extent in meters (default: 2.5)
    #[serde(default = "default_world_z_max")]
    pub z_max: f64,
}

impl WorldBounds {
    /// The bounds as a box.
    pub fn to_box(&self) -> Box3 {
        Box3::new(
            Point3::new(self.x_min, self.y_min, self.z_min),
            Point3::new(self.x_max, self.y_max, self.z_max),
        )
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            x_min: default_world_min(),
            y_min: default_world_min(),
            z_min: default_world_z_min(),
            x_max: default_world_max(),
            y_max: default_world_max(),
            z_max: default_world_z_max(),
        }
    }
}

/// Swarm mission description: the agents and the world they fly in.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Mission {
    /// Number of agents in the swarm
    #[serde(default)]
    pub agent_count: usize,

    /// Per-agent clearance radius in meters, one entry per agent.
    ///
    /// The radius an obstacle may not approach the agent's nominal path; for
    /// quadrotors this is the collision-model radius, not the airframe size.
    #[serde(default)]
    pub agent_radius: Vec<f64>,

    /// World bounding box
    #[serde(default)]
    pub world: WorldBounds,
}

impl Mission {
    /// Validate the mission shape.
    pub fn validate(&self) -> Result<()> {
        if self.agent_radius.len() != self.agent_count {
            return Err(VyuhaError::Config(format!(
                "mission declares {} agents but {} radii",
                self.agent_count,
                self.agent_radius.len()
            )));
        }
        if let Some(r) = self.agent_radius.iter().find(|r| !(**r > 0.0)) {
            return Err(VyuhaError::Config(format!(
                "agent radius must be positive, got {r}"
            )));
        }
        let w = &self.world;
        if w.x_min >= w.x_max || w.y_min >= w.y_max || w.z_min >= w.z_max {
            return Err(VyuhaError::Config(
                "world bounds must have positive extent on every axis".to_string(),
            ));
        }
        Ok(())
    }
}

/// Corridor generation parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Param {
    /// Horizontal lattice resolution for obstacle boxes (meters).
    ///
    /// Box faces advance and obstacle samples are spaced by this step on the
    /// x and y axes.
    #[serde(default = "default_box_xy_res")]
    pub box_xy_res: f64,

    /// Vertical lattice resolution for obstacle boxes (meters).
    #[serde(default = "default_box_z_res")]
    pub box_z_res: f64,

    /// Horizontal grid resolution for relative-direction discretization (meters).
    ///
    /// The sum of two agents' radii should stay well below this, otherwise a
    /// one-cell relative displacement cannot guarantee separation.
    #[serde(default = "default_grid_xy_res")]
    pub grid_xy_res: f64,

    /// Vertical grid resolution for relative-direction discretization (meters).
    #[serde(default = "default_grid_z_res")]
    pub grid_z_res: f64,

    /// Downwash factor (> 0, dimensionless).
    ///
    /// Vertical separation between agents is divided by this factor, making
    /// vertical clearance cheaper to guarantee than horizontal clearance.
    #[serde(default = "default_downwash")]
    pub downwash: f64,

    /// Duration of one discrete path step in seconds (flat mode).
    #[serde(default = "default_time_step")]
    pub time_step: f64,

    /// Geometric tolerance for containment and boundary tests.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Sampling tolerance: lattice loop bounds, face sample offsets, margin
    /// slack, and the dead band of the relative-direction sign.
    #[serde(default = "default_sample_epsilon")]
    pub sample_epsilon: f64,
}

impl Param {
    /// Validate the parameter set.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("box_xy_res", self.box_xy_res),
            ("box_z_res", self.box_z_res),
            ("grid_xy_res", self.grid_xy_res),
            ("grid_z_res", self.grid_z_res),
            ("downwash", self.downwash),
            ("time_step", self.time_step),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(VyuhaError::Config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.epsilon < 0.0 || self.sample_epsilon < 0.0 {
            return Err(VyuhaError::Config(
                "tolerances must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Param {
    fn default() -> Self {
        Self {
            box_xy_res: default_box_xy_res(),
            box_z_res: default_box_z_res(),
            grid_xy_res: default_grid_xy_res(),
            grid_z_res: default_grid_z_res(),
            downwash: default_downwash(),
            time_step: default_time_step(),
            epsilon: default_epsilon(),
            sample_epsilon: default_sample_epsilon(),
        }
    }
}

/// Top-level configuration file: a mission plus the planner parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VyuhaConfig {
    /// Swarm mission
    pub mission: Mission,
    /// Planner parameters
    #[serde(default)]
    pub param: Param,
}

impl VyuhaConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VyuhaError::Config(format!("Failed to read config file: {}", e)))?;
        let config: VyuhaConfig = toml::from_str(&content)?;
        config.mission.validate()?;
        config.param.validate()?;
        Ok(config)
    }
}

// Default value functions

fn default_world_min() -> f64 {
    -5.0
}
fn default_world_max() -> f64 {
    5.0
}
fn default_world_z_min() -> f64 {
    0.0
}
fn default_world_z_max() -> f64 {
    2.5
}
fn default_box_xy_res() -> f64 {
    0.1
}
fn default_box_z_res() -> f64 {
    0.1
}
fn default_grid_xy_res() -> f64 {
    0.5
}
fn default_grid_z_res() -> f64 {
    0.5
}
fn default_downwash() -> f64 {
    2.0
}
fn default_time_step() -> f64 {
    1.0
}
fn default_epsilon() -> f64 {
    1e-9
}
fn default_sample_epsilon() -> f64 {
    1e-4
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_param_defaults_are_valid() {
        assert!(Param::default().validate().is_ok());
    }

    #[test]
    fn test_param_rejects_zero_downwash() {
        let param = Param {
            downwash: 0.0,
            ..Param::default()
        };
        assert!(matches!(param.validate(), Err(VyuhaError::Config(_))));
    }

    #[test]
    fn test_mission_radius_count_must_match() {
        let mission = Mission {
            agent_count: 2,
            agent_radius: vec![0.15],
            world: WorldBounds::default(),
        };
        assert!(matches!(mission.validate(), Err(VyuhaError::Config(_))));
    }

    #[test]
    fn test_mission_rejects_inverted_world() {
        let mission = Mission {
            agent_count: 0,
            agent_radius: Vec::new(),
            world: WorldBounds {
                x_min: 5.0,
                x_max: -5.0,
                ..WorldBounds::default()
            },
        };
        assert!(mission.validate().is_err());
    }

    #[test]
    fn test_load_config_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [mission]
            agent_count = 2
            agent_radius = [0.15, 0.2]

            [mission.world]
            x_min = -4.0
            x_max = 4.0

            [param]
            downwash = 2.5
            time_step = 0.5
            "#
        )
        .unwrap();

        let config = VyuhaConfig::load(file.path()).unwrap();
        assert_eq!(config.mission.agent_count, 2);
        assert_eq!(config.mission.world.x_min, -4.0);
        // unspecified fields fall back to defaults
        assert_eq!(config.mission.world.y_min, -5.0);
        assert_eq!(config.param.downwash, 2.5);
        assert_eq!(config.param.box_xy_res, 0.1);
    }

    #[test]
    fn test_load_rejects_bad_shape() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [mission]
            agent_count = 3
            agent_radius = [0.15]
            "#
        )
        .unwrap();

        assert!(VyuhaConfig::load(file.path()).is_err());
    }
}
