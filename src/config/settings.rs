//! Runtime engine configuration.
//!
//! Every field defaults to the constant of the same concern, so a JSON file
//! only needs to name what it overrides.

use std::path::Path;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{grid, mirror, movement, pool, server};
use crate::game::types::{Axis, Vec3};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    pub spacing: f32,
    pub origin: Vec3,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: grid::GRID_ROW,
            cols: grid::GRID_COL,
            spacing: grid::SLOT_SPACING,
            origin: grid::GRID_ORIGIN.into(),
            offset_x: grid::SLOT_OFFSET_X,
            offset_y: grid::SLOT_OFFSET_Y,
        }
    }
}

impl GridConfig {
    pub fn slot_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Slot centers in row-major order starting at `origin`.
    pub fn slot_centers(&self) -> Vec<Vec3> {
        (0..self.rows)
            .flat_map(|row| {
                (0..self.cols).map(move |col| {
                    Vec3::new(
                        self.origin.x + col as f32 * self.spacing,
                        self.origin.y + row as f32 * self.spacing,
                        self.origin.z,
                    )
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub character_speed: f32,
    pub monster_speed: f32,
    pub reached_distance: f32,
    pub drag_threshold_px: f32,
    pub character_hp: f32,
    pub monster_hp: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            character_speed: movement::CHARACTER_MOVE_SPEED,
            monster_speed: movement::MONSTER_MOVE_SPEED,
            reached_distance: movement::REACHED_DISTANCE,
            drag_threshold_px: movement::DRAG_THRESHOLD_PX,
            character_hp: movement::CHARACTER_HP,
            monster_hp: movement::MONSTER_HP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub size_per_kind: usize,
    pub sentinel: Vec3,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size_per_kind: pool::POOL_SIZE_PER_KIND,
            sentinel: pool::POOL_SENTINEL.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub enabled: bool,
    pub axis: Axis,
    pub offset: f32,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: mirror::ENABLE_MIRRORING,
            axis: Axis::Y,
            offset: mirror::MIRROR_AXIS_OFFSET,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    pub interval_ms: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval_ms: server::TICK_INTERVAL_MS,
        }
    }
}

impl TickConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_peers_per_room: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: server::RELAY_BIND_ADDR.0.to_string(),
            port: server::RELAY_BIND_ADDR.1,
            max_peers_per_room: server::MAX_PEERS_PER_ROOM,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub movement: MovementConfig,
    pub pool: PoolConfig,
    pub mirror: MirrorConfig,
    pub tick: TickConfig,
    pub server: ServerConfig,
}

impl EngineConfig {
    /// Load a JSON config file; missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load from the file named by `DUEL_GRID_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(server::CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => {
                info!("[Config] Loading engine config from {}", path);
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }
}
