use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::vector_math::{AUTHORIZED_LENGTHS, is_authorized_length};

pub const CONFIG_PATH_ENV: &str = "CRYPTRIS_CONFIG_PATH";

/// Generation parameters for one board length.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LengthParams {
    /// Signed rotations of the private key folded into the public key.
    pub public_key_repetitions: u32,
    /// Signed rotations of the public key added when encrypting text.
    pub message_repetitions: u32,
    /// Signed rotations of the private key summed into a solvable puzzle.
    pub puzzle_steps: u32,
}

/// Pixel sizing used to time the falling animation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardGeometry {
    pub available_height: i32,
    pub block_height: i32,
    pub spacing: i32,
    /// Pixels advanced per tick while falling.
    pub fall_speed: i32,
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self {
            available_height: 680,
            block_height: 30,
            spacing: 4,
            fall_speed: 20,
        }
    }
}

impl BoardGeometry {
    pub fn stack_height(&self, blocks: u32) -> i32 {
        blocks as i32 * (self.block_height + self.spacing)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpponentSettings {
    #[serde(with = "crate::serde_duration")]
    pub start_delay: Duration,
    #[serde(with = "crate::serde_duration")]
    pub move_interval: Duration,
    /// Random rotate/invert moves queued before each drop.
    pub plan_length: usize,
}

impl Default for OpponentSettings {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(1000),
            move_interval: Duration::from_millis(500),
            plan_length: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_length_params")]
    pub lengths: BTreeMap<usize, LengthParams>,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    #[serde(default = "default_max_key_attempts")]
    pub max_key_attempts: u32,
    #[serde(default = "default_max_fixup_attempts")]
    pub max_fixup_attempts: u32,
    #[serde(default)]
    pub geometry: BoardGeometry,
    #[serde(default)]
    pub opponent: OpponentSettings,
    #[serde(default, with = "crate::serde_duration::option")]
    pub round_limit: Option<Duration>,
    #[serde(default, with = "crate::serde_duration::option")]
    pub auto_drop_interval: Option<Duration>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            lengths: default_length_params(),
            score_threshold: default_score_threshold(),
            max_key_attempts: default_max_key_attempts(),
            max_fixup_attempts: default_max_fixup_attempts(),
            geometry: BoardGeometry::default(),
            opponent: OpponentSettings::default(),
            round_limit: None,
            auto_drop_interval: None,
        }
    }
}

impl GameConfig {
    pub fn params(&self, length: usize) -> Result<LengthParams, ConfigError> {
        if !is_authorized_length(length) {
            return Err(ConfigError::UnsupportedLength(length));
        }
        self.lengths
            .get(&length)
            .copied()
            .ok_or(ConfigError::MissingLength {
                table: "lengths",
                length,
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.score_threshold.is_finite() && self.score_threshold > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "score_threshold",
                reason: format!("must be a positive number, got {}", self.score_threshold),
            });
        }
        if self.max_key_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_key_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_fixup_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_fixup_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.geometry.fall_speed <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "geometry.fall_speed",
                reason: format!("must be positive, got {}", self.geometry.fall_speed),
            });
        }
        if let Some(&length) = self.lengths.keys().find(|l| !is_authorized_length(**l)) {
            return Err(ConfigError::UnsupportedLength(length));
        }
        for length in AUTHORIZED_LENGTHS {
            self.params(length)?;
        }
        Ok(())
    }

    /// Clamps values a hand-edited file may push out of range.
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.geometry.block_height = self.geometry.block_height.max(1);
        self.geometry.spacing = self.geometry.spacing.max(0);
        self.geometry.fall_speed = self.geometry.fall_speed.max(1);
        self.opponent.plan_length = self.opponent.plan_length.max(1);
        self.max_key_attempts = self.max_key_attempts.max(1);
        self.max_fixup_attempts = self.max_fixup_attempts.max(1);
        for params in self.lengths.values_mut() {
            params.puzzle_steps = params.puzzle_steps.max(1);
        }
        self
    }
}

fn default_version() -> u32 {
    1
}

fn default_score_threshold() -> f64 {
    2.0
}

fn default_max_key_attempts() -> u32 {
    100
}

fn default_max_fixup_attempts() -> u32 {
    1000
}

fn default_length_params() -> BTreeMap<usize, LengthParams> {
    [(8, 3, 1), (10, 7, 2), (12, 8, 3), (14, 9, 4), (16, 10, 5)]
        .into_iter()
        .map(|(length, public_key_repetitions, message_repetitions)| {
            (
                length,
                LengthParams {
                    public_key_repetitions,
                    message_repetitions,
                    puzzle_steps: crate::puzzle::default_puzzle_steps(length),
                },
            )
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os(CONFIG_PATH_ENV) {
            return Self::new(explicit);
        }

        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| {
                    let mut p = PathBuf::from(home);
                    p.push(".config");
                    p
                })
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let mut path = base;
        path.push("cryptris");
        path.push("config.json");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the defaults; anything else unreadable is an error.
    pub fn load(&self) -> Result<GameConfig, ConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(GameConfig::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let config = serde_json::from_slice::<GameConfig>(&bytes)
            .map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?
            .sanitized();
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(&self) -> GameConfig {
        self.load().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "falling back to default config");
            GameConfig::default()
        })
    }

    pub fn save(&self, config: &GameConfig) -> Result<(), ConfigError> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let text = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, text).map_err(io_err)
    }
}
