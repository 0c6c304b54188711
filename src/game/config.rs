use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::grid::TokenType;

const MAX_DIMENSION: usize = 32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoardPreset {
    Standard,
    Compact,
}

impl FromStr for BoardPreset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "default" => Ok(BoardPreset::Standard),
            "compact" | "narrow" => Ok(BoardPreset::Compact),
            _ => Err(()),
        }
    }
}

/// 棋盘模式：`Classic` 不含骷髅符文，也不结算战斗。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoardMode {
    Battle,
    Classic,
}

impl Default for BoardMode {
    fn default() -> Self {
        BoardMode::Battle
    }
}

impl BoardMode {
    pub fn palette(self) -> &'static [TokenType] {
        match self {
            BoardMode::Battle => &TokenType::BATTLE_PALETTE,
            BoardMode::Classic => &TokenType::CLASSIC_PALETTE,
        }
    }

    pub fn has_battle(self) -> bool {
        matches!(self, BoardMode::Battle)
    }
}

/// 棋盘像素坐标下的格子尺寸。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CellMetrics {
    pub width: f32,
    pub height: f32,
    pub visual_scale: f32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            width: 110.0,
            height: 144.0,
            visual_scale: 0.8,
        }
    }
}

/// 战斗数值，默认值即符文效果表。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BattleConfig {
    pub hero_max_hp: u32,
    pub enemy_max_hp: u32,
    pub hero_max_mana: u32,
    pub hero_start_mana: u32,
    pub red_damage: u32,
    pub blue_heal: u32,
    pub green_mana: u32,
    pub skull_damage: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            hero_max_hp: 100,
            enemy_max_hp: 100,
            hero_max_mana: 100,
            hero_start_mana: 0,
            red_damage: 10,
            blue_heal: 5,
            green_mana: 10,
            skull_damage: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    pub decay_rate: f32,
    pub max_dt: f32,
    /// 世界单位。
    pub snap_epsilon: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            decay_rate: 12.0,
            max_dt: 0.1,
            snap_epsilon: 0.002,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoardConfig {
    pub rows: usize,
    pub cols: usize,
    pub mode: BoardMode,
    pub cell: CellMetrics,
    pub battle: BattleConfig,
    pub animation: AnimationConfig,
    pub max_fill_attempts: u32,
    pub max_cascade_passes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ConfigError {
    InvalidDimensions { rows: usize, cols: usize },
    InvalidCellMetrics { width: f32, height: f32 },
    InvalidBattleStat { field: String },
    InvalidAnimation { field: String },
    InvalidLimit { field: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidDimensions { rows, cols } => {
                write!(f, "board dimensions {rows}x{cols} out of range")
            }
            ConfigError::InvalidCellMetrics { width, height } => {
                write!(f, "cell size {width}x{height} must be positive")
            }
            ConfigError::InvalidBattleStat { field } => write!(f, "invalid battle stat `{field}`"),
            ConfigError::InvalidAnimation { field } => {
                write!(f, "invalid animation setting `{field}`")
            }
            ConfigError::InvalidLimit { field } => write!(f, "limit `{field}` must be non-zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl BoardConfig {
    pub fn from_preset(preset: BoardPreset) -> Self {
        let (rows, cols) = match preset {
            BoardPreset::Standard => (8, 7),
            BoardPreset::Compact => (8, 5),
        };
        Self {
            rows,
            cols,
            mode: BoardMode::Battle,
            cell: CellMetrics::default(),
            battle: BattleConfig::default(),
            animation: AnimationConfig::default(),
            max_fill_attempts: 100_000,
            max_cascade_passes: 1_000,
        }
    }

    pub fn with_mode(mut self, mode: BoardMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_dimensions(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    pub fn palette(&self) -> &'static [TokenType] {
        self.mode.palette()
    }

    pub fn board_pixel_size(&self) -> (f32, f32) {
        (
            self.cols as f32 * self.cell.width,
            self.rows as f32 * self.cell.height,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 || self.rows > MAX_DIMENSION || self.cols > MAX_DIMENSION
        {
            return Err(ConfigError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !(self.cell.width > 0.0 && self.cell.height > 0.0 && self.cell.visual_scale > 0.0) {
            return Err(ConfigError::InvalidCellMetrics {
                width: self.cell.width,
                height: self.cell.height,
            });
        }

        let battle = &self.battle;
        let stat_checks = [
            ("hero_max_hp", battle.hero_max_hp > 0),
            ("enemy_max_hp", battle.enemy_max_hp > 0),
            ("hero_start_mana", battle.hero_start_mana <= battle.hero_max_mana),
        ];
        if let Some((field, _)) = stat_checks.iter().find(|(_, ok)| !ok) {
            return Err(ConfigError::InvalidBattleStat {
                field: (*field).into(),
            });
        }

        let animation = &self.animation;
        let animation_checks = [
            ("decay_rate", animation.decay_rate > 0.0),
            ("max_dt", animation.max_dt > 0.0),
            ("snap_epsilon", animation.snap_epsilon > 0.0),
        ];
        if let Some((field, _)) = animation_checks.iter().find(|(_, ok)| !ok) {
            return Err(ConfigError::InvalidAnimation {
                field: (*field).into(),
            });
        }

        if self.max_fill_attempts == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_fill_attempts".into(),
            });
        }
        if self.max_cascade_passes == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_cascade_passes".into(),
            });
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig::from_preset(BoardPreset::Standard)
    }
}
