//! 棋盘核心逻辑模块（网格、匹配、连锁、战斗、状态机等）。

pub mod animation;
pub mod battle;
pub mod cascade;
pub mod config;
pub mod engine;
pub mod grid;
pub mod input;
pub mod matcher;
pub mod rules;
pub mod state;

pub use animation::{slot_position, sync_targets, AnimationStep, Animator};
pub use battle::{BattleEffect, BattleResolver, BattleState, TokenCounts};
pub use cascade::{apply_gravity, refill, CascadePhase, CascadeReport, CascadeResolver};
pub use config::{
    AnimationConfig,
    BattleConfig,
    BoardConfig,
    BoardMode,
    BoardPreset,
    CellMetrics,
    ConfigError,
};
pub use engine::{BoardEngine, BoardSnapshot, RuneView};
pub use grid::{Grid, Rune, TokenType, Vec2};
pub use input::{BoardGeometry, PointerSession, SelectionObserver};
pub use matcher::{distinct_cells, find_matches, has_matches, Axis, MatchGroup};
pub use rules::{RuleEngine, SwapAction, SwapOutcome, SwapRejection};
pub use state::{BoardState, FillReport, GameEvent, GameState};
