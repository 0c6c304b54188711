use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::animation::sync_targets;
use super::battle::BattleState;
use super::config::{BoardConfig, BoardMode};
use super::grid::{Grid, TokenType};
use super::matcher::has_matches;

/// 对局阶段。`Victory`/`Defeat` 为终止状态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameState {
    Initializing,
    Playing,
    Victory,
    Defeat,
}

impl Default for GameState {
    fn default() -> Self {
        Self::Initializing
    }
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameState::Victory | GameState::Defeat)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameState::Initializing => "initializing",
            GameState::Playing => "playing",
            GameState::Victory => "victory",
            GameState::Defeat => "defeat",
        }
    }
}

/// 对局事件流，供宿主驱动 HUD 表现。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    BoardFilled {
        attempts: u32,
        fallback: bool,
    },
    SwapCommitted {
        from: (i32, i32),
        to: (i32, i32),
    },
    RunesCleared {
        token: TokenType,
        count: u32,
    },
    EnemyDamaged {
        amount: u32,
        remaining: u32,
    },
    HeroHealed {
        amount: u32,
        hp: u32,
    },
    ManaRestored {
        amount: u32,
        mana: u32,
    },
    HeroDamaged {
        amount: u32,
        remaining: u32,
    },
    CascadeSettled {
        passes: u32,
        cleared: u32,
    },
    StateChanged {
        from: GameState,
        to: GameState,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FillReport {
    pub attempts: u32,
    pub fallback: bool,
}

/// 棋盘、战斗数值与对局阶段的整体状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardState {
    pub grid: Grid,
    pub battle: BattleState,
    pub state: GameState,
    pub mode: BoardMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
}

impl BoardState {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            grid: Grid::new(config.rows, config.cols),
            battle: BattleState::from_config(&config.battle),
            state: GameState::Initializing,
            mode: config.mode,
            event_log: Vec::new(),
        }
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn record_events(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        self.event_log.extend(events);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn is_playing(&self) -> bool {
        self.state == GameState::Playing
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// 非终止状态下切换到 `next`，返回是否发生了切换。
    pub fn transition(&mut self, next: GameState) -> bool {
        if self.state.is_terminal() || self.state == next {
            return false;
        }
        let from = self.state;
        self.state = next;
        self.record_event(GameEvent::StateChanged { from, to: next });
        true
    }

    /// 反复随机填满棋盘，直到没有任何三连为止，然后进入 `Playing`。
    pub fn fill_initial<R: Rng>(&mut self, rng: &mut R, config: &BoardConfig) -> FillReport {
        let palette = config.palette();
        let mut report = FillReport {
            attempts: 0,
            fallback: true,
        };

        while report.attempts < config.max_fill_attempts {
            report.attempts += 1;
            fill_random(&mut self.grid, rng, palette);
            if !has_matches(&self.grid) {
                report.fallback = false;
                break;
            }
        }

        if report.fallback {
            fill_without_runs(&mut self.grid, rng, palette);
        }

        sync_targets(&mut self.grid, &config.cell);
        self.record_event(GameEvent::BoardFilled {
            attempts: report.attempts,
            fallback: report.fallback,
        });
        self.transition(GameState::Playing);
        report
    }

    /// 重置为新对局（回到 `Initializing`）。
    pub fn reset(&mut self, config: &BoardConfig) {
        *self = BoardState::new(config);
    }
}

pub fn random_token<R: Rng>(rng: &mut R, palette: &[TokenType]) -> TokenType {
    palette.choose(rng).copied().unwrap_or(TokenType::Red)
}

fn fill_random<R: Rng>(grid: &mut Grid, rng: &mut R, palette: &[TokenType]) {
    for row in 0..grid.rows() as i32 {
        for col in 0..grid.cols() as i32 {
            grid.set(row, col, random_token(rng, palette));
        }
    }
}

/// 行优先构造，保证不会出现三连。调色板至少需要三种符文。
fn fill_without_runs<R: Rng>(grid: &mut Grid, rng: &mut R, palette: &[TokenType]) {
    grid.clear();
    for row in 0..grid.rows() as i32 {
        for col in 0..grid.cols() as i32 {
            let candidates: Vec<TokenType> = palette
                .iter()
                .copied()
                .filter(|token| {
                    let left = grid.get(row, col - 1) == *token && grid.get(row, col - 2) == *token;
                    let up = grid.get(row - 1, col) == *token && grid.get(row - 2, col) == *token;
                    !left && !up
                })
                .collect();
            let token = if candidates.is_empty() {
                random_token(rng, palette)
            } else {
                random_token(rng, &candidates)
            };
            grid.set(row, col, token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::matcher::find_matches;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn initial_fill_is_match_free_and_playing() {
        let config = BoardConfig::default();
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut board = BoardState::new(&config);
            let report = board.fill_initial(&mut rng, &config);

            assert!(find_matches(&board.grid).is_empty(), "seed {seed} left a match");
            assert_eq!(board.state, GameState::Playing);
            assert_eq!(board.grid.count_empty(), 0);
            assert!(report.attempts >= 1);
        }
    }

    #[test]
    fn fallback_fill_never_builds_runs() {
        let mut config = BoardConfig::default().with_mode(BoardMode::Classic);
        config.max_fill_attempts = 1;
        let mut rng = SmallRng::seed_from_u64(7);
        let mut grid = Grid::new(config.rows, config.cols);

        for _ in 0..50 {
            fill_without_runs(&mut grid, &mut rng, config.palette());
            assert!(find_matches(&grid).is_empty());
            assert_eq!(grid.count_empty(), 0);
        }
    }

    #[test]
    fn filled_runes_start_at_rest() {
        let config = BoardConfig::default();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut board = BoardState::new(&config);
        board.fill_initial(&mut rng, &config);

        assert!(board.grid.occupied().all(|(_, _, rune)| rune.is_settled()));
    }

    #[test]
    fn terminal_states_absorb_transitions() {
        let mut board = BoardState::new(&BoardConfig::default());
        assert!(board.transition(GameState::Playing));
        assert!(board.transition(GameState::Defeat));
        assert!(!board.transition(GameState::Playing));
        assert!(!board.transition(GameState::Victory));
        assert_eq!(board.state, GameState::Defeat);
        assert_eq!(board.drain_events().len(), 2);
        assert!(board.event_log.is_empty());
    }
}
