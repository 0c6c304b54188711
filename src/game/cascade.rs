use rand::Rng;
use serde::{Deserialize, Serialize};

use super::animation::{retarget, slot_position};
use super::battle::{BattleResolver, TokenCounts};
use super::config::{BoardConfig, CellMetrics};
use super::grid::{Grid, Rune, TokenType};
use super::matcher::{distinct_cells, find_matches};
use super::state::{random_token, BoardState, GameEvent, GameState};
use crate::log;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CascadePhase {
    Idle,
    Resolving,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CascadeReport {
    pub passes: u32,
    pub cleared: TokenCounts,
    pub final_state: GameState,
    #[serde(default)]
    pub hit_pass_limit: bool,
}

impl CascadeReport {
    fn new(state: GameState) -> Self {
        Self {
            passes: 0,
            cleared: TokenCounts::default(),
            final_state: state,
            hit_pass_limit: false,
        }
    }

    pub fn changed_board(&self) -> bool {
        self.passes > 0
    }
}

/// 连锁结算：消除 → 重力 → 补充 → 复查，直到没有三连或对局结束。
#[derive(Debug, Clone)]
pub struct CascadeResolver {
    phase: CascadePhase,
    battle: BattleResolver,
    cell: CellMetrics,
    palette: &'static [TokenType],
    battle_enabled: bool,
    max_passes: u32,
}

impl CascadeResolver {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            phase: CascadePhase::Idle,
            battle: BattleResolver::new(config.battle),
            cell: config.cell,
            palette: config.palette(),
            battle_enabled: config.mode.has_battle(),
            max_passes: config.max_cascade_passes,
        }
    }

    pub fn phase(&self) -> CascadePhase {
        self.phase
    }

    pub fn resolve<R: Rng>(&mut self, board: &mut BoardState, rng: &mut R) -> CascadeReport {
        let mut report = CascadeReport::new(board.state);
        if !board.is_playing() {
            return report;
        }

        self.phase = CascadePhase::Resolving;
        while board.is_playing() {
            let groups = find_matches(&board.grid);
            if groups.is_empty() {
                break;
            }
            if report.passes >= self.max_passes {
                log::warn(&format!(
                    "cascade stopped after {} passes with matches still on the board",
                    report.passes
                ));
                report.hit_pass_limit = true;
                break;
            }
            report.passes += 1;

            let counts = TokenCounts::from_groups(&groups);
            board.record_events(
                counts
                    .iter()
                    .map(|(token, count)| GameEvent::RunesCleared { token, count }),
            );
            if self.battle_enabled {
                let events = self
                    .battle
                    .resolve(&mut board.battle, &mut board.state, &counts);
                board.record_events(events);
            }
            report.cleared.merge(&counts);

            for (row, col) in distinct_cells(&groups) {
                board.grid.set(row, col, TokenType::None);
            }
            apply_gravity(&mut board.grid, &self.cell);
            refill(&mut board.grid, rng, self.palette, &self.cell);
        }
        self.phase = CascadePhase::Idle;
        report.final_state = board.state;

        if report.passes > 0 {
            board.record_event(GameEvent::CascadeSettled {
                passes: report.passes,
                cleared: report.cleared.total(),
            });
            log::debug(&format!(
                "cascade settled: passes={} cleared={:?}",
                report.passes, report.cleared
            ));
        }
        if report.final_state.is_terminal() {
            log::info(&format!(
                "battle finished: {} (hero {} / enemy {})",
                report.final_state.as_str(),
                board.battle.hero_hp,
                board.battle.enemy_hp
            ));
        }
        report
    }
}

/// 每列独立地把非空符文稳定地压到底部。返回每列空出的格子数。
pub fn apply_gravity(grid: &mut Grid, cell: &CellMetrics) -> Vec<usize> {
    let rows = grid.rows() as i32;
    let mut vacated = Vec::with_capacity(grid.cols());
    for col in 0..grid.cols() as i32 {
        let mut write_row = rows - 1;
        for row in (0..rows).rev() {
            if grid.get(row, col).is_empty() {
                continue;
            }
            if write_row != row {
                let rune = grid.take(row, col);
                grid.put(write_row, col, rune);
            }
            retarget(grid, write_row, col, cell);
            write_row -= 1;
        }
        vacated.push((write_row + 1) as usize);
    }
    vacated
}

/// 用新符文填满空格；新符文从棋盘上方落入。
pub fn refill<R: Rng>(grid: &mut Grid, rng: &mut R, palette: &[TokenType], cell: &CellMetrics) {
    for col in 0..grid.cols() as i32 {
        let empty_rows: Vec<i32> = (0..grid.rows() as i32)
            .filter(|row| grid.get(*row, col).is_empty())
            .collect();
        let drop = empty_rows.len() as i32;
        for row in empty_rows {
            let token = random_token(rng, palette);
            let rune = Rune::falling(
                token,
                slot_position(row - drop, col, cell),
                slot_position(row, col, cell),
            );
            grid.put(row, col, rune);
        }
    }
}
