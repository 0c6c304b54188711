use rand::Rng;
use serde::{Deserialize, Serialize};

use super::animation::retarget;
use super::cascade::{CascadePhase, CascadeReport, CascadeResolver};
use super::config::{BoardConfig, CellMetrics};
use super::grid::Grid;
use super::matcher::has_matches;
use super::state::{BoardState, GameEvent, GameState};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwapAction {
    pub from: (i32, i32),
    pub to: (i32, i32),
}

impl SwapAction {
    pub fn new(r1: i32, c1: i32, r2: i32, c2: i32) -> Self {
        Self {
            from: (r1, c1),
            to: (r2, c2),
        }
    }

    /// 恰好在单轴上相距一格。
    pub fn is_orthogonal_step(&self) -> bool {
        let dr = (self.from.0 - self.to.0).abs();
        let dc = (self.from.1 - self.to.1).abs();
        dr + dc == 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum SwapRejection {
    GameNotPlaying { state: GameState },
    OutOfBounds { row: i32, col: i32 },
    SameCell,
    NotAdjacent,
    EmptyCell { row: i32, col: i32 },
    NoMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwapOutcome {
    pub action: SwapAction,
    pub cascade: CascadeReport,
}

/// 交换校验：先试探性交换，只有形成三连才提交并结算连锁。
#[derive(Debug, Clone)]
pub struct RuleEngine {
    cascade: CascadeResolver,
    cell: CellMetrics,
}

impl RuleEngine {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            cascade: CascadeResolver::new(config),
            cell: config.cell,
        }
    }

    pub fn cascade_phase(&self) -> CascadePhase {
        self.cascade.phase()
    }

    fn ensure_playing(board: &BoardState) -> Result<(), SwapRejection> {
        if !board.is_playing() {
            return Err(SwapRejection::GameNotPlaying { state: board.state });
        }
        Ok(())
    }

    fn ensure_in_bounds(grid: &Grid, (row, col): (i32, i32)) -> Result<(), SwapRejection> {
        if !grid.contains(row, col) {
            return Err(SwapRejection::OutOfBounds { row, col });
        }
        Ok(())
    }

    fn ensure_adjacent(action: &SwapAction) -> Result<(), SwapRejection> {
        if action.from == action.to {
            return Err(SwapRejection::SameCell);
        }
        if !action.is_orthogonal_step() {
            return Err(SwapRejection::NotAdjacent);
        }
        Ok(())
    }

    fn ensure_occupied(grid: &Grid, (row, col): (i32, i32)) -> Result<(), SwapRejection> {
        if grid.get(row, col).is_empty() {
            return Err(SwapRejection::EmptyCell { row, col });
        }
        Ok(())
    }

    /// 校验所有无需试探交换即可判断的前置条件。
    pub fn validate(board: &BoardState, action: &SwapAction) -> Result<(), SwapRejection> {
        Self::ensure_playing(board)?;
        Self::ensure_in_bounds(&board.grid, action.from)?;
        Self::ensure_in_bounds(&board.grid, action.to)?;
        Self::ensure_adjacent(action)?;
        Self::ensure_occupied(&board.grid, action.from)?;
        Self::ensure_occupied(&board.grid, action.to)?;
        Ok(())
    }

    /// 仅当交换能形成三连时保留交换，否则把棋盘原样恢复。不做任何消除。
    pub fn tentative_swap(
        grid: &mut Grid,
        action: &SwapAction,
        cell: &CellMetrics,
    ) -> Result<(), SwapRejection> {
        let (a, b) = (action.from, action.to);
        let Some(saved_a) = grid.rune(a.0, a.1).copied() else {
            return Err(SwapRejection::OutOfBounds { row: a.0, col: a.1 });
        };
        let Some(saved_b) = grid.rune(b.0, b.1).copied() else {
            return Err(SwapRejection::OutOfBounds { row: b.0, col: b.1 });
        };

        grid.swap(a, b);
        retarget(grid, a.0, a.1, cell);
        retarget(grid, b.0, b.1, cell);

        if has_matches(grid) {
            return Ok(());
        }

        grid.put(a.0, a.1, saved_a);
        grid.put(b.0, b.1, saved_b);
        Err(SwapRejection::NoMatch)
    }

    pub fn try_swap<R: Rng>(
        &mut self,
        board: &mut BoardState,
        rng: &mut R,
        action: SwapAction,
    ) -> Result<SwapOutcome, SwapRejection> {
        Self::validate(board, &action)?;
        Self::tentative_swap(&mut board.grid, &action, &self.cell)?;

        board.record_event(GameEvent::SwapCommitted {
            from: action.from,
            to: action.to,
        });
        let cascade = self.cascade.resolve(board, rng);
        Ok(SwapOutcome { action, cascade })
    }

    pub fn attempt_swap<R: Rng>(
        &mut self,
        board: &mut BoardState,
        rng: &mut R,
        r1: i32,
        c1: i32,
        r2: i32,
        c2: i32,
    ) -> bool {
        self.try_swap(board, rng, SwapAction::new(r1, c1, r2, c2))
            .is_ok()
    }

    pub fn resolve_cascade<R: Rng>(&mut self, board: &mut BoardState, rng: &mut R) -> CascadeReport {
        self.cascade.resolve(board, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::animation::sync_targets;
    use crate::game::grid::{TokenType, Vec2};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use TokenType::{Blue as B, Green as G, Red as R};

    fn setup() -> (RuleEngine, BoardState, SmallRng) {
        let config = BoardConfig::default().with_dimensions(4, 4);
        let mut board = BoardState::new(&config);
        board.grid = Grid::from_tokens(&[
            vec![R, G, B, G],
            vec![G, B, R, B],
            vec![R, R, G, R],
            vec![B, G, B, G],
        ]);
        sync_targets(&mut board.grid, &config.cell);
        board.state = GameState::Playing;
        (RuleEngine::new(&config), board, SmallRng::seed_from_u64(42))
    }

    #[test]
    fn swap_two_rows_apart_is_rejected() {
        let (mut engine, mut board, mut rng) = setup();
        let before = board.clone();

        assert!(!engine.attempt_swap(&mut board, &mut rng, 0, 0, 2, 0));
        assert_eq!(board, before);
    }

    #[test]
    fn precondition_failures_report_reason() {
        let (mut engine, mut board, mut rng) = setup();
        let cases = [
            (SwapAction::new(1, 1, 2, 2), SwapRejection::NotAdjacent),
            (SwapAction::new(1, 1, 1, 1), SwapRejection::SameCell),
            (
                SwapAction::new(3, 3, 4, 3),
                SwapRejection::OutOfBounds { row: 4, col: 3 },
            ),
            (
                SwapAction::new(0, -1, 0, 0),
                SwapRejection::OutOfBounds { row: 0, col: -1 },
            ),
        ];
        for (action, expected) in cases {
            let result = engine.try_swap(&mut board, &mut rng, action);
            assert_eq!(result, Err(expected));
        }

        board.grid.set(1, 2, TokenType::None);
        let result = engine.try_swap(&mut board, &mut rng, SwapAction::new(1, 1, 1, 2));
        assert_eq!(result, Err(SwapRejection::EmptyCell { row: 1, col: 2 }));
    }

    #[test]
    fn rejected_swap_restores_full_state() {
        let (mut engine, mut board, mut rng) = setup();
        if let Some(rune) = board.grid.rune_mut(0, 0) {
            rune.current = Vec2::new(12.5, -30.0);
        }
        let before = board.clone();

        let result = engine.try_swap(&mut board, &mut rng, SwapAction::new(0, 0, 0, 1));

        assert_eq!(result, Err(SwapRejection::NoMatch));
        assert_eq!(board, before, "undo must be an exact inverse");
    }

    #[test]
    fn matching_swap_commits_and_cascades() {
        let (mut engine, mut board, mut rng) = setup();
        let enemy_before = board.battle.enemy_hp;

        let outcome = engine
            .try_swap(&mut board, &mut rng, SwapAction::new(2, 2, 2, 3))
            .expect("swap should create a red run");

        assert!(outcome.cascade.passes >= 1);
        assert!(outcome.cascade.cleared.red >= 3);
        assert!(board.battle.enemy_hp < enemy_before);
        assert_eq!(engine.cascade_phase(), CascadePhase::Idle);
        assert!(board.event_log.contains(&GameEvent::SwapCommitted {
            from: (2, 2),
            to: (2, 3),
        }));
        if board.is_playing() {
            assert!(!has_matches(&board.grid));
        }
    }

    #[test]
    fn tentative_swap_names_the_cell_out_of_range() {
        let (_, board, _) = setup();
        let cell = CellMetrics::default();
        let mut grid = board.grid.clone();

        let result = RuleEngine::tentative_swap(&mut grid, &SwapAction::new(3, 3, 3, 4), &cell);
        assert_eq!(result, Err(SwapRejection::OutOfBounds { row: 3, col: 4 }));

        let result = RuleEngine::tentative_swap(&mut grid, &SwapAction::new(-1, 0, 0, 0), &cell);
        assert_eq!(result, Err(SwapRejection::OutOfBounds { row: -1, col: 0 }));
        assert_eq!(grid, board.grid);
    }

    #[test]
    fn terminal_state_rejects_swaps() {
        let (mut engine, mut board, mut rng) = setup();
        board.state = GameState::Victory;
        let before = board.clone();

        let result = engine.try_swap(&mut board, &mut rng, SwapAction::new(2, 2, 2, 3));

        assert_eq!(
            result,
            Err(SwapRejection::GameNotPlaying {
                state: GameState::Victory
            })
        );
        assert_eq!(board, before);
    }
}
