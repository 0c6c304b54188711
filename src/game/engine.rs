use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::animation::Animator;
use super::battle::BattleState;
use super::cascade::CascadeReport;
use super::config::{BoardConfig, ConfigError};
use super::grid::{Grid, TokenType};
use super::input::{BoardGeometry, PointerSession, SelectionObserver};
use super::matcher::has_matches;
use super::rules::{RuleEngine, SwapAction, SwapOutcome, SwapRejection};
use super::state::{BoardState, GameEvent, GameState};
use crate::ai::{HintAgent, HintStrategy, SwapMove};
use crate::log;

/// 渲染层每帧读取的只读符文视图。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RuneView {
    pub row: i32,
    pub col: i32,
    pub token: TokenType,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub state: GameState,
    pub battle: BattleState,
    pub runes: Vec<RuneView>,
    pub dirty: bool,
    pub moves_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<(i32, i32)>,
}

/// 帧驱动的对局核心：持有棋盘、随机源、规则、动画与输入会话。
pub struct BoardEngine {
    config: BoardConfig,
    board: BoardState,
    rng: SmallRng,
    rules: RuleEngine,
    animator: Animator,
    hints: HintAgent,
    geometry: Option<BoardGeometry>,
    session: PointerSession,
    observer: Option<Box<dyn SelectionObserver>>,
    visuals_dirty: bool,
}

impl BoardEngine {
    pub fn new(config: BoardConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::build(
            config,
            SmallRng::seed_from_u64(seed),
            HintAgent::with_seed(HintStrategy::default(), seed.rotate_left(17)),
        )
    }

    pub fn from_entropy(config: BoardConfig) -> Result<Self, ConfigError> {
        Self::build(
            config,
            SmallRng::from_entropy(),
            HintAgent::new(HintStrategy::default()),
        )
    }

    fn build(config: BoardConfig, rng: SmallRng, hints: HintAgent) -> Result<Self, ConfigError> {
        if let Err(error) = config.validate() {
            log::warn(&format!("rejected board config: {error}"));
            return Err(error);
        }
        Ok(Self {
            board: BoardState::new(&config),
            rules: RuleEngine::new(&config),
            animator: Animator::new(config.animation),
            config,
            rng,
            hints,
            geometry: None,
            session: PointerSession::default(),
            observer: None,
            visuals_dirty: true,
        })
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn grid(&self) -> &Grid {
        &self.board.grid
    }

    pub fn battle(&self) -> &BattleState {
        &self.board.battle
    }

    pub fn state(&self) -> GameState {
        self.board.state
    }

    /// 首次使用时填充棋盘；本次调用执行了填充则返回 true。
    pub fn start(&mut self) -> bool {
        if self.board.state != GameState::Initializing {
            return false;
        }
        let report = self.board.fill_initial(&mut self.rng, &self.config);
        if report.fallback {
            log::warn(&format!(
                "no match-free board after {} random fills; used constructive fill",
                report.attempts
            ));
        } else {
            log::info(&format!("board filled after {} attempts", report.attempts));
        }
        self.visuals_dirty = true;
        true
    }

    /// 重新开局。传入种子时重新播种随机源。
    pub fn restart(&mut self, seed: Option<u64>) {
        if let Some(seed) = seed {
            self.rng = SmallRng::seed_from_u64(seed);
        }
        self.board.reset(&self.config);
        self.session.end();
        self.visuals_dirty = true;
    }

    /// 推进一帧：延迟初始化、结算待处理连锁、推进动画。返回是否需要重建绘制列表。
    pub fn tick(&mut self, dt: f32) -> bool {
        self.start();
        self.resolve_pending();

        let pixel_to_world = self
            .geometry
            .map(|geometry| geometry.pixel_to_world)
            .unwrap_or(1.0);
        let step = self
            .animator
            .advance(&mut self.board.grid, dt, pixel_to_world);
        if step.moved || !step.settled {
            self.visuals_dirty = true;
        }
        self.visuals_dirty
    }

    /// 若棋盘上仍有三连（且对局进行中），立即结算连锁。
    pub fn resolve_pending(&mut self) -> Option<CascadeReport> {
        if !self.board.is_playing() || !has_matches(&self.board.grid) {
            return None;
        }
        let report = self.rules.resolve_cascade(&mut self.board, &mut self.rng);
        if report.changed_board() {
            self.visuals_dirty = true;
        }
        Some(report)
    }

    pub fn try_swap(&mut self, action: SwapAction) -> Result<SwapOutcome, SwapRejection> {
        let outcome = self.rules.try_swap(&mut self.board, &mut self.rng, action)?;
        self.visuals_dirty = true;
        Ok(outcome)
    }

    pub fn attempt_swap(&mut self, r1: i32, c1: i32, r2: i32, c2: i32) -> bool {
        self.try_swap(SwapAction::new(r1, c1, r2, c2)).is_ok()
    }

    pub fn is_dirty(&self) -> bool {
        self.visuals_dirty
    }

    pub fn mark_clean(&mut self) {
        self.visuals_dirty = false;
    }

    pub fn runes(&self) -> impl Iterator<Item = RuneView> + '_ {
        self.board.grid.occupied().map(|(row, col, rune)| RuneView {
            row,
            col,
            token: rune.token,
            x: rune.current.x,
            y: rune.current.y,
        })
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.board.drain_events()
    }

    pub fn geometry(&self) -> Option<BoardGeometry> {
        self.geometry
    }

    pub fn set_geometry(&mut self, geometry: BoardGeometry) {
        if self.geometry != Some(geometry) {
            self.geometry = Some(geometry);
            self.visuals_dirty = true;
        }
    }

    /// 视口尺寸变化时重新计算棋盘几何。
    pub fn set_viewport(&mut self, width_px: f32, height_px: f32) -> bool {
        match BoardGeometry::fit_viewport(width_px, height_px, &self.config) {
            Some(geometry) => {
                self.set_geometry(geometry);
                true
            }
            None => false,
        }
    }

    pub fn screen_to_cell(&self, x: f32, y: f32) -> Option<(i32, i32)> {
        self.geometry?
            .screen_to_cell(x, y, self.config.rows, self.config.cols)
    }

    pub fn set_observer(&mut self, observer: Box<dyn SelectionObserver>) {
        self.observer = Some(observer);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn selection(&self) -> Option<(i32, i32)> {
        self.session.selected()
    }

    /// 在非空格子上开始选中；已有会话时忽略第二个指针。
    pub fn pointer_down(&mut self, pointer_id: i32, x: f32, y: f32) -> bool {
        if !self.board.is_playing() || self.session.is_active {
            return false;
        }
        let Some((row, col)) = self.screen_to_cell(x, y) else {
            return false;
        };
        if self.board.grid.get(row, col).is_empty() {
            return false;
        }
        self.session = PointerSession::begin(pointer_id, row, col);
        self.notify_selection(row, col);
        true
    }

    /// 拖入相邻格子即尝试交换并结束会话。返回是否提交了交换。
    pub fn pointer_move(&mut self, pointer_id: i32, x: f32, y: f32) -> bool {
        if !self.session.owns(pointer_id) {
            return false;
        }
        let (Some(from), Some(to)) = (self.session.selected(), self.screen_to_cell(x, y)) else {
            return false;
        };
        let action = SwapAction { from, to };
        if !action.is_orthogonal_step() {
            return false;
        }
        self.session.end();
        self.try_swap(action).is_ok()
    }

    pub fn pointer_up(&mut self, pointer_id: i32, x: f32, y: f32) -> bool {
        if !self.session.owns(pointer_id) {
            return false;
        }
        let selected = self.session.selected();
        self.session.end();
        match (selected, self.screen_to_cell(x, y)) {
            (Some(from), Some(to)) if from != to => self.try_swap(SwapAction { from, to }).is_ok(),
            _ => false,
        }
    }

    pub fn pointer_cancel(&mut self, pointer_id: i32) {
        if self.session.owns(pointer_id) {
            self.session.end();
        }
    }

    fn notify_selection(&self, row: i32, col: i32) {
        if let (Some(observer), Some(geometry)) = (&self.observer, self.geometry) {
            let (center_x, center_y) = geometry.cell_center(row, col);
            observer.on_selection(center_x, center_y, geometry.selection_size(&self.config.cell));
        }
    }

    pub fn hint(&mut self, strategy: HintStrategy) -> Option<SwapMove> {
        if !self.board.is_playing() {
            return None;
        }
        self.hints.set_strategy(strategy);
        self.hints.suggest(&self.board.grid)
    }

    pub fn has_available_moves(&self) -> bool {
        self.board.is_playing() && crate::ai::has_available_moves(&self.board.grid)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            rows: self.config.rows,
            cols: self.config.cols,
            state: self.board.state,
            battle: self.board.battle,
            runes: self.runes().collect(),
            dirty: self.visuals_dirty,
            moves_available: self.has_available_moves(),
            selection: self.selection(),
        }
    }
}
