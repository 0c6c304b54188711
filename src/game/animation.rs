use serde::{Deserialize, Serialize};

use super::config::{AnimationConfig, CellMetrics};
use super::grid::{Grid, Vec2};

/// 格子 `(row, col)` 中心的棋盘像素坐标（y 向下）。
pub fn slot_position(row: i32, col: i32, cell: &CellMetrics) -> Vec2 {
    Vec2::new(
        (col as f32 + 0.5) * cell.width,
        (row as f32 + 0.5) * cell.height,
    )
}

/// 把每个非空格子的目标设为其所在格；位置未初始化的直接就位。
pub fn sync_targets(grid: &mut Grid, cell: &CellMetrics) {
    let positions: Vec<(i32, i32)> = grid.occupied().map(|(row, col, _)| (row, col)).collect();
    for (row, col) in positions {
        retarget(grid, row, col, cell);
    }
}

pub fn retarget(grid: &mut Grid, row: i32, col: i32, cell: &CellMetrics) {
    let slot = slot_position(row, col, cell);
    if let Some(rune) = grid.rune_mut(row, col) {
        if rune.is_empty() {
            return;
        }
        rune.target = slot;
        if !rune.position_initialized {
            rune.current = slot;
            rune.position_initialized = true;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnimationStep {
    /// 本帧至少有一个符文移动（含最后的吸附）。
    pub moved: bool,
    /// 所有符文都已精确停在目标位置。
    pub settled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Animator {
    config: AnimationConfig,
}

impl Animator {
    pub fn new(config: AnimationConfig) -> Self {
        Self { config }
    }

    /// 指数逼近：`current += (target - current) * decay * dt`，距离小于阈值时吸附到目标。
    pub fn advance(&self, grid: &mut Grid, dt: f32, pixel_to_world: f32) -> AnimationStep {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_dt)
        } else {
            0.0
        };
        let factor = (self.config.decay_rate * dt).min(1.0);
        let pixel_to_world = if pixel_to_world > 0.0 {
            pixel_to_world
        } else {
            1.0
        };

        let mut step = AnimationStep {
            moved: false,
            settled: true,
        };

        for rune in grid.runes_mut() {
            if rune.is_empty() || rune.is_settled() {
                continue;
            }

            let delta = rune.target - rune.current;
            let mut next = rune.current + delta * factor;
            if (rune.target - next).length() * pixel_to_world < self.config.snap_epsilon {
                next = rune.target;
                rune.position_initialized = true;
            }

            if next != rune.current {
                rune.current = next;
                step.moved = true;
            }
            if !rune.is_settled() {
                step.settled = false;
            }
        }
        step
    }
}
