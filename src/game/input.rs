use serde::{Deserialize, Serialize};

use super::config::{BoardConfig, CellMetrics};

/// 正交投影的半高（世界单位），可视区域高度为 4。
pub const PROJECTION_HALF_HEIGHT: f32 = 2.0;
/// 棋盘占据可视区域的比例。
pub const BOARD_MARGIN_SCALE: f32 = 0.85;

/// 宿主在选中格子时接收通知（可用于视觉或触觉反馈）。调用失败时直接忽略。
pub trait SelectionObserver {
    fn on_selection(&self, center_x: f32, center_y: f32, size_px: f32);
}

/// 棋盘在屏幕空间中的几何信息。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoardGeometry {
    pub left: f32,
    pub top: f32,
    pub cell_width: f32,
    pub cell_height: f32,
    /// 每个棋盘像素对应的世界单位，用于动画吸附判定。
    #[serde(default = "default_pixel_to_world")]
    pub pixel_to_world: f32,
}

fn default_pixel_to_world() -> f32 {
    1.0
}

impl BoardGeometry {
    pub fn new(left: f32, top: f32, cell_width: f32, cell_height: f32) -> Self {
        Self {
            left,
            top,
            cell_width,
            cell_height,
            pixel_to_world: default_pixel_to_world(),
        }
    }

    /// 按视口尺寸把棋盘居中放入 85% 的可视区域，保持棋盘像素比例。
    pub fn fit_viewport(width_px: f32, height_px: f32, config: &BoardConfig) -> Option<Self> {
        let (rows, cols) = (config.rows, config.cols);
        if width_px <= 0.0 || height_px <= 0.0 || rows == 0 || cols == 0 {
            return None;
        }
        let (board_px_w, board_px_h) = config.board_pixel_size();

        let world_height = PROJECTION_HALF_HEIGHT * 2.0;
        let world_width = world_height * (width_px / height_px);
        let pixel_to_world = (world_width * BOARD_MARGIN_SCALE / board_px_w)
            .min(world_height * BOARD_MARGIN_SCALE / board_px_h);

        let screen_per_world = height_px / world_height;
        let board_w = board_px_w * pixel_to_world * screen_per_world;
        let board_h = board_px_h * pixel_to_world * screen_per_world;

        Some(Self {
            left: (width_px - board_w) * 0.5,
            top: (height_px - board_h) * 0.5,
            cell_width: board_w / cols as f32,
            cell_height: board_h / rows as f32,
            pixel_to_world,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.cell_width > 0.0 && self.cell_height > 0.0
    }

    /// 屏幕坐标 → 格子；落在棋盘外返回 `None`。
    pub fn screen_to_cell(&self, x: f32, y: f32, rows: usize, cols: usize) -> Option<(i32, i32)> {
        if !self.is_valid() || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let col = ((x - self.left) / self.cell_width).floor();
        let row = ((y - self.top) / self.cell_height).floor();
        if row < 0.0 || col < 0.0 || row >= rows as f32 || col >= cols as f32 {
            return None;
        }
        Some((row as i32, col as i32))
    }

    pub fn cell_center(&self, row: i32, col: i32) -> (f32, f32) {
        (
            self.left + (col as f32 + 0.5) * self.cell_width,
            self.top + (row as f32 + 0.5) * self.cell_height,
        )
    }

    pub fn selection_size(&self, cell: &CellMetrics) -> f32 {
        self.cell_width.min(self.cell_height) * cell.visual_scale
    }
}

/// 当前唯一的指针会话。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PointerSession {
    pub pointer_id: i32,
    pub selected_row: i32,
    pub selected_col: i32,
    pub is_active: bool,
}

impl PointerSession {
    pub const IDLE: PointerSession = PointerSession {
        pointer_id: -1,
        selected_row: -1,
        selected_col: -1,
        is_active: false,
    };

    pub fn begin(pointer_id: i32, row: i32, col: i32) -> Self {
        Self {
            pointer_id,
            selected_row: row,
            selected_col: col,
            is_active: true,
        }
    }

    pub fn owns(&self, pointer_id: i32) -> bool {
        self.is_active && self.pointer_id == pointer_id
    }

    pub fn selected(&self) -> Option<(i32, i32)> {
        self.is_active
            .then_some((self.selected_row, self.selected_col))
    }

    pub fn end(&mut self) {
        *self = Self::IDLE;
    }
}

impl Default for PointerSession {
    fn default() -> Self {
        Self::IDLE
    }
}
