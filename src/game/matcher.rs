use serde::{Deserialize, Serialize};

use super::grid::{Grid, TokenType};

pub const MIN_RUN: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// 单轴上长度 ≥3 的同色连线。横纵两个方向分别产出，不做合并。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchGroup {
    pub token: TokenType,
    pub axis: Axis,
    pub cells: Vec<(i32, i32)>,
}

struct RunTracker {
    token: TokenType,
    start: i32,
    length: usize,
}

impl RunTracker {
    fn new() -> Self {
        Self {
            token: TokenType::None,
            start: 0,
            length: 0,
        }
    }

    /// 读入 `pos` 处的符文；若刚结束的连续段满足条件则返回它。
    fn push(&mut self, token: TokenType, pos: i32) -> Option<(TokenType, i32, usize)> {
        if !token.is_empty() && token == self.token {
            self.length += 1;
            return None;
        }
        let finished = self.finish();
        if token.is_empty() {
            self.token = TokenType::None;
            self.length = 0;
        } else {
            self.token = token;
            self.start = pos;
            self.length = 1;
        }
        finished
    }

    fn finish(&self) -> Option<(TokenType, i32, usize)> {
        if self.length >= MIN_RUN && !self.token.is_empty() {
            Some((self.token, self.start, self.length))
        } else {
            None
        }
    }
}

/// 扫描整个棋盘，先逐行（横向）再逐列（纵向），顺序确定。
pub fn find_matches(grid: &Grid) -> Vec<MatchGroup> {
    let rows = grid.rows() as i32;
    let cols = grid.cols() as i32;
    let mut groups = Vec::new();

    for row in 0..rows {
        let mut tracker = RunTracker::new();
        for col in 0..cols {
            if let Some(run) = tracker.push(grid.get(row, col), col) {
                groups.push(horizontal_group(row, run));
            }
        }
        if let Some(run) = tracker.finish() {
            groups.push(horizontal_group(row, run));
        }
    }

    for col in 0..cols {
        let mut tracker = RunTracker::new();
        for row in 0..rows {
            if let Some(run) = tracker.push(grid.get(row, col), row) {
                groups.push(vertical_group(col, run));
            }
        }
        if let Some(run) = tracker.finish() {
            groups.push(vertical_group(col, run));
        }
    }

    groups
}

pub fn has_matches(grid: &Grid) -> bool {
    !find_matches(grid).is_empty()
}

fn horizontal_group(row: i32, (token, start, length): (TokenType, i32, usize)) -> MatchGroup {
    MatchGroup {
        token,
        axis: Axis::Horizontal,
        cells: (start..start + length as i32).map(|col| (row, col)).collect(),
    }
}

fn vertical_group(col: i32, (token, start, length): (TokenType, i32, usize)) -> MatchGroup {
    MatchGroup {
        token,
        axis: Axis::Vertical,
        cells: (start..start + length as i32).map(|row| (row, col)).collect(),
    }
}

/// 所有组涉及的去重格子，按行优先排序。
pub fn distinct_cells(groups: &[MatchGroup]) -> Vec<(i32, i32)> {
    let mut cells: Vec<(i32, i32)> = groups
        .iter()
        .flat_map(|group| group.cells.iter().copied())
        .collect();
    cells.sort_unstable();
    cells.dedup();
    cells
}
