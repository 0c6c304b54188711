use serde::{Deserialize, Serialize};

/// 符文种类。`None` 表示空格。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenType {
    None,
    Red,
    Green,
    Blue,
    Skull,
}

impl Default for TokenType {
    fn default() -> Self {
        TokenType::None
    }
}

impl TokenType {
    pub const BATTLE_PALETTE: [TokenType; 4] = [
        TokenType::Red,
        TokenType::Green,
        TokenType::Blue,
        TokenType::Skull,
    ];
    pub const CLASSIC_PALETTE: [TokenType; 3] = [TokenType::Red, TokenType::Green, TokenType::Blue];

    pub fn is_empty(self) -> bool {
        matches!(self, TokenType::None)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// 单个格子的内容：符文种类与动画位置（棋盘像素坐标）。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Rune {
    pub token: TokenType,
    pub current: Vec2,
    pub target: Vec2,
    #[serde(default)]
    pub position_initialized: bool,
}

impl Rune {
    pub const EMPTY: Rune = Rune {
        token: TokenType::None,
        current: Vec2::ZERO,
        target: Vec2::ZERO,
        position_initialized: false,
    };

    pub fn new(token: TokenType) -> Self {
        Self {
            token,
            ..Self::EMPTY
        }
    }

    /// 从 `from` 落向 `to` 的新符文（补充时使用）。
    pub fn falling(token: TokenType, from: Vec2, to: Vec2) -> Self {
        Self {
            token,
            current: from,
            target: to,
            position_initialized: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }

    pub fn is_settled(&self) -> bool {
        self.position_initialized && self.current == self.target
    }
}

/// 行优先存储的棋盘。所有坐标访问都做越界检查：越界读取返回 `None`，越界写入无效。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "GridData")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Rune>,
}

/// 反序列化的中间形态，校验尺寸与格子数量一致后才转换为 `Grid`。
#[derive(Deserialize)]
struct GridData {
    rows: usize,
    cols: usize,
    cells: Vec<Rune>,
}

impl TryFrom<GridData> for Grid {
    type Error = String;

    fn try_from(data: GridData) -> Result<Self, Self::Error> {
        let expected = data.rows.checked_mul(data.cols);
        if expected != Some(data.cells.len()) {
            return Err(format!(
                "grid {}x{} does not match {} cells",
                data.rows,
                data.cols,
                data.cells.len()
            ));
        }
        Ok(Self {
            rows: data.rows,
            cols: data.cols,
            cells: data.cells,
        })
    }
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Rune::EMPTY; rows * cols],
        }
    }

    /// 按行（自上而下）构建棋盘，不足的行以 `None` 补齐。
    pub fn from_tokens(rows: &[Vec<TokenType>]) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Grid::new(rows.len(), cols);
        for (row, tokens) in rows.iter().enumerate() {
            for (col, token) in tokens.iter().enumerate() {
                grid.set(row as i32, col as i32, *token);
            }
        }
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, row: i32, col: i32) -> bool {
        self.index(row, col).is_some()
    }

    fn index(&self, row: i32, col: i32) -> Option<usize> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(row * self.cols + col)
    }

    pub fn get(&self, row: i32, col: i32) -> TokenType {
        self.index(row, col)
            .map(|idx| self.cells[idx].token)
            .unwrap_or(TokenType::None)
    }

    /// 设置种类。`None` 清空位置状态；非空种类标记位置未初始化。
    pub fn set(&mut self, row: i32, col: i32, token: TokenType) {
        if let Some(idx) = self.index(row, col) {
            self.cells[idx] = Rune::new(token);
        }
    }

    pub fn rune(&self, row: i32, col: i32) -> Option<&Rune> {
        self.index(row, col).map(|idx| &self.cells[idx])
    }

    pub fn rune_mut(&mut self, row: i32, col: i32) -> Option<&mut Rune> {
        let idx = self.index(row, col)?;
        Some(&mut self.cells[idx])
    }

    /// 整体放置一个符文，保留其位置状态（移动时使用）。
    pub fn put(&mut self, row: i32, col: i32, rune: Rune) {
        if let Some(idx) = self.index(row, col) {
            self.cells[idx] = if rune.is_empty() { Rune::EMPTY } else { rune };
        }
    }

    /// 取出符文并留下空格。越界时返回空符文。
    pub fn take(&mut self, row: i32, col: i32) -> Rune {
        match self.index(row, col) {
            Some(idx) => std::mem::replace(&mut self.cells[idx], Rune::EMPTY),
            None => Rune::EMPTY,
        }
    }

    /// 整体交换两个格子；任一越界时不做修改并返回 false。
    pub fn swap(&mut self, a: (i32, i32), b: (i32, i32)) -> bool {
        match (self.index(a.0, a.1), self.index(b.0, b.1)) {
            (Some(ia), Some(ib)) => {
                self.cells.swap(ia, ib);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = Rune::EMPTY);
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &Rune)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, rune)| ((idx / cols) as i32, (idx % cols) as i32, rune))
    }

    /// 仅遍历非空格子。
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32, &Rune)> + '_ {
        self.iter().filter(|(_, _, rune)| !rune.is_empty())
    }

    pub fn runes_mut(&mut self) -> impl Iterator<Item = &mut Rune> + '_ {
        self.cells.iter_mut()
    }

    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|rune| rune.is_empty()).count()
    }

    pub fn tokens(&self) -> Vec<Vec<TokenType>> {
        (0..self.rows as i32)
            .map(|row| (0..self.cols as i32).map(|col| self.get(row, col)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_are_empty() {
        let mut grid = Grid::new(8, 7);
        grid.set(0, 0, TokenType::Red);

        assert_eq!(grid.get(0, 0), TokenType::Red);
        assert_eq!(grid.get(-1, 0), TokenType::None);
        assert_eq!(grid.get(0, -1), TokenType::None);
        assert_eq!(grid.get(8, 0), TokenType::None);
        assert_eq!(grid.get(0, 7), TokenType::None);
        assert!(grid.rune(8, 7).is_none());
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut grid = Grid::new(3, 3);
        let before = grid.clone();

        grid.set(3, 0, TokenType::Blue);
        grid.set(-1, -1, TokenType::Blue);
        grid.put(0, 3, Rune::new(TokenType::Green));

        assert_eq!(grid, before, "writes outside the grid must be no-ops");
        assert!(!grid.swap((0, 0), (0, 3)));
    }

    #[test]
    fn set_none_clears_position_state() {
        let mut grid = Grid::new(2, 2);
        grid.put(
            1,
            1,
            Rune::falling(TokenType::Skull, Vec2::new(5.0, -10.0), Vec2::new(5.0, 20.0)),
        );
        grid.set(1, 1, TokenType::None);

        let rune = grid.rune(1, 1).expect("cell should exist");
        assert_eq!(*rune, Rune::EMPTY);
    }

    #[test]
    fn set_marks_position_uninitialized() {
        let mut grid = Grid::new(2, 2);
        grid.put(
            0,
            1,
            Rune::falling(TokenType::Red, Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0)),
        );
        grid.set(0, 1, TokenType::Green);

        let rune = grid.rune(0, 1).expect("cell should exist");
        assert_eq!(rune.token, TokenType::Green);
        assert!(!rune.position_initialized);
    }

    #[test]
    fn take_and_put_carry_position() {
        let mut grid = Grid::new(2, 1);
        let rune = Rune::falling(TokenType::Blue, Vec2::new(55.0, 0.0), Vec2::new(55.0, 72.0));
        grid.put(0, 0, rune);

        let moved = grid.take(0, 0);
        grid.put(1, 0, moved);

        assert_eq!(grid.get(0, 0), TokenType::None);
        assert_eq!(grid.rune(1, 0).copied(), Some(rune));
    }

    #[test]
    fn from_tokens_is_row_major() {
        let grid = Grid::from_tokens(&[
            vec![TokenType::Red, TokenType::Green],
            vec![TokenType::Blue],
        ]);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 2);
        assert_eq!(grid.get(0, 1), TokenType::Green);
        assert_eq!(grid.get(1, 0), TokenType::Blue);
        assert_eq!(grid.get(1, 1), TokenType::None);
        assert_eq!(grid.occupied().count(), 3);
    }

    #[test]
    fn deserialize_rejects_mismatched_cell_count() {
        let mut grid = Grid::new(2, 2);
        grid.set(1, 1, TokenType::Green);
        let json = serde_json::to_string(&grid).expect("grid serializes");
        let restored: Grid = serde_json::from_str(&json).expect("consistent grid deserializes");
        assert_eq!(restored, grid);

        let broken = json.replacen("\"rows\":2", "\"rows\":3", 1);
        assert_ne!(broken, json);
        assert!(serde_json::from_str::<Grid>(&broken).is_err());
    }
}
