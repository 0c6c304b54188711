//! 提示算法模块（可行交换枚举与策略打分）。

pub mod hint;

pub use hint::{available_moves, has_available_moves, HintAgent, HintStrategy, SwapMove};
