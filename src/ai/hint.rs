use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::game::{find_matches, CellMetrics, Grid, RuleEngine, SwapAction, TokenCounts};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HintStrategy {
    /// 优先红色符文（伤害敌人）。
    Aggressive,
    /// 优先回血与回蓝，尽量避开骷髅。
    Sustain,
    /// 消除数量最多。
    #[default]
    Greedy,
    Random,
}

impl FromStr for HintStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aggressive" | "aggro" => Ok(HintStrategy::Aggressive),
            "sustain" | "defensive" => Ok(HintStrategy::Sustain),
            "greedy" | "default" => Ok(HintStrategy::Greedy),
            "random" => Ok(HintStrategy::Random),
            _ => Err(()),
        }
    }
}

/// 一次能形成三连的交换，以及它第一轮会消除的符文。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwapMove {
    pub action: SwapAction,
    pub cleared: TokenCounts,
    pub score: f64,
}

/// 枚举所有能形成三连的相邻交换，按起点格子行优先排序。
pub fn available_moves(grid: &Grid) -> Vec<SwapMove> {
    let cell = CellMetrics::default();
    let mut moves = Vec::new();
    for (row, col, _) in grid.occupied() {
        for (dr, dc) in [(0, 1), (1, 0)] {
            let to = (row + dr, col + dc);
            if grid.get(to.0, to.1).is_empty() {
                continue;
            }
            let action = SwapAction { from: (row, col), to };
            let mut scratch = grid.clone();
            if RuleEngine::tentative_swap(&mut scratch, &action, &cell).is_err() {
                continue;
            }
            moves.push(SwapMove {
                action,
                cleared: TokenCounts::from_groups(&find_matches(&scratch)),
                score: 0.0,
            });
        }
    }
    moves
}

pub fn has_available_moves(grid: &Grid) -> bool {
    !available_moves(grid).is_empty()
}

#[derive(Debug, Clone, Copy)]
struct StrategyWeights {
    red: f64,
    green: f64,
    blue: f64,
    skull: f64,
    total: f64,
}

impl StrategyWeights {
    fn for_strategy(strategy: HintStrategy) -> Self {
        match strategy {
            HintStrategy::Aggressive => StrategyWeights {
                red: 3.0,
                green: 0.6,
                blue: 0.4,
                skull: -0.5,
                total: 0.5,
            },
            HintStrategy::Sustain => StrategyWeights {
                red: 0.5,
                green: 1.6,
                blue: 2.4,
                skull: -2.0,
                total: 0.3,
            },
            HintStrategy::Greedy | HintStrategy::Random => StrategyWeights {
                red: 0.0,
                green: 0.0,
                blue: 0.0,
                skull: 0.0,
                total: 1.0,
            },
        }
    }

    fn score(&self, cleared: &TokenCounts) -> f64 {
        cleared.red as f64 * self.red
            + cleared.green as f64 * self.green
            + cleared.blue as f64 * self.blue
            + cleared.skull as f64 * self.skull
            + cleared.total() as f64 * self.total
    }
}

/// 提示代理：枚举可行交换并按策略打分。
pub struct HintAgent {
    strategy: HintStrategy,
    rng: SmallRng,
}

impl HintAgent {
    pub fn new(strategy: HintStrategy) -> Self {
        Self {
            strategy,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(strategy: HintStrategy, seed: u64) -> Self {
        Self {
            strategy,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn strategy(&self) -> HintStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: HintStrategy) {
        self.strategy = strategy;
    }

    /// 返回得分最高的交换，同分取最先出现者；无可行交换时返回 `None`。
    pub fn suggest(&mut self, grid: &Grid) -> Option<SwapMove> {
        let weights = StrategyWeights::for_strategy(self.strategy);
        let mut moves = available_moves(grid);
        for candidate in &mut moves {
            candidate.score = weights.score(&candidate.cleared);
        }

        if self.strategy == HintStrategy::Random {
            return moves.choose(&mut self.rng).cloned();
        }

        let mut best: Option<SwapMove> = None;
        for candidate in moves {
            let better = best
                .as_ref()
                .map_or(true, |current| candidate.score > current.score);
            if better {
                best = Some(candidate);
            }
        }
        best
    }
}
