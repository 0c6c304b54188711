use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::config::BattleConfig;
use super::grid::TokenType;
use super::matcher::MatchGroup;
use super::state::{GameEvent, GameState};

/// 英雄与敌人的数值。所有修改都钳制在 `[0, max]`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleState {
    pub hero_hp: u32,
    pub hero_max_hp: u32,
    pub enemy_hp: u32,
    pub enemy_max_hp: u32,
    pub hero_mana: u32,
    pub hero_max_mana: u32,
}

impl BattleState {
    pub fn from_config(config: &BattleConfig) -> Self {
        Self {
            hero_hp: config.hero_max_hp,
            hero_max_hp: config.hero_max_hp,
            enemy_hp: config.enemy_max_hp,
            enemy_max_hp: config.enemy_max_hp,
            hero_mana: config.hero_start_mana.min(config.hero_max_mana),
            hero_max_mana: config.hero_max_mana,
        }
    }

    pub fn damage_enemy(&mut self, amount: u32) -> u32 {
        let before = self.enemy_hp;
        self.enemy_hp = self.enemy_hp.saturating_sub(amount);
        before - self.enemy_hp
    }

    pub fn damage_hero(&mut self, amount: u32) -> u32 {
        let before = self.hero_hp;
        self.hero_hp = self.hero_hp.saturating_sub(amount);
        before - self.hero_hp
    }

    pub fn heal_hero(&mut self, amount: u32) -> u32 {
        let before = self.hero_hp;
        self.hero_hp = self.hero_hp.saturating_add(amount).min(self.hero_max_hp);
        self.hero_hp.saturating_sub(before)
    }

    pub fn restore_mana(&mut self, amount: u32) -> u32 {
        let before = self.hero_mana;
        self.hero_mana = self.hero_mana.saturating_add(amount).min(self.hero_max_mana);
        self.hero_mana.saturating_sub(before)
    }

    pub fn within_bounds(&self) -> bool {
        self.hero_hp <= self.hero_max_hp
            && self.enemy_hp <= self.enemy_max_hp
            && self.hero_mana <= self.hero_max_mana
    }
}

/// 每种符文被消除的格子数（同一格子只计一次）。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCounts {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
    pub skull: u32,
}

impl TokenCounts {
    pub fn from_groups(groups: &[MatchGroup]) -> Self {
        let mut seen = BTreeSet::new();
        let mut counts = TokenCounts::default();
        for group in groups {
            for cell in &group.cells {
                if seen.insert(*cell) {
                    counts.add(group.token, 1);
                }
            }
        }
        counts
    }

    pub fn add(&mut self, token: TokenType, count: u32) {
        match token {
            TokenType::None => {}
            TokenType::Red => self.red += count,
            TokenType::Green => self.green += count,
            TokenType::Blue => self.blue += count,
            TokenType::Skull => self.skull += count,
        }
    }

    pub fn get(&self, token: TokenType) -> u32 {
        match token {
            TokenType::None => 0,
            TokenType::Red => self.red,
            TokenType::Green => self.green,
            TokenType::Blue => self.blue,
            TokenType::Skull => self.skull,
        }
    }

    pub fn merge(&mut self, other: &TokenCounts) {
        for token in TokenType::BATTLE_PALETTE {
            self.add(token, other.get(token));
        }
    }

    pub fn total(&self) -> u32 {
        self.red + self.green + self.blue + self.skull
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenType, u32)> + '_ {
        TokenType::BATTLE_PALETTE
            .into_iter()
            .map(move |token| (token, self.get(token)))
            .filter(|(_, count)| *count > 0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BattleEffect {
    DamageEnemy { per_cell: u32 },
    HealHero { per_cell: u32 },
    RestoreMana { per_cell: u32 },
    DamageHero { per_cell: u32 },
}

impl BattleEffect {
    pub fn apply(&self, battle: &mut BattleState, count: u32) -> Option<GameEvent> {
        if count == 0 {
            return None;
        }
        let event = match *self {
            BattleEffect::DamageEnemy { per_cell } => {
                let amount = battle.damage_enemy(per_cell.saturating_mul(count));
                GameEvent::EnemyDamaged {
                    amount,
                    remaining: battle.enemy_hp,
                }
            }
            BattleEffect::HealHero { per_cell } => {
                let amount = battle.heal_hero(per_cell.saturating_mul(count));
                GameEvent::HeroHealed {
                    amount,
                    hp: battle.hero_hp,
                }
            }
            BattleEffect::RestoreMana { per_cell } => {
                let amount = battle.restore_mana(per_cell.saturating_mul(count));
                GameEvent::ManaRestored {
                    amount,
                    mana: battle.hero_mana,
                }
            }
            BattleEffect::DamageHero { per_cell } => {
                let amount = battle.damage_hero(per_cell.saturating_mul(count));
                GameEvent::HeroDamaged {
                    amount,
                    remaining: battle.hero_hp,
                }
            }
        };
        Some(event)
    }
}

/// 把消除数量换算为战斗数值变化，并检测胜负。
#[derive(Debug, Clone, Default)]
pub struct BattleResolver {
    config: BattleConfig,
}

impl BattleResolver {
    pub fn new(config: BattleConfig) -> Self {
        Self { config }
    }

    pub fn effect_for(&self, token: TokenType) -> Option<BattleEffect> {
        match token {
            TokenType::None => None,
            TokenType::Red => Some(BattleEffect::DamageEnemy {
                per_cell: self.config.red_damage,
            }),
            TokenType::Blue => Some(BattleEffect::HealHero {
                per_cell: self.config.blue_heal,
            }),
            TokenType::Green => Some(BattleEffect::RestoreMana {
                per_cell: self.config.green_mana,
            }),
            TokenType::Skull => Some(BattleEffect::DamageHero {
                per_cell: self.config.skull_damage,
            }),
        }
    }

    /// 按消除数量结算全部效果，然后判定是否进入终止状态。仅在 `Playing` 时生效。
    pub fn resolve(
        &self,
        battle: &mut BattleState,
        state: &mut GameState,
        counts: &TokenCounts,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if *state != GameState::Playing {
            return events;
        }

        for (token, count) in counts.iter() {
            if let Some(event) = self
                .effect_for(token)
                .and_then(|effect| effect.apply(battle, count))
            {
                events.push(event);
            }
        }

        if let Some(next) = Self::evaluate_outcome(battle) {
            events.push(GameEvent::StateChanged {
                from: *state,
                to: next,
            });
            *state = next;
        }
        events
    }

    /// 敌人归零优先于英雄归零。
    pub fn evaluate_outcome(battle: &BattleState) -> Option<GameState> {
        if battle.enemy_hp == 0 {
            Some(GameState::Victory)
        } else if battle.hero_hp == 0 {
            Some(GameState::Defeat)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::matcher::Axis;

    fn group(token: TokenType, axis: Axis, cells: &[(i32, i32)]) -> MatchGroup {
        MatchGroup {
            token,
            axis,
            cells: cells.to_vec(),
        }
    }

    fn playing_battle() -> (BattleState, GameState) {
        (
            BattleState::from_config(&BattleConfig::default()),
            GameState::Playing,
        )
    }

    #[test]
    fn red_clear_can_win_the_battle() {
        let resolver = BattleResolver::default();
        let (mut battle, mut state) = playing_battle();
        battle.enemy_hp = 25;

        let counts = TokenCounts::from_groups(&[group(
            TokenType::Red,
            Axis::Horizontal,
            &[(0, 0), (0, 1), (0, 2)],
        )]);
        let events = resolver.resolve(&mut battle, &mut state, &counts);

        assert_eq!(battle.enemy_hp, 0);
        assert_eq!(state, GameState::Victory);
        assert!(events.contains(&GameEvent::EnemyDamaged {
            amount: 25,
            remaining: 0
        }));
    }

    #[test]
    fn heal_and_mana_are_capped() {
        let resolver = BattleResolver::default();
        let (mut battle, mut state) = playing_battle();
        battle.hero_hp = 98;
        battle.hero_mana = 95;

        let mut counts = TokenCounts::default();
        counts.add(TokenType::Blue, 3);
        counts.add(TokenType::Green, 4);
        resolver.resolve(&mut battle, &mut state, &counts);

        assert_eq!(battle.hero_hp, battle.hero_max_hp);
        assert_eq!(battle.hero_mana, battle.hero_max_mana);
        assert_eq!(state, GameState::Playing);
    }

    #[test]
    fn skulls_can_defeat_the_hero() {
        let resolver = BattleResolver::default();
        let (mut battle, mut state) = playing_battle();
        battle.hero_hp = 20;

        let mut counts = TokenCounts::default();
        counts.add(TokenType::Skull, 3);
        resolver.resolve(&mut battle, &mut state, &counts);

        assert_eq!(battle.hero_hp, 0);
        assert_eq!(state, GameState::Defeat);
    }

    #[test]
    fn enemy_death_takes_priority_over_hero_death() {
        let resolver = BattleResolver::default();
        let (mut battle, mut state) = playing_battle();
        battle.hero_hp = 10;
        battle.enemy_hp = 10;

        let mut counts = TokenCounts::default();
        counts.add(TokenType::Skull, 3);
        counts.add(TokenType::Red, 3);
        resolver.resolve(&mut battle, &mut state, &counts);

        assert_eq!(battle.hero_hp, 0);
        assert_eq!(battle.enemy_hp, 0);
        assert_eq!(state, GameState::Victory);
    }

    #[test]
    fn no_effect_outside_playing() {
        let resolver = BattleResolver::default();
        let (mut battle, _) = playing_battle();
        let before = battle;
        let mut state = GameState::Defeat;

        let mut counts = TokenCounts::default();
        counts.add(TokenType::Red, 5);
        let events = resolver.resolve(&mut battle, &mut state, &counts);

        assert!(events.is_empty());
        assert_eq!(battle, before);
        assert_eq!(state, GameState::Defeat);
    }

    #[test]
    fn shared_cells_count_once() {
        let groups = [
            group(TokenType::Red, Axis::Horizontal, &[(2, 0), (2, 1), (2, 2)]),
            group(TokenType::Red, Axis::Vertical, &[(0, 2), (1, 2), (2, 2)]),
        ];
        let counts = TokenCounts::from_groups(&groups);
        assert_eq!(counts.red, 5);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn stats_stay_clamped_over_many_effects() {
        let resolver = BattleResolver::default();
        let mut battle = BattleState::from_config(&BattleConfig::default());
        let sequence = [
            (TokenType::Blue, 7),
            (TokenType::Skull, 4),
            (TokenType::Green, 30),
            (TokenType::Blue, 2),
            (TokenType::Red, 3),
            (TokenType::Skull, 12),
        ];
        for (token, count) in sequence {
            let mut state = GameState::Playing;
            let mut counts = TokenCounts::default();
            counts.add(token, count);
            resolver.resolve(&mut battle, &mut state, &counts);
            assert!(battle.within_bounds(), "stats out of range: {battle:?}");
        }
        assert_eq!(battle.hero_hp, 0);
    }
}
