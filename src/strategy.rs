use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::SimulationError;
use crate::hand::{dealer_label, describe_total, hand_value, Rank};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Hit,
    Stand,
}

impl Action {
    pub fn from_code(code: &str) -> Option<Action> {
        match code {
            "H" => Some(Action::Hit),
            "S" => Some(Action::Stand),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Action::Hit => "H",
            Action::Stand => "S",
        }
    }
}

/// Decides whether the player draws another card.
pub trait PlayerPolicy {
    fn decide(&self, hand: &[Rank], dealer_upcard: Rank) -> Action;
}

impl<F> PlayerPolicy for F
where
    F: Fn(&[Rank], Rank) -> Action,
{
    fn decide(&self, hand: &[Rank], dealer_upcard: Rank) -> Action {
        self(hand, dealer_upcard)
    }
}

/// Hit until the total reaches `threshold`, optionally hitting a soft total
/// equal to it as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandOnPolicy {
    pub threshold: u32,
    pub hit_soft: bool,
}

impl Default for StandOnPolicy {
    fn default() -> Self {
        StandOnPolicy {
            threshold: 17,
            hit_soft: false,
        }
    }
}

impl PlayerPolicy for StandOnPolicy {
    fn decide(&self, hand: &[Rank], _dealer_upcard: Rank) -> Action {
        let (value, is_soft) = hand_value(hand);
        if value < self.threshold || (self.hit_soft && is_soft && value == self.threshold) {
            Action::Hit
        } else {
            Action::Stand
        }
    }
}

type StrategyTable = HashMap<String, HashMap<String, Action>>;

/// Hit/stand chart keyed by player total, then dealer upcard label.
#[derive(Debug, Clone, Default)]
pub struct TableStrategy {
    hard: StrategyTable,
    soft: StrategyTable,
}

impl TableStrategy {
    pub fn from_values(
        hard: serde_json::Value,
        soft: serde_json::Value,
    ) -> Result<Self, SimulationError> {
        Ok(TableStrategy {
            hard: value_to_table(hard)?,
            soft: value_to_table(soft)?,
        })
    }

    fn lookup_soft_or_hard(&self, player_label: &str, dealer: &str) -> Option<Action> {
        if let Some(key) = player_label.strip_prefix('S') {
            let soft_result = lookup_action_map(&self.soft, key, dealer);
            if soft_result.is_some() {
                return soft_result;
            }
            return lookup_action_map(&self.hard, key, dealer);
        }
        lookup_action_map(&self.hard, player_label, dealer)
    }
}

impl PlayerPolicy for TableStrategy {
    fn decide(&self, hand: &[Rank], dealer_upcard: Rank) -> Action {
        let player_label = describe_total(hand);
        let dealer = dealer_label(dealer_upcard);
        self.lookup_soft_or_hard(&player_label, &dealer)
            .unwrap_or_else(|| default_action(hand))
    }
}

fn lookup_action_map(table: &StrategyTable, key: &str, dealer: &str) -> Option<Action> {
    table.get(key).and_then(|row| row.get(dealer)).copied()
}

fn value_to_table(value: serde_json::Value) -> Result<StrategyTable, SimulationError> {
    let mut table = HashMap::new();
    if value.is_null() {
        return Ok(table);
    }
    let obj = value
        .as_object()
        .ok_or_else(|| SimulationError::invalid("strategy", "strategy table must be an object"))?;
    for (key, row_value) in obj {
        let row_obj = row_value.as_object().ok_or_else(|| {
            SimulationError::invalid("strategy", format!("row `{key}` must be an object"))
        })?;
        let mut row = HashMap::new();
        for (dealer, action) in row_obj {
            let action = action
                .as_str()
                .and_then(Action::from_code)
                .ok_or_else(|| {
                    SimulationError::invalid(
                        "strategy",
                        format!("cell `{key}`/`{dealer}` must be \"H\" or \"S\", got {action}"),
                    )
                })?;
            row.insert(dealer.clone(), action);
        }
        table.insert(key.clone(), row);
    }
    Ok(table)
}

fn default_action(hand: &[Rank]) -> Action {
    if hand_value(hand).0 < 17 {
        Action::Hit
    } else {
        Action::Stand
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StrategyInput {
    #[serde(rename_all = "camelCase")]
    StandOn {
        #[serde(default = "default_stand_on")]
        threshold: u32,
        #[serde(default)]
        hit_soft: bool,
    },
    Table {
        #[serde(default)]
        hard: serde_json::Value,
        #[serde(default)]
        soft: serde_json::Value,
    },
}

fn default_stand_on() -> u32 {
    17
}

impl Default for StrategyInput {
    fn default() -> Self {
        StrategyInput::StandOn {
            threshold: default_stand_on(),
            hit_soft: false,
        }
    }
}

/// A player policy assembled from configuration.
#[derive(Debug, Clone)]
pub enum Strategy {
    StandOn(StandOnPolicy),
    Table(TableStrategy),
}

impl Strategy {
    pub fn from_input(input: StrategyInput) -> Result<Self, SimulationError> {
        match input {
            StrategyInput::StandOn {
                threshold,
                hit_soft,
            } => {
                if !(1..=21).contains(&threshold) {
                    return Err(SimulationError::invalid(
                        "strategy",
                        format!("stand-on threshold must be within 1..=21, got {threshold}"),
                    ));
                }
                Ok(Strategy::StandOn(StandOnPolicy {
                    threshold,
                    hit_soft,
                }))
            }
            StrategyInput::Table { hard, soft } => {
                Ok(Strategy::Table(TableStrategy::from_values(hard, soft)?))
            }
        }
    }
}

impl PlayerPolicy for Strategy {
    fn decide(&self, hand: &[Rank], dealer_upcard: Rank) -> Action {
        match self {
            Strategy::StandOn(policy) => policy.decide(hand, dealer_upcard),
            Strategy::Table(table) => table.decide(hand, dealer_upcard),
        }
    }
}
