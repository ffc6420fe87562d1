use std::collections::BTreeMap;
use std::ops::AddAssign;

use serde::Serialize;

use crate::game::{Outcome, RoundResult};

/// Outcome counts and money totals over a batch of rounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatistics {
    pub trials: u64,
    pub outcomes: BTreeMap<Outcome, u64>,
    pub total_bet: f64,
    pub total_winnings: f64,
}

impl AggregateStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &RoundResult) {
        self.trials += 1;
        *self.outcomes.entry(result.outcome).or_default() += 1;
        self.total_bet += result.bet;
        self.total_winnings += result.winnings;
    }

    /// Folds another batch into this one. Counts add exactly, so merge order
    /// does not change them.
    pub fn merge(&mut self, other: &AggregateStatistics) {
        self.trials += other.trials;
        for (outcome, count) in &other.outcomes {
            *self.outcomes.entry(*outcome).or_default() += count;
        }
        self.total_bet += other.total_bet;
        self.total_winnings += other.total_winnings;
    }

    pub fn count(&self, outcome: Outcome) -> u64 {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    pub fn total_count(&self) -> u64 {
        self.outcomes.values().sum()
    }

    /// Rounds won, naturals included.
    pub fn wins(&self) -> u64 {
        self.count(Outcome::Win) + self.count(Outcome::Blackjack)
    }

    /// Rounds lost, busts included.
    pub fn losses(&self) -> u64 {
        self.count(Outcome::Loss) + self.count(Outcome::Bust)
    }

    pub fn expected_value(&self) -> f64 {
        if self.trials > 0 {
            self.total_winnings / self.trials as f64
        } else {
            0.0
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.trials > 0 {
            (self.wins() as f64 / self.trials as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn return_rate(&self) -> f64 {
        if self.total_bet.abs() > f64::EPSILON {
            (self.total_winnings / self.total_bet) * 100.0
        } else {
            0.0
        }
    }
}

impl AddAssign for AggregateStatistics {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

impl AddAssign<&RoundResult> for AggregateStatistics {
    fn add_assign(&mut self, rhs: &RoundResult) {
        self.record(rhs);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub total_games: u64,
    pub wins: u64,
    pub losses: u64,
    pub pushes: u64,
    pub blackjacks: u64,
    pub busts: u64,
    pub total_winnings: f64,
    pub total_bet: f64,
    pub expected_value: f64,
    pub win_rate: f64,
    pub return_rate: f64,
    pub outcomes: BTreeMap<Outcome, u64>,
}

impl From<&AggregateStatistics> for SimulationResult {
    fn from(stats: &AggregateStatistics) -> Self {
        SimulationResult {
            total_games: stats.trials,
            wins: stats.wins(),
            losses: stats.losses(),
            pushes: stats.count(Outcome::Push),
            blackjacks: stats.count(Outcome::Blackjack),
            busts: stats.count(Outcome::Bust),
            total_winnings: stats.total_winnings,
            total_bet: stats.total_bet,
            expected_value: stats.expected_value(),
            win_rate: stats.win_rate(),
            return_rate: stats.return_rate(),
            outcomes: stats.outcomes.clone(),
        }
    }
}
