use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::Deserialize;

use crate::{
    deck::{DeckModel, Shoe},
    error::SimulationError,
    game::{BlackjackGame, GameRules, RoundResult},
    hand::{is_valid_rank, Rank},
    stats::{AggregateStatistics, SimulationResult},
    strategy::{PlayerPolicy, Strategy, StrategyInput},
};

fn default_num_decks() -> u8 {
    6
}

fn default_penetration() -> u8 {
    75
}

fn default_bet_size() -> f64 {
    1.0
}

fn default_progress_interval() -> u32 {
    10_000
}

fn default_stand_threshold() -> u32 {
    17
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesInput {
    #[serde(default = "default_stand_threshold")]
    pub dealer_stand_threshold: u32,
    #[serde(default, alias = "dealerHitsSoft")]
    pub dealer_hits_soft_17: bool,
    #[serde(default)]
    pub blackjack_pays: Option<String>,
}

impl Default for RulesInput {
    fn default() -> Self {
        RulesInput {
            dealer_stand_threshold: default_stand_threshold(),
            dealer_hits_soft_17: false,
            blackjack_pays: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationInput {
    #[serde(alias = "iterations")]
    pub num_trials: i64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub deck_model: DeckModel,
    #[serde(default = "default_num_decks")]
    pub num_decks: u8,
    #[serde(default = "default_penetration")]
    pub penetration_threshold: u8,
    #[serde(default)]
    pub rules: RulesInput,
    #[serde(default)]
    pub strategy: StrategyInput,
    #[serde(default = "default_bet_size")]
    pub bet_size: f64,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u32,
}

impl SimulationInput {
    pub fn new(num_trials: i64) -> Self {
        SimulationInput {
            num_trials,
            seed: None,
            deck_model: DeckModel::default(),
            num_decks: default_num_decks(),
            penetration_threshold: default_penetration(),
            rules: RulesInput::default(),
            strategy: StrategyInput::default(),
            bet_size: default_bet_size(),
            progress_interval: default_progress_interval(),
        }
    }

    /// Validates the input and splits it into the runner configuration and
    /// the player policy.
    pub fn into_parts(self) -> Result<(SimulationConfig, Strategy), SimulationError> {
        if self.num_trials <= 0 {
            return Err(SimulationError::invalid(
                "num_trials",
                format!("must be positive, got {}", self.num_trials),
            ));
        }
        let config = SimulationConfig {
            num_trials: self.num_trials as u64,
            deck_model: self.deck_model,
            num_decks: self.num_decks,
            penetration_threshold: self.penetration_threshold,
            rules: to_game_rules(&self.rules)?,
            bet_size: self.bet_size,
        };
        config.validate()?;
        let strategy = Strategy::from_input(self.strategy)?;
        Ok((config, strategy))
    }

    fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        }
    }
}

/// Validated settings for a batch of simulated rounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub num_trials: u64,
    pub deck_model: DeckModel,
    pub num_decks: u8,
    pub penetration_threshold: u8,
    pub rules: GameRules,
    pub bet_size: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            num_trials: 10_000,
            deck_model: DeckModel::Infinite,
            num_decks: default_num_decks(),
            penetration_threshold: default_penetration(),
            rules: GameRules::default(),
            bet_size: default_bet_size(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.num_trials == 0 {
            return Err(SimulationError::invalid("num_trials", "must be positive, got 0"));
        }
        let threshold = self.rules.dealer_stand_threshold;
        if !(17..=21).contains(&threshold) {
            return Err(SimulationError::invalid(
                "dealer_stand_threshold",
                format!("must be within 17..=21, got {threshold}"),
            ));
        }
        if !(1..=8).contains(&self.num_decks) {
            return Err(SimulationError::invalid(
                "num_decks",
                format!("must be within 1..=8, got {}", self.num_decks),
            ));
        }
        if !(1..=100).contains(&self.penetration_threshold) {
            return Err(SimulationError::invalid(
                "penetration_threshold",
                format!("must be a percentage within 1..=100, got {}", self.penetration_threshold),
            ));
        }
        if !self.bet_size.is_finite() || self.bet_size <= 0.0 {
            return Err(SimulationError::invalid(
                "bet_size",
                format!("must be a positive amount, got {}", self.bet_size),
            ));
        }
        let payout = self.rules.blackjack_payout;
        if !payout.is_finite() || payout <= 0.0 {
            return Err(SimulationError::invalid(
                "blackjack_pays",
                format!("payout must be positive, got {payout}"),
            ));
        }
        Ok(())
    }

    fn new_game<R: Rng + ?Sized>(&self, rng: &mut R) -> BlackjackGame {
        let shoe = Shoe::new(self.deck_model, self.num_decks, self.penetration_threshold, rng);
        BlackjackGame::new(shoe, self.rules)
    }
}

pub fn to_game_rules(rules: &RulesInput) -> Result<GameRules, SimulationError> {
    let blackjack_payout = match rules.blackjack_pays.as_deref() {
        Some(ratio) => parse_payout(ratio)?,
        None => 1.5,
    };
    Ok(GameRules {
        dealer_stand_threshold: rules.dealer_stand_threshold,
        dealer_hits_soft: rules.dealer_hits_soft_17,
        blackjack_payout,
    })
}

fn parse_payout(ratio: &str) -> Result<f64, SimulationError> {
    let invalid = || {
        SimulationError::invalid(
            "blackjack_pays",
            format!("expected a ratio such as \"3:2\", got {ratio:?}"),
        )
    };
    let (win, stake) = ratio.split_once(':').ok_or_else(invalid)?;
    let win: u32 = win.trim().parse().map_err(|_| invalid())?;
    let stake: u32 = stake.trim().parse().map_err(|_| invalid())?;
    if win == 0 || stake == 0 {
        return Err(invalid());
    }
    Ok(win as f64 / stake as f64)
}

/// Plays `config.num_trials` independent rounds and tallies their outcomes.
///
/// The configuration is validated before any card is dealt.
pub fn run_trials<P, R>(
    config: &SimulationConfig,
    policy: &P,
    rng: &mut R,
) -> Result<AggregateStatistics, SimulationError>
where
    P: PlayerPolicy + ?Sized,
    R: Rng + ?Sized,
{
    run_trials_with_progress(config, policy, rng, u32::MAX, |_current, _total| {})
}

pub fn run_trials_with_progress<P, R, F>(
    config: &SimulationConfig,
    policy: &P,
    rng: &mut R,
    progress_interval: u32,
    mut progress_cb: F,
) -> Result<AggregateStatistics, SimulationError>
where
    P: PlayerPolicy + ?Sized,
    R: Rng + ?Sized,
    F: FnMut(u64, u64),
{
    config.validate()?;
    log::debug!(
        "running {} trials ({:?}, dealer stands on {})",
        config.num_trials,
        config.deck_model,
        config.rules.dealer_stand_threshold
    );

    let mut game = config.new_game(rng);
    let mut stats = AggregateStatistics::new();
    let progress_interval = u64::from(progress_interval.max(1));

    for trial in 0..config.num_trials {
        let result = game.play_round(policy, config.bet_size, rng);
        stats.record(&result);

        let completed = trial + 1;
        if completed % progress_interval == 0 || completed == config.num_trials {
            progress_cb(completed, config.num_trials);
        }
    }

    Ok(stats)
}

pub fn run(input: SimulationInput) -> Result<SimulationResult, SimulationError> {
    run_with_progress(input, |_current, _total| {})
}

pub fn run_with_progress<F>(
    input: SimulationInput,
    progress_cb: F,
) -> Result<SimulationResult, SimulationError>
where
    F: FnMut(u64, u64),
{
    let mut rng = input.rng();
    let progress_interval = input.progress_interval;
    let (config, strategy) = input.into_parts()?;

    let stats =
        run_trials_with_progress(&config, &strategy, &mut rng, progress_interval, progress_cb)?;
    let result = SimulationResult::from(&stats);
    log_summary(&result);
    Ok(result)
}

/// Splits the trials across `workers` threads. Each worker owns its shoe and
/// an RNG seeded with `seed + worker_index`.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_parallel(
    input: SimulationInput,
    workers: usize,
) -> Result<SimulationResult, SimulationError> {
    if workers == 0 {
        return Err(SimulationError::invalid("workers", "must be at least 1"));
    }
    let base_seed = input.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let (config, strategy) = input.into_parts()?;

    let workers = workers.min(usize::try_from(config.num_trials).unwrap_or(usize::MAX));
    let per_worker = config.num_trials / workers as u64;
    let remainder = config.num_trials % workers as u64;

    let partials: Vec<Result<AggregateStatistics, SimulationError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let worker_config = SimulationConfig {
                    num_trials: per_worker + u64::from((worker as u64) < remainder),
                    ..config
                };
                let strategy = &strategy;
                scope.spawn(move || {
                    log::debug!("worker {worker} starting {} trials", worker_config.num_trials);
                    let mut rng = SmallRng::seed_from_u64(base_seed.wrapping_add(worker as u64));
                    run_trials(&worker_config, strategy, &mut rng)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(partial) => partial,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut stats = AggregateStatistics::new();
    for partial in partials {
        stats.merge(&partial?);
    }
    let result = SimulationResult::from(&stats);
    log_summary(&result);
    Ok(result)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotCheckInput {
    #[serde(alias = "iterations")]
    pub num_trials: i64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub deck_model: DeckModel,
    #[serde(default = "default_num_decks")]
    pub num_decks: u8,
    #[serde(default)]
    pub rules: RulesInput,
    #[serde(default)]
    pub strategy: StrategyInput,
    #[serde(default = "default_bet_size")]
    pub bet_size: f64,
    pub player_cards: Vec<Rank>,
    pub dealer_card: Rank,
}

/// Replays a fixed starting hand against a fixed dealer upcard. Each trial
/// starts from a fresh shoe with the known cards taken out.
pub fn run_spot_check(input: SpotCheckInput) -> Result<SimulationResult, SimulationError> {
    if input.player_cards.len() < 2 {
        return Err(SimulationError::invalid(
            "player_cards",
            "a starting hand needs at least two cards",
        ));
    }
    for &card in input.player_cards.iter().chain(std::iter::once(&input.dealer_card)) {
        if !is_valid_rank(card) {
            return Err(SimulationError::InvalidCard { rank: card });
        }
    }

    let mut rng = match input.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let simulation = SimulationInput {
        num_trials: input.num_trials,
        seed: input.seed,
        deck_model: input.deck_model,
        num_decks: input.num_decks,
        penetration_threshold: 100,
        rules: input.rules,
        strategy: input.strategy,
        bet_size: input.bet_size,
        progress_interval: default_progress_interval(),
    };
    let (config, strategy) = simulation.into_parts()?;
    if config.deck_model == DeckModel::FiniteShoe {
        let copies_per_rank = 4 * usize::from(config.num_decks);
        for &rank in &input.player_cards {
            let dealt = input
                .player_cards
                .iter()
                .chain(std::iter::once(&input.dealer_card))
                .filter(|&&card| card == rank)
                .count();
            if dealt > copies_per_rank {
                return Err(SimulationError::invalid(
                    "player_cards",
                    format!(
                        "{dealt} cards of rank {rank} but a {}-deck shoe holds {copies_per_rank}",
                        config.num_decks
                    ),
                ));
            }
        }
    }
    log::debug!(
        "spot check {:?} against {} over {} trials",
        input.player_cards,
        input.dealer_card,
        config.num_trials
    );

    let mut stats = AggregateStatistics::new();
    for _ in 0..config.num_trials {
        let mut game = config.new_game(&mut rng);
        for &card in &input.player_cards {
            game.shoe.remove_rank(card);
        }
        game.shoe.remove_rank(input.dealer_card);

        let dealer_hole = game.shoe.draw(&mut rng);
        let result = game.play_from(
            input.player_cards.clone(),
            vec![input.dealer_card, dealer_hole],
            &strategy,
            config.bet_size,
            &mut rng,
        );
        stats.record(&result);
    }

    Ok(SimulationResult::from(&stats))
}

/// Deals and plays a single round.
pub fn play_single_round(input: SimulationInput) -> Result<RoundResult, SimulationError> {
    let mut rng = input.rng();
    let (config, strategy) = input.into_parts()?;
    let mut game = config.new_game(&mut rng);
    Ok(game.play_round(&strategy, config.bet_size, &mut rng))
}

fn log_summary(result: &SimulationResult) {
    log::info!(
        "{} rounds: {} won, {} pushed, {} lost, EV {:+.4} per round",
        result.total_games,
        result.wins,
        result.pushes,
        result.losses,
        result.expected_value
    );
}
