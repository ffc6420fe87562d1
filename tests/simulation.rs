use monte_carlo_blackjack::{
    deck::DeckModel,
    game::{GameRules, Outcome},
    run_trials,
    sim::{self, SpotCheckInput},
    strategy::{Action, StandOnPolicy},
    Rank, SimulationConfig, SimulationError, SimulationInput,
};
use rand::{rngs::SmallRng, SeedableRng};
use serde_json::json;

#[test]
fn json_configured_simulation() {
    let input: SimulationInput = serde_json::from_value(json!({
        "numTrials": 20_000,
        "seed": 42,
        "deckModel": "finite-shoe",
        "numDecks": 6,
        "penetrationThreshold": 75,
        "rules": { "dealerStandThreshold": 17, "dealerHitsSoft17": true, "blackjackPays": "6:5" },
        "strategy": { "kind": "stand-on", "threshold": 17 }
    }))
    .unwrap();

    let result = sim::run(input).unwrap();
    assert_eq!(result.total_games, 20_000);
    assert_eq!(result.outcomes.values().sum::<u64>(), 20_000);
    assert_eq!(
        result.wins + result.losses + result.pushes,
        result.total_games
    );
    // mimicking the dealer loses money over this many rounds
    assert!(result.expected_value < 0.0);
}

#[test]
fn iterations_alias_and_defaults() {
    let input: SimulationInput =
        serde_json::from_value(json!({ "iterations": 50, "seed": 1 })).unwrap();
    assert_eq!(input.num_trials, 50);
    assert_eq!(input.deck_model, DeckModel::Infinite);
    assert_eq!(sim::run(input).unwrap().total_games, 50);
}

#[test]
fn table_strategy_from_json() {
    let input: SimulationInput = serde_json::from_value(json!({
        "numTrials": 1_000,
        "seed": 7,
        "strategy": {
            "kind": "table",
            "hard": { "12": { "2": "H", "3": "H", "4": "S", "5": "S", "6": "S" } },
            "soft": { "18": { "9": "H", "10": "H", "A": "H" } }
        }
    }))
    .unwrap();
    let result = sim::run(input).unwrap();
    assert_eq!(result.total_games, 1_000);
}

#[test]
fn invalid_configuration_names_the_field() {
    let input: SimulationInput = serde_json::from_value(json!({
        "numTrials": 100,
        "rules": { "dealerStandThreshold": 16 }
    }))
    .unwrap();
    let err = sim::run(input).unwrap_err();
    assert!(err.to_string().contains("dealer_stand_threshold"));

    let input: SimulationInput = serde_json::from_value(json!({ "numTrials": 0 })).unwrap();
    assert!(matches!(
        sim::run(input),
        Err(SimulationError::InvalidConfiguration { field: "num_trials", .. })
    ));

    let input: SimulationInput = serde_json::from_value(json!({
        "numTrials": 10,
        "strategy": { "kind": "table", "hard": { "11": { "6": "D" } } }
    }))
    .unwrap();
    assert_eq!(sim::run(input).unwrap_err().field(), Some("strategy"));
}

#[test]
fn custom_policy_closure() {
    let config = SimulationConfig {
        num_trials: 2_500,
        deck_model: DeckModel::FiniteShoe,
        num_decks: 2,
        rules: GameRules {
            dealer_stand_threshold: 18,
            ..GameRules::default()
        },
        ..SimulationConfig::default()
    };
    // hit anything under 12, stand otherwise
    let cautious = |hand: &[Rank], _dealer_up: Rank| {
        if monte_carlo_blackjack::hand_value(hand).0 < 12 {
            Action::Hit
        } else {
            Action::Stand
        }
    };

    let mut rng = SmallRng::seed_from_u64(2024);
    let stats = run_trials(&config, &cautious, &mut rng).unwrap();
    assert_eq!(stats.total_count(), 2_500);
    assert_eq!(stats.count(Outcome::Bust), 0);
}

#[test]
fn parallel_and_sequential_merge_shapes_agree() {
    let mut input = SimulationInput::new(4_000);
    input.seed = Some(77);
    input.deck_model = DeckModel::FiniteShoe;

    let parallel = sim::run_parallel(input, 3).unwrap();
    assert_eq!(parallel.total_games, 4_000);
    assert_eq!(parallel.outcomes.values().sum::<u64>(), 4_000);

    let mut rng = SmallRng::seed_from_u64(77);
    let config = SimulationConfig {
        num_trials: 4_000,
        ..SimulationConfig::default()
    };
    let sequential = run_trials(&config, &StandOnPolicy::default(), &mut rng).unwrap();
    assert_eq!(sequential.total_count(), parallel.total_games);
}

#[test]
fn spot_check_hard_sixteen() {
    let input: SpotCheckInput = serde_json::from_value(json!({
        "numTrials": 500,
        "seed": 9,
        "deckModel": "finite-shoe",
        "numDecks": 6,
        "playerCards": [10, 6],
        "dealerCard": 10
    }))
    .unwrap();
    let result = sim::run_spot_check(input).unwrap();
    assert_eq!(result.total_games, 500);
    assert_eq!(result.blackjacks, 0);
    assert!(result.expected_value < 0.0);
}
