use rand::Rng;
use serde::Serialize;

use crate::{
    deck::Shoe,
    hand::{hand_value, is_blackjack, Rank},
    strategy::{Action, PlayerPolicy},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameRules {
    /// Total at which the dealer stops drawing.
    pub dealer_stand_threshold: u32,
    /// Dealer also draws on a soft total equal to the threshold. Never applies
    /// at 21.
    pub dealer_hits_soft: bool,
    /// Payout multiple for a player natural, e.g. 1.5 for 3:2.
    pub blackjack_payout: f64,
}

impl Default for GameRules {
    fn default() -> Self {
        GameRules {
            dealer_stand_threshold: 17,
            dealer_hits_soft: false,
            blackjack_payout: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Blackjack,
    Win,
    Push,
    Loss,
    Bust,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub outcome: Outcome,
    pub bet: f64,
    pub winnings: f64,
    pub player_cards: Vec<Rank>,
    pub dealer_cards: Vec<Rank>,
    pub player_total: u32,
    pub dealer_total: u32,
}

pub struct BlackjackGame {
    pub shoe: Shoe,
    pub rules: GameRules,
}

impl BlackjackGame {
    pub fn new(shoe: Shoe, rules: GameRules) -> Self {
        BlackjackGame { shoe, rules }
    }

    /// Deals and plays one full round.
    pub fn play_round<P, R>(&mut self, policy: &P, bet_size: f64, rng: &mut R) -> RoundResult
    where
        P: PlayerPolicy + ?Sized,
        R: Rng + ?Sized,
    {
        self.shoe.prepare_round(rng);

        let player_cards = vec![self.shoe.draw(rng), self.shoe.draw(rng)];
        let dealer_cards = vec![self.shoe.draw(rng), self.shoe.draw(rng)];

        self.play_from(player_cards, dealer_cards, policy, bet_size, rng)
    }

    /// Plays a round whose opening cards are already dealt. The first dealer
    /// card is the upcard.
    pub fn play_from<P, R>(
        &mut self,
        mut player_cards: Vec<Rank>,
        dealer_cards: Vec<Rank>,
        policy: &P,
        bet_size: f64,
        rng: &mut R,
    ) -> RoundResult
    where
        P: PlayerPolicy + ?Sized,
        R: Rng + ?Sized,
    {
        let dealer_up = dealer_cards[0];

        if is_blackjack(&player_cards) {
            let (outcome, winnings) = if is_blackjack(&dealer_cards) {
                (Outcome::Push, 0.0)
            } else {
                (Outcome::Blackjack, bet_size * self.rules.blackjack_payout)
            };
            return Self::settle(outcome, bet_size, winnings, player_cards, dealer_cards);
        }

        if is_blackjack(&dealer_cards) {
            return Self::settle(Outcome::Loss, bet_size, -bet_size, player_cards, dealer_cards);
        }

        while hand_value(&player_cards).0 < 21 {
            match policy.decide(&player_cards, dealer_up) {
                Action::Hit => player_cards.push(self.shoe.draw(rng)),
                Action::Stand => break,
            }
        }

        let player_value = hand_value(&player_cards).0;
        if player_value > 21 {
            return Self::settle(Outcome::Bust, bet_size, -bet_size, player_cards, dealer_cards);
        }

        let dealer_final = self.play_dealer(dealer_cards, rng);
        let dealer_value = hand_value(&dealer_final).0;

        let (outcome, winnings) = if dealer_value > 21 || player_value > dealer_value {
            (Outcome::Win, bet_size)
        } else if player_value < dealer_value {
            (Outcome::Loss, -bet_size)
        } else {
            (Outcome::Push, 0.0)
        };

        Self::settle(outcome, bet_size, winnings, player_cards, dealer_final)
    }

    pub fn play_dealer<R: Rng + ?Sized>(&mut self, mut hand: Vec<Rank>, rng: &mut R) -> Vec<Rank> {
        let threshold = self.rules.dealer_stand_threshold;
        loop {
            let (value, is_soft) = hand_value(&hand);
            if value > threshold || value >= 21 {
                break;
            }
            if value == threshold && !(self.rules.dealer_hits_soft && is_soft) {
                break;
            }
            hand.push(self.shoe.draw(rng));
        }
        hand
    }

    fn settle(
        outcome: Outcome,
        bet: f64,
        winnings: f64,
        player_cards: Vec<Rank>,
        dealer_cards: Vec<Rank>,
    ) -> RoundResult {
        RoundResult {
            outcome,
            bet,
            winnings,
            player_total: hand_value(&player_cards).0,
            dealer_total: hand_value(&dealer_cards).0,
            player_cards,
            dealer_cards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Deck;
    use crate::strategy::StandOnPolicy;
    use rand::{rngs::SmallRng, SeedableRng};

    // Stacked order: player, player, dealer up, dealer hole, then draws.
    fn stacked_game(order: &[Rank], rules: GameRules) -> BlackjackGame {
        BlackjackGame::new(Shoe::Finite(Deck::stacked(order)), rules)
    }

    fn play(order: &[Rank]) -> RoundResult {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut game = stacked_game(order, GameRules::default());
        game.play_round(&StandOnPolicy::default(), 1.0, &mut rng)
    }

    #[test]
    fn player_natural_pays_three_to_two() {
        let result = play(&[1, 13, 10, 7]);
        assert_eq!(result.outcome, Outcome::Blackjack);
        assert_eq!(result.winnings, 1.5);
        assert_eq!(result.dealer_cards, vec![10, 7]);
    }

    #[test]
    fn both_naturals_push() {
        let result = play(&[1, 13, 12, 1]);
        assert_eq!(result.outcome, Outcome::Push);
        assert_eq!(result.winnings, 0.0);
    }

    #[test]
    fn dealer_natural_beats_player() {
        let result = play(&[10, 9, 1, 11]);
        assert_eq!(result.outcome, Outcome::Loss);
        assert_eq!(result.winnings, -1.0);
        assert_eq!(result.player_cards.len(), 2);
    }

    #[test]
    fn player_bust_skips_dealer() {
        // 10+6 hits a queen
        let result = play(&[10, 6, 9, 5, 12]);
        assert_eq!(result.outcome, Outcome::Bust);
        assert_eq!(result.player_total, 26);
        assert_eq!(result.dealer_cards, vec![9, 5]);
    }

    #[test]
    fn dealer_bust_is_a_win() {
        // player stands on 18, dealer 16 draws a ten
        let result = play(&[10, 8, 10, 6, 13]);
        assert_eq!(result.outcome, Outcome::Win);
        assert_eq!(result.dealer_total, 26);
        assert_eq!(result.winnings, 1.0);
    }

    #[test]
    fn equal_totals_push() {
        let result = play(&[10, 8, 10, 8]);
        assert_eq!(result.outcome, Outcome::Push);
    }

    #[test]
    fn higher_dealer_total_loses() {
        let result = play(&[10, 7, 10, 9]);
        assert_eq!(result.outcome, Outcome::Loss);
        assert_eq!(result.winnings, -1.0);
    }

    #[test]
    fn dealer_soft_seventeen_rule() {
        let mut rng = SmallRng::seed_from_u64(0);
        let stands = GameRules::default();
        let mut game = stacked_game(&[1, 6, 3], stands);
        assert_eq!(game.play_dealer(vec![1, 6], &mut rng), vec![1, 6]);

        let hits = GameRules {
            dealer_hits_soft: true,
            ..GameRules::default()
        };
        let mut game = stacked_game(&[3], hits);
        assert_eq!(game.play_dealer(vec![1, 6], &mut rng), vec![1, 6, 3]);
    }

    #[test]
    fn dealer_respects_custom_threshold() {
        let mut rng = SmallRng::seed_from_u64(0);
        let rules = GameRules {
            dealer_stand_threshold: 19,
            ..GameRules::default()
        };
        let mut game = stacked_game(&[2, 5], rules);
        assert_eq!(game.play_dealer(vec![10, 8], &mut rng), vec![10, 8, 2]);
    }

    #[test]
    fn dealer_stands_on_soft_twenty_one_when_hitting_soft() {
        let mut rng = SmallRng::seed_from_u64(0);
        let rules = GameRules {
            dealer_stand_threshold: 21,
            dealer_hits_soft: true,
            ..GameRules::default()
        };
        let mut game = stacked_game(&[6, 10], rules);
        assert_eq!(game.play_dealer(vec![1, 5, 5], &mut rng), vec![1, 5, 5]);

        // soft 20 is still below the threshold
        let mut game = stacked_game(&[1], rules);
        assert_eq!(game.play_dealer(vec![1, 9], &mut rng), vec![1, 9, 1]);
    }

    #[test]
    fn player_stops_drawing_at_twenty_one() {
        let always_hit = |_: &[Rank], _: Rank| Action::Hit;
        let mut rng = SmallRng::seed_from_u64(0);
        let mut game = stacked_game(&[5, 6, 10, 7, 10], GameRules::default());
        let result = game.play_round(&always_hit, 2.0, &mut rng);
        assert_eq!(result.player_cards, vec![5, 6, 10]);
        assert_eq!(result.outcome, Outcome::Win);
        assert_eq!(result.winnings, 2.0);
    }
}
