use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::hand::{Rank, ACE, KING};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeckModel {
    /// Every draw is an independent uniform rank.
    #[default]
    Infinite,
    /// `num_decks` standard decks dealt without replacement.
    FiniteShoe,
}

/// A finite shoe of standard 52-card decks.
#[derive(Debug, Clone)]
pub struct Deck {
    pub num_decks: u8,
    cards: Vec<Rank>,
    dealt: usize,
    penetration_threshold: u8,
}

impl Deck {
    /// Builds and shuffles a shoe of `num_decks` decks, at least one.
    pub fn new<R: Rng + ?Sized>(num_decks: u8, penetration_threshold: u8, rng: &mut R) -> Self {
        let num_decks = num_decks.max(1);
        let mut deck = Deck {
            num_decks,
            cards: Vec::with_capacity(num_decks as usize * 52),
            dealt: 0,
            penetration_threshold,
        };
        deck.shuffle(rng);
        deck
    }

    /// A single-deck shoe that deals `order` front to back before falling back
    /// to a freshly shuffled deck.
    pub fn stacked(order: &[Rank]) -> Self {
        Deck {
            num_decks: 1,
            cards: order.iter().rev().copied().collect(),
            dealt: 0,
            penetration_threshold: 100,
        }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.clear();
        self.dealt = 0;

        for _ in 0..self.num_decks {
            for rank in ACE..=KING {
                for _ in 0..4 {
                    self.cards.push(rank);
                }
            }
        }

        self.cards.shuffle(rng);
    }

    pub fn deal_card<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Rank {
        if self.cards.is_empty() {
            log::trace!("shoe exhausted mid-round, reshuffling");
            self.shuffle(rng);
        }
        let card = self.cards.pop().expect("deck should not be empty");
        self.dealt += 1;
        card
    }

    pub fn remaining_cards(&self) -> usize {
        self.cards.len()
    }

    /// Percentage of the full shoe dealt since the last shuffle.
    pub fn penetration(&self) -> f64 {
        let total_cards = (self.num_decks as usize) * 52;
        (self.dealt as f64 / total_cards as f64) * 100.0
    }

    pub fn should_reshuffle(&self) -> bool {
        self.penetration() >= self.penetration_threshold as f64
    }

    pub fn remove_card_by_rank(&mut self, rank: Rank) -> bool {
        if let Some(pos) = self.cards.iter().position(|&c| c == rank) {
            self.cards.remove(pos);
            true
        } else {
            false
        }
    }
}

/// Where a round's cards come from.
#[derive(Debug, Clone)]
pub enum Shoe {
    Infinite,
    Finite(Deck),
}

impl Shoe {
    pub fn new<R: Rng + ?Sized>(
        model: DeckModel,
        num_decks: u8,
        penetration_threshold: u8,
        rng: &mut R,
    ) -> Self {
        match model {
            DeckModel::Infinite => Shoe::Infinite,
            DeckModel::FiniteShoe => Shoe::Finite(Deck::new(num_decks, penetration_threshold, rng)),
        }
    }

    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Rank {
        match self {
            Shoe::Infinite => rng.gen_range(ACE..=KING),
            Shoe::Finite(deck) => deck.deal_card(rng),
        }
    }

    /// Reshuffles a finite shoe once it is dealt past its penetration marker.
    pub fn prepare_round<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if let Shoe::Finite(deck) = self {
            if deck.should_reshuffle() {
                log::trace!(
                    "reshuffling {}-deck shoe at {:.1}% penetration",
                    deck.num_decks,
                    deck.penetration()
                );
                deck.shuffle(rng);
            }
        }
    }

    pub fn remove_rank(&mut self, rank: Rank) -> bool {
        match self {
            Shoe::Infinite => false,
            Shoe::Finite(deck) => deck.remove_card_by_rank(rank),
        }
    }
}
