/// A card rank: 1 is an Ace, 2-10 count their face value, 11-13 are J, Q, K.
pub type Rank = u8;

pub const ACE: Rank = 1;
pub const KING: Rank = 13;

pub fn card_value(card: Rank) -> u32 {
    match card {
        11 | 12 | 13 => 10,
        _ => card as u32, // Ace counts 1 here, promoted in hand_value
    }
}

/// Best blackjack total for `hand` and whether an Ace is being counted as 11.
///
/// Aces start at 1 and are promoted to 11 one at a time while the total stays
/// at or below 21. Ranks outside 1..=13 are not checked.
pub fn hand_value(hand: &[Rank]) -> (u32, bool) {
    let mut total = 0;
    let mut aces = 0;

    for &card in hand {
        total += card_value(card);
        if card == ACE {
            aces += 1;
        }
    }

    let mut promoted = 0;
    while aces > 0 && total + 10 <= 21 {
        total += 10;
        aces -= 1;
        promoted += 1;
    }

    (total, promoted > 0)
}

pub fn is_blackjack(hand: &[Rank]) -> bool {
    hand.len() == 2 && hand_value(hand).0 == 21
}

pub fn is_bust(hand: &[Rank]) -> bool {
    hand_value(hand).0 > 21
}

pub fn is_valid_rank(card: Rank) -> bool {
    (ACE..=KING).contains(&card)
}

/// Label used to look a hand up in a strategy table, e.g. `"S18"` or `"13"`.
pub fn describe_total(hand: &[Rank]) -> String {
    let (value, is_soft) = hand_value(hand);
    if is_soft {
        format!("S{}", value)
    } else {
        value.to_string()
    }
}

pub fn dealer_label(card: Rank) -> String {
    if card == ACE {
        "A".to_string()
    } else {
        card_value(card).to_string()
    }
}
