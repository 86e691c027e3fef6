use serde::{Deserialize, Serialize};

use crate::hand::Hand;

/// Soft totals at or above this always stand.
const SOFT_STAND: u32 = 8;
/// Soft total that stands only against a weak dealer.
const SOFT_BORDERLINE: u32 = 7;
/// Hard totals at or above this always stand.
const HARD_STAND: u32 = 17;
/// Lowest hard total of the "stiff" band (13..=16).
const STIFF_LOW: u32 = 13;
const HARD_TWELVE: u32 = 12;
/// Dealer totals in this band are treated as weak.
const DEALER_WEAK_LOW: u32 = 4;
const DEALER_WEAK_HIGH: u32 = 6;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
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

    pub fn as_word(&self) -> &'static str {
        match self {
            Action::Hit => "hit",
            Action::Stand => "stand",
        }
    }
}

fn dealer_is_weak(dealer_sum: u32) -> bool {
    (DEALER_WEAK_LOW..=DEALER_WEAK_HIGH).contains(&dealer_sum)
}

/// Basic-strategy advice for the player's hand against the dealer's.
///
/// Hands holding an ace are judged on their soft total: the best sum of the
/// non-ace cards plus one per ace. Everything else is judged on the plain
/// best sum. The dealer side always uses the whole dealer hand.
pub fn recommend(dealer: &Hand, player: &Hand) -> Action {
    let dealer_sum = dealer.best_sum();

    if player.has_ace() {
        let soft_total = player.without_aces().best_sum() + player.ace_count();
        return if soft_total >= SOFT_STAND {
            Action::Stand
        } else if soft_total == SOFT_BORDERLINE && dealer_is_weak(dealer_sum) {
            Action::Stand
        } else {
            Action::Hit
        };
    }

    let player_sum = player.best_sum();
    if player_sum >= HARD_STAND {
        Action::Stand
    } else if player_sum >= STIFF_LOW {
        if dealer_sum > DEALER_WEAK_HIGH {
            Action::Hit
        } else {
            Action::Stand
        }
    } else if player_sum == HARD_TWELVE {
        if dealer_sum < DEALER_WEAK_LOW || dealer_sum > DEALER_WEAK_HIGH {
            Action::Hit
        } else {
            Action::Stand
        }
    } else {
        Action::Hit
    }
}
