use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "A")]
    Ace,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
}

impl Rank {
    /// The 13 equally likely outcomes of a single draw.
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rank::Ace => "Ace",
            Rank::Jack => "Jack",
            Rank::Queen => "Queen",
            Rank::King => "King",
            other => other.code(),
        }
    }
}

impl FromStr for Rank {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Rank::ALL
            .iter()
            .copied()
            .find(|rank| {
                token == rank.code() || token.eq_ignore_ascii_case(rank.name())
            })
            .ok_or_else(|| Error::InvalidRank(token.to_string()))
    }
}

/// A single drawn card. Jack, Queen and King are distinct ranks that all
/// score ten.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
}

impl Card {
    pub fn new(rank: Rank) -> Self {
        Card { rank }
    }

    /// Value with every ace counted as 1.
    pub fn soft_value(&self) -> u32 {
        match self.rank {
            Rank::Ace => 1,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
        }
    }

    /// Value with every ace counted as 11.
    pub fn hard_value(&self) -> u32 {
        if self.is_ace() {
            11
        } else {
            self.soft_value()
        }
    }

    pub fn is_ace(&self) -> bool {
        self.rank == Rank::Ace
    }

    pub fn name(&self) -> &'static str {
        self.rank.name()
    }
}

impl From<Rank> for Card {
    fn from(rank: Rank) -> Self {
        Card::new(rank)
    }
}

impl FromStr for Card {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Rank>().map(Card::new)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything that can hand out cards. Draws never fail.
pub trait DrawSource {
    fn draw(&mut self) -> Card;
}

impl<D: DrawSource + ?Sized> DrawSource for &mut D {
    fn draw(&mut self) -> Card {
        (**self).draw()
    }
}

/// Continuous-shuffle shoe: every draw is an independent uniform pick over
/// the 13 ranks, so nothing is ever depleted.
pub struct Shoe {
    rng: SmallRng,
}

impl Shoe {
    pub fn new(seed: u64) -> Self {
        Shoe {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Shoe {
            rng: SmallRng::from_entropy(),
        }
    }
}

impl DrawSource for Shoe {
    fn draw(&mut self) -> Card {
        let index = self.rng.gen_range(0..Rank::ALL.len());
        Card::new(Rank::ALL[index])
    }
}

/// Deals a fixed sequence of cards first, then falls through to `rest`.
pub struct StackedShoe<S> {
    stacked: VecDeque<Card>,
    rest: S,
}

impl<S: DrawSource> StackedShoe<S> {
    pub fn new(cards: impl IntoIterator<Item = Card>, rest: S) -> Self {
        StackedShoe {
            stacked: cards.into_iter().collect(),
            rest,
        }
    }

    pub fn remaining_stacked(&self) -> usize {
        self.stacked.len()
    }
}

impl StackedShoe<Shoe> {
    /// Stacks `ranks` on top of a seed-0 shoe; handy for fixed scenarios.
    pub fn from_ranks(ranks: &[Rank]) -> Self {
        StackedShoe::new(ranks.iter().copied().map(Card::new), Shoe::new(0))
    }
}

impl<S: DrawSource> DrawSource for StackedShoe<S> {
    fn draw(&mut self) -> Card {
        match self.stacked.pop_front() {
            Some(card) => card,
            None => self.rest.draw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ace_has_two_values() {
        for rank in Rank::ALL {
            let card = Card::new(rank);
            if rank == Rank::Ace {
                assert_eq!(card.soft_value(), 1);
                assert_eq!(card.hard_value(), 11);
                assert!(card.is_ace());
            } else {
                assert_eq!(card.soft_value(), card.hard_value());
                assert!(!card.is_ace());
            }
        }
    }

    #[test]
    fn face_cards_are_distinct_but_score_ten() {
        let faces = [Rank::Ten, Rank::Jack, Rank::Queen, Rank::King];
        for rank in faces {
            assert_eq!(Card::new(rank).hard_value(), 10);
        }
        assert_ne!(Card::new(Rank::Jack), Card::new(Rank::King));
    }

    #[test]
    fn parses_codes_and_names() {
        assert_eq!("A".parse::<Rank>().unwrap(), Rank::Ace);
        assert_eq!("ace".parse::<Rank>().unwrap(), Rank::Ace);
        assert_eq!(" 10 ".parse::<Rank>().unwrap(), Rank::Ten);
        assert_eq!("Queen".parse::<Rank>().unwrap(), Rank::Queen);
        assert_eq!("K".parse::<Card>().unwrap(), Card::new(Rank::King));
        assert!(matches!("1".parse::<Rank>(), Err(Error::InvalidRank(_))));
        assert!("11".parse::<Rank>().is_err());
    }

    #[test]
    fn seeded_shoe_is_deterministic() {
        let mut a = Shoe::new(42);
        let mut b = Shoe::new(42);
        let left: Vec<Card> = (0..50).map(|_| a.draw()).collect();
        let right: Vec<Card> = (0..50).map(|_| b.draw()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn shoe_draws_each_rank_equally_often() {
        // 1000 expected per rank; the standard deviation is about 30.
        let mut shoe = Shoe::new(7);
        let mut counts = std::collections::HashMap::new();
        for _ in 0..13_000 {
            *counts.entry(shoe.draw().rank).or_insert(0u32) += 1;
        }
        assert_eq!(counts.len(), Rank::ALL.len());
        for rank in Rank::ALL {
            let count = counts[&rank];
            assert!((850..=1150).contains(&count), "{rank:?} drawn {count} times");
        }
        let tens: u32 = [Rank::Ten, Rank::Jack, Rank::Queen, Rank::King]
            .iter()
            .map(|rank| counts[rank])
            .sum();
        assert!((3_700..=4_300).contains(&tens), "ten-valued cards drawn {tens} times");
    }

    #[test]
    fn stacked_cards_come_first() {
        let mut shoe = StackedShoe::from_ranks(&[Rank::Ace, Rank::Nine]);
        assert_eq!(shoe.draw().rank, Rank::Ace);
        assert_eq!(shoe.draw().rank, Rank::Nine);
        assert_eq!(shoe.remaining_stacked(), 0);

        let mut fallback = Shoe::new(0);
        assert_eq!(shoe.draw(), fallback.draw());
    }
}
