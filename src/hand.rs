use tracing::debug;

use crate::card::{Card, DrawSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    Dealer,
    Player,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hand {
    owner: Owner,
    cards: Vec<Card>,
    standing: bool,
}

impl Hand {
    /// Fresh hand with two cards off the shoe.
    pub fn deal<D: DrawSource + ?Sized>(owner: Owner, shoe: &mut D) -> Self {
        let cards = vec![shoe.draw(), shoe.draw()];
        debug!(?owner, first = %cards[0], second = %cards[1], "dealt hand");
        Hand::from_cards(owner, cards)
    }

    pub fn from_cards(owner: Owner, cards: Vec<Card>) -> Self {
        Hand {
            owner,
            cards,
            standing: false,
        }
    }

    /// Appends one card. Callers decide whether drawing is allowed.
    pub fn draw<D: DrawSource + ?Sized>(&mut self, shoe: &mut D) -> Card {
        let card = shoe.draw();
        self.cards.push(card);
        debug!(owner = ?self.owner, card = %card, sum = self.best_sum(), "drew card");
        card
    }

    pub fn stand(&mut self) {
        self.standing = true;
    }

    pub fn is_standing(&self) -> bool {
        self.standing
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn up_card(&self) -> Option<&Card> {
        self.cards.first()
    }

    pub fn soft_sum(&self) -> u32 {
        self.cards.iter().map(Card::soft_value).sum()
    }

    pub fn hard_sum(&self) -> u32 {
        self.cards.iter().map(Card::hard_value).sum()
    }

    /// Hard total if it fits under 21, otherwise every ace drops to 1.
    ///
    /// There is no middle ground: a hand of two aces scores 2, not 12,
    /// because the hard total of 22 sends it straight to the soft total.
    pub fn best_sum(&self) -> u32 {
        let hard = self.hard_sum();
        if hard <= 21 {
            hard
        } else {
            self.soft_sum()
        }
    }

    /// True whenever the best sum is 21, regardless of card count.
    pub fn is_blackjack(&self) -> bool {
        self.best_sum() == 21
    }

    pub fn is_bust(&self) -> bool {
        self.best_sum() > 21
    }

    pub fn has_ace(&self) -> bool {
        self.cards.iter().any(Card::is_ace)
    }

    pub fn ace_count(&self) -> u32 {
        self.cards.iter().filter(|card| card.is_ace()).count() as u32
    }

    /// Same owner, aces removed. May hold fewer than two cards.
    pub fn without_aces(&self) -> Hand {
        let cards = self
            .cards
            .iter()
            .filter(|card| !card.is_ace())
            .copied()
            .collect();
        Hand::from_cards(self.owner, cards)
    }

    pub fn describe(&self) -> String {
        self.cards
            .iter()
            .map(Card::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
