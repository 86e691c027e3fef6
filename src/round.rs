use std::collections::VecDeque;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    card::{Card, DrawSource},
    error::Error,
    hand::{Hand, Owner},
    strategy::{recommend, Action},
};

/// The dealer keeps drawing while at or below this total.
pub const DEALER_DRAWS_TO: u32 = 17;
pub const BLACKJACK_PAYOUT: f64 = 1.5;

/// What the player may ask for on their turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlayerMove {
    Hit,
    Stand,
    Hint,
}

impl FromStr for PlayerMove {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "hit" => Ok(PlayerMove::Hit),
            "stand" => Ok(PlayerMove::Stand),
            "hint" => Ok(PlayerMove::Hint),
            other => Err(Error::InvalidMove(other.to_string())),
        }
    }
}

impl From<Action> for PlayerMove {
    fn from(action: Action) -> Self {
        match action {
            Action::Hit => PlayerMove::Hit,
            Action::Stand => PlayerMove::Stand,
        }
    }
}

/// Where player decisions come from: a terminal, a script, the advisor.
pub trait ActionSource {
    /// Next move, or `None` for input that could not be understood.
    /// `None` is ignored and the source is asked again.
    fn next_move(&mut self, dealer: &Hand, player: &Hand) -> Option<PlayerMove>;

    /// Called with the advisor's answer after a `Hint`.
    fn advice(&mut self, _action: Action) {}
}

impl<A: ActionSource + ?Sized> ActionSource for &mut A {
    fn next_move(&mut self, dealer: &Hand, player: &Hand) -> Option<PlayerMove> {
        (**self).next_move(dealer, player)
    }

    fn advice(&mut self, action: Action) {
        (**self).advice(action)
    }
}

/// Plays every decision the way `recommend` says.
#[derive(Debug, Default, Clone, Copy)]
pub struct Advisor;

impl ActionSource for Advisor {
    fn next_move(&mut self, dealer: &Hand, player: &Hand) -> Option<PlayerMove> {
        Some(recommend(dealer, player).into())
    }
}

/// Replays a fixed list of inputs, standing once the list runs out.
#[derive(Debug, Default)]
pub struct ScriptedMoves {
    moves: VecDeque<Option<PlayerMove>>,
    advice: Vec<Action>,
}

impl ScriptedMoves {
    pub fn new(moves: impl IntoIterator<Item = Option<PlayerMove>>) -> Self {
        ScriptedMoves {
            moves: moves.into_iter().collect(),
            advice: Vec::new(),
        }
    }

    /// Unparseable tokens become invalid inputs rather than errors.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        ScriptedMoves::new(tokens.iter().map(|t| t.as_ref().parse().ok()))
    }

    pub fn advice_given(&self) -> &[Action] {
        &self.advice
    }
}

impl ActionSource for ScriptedMoves {
    fn next_move(&mut self, _dealer: &Hand, _player: &Hand) -> Option<PlayerMove> {
        self.moves.pop_front().unwrap_or(Some(PlayerMove::Stand))
    }

    fn advice(&mut self, action: Action) {
        self.advice.push(action);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Dealer,
    Player,
    Tie,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub winner: Winner,
    pub player_blackjack: bool,
}

impl Outcome {
    fn dealer_wins() -> Self {
        Outcome {
            winner: Winner::Dealer,
            player_blackjack: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Dealing,
    PlayerTurn,
    DealerTurn,
    Settled(Outcome),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub winner: Winner,
    pub player_blackjack: bool,
    pub dealer_natural: bool,
    pub dealer_sum: u32,
    pub player_sum: u32,
    pub dealer_cards: Vec<Card>,
    pub player_cards: Vec<Card>,
    /// Hits and stands the player actually made, in order.
    pub actions: Vec<Action>,
}

impl RoundResult {
    pub fn outcome(&self) -> Outcome {
        Outcome {
            winner: self.winner,
            player_blackjack: self.player_blackjack,
        }
    }

    pub fn initial_action(&self) -> Option<Action> {
        self.actions.first().copied()
    }

    pub fn player_bust(&self) -> bool {
        self.player_sum > 21
    }

    /// Bankroll change for a bet of `bet_size`.
    pub fn delta(&self, bet_size: f64) -> f64 {
        settle(self.outcome(), bet_size)
    }
}

/// Bankroll change for a settled round. Never clamps.
pub fn settle(outcome: Outcome, bet_size: f64) -> f64 {
    match outcome.winner {
        Winner::Player if outcome.player_blackjack => bet_size * BLACKJACK_PAYOUT,
        Winner::Player => bet_size,
        Winner::Dealer => -bet_size,
        Winner::Tie => 0.0,
    }
}

/// One round of play. Owns both hands until it is settled.
pub struct Round<D> {
    shoe: D,
    phase: Phase,
    dealer: Hand,
    player: Hand,
    dealer_natural: bool,
    actions: Vec<Action>,
}

impl<D: DrawSource> Round<D> {
    /// Deals dealer then player off `shoe`. The round starts in `Dealing`
    /// until the dealer's hand has been checked for a natural.
    pub fn new(mut shoe: D) -> Self {
        let dealer = Hand::deal(Owner::Dealer, &mut shoe);
        let player = Hand::deal(Owner::Player, &mut shoe);
        Round {
            shoe,
            phase: Phase::Dealing,
            dealer,
            player,
            dealer_natural: false,
            actions: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn dealer(&self) -> &Hand {
        &self.dealer
    }

    pub fn player(&self) -> &Hand {
        &self.player
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.phase, Phase::Settled(_))
    }

    /// Runs the current phase to completion and moves to the next one.
    pub fn advance<A: ActionSource + ?Sized>(&mut self, actions: &mut A) -> Phase {
        let next = match self.phase {
            Phase::Dealing => self.check_natural(),
            Phase::PlayerTurn => self.player_turn(actions),
            Phase::DealerTurn => self.dealer_turn(),
            settled @ Phase::Settled(_) => settled,
        };
        if next != self.phase {
            debug!(from = ?self.phase, to = ?next, "round phase");
        }
        self.phase = next;
        next
    }

    /// Drives the round to settlement.
    pub fn play<A: ActionSource + ?Sized>(mut self, actions: &mut A) -> RoundResult {
        loop {
            if let Phase::Settled(outcome) = self.advance(actions) {
                return self.into_result(outcome);
            }
        }
    }

    fn check_natural(&mut self) -> Phase {
        self.dealer_natural = self.dealer.is_blackjack();
        if self.dealer_natural {
            debug!("dealer natural, player does not act");
            Phase::Settled(Outcome::dealer_wins())
        } else {
            Phase::PlayerTurn
        }
    }

    fn player_turn<A: ActionSource + ?Sized>(&mut self, source: &mut A) -> Phase {
        let dealer = &self.dealer;
        let player = &mut self.player;

        while player.best_sum() <= 21 && !player.is_standing() {
            match source.next_move(dealer, player) {
                Some(PlayerMove::Hint) => {
                    let advice = recommend(dealer, player);
                    debug!(?advice, "advice requested");
                    source.advice(advice);
                }
                Some(PlayerMove::Hit) => {
                    self.actions.push(Action::Hit);
                    player.draw(&mut self.shoe);
                }
                Some(PlayerMove::Stand) => {
                    self.actions.push(Action::Stand);
                    player.stand();
                }
                None => debug!("ignoring invalid move"),
            }
        }

        if player.is_bust() {
            debug!(sum = player.best_sum(), "player bust");
            Phase::Settled(Outcome::dealer_wins())
        } else {
            Phase::DealerTurn
        }
    }

    fn dealer_turn(&mut self) -> Phase {
        while self.dealer.best_sum() <= DEALER_DRAWS_TO {
            self.dealer.draw(&mut self.shoe);
        }
        Phase::Settled(compare(&self.dealer, &self.player))
    }

    fn into_result(self, outcome: Outcome) -> RoundResult {
        let result = RoundResult {
            winner: outcome.winner,
            player_blackjack: outcome.player_blackjack,
            dealer_natural: self.dealer_natural,
            dealer_sum: self.dealer.best_sum(),
            player_sum: self.player.best_sum(),
            dealer_cards: self.dealer.cards().to_vec(),
            player_cards: self.player.cards().to_vec(),
            actions: self.actions,
        };
        info!(
            winner = ?result.winner,
            dealer_sum = result.dealer_sum,
            player_sum = result.player_sum,
            player_blackjack = result.player_blackjack,
            "round settled"
        );
        result
    }
}

/// Final comparison once both sides are done drawing.
fn compare(dealer: &Hand, player: &Hand) -> Outcome {
    let dealer_sum = dealer.best_sum();
    let player_sum = player.best_sum();
    if dealer_sum > 21 || player_sum > dealer_sum {
        Outcome {
            winner: Winner::Player,
            player_blackjack: player_sum == 21,
        }
    } else if player_sum == dealer_sum {
        Outcome {
            winner: Winner::Tie,
            player_blackjack: false,
        }
    } else {
        Outcome::dealer_wins()
    }
}

/// Deals and plays one full round.
pub fn play_round<D, A>(shoe: D, actions: &mut A) -> RoundResult
where
    D: DrawSource,
    A: ActionSource + ?Sized,
{
    Round::new(shoe).play(actions)
}
