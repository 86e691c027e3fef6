use std::io::BufRead;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    card::DrawSource,
    error::Error,
    round::{play_round, ActionSource, RoundResult},
};

pub const RULES_TEXT: &str = "\
This game makes several simplifications.
It assumes a continuous shuffle machine rather than a fixed set of decks.
Dealer hits on a hard 17.
No splitting, no doubling, no surrendering, no insurance.
Only original bets are lost on dealer blackjack, although the dealer wins immediately.";

fn default_bankroll() -> f64 {
    1000.0
}

fn default_max_stake() -> f64 {
    1000.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default = "default_bankroll")]
    pub starting_bankroll: f64,
    #[serde(default = "default_max_stake")]
    pub max_stake: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            starting_bankroll: default_bankroll(),
            max_stake: default_max_stake(),
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: SessionConfig =
            serde_json::from_str(json).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.starting_bankroll.is_finite() || self.starting_bankroll <= 0.0 {
            return Err(Error::Config(format!(
                "starting bankroll must be positive, got {}",
                self.starting_bankroll
            )));
        }
        if !self.max_stake.is_finite() || self.max_stake <= 0.0 {
            return Err(Error::Config(format!(
                "max stake must be positive, got {}",
                self.max_stake
            )));
        }
        Ok(())
    }
}

/// Parses a bet in `(0, min(max_stake, bankroll)]`.
pub fn parse_bet(raw: &str, bankroll: f64, max_stake: f64) -> Result<f64, Error> {
    let token = raw.trim();
    let bet: f64 = token
        .parse()
        .map_err(|_| Error::InvalidBet(format!("'{token}' is not a number")))?;
    let ceiling = max_stake.min(bankroll);
    if !bet.is_finite() || bet <= 0.0 {
        return Err(Error::InvalidBet(format!("{bet} must be above zero")));
    }
    if bet > ceiling {
        return Err(Error::InvalidBet(format!("{bet} is above the limit of {ceiling}")));
    }
    Ok(bet)
}

/// Reads one line of player input without its line ending.
///
/// `Ok(None)` is end of input. Bytes that are not UTF-8 are replaced rather
/// than rejected, so a garbled line reaches the caller as ordinary invalid
/// input. Only failures of the reader itself are errors.
pub fn read_input_line<R: BufRead + ?Sized>(input: &mut R) -> Result<Option<String>, Error> {
    let mut raw = Vec::new();
    if input.read_until(b'\n', &mut raw)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&raw);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Play,
    Help,
    Quit,
}

impl FromStr for MenuChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "p" => Ok(MenuChoice::Play),
            "h" => Ok(MenuChoice::Help),
            "q" => Ok(MenuChoice::Quit),
            other => Err(Error::InvalidMove(other.to_string())),
        }
    }
}

/// A bankroll carried across rounds.
pub struct Session {
    config: SessionConfig,
    bankroll: f64,
    rounds_played: u32,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Session {
            bankroll: config.starting_bankroll,
            config,
            rounds_played: 0,
        }
    }

    pub fn bankroll(&self) -> f64 {
        self.bankroll
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub fn max_bet(&self) -> f64 {
        self.config.max_stake.min(self.bankroll)
    }

    pub fn is_over(&self) -> bool {
        self.bankroll <= 0.0
    }

    pub fn parse_bet(&self, raw: &str) -> Result<f64, Error> {
        parse_bet(raw, self.bankroll, self.config.max_stake)
    }

    /// Plays one round and applies its settlement to the bankroll.
    pub fn play_round<D, A>(&mut self, bet: f64, shoe: D, actions: &mut A) -> RoundResult
    where
        D: DrawSource,
        A: ActionSource + ?Sized,
    {
        let result = play_round(shoe, actions);
        let delta = result.delta(bet);
        self.bankroll += delta;
        self.rounds_played += 1;
        info!(
            round = self.rounds_played,
            bet,
            delta,
            bankroll = self.bankroll,
            "bankroll updated"
        );
        result
    }
}
