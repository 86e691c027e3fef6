use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    card::{Card, DrawSource, Rank, Shoe, StackedShoe},
    error::Error,
    hand::{Hand, Owner},
    round::{play_round, ActionSource, Advisor, PlayerMove, RoundResult, Winner},
    strategy::Action,
};

fn default_bet_size() -> f64 {
    100.0
}

fn default_progress_interval() -> u32 {
    10_000
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationInput {
    pub iterations: u32,
    pub seed: u64,
    #[serde(default = "default_bet_size")]
    pub bet_size: f64,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u32,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub total_games: u32,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub blackjacks: u32,
    pub dealer_naturals: u32,
    pub player_busts: u32,
    pub total_winnings: f64,
    pub total_bet: f64,
    pub expected_value: f64,
    pub win_rate: f64,
    pub return_rate: f64,
    pub cell_stats: HashMap<String, CellStats>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStats {
    pub player_total: u32,
    pub dealer_card: String,
    pub action: String,
    pub hands: u32,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub total_winnings: f64,
    pub total_bet: f64,
}

/// Win/loss/push counters shared by batch runs and spot checks.
#[derive(Debug, Default)]
struct Tally {
    games: u32,
    wins: u32,
    losses: u32,
    pushes: u32,
    blackjacks: u32,
    dealer_naturals: u32,
    player_busts: u32,
    winnings: f64,
    bet: f64,
}

impl Tally {
    fn record(&mut self, result: &RoundResult, bet_size: f64) -> f64 {
        let delta = result.delta(bet_size);
        self.games += 1;
        self.winnings += delta;
        self.bet += bet_size;
        match result.winner {
            Winner::Player => {
                self.wins += 1;
                if result.player_blackjack {
                    self.blackjacks += 1;
                }
            }
            Winner::Dealer => self.losses += 1,
            Winner::Tie => self.pushes += 1,
        }
        if result.dealer_natural {
            self.dealer_naturals += 1;
        }
        if result.player_bust() {
            self.player_busts += 1;
        }
        delta
    }

    fn expected_value(&self) -> f64 {
        if self.games > 0 {
            self.winnings / self.games as f64
        } else {
            0.0
        }
    }

    fn win_rate(&self) -> f64 {
        if self.games > 0 {
            (self.wins as f64 / self.games as f64) * 100.0
        } else {
            0.0
        }
    }

    fn return_rate(&self) -> f64 {
        if self.bet.abs() > f64::EPSILON {
            (self.winnings / self.bet) * 100.0
        } else {
            0.0
        }
    }
}

fn validate_bet_size(bet_size: f64) -> Result<f64, Error> {
    if bet_size.is_finite() && bet_size > 0.0 {
        Ok(bet_size)
    } else {
        Err(Error::Config(format!("bet size must be positive, got {bet_size}")))
    }
}

pub fn run(input: SimulationInput) -> Result<SimulationResult, Error> {
    run_with_progress(input, |_current, _total| {})
}

/// Plays `iterations` advisor-driven rounds off one seeded shoe.
pub fn run_with_progress<F>(input: SimulationInput, mut progress_cb: F) -> Result<SimulationResult, Error>
where
    F: FnMut(u32, u32),
{
    let bet_size = validate_bet_size(input.bet_size)?;
    let progress_interval = input.progress_interval.max(1);
    let mut shoe = Shoe::new(input.seed);
    let mut tally = Tally::default();
    let mut cell_stats: HashMap<String, CellStats> = HashMap::new();

    for game_index in 0..input.iterations {
        let result = play_round(&mut shoe, &mut Advisor);
        let delta = tally.record(&result, bet_size);
        track_cell_stats(&result, bet_size, delta, &mut cell_stats);

        let completed = game_index + 1;
        if completed % progress_interval == 0 || completed == input.iterations {
            progress_cb(completed, input.iterations);
        }
    }
    debug!(games = tally.games, winnings = tally.winnings, "simulation finished");

    Ok(SimulationResult {
        total_games: tally.games,
        wins: tally.wins,
        losses: tally.losses,
        pushes: tally.pushes,
        blackjacks: tally.blackjacks,
        dealer_naturals: tally.dealer_naturals,
        player_busts: tally.player_busts,
        total_winnings: tally.winnings,
        total_bet: tally.bet,
        expected_value: tally.expected_value(),
        win_rate: tally.win_rate(),
        return_rate: tally.return_rate(),
        cell_stats,
    })
}

fn track_cell_stats(
    result: &RoundResult,
    bet_size: f64,
    delta: f64,
    cell_stats: &mut HashMap<String, CellStats>,
) {
    // Dealer naturals end the round before the player decides anything.
    let Some(action) = result.initial_action() else {
        return;
    };
    let (Some(first), Some(second), Some(up)) = (
        result.player_cards.first(),
        result.player_cards.get(1),
        result.dealer_cards.first(),
    ) else {
        return;
    };
    let player_total = Hand::from_cards(Owner::Player, vec![*first, *second]).best_sum();
    let dealer_card = up.rank.code().to_string();
    let key = format!("{player_total}_{dealer_card}_{}", action.as_code());

    let entry = cell_stats.entry(key).or_insert(CellStats {
        player_total,
        dealer_card,
        action: action.as_code().to_string(),
        hands: 0,
        wins: 0,
        losses: 0,
        pushes: 0,
        total_winnings: 0.0,
        total_bet: 0.0,
    });

    entry.hands += 1;
    entry.total_bet += bet_size;
    entry.total_winnings += delta;
    match result.winner {
        Winner::Player => entry.wins += 1,
        Winner::Dealer => entry.losses += 1,
        Winner::Tie => entry.pushes += 1,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotCheckInput {
    pub iterations: u32,
    pub seed: u64,
    #[serde(default = "default_bet_size")]
    pub bet_size: f64,
    pub player_cards: Vec<String>,
    pub dealer_card: String,
    pub forced_action: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotCheckResult {
    pub total_games: u32,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub dealer_naturals: u32,
    pub player_busts: u32,
    pub total_winnings: f64,
    pub total_bet: f64,
    pub expected_value: f64,
    pub win_rate: f64,
    pub return_rate: f64,
}

/// Makes one forced decision, then defers to the advisor.
struct ForcedFirst {
    forced: Option<PlayerMove>,
}

impl ActionSource for ForcedFirst {
    fn next_move(&mut self, dealer: &Hand, player: &Hand) -> Option<PlayerMove> {
        self.forced.take().or_else(|| Advisor.next_move(dealer, player))
    }
}

/// Plays a fixed starting position repeatedly with a forced first action.
pub fn run_spot_check(input: SpotCheckInput) -> Result<SpotCheckResult, Error> {
    let bet_size = validate_bet_size(input.bet_size)?;
    let player_cards = input
        .player_cards
        .iter()
        .map(|raw| raw.parse::<Card>())
        .collect::<Result<Vec<_>, _>>()?;
    if player_cards.len() != 2 {
        return Err(Error::Config(format!(
            "spot check needs exactly two player cards, got {}",
            player_cards.len()
        )));
    }
    let dealer_up = Card::new(input.dealer_card.parse::<Rank>()?);
    let forced = Action::from_code(input.forced_action.trim())
        .ok_or_else(|| Error::InvalidMove(input.forced_action.clone()))?;

    let mut shoe = Shoe::new(input.seed);
    let mut tally = Tally::default();

    for _ in 0..input.iterations {
        let hole = shoe.draw();
        let stacked = [dealer_up, hole, player_cards[0], player_cards[1]];
        let mut actions = ForcedFirst {
            forced: Some(forced.into()),
        };
        let result = play_round(StackedShoe::new(stacked, &mut shoe), &mut actions);
        tally.record(&result, bet_size);
    }

    Ok(SpotCheckResult {
        total_games: tally.games,
        wins: tally.wins,
        losses: tally.losses,
        pushes: tally.pushes,
        dealer_naturals: tally.dealer_naturals,
        player_busts: tally.player_busts,
        total_winnings: tally.winnings,
        total_bet: tally.bet,
        expected_value: tally.expected_value(),
        win_rate: tally.win_rate(),
        return_rate: tally.return_rate(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim_input(iterations: u32, seed: u64) -> SimulationInput {
        SimulationInput {
            iterations,
            seed,
            bet_size: 10.0,
            progress_interval: 100,
        }
    }

    fn spot_input(player: &[&str], dealer: &str, forced: &str) -> SpotCheckInput {
        SpotCheckInput {
            iterations: 200,
            seed: 3,
            bet_size: 10.0,
            player_cards: player.iter().map(|s| s.to_string()).collect(),
            dealer_card: dealer.to_string(),
            forced_action: forced.to_string(),
        }
    }

    #[test]
    fn counts_add_up() {
        let result = run(sim_input(1_000, 11)).unwrap();
        assert_eq!(result.total_games, 1_000);
        assert_eq!(result.wins + result.losses + result.pushes, 1_000);
        assert!(result.blackjacks <= result.wins);
        assert!(result.dealer_naturals <= result.losses);
        assert_eq!(result.total_bet, 10_000.0);

        let tracked: u32 = result.cell_stats.values().map(|c| c.hands).sum();
        assert_eq!(tracked, 1_000 - result.dealer_naturals);
        let cell_winnings: f64 = result.cell_stats.values().map(|c| c.total_winnings).sum();
        let natural_losses = 10.0 * result.dealer_naturals as f64;
        assert!((cell_winnings - natural_losses - result.total_winnings).abs() < 1e-6);
    }

    #[test]
    fn same_seed_same_result() {
        let a = run(sim_input(500, 99)).unwrap();
        let b = run(sim_input(500, 99)).unwrap();
        assert_eq!(a.total_winnings, b.total_winnings);
        assert_eq!(a.wins, b.wins);
    }

    #[test]
    fn progress_reports_interval_and_end() {
        let mut calls = Vec::new();
        run_with_progress(sim_input(250, 1), |done, total| calls.push((done, total))).unwrap();
        assert_eq!(calls, vec![(100, 250), (200, 250), (250, 250)]);
    }

    #[test]
    fn zero_iterations_has_zero_rates() {
        let result = run(sim_input(0, 1)).unwrap();
        assert_eq!(result.total_games, 0);
        assert_eq!(result.expected_value, 0.0);
        assert_eq!(result.win_rate, 0.0);
        assert_eq!(result.return_rate, 0.0);
    }

    #[test]
    fn rejects_bad_bet_size() {
        let mut input = sim_input(10, 1);
        input.bet_size = 0.0;
        assert!(matches!(run(input), Err(Error::Config(_))));
    }

    #[test]
    fn input_deserializes_with_defaults() {
        let input: SimulationInput =
            serde_json::from_str(r#"{"iterations": 5, "seed": 2}"#).unwrap();
        assert_eq!(input.bet_size, 100.0);
        assert_eq!(input.progress_interval, 10_000);
    }

    #[test]
    fn standing_on_twenty_never_busts() {
        let result = run_spot_check(spot_input(&["K", "Q"], "6", "S")).unwrap();
        assert_eq!(result.total_games, 200);
        assert_eq!(result.player_busts, 0);
        assert_eq!(result.wins + result.losses + result.pushes, 200);
    }

    #[test]
    fn hitting_twenty_busts_often() {
        let stand = run_spot_check(spot_input(&["K", "Q"], "6", "S")).unwrap();
        let hit = run_spot_check(spot_input(&["K", "Q"], "6", "H")).unwrap();
        assert!(hit.player_busts > 0);
        assert!(hit.total_winnings < stand.total_winnings);
    }

    #[test]
    fn spot_check_validates_input() {
        assert!(matches!(
            run_spot_check(spot_input(&["K"], "6", "S")),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            run_spot_check(spot_input(&["K", "Z"], "6", "S")),
            Err(Error::InvalidRank(_))
        ));
        assert!(matches!(
            run_spot_check(spot_input(&["K", "Q"], "6", "P")),
            Err(Error::InvalidMove(_))
        ));
    }
}
