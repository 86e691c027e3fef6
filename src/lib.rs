use js_sys::Function;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

pub mod card;
pub mod error;
pub mod hand;
pub mod round;
pub mod session;
pub mod sim;
pub mod strategy;

pub use card::{Card, DrawSource, Rank, Shoe, StackedShoe};
pub use error::Error;
pub use hand::{Hand, Owner};
pub use round::{
    play_round, settle, ActionSource, Advisor, Outcome, Phase, PlayerMove, Round, RoundResult,
    ScriptedMoves, Winner,
};
pub use strategy::{recommend, Action};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleGameInput {
    pub seed: u64,
    #[serde(default = "default_bet_size")]
    pub bet_size: f64,
    /// "hit" / "stand" / "hint" tokens; the advisor plays when absent.
    #[serde(default)]
    pub moves: Option<Vec<String>>,
}

fn default_bet_size() -> f64 {
    100.0
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleGameResult {
    #[serde(flatten)]
    pub round: RoundResult,
    pub bet: f64,
    pub winnings: f64,
    pub advice: Vec<Action>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceInput {
    pub dealer_cards: Vec<String>,
    pub player_cards: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AdviceResult {
    pub action: Action,
}

pub fn play_single(input: SingleGameInput) -> SingleGameResult {
    let shoe = Shoe::new(input.seed);
    let (round, advice) = match input.moves {
        Some(tokens) => {
            let mut script = ScriptedMoves::from_tokens(&tokens);
            let round = play_round(shoe, &mut script);
            (round, script.advice_given().to_vec())
        }
        None => (play_round(shoe, &mut Advisor), Vec::new()),
    };
    let winnings = round.delta(input.bet_size);
    SingleGameResult {
        round,
        bet: input.bet_size,
        winnings,
        advice,
    }
}

pub fn advise(input: AdviceInput) -> Result<AdviceResult, Error> {
    let parse = |owner: Owner, ranks: &[String]| -> Result<Hand, Error> {
        let cards = ranks
            .iter()
            .map(|raw| raw.parse::<Card>())
            .collect::<Result<Vec<_>, _>>()?;
        if cards.is_empty() {
            return Err(Error::Config(format!("{owner:?} hand has no cards")));
        }
        Ok(Hand::from_cards(owner, cards))
    };
    let dealer = parse(Owner::Dealer, &input.dealer_cards)?;
    let player = parse(Owner::Player, &input.player_cards)?;
    Ok(AdviceResult {
        action: recommend(&dealer, &player),
    })
}

#[wasm_bindgen]
pub fn run_simulation(params: &JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let input: sim::SimulationInput = serde_wasm_bindgen::from_value(params.clone())
        .map_err(|err| JsValue::from_str(&format!("Invalid input: {err}")))?;

    let result = sim::run(input)
        .map_err(|err| JsValue::from_str(&format!("Simulation failed: {err}")))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}

#[wasm_bindgen]
pub fn run_simulation_with_progress(
    params: &JsValue,
    progress_callback: &Function,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let input: sim::SimulationInput = serde_wasm_bindgen::from_value(params.clone())
        .map_err(|err| JsValue::from_str(&format!("Invalid input: {err}")))?;

    let progress_cb = |current: u32, total: u32| {
        let _ = progress_callback.call2(
            &JsValue::NULL,
            &JsValue::from(current),
            &JsValue::from(total),
        );
    };

    let result = sim::run_with_progress(input, progress_cb)
        .map_err(|err| JsValue::from_str(&format!("Simulation failed: {err}")))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}

#[wasm_bindgen]
pub fn run_spot_check(params: &JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let input: sim::SpotCheckInput = serde_wasm_bindgen::from_value(params.clone())
        .map_err(|err| JsValue::from_str(&format!("Invalid input: {err}")))?;

    let result = sim::run_spot_check(input)
        .map_err(|err| JsValue::from_str(&format!("Spot check failed: {err}")))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}

#[wasm_bindgen]
pub fn play_single_game(params: &JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let input: SingleGameInput = serde_wasm_bindgen::from_value(params.clone())
        .map_err(|err| JsValue::from_str(&format!("Invalid input: {err}")))?;

    let result = play_single(input);

    serde_wasm_bindgen::to_value(&result)
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}

#[wasm_bindgen]
pub fn recommend_action(params: &JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let input: AdviceInput = serde_wasm_bindgen::from_value(params.clone())
        .map_err(|err| JsValue::from_str(&format!("Invalid input: {err}")))?;

    let result = advise(input).map_err(|err| JsValue::from_str(&format!("Advice failed: {err}")))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(ranks: &[&str]) -> Vec<String> {
        ranks.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn advise_parses_rank_tokens() {
        let result = advise(AdviceInput {
            dealer_cards: strings(&["10"]),
            player_cards: strings(&["9", "7"]),
        })
        .unwrap();
        assert_eq!(result.action, Action::Hit);

        let result = advise(AdviceInput {
            dealer_cards: strings(&["5"]),
            player_cards: strings(&["A", "6"]),
        })
        .unwrap();
        assert_eq!(result.action, Action::Stand);
    }

    #[test]
    fn advise_rejects_bad_hands() {
        assert!(advise(AdviceInput {
            dealer_cards: Vec::new(),
            player_cards: strings(&["9", "7"]),
        })
        .is_err());
        assert!(matches!(
            advise(AdviceInput {
                dealer_cards: strings(&["10"]),
                player_cards: strings(&["9", "X"]),
            }),
            Err(Error::InvalidRank(_))
        ));
    }

    #[test]
    fn scripted_single_game_reports_advice() {
        let result = play_single(SingleGameInput {
            seed: 5,
            bet_size: 20.0,
            moves: Some(strings(&["hint", "bogus", "stand"])),
        });
        assert_eq!(result.winnings, result.round.delta(20.0));
        if !result.round.dealer_natural {
            assert_eq!(result.advice.len(), 1);
            assert_eq!(result.round.actions, vec![Action::Stand]);
            assert_eq!(result.round.player_cards.len(), 2);
        }
    }

    #[test]
    fn single_game_is_reproducible() {
        let play = || {
            play_single(SingleGameInput {
                seed: 8,
                bet_size: 10.0,
                moves: None,
            })
        };
        let (a, b) = (play(), play());
        assert_eq!(a.round.player_cards, b.round.player_cards);
        assert_eq!(a.round.dealer_cards, b.round.dealer_cards);
        assert_eq!(a.winnings, b.winnings);
    }

    #[test]
    fn single_game_serializes_flat() {
        let result = play_single(SingleGameInput {
            seed: 1,
            bet_size: 10.0,
            moves: None,
        });
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("winner").is_some());
        assert!(json.get("dealerSum").is_some());
        assert!(json.get("winnings").is_some());
    }
}
