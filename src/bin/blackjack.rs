use std::io::{self, BufRead, Write};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blackjack_advisor::{
    round::{ActionSource, PlayerMove, RoundResult, Winner},
    session::{read_input_line, MenuChoice, Session, SessionConfig, RULES_TEXT},
    Action, Error, Hand, Shoe,
};

/// Line-oriented terminal input. `Ok(None)` means stdin is closed.
struct Terminal<R> {
    input: R,
}

impl<R: BufRead> Terminal<R> {
    fn read_line(&mut self) -> Result<Option<String>, Error> {
        read_input_line(&mut self.input)
    }

    fn menu(&mut self) -> Result<Option<MenuChoice>, Error> {
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match line.parse() {
                Ok(choice) => return Ok(Some(choice)),
                Err(_) => println!("Invalid option, try again"),
            }
        }
    }

    fn bet(&mut self, session: &Session) -> Result<Option<f64>, Error> {
        println!(
            "You have {} coins. How much would you like to bet, from 0 - {}?",
            session.bankroll(),
            session.max_bet()
        );
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match session.parse_bet(&line) {
                Ok(bet) => return Ok(Some(bet)),
                Err(err) => println!("Invalid bet size ({err}), try again."),
            }
        }
    }
}

/// Prompts for moves on stdin. Stands once input is closed or has failed;
/// a failure is kept in `failed` for the caller to report.
struct TerminalPlayer<'a, R> {
    terminal: &'a mut Terminal<R>,
    closed: bool,
    failed: Option<Error>,
}

impl<R: BufRead> ActionSource for TerminalPlayer<'_, R> {
    fn next_move(&mut self, dealer: &Hand, player: &Hand) -> Option<PlayerMove> {
        if self.closed {
            return Some(PlayerMove::Stand);
        }
        if let Some(up) = dealer.up_card() {
            println!("Dealer's Hand: {up}, ?");
        }
        println!("Your Hand: {}", player.describe());
        println!("Would you like to \"hit\", \"stand\", or receive a \"hint\"?");
        let _ = io::stdout().flush();
        let line = match self.terminal.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                self.closed = true;
                return Some(PlayerMove::Stand);
            }
            Err(err) => {
                self.closed = true;
                self.failed = Some(err);
                return Some(PlayerMove::Stand);
            }
        };
        match line.parse() {
            Ok(choice) => Some(choice),
            Err(_) => {
                println!("Invalid choice.");
                None
            }
        }
    }

    fn advice(&mut self, action: Action) {
        println!("The ideal move is to {}", action.as_word());
    }
}

fn report(result: &RoundResult, session: &Session) {
    if result.dealer_natural {
        println!("Dealer automatically won by blackjack 21!");
    } else if result.player_bust() {
        println!("You busted! Player hand = {}", result.player_sum);
    } else {
        println!(
            "Dealer finished at {}, you finished at {}",
            result.dealer_sum, result.player_sum
        );
    }
    match result.winner {
        Winner::Tie => println!("Tie, no change in coins"),
        Winner::Player => println!("Winner was the player!"),
        Winner::Dealer => println!("Winner was the dealer!"),
    }
    println!("Player coins is now {}", session.bankroll());
}

fn load_config() -> anyhow::Result<SessionConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config from {path}"))?;
            Ok(SessionConfig::from_json(&raw)?)
        }
        None => Ok(SessionConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = load_config()?;
    let stdin = io::stdin();
    let mut terminal = Terminal {
        input: stdin.lock(),
    };

    println!("Welcome to Blackjack");
    println!("Press \"p\" to play, \"h\" for help, and \"q\" to quit");
    match terminal.menu().context("reading menu choice")? {
        Some(MenuChoice::Play) => {}
        Some(MenuChoice::Help) => {
            println!("{RULES_TEXT}");
            return Ok(());
        }
        Some(MenuChoice::Quit) | None => return Ok(()),
    }

    let mut session = Session::new(config);
    let mut shoe = Shoe::from_entropy();
    while !session.is_over() {
        let Some(bet) = terminal.bet(&session).context("reading bet")? else {
            return Ok(());
        };
        let mut player = TerminalPlayer {
            terminal: &mut terminal,
            closed: false,
            failed: None,
        };
        let result = session.play_round(bet, &mut shoe, &mut player);
        if let Some(err) = player.failed {
            return Err(err).context("reading move");
        }
        report(&result, &session);
    }
    println!("You have no more coins! Game Over");
    Ok(())
}
