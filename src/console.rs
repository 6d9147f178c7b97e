//! Line-oriented console front end: rendering and command parsing.

use std::time::Duration;

use derive_more::{Display, Error};
use dragon_client::{
    GameListEntry, GameMode, GameView, NotificationSink, Page, Popup, RuleApplication,
    RulesCatalog, Timeline,
};
use tracing::debug;

/// Prints notifications and game state to stdout.
#[derive(Debug, Default)]
pub struct ConsolePresenter;

impl ConsolePresenter {
    /// Creates a presenter.
    pub fn new() -> Self {
        Self
    }
}

/// Formats a duration as `m:ss`.
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

impl NotificationSink for ConsolePresenter {
    fn error(&self, message: &str) {
        println!("[error] {}", message);
    }

    fn success(&self, message: &str) {
        println!("[info] {}", message);
    }

    fn popup(&self, popup: Popup) {
        match popup {
            Popup::Victory { elapsed: Some(elapsed) } => println!(
                "*** Victory in {} ***  (home | again | stay)",
                format_clock(elapsed)
            ),
            Popup::Victory { elapsed: None } => println!("*** Victory ***  (home | again | stay)"),
            Popup::Defeat => println!("*** Defeat: time is up ***  (home | again | stay)"),
            Popup::IncompleteTheorem => println!("Select a start and an end state first."),
            Popup::ConfirmTheorem(range) => println!(
                "Create a theorem from state {} to state {}? (confirm)",
                range.start, range.end
            ),
        }
    }

    fn navigate(&self, page: Page) {
        debug!(?page, "Navigation requested");
        match page {
            Page::Home => println!("-- home --"),
            Page::Game => println!("-- game --"),
        }
    }
}

impl GameView for ConsolePresenter {
    fn show_formula(&self, math: &str) {
        println!("formula: {}", math);
    }

    fn show_timeline(&self, timeline: &Timeline) {
        for (index, element) in timeline.elements().iter().enumerate() {
            let marker = if index == timeline.current() { '>' } else { ' ' };
            println!("{} {:>3}  {}", marker, index, element.text);
        }
    }

    fn show_timer(&self, visible: bool) {
        if visible {
            println!("[timer running]");
        }
    }

    fn update_timer(&self, remaining: Duration) {
        println!("[time left {}]", format_clock(remaining));
    }

    fn show_rules(&self, rules: &RulesCatalog) {
        for (item, kind, texts) in rules.groups() {
            println!("{} / {}", item, kind);
            for text in texts {
                println!("    {}", text);
            }
        }
    }

    fn show_game_list(&self, entries: &[GameListEntry]) {
        for entry in entries {
            let marker = if entry.is_current { '*' } else { ' ' };
            let clock = entry.remaining.map(format_clock).unwrap_or_default();
            println!(
                "{} {:>2}  {:<8} {:>5}  {}",
                marker,
                entry.index,
                entry.mode,
                clock,
                entry.summary.as_deref().unwrap_or("")
            );
        }
    }

    fn show_no_game(&self) {
        println!("No game in progress. Use `new` to create one.");
    }
}

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Apply a rule.
    Apply(RuleApplication),
    /// Refetch the current state.
    State,
    /// Step back.
    Previous,
    /// Step forward.
    Next,
    /// Click a timeline entry.
    Jump(usize),
    /// Toggle theorem mode.
    Theorem,
    /// Validate the theorem selection.
    Check,
    /// Create the selected theorem.
    Confirm,
    /// Toggle the rules listing.
    Rules,
    /// Restart the current game.
    Restart,
    /// Show the game list.
    List,
    /// Switch to a game.
    Switch(usize),
    /// Delete a game, the current one by default.
    Delete(Option<usize>),
    /// Create and start a game.
    New {
        /// Mode.
        mode: GameMode,
        /// Rule set.
        rule_set: String,
        /// Formula.
        formula_id: String,
        /// Allow theorems as rules.
        use_theorem: bool,
    },
    /// Leave a finished game for the home page.
    Home,
    /// Play a finished game again.
    Again,
    /// Keep a finished game.
    Stay,
    /// Print the command list.
    Help,
    /// Exit.
    Quit,
}

/// Console input that is not a command.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ParseError {
    /// Blank line.
    #[display("empty command")]
    Empty,
    /// Unknown command word.
    #[display("unknown command `{}`, try `help`", word)]
    Unknown {
        /// The word typed.
        word: String,
    },
    /// Wrong or malformed arguments.
    #[display("usage: {}", usage)]
    Usage {
        /// Expected syntax.
        usage: &'static str,
    },
}

/// Command list printed by `help`.
pub const HELP: &str = "\
apply <expr> <rule> <context>   apply a rule
state | prev | next             refresh / step the timeline
jump <index>                    click a timeline entry
theorem | check | confirm       theorem mode / validate / create
rules                           toggle the rules listing
restart                         play the current game again
list | switch <i> | delete [i]  manage games
new <normal|theorem> <rule_set> <formula_id> [theorems]
home | again | stay             answer the end-of-game dialog
quit";

fn index_arg(arg: Option<&str>, usage: &'static str) -> Result<usize, ParseError> {
    arg.and_then(|a| a.parse().ok())
        .ok_or(ParseError::Usage { usage })
}

/// Parses one input line.
pub fn parse_command(line: &str) -> Result<ConsoleCommand, ParseError> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Err(ParseError::Empty);
    };
    let args: Vec<&str> = words.collect();

    let command = match word {
        "apply" => match args.as_slice() {
            [expression, rule, context] => {
                ConsoleCommand::Apply(RuleApplication::new(*expression, *rule, *context))
            }
            _ => {
                return Err(ParseError::Usage {
                    usage: "apply <expr> <rule> <context>",
                });
            }
        },
        "state" => ConsoleCommand::State,
        "prev" => ConsoleCommand::Previous,
        "next" => ConsoleCommand::Next,
        "jump" => ConsoleCommand::Jump(index_arg(args.first().copied(), "jump <index>")?),
        "theorem" => ConsoleCommand::Theorem,
        "check" => ConsoleCommand::Check,
        "confirm" => ConsoleCommand::Confirm,
        "rules" => ConsoleCommand::Rules,
        "restart" => ConsoleCommand::Restart,
        "list" => ConsoleCommand::List,
        "switch" => ConsoleCommand::Switch(index_arg(args.first().copied(), "switch <index>")?),
        "delete" => match args.first() {
            None => ConsoleCommand::Delete(None),
            Some(arg) => ConsoleCommand::Delete(Some(index_arg(Some(arg), "delete [index]")?)),
        },
        "new" => {
            const USAGE: &str = "new <normal|theorem> <rule_set> <formula_id> [theorems]";
            let (mode, rule_set, formula_id, rest) = match args.as_slice() {
                [mode, rule_set, formula_id, rest @ ..] => (*mode, *rule_set, *formula_id, rest),
                _ => return Err(ParseError::Usage { usage: USAGE }),
            };
            let mode = match mode {
                "normal" => GameMode::Normal,
                "theorem" => GameMode::Theorem,
                _ => return Err(ParseError::Usage { usage: USAGE }),
            };
            let use_theorem = match rest {
                [] => false,
                ["theorems"] => true,
                _ => return Err(ParseError::Usage { usage: USAGE }),
            };
            ConsoleCommand::New {
                mode,
                rule_set: rule_set.to_string(),
                formula_id: formula_id.to_string(),
                use_theorem,
            }
        }
        "home" => ConsoleCommand::Home,
        "again" => ConsoleCommand::Again,
        "stay" => ConsoleCommand::Stay,
        "help" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => {
            return Err(ParseError::Unknown {
                word: other.to_string(),
            });
        }
    };
    Ok(command)
}
