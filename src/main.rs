//! Dragon client - console front end
//!
//! Starts a game against the configured server and plays it from stdin.

#![warn(missing_docs)]

mod cli;
mod console;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use console::{ConsoleCommand, ConsolePresenter, HELP, parse_command};
use dragon_client::{
    ClientConfig, ControllerDeps, ControllerError, Dismissal, GameConfig, GameController,
    HttpTransport, SessionRegistry, TokioCountdownFactory,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Play {
            mode,
            rule_set,
            formula_id,
            use_theorem,
            formula_latex,
            remaining_secs,
        } => {
            init_logging(config.log_file())?;
            let mut game = GameConfig::new(mode.into(), rule_set, formula_id, use_theorem);
            if let Some(latex) = formula_latex {
                game = game.with_formula_latex(latex);
            }
            run_play(config, game, remaining_secs.map(Duration::from_secs)).await
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Resolves configuration: file or defaults, then environment, then flags.
fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    let config = config.with_env_overrides();
    Ok(match &cli.server_url {
        Some(url) => config.with_server_url(url.clone()),
        None => config,
    })
}

/// Logs to a file so output does not interleave with the game.
fn init_logging(path: &str) -> Result<()> {
    let log_file = std::fs::File::create(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Plays until `quit` or end of input.
#[instrument(skip_all, fields(server_url = %config.server_url()))]
async fn run_play(config: ClientConfig, game: GameConfig, remaining: Option<Duration>) -> Result<()> {
    info!("Starting dragon client");

    let mut registry = SessionRegistry::new();
    registry.create(game);
    if let Some(remaining) = remaining
        && let Some(session) = registry.current_mut()
    {
        session.set_pending_duration(remaining);
    }

    let transport = HttpTransport::new(config.server_url().clone(), config.request_timeout())?;
    let presenter = Arc::new(ConsolePresenter::new());
    let (controller, mut timer_events) = GameController::new(ControllerDeps::new(
        registry,
        Arc::new(transport),
        presenter.clone(),
        presenter,
        Arc::new(TokioCountdownFactory::new(config.timer_tick())),
        config.controller_settings(),
    ));

    report(controller.enter().await.map(|_| ()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed");
                    break;
                };
                match parse_command(&line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => report(execute(&controller, command).await),
                    Err(e) => println!("{}", e),
                }
            }
            Some(event) = timer_events.recv() => {
                report(controller.handle_timer_event(event).await);
            }
        }
    }

    controller.dispose();
    info!("Dragon client exiting");
    Ok(())
}

/// Runs one console command against the controller.
#[instrument(skip(controller))]
async fn execute(controller: &GameController, command: ConsoleCommand) -> Result<(), ControllerError> {
    match command {
        ConsoleCommand::Apply(rule) => controller.game_rule_request(rule).await,
        ConsoleCommand::State => controller.game_state_request().await,
        ConsoleCommand::Previous => controller.previous_state().await,
        ConsoleCommand::Next => controller.next_state().await,
        ConsoleCommand::Jump(index) => controller.timeline_clicked(index).await.map(|click| {
            debug!(?click, "Timeline clicked");
        }),
        ConsoleCommand::Theorem => {
            let on = controller.toggle_create_theorem();
            println!(
                "theorem mode {}",
                if on { "on: jump selects bounds" } else { "off" }
            );
            Ok(())
        }
        ConsoleCommand::Check => {
            controller.valid_theorem();
            Ok(())
        }
        ConsoleCommand::Confirm => controller.send_theorem_creation().await,
        ConsoleCommand::Rules => controller.toggle_rules_list().await.map(|_| ()),
        ConsoleCommand::Restart => controller.restart_game().await,
        ConsoleCommand::List => {
            controller.show_game_list();
            Ok(())
        }
        ConsoleCommand::Switch(index) => controller.select_game(index).await,
        ConsoleCommand::Delete(index) => {
            controller.delete_game(index).await?;
            controller.enter().await.map(|_| ())
        }
        ConsoleCommand::New {
            mode,
            rule_set,
            formula_id,
            use_theorem,
        } => {
            controller.create_game(GameConfig::new(mode, rule_set, formula_id, use_theorem));
            controller.on_start().await
        }
        ConsoleCommand::Home => controller.dismiss(Dismissal::Home).await,
        ConsoleCommand::Again => controller.dismiss(Dismissal::Restart).await,
        ConsoleCommand::Stay => controller.dismiss(Dismissal::Stay).await,
        ConsoleCommand::Help => {
            println!("{}", HELP);
            Ok(())
        }
        ConsoleCommand::Quit => Ok(()),
    }
}

/// Prints failures the controller did not already surface to the user.
fn report(result: Result<(), ControllerError>) {
    match result {
        Ok(()) => {}
        Err(e @ (ControllerError::Validation(_) | ControllerError::Countdown(_))) => {
            warn!(error = %e, "Command failed");
        }
        Err(e) => {
            warn!(error = %e, "Command refused");
            println!("{}", e);
        }
    }
}
