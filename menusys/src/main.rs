//! Menu service for character displays.
//!
//! Loads `menusys.toml` and the menu/executor documents it names, then drives
//! the menu from keyboard input until quit.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use menusys::actions::ActionRegistry;
use menusys::app::{MenuApp, default_config_path};
use menusys::error::DispatchError;
use menusys::exit_codes;
use menusys::io::config::DisplayKind;
use menusys::io::init::{InitOptions, init_menu};
use menusys::io::input::KeyboardInput;
use menusys::logging;
use menusys::validate::validate_menu;

#[derive(Parser)]
#[command(
    name = "menusys",
    version,
    about = "Menu navigation and execution for character displays"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the menu, reading keys from stdin (i/m move, l/s select, a home, q quit).
    Run {
        /// Path to menusys.toml.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the display kind from the config file.
        #[arg(short, long, value_enum)]
        display: Option<DisplayArg>,
    },
    /// Check the menu documents and report every problem found.
    Validate {
        /// Path to menusys.toml.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Write menusys.toml, default menu documents and a scripts directory.
    Init {
        /// Directory to initialize.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DisplayArg {
    Plain,
    Bounded,
}

impl From<DisplayArg> for DisplayKind {
    fn from(arg: DisplayArg) -> Self {
        match arg {
            DisplayArg::Plain => DisplayKind::Plain,
            DisplayArg::Bounded => DisplayKind::Bounded,
        }
    }
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            if err.downcast_ref::<DispatchError>().is_some() {
                exit_codes::DISPATCH
            } else {
                exit_codes::INVALID
            }
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run { config, display } => cmd_run(config, display),
        Command::Validate { config } => cmd_validate(config),
        Command::Init { dir, force } => cmd_init(dir, force),
    }
}

fn cmd_run(config: Option<PathBuf>, display: Option<DisplayArg>) -> Result<i32> {
    let config_path = config.unwrap_or_else(default_config_path);
    let app = MenuApp::load(&config_path, ActionRegistry::with_builtins())?;
    let kind = display.map_or(app.config().display.kind, DisplayKind::from);
    let display = app.stdout_display(kind)?;
    let (mut engine, _events) = app.into_engine(display);
    let mut input = KeyboardInput::stdin();
    engine.run(&mut input)?;
    Ok(exit_codes::OK)
}

fn cmd_validate(config: Option<PathBuf>) -> Result<i32> {
    let config_path = config.unwrap_or_else(default_config_path);
    let violations = validate_menu(&config_path, ActionRegistry::with_builtins())?;
    if violations.is_empty() {
        println!("ok");
        return Ok(exit_codes::OK);
    }
    eprintln!("invariant violations:");
    for violation in &violations {
        eprintln!("- {violation}");
    }
    Ok(exit_codes::INVALID)
}

fn cmd_init(dir: PathBuf, force: bool) -> Result<i32> {
    let (config_path, _) = init_menu(&dir, &InitOptions { force })?;
    println!("{}", config_path.display());
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_defaults() {
        let cli = Cli::parse_from(["menusys", "run"]);
        assert!(matches!(
            cli.command,
            Command::Run {
                config: None,
                display: None
            }
        ));
    }

    #[test]
    fn parse_run_with_display_override() {
        let cli = Cli::parse_from(["menusys", "run", "--config", "m.toml", "--display", "bounded"]);
        match cli.command {
            Command::Run { config, display } => {
                assert_eq!(config, Some(PathBuf::from("m.toml")));
                assert_eq!(display, Some(DisplayArg::Bounded));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["menusys", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true, .. }));
    }
}
