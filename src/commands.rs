//! Command parsing for the interactive Pokedex prompt
//!
//! A line is split at its first space into a command word and an argument
//! string. Each command declares whether it takes no argument or exactly one
//! word, and anything else is rejected with a [`CommandError`].

use thiserror::Error;

/// Error types for parsing and running prompt commands
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The command word is not recognized
    #[error("Unknown command")]
    Unknown(String),

    /// A command that takes no argument was given one
    #[error("`{command}` does not take args `{args}`.")]
    UnexpectedArgs { command: &'static str, args: String },

    /// A command that needs an argument was given none
    #[error("`{command}` takes a {expected} as argument.")]
    MissingArg {
        command: &'static str,
        expected: &'static str,
    },

    /// A command that takes one word was given several
    #[error("`{command}` takes a single {expected}, `{args}` is invalid. Use a dash for multi-word names, e.g. mime-jr.")]
    TooManyArgs {
        command: &'static str,
        expected: &'static str,
        args: String,
    },

    /// `mapb` was used on the first page
    #[error("Cannot go further back...")]
    NoPreviousPage,

    /// `inspect` was used on a Pokemon that isn't in the Pokedex
    #[error("You have not caught a `{0}`, yet.")]
    NotCaught(String),
}

/// A parsed prompt command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    Map,
    MapBack,
    Explore(String),
    Catch(String),
    Inspect(String),
    Pokedex,
}

/// Name and help text for every command, in the order `help` lists them
pub const COMMANDS: [(&str, &str); 8] = [
    ("help", "Displays a help message"),
    ("exit", "Exit the Pokedex"),
    ("map", "Display the next page of location areas"),
    ("mapb", "Display the previous page of location areas"),
    (
        "explore",
        "Display the Pokemon that can be encountered in a location area. Expects a location area as parameter.",
    ),
    ("catch", "Try to catch a Pokemon. Expects a Pokemon name as parameter."),
    ("inspect", "Show the details of a caught Pokemon, including its stats."),
    ("pokedex", "Show all the Pokemon you have caught so far."),
];

impl Command {
    /// Parses a line of user input.
    ///
    /// # Returns
    /// * `Ok(None)` for a blank line
    /// * `Ok(Some(Command))` for a valid command
    /// * `Err(CommandError)` for an unknown command or bad arguments
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, args) = line.split_once(' ').unwrap_or((line, ""));
        let args = args.trim();

        let command = match word {
            "help" => {
                no_args("help", args)?;
                Command::Help
            }
            "exit" => {
                no_args("exit", args)?;
                Command::Exit
            }
            "map" => {
                no_args("map", args)?;
                Command::Map
            }
            "mapb" => {
                no_args("mapb", args)?;
                Command::MapBack
            }
            "pokedex" => {
                no_args("pokedex", args)?;
                Command::Pokedex
            }
            "explore" => Command::Explore(one_arg("explore", "location area", args)?),
            "catch" => Command::Catch(one_arg("catch", "Pokemon name", args)?),
            "inspect" => Command::Inspect(one_arg("inspect", "Pokemon name", args)?),
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn no_args(command: &'static str, args: &str) -> Result<(), CommandError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandError::UnexpectedArgs {
            command,
            args: args.to_string(),
        })
    }
}

fn one_arg(command: &'static str, expected: &'static str, args: &str) -> Result<String, CommandError> {
    if args.is_empty() {
        return Err(CommandError::MissingArg { command, expected });
    }
    if args.contains(char::is_whitespace) {
        return Err(CommandError::TooManyArgs {
            command,
            expected,
            args: args.to_string(),
        });
    }
    Ok(args.to_lowercase())
}
