//! Interactive Pokedex session
//!
//! Holds the state of one prompt session (map paging position and caught
//! Pokemon) and runs parsed commands against the PokeAPI client. Input is any
//! async line source and output any `Write`, so the loop runs the same against
//! stdin/stdout and in-memory buffers.

use std::collections::BTreeMap;
use std::io::{self, Write};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::catching::{catch_probability, is_caught};
use crate::commands::{Command, CommandError, COMMANDS};
use crate::data::{NamedResource, PokeApiClient, PokeApiError, Pokemon};

/// Prompt printed before each line of input
pub const PROMPT: &str = "Pokedex > ";

/// Number of location areas shown by `map` and `mapb`
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Errors that can occur while running a command
#[derive(Debug, Error)]
pub enum SessionError {
    /// The command was invalid in the current state
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The PokeAPI request failed
    #[error(transparent)]
    Api(#[from] PokeApiError),

    /// Writing output failed
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What the prompt loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// State of one interactive session
pub struct Session<R = StdRng> {
    client: PokeApiClient,
    page_size: usize,
    /// Offset of the page the next `map` will show
    next_offset: usize,
    /// Caught Pokemon keyed by name
    pokedex: BTreeMap<String, Pokemon>,
    rng: R,
}

impl Session<StdRng> {
    /// Creates a session with an entropy-seeded random source
    pub fn new(client: PokeApiClient, page_size: usize) -> Self {
        Self::with_rng(client, page_size, StdRng::from_entropy())
    }
}

impl<R: Rng> Session<R> {
    /// Creates a session with a caller-provided random source for catch rolls
    pub fn with_rng(client: PokeApiClient, page_size: usize, rng: R) -> Self {
        Self {
            client,
            page_size,
            next_offset: 0,
            pokedex: BTreeMap::new(),
            rng,
        }
    }

    /// Returns the caught Pokemon, ordered by name
    pub fn pokedex(&self) -> &BTreeMap<String, Pokemon> {
        &self.pokedex
    }

    /// Runs the prompt loop until `exit` or end of input
    ///
    /// Command and API errors are printed and the loop continues; only a
    /// failure to read input or write output ends it early. Bytes that aren't
    /// valid UTF-8 are replaced rather than treated as a read failure.
    pub async fn run<I, W>(&mut self, mut input: I, out: &mut W) -> io::Result<()>
    where
        I: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut buf = Vec::new();

        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                // End of input
                writeln!(out)?;
                break;
            }
            let line = String::from_utf8_lossy(&buf);

            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    writeln!(out, "{}", e)?;
                    continue;
                }
            };

            match self.execute(command, out).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(SessionError::Io(e)) => return Err(e),
                Err(e) => {
                    debug!(error = %e, "command failed");
                    writeln!(out, "{}", e)?;
                }
            }
        }

        Ok(())
    }

    /// Runs a single command, writing its output to `out`
    pub async fn execute<W: Write>(
        &mut self,
        command: Command,
        out: &mut W,
    ) -> Result<Flow, SessionError> {
        match command {
            Command::Help => self.help(out)?,
            Command::Exit => {
                writeln!(out, "Closing the Pokedex... Goodbye!")?;
                return Ok(Flow::Exit);
            }
            Command::Map => self.map(out).await?,
            Command::MapBack => self.map_back(out).await?,
            Command::Explore(area) => self.explore(&area, out).await?,
            Command::Catch(name) => self.catch(&name, out).await?,
            Command::Inspect(name) => self.inspect(&name, out)?,
            Command::Pokedex => self.list_pokedex(out)?,
        }
        Ok(Flow::Continue)
    }

    fn help<W: Write>(&self, out: &mut W) -> Result<(), SessionError> {
        writeln!(out, "Welcome to the Pokedex!")?;
        writeln!(out, "Usage:")?;
        writeln!(out)?;
        for (name, description) in COMMANDS {
            writeln!(out, "{}: {}", name, description)?;
        }
        writeln!(out)?;
        Ok(())
    }

    async fn map<W: Write>(&mut self, out: &mut W) -> Result<(), SessionError> {
        let areas = self
            .client
            .fetch_location_areas(self.next_offset, self.page_size)
            .await?;
        print_names(&areas, out)?;
        self.next_offset = self.next_offset.saturating_add(self.page_size);
        Ok(())
    }

    async fn map_back<W: Write>(&mut self, out: &mut W) -> Result<(), SessionError> {
        // The page before the one last shown by `map`
        let offset = self
            .page_size
            .checked_mul(2)
            .and_then(|span| self.next_offset.checked_sub(span))
            .ok_or(CommandError::NoPreviousPage)?;

        let areas = self.client.fetch_location_areas(offset, self.page_size).await?;
        print_names(&areas, out)?;
        self.next_offset -= self.page_size;
        Ok(())
    }

    async fn explore<W: Write>(&mut self, area: &str, out: &mut W) -> Result<(), SessionError> {
        let location = self.client.fetch_location_area(area).await?;

        writeln!(out, "Exploring {}...", location.name)?;
        writeln!(out, "Found Pokemon:")?;
        for encounter in &location.pokemon_encounters {
            writeln!(out, " - {}", encounter.pokemon.name)?;
        }
        Ok(())
    }

    async fn catch<W: Write>(&mut self, name: &str, out: &mut W) -> Result<(), SessionError> {
        let pokemon = self.client.fetch_pokemon(name).await?;
        let base_experience = pokemon.base_experience.unwrap_or_default();
        let roll: f64 = self.rng.gen();

        writeln!(out, "Throwing a Pokeball at {}...", pokemon.name)?;

        let caught = is_caught(base_experience, roll);
        debug!(
            pokemon = %pokemon.name,
            base_experience,
            probability = catch_probability(base_experience),
            roll,
            caught,
            "catch attempt"
        );

        if caught {
            writeln!(out, "{} was caught!", pokemon.name)?;
            writeln!(out, "You may now inspect it with the inspect command.")?;
            info!(pokemon = %pokemon.name, "pokemon caught");
            self.pokedex.insert(pokemon.name.clone(), pokemon);
        } else {
            writeln!(out, "{} escaped!", pokemon.name)?;
        }
        Ok(())
    }

    fn inspect<W: Write>(&self, name: &str, out: &mut W) -> Result<(), SessionError> {
        let pokemon = self
            .pokedex
            .get(name)
            .ok_or_else(|| CommandError::NotCaught(name.to_string()))?;

        writeln!(out, "Name: {}", pokemon.name)?;
        writeln!(out, "Height: {}", pokemon.height)?;
        writeln!(out, "Weight: {}", pokemon.weight)?;
        writeln!(out, "Stats:")?;
        for stat in &pokemon.stats {
            writeln!(out, "  - {}: {}", stat.stat.name, stat.base_stat)?;
        }

        let mut types: Vec<_> = pokemon.types.iter().collect();
        types.sort_by_key(|t| t.slot);
        writeln!(out, "{}:", if types.len() == 1 { "Type" } else { "Types" })?;
        for pokemon_type in types {
            writeln!(out, "  - {}", pokemon_type.kind.name)?;
        }
        Ok(())
    }

    fn list_pokedex<W: Write>(&self, out: &mut W) -> Result<(), SessionError> {
        if self.pokedex.is_empty() {
            writeln!(
                out,
                "You have not caught any Pokemon, yet. Try exploring locations and good luck on your journey, trainer!"
            )?;
            return Ok(());
        }

        writeln!(out, "Your Pokedex:")?;
        for name in self.pokedex.keys() {
            writeln!(out, "  - {}", name)?;
        }
        Ok(())
    }
}

fn print_names<W: Write>(resources: &[NamedResource], out: &mut W) -> io::Result<()> {
    for resource in resources {
        writeln!(out, "{}", resource.name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use rand::rngs::mock::StepRng;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Rolls 0.0 every time, so every throw succeeds
    fn always_catch() -> StepRng {
        StepRng::new(0, 0)
    }

    /// Rolls just under 1.0 every time, so every throw fails
    fn never_catch() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    fn session_for(server: &MockServer, rng: StepRng) -> Session<StepRng> {
        let cache = Arc::new(Cache::new(Duration::from_secs(60)).expect("valid interval"));
        let client = PokeApiClient::with_base_url(cache, server.uri());
        Session::with_rng(client, 2, rng)
    }

    async fn mount_page(server: &MockServer, offset: &str, names: &[&str]) {
        let results: Vec<_> = names.iter().map(|n| json!({"name": n, "url": ""})).collect();
        Mock::given(method("GET"))
            .and(path("/location-area/"))
            .and(query_param("offset", offset))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 100,
                "next": null,
                "previous": null,
                "results": results
            })))
            .mount(server)
            .await;
    }

    async fn mount_pokemon(server: &MockServer, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/pokemon/{}", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 25,
                "name": name,
                "base_experience": 112,
                "height": 4,
                "weight": 60,
                "stats": [
                    {"base_stat": 35, "effort": 0, "stat": {"name": "hp", "url": ""}},
                    {"base_stat": 90, "effort": 2, "stat": {"name": "speed", "url": ""}}
                ],
                "types": [{"slot": 1, "type": {"name": "electric", "url": ""}}]
            })))
            .mount(server)
            .await;
    }

    async fn run_lines<R: Rng>(session: &mut Session<R>, input: &str) -> String {
        let mut out = Vec::new();
        session
            .run(input.as_bytes(), &mut out)
            .await
            .expect("session should run");
        String::from_utf8(out).expect("output is utf-8")
    }

    #[tokio::test]
    async fn test_help_lists_every_command() {
        let server = MockServer::start().await;
        let mut session = session_for(&server, always_catch());

        let output = run_lines(&mut session, "help\nexit\n").await;

        assert!(output.contains("Welcome to the Pokedex!"));
        for (name, _) in COMMANDS {
            assert!(output.contains(&format!("{}: ", name)), "missing {}", name);
        }
        assert!(output.contains("Goodbye!"));
    }

    #[tokio::test]
    async fn test_map_pages_forward_and_back() {
        let server = MockServer::start().await;
        mount_page(&server, "0", &["area-a", "area-b"]).await;
        mount_page(&server, "2", &["area-c", "area-d"]).await;
        let mut session = session_for(&server, always_catch());

        let output = run_lines(&mut session, "map\nmap\nmapb\nmapb\n").await;

        let listed: Vec<_> = output
            .split(PROMPT)
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect();
        assert_eq!(
            listed,
            [
                "area-a\narea-b",
                "area-c\narea-d",
                "area-a\narea-b",
                "Cannot go further back..."
            ]
        );
    }

    #[tokio::test]
    async fn test_mapb_before_map_is_an_error() {
        let server = MockServer::start().await;
        let mut session = session_for(&server, always_catch());

        let err = session
            .execute(Command::MapBack, &mut Vec::<u8>::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::Command(CommandError::NoPreviousPage)
        ));
    }

    #[tokio::test]
    async fn test_explore_lists_encounters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/location-area/old-chateau-entrance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 126,
                "name": "old-chateau-entrance",
                "pokemon_encounters": [
                    {"pokemon": {"name": "gastly", "url": ""}},
                    {"pokemon": {"name": "haunter", "url": ""}}
                ]
            })))
            .mount(&server)
            .await;
        let mut session = session_for(&server, always_catch());

        let output = run_lines(&mut session, "explore old-chateau-entrance\n").await;

        assert!(output.contains("Exploring old-chateau-entrance..."));
        assert!(output.contains(" - gastly\n - haunter\n"));
    }

    #[tokio::test]
    async fn test_catch_then_inspect_and_list() {
        let server = MockServer::start().await;
        mount_pokemon(&server, "pikachu").await;
        let mut session = session_for(&server, always_catch());

        let output = run_lines(&mut session, "catch pikachu\ninspect pikachu\npokedex\n").await;

        assert!(output.contains("Throwing a Pokeball at pikachu..."));
        assert!(output.contains("pikachu was caught!"));
        assert!(output.contains("Name: pikachu\nHeight: 4\nWeight: 60\n"));
        assert!(output.contains("  - hp: 35\n  - speed: 90\n"));
        assert!(output.contains("Type:\n  - electric\n"));
        assert!(output.contains("Your Pokedex:\n  - pikachu\n"));
        assert!(session.pokedex().contains_key("pikachu"));
    }

    #[tokio::test]
    async fn test_escaped_pokemon_is_not_recorded() {
        let server = MockServer::start().await;
        mount_pokemon(&server, "pikachu").await;
        let mut session = session_for(&server, never_catch());

        let output = run_lines(&mut session, "catch pikachu\ninspect pikachu\npokedex\n").await;

        assert!(output.contains("pikachu escaped!"));
        assert!(output.contains("You have not caught a `pikachu`, yet."));
        assert!(output.contains("You have not caught any Pokemon, yet."));
        assert!(session.pokedex().is_empty());
    }

    #[tokio::test]
    async fn test_api_errors_are_printed_and_loop_continues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/missingno"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let mut session = session_for(&server, always_catch());

        let output = run_lines(&mut session, "catch missingno\nfly\nhelp\n").await;

        assert!(output.contains("Pokemon `missingno` not found."));
        assert!(output.contains("Unknown command"));
        assert!(output.contains("Welcome to the Pokedex!"));
    }

    #[tokio::test]
    async fn test_exit_stops_reading_input() {
        let server = MockServer::start().await;
        let mut session = session_for(&server, always_catch());

        let output = run_lines(&mut session, "exit\nhelp\n").await;

        assert!(!output.contains("Welcome to the Pokedex!"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_session() {
        let server = MockServer::start().await;
        let mut session = session_for(&server, always_catch());

        let mut out = Vec::new();
        session
            .run(&b"catch \xff\xfe\npokedex\n"[..], &mut out)
            .await
            .expect("session should keep running");
        let output = String::from_utf8(out).expect("output is utf-8");

        assert!(output.contains("You have not caught any Pokemon, yet."));
    }

    #[tokio::test]
    async fn test_huge_page_size_does_not_overflow() {
        let server = MockServer::start().await;
        mount_page(&server, "0", &["area-a"]).await;
        let cache = Arc::new(Cache::new(Duration::from_secs(60)).expect("valid interval"));
        let client = PokeApiClient::with_base_url(cache, server.uri());
        let mut session = Session::with_rng(client, usize::MAX, always_catch());

        let output = run_lines(&mut session, "map\nmapb\nmapb\n").await;

        assert!(output.contains("area-a"));
        assert_eq!(output.matches("Cannot go further back...").count(), 2);
    }

    #[tokio::test]
    async fn test_repeated_catch_hits_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/pikachu"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 25, "name": "pikachu", "base_experience": 112, "height": 4, "weight": 60
            })))
            .expect(1)
            .mount(&server)
            .await;
        let mut session = session_for(&server, never_catch());

        let output = run_lines(&mut session, "catch pikachu\ncatch pikachu\ncatch pikachu\n").await;

        assert_eq!(output.matches("pikachu escaped!").count(), 3);
    }
}
