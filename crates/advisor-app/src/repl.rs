//! Terminal chat front end.
//!
//! A rustyline REPL driving the same `ChatOrchestrator` as the HTTP API,
//! in-process and against a single session. Free text is a chat turn;
//! slash commands cover weather seeding, voice files, and history.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use advisor_chat::{ChatOrchestrator, TurnStatus};
use advisor_core::{i18n, Language, WeatherSnapshot};
use advisor_voice::{format_from_filename, TranscriptionService};
use advisor_weather::FormattedWeather;

const COMMANDS: &[&str] = &[
    "/weather", "/voice", "/examples", "/clear", "/history", "/help", "/quit",
];

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand<'a> {
    Chat(&'a str),
    Weather(&'a str),
    Voice(&'a str),
    Examples,
    Clear,
    History,
    Help,
    Quit,
    /// A known command missing its argument; carries the usage line.
    Usage(&'static str),
    Unknown(&'a str),
    Empty,
}

fn parse_line(line: &str) -> ReplCommand<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    if !line.starts_with('/') {
        return ReplCommand::Chat(line);
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match (command, rest.is_empty()) {
        ("/weather", true) => ReplCommand::Usage("/weather <city>"),
        ("/weather", false) => ReplCommand::Weather(rest),
        ("/voice", true) => ReplCommand::Usage("/voice <audio file>"),
        ("/voice", false) => ReplCommand::Voice(rest),
        ("/examples", _) => ReplCommand::Examples,
        ("/clear", _) => ReplCommand::Clear,
        ("/history", _) => ReplCommand::History,
        ("/help", _) => ReplCommand::Help,
        ("/quit" | "/exit", _) => ReplCommand::Quit,
        _ => ReplCommand::Unknown(command),
    }
}

// =============================================================================
// Line editor helper
// =============================================================================

/// Slash-command completion, hints and highlighting.
struct ReplHelper;

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for ReplHelper {}

// =============================================================================
// Session driver
// =============================================================================

struct Repl {
    orchestrator: Arc<ChatOrchestrator>,
    transcriber: Arc<dyn TranscriptionService>,
    session_id: String,
    language: Language,
}

impl Repl {
    async fn chat(&self, text: &str) {
        match self
            .orchestrator
            .handle_message(Some(&self.session_id), text, self.language)
            .await
        {
            Ok(reply) => {
                if reply.weather_updated {
                    if let Some(ref snapshot) = reply.weather {
                        print_weather(snapshot);
                    }
                }
                let answer = match reply.status {
                    TurnStatus::Done => reply.answer.bright_blue(),
                    TurnStatus::Degraded | TurnStatus::Failed => reply.answer.yellow(),
                };
                println!("{answer}");
                println!();
            }
            Err(e) => eprintln!("{}", format!("Error: {e}").red()),
        }
    }

    async fn seed(&self, location: &str) {
        match self
            .orchestrator
            .seed_with_weather(Some(&self.session_id), location, self.language)
            .await
        {
            Ok(seeded) => {
                print_weather(&seeded.weather);
                println!("{}", seeded.suggestion.bright_blue());
                println!();
            }
            Err(e) => eprintln!("{}", format!("Error: {e}").red()),
        }
    }

    async fn voice(&self, path: &str) {
        let audio = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("{}", format!("Cannot read {path}: {e}").red());
                return;
            }
        };
        let format = Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(format_from_filename);

        match self.transcriber.transcribe(&audio, format.as_deref()).await {
            Ok(Some(transcript)) => {
                println!("{}", format!("> {transcript}").green());
                self.chat(&transcript).await;
            }
            Ok(None) => println!("{}", "No speech detected".yellow()),
            Err(e) => eprintln!("{}", format!("Transcription failed: {e}").red()),
        }
    }

    fn history(&self) {
        let session = match self.orchestrator.get_session(&self.session_id) {
            Ok(session) => session,
            Err(e) => {
                eprintln!("{}", format!("Error: {e}").red());
                return;
            }
        };
        if session.messages.is_empty() {
            println!("{}", "(no messages yet)".bright_black());
            return;
        }
        for message in &session.messages {
            let role = format!("[{}]", message.role());
            println!("{}", role.bright_magenta());
            println!("{}", message.content());
        }
        println!();
    }

    fn clear(&self) {
        match self.orchestrator.clear_history(&self.session_id) {
            Ok(()) => println!("{}", "Chat history cleared".bright_green()),
            Err(e) => eprintln!("{}", format!("Error: {e}").red()),
        }
    }

    fn examples(&self) {
        println!("{}", i18n::tr(self.language, "example_prompts").bright_yellow());
        for (i, prompt) in i18n::example_prompts(self.language).iter().enumerate() {
            println!("  {}. {}", i + 1, prompt);
        }
        println!();
    }
}

fn print_weather(snapshot: &WeatherSnapshot) {
    let w = FormattedWeather::from(snapshot);
    println!("{}", format!("{} ({})", w.location, w.local_time).bright_yellow().bold());
    println!("  {}  {}", w.temperature, w.condition);
    println!(
        "  feels like {}, humidity {}, wind {}, UV {}",
        w.feels_like, w.humidity, w.wind, w.uv_index
    );
    println!();
}

fn print_help() {
    println!("{}", "Commands:".bright_yellow());
    println!("  /weather <city>     load current weather and get a suggestion");
    println!("  /voice <file>       transcribe an audio file and ask it");
    println!("  /examples           show example prompts");
    println!("  /history            show this session's messages");
    println!("  /clear              clear chat history (weather is kept)");
    println!("  /help               show this help");
    println!("  /quit               exit");
    println!("{}", "Anything else is sent as a chat message.".bright_black());
    println!();
}

/// Run the interactive chat until `/quit` or end of input.
pub async fn run(
    orchestrator: Arc<ChatOrchestrator>,
    transcriber: Arc<dyn TranscriptionService>,
    language: Language,
    location: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = orchestrator.create_session(language)?;
    tracing::debug!(session_id = %session.id, language = %language, "Terminal session started");

    let repl = Repl {
        orchestrator,
        transcriber,
        session_id: session.id,
        language,
    };

    let mut rl: Editor<ReplHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ReplHelper));

    println!("{}", i18n::tr(language, "title").bright_magenta().bold());
    println!("{}", i18n::tr(language, "subtitle").bright_black());
    println!("{}", "Type /help for commands.".bright_black());
    println!();

    if let Some(location) = location {
        repl.seed(&location).await;
    }

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let command = parse_line(&line);
        if command != ReplCommand::Empty {
            let _ = rl.add_history_entry(line.trim());
        }

        match command {
            ReplCommand::Empty => {}
            ReplCommand::Chat(text) => repl.chat(text).await,
            ReplCommand::Weather(city) => repl.seed(city).await,
            ReplCommand::Voice(path) => repl.voice(path).await,
            ReplCommand::Examples => repl.examples(),
            ReplCommand::Clear => repl.clear(),
            ReplCommand::History => repl.history(),
            ReplCommand::Help => print_help(),
            ReplCommand::Usage(usage) => println!("{}", format!("Usage: {usage}").yellow()),
            ReplCommand::Unknown(cmd) => {
                println!("{}", format!("Unknown command {cmd}; try /help").yellow())
            }
            ReplCommand::Quit => break,
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}
