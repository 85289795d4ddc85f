//! CLI argument definitions for the advisor binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use advisor_core::{AdvisorConfig, Language};

/// Weather activity advisor: chat about plans, clothing and activities
/// grounded in live weather.
#[derive(Parser, Debug)]
#[command(name = "advisor", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// API server bind address.
    #[arg(long = "host", global = true)]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API server (default).
    Serve,
    /// Chat in the terminal.
    Chat {
        /// Load weather for this location before the first prompt.
        #[arg(long)]
        location: Option<String>,

        /// Reply language: en or ja.
        #[arg(long, default_value = "en")]
        language: String,
    },
}

impl CliArgs {
    /// The subcommand to run; no subcommand means `serve`.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ADVISOR_CONFIG env var > ~/.advisor/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ADVISOR_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Overlay the flags that were given onto `config`.
    ///
    /// Call after `apply_env_overrides` so flags win over the environment.
    pub fn apply_to(&self, config: &mut AdvisorConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }

    /// Log filter directive when RUST_LOG is unset.
    ///
    /// The terminal chat stays quiet (warn) unless a level was asked for.
    pub fn resolve_log_level(&self, config: &AdvisorConfig) -> String {
        match (&self.log_level, self.command()) {
            (Some(level), _) => level.clone(),
            (None, Command::Chat { .. }) => "warn".to_string(),
            (None, Command::Serve) => config.general.log_level.clone(),
        }
    }
}

impl Command {
    /// Reply language for `chat`; English for anything unrecognised.
    pub fn language(&self) -> Language {
        match self {
            Command::Chat { language, .. } => Language::from_tag_or_default(language),
            Command::Serve => Language::default(),
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".advisor").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".advisor").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let args = parse(&["advisor"]);
        assert_eq!(args.command(), Command::Serve);
    }

    #[test]
    fn test_chat_subcommand_with_global_flags() {
        let args = parse(&[
            "advisor", "chat", "--language", "ja", "--location", "Osaka", "--port", "9000",
        ]);
        assert_eq!(args.port, Some(9000));
        match args.command() {
            Command::Chat { location, .. } => assert_eq!(location.as_deref(), Some("Osaka")),
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(args.command().language(), Language::Ja);
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&["advisor", "--host", "0.0.0.0", "-p", "8080", "-l", "debug"]);
        let mut config = AdvisorConfig::default();
        config.server.port = 7000;
        args.apply_to(&mut config);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.general.log_level, "debug");
    }

    #[test]
    fn test_missing_flags_leave_config_alone() {
        let args = parse(&["advisor", "serve"]);
        let mut config = AdvisorConfig::default();
        config.server.port = 7000;
        args.apply_to(&mut config);
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_log_level_resolution() {
        let config = AdvisorConfig::default();
        assert_eq!(parse(&["advisor"]).resolve_log_level(&config), "info");
        assert_eq!(parse(&["advisor", "chat"]).resolve_log_level(&config), "warn");
        assert_eq!(
            parse(&["advisor", "chat", "-l", "debug"]).resolve_log_level(&config),
            "debug"
        );
    }

    #[test]
    fn test_unknown_chat_language_falls_back_to_english() {
        let args = parse(&["advisor", "chat", "--language", "fr"]);
        assert_eq!(args.command().language(), Language::En);
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let args = parse(&["advisor", "--config", "/tmp/advisor.toml"]);
        assert_eq!(
            args.resolve_config_path(),
            PathBuf::from("/tmp/advisor.toml")
        );
    }
}
