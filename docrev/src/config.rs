//! Configuration for docrev.
//!
//! Settings come from `$XDG_CONFIG_HOME/docrev/config.toml` (or
//! `~/.config/docrev/config.toml`) and are then overridden by command-line
//! flags. A missing file means defaults; a malformed file also means defaults,
//! plus a warning in the log. Config problems never stop startup.
//!
//! ```toml
//! theme = "catppuccin-mocha"
//!
//! [backend]
//! url = "http://localhost:5000"
//! timeout_secs = 120
//!
//! [session]
//! persona = "intermediate"
//!
//! [merge]
//! anchor = "### 2. Complete API Reference"
//!
//! [log]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use docrev_core::{Persona, DEFAULT_ANCHOR};
use serde::Deserialize;

/// Command-line flags. Every flag overrides the matching config key.
#[derive(Debug, Clone, Parser, Default)]
#[command(name = "docrev", version, about = "Refine AI-generated documentation through chat")]
pub struct Cli {
    /// Repository to document (sent to the documentation service).
    #[arg(long)]
    pub repo: Option<String>,

    /// Seed "Original" from a local markdown file instead of the service.
    #[arg(long, value_name = "PATH")]
    pub doc: Option<PathBuf>,

    /// Target audience: beginner, intermediate or expert.
    #[arg(long)]
    pub persona: Option<Persona>,

    /// Branch to generate documentation for.
    #[arg(long)]
    pub branch: Option<String>,

    /// Base URL of the documentation service.
    #[arg(long, value_name = "URL")]
    pub backend: Option<String>,

    /// Color theme: dark or catppuccin-mocha.
    #[arg(long)]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { url: "http://localhost:5000".to_owned(), timeout_secs: 120 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub persona: Persona,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub anchor: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { anchor: DEFAULT_ANCHOR.to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: String,
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub merge: MergeConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            backend: BackendConfig::default(),
            session: SessionConfig::default(),
            merge: MergeConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Parses a TOML document. Absent keys take their defaults.
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Loads the config at `path`.
    ///
    /// Returns the config plus an optional warning to log once tracing is up
    /// (the file is read before the subscriber exists).
    pub fn load(path: &Path) -> (Self, Option<String>) {
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => return (Self::default(), None),
        };
        match Self::from_toml(&raw) {
            Ok(config) => (config, None),
            Err(e) => (
                Self::default(),
                Some(format!("config parse error in {}: {e}", path.display())),
            ),
        }
    }

    /// Applies command-line overrides.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.backend {
            self.backend.url = url.clone();
        }
        if let Some(persona) = cli.persona {
            self.session.persona = persona;
        }
        if let Some(branch) = &cli.branch {
            self.session.branch = Some(branch.clone());
        }
        if let Some(theme) = &cli.theme {
            self.theme = theme.clone();
        }
        self
    }
}

/// Returns the path to the docrev config file.
///
/// Prefers `$XDG_CONFIG_HOME/docrev/config.toml`; falls back to
/// `~/.config/docrev/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("docrev").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml(
            r###"
            theme = "dark"

            [backend]
            url = "http://docs.internal:8080"

            [session]
            persona = "expert"

            [merge]
            anchor = "## API"
            "###,
        )
        .unwrap();
        assert_eq!(config.theme, "dark");
        assert_eq!(config.backend.url, "http://docs.internal:8080");
        assert_eq!(config.backend.timeout_secs, 120);
        assert_eq!(config.session.persona, Persona::Expert);
        assert_eq!(config.merge.anchor, "## API");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn bad_persona_is_a_parse_error() {
        assert!(Config::from_toml("[session]\npersona = \"guru\"").is_err());
    }

    #[test]
    fn load_reports_malformed_file_and_falls_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = [").unwrap();
        let (config, warning) = Config::load(&path);
        assert_eq!(config, Config::default());
        assert!(warning.unwrap().contains("config parse error"));

        let (config, warning) = Config::load(&dir.path().join("missing.toml"));
        assert_eq!(config, Config::default());
        assert!(warning.is_none());
    }

    #[test]
    fn cli_flags_override_file() {
        let cli = Cli::parse_from([
            "docrev",
            "--backend",
            "http://127.0.0.1:9000",
            "--persona",
            "beginner",
            "--branch",
            "dev",
            "--theme",
            "dark",
        ]);
        let config = Config::default().merge_cli(&cli);
        assert_eq!(config.backend.url, "http://127.0.0.1:9000");
        assert_eq!(config.session.persona, Persona::Beginner);
        assert_eq!(config.session.branch.as_deref(), Some("dev"));
        assert_eq!(config.theme, "dark");
    }
}
