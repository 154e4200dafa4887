//! Layered application configuration.
//!
//! Priority: CLI flag > CLI env var > `KB_`-prefixed env vars > config file > defaults.
//! Loaded once at startup and passed down; nothing reads the environment later.

use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use url::Url;

use crate::conversation::ExchangeMode;
use crate::error::{Error, Result};
use crate::transport::{AnswerLength, AskParams, Language, SearchParams};

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat with a knowledge base from the terminal", long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Base URL of the knowledge-base service
    #[arg(long, env = "KB_API_URL")]
    pub api_url: Option<String>,

    /// Sampling temperature for generated answers
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Answer language (ENGLISH, FRENCH, ...)
    #[arg(long)]
    pub language: Option<String>,

    /// Answer length (SHORT, MEDIUM, LONG)
    #[arg(long)]
    pub length: Option<String>,

    /// How answers are requested: stream, once or search
    #[arg(long)]
    pub mode: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Ask a single question, print the answer and exit
    #[arg(short, long)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub ask: AskConfig,
    pub search: SearchParams,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AskConfig {
    pub temperature: f32,
    pub language: Language,
    pub length: AnswerLength,
    pub mode: ExchangeMode,
}

impl AskConfig {
    /// Generation parameters for ask requests.
    #[must_use]
    pub fn params(&self) -> AskParams {
        AskParams {
            temperature: self.temperature,
            language: self.language,
            length: self.length,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let defaults = AskParams::default();
        let search = SearchParams::default();

        let mut builder = Config::builder()
            .set_default("api.base_url", "http://localhost:8000")?
            .set_default("ask.temperature", f64::from(defaults.temperature))?
            .set_default("ask.language", defaults.language.as_str())?
            .set_default("ask.length", defaults.length.as_str())?
            .set_default("ask.mode", "stream")?
            .set_default(
                "search.similarity_threshold",
                f64::from(search.similarity_threshold),
            )?
            .set_default(
                "search.max_results",
                i64::try_from(search.max_results).unwrap_or(i64::MAX),
            )?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false)),
        };

        // E.g. KB_API__BASE_URL=http://kb.internal:8000
        builder = builder.add_source(
            Environment::with_prefix("KB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(url) = &cli.api_url {
            builder = builder.set_override("api.base_url", url.as_str())?;
        }
        if let Some(t) = cli.temperature {
            builder = builder.set_override("ask.temperature", f64::from(t))?;
        }
        if let Some(lang) = &cli.language {
            builder = builder.set_override("ask.language", lang.to_uppercase())?;
        }
        if let Some(len) = &cli.length {
            builder = builder.set_override("ask.length", len.to_uppercase())?;
        }
        if let Some(mode) = &cli.mode {
            builder = builder.set_override("ask.mode", mode.to_lowercase())?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api.base_url)?;
        if url.cannot_be_a_base() {
            return Err(Error::Config(config::ConfigError::Message(format!(
                "api.base_url must be an absolute http(s) URL, got {}",
                self.api.base_url
            ))));
        }
        Ok(())
    }
}
