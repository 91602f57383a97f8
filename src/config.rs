use std::net::SocketAddr;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use url::Url;

use crate::auth::Token;
use crate::cli::Cli;

/// Exactly one credential mode is active per process: either a fixed
/// trigger token, or an account token that lets the relay discover and
/// mint trigger tokens per project.
#[derive(Debug, Clone)]
pub enum Credentials {
    StaticTrigger(Token),
    Account(Token),
}

impl Credentials {
    pub fn static_trigger(&self) -> Option<&Token> {
        match self {
            Self::StaticTrigger(token) => Some(token),
            Self::Account(_) => None,
        }
    }

    pub fn account_token(&self) -> Option<&Token> {
        match self {
            Self::Account(token) => Some(token),
            Self::StaticTrigger(_) => None,
        }
    }
}

/// Validated, immutable runtime configuration. Built once at startup from
/// CLI flags over an optional config file; components receive it by
/// reference and never mutate it.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub base_url: Url,
    pub credentials: Credentials,
    pub trigger_merged: bool,
    pub remove_source_exceptions: Vec<String>,
}

const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// Configuration file structure. All fields are optional; CLI flags win
/// over file values.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ConfigFile {
    listen: Option<String>,
    url: Option<String>,
    trigger_token: Option<String>,
    private_token: Option<String>,
    trigger_merged: Option<bool>,
    remove_source_exceptions: Option<Vec<String>>,
}

impl ConfigFile {
    /// Load a configuration file.
    ///
    /// Searches in this order:
    /// 1. Specified path
    /// 2. ./mr-relay.toml
    /// 3. ./mr-relay.json
    ///
    /// Returns an empty configuration if no file is found.
    fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["mr-relay.toml", "mr-relay.json"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            _ => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
        }
    }
}

impl Config {
    /// Merge CLI flags over the optional config file and validate the
    /// result. Credential-mode errors surface here, at startup, never per
    /// request.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = ConfigFile::load(cli.config.as_deref())?;

        let listen = cli
            .listen
            .clone()
            .or(file.listen)
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen: SocketAddr = listen
            .parse()
            .with_context(|| format!("invalid listen address: {listen}"))?;

        let mut url = cli
            .url
            .clone()
            .or(file.url)
            .context("a GitLab base URL is required (--url or config file)")?;
        if !url.ends_with('/') {
            url.push('/');
        }
        let base_url =
            Url::parse(&url).with_context(|| format!("invalid GitLab base URL: {url}"))?;

        let trigger_token = cli.trigger_token.clone().or(file.trigger_token);
        let private_token = cli.private_token.clone().or(file.private_token);
        let credentials = match (trigger_token, private_token) {
            (Some(token), None) => Credentials::StaticTrigger(Token::from(token)),
            (None, Some(token)) => Credentials::Account(Token::from(token)),
            (Some(_), Some(_)) => bail!("--trigger-token and --private-token are mutually exclusive"),
            (None, None) => bail!("one of --trigger-token or --private-token is required"),
        };

        let remove_source_exceptions = if cli.remove_source_exceptions.is_empty() {
            file.remove_source_exceptions.unwrap_or_default()
        } else {
            cli.remove_source_exceptions.clone()
        };

        Ok(Self {
            listen,
            base_url,
            credentials,
            trigger_merged: cli.trigger_merged || file.trigger_merged.unwrap_or(false),
            remove_source_exceptions,
        })
    }
}
