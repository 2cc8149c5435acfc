//! Configuration assembly: CLI and environment win over the options file,
//! which wins over built-in defaults. Credentials still missing after the
//! merge are prompted for interactively.

use anyhow::Context;
use serde::Deserialize;

use crate::cli::Cli;
use crate::retry::RetryConfig;
use crate::types::LogLevel;

pub const DEFAULT_DIRECTORY: &str = "VkBackup";
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Optional static settings from the TOML options file. Every key may be
/// omitted; a missing file reads as an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct Options {
    pub owner_id: Option<i64>,
    pub vk_token: Option<String>,
    pub disk_token: Option<String>,
    pub directory: Option<String>,
    pub extension: Option<String>,
}

impl Options {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No options file at {path}, using CLI and defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("reading options file {path}")),
        };
        toml::from_str(&text).with_context(|| format!("parsing options file {path}"))
    }
}

/// Interactive fallback for anything absent from CLI, environment, and file.
pub trait CredentialPrompt {
    fn owner_id(&self) -> anyhow::Result<i64>;
    fn secret(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Prompts on the controlling terminal; tokens are read without echo.
pub struct ConsolePrompt;

impl CredentialPrompt for ConsolePrompt {
    fn owner_id(&self) -> anyhow::Result<i64> {
        use std::io::Write;
        print!("VK owner id: ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        line.trim()
            .parse()
            .with_context(|| format!("'{}' is not a valid owner id", line.trim()))
    }

    fn secret(&self, prompt: &str) -> anyhow::Result<String> {
        let value = rpassword::prompt_password(prompt).context("reading token")?;
        anyhow::ensure!(!value.trim().is_empty(), "empty token");
        Ok(value.trim().to_string())
    }
}

/// Fully resolved application configuration.
pub struct Config {
    pub owner_id: i64,
    pub vk_token: String,
    pub disk_token: String,
    pub directory: String,
    pub extension: String,
    pub dry_run: bool,
    pub no_progress_bar: bool,
    pub log_level: LogLevel,
    pub retry: RetryConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("owner_id", &self.owner_id)
            .field("vk_token", &"<redacted>")
            .field("disk_token", &"<redacted>")
            .field("directory", &self.directory)
            .field("extension", &self.extension)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Merge all sources and prompt on the console for whatever is missing.
    pub fn resolve(cli: Cli) -> anyhow::Result<Self> {
        let options = Options::load(&cli.options_file)?;
        Self::assemble(cli, options, &ConsolePrompt)
    }

    /// Merge with an injected prompt, so tests never touch a terminal.
    pub fn assemble(
        cli: Cli,
        options: Options,
        prompt: &dyn CredentialPrompt,
    ) -> anyhow::Result<Self> {
        let owner_id = match cli.owner_id.or(options.owner_id) {
            Some(id) => id,
            None => prompt.owner_id()?,
        };
        let vk_token = match cli.vk_token.or(options.vk_token) {
            Some(token) => token,
            None => prompt.secret("VK API token: ")?,
        };
        let disk_token = match cli.disk_token.or(options.disk_token) {
            Some(token) => token,
            None => prompt.secret("Yandex Disk token: ")?,
        };

        let directory = normalize_directory(
            &cli.directory
                .or(options.directory)
                .unwrap_or_else(|| DEFAULT_DIRECTORY.to_string()),
        )?;
        let extension = normalize_extension(
            &cli.extension
                .or(options.extension)
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
        )?;

        Ok(Self {
            owner_id,
            vk_token,
            disk_token,
            directory,
            extension,
            dry_run: cli.dry_run,
            no_progress_bar: cli.no_progress_bar,
            log_level: cli.log_level,
            retry: RetryConfig {
                max_retries: cli.max_retries,
                base_delay_secs: cli.retry_delay,
                max_delay_secs: 60,
            },
        })
    }
}

/// Storage paths are composed as `/<directory>/<name>.<ext>`, so the stored
/// directory carries no surrounding slashes.
fn normalize_directory(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_matches('/');
    anyhow::ensure!(!trimmed.is_empty(), "destination directory name is empty");
    Ok(trimmed.to_string())
}

fn normalize_extension(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    anyhow::ensure!(!trimmed.is_empty(), "file extension is empty");
    anyhow::ensure!(
        !trimmed.contains('/'),
        "file extension '{trimmed}' contains a path separator"
    );
    Ok(trimmed.to_string())
}
