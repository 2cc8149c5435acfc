use clap::Parser;

use crate::types::LogLevel;

#[derive(Parser, Debug)]
#[command(name = "vkpb-rs", about = "Back up a VK user's profile photos to Yandex Disk")]
pub struct Cli {
    /// VK user id whose profile photos are backed up (prompted if omitted)
    #[arg(short = 'o', long, allow_negative_numbers = true)]
    pub owner_id: Option<i64>,

    /// VK API token (if not provided, will prompt).
    /// WARNING: passing via --vk-token is visible in process listings.
    /// Prefer the VK_TOKEN environment variable instead.
    #[arg(long, env = "VK_TOKEN", hide_env_values = true)]
    pub vk_token: Option<String>,

    /// Yandex Disk OAuth token (if not provided, will prompt)
    #[arg(long, env = "YADISK_TOKEN", hide_env_values = true)]
    pub disk_token: Option<String>,

    /// Destination directory on the Disk
    #[arg(short = 'd', long)]
    pub directory: Option<String>,

    /// File extension for stored photos
    #[arg(long)]
    pub extension: Option<String>,

    /// Options file (TOML); a missing file is simply skipped
    #[arg(short = 'c', long, default_value = "options.toml")]
    pub options_file: String,

    /// Enumerate and resolve names without downloading or uploading
    #[arg(long)]
    pub dry_run: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,

    /// Retries per network call after a transient failure
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,

    /// Base delay between retries, in seconds
    #[arg(long, default_value_t = 5)]
    pub retry_delay: u64,
}
