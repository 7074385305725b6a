//! Command-line arguments

use std::path::PathBuf;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use gridsync_lib::api::query::Sort;
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "gridsync", version, about = "Browse and edit a REST collection")]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = "GRIDSYNC_URL")]
    pub url: String,

    /// Collection to manage
    #[arg(long, env = "GRIDSYNC_RESOURCE", default_value = "users")]
    pub resource: String,

    /// Rows per page
    #[arg(long, default_value_t = 10)]
    pub page_size: u32,

    /// Seconds before a backend call is abandoned
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Field rules checked before writes
    #[arg(long, value_enum, default_value_t = SchemaChoice::Users)]
    pub schema: SchemaChoice,

    /// Recorded as createdBy/updatedBy
    #[arg(long, env = "GRIDSYNC_ACTOR_ID")]
    pub actor_id: Option<String>,

    #[arg(long, env = "GRIDSYNC_ACTOR_EMAIL")]
    pub actor_email: Option<String>,

    /// Write logs to a file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaChoice {
    /// name, email, role and friends
    Users,
    /// No client-side checks
    None,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print one page
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// field=value; repeatable. `all` means no constraint
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Sort field, prefixed with `-` for descending
        #[arg(long, allow_hyphen_values = true, value_parser = parse_sort)]
        sort: Option<Sort>,

        /// Created at or after (RFC 3339)
        #[arg(long, requires = "until")]
        since: Option<DateTime<Utc>>,

        /// Created at or before (RFC 3339)
        #[arg(long, requires = "since")]
        until: Option<DateTime<Utc>>,
    },

    /// Update fields of one row
    Edit {
        id: String,
        /// field=value; values are read as JSON when they parse
        #[arg(required = true, value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Create a row
    Create {
        #[arg(required = true, value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Delete one or more rows
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn split_assignment(raw: &str) -> Result<(&str, &str), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => Ok((field.trim(), value)),
        _ => Err(format!("expected field=value, got '{}'", raw)),
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (field, value) = split_assignment(raw)?;
    Ok((field.to_string(), value.to_string()))
}

fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (field, value) = split_assignment(raw)?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((field.to_string(), value))
}

fn parse_sort(raw: &str) -> Result<Sort, String> {
    match raw.strip_prefix('-') {
        Some(field) if !field.is_empty() => Ok(Sort::desc(field)),
        None if !raw.is_empty() => Ok(Sort::asc(raw)),
        _ => Err("sort field is empty".to_string()),
    }
}
