use clap::{Parser, Subcommand};
use minder_core::config::{ConfigOverrides, Theme};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Starts the interactive session when omitted
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: minder add "Dentist" --date 2030-01-02 --time 14:30 --priority high
    Add {
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Due time (HH:MM or HH:MM:SS)
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        priority: Option<String>,
    },
    /// Edit a task; an empty --date or --time clears it
    ///
    /// Example: minder edit task-1 --time 15:00
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
        /// pending or completed
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: minder delete task-1
    Delete { id: String },
    /// Show details of a task
    ///
    /// Example: minder show task-1
    Show { id: String },
    /// Mark a task as completed
    ///
    /// Example: minder done task-1
    Done { id: String },
    /// Mark a completed task as pending again
    ///
    /// Example: minder undo task-1
    Undo { id: String },
    /// List tasks
    ///
    /// Example: minder list --day week --priority high
    List {
        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,
        /// all, pending or completed
        #[arg(long, default_value = "all")]
        status: String,
        /// Exact due date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// all, today, tomorrow or week
        #[arg(long, default_value = "all")]
        day: String,
        #[arg(long)]
        priority: Option<String>,
    },
    /// Keep running and deliver reminders as they fall due
    ///
    /// Example: minder watch --rescan-secs 30
    Watch {
        /// Seconds between re-reads of the task store; 0 disables re-reads
        #[arg(long, default_value_t = 60)]
        rescan_secs: u64,
        /// Exit once no reminder is pending
        #[arg(long)]
        exit_when_idle: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    LeadMinutes,
    MaxDelayMs,
    SafetyMarginMs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "theme" => {
            if remainder.is_some() {
                return Err("theme override cannot have subfields".to_string());
            }
            ConfigOverrideTarget::Theme
        }
        "reminder" => {
            let setting = remainder
                .and_then(canonicalize_flag_name)
                .ok_or_else(|| "reminder override requires a setting name".to_string())?;
            match setting.as_str() {
                "lead_minutes" => ConfigOverrideTarget::LeadMinutes,
                "max_delay_ms" => ConfigOverrideTarget::MaxDelayMs,
                "safety_margin_ms" => ConfigOverrideTarget::SafetyMarginMs,
                other => return Err(format!("unknown reminder setting '{other}'")),
            }
        }
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` argument into one set of overrides; later
/// arguments win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => {
                overrides.theme =
                    Some(Theme::from_name(&parsed.value).map_err(|err| err.message().to_string())?)
            }
            ConfigOverrideTarget::LeadMinutes => {
                overrides.lead_minutes = Some(parse_number("reminder.lead_minutes", &parsed.value)?)
            }
            ConfigOverrideTarget::MaxDelayMs => {
                overrides.max_delay_ms = Some(parse_number("reminder.max_delay_ms", &parsed.value)?)
            }
            ConfigOverrideTarget::SafetyMarginMs => {
                overrides.safety_margin_ms =
                    Some(parse_number("reminder.safety_margin_ms", &parsed.value)?)
            }
        }
    }
    Ok(overrides)
}

fn parse_number(key: &str, value: &str) -> Result<i64, String> {
    value
        .parse::<i64>()
        .map_err(|_| format!("{key} must be an integer"))
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
