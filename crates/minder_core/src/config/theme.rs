use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

const RESET: &str = "\x1b[0m";

/// Colour scheme for plain-text output. Stored in `config.json` by name.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Theme {
    #[default]
    Plain,
    Noir,
    Solarized,
}

impl Theme {
    /// Parses a theme name, ignoring case and `-`/`_`/space separators.
    /// `default` and `light` mean plain, `dark` means noir.
    pub fn from_name(raw: &str) -> Result<Self, AppError> {
        let name: String = raw
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_' | ' '))
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match name.as_str() {
            "" | "plain" | "default" | "light" => Ok(Theme::Plain),
            "noir" | "dark" | "darkmode" => Ok(Theme::Noir),
            "solarized" => Ok(Theme::Solarized),
            _ => Err(AppError::invalid_input(format!(
                "unknown theme '{}': expected plain, noir or solarized",
                raw.trim()
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Plain => "plain",
            Theme::Noir => "noir",
            Theme::Solarized => "solarized",
        }
    }

    pub fn styles(self) -> Styles {
        match self {
            Theme::Plain => Styles {
                title: None,
                hint: None,
            },
            Theme::Noir => Styles {
                title: Some("\x1b[1m"),
                hint: Some("\x1b[2m"),
            },
            Theme::Solarized => Styles {
                title: Some("\x1b[1;38;5;37m"),
                hint: Some("\x1b[38;5;136m"),
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for Theme {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Theme::from_name(&value)
    }
}

impl From<Theme> for String {
    fn from(theme: Theme) -> Self {
        theme.name().to_string()
    }
}

/// ANSI styling for task titles and secondary lines (reminder notes,
/// timestamps, empty-list messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Styles {
    title: Option<&'static str>,
    hint: Option<&'static str>,
}

impl Styles {
    pub fn title(&self, text: &str) -> String {
        paint(self.title, text)
    }

    pub fn hint(&self, text: &str) -> String {
        paint(self.hint, text)
    }
}

fn paint(code: Option<&'static str>, text: &str) -> String {
    match code {
        Some(code) => format!("{code}{text}{RESET}"),
        None => text.to_string(),
    }
}
