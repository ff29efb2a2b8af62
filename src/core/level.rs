//! Log level definitions

use super::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log entry.
///
/// Ordered from least to most severe, so `Level::Warn > Level::Info`. A logger
/// configured with threshold `T` emits an entry at level `L` iff `L >= T`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
    Panic = 5,
}

impl Level {
    /// Every level, most severe first.
    pub const ALL: [Level; 6] = [
        Level::Panic,
        Level::Fatal,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Panic => "panic",
        }
    }

    /// True iff `candidate` is at least as severe as `threshold`.
    #[inline]
    pub fn enabled(threshold: Level, candidate: Level) -> bool {
        candidate >= threshold
    }

    pub fn color(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Level::Debug => BrightBlack,
            Level::Info => Green,
            Level::Warn => Yellow,
            Level::Error => Red,
            Level::Fatal => BrightRed,
            Level::Panic => BrightMagenta,
        }
    }

    #[inline]
    pub(crate) fn to_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub(crate) fn from_u8(value: u8) -> Level {
        match value {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warn,
            3 => Level::Error,
            4 => Level::Fatal,
            _ => Level::Panic,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "panic" => Ok(Level::Panic),
            "fatal" => Ok(Level::Fatal),
            "error" => Ok(Level::Error),
            "warn" | "warning" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            _ => Err(LoggerError::invalid_level(s)),
        }
    }
}

/// Parse a level name, e.g. from a configuration file or environment variable.
pub fn parse_level(s: &str) -> Result<Level> {
    s.parse()
}
