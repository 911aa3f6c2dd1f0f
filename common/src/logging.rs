use chrono::{DateTime, Local};
use log::Record;
use std::fmt::Arguments;
use thiserror::Error;

pub const DEFAULT_FORMAT: &str = "[$Y-$m-$D $H:$M:$S $LEVEL] $MESSAGE";

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Failed to open the log file.")]
    IOError(#[from] std::io::Error),

    #[error("Failed to install the logger.")]
    SetLoggerError(log::SetLoggerError),
}

impl LogError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            LogError::IOError(err) => Some(err.to_string()),
            LogError::SetLoggerError(err) => Some(err.to_string()),
        }
    }
}

/// `TITLE_YYYY-MM-DD.log`, spaces in the title replaced with dashes.
pub fn generate_file_name(title: &str) -> String {
    file_name_for(title, &Local::now())
}

fn file_name_for(title: &str, now: &DateTime<Local>) -> String {
    let title = title.trim().replace(' ', "-");
    format!("{title}_{}.log", now.format("%Y-%m-%d"))
}

/// Expands the placeholders of a log format:
/// `$Y $m $D $H $M $S` (local time), `$LEVEL`, `$TARGET` and `$MESSAGE`.
/// Each placeholder is replaced once.
pub fn parse_format(format: &str, message: &Arguments, record: &Record) -> String {
    expand(format, &Local::now(), message, record)
}

fn expand(
    format: &str, time: &DateTime<Local>, message: &Arguments, record: &Record,
) -> String {
    let placeholders = [
        ("$Y", time.format("%Y").to_string()),
        ("$m", time.format("%m").to_string()),
        ("$D", time.format("%d").to_string()),
        ("$H", time.format("%H").to_string()),
        ("$M", time.format("%M").to_string()),
        ("$S", time.format("%S").to_string()),
        ("$LEVEL", record.level().to_string()),
        ("$TARGET", record.target().to_string()),
    ];

    let line = placeholders
        .iter()
        .fold(format.trim().to_string(), |line, (placeholder, value)| {
            line.replacen(placeholder, value, 1)
        });

    // Substituted last, so a `$` sequence inside the message stays as written.
    line.replacen("$MESSAGE", &message.to_string(), 1)
}
