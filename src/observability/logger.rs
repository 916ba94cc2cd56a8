//! Structured JSON line logger
//!
//! - One log line = one record
//! - `category` first, then `severity`, then fields sorted by key
//! - Synchronous, no buffering
//! - INFO/WARN to stdout, ERROR/FATAL to stderr

use std::fmt;
use std::io::{self, Write};

use serde_json::Value;

use super::category::Category;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info = 1,
    Warn = 2,
    /// Needs operator attention, run continues
    Error = 3,
    /// Run aborted
    Fatal = 4,
}

impl Severity {
    /// Severity name
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub struct Logger;

impl Logger {
    /// Write one record, routing by severity
    pub fn log(severity: Severity, category: Category, fields: &[(&str, &str)]) {
        let line = Self::render(severity, category, fields);
        if severity >= Severity::Error {
            Self::write_line(&mut io::stderr(), &line);
        } else {
            Self::write_line(&mut io::stdout(), &line);
        }
    }

    /// Log at INFO
    pub fn info(category: Category, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, category, fields);
    }

    /// Log at WARN
    pub fn warn(category: Category, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, category, fields);
    }

    /// Log at ERROR
    pub fn error(category: Category, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, category, fields);
    }

    /// Log at FATAL
    pub fn fatal(category: Category, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, category, fields);
    }

    /// Render a record as a single JSON line (newline included)
    pub(crate) fn render(severity: Severity, category: Category, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(256);

        output.push_str("{\"category\":");
        push_json_str(&mut output, category.as_str());
        output.push_str(",\"severity\":");
        push_json_str(&mut output, severity.as_str());

        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted {
            output.push(',');
            push_json_str(&mut output, key);
            output.push(':');
            push_json_str(&mut output, value);
        }

        output.push_str("}\n");
        output
    }

    fn write_line<W: Write>(writer: &mut W, line: &str) {
        // Logging failures must not abort a run
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

fn push_json_str(output: &mut String, s: &str) {
    output.push_str(&Value::String(s.to_owned()).to_string());
}
