//! Output formatting for CLI commands.
//!
//! Supports simple (one line per record), table, and JSON output.

use std::io::Write;

use alarm_proto::AlarmResponse;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CommandError;

/// Output formatter that handles every [`Format`].
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CommandError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CommandError::Output(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
            Format::Simple => value.write_simple(writer)?,
        }
        Ok(())
    }

    /// Write a value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CommandError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CommandError::Output(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::default())
    }
}

/// Trait for types with human-readable renderings.
pub trait TableDisplay {
    /// Write the value as a table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CommandError>;

    /// Write the value in the line-oriented simple format.
    ///
    /// Defaults to the table rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_simple<W: Write>(&self, writer: &mut W) -> Result<(), CommandError> {
        self.write_table(writer)
    }
}

impl TableDisplay for AlarmResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CommandError> {
        if self.alarms.is_empty() {
            writeln!(writer, "No active alarms")?;
            return Ok(());
        }

        writeln!(writer, "{:<18}  {}", "MEMBER ID", "ALARM")?;
        writeln!(writer, "{}", "─".repeat(30))?;
        for alarm in &self.alarms {
            writeln!(writer, "{:<18x}  {}", alarm.member_id, alarm.alarm)?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} alarm(s)", self.alarms.len())?;
        Ok(())
    }

    fn write_simple<W: Write>(&self, writer: &mut W) -> Result<(), CommandError> {
        for alarm in &self.alarms {
            writeln!(writer, "memberID:{} alarm:{}", alarm.member_id, alarm.alarm)?;
        }
        Ok(())
    }
}
