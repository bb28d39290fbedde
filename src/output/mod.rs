//! Output formatting for the embedctl CLI.
//!
//! Commands build a serializable result struct and render it through
//! [`Output`], either as a human-readable block (default) or as JSON for
//! machine consumption.

use clap::ValueEnum;
use serde::Serialize;
use std::str::FromStr;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format (default)
    #[default]
    Table,
    /// JSON format for machine consumption
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Trait for types that can be displayed as a human-readable block.
pub trait TableDisplay: Serialize {
    /// Convert to the human-readable representation.
    fn to_table(&self) -> String;
}

/// Result wrapper that renders according to the selected format.
pub struct Output<T> {
    data: T,
    format: OutputFormat,
}

impl<T: TableDisplay> Output<T> {
    pub fn new(data: T, format: OutputFormat) -> Self {
        Self { data, format }
    }

    /// Render the result to stdout.
    pub fn render(&self) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Table => println!("{}", self.data.to_table()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&self.data)?),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        value: u32,
    }

    impl TableDisplay for Sample {
        fn to_table(&self) -> String {
            format!("value: {}", self.value)
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_table_display() {
        let sample = Sample { value: 7 };
        assert_eq!(sample.to_table(), "value: 7");
    }
}
