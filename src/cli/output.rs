use crate::cli::args::OutputFormat;
use crate::core::variables::format_value;
use crate::domain::config::KhiTermConfig;
use serde::Serialize;
use std::io;
use tabled::{Table, Tabled};

/// Outcome of reading or writing one variable
#[derive(Debug, Clone, Serialize)]
pub struct VariableReading {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VariableReading {
    pub fn ok(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: None,
            error: Some(error.to_string()),
        }
    }

    fn rendered_value(&self) -> String {
        match (&self.value, &self.error) {
            (Some(value), _) => format_value(*value),
            (None, Some(error)) => format!("<{}>", error),
            (None, None) => String::new(),
        }
    }
}

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_variables(&self, readings: &[VariableReading]) -> Result<(), OutputError>;
    fn write_config(&self, config: &KhiTermConfig) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::KhiTermError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

/// Render readings in the given format without printing them
pub fn render_variables(format: &OutputFormat, readings: &[VariableReading]) -> Result<String, OutputError> {
    let rendered = match format {
        OutputFormat::Text => readings
            .iter()
            .map(|reading| format!("{} = {}", reading.name, reading.rendered_value()))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(readings)?,
        OutputFormat::Table => {
            let table_data: Vec<VariableTableRow> = readings.iter().map(VariableTableRow::from).collect();
            Table::new(table_data).to_string()
        }
        OutputFormat::Csv => {
            let mut csv = "name,value,error".to_string();
            for reading in readings {
                csv.push_str(&format!(
                    "\n{},{},{}",
                    reading.name,
                    reading.value.map(format_value).unwrap_or_default(),
                    reading.error.as_deref().unwrap_or_default()
                ));
            }
            csv
        }
    };
    Ok(rendered)
}

impl OutputWriter for ConsoleWriter {
    fn write_variables(&self, readings: &[VariableReading]) -> Result<(), OutputError> {
        if readings.is_empty() && !matches!(self.format, OutputFormat::Json) {
            return Ok(());
        }
        println!("{}", render_variables(&self.format, readings)?);
        Ok(())
    }

    fn write_config(&self, config: &KhiTermConfig) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::to_string_pretty(config)?;
                println!("{}", output);
            }
            OutputFormat::Table => {
                if !config.variables.is_empty() {
                    let table_data: Vec<PresetTableRow> = config
                        .variables
                        .iter()
                        .map(|preset| PresetTableRow {
                            name: preset.name.clone(),
                            description: preset.description.clone(),
                            step: format_value(preset.step),
                        })
                        .collect();
                    println!("{}", Table::new(table_data));
                }
            }
            OutputFormat::Text | OutputFormat::Csv => {
                println!("KhiTerm Configuration:");
                println!("  Controller: {}:{}", config.controller.host, config.controller.port);
                println!("  Login timeout: {}ms", config.controller.login_timeout_ms);
                println!("  Prompt timeout: {}ms", config.controller.prompt_timeout_ms);
                println!("  Response timeout: {}ms", config.controller.response_timeout_ms);
                println!("  Poll interval: {}ms", config.global.poll_interval_ms);
                println!("  Log level: {}", config.global.log_level);

                if !config.variables.is_empty() {
                    println!("  Variables:");
                    for preset in &config.variables {
                        let desc = if preset.description.is_empty() { "No description" } else { &preset.description };
                        println!("    {} (step {}): {}", preset.name, format_value(preset.step), desc);
                    }
                }
            }
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "error": error,
                    "level": "error"
                });
                eprintln!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

/// Table row for a variable reading
#[derive(Tabled)]
struct VariableTableRow {
    name: String,
    value: String,
}

impl From<&VariableReading> for VariableTableRow {
    fn from(reading: &VariableReading) -> Self {
        Self {
            name: reading.name.clone(),
            value: reading.rendered_value(),
        }
    }
}

/// Table row for a configured preset
#[derive(Tabled)]
struct PresetTableRow {
    name: String,
    description: String,
    step: String,
}
